//! Argument parsing: split flags from positional operands.

use std::collections::BTreeSet;

use crate::error::ShellError;

use super::Builtin;

/// Flags given to a command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Flags {
    pub short: BTreeSet<char>,
    pub long: BTreeSet<String>,
}

impl Flags {
    pub fn has(&self, flag: char) -> bool {
        self.short.contains(&flag)
    }

    pub fn has_long(&self, flag: &str) -> bool {
        self.long.contains(flag)
    }

    pub fn is_empty(&self) -> bool {
        self.short.is_empty() && self.long.is_empty()
    }
}

/// One command ready to run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub builtin: Builtin,
    /// Command word as typed.
    pub name: String,
    /// Every argument, untouched.
    pub args: Vec<String>,
    /// Arguments that are not flags, in order.
    pub positional: Vec<String>,
    pub flags: Flags,
}

impl Invocation {
    /// Parse `args` against the builtin's option table.
    ///
    /// `-abc` merges short flags, `--name` maps onto its short form, `--`
    /// ends option parsing. `-` and negative numbers stay positional.
    /// Commands without a table take their arguments raw.
    pub fn parse(builtin: Builtin, name: &str, args: Vec<String>) -> Result<Self, ShellError> {
        let mut flags = Flags::default();
        let mut positional = Vec::new();

        let Some(options) = builtin.options() else {
            if builtin != Builtin::Echo && args.len() == 1 && args[0] == "--help" {
                flags.long.insert("help".to_string());
            } else {
                positional = args.clone();
            }
            return Ok(Self {
                builtin,
                name: name.to_string(),
                args,
                positional,
                flags,
            });
        };

        let mut options_done = false;
        for arg in &args {
            if options_done || !looks_like_flag(arg) {
                positional.push(arg.clone());
                continue;
            }
            if arg == "--" {
                options_done = true;
                continue;
            }
            if let Some(long) = arg.strip_prefix("--") {
                if long == "help" {
                    flags.long.insert(long.to_string());
                    continue;
                }
                let (_, short) = options
                    .long
                    .iter()
                    .find(|(name, _)| *name == long)
                    .ok_or_else(|| ShellError::InvalidOption {
                        command: builtin.name(),
                        flag: long.to_string(),
                    })?;
                flags.short.insert(*short);
                flags.long.insert(long.to_string());
                continue;
            }
            for c in arg.chars().skip(1) {
                if !options.short.contains(c) {
                    return Err(ShellError::InvalidOption {
                        command: builtin.name(),
                        flag: c.to_string(),
                    });
                }
                flags.short.insert(c);
            }
        }

        Ok(Self {
            builtin,
            name: name.to_string(),
            args,
            positional,
            flags,
        })
    }

    pub fn has(&self, flag: char) -> bool {
        self.flags.has(flag)
    }
}

fn looks_like_flag(arg: &str) -> bool {
    let Some(rest) = arg.strip_prefix('-') else {
        return false;
    };
    !rest.is_empty() && !rest.chars().all(|c| c.is_ascii_digit())
}
