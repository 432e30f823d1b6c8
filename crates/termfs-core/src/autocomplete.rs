//! Tab completion for command names and paths.
//!
//! The word under completion is the text after the last whitespace. In
//! command position (line start, or after `|`, `;`, `&&`) it completes
//! against builtins and aliases; anywhere else it completes a path.
//!
//! - Single match: the input is rewritten in place
//! - Multiple matches: the common prefix plus every candidate
//! - Ghost text hints while typing

use crate::commands::Builtin;
use crate::env::Environment;
use crate::filesystem::FileSystemEngine;

// ============================================================================
// Public Types
// ============================================================================

/// Result of an autocomplete attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum AutocompleteResult {
    /// Single match - the whole input line with the word completed.
    Single(String),
    /// Multiple matches - (input extended to the common prefix, display names).
    Multiple(String, Vec<String>),
    /// No matches found.
    None,
}

// ============================================================================
// Configuration
// ============================================================================

/// Commands whose operands are always directories.
const DIR_COMMANDS: &[&str] = &["cd", "rmdir"];

// ============================================================================
// Completion Context
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum CompletionMode {
    Command,
    Path { dirs_only: bool },
}

/// Input split around the word being completed.
struct Context<'a> {
    /// Everything before the word, kept verbatim.
    head: &'a str,
    word: &'a str,
    mode: CompletionMode,
}

impl<'a> Context<'a> {
    fn parse(input: &'a str) -> Option<Self> {
        if input.trim().is_empty() {
            return None;
        }
        let start = input
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map_or(0, |(i, c)| i + c.len_utf8());
        let (head, word) = input.split_at(start);

        let before = head.trim_end();
        let mode = if before.is_empty() || before.ends_with(['|', ';', '&']) {
            CompletionMode::Command
        } else {
            let segment = before
                .rsplit(['|', ';', '&'])
                .next()
                .unwrap_or(before)
                .trim_start();
            let command = segment
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_lowercase();
            CompletionMode::Path {
                dirs_only: DIR_COMMANDS.contains(&command.as_str()),
            }
        };
        Some(Self { head, word, mode })
    }
}

/// One completion candidate.
struct Candidate {
    /// Replacement for the word.
    text: String,
    /// Name shown in a multi-match listing.
    display: String,
    is_dir: bool,
}

// ============================================================================
// Public API
// ============================================================================

/// Perform autocomplete on Tab press.
pub fn autocomplete(input: &str, fs: &FileSystemEngine, env: &Environment) -> AutocompleteResult {
    let Some(ctx) = Context::parse(input) else {
        return AutocompleteResult::None;
    };
    let candidates = candidates(&ctx, fs, env);

    match candidates.as_slice() {
        [] => AutocompleteResult::None,
        [only] => {
            let suffix = if only.is_dir { "/" } else { " " };
            AutocompleteResult::Single(format!("{}{}{}", ctx.head, only.text, suffix))
        }
        many => {
            let texts: Vec<String> = many.iter().map(|c| c.text.clone()).collect();
            let common = find_common_prefix(&texts);
            let names = many.iter().map(|c| c.display.clone()).collect();
            AutocompleteResult::Multiple(format!("{}{}", ctx.head, common), names)
        }
    }
}

/// Ghost text for the current input: the suffix the first candidate would
/// add to the word.
pub fn get_hint(input: &str, fs: &FileSystemEngine, env: &Environment) -> Option<String> {
    let ctx = Context::parse(input)?;
    if ctx.word.is_empty() {
        return None;
    }
    candidates(&ctx, fs, env)
        .into_iter()
        .find(|c| c.text != ctx.word)
        .map(|c| {
            let suffix = if c.is_dir { "/" } else { "" };
            format!("{}{}", &c.text[ctx.word.len()..], suffix)
        })
}

fn candidates(ctx: &Context<'_>, fs: &FileSystemEngine, env: &Environment) -> Vec<Candidate> {
    match ctx.mode {
        CompletionMode::Command => command_candidates(ctx.word, env),
        CompletionMode::Path { dirs_only } => path_candidates(ctx.word, fs, dirs_only),
    }
}

// ============================================================================
// Command Completion
// ============================================================================

fn command_candidates(partial: &str, env: &Environment) -> Vec<Candidate> {
    let mut names: Vec<&str> = Builtin::ALL
        .iter()
        .map(|b| b.name())
        .chain(env.aliases().map(|(name, _)| name))
        .filter(|name| name.starts_with(partial))
        .collect();
    names.sort_unstable();
    names.dedup();
    names
        .into_iter()
        .map(|name| Candidate {
            text: name.to_string(),
            display: name.to_string(),
            is_dir: false,
        })
        .collect()
}

// ============================================================================
// Path Completion
// ============================================================================

fn path_candidates(partial: &str, fs: &FileSystemEngine, dirs_only: bool) -> Vec<Candidate> {
    let (dir_part, name_part) = match partial.rfind('/') {
        Some(idx) => (&partial[..=idx], &partial[idx + 1..]),
        None => ("", partial),
    };
    let Ok(entries) = fs.list_directory(dir_part) else {
        return Vec::new();
    };
    let show_hidden = name_part.starts_with('.');

    let mut matches: Vec<Candidate> = entries
        .into_iter()
        .filter(|node| node.name.starts_with(name_part))
        .filter(|node| show_hidden || !node.is_hidden())
        .filter(|node| !dirs_only || node.is_folder())
        .map(|node| Candidate {
            text: format!("{}{}", dir_part, node.name),
            display: if node.is_folder() {
                format!("{}/", node.name)
            } else {
                node.name.clone()
            },
            is_dir: node.is_folder(),
        })
        .collect();
    matches.sort_by(|a, b| a.text.cmp(&b.text));
    matches
}

// ============================================================================
// Utilities
// ============================================================================

/// Find the common prefix of multiple strings.
fn find_common_prefix(strings: &[String]) -> String {
    let Some((first, rest)) = strings.split_first() else {
        return String::new();
    };
    let mut prefix_len = first.len();
    for s in rest {
        prefix_len = first
            .char_indices()
            .zip(s.chars())
            .take_while(|((i, a), b)| *i < prefix_len && a == b)
            .last()
            .map_or(0, |((i, a), _)| i + a.len_utf8());
    }
    first[..prefix_len].to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShellConfig;
    use crate::models::Manifest;

    fn setup() -> (FileSystemEngine, Environment) {
        let config = ShellConfig::default();
        let manifest = Manifest::default_layout(&config.user, &config.hostname);
        let fs = FileSystemEngine::from_manifest(&manifest, &config.home_dir());
        (fs, Environment::seeded(&config))
    }

    #[test]
    fn test_command_completion_single() {
        let (fs, env) = setup();
        assert_eq!(
            autocomplete("cle", &fs, &env),
            AutocompleteResult::Single("clear ".to_string())
        );
    }

    #[test]
    fn test_command_completion_multiple() {
        let (fs, env) = setup();
        match autocomplete("c", &fs, &env) {
            AutocompleteResult::Multiple(common, matches) => {
                assert_eq!(common, "c");
                assert!(matches.contains(&"cat".to_string()));
                assert!(matches.contains(&"cd".to_string()));
                assert!(matches.contains(&"clear".to_string()));
            }
            other => panic!("Expected multiple matches, got {:?}", other),
        }
    }

    #[test]
    fn test_command_completion_includes_aliases() {
        let (fs, env) = setup();
        match autocomplete("l", &fs, &env) {
            AutocompleteResult::Multiple(_, matches) => {
                assert!(matches.contains(&"la".to_string()));
                assert!(matches.contains(&"ls".to_string()));
            }
            other => panic!("Expected multiple matches, got {:?}", other),
        }
    }

    #[test]
    fn test_no_match() {
        let (fs, env) = setup();
        assert_eq!(autocomplete("xyz", &fs, &env), AutocompleteResult::None);
        assert_eq!(autocomplete("cat zzz", &fs, &env), AutocompleteResult::None);
        assert_eq!(autocomplete("   ", &fs, &env), AutocompleteResult::None);
    }

    #[test]
    fn test_path_completion_single_folder() {
        let (fs, env) = setup();
        assert_eq!(
            autocomplete("cd Doc", &fs, &env),
            AutocompleteResult::Single("cd Documents/".to_string())
        );
        assert_eq!(
            autocomplete("cat Documents/read", &fs, &env),
            AutocompleteResult::Single("cat Documents/readme.txt ".to_string())
        );
    }

    #[test]
    fn test_path_completion_multiple() {
        let (fs, env) = setup();
        match autocomplete("ls /etc/", &fs, &env) {
            AutocompleteResult::Multiple(common, names) => {
                assert_eq!(common, "ls /etc/");
                assert!(names.contains(&"hostname".to_string()));
                assert!(names.contains(&"passwd".to_string()));
            }
            other => panic!("Expected multiple matches, got {:?}", other),
        }
    }

    #[test]
    fn test_hidden_entries_need_dot() {
        let (fs, env) = setup();
        assert_eq!(
            autocomplete("cat .bash", &fs, &env),
            AutocompleteResult::Single("cat .bashrc ".to_string())
        );
        match autocomplete("ls ", &fs, &env) {
            AutocompleteResult::Multiple(_, names) => {
                assert!(!names.iter().any(|n| n.starts_with('.')));
            }
            other => panic!("Expected multiple matches, got {:?}", other),
        }
    }

    #[test]
    fn test_cd_only_offers_directories() {
        let (fs, env) = setup();
        assert_eq!(
            autocomplete("cd /etc/host", &fs, &env),
            AutocompleteResult::None
        );
    }

    #[test]
    fn test_command_position_after_pipe() {
        let (fs, env) = setup();
        assert_eq!(
            autocomplete("ls | gre", &fs, &env),
            AutocompleteResult::Single("ls | grep ".to_string())
        );
    }

    #[test]
    fn test_hint() {
        let (fs, env) = setup();
        assert_eq!(get_hint("whoa", &fs, &env), Some("mi".to_string()));
        assert_eq!(get_hint("cd Docu", &fs, &env), Some("ments/".to_string()));
        assert_eq!(get_hint("whoami", &fs, &env), None);
    }

    #[test]
    fn test_common_prefix() {
        let strings = vec![
            "hello".to_string(),
            "help".to_string(),
            "helicopter".to_string(),
        ];
        assert_eq!(find_common_prefix(&strings), "hel");
        assert_eq!(find_common_prefix(&["abc".to_string(), "xyz".to_string()]), "");
    }
}
