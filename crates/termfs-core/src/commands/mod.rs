//! Builtin commands.
//!
//! This module provides:
//! - [`Builtin`], the closed set of commands the shell knows
//! - [`Invocation`], a parsed command line with flags split from operands
//! - [`CommandResult`], what a command hands back to the executor
//!
//! # Architecture
//!
//! The executor looks a command word up with [`Builtin::from_name`], parses
//! its arguments against the builtin's option table, then calls
//! [`run_builtin`]. Handlers live in topic modules: `files` (file system),
//! `text` (text filters), `system` (simulated system info) and `shell`
//! (session state).

mod args;
mod files;
mod result;
mod shell;
mod system;
mod text;

pub use args::{Flags, Invocation};
pub use result::{CommandResult, Effect};

use crate::session::Shell;

// =============================================================================
// Builtin Table
// =============================================================================

/// Every command the shell can run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Builtin {
    Help,
    Clear,
    Exit,
    Pwd,
    Cd,
    Ls,
    Cat,
    Head,
    Tail,
    Less,
    More,
    Touch,
    Mkdir,
    Rm,
    Rmdir,
    Cp,
    Mv,
    Ln,
    Chmod,
    Chown,
    Echo,
    Grep,
    Wc,
    Sort,
    Uniq,
    Whoami,
    Id,
    Hostname,
    Uname,
    Date,
    Uptime,
    Df,
    Du,
    Ps,
    Top,
    Kill,
    Which,
    Type,
    Man,
    History,
    Env,
    Export,
    Unset,
    Alias,
    Unalias,
    Set,
    Source,
    True,
    False,
    Test,
    Sleep,
    Neofetch,
    Cowsay,
    Fortune,
    Cal,
    Bc,
    Find,
    Tree,
}

/// Option table of a builtin: accepted short flags plus long spellings that
/// map onto them.
pub(crate) struct Options {
    pub short: &'static str,
    pub long: &'static [(&'static str, char)],
}

impl Options {
    const NONE: Options = Options {
        short: "",
        long: &[],
    };
}

impl Builtin {
    pub const ALL: &'static [Builtin] = &[
        Self::Help,
        Self::Clear,
        Self::Exit,
        Self::Pwd,
        Self::Cd,
        Self::Ls,
        Self::Cat,
        Self::Head,
        Self::Tail,
        Self::Less,
        Self::More,
        Self::Touch,
        Self::Mkdir,
        Self::Rm,
        Self::Rmdir,
        Self::Cp,
        Self::Mv,
        Self::Ln,
        Self::Chmod,
        Self::Chown,
        Self::Echo,
        Self::Grep,
        Self::Wc,
        Self::Sort,
        Self::Uniq,
        Self::Whoami,
        Self::Id,
        Self::Hostname,
        Self::Uname,
        Self::Date,
        Self::Uptime,
        Self::Df,
        Self::Du,
        Self::Ps,
        Self::Top,
        Self::Kill,
        Self::Which,
        Self::Type,
        Self::Man,
        Self::History,
        Self::Env,
        Self::Export,
        Self::Unset,
        Self::Alias,
        Self::Unalias,
        Self::Set,
        Self::Source,
        Self::True,
        Self::False,
        Self::Test,
        Self::Sleep,
        Self::Neofetch,
        Self::Cowsay,
        Self::Fortune,
        Self::Cal,
        Self::Bc,
        Self::Find,
        Self::Tree,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Clear => "clear",
            Self::Exit => "exit",
            Self::Pwd => "pwd",
            Self::Cd => "cd",
            Self::Ls => "ls",
            Self::Cat => "cat",
            Self::Head => "head",
            Self::Tail => "tail",
            Self::Less => "less",
            Self::More => "more",
            Self::Touch => "touch",
            Self::Mkdir => "mkdir",
            Self::Rm => "rm",
            Self::Rmdir => "rmdir",
            Self::Cp => "cp",
            Self::Mv => "mv",
            Self::Ln => "ln",
            Self::Chmod => "chmod",
            Self::Chown => "chown",
            Self::Echo => "echo",
            Self::Grep => "grep",
            Self::Wc => "wc",
            Self::Sort => "sort",
            Self::Uniq => "uniq",
            Self::Whoami => "whoami",
            Self::Id => "id",
            Self::Hostname => "hostname",
            Self::Uname => "uname",
            Self::Date => "date",
            Self::Uptime => "uptime",
            Self::Df => "df",
            Self::Du => "du",
            Self::Ps => "ps",
            Self::Top => "top",
            Self::Kill => "kill",
            Self::Which => "which",
            Self::Type => "type",
            Self::Man => "man",
            Self::History => "history",
            Self::Env => "env",
            Self::Export => "export",
            Self::Unset => "unset",
            Self::Alias => "alias",
            Self::Unalias => "unalias",
            Self::Set => "set",
            Self::Source => "source",
            Self::True => "true",
            Self::False => "false",
            Self::Test => "test",
            Self::Sleep => "sleep",
            Self::Neofetch => "neofetch",
            Self::Cowsay => "cowsay",
            Self::Fortune => "fortune",
            Self::Cal => "cal",
            Self::Bc => "bc",
            Self::Find => "find",
            Self::Tree => "tree",
        }
    }

    /// Look a command word up, case-insensitively. `.` is `source` and `[`
    /// is `test`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "." => return Some(Self::Source),
            "[" => return Some(Self::Test),
            _ => {}
        }
        let lower = name.to_lowercase();
        Self::ALL.iter().copied().find(|b| b.name() == lower)
    }

    /// Shell keywords exist only inside the shell; everything else also has
    /// a (metadata-only) binary in the file system.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            Self::Help
                | Self::Exit
                | Self::Cd
                | Self::History
                | Self::Export
                | Self::Unset
                | Self::Alias
                | Self::Unalias
                | Self::Set
                | Self::Source
                | Self::Type
        )
    }

    /// One-line description for `help` and `man`.
    pub fn summary(self) -> &'static str {
        match self {
            Self::Help => "list commands or show usage of one",
            Self::Clear => "clear the terminal screen",
            Self::Exit => "exit the shell",
            Self::Pwd => "print the current directory",
            Self::Cd => "change the current directory",
            Self::Ls => "list directory contents",
            Self::Cat => "concatenate and print files",
            Self::Head => "print the first lines of input",
            Self::Tail => "print the last lines of input",
            Self::Less | Self::More => "page through a file",
            Self::Touch => "create a file or refresh its timestamp",
            Self::Mkdir => "make directories",
            Self::Rm => "remove files or directories",
            Self::Rmdir => "remove empty directories",
            Self::Cp => "copy files and directories",
            Self::Mv => "move or rename files",
            Self::Ln => "make symbolic links",
            Self::Chmod => "change file mode bits",
            Self::Chown => "change file owner and group",
            Self::Echo => "print arguments",
            Self::Grep => "print lines matching a pattern",
            Self::Wc => "count lines, words and bytes",
            Self::Sort => "sort lines of text",
            Self::Uniq => "drop repeated adjacent lines",
            Self::Whoami => "print the current user name",
            Self::Id => "print user and group ids",
            Self::Hostname => "print the host name",
            Self::Uname => "print system information",
            Self::Date => "print the date and time",
            Self::Uptime => "show how long the session has run",
            Self::Df => "report file system disk usage",
            Self::Du => "estimate file space usage",
            Self::Ps => "list processes",
            Self::Top => "show a process summary",
            Self::Kill => "signal a process",
            Self::Which => "locate a command binary",
            Self::Type => "describe how a name is interpreted",
            Self::Man => "show the manual page of a command",
            Self::History => "show or clear command history",
            Self::Env => "print environment variables",
            Self::Export => "set environment variables",
            Self::Unset => "remove environment variables",
            Self::Alias => "define or list aliases",
            Self::Unalias => "remove aliases",
            Self::Set => "list shell variables",
            Self::Source => "run commands from a file",
            Self::True => "do nothing, successfully",
            Self::False => "do nothing, unsuccessfully",
            Self::Test => "evaluate a conditional expression",
            Self::Sleep => "pause for a while",
            Self::Neofetch => "show system information with a logo",
            Self::Cowsay => "a talking cow",
            Self::Fortune => "print a random saying",
            Self::Cal => "display a calendar",
            Self::Bc => "evaluate arithmetic expressions",
            Self::Find => "search for files in a directory tree",
            Self::Tree => "list a directory tree",
        }
    }

    /// Synopsis line, printed by `--help`, `help <cmd>` and `man`.
    pub fn usage(self) -> &'static str {
        match self {
            Self::Help => "help [command]",
            Self::Clear => "clear",
            Self::Exit => "exit [n]",
            Self::Pwd => "pwd",
            Self::Cd => "cd [dir | -]",
            Self::Ls => "ls [-l] [-a] [-h] [path...]",
            Self::Cat => "cat [-n] [file...]",
            Self::Head => "head [-n lines] [file...]",
            Self::Tail => "tail [-n lines] [file...]",
            Self::Less => "less [file...]",
            Self::More => "more [file...]",
            Self::Touch => "touch file...",
            Self::Mkdir => "mkdir [-p] dir...",
            Self::Rm => "rm [-r] [-f] path...",
            Self::Rmdir => "rmdir dir...",
            Self::Cp => "cp [-r] source... dest",
            Self::Mv => "mv source... dest",
            Self::Ln => "ln -s target [link]",
            Self::Chmod => "chmod [-R] mode file...",
            Self::Chown => "chown [-R] owner[:group] file...",
            Self::Echo => "echo [-n] [-e] [text...]",
            Self::Grep => "grep [-i] [-c] [-n] [-v] pattern [file...]",
            Self::Wc => "wc [-l] [-w] [-c] [file...]",
            Self::Sort => "sort [-r] [-n] [-u] [file...]",
            Self::Uniq => "uniq [-c] [file]",
            Self::Whoami => "whoami",
            Self::Id => "id [user]",
            Self::Hostname => "hostname",
            Self::Uname => "uname [-a] [-s] [-n] [-r] [-m]",
            Self::Date => "date [-u] [+format]",
            Self::Uptime => "uptime",
            Self::Df => "df [-h]",
            Self::Du => "du [-h] [-s] [path...]",
            Self::Ps => "ps",
            Self::Top => "top",
            Self::Kill => "kill [-signal] pid...",
            Self::Which => "which command...",
            Self::Type => "type name...",
            Self::Man => "man command",
            Self::History => "history [-c] [n]",
            Self::Env => "env",
            Self::Export => "export [name[=value]...]",
            Self::Unset => "unset name...",
            Self::Alias => "alias [name[=value]...]",
            Self::Unalias => "unalias [-a] name...",
            Self::Set => "set",
            Self::Source => "source file",
            Self::True => "true",
            Self::False => "false",
            Self::Test => "test expr | [ expr ]",
            Self::Sleep => "sleep seconds",
            Self::Neofetch => "neofetch",
            Self::Cowsay => "cowsay [text...]",
            Self::Fortune => "fortune",
            Self::Cal => "cal [[month] year]",
            Self::Bc => "bc [expression]",
            Self::Find => "find [path] [-name pattern] [-iname pattern] [-type f|d]",
            Self::Tree => "tree [-a] [path]",
        }
    }

    /// Option table, or `None` when the command reads its arguments raw.
    pub(crate) fn options(self) -> Option<Options> {
        let options = match self {
            Self::Ls => Options {
                short: "lah",
                long: &[("all", 'a'), ("human-readable", 'h')],
            },
            Self::Cat => Options {
                short: "n",
                long: &[("number", 'n')],
            },
            Self::Mkdir => Options {
                short: "p",
                long: &[("parents", 'p')],
            },
            Self::Rm => Options {
                short: "rRf",
                long: &[("recursive", 'r'), ("force", 'f')],
            },
            Self::Cp => Options {
                short: "rR",
                long: &[("recursive", 'r')],
            },
            Self::Ln => Options {
                short: "s",
                long: &[("symbolic", 's')],
            },
            Self::Chmod | Self::Chown => Options {
                short: "R",
                long: &[("recursive", 'R')],
            },
            Self::Grep => Options {
                short: "icnv",
                long: &[
                    ("ignore-case", 'i'),
                    ("count", 'c'),
                    ("line-number", 'n'),
                    ("invert-match", 'v'),
                ],
            },
            Self::Wc => Options {
                short: "lwc",
                long: &[("lines", 'l'), ("words", 'w'), ("bytes", 'c')],
            },
            Self::Sort => Options {
                short: "rnu",
                long: &[("reverse", 'r'), ("numeric-sort", 'n'), ("unique", 'u')],
            },
            Self::Uniq => Options {
                short: "c",
                long: &[("count", 'c')],
            },
            Self::Uname => Options {
                short: "asnrm",
                long: &[
                    ("all", 'a'),
                    ("kernel-name", 's'),
                    ("nodename", 'n'),
                    ("kernel-release", 'r'),
                    ("machine", 'm'),
                ],
            },
            Self::Date => Options {
                short: "u",
                long: &[("utc", 'u')],
            },
            Self::Df => Options {
                short: "h",
                long: &[("human-readable", 'h')],
            },
            Self::Du => Options {
                short: "hs",
                long: &[("human-readable", 'h'), ("summarize", 's')],
            },
            Self::Tree => Options {
                short: "a",
                long: &[],
            },
            Self::History => Options {
                short: "c",
                long: &[],
            },
            Self::Unalias => Options {
                short: "a",
                long: &[],
            },
            Self::Pwd
            | Self::Cd
            | Self::Less
            | Self::More
            | Self::Touch
            | Self::Rmdir
            | Self::Mv
            | Self::Whoami
            | Self::Id
            | Self::Hostname
            | Self::Uptime
            | Self::Ps
            | Self::Top
            | Self::Which
            | Self::Type
            | Self::Man
            | Self::Env
            | Self::Unset
            | Self::Fortune
            | Self::Neofetch
            | Self::Clear
            | Self::Set => Options::NONE,
            Self::Help
            | Self::Exit
            | Self::Head
            | Self::Tail
            | Self::Echo
            | Self::Kill
            | Self::Export
            | Self::Alias
            | Self::Source
            | Self::True
            | Self::False
            | Self::Test
            | Self::Sleep
            | Self::Cowsay
            | Self::Cal
            | Self::Bc
            | Self::Find => return None,
        };
        Some(options)
    }
}

impl std::fmt::Display for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Run one parsed builtin. `stdin` carries the previous pipe stage's output.
pub(crate) fn run_builtin(
    shell: &mut Shell,
    inv: &Invocation,
    stdin: Option<&str>,
) -> CommandResult {
    if inv.flags.has_long("help") {
        return CommandResult::ok(format!("usage: {}", inv.builtin.usage()));
    }
    tracing::debug!(command = %inv.builtin, args = ?inv.args, "dispatch");

    match inv.builtin {
        Builtin::Pwd => files::pwd(shell),
        Builtin::Cd => files::cd(shell, inv),
        Builtin::Ls => files::ls(shell, inv),
        Builtin::Cat | Builtin::Less | Builtin::More => files::cat(shell, inv, stdin),
        Builtin::Touch => files::touch(shell, inv),
        Builtin::Mkdir => files::mkdir(shell, inv),
        Builtin::Rm => files::rm(shell, inv),
        Builtin::Rmdir => files::rmdir(shell, inv),
        Builtin::Cp => files::cp(shell, inv),
        Builtin::Mv => files::mv(shell, inv),
        Builtin::Ln => files::ln(shell, inv),
        Builtin::Chmod => files::chmod(shell, inv),
        Builtin::Chown => files::chown(shell, inv),
        Builtin::Find => files::find(shell, inv),
        Builtin::Tree => files::tree(shell, inv),
        Builtin::Du => files::du(shell, inv),
        Builtin::Df => files::df(inv),

        Builtin::Echo => text::echo(inv),
        Builtin::Head => text::head(shell, inv, stdin),
        Builtin::Tail => text::tail(shell, inv, stdin),
        Builtin::Grep => text::grep(shell, inv, stdin),
        Builtin::Wc => text::wc(shell, inv, stdin),
        Builtin::Sort => text::sort(shell, inv, stdin),
        Builtin::Uniq => text::uniq(shell, inv, stdin),
        Builtin::Cowsay => text::cowsay(inv, stdin),
        Builtin::Bc => text::bc(inv, stdin),

        Builtin::Help => system::help(inv),
        Builtin::Man => system::man(inv),
        Builtin::Clear => CommandResult::empty().with_effect(Effect::Clear),
        Builtin::Exit => system::exit(shell, inv),
        Builtin::Whoami => CommandResult::ok(shell.identity.user.clone()),
        Builtin::Id => system::id(shell, inv),
        Builtin::Hostname => CommandResult::ok(shell.identity.hostname.clone()),
        Builtin::Uname => system::uname(shell, inv),
        Builtin::Date => system::date(inv),
        Builtin::Uptime => system::uptime(shell),
        Builtin::Ps => system::ps(shell),
        Builtin::Top => system::top(shell),
        Builtin::Kill => system::kill(shell, inv),
        Builtin::Which => system::which(shell, inv),
        Builtin::Type => system::type_of(shell, inv),
        Builtin::Sleep => system::sleep(inv),
        Builtin::Neofetch => system::neofetch(shell),
        Builtin::Fortune => system::fortune(),
        Builtin::Cal => system::cal(inv),

        Builtin::History => shell::history(shell, inv),
        Builtin::Env | Builtin::Set => shell::env(shell),
        Builtin::Export => shell::export(shell, inv),
        Builtin::Unset => shell::unset(shell, inv),
        Builtin::Alias => shell::alias(shell, inv),
        Builtin::Unalias => shell::unalias(shell, inv),
        Builtin::Source => shell::source(shell, inv),
        Builtin::True => CommandResult::empty(),
        Builtin::False => CommandResult::failure(),
        Builtin::Test => shell::test(shell, inv),
    }
}
