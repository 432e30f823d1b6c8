//! Session configuration.
//!
//! Centralizes the constants used throughout the shell and file system, plus
//! [`ShellConfig`], the per-session settings that can be loaded from JSON.

use std::collections::BTreeMap;

use serde::Deserialize;

// =============================================================================
// Identity
// =============================================================================

/// User name of a fresh session.
pub const DEFAULT_USER: &str = "user";

/// Host name reported by `hostname`, `uname -n` and the prompt.
pub const DEFAULT_HOSTNAME: &str = "termfs";

/// Parent of every user's home directory.
pub const HOME_ROOT: &str = "/home";

/// Numeric user/group id reported by `id`.
pub const DEFAULT_UID: u32 = 1000;

// =============================================================================
// Environment Defaults
// =============================================================================

/// Variables seeded into every session (on top of USER/HOME/PWD/HOSTNAME).
pub const DEFAULT_VARS: &[(&str, &str)] = &[
    ("SHELL", "/bin/bash"),
    ("PATH", "/usr/local/bin:/usr/bin:/bin"),
    ("TERM", "xterm-256color"),
    ("LANG", "en_US.UTF-8"),
    ("EDITOR", "vim"),
];

/// Aliases seeded into every session.
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[("la", "ls -a"), ("l", "ls -l")];

// =============================================================================
// Terminal Configuration
// =============================================================================

/// Maximum number of command history entries to keep.
pub const MAX_COMMAND_HISTORY: usize = 1000;

/// Maximum number of transcript entries (displayed output) to keep.
pub const MAX_TRANSCRIPT: usize = 500;

/// Maximum nesting of `source` inside sourced files.
pub const MAX_SOURCE_DEPTH: usize = 16;

/// Text filter defaults.
pub mod filters {
    /// Default number of lines for `head`.
    pub const DEFAULT_HEAD_LINES: usize = 10;
    /// Default number of lines for `tail`.
    pub const DEFAULT_TAIL_LINES: usize = 10;
}

// =============================================================================
// Simulated System
// =============================================================================

/// Fields reported by `uname`.
pub mod uname {
    pub const SYSNAME: &str = "Linux";
    pub const RELEASE: &str = "6.1.0-termfs";
    pub const VERSION: &str = "#1 SMP PREEMPT_DYNAMIC";
    pub const MACHINE: &str = "x86_64";
    pub const OS: &str = "GNU/Linux";
}

/// Display name of the simulated distribution.
pub const OS_PRETTY_NAME: &str = "TermFS 1.0";

/// Canned `df` table. Sizes are 1K blocks.
pub const DF_ROWS: &[(&str, u64, u64, &str)] = &[
    ("/dev/vda1", 20_511_312, 6_291_456, "/"),
    ("tmpfs", 1_024_000, 4_096, "/tmp"),
    ("/dev/vda2", 51_474_912, 12_582_912, "/home"),
];

/// Canned `du` figure in 1K blocks.
pub const DU_BLOCKS: u64 = 4;

/// Canned process table: (pid, command, cpu%, mem%).
pub const PROCESSES: &[(u32, &str, f32, f32)] = &[
    (1, "init", 0.0, 0.1),
    (42, "systemd-journald", 0.0, 0.3),
    (117, "sshd", 0.0, 0.2),
    (256, "bash", 0.1, 0.4),
];

/// Canned memory figures in MiB: (total, used).
pub const MEMORY_MIB: (u64, u64) = (2048, 412);

// =============================================================================
// Text Assets
// =============================================================================

/// Sayings for `fortune`.
pub const FORTUNES: &[&str] = &[
    "A journey of a thousand miles begins with a single step.",
    "There is no place like 127.0.0.1.",
    "To understand recursion, you must first understand recursion.",
    "It works on my machine.",
    "The best way to predict the future is to invent it.",
    "Talk is cheap. Show me the code.",
    "Simplicity is prerequisite for reliability.",
];

/// Logo printed by `neofetch`.
pub const NEOFETCH_LOGO: &[&str] = &[
    r"   _______   ",
    r"  |__   __|  ",
    r"     | |     ",
    r"     | |     ",
    r"     |_|     ",
    r"             ",
];

// =============================================================================
// Shell Config
// =============================================================================

/// Per-session settings.
///
/// Every field is optional in JSON; missing fields fall back to the constants
/// above.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Login name (also names the home directory).
    pub user: String,
    /// Host name.
    pub hostname: String,
    /// Command history capacity.
    pub history_capacity: usize,
    /// Transcript capacity.
    pub transcript_capacity: usize,
    /// Extra variables applied over the defaults.
    pub variables: BTreeMap<String, String>,
    /// Extra aliases applied over the defaults.
    pub aliases: BTreeMap<String, String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            user: DEFAULT_USER.to_string(),
            hostname: DEFAULT_HOSTNAME.to_string(),
            history_capacity: MAX_COMMAND_HISTORY,
            transcript_capacity: MAX_TRANSCRIPT,
            variables: BTreeMap::new(),
            aliases: BTreeMap::new(),
        }
    }
}

impl ShellConfig {
    /// Parse a config from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Home directory of the configured user.
    pub fn home_dir(&self) -> String {
        format!("{}/{}", HOME_ROOT, self.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ShellConfig::default();
        assert_eq!(config.user, DEFAULT_USER);
        assert_eq!(config.home_dir(), "/home/user");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ShellConfig::from_json(r#"{"user": "alice"}"#).unwrap();
        assert_eq!(config.user, "alice");
        assert_eq!(config.hostname, DEFAULT_HOSTNAME);
        assert_eq!(config.history_capacity, MAX_COMMAND_HISTORY);
        assert_eq!(config.home_dir(), "/home/alice");
    }

    #[test]
    fn test_json_aliases() {
        let config = ShellConfig::from_json(r#"{"aliases": {"g": "grep -i"}}"#).unwrap();
        assert_eq!(config.aliases.get("g").map(String::as_str), Some("grep -i"));
    }
}
