//! The shell session: one file system, environment and history.
//!
//! Every piece of mutable state lives on [`Shell`]; two sessions never share
//! anything, so tests can run any number side by side.

use std::collections::BTreeSet;

use crate::autocomplete::{self, AutocompleteResult};
use crate::commands::Effect;
use crate::config::{DEFAULT_UID, ShellConfig};
use crate::env::Environment;
use crate::executor;
use crate::filesystem::{FileSystemEngine, now_millis, path};
use crate::history::HistoryBuffer;
use crate::models::Manifest;
use crate::utils::RingBuffer;

/// Who the session runs as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user: String,
    pub hostname: String,
    pub uid: u32,
}

/// One displayed line of the terminal: the input and what it printed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub input: String,
    pub output: String,
    pub success: bool,
}

/// Result of [`Shell::execute`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineResult {
    pub output: String,
    pub success: bool,
    /// The transcript was cleared.
    pub cleared: bool,
    /// The session asked to end with this status.
    pub exit: Option<i32>,
}

/// An interactive shell session.
pub struct Shell {
    pub(crate) fs: FileSystemEngine,
    pub(crate) env: Environment,
    pub(crate) history: HistoryBuffer,
    pub(crate) identity: Identity,
    /// Session start, milliseconds since the epoch.
    pub(crate) started_at: u64,
    /// Status of the last executed segment (`$?`).
    pub(crate) last_status: bool,
    /// Simulated processes terminated with `kill`.
    pub(crate) killed: BTreeSet<u32>,
    pub(crate) source_depth: usize,
    transcript: RingBuffer<TranscriptEntry>,
}

impl Shell {
    /// A session over the stock file system layout.
    pub fn new(config: &ShellConfig) -> Self {
        let manifest = Manifest::default_layout(&config.user, &config.hostname);
        Self::with_manifest(config, &manifest)
    }

    /// A session over a custom initial tree.
    pub fn with_manifest(config: &ShellConfig, manifest: &Manifest) -> Self {
        let fs = FileSystemEngine::from_manifest(manifest, &config.home_dir());
        Self::with_fs(config, fs)
    }

    /// A session over an already built (for instance restored) file system.
    pub fn with_fs(config: &ShellConfig, fs: FileSystemEngine) -> Self {
        let mut shell = Self {
            fs,
            env: Environment::seeded(config),
            history: HistoryBuffer::new(config.history_capacity),
            identity: Identity {
                user: config.user.clone(),
                hostname: config.hostname.clone(),
                uid: DEFAULT_UID,
            },
            started_at: now_millis(),
            last_status: true,
            killed: BTreeSet::new(),
            source_depth: 0,
            transcript: RingBuffer::new(config.transcript_capacity),
        };
        let cwd = shell.fs.current_dir().to_string();
        shell.set_var("PWD", &cwd);

        if shell.fs.resolve_path("~/.bashrc").is_some_and(|n| !n.is_folder()) {
            let outcome = executor::run_line(&mut shell, "source ~/.bashrc", false);
            if !outcome.success {
                tracing::warn!(output = %outcome.output, "~/.bashrc failed");
            }
            shell.last_status = true;
        }

        tracing::info!(
            user = %shell.identity.user,
            host = %shell.identity.hostname,
            nodes = shell.fs.len(),
            "session started"
        );
        shell
    }

    /// Execute one input line and record it in the history and transcript.
    pub fn execute(&mut self, line: &str) -> LineResult {
        let outcome = executor::run_line(self, line, true);
        let cleared = outcome.effect == Some(Effect::Clear);
        if cleared {
            self.transcript.clear();
        } else if !line.trim().is_empty() {
            self.transcript.push(TranscriptEntry {
                input: line.to_string(),
                output: outcome.output.clone(),
                success: outcome.success,
            });
        }

        let exit = match outcome.effect {
            Some(Effect::Exit(code)) => Some(code),
            _ => None,
        };
        if let Some(code) = exit {
            tracing::info!(code, "session exit requested");
        }
        LineResult {
            output: outcome.output,
            success: outcome.success,
            cleared,
            exit,
        }
    }

    /// Tab completion of the current input.
    pub fn complete(&self, input: &str) -> AutocompleteResult {
        autocomplete::autocomplete(input, &self.fs, &self.env)
    }

    /// Ghost text to show after the current input.
    pub fn hint(&self, input: &str) -> Option<String> {
        autocomplete::get_hint(input, &self.fs, &self.env)
    }

    /// Prompt string, e.g. `user@termfs:~/Documents$ `.
    pub fn prompt(&self) -> String {
        format!(
            "{}@{}:{}$ ",
            self.identity.user,
            self.identity.hostname,
            path::display_path(self.fs.current_dir(), self.fs.home_dir())
        )
    }

    /// Step back through the history (arrow up).
    pub fn recall_previous(&mut self) -> Option<&str> {
        self.history.recall_previous()
    }

    /// Step forward through the history (arrow down).
    pub fn recall_next(&mut self) -> Option<&str> {
        self.history.recall_next()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn fs(&self) -> &FileSystemEngine {
        &self.fs
    }

    pub fn fs_mut(&mut self) -> &mut FileSystemEngine {
        &mut self.fs
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn transcript(&self) -> &RingBuffer<TranscriptEntry> {
        &self.transcript
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Status of the last executed command.
    pub fn last_status(&self) -> bool {
        self.last_status
    }

    pub(crate) fn set_var(&mut self, key: &str, value: &str) {
        if let Err(err) = self.env.set(key, value) {
            tracing::warn!(%err, "variable not set");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_starts_home() {
        let sh = Shell::new(&ShellConfig::default());
        assert_eq!(sh.fs().current_dir(), "/home/user");
        assert_eq!(sh.env().get("PWD"), Some("/home/user"));
        assert_eq!(sh.prompt(), "user@termfs:~$ ");
    }

    #[test]
    fn test_bashrc_is_sourced() {
        let sh = Shell::new(&ShellConfig::default());
        assert_eq!(sh.env().alias("ll"), Some("ls -la"));
        assert_eq!(sh.env().get("EDITOR"), Some("vim"));
        assert!(sh.history().is_empty());
    }

    #[test]
    fn test_transcript_and_clear() {
        let mut sh = Shell::new(&ShellConfig::default());
        sh.execute("echo one");
        sh.execute("pwd");
        assert_eq!(sh.transcript().len(), 2);
        assert_eq!(sh.transcript().last().map(|e| e.output.as_str()), Some("/home/user"));

        let result = sh.execute("clear");
        assert!(result.cleared);
        assert!(sh.transcript().is_empty());
        // History survives clear.
        assert_eq!(sh.history().len(), 3);
    }

    #[test]
    fn test_prompt_follows_cd() {
        let mut sh = Shell::new(&ShellConfig::default());
        sh.execute("cd Documents");
        assert_eq!(sh.prompt(), "user@termfs:~/Documents$ ");
        sh.execute("cd /etc");
        assert_eq!(sh.prompt(), "user@termfs:/etc$ ");
    }

    #[test]
    fn test_recall() {
        let mut sh = Shell::new(&ShellConfig::default());
        sh.execute("echo a");
        sh.execute("echo b");
        assert_eq!(sh.recall_previous(), Some("echo b"));
        assert_eq!(sh.recall_previous(), Some("echo a"));
        assert_eq!(sh.recall_next(), Some("echo b"));
    }

    #[test]
    fn test_sessions_are_independent() {
        let mut a = Shell::new(&ShellConfig::default());
        let b = Shell::new(&ShellConfig::default());
        a.execute("mkdir /only-in-a");
        assert!(a.fs().exists("/only-in-a"));
        assert!(!b.fs().exists("/only-in-a"));
    }

    #[test]
    fn test_custom_identity() {
        let config = ShellConfig {
            user: "alice".to_string(),
            hostname: "box".to_string(),
            ..ShellConfig::default()
        };
        let mut sh = Shell::new(&config);
        assert_eq!(sh.execute("whoami").output, "alice");
        assert_eq!(sh.execute("pwd").output, "/home/alice");
        assert_eq!(sh.identity().hostname, "box");
    }
}
