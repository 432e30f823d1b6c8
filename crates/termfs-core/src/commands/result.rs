//! Command execution result type.

use crate::error::{FsError, ShellError};

/// Request a command makes of the session beyond printing text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Empty the transcript (`clear`).
    Clear,
    /// End the session with a status code (`exit`).
    Exit(i32),
}

/// Result of executing a command.
///
/// `stdout` feeds the next pipe stage; `stderr` always goes to the terminal.
/// Neither carries a trailing newline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub effect: Option<Effect>,
}

impl CommandResult {
    /// Successful result with output.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            success: true,
            ..Default::default()
        }
    }

    /// Successful result with no output.
    pub fn empty() -> Self {
        Self::ok(String::new())
    }

    /// Failed result with an error message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            stderr: message.into(),
            success: false,
            ..Default::default()
        }
    }

    /// Failed result with no output.
    pub fn failure() -> Self {
        Self::error(String::new())
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = Some(effect);
        self
    }

    pub(crate) fn push_stdout(&mut self, text: &str) {
        push_line(&mut self.stdout, text);
    }

    /// Append an error line and mark the result failed.
    pub(crate) fn push_stderr(&mut self, text: &str) {
        push_line(&mut self.stderr, text);
        self.success = false;
    }

    /// Both streams in display order: output first, then errors.
    /// Trailing newlines of raw file content are dropped.
    pub fn output(&self) -> String {
        let stdout = self.stdout.trim_end_matches('\n');
        match (stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => stdout.to_string(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", stdout, self.stderr),
        }
    }
}

fn push_line(buffer: &mut String, text: &str) {
    if !buffer.is_empty() {
        buffer.push('\n');
    }
    buffer.push_str(text);
}

impl From<ShellError> for CommandResult {
    fn from(err: ShellError) -> Self {
        Self::error(err.to_string())
    }
}

impl From<FsError> for CommandResult {
    fn from(err: FsError) -> Self {
        Self::error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_and_error() {
        let ok = CommandResult::ok("hi");
        assert!(ok.success);
        assert_eq!(ok.output(), "hi");

        let err = CommandResult::error("boom");
        assert!(!err.success);
        assert_eq!(err.output(), "boom");
    }

    #[test]
    fn test_push_stderr_marks_failure() {
        let mut result = CommandResult::ok("a");
        result.push_stdout("b");
        result.push_stderr("bad");
        assert!(!result.success);
        assert_eq!(result.output(), "a\nb\nbad");
    }

    #[test]
    fn test_output_trims_file_newlines() {
        let mut result = CommandResult::ok("line\n\n");
        assert_eq!(result.output(), "line");
        result.push_stderr("cat: x: No such file or directory");
        assert_eq!(result.output(), "line\ncat: x: No such file or directory");
    }

    #[test]
    fn test_from_shell_error() {
        let result = CommandResult::from(ShellError::CommandNotFound("foo".into()));
        assert_eq!(result.stderr, "command not found: foo");
        assert!(!result.success);
    }

    #[test]
    fn test_effect() {
        let result = CommandResult::empty().with_effect(Effect::Exit(3));
        assert_eq!(result.effect, Some(Effect::Exit(3)));
    }
}
