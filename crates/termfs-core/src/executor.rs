//! Line execution: expansion, chain gating, pipes and builtin dispatch.
//!
//! A line runs to completion before the next one is accepted. Each chain
//! segment is either skipped (gated by `&&` behind a failure) or run as a
//! pipeline whose stages hand their stdout to the next stage.

use crate::commands::{Builtin, CommandResult, Effect, Invocation, run_builtin};
use crate::error::ShellError;
use crate::parser::{self, ParsedCommand};
use crate::session::Shell;

/// What one executed line produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LineOutcome {
    /// Display text of every segment that printed something, newline-joined.
    pub output: String,
    pub success: bool,
    pub effect: Option<Effect>,
}

impl LineOutcome {
    fn failed(output: String) -> Self {
        Self {
            output,
            success: false,
            effect: None,
        }
    }
}

/// Run one raw input line. `record` pushes the history-expanded line into
/// the command history before it runs.
pub(crate) fn run_line(shell: &mut Shell, line: &str, record: bool) -> LineOutcome {
    let line = line.trim();
    if line.is_empty() {
        shell.history.reset_cursor();
        return LineOutcome {
            output: String::new(),
            success: true,
            effect: None,
        };
    }

    let expanded = match parser::expand_history(line, &shell.history) {
        Ok(text) => text.into_owned(),
        Err(err) => {
            shell.last_status = false;
            return LineOutcome::failed(err.to_string());
        }
    };
    // Recorded before running: `history` lists its own line, and failing
    // commands are kept too. `!!` stores the text it expanded to.
    if record {
        shell.history.push(&expanded);
    }

    let aliased = parser::expand_aliases(&expanded, &shell.env).into_owned();
    let status = if shell.last_status { "0" } else { "1" };
    let text = parser::expand_variables(&aliased, |name| match name {
        "?" => Some(status.to_string()),
        _ => shell.env.get(name).map(str::to_string),
    })
    .into_owned();

    let segments = match parser::split_chain(&text) {
        Ok(segments) => segments,
        Err(err) => {
            shell.last_status = false;
            return LineOutcome::failed(err.to_string());
        }
    };

    let mut outputs = Vec::new();
    let mut success = true;
    let mut effect = None;
    for segment in &segments {
        if segment.requires_prior_success && !success {
            tracing::trace!(segment = %segment.text, "skipped after failure");
            continue;
        }
        let result = run_segment(shell, &segment.text);
        success = result.success;
        shell.last_status = success;

        match result.effect {
            Some(Effect::Clear) => {
                return LineOutcome {
                    output: String::new(),
                    success,
                    effect: Some(Effect::Clear),
                };
            }
            Some(Effect::Exit(code)) => {
                push_output(&mut outputs, &result);
                effect = Some(Effect::Exit(code));
                break;
            }
            None => push_output(&mut outputs, &result),
        }
    }

    LineOutcome {
        output: outputs.join("\n"),
        success,
        effect,
    }
}

fn push_output(outputs: &mut Vec<String>, result: &CommandResult) {
    let display = result.output();
    if !display.is_empty() {
        outputs.push(display);
    }
}

/// Run one chain segment as a pipeline.
fn run_segment(shell: &mut Shell, segment: &str) -> CommandResult {
    let pipeline = match parser::parse_pipeline(segment) {
        Ok(pipeline) => pipeline,
        Err(err) => return CommandResult::error(err.to_string()),
    };

    let mut stdin: Option<String> = None;
    let mut stderr = String::new();
    let mut last = CommandResult::empty();
    let mut effect = None;
    for command in &pipeline.commands {
        let result = run_command(shell, command, stdin.as_deref());
        if !result.stderr.is_empty() {
            if !stderr.is_empty() {
                stderr.push('\n');
            }
            stderr.push_str(&result.stderr);
        }
        effect = result.effect.or(effect);
        stdin = Some(result.stdout.clone());
        last = result;
    }

    CommandResult {
        stdout: last.stdout,
        stderr,
        success: last.success,
        effect,
    }
}

fn run_command(shell: &mut Shell, command: &ParsedCommand, stdin: Option<&str>) -> CommandResult {
    let Some(builtin) = Builtin::from_name(&command.name) else {
        tracing::debug!(command = %command.name, "command not found");
        return ShellError::CommandNotFound(command.name.clone()).into();
    };
    let name = command.name.to_lowercase();
    match Invocation::parse(builtin, &name, command.args.clone()) {
        Ok(inv) => run_builtin(shell, &inv, stdin),
        Err(err) => err.into(),
    }
}
