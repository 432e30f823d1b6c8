//! Builtins that read or change session state: history, variables, aliases,
//! `source` and `test`.

use crate::config::MAX_SOURCE_DEPTH;
use crate::env::is_valid_var_name;
use crate::executor;
use crate::session::Shell;

use super::files::read_through_link;
use super::{CommandResult, Effect, Invocation};

// =============================================================================
// History
// =============================================================================

pub fn history(shell: &mut Shell, inv: &Invocation) -> CommandResult {
    if inv.has('c') {
        shell.history.clear();
        return CommandResult::empty();
    }
    let limit = match inv.positional.first() {
        None => usize::MAX,
        Some(arg) => match arg.parse::<usize>() {
            Ok(n) => n,
            Err(_) => {
                return CommandResult::error(format!("history: {}: numeric argument required", arg));
            }
        },
    };
    let skip = shell.history.len().saturating_sub(limit);
    let lines: Vec<String> = shell
        .history
        .entries()
        .skip(skip)
        .map(|(number, line)| format!("{:>5}  {}", number, line))
        .collect();
    CommandResult::ok(lines.join("\n"))
}

// =============================================================================
// Variables
// =============================================================================

pub fn env(shell: &Shell) -> CommandResult {
    let lines: Vec<String> = shell
        .env
        .vars()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();
    CommandResult::ok(lines.join("\n"))
}

pub fn export(shell: &mut Shell, inv: &Invocation) -> CommandResult {
    let args: Vec<&String> = inv.positional.iter().filter(|a| *a != "-p").collect();
    if args.is_empty() {
        return CommandResult::ok(shell.env.format_export_output().join("\n"));
    }
    let mut result = CommandResult::empty();
    for arg in args {
        let (key, value) = match arg.split_once('=') {
            Some((key, value)) => (key, Some(value)),
            None => (arg.as_str(), None),
        };
        if !is_valid_var_name(key) {
            result.push_stderr(&format!("export: '{}': not a valid identifier", arg));
            continue;
        }
        let value = value.unwrap_or_else(|| shell.env.get(key).unwrap_or_default()).to_string();
        if let Err(err) = shell.env.set(key, &value) {
            result.push_stderr(&format!("export: {}", err));
        }
    }
    result
}

pub fn unset(shell: &mut Shell, inv: &Invocation) -> CommandResult {
    let mut result = CommandResult::empty();
    for name in &inv.positional {
        if !is_valid_var_name(name) {
            result.push_stderr(&format!("unset: '{}': not a valid identifier", name));
            continue;
        }
        shell.env.unset(name);
    }
    result
}

// =============================================================================
// Aliases
// =============================================================================

fn format_alias(name: &str, value: &str) -> String {
    format!("alias {}='{}'", name, value)
}

pub fn alias(shell: &mut Shell, inv: &Invocation) -> CommandResult {
    if inv.positional.is_empty() {
        let lines: Vec<String> = shell
            .env
            .aliases()
            .map(|(name, value)| format_alias(name, value))
            .collect();
        return CommandResult::ok(lines.join("\n"));
    }

    let mut result = CommandResult::empty();
    for arg in &inv.positional {
        match arg.split_once('=') {
            Some((name, value)) => {
                if let Err(err) = shell.env.set_alias(name, value) {
                    result.push_stderr(&format!("alias: {}", err));
                }
            }
            None => match shell.env.alias(arg) {
                Some(value) => result.push_stdout(&format_alias(arg, value)),
                None => result.push_stderr(&format!("alias: {}: not found", arg)),
            },
        }
    }
    result
}

pub fn unalias(shell: &mut Shell, inv: &Invocation) -> CommandResult {
    if inv.has('a') {
        shell.env.clear_aliases();
        return CommandResult::empty();
    }
    if inv.positional.is_empty() {
        return CommandResult::error("unalias: usage: unalias [-a] name [name ...]");
    }
    let mut result = CommandResult::empty();
    for name in &inv.positional {
        if !shell.env.unalias(name) {
            result.push_stderr(&format!("unalias: {}: not found", name));
        }
    }
    result
}

// =============================================================================
// source
// =============================================================================

/// Run each line of a file through the executor. Blank lines and `#`
/// comments are skipped; sourced lines never enter the history.
pub fn source(shell: &mut Shell, inv: &Invocation) -> CommandResult {
    let command = inv.name.as_str();
    let Some(file) = inv.positional.first() else {
        return CommandResult::error(format!("{}: filename argument required", command));
    };
    let script = match read_through_link(shell, file) {
        Ok(text) => text.to_string(),
        Err(err) => return CommandResult::error(format!("{}: {}: {}", command, file, err.reason())),
    };
    if shell.source_depth >= MAX_SOURCE_DEPTH {
        return CommandResult::error(format!("{}: {}: maximum nesting depth exceeded", command, file));
    }

    shell.source_depth += 1;
    tracing::debug!(file = %file, depth = shell.source_depth, "source");
    let mut result = CommandResult::empty();
    for line in script
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
    {
        let outcome = executor::run_line(shell, line, false);
        if !outcome.output.is_empty() {
            result.push_stdout(&outcome.output);
        }
        result.success = outcome.success;
        if let Some(effect) = outcome.effect {
            if let Effect::Clear = effect {
                result.stdout.clear();
            }
            result.effect = Some(effect);
            if matches!(effect, Effect::Exit(_)) {
                break;
            }
        }
    }
    shell.source_depth -= 1;
    result
}

// =============================================================================
// test / [
// =============================================================================

pub fn test(shell: &Shell, inv: &Invocation) -> CommandResult {
    let mut args: Vec<&str> = inv.positional.iter().map(String::as_str).collect();
    let command = if inv.name == "[" {
        if args.last() != Some(&"]") {
            return CommandResult::error("[: missing ']'");
        }
        args.pop();
        "["
    } else {
        "test"
    };

    match evaluate_or(shell, &args) {
        Ok(true) => CommandResult::empty(),
        Ok(false) => CommandResult::failure(),
        Err(message) => CommandResult::error(format!("{}: {}", command, message)),
    }
}

fn evaluate_or(shell: &Shell, args: &[&str]) -> Result<bool, String> {
    let mut any = false;
    for part in args.split(|a| *a == "-o") {
        any |= evaluate_and(shell, part)?;
    }
    Ok(any)
}

fn evaluate_and(shell: &Shell, args: &[&str]) -> Result<bool, String> {
    let mut all = true;
    for part in args.split(|a| *a == "-a") {
        all &= evaluate(shell, part)?;
    }
    Ok(all)
}

fn evaluate(shell: &Shell, args: &[&str]) -> Result<bool, String> {
    match args {
        [] => Ok(false),
        ["!", rest @ ..] => evaluate(shell, rest).map(|v| !v),
        [value] => Ok(!value.is_empty()),
        [op, operand] => unary(shell, op, operand),
        [lhs, op, rhs] => binary(lhs, op, rhs),
        [first, ..] => Err(format!("{}: too many arguments", first)),
    }
}

fn unary(shell: &Shell, op: &str, operand: &str) -> Result<bool, String> {
    let node = shell.fs.resolve_path(operand);
    match op {
        "-e" | "-r" | "-w" => Ok(node.is_some()),
        "-f" => Ok(node.is_some_and(|n| !n.is_folder())),
        "-d" => Ok(node.is_some_and(|n| n.is_folder())),
        "-x" => Ok(node.is_some_and(|n| {
            n.is_folder() || n.kind == crate::models::NodeKind::Application
        })),
        "-s" => Ok(node.is_some_and(|n| n.metadata.size > 0)),
        "-z" => Ok(operand.is_empty()),
        "-n" => Ok(!operand.is_empty()),
        other => Err(format!("{}: unary operator expected", other)),
    }
}

fn binary(lhs: &str, op: &str, rhs: &str) -> Result<bool, String> {
    let int = |value: &str| {
        value
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("{}: integer expression expected", value))
    };
    match op {
        "=" | "==" => Ok(lhs == rhs),
        "!=" => Ok(lhs != rhs),
        "-eq" => Ok(int(lhs)? == int(rhs)?),
        "-ne" => Ok(int(lhs)? != int(rhs)?),
        "-lt" => Ok(int(lhs)? < int(rhs)?),
        "-le" => Ok(int(lhs)? <= int(rhs)?),
        "-gt" => Ok(int(lhs)? > int(rhs)?),
        "-ge" => Ok(int(lhs)? >= int(rhs)?),
        other => Err(format!("{}: binary operator expected", other)),
    }
}
