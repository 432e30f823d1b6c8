//! Text-level expansion, applied to a whole line before it is split.
//!
//! Handles, in the order the shell applies them:
//! - History expansion (`!!` last line, `!n` n-th entry, `!-n` n-th from last)
//! - Alias expansion of the word in each command position
//! - Variable expansion (`$VAR`, `${VAR}`, `$?`)
//!
//! All three leave single-quoted text and backslash-escaped characters alone.

use std::borrow::Cow;

use super::ParseError;
use crate::env::Environment;
use crate::history::HistoryBuffer;

/// Quote context while scanning raw text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(super) enum Quote {
    #[default]
    None,
    Single,
    Double,
}

impl Quote {
    /// State after reading `c` (escapes are handled by the caller).
    pub(super) fn step(self, c: char) -> Self {
        match (self, c) {
            (Self::None, '\'') => Self::Single,
            (Self::None, '"') => Self::Double,
            (Self::Single, '\'') | (Self::Double, '"') => Self::None,
            (state, _) => state,
        }
    }
}

// =============================================================================
// History
// =============================================================================

/// Replace history references with the lines they name.
pub fn expand_history<'a>(
    line: &'a str,
    history: &HistoryBuffer,
) -> Result<Cow<'a, str>, ParseError> {
    if !line.contains('!') {
        return Ok(Cow::Borrowed(line));
    }

    let mut out = String::with_capacity(line.len());
    let mut quote = Quote::None;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' && quote != Quote::Single {
            out.push(c);
            if let Some(next) = chars.next() {
                out.push(next);
            }
            continue;
        }
        if c != '!' || quote == Quote::Single {
            quote = quote.step(c);
            out.push(c);
            continue;
        }

        match chars.peek().copied() {
            Some('!') => {
                chars.next();
                let event = history
                    .last()
                    .ok_or_else(|| ParseError::EventNotFound("!!".to_string()))?;
                out.push_str(event);
            }
            Some(next) if next.is_ascii_digit() || next == '-' => {
                let from_end = next == '-';
                if from_end {
                    chars.next();
                }
                let mut digits = String::new();
                while let Some(d) = chars.next_if(char::is_ascii_digit) {
                    digits.push(d);
                }
                if digits.is_empty() {
                    out.push('!');
                    out.push('-');
                    continue;
                }

                let reference = format!("!{}{}", if from_end { "-" } else { "" }, digits);
                let event = digits.parse::<usize>().ok().and_then(|n| {
                    if from_end {
                        history.event_from_end(n)
                    } else {
                        history.event(n)
                    }
                });
                out.push_str(event.ok_or(ParseError::EventNotFound(reference))?);
            }
            _ => out.push('!'),
        }
    }

    Ok(Cow::Owned(out))
}

// =============================================================================
// Aliases
// =============================================================================

/// Substitute aliases for the first word of every command (line start and
/// after `&&`, `;` or `|`).
///
/// Each word is looked up once: an alias value that itself starts with an
/// alias name is not expanded again.
pub fn expand_aliases<'a>(line: &'a str, env: &Environment) -> Cow<'a, str> {
    let mut out = String::with_capacity(line.len());
    let mut quote = Quote::None;
    let mut command_start = true;
    let mut changed = false;
    let mut rest = line;

    while let Some(c) = rest.chars().next() {
        if command_start && quote == Quote::None && !c.is_whitespace() {
            command_start = false;
            let end = rest
                .find(|c: char| c.is_whitespace() || matches!(c, '|' | ';' | '&'))
                .unwrap_or(rest.len());
            let word = &rest[..end];
            if let Some(value) = env.alias(word).filter(|_| !word.is_empty()) {
                out.push_str(value);
                rest = &rest[end..];
                changed = true;
                continue;
            }
        }

        if c == '\\' && quote != Quote::Single {
            let escaped_len = rest[1..].chars().next().map_or(0, char::len_utf8);
            out.push_str(&rest[..1 + escaped_len]);
            rest = &rest[1 + escaped_len..];
            continue;
        }
        if quote == Quote::None {
            if rest.starts_with("&&") {
                out.push_str("&&");
                rest = &rest[2..];
                command_start = true;
                continue;
            }
            if matches!(c, '|' | ';') {
                command_start = true;
            }
        }
        quote = quote.step(c);
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(line)
    }
}

// =============================================================================
// Variables
// =============================================================================

/// Replace `$NAME`, `${NAME}` and `$?` with values from `lookup`; unset
/// names expand to the empty string.
pub fn expand_variables<'a, F>(line: &'a str, lookup: F) -> Cow<'a, str>
where
    F: Fn(&str) -> Option<String>,
{
    if !line.contains('$') {
        return Cow::Borrowed(line);
    }

    let mut out = String::with_capacity(line.len());
    let mut quote = Quote::None;
    let mut rest = line;

    while let Some(c) = rest.chars().next() {
        if c == '\\' && quote != Quote::Single {
            let escaped_len = rest[1..].chars().next().map_or(0, char::len_utf8);
            out.push_str(&rest[..1 + escaped_len]);
            rest = &rest[1 + escaped_len..];
            continue;
        }
        if c == '$' && quote != Quote::Single {
            if let Some((name, consumed)) = read_variable(&rest[1..]) {
                out.push_str(&lookup(name).unwrap_or_default());
                rest = &rest[1 + consumed..];
                continue;
            }
        }
        quote = quote.step(c);
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    Cow::Owned(out)
}

/// Read the variable name following a `$`.
///
/// Returns the name and the number of bytes it spans (braces included), or
/// `None` when the `$` is literal (`$`, `${}`, unclosed `${`).
fn read_variable(text: &str) -> Option<(&str, usize)> {
    if let Some(inner) = text.strip_prefix('{') {
        let close = inner.find('}')?;
        let name = &inner[..close];
        return (!name.is_empty()).then_some((name, close + 2));
    }
    if text.starts_with('?') {
        return Some(("?", 1));
    }
    let first = text.chars().next()?;
    if !first.is_ascii_alphabetic() && first != '_' {
        return None;
    }
    let end = text
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .unwrap_or(text.len());
    Some((&text[..end], end))
}
