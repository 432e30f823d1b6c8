//! Chain splitting on `&&` and `;`.

use super::ParseError;
use super::expand::Quote;

/// One command of a chain, with its gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSegment {
    /// Raw text of the segment, trimmed.
    pub text: String,
    /// True when the segment follows `&&` and runs only if the previous
    /// segment succeeded. The first segment is never gated.
    pub requires_prior_success: bool,
}

/// Split a line on `&&` and `;` outside quotes, left to right.
///
/// Empty segments after `;` are dropped (`ls;` is fine); an empty segment
/// in front of an operator or after a trailing `&&` is a syntax error.
pub fn split_chain(line: &str) -> Result<Vec<ChainSegment>, ParseError> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut gated = false;
    let mut last_operator: Option<&'static str> = None;
    let mut quote = Quote::None;
    let mut rest = line;

    while let Some(c) = rest.chars().next() {
        if c == '\\' && quote != Quote::Single {
            let escaped_len = rest[1..].chars().next().map_or(0, char::len_utf8);
            current.push_str(&rest[..1 + escaped_len]);
            rest = &rest[1 + escaped_len..];
            continue;
        }

        let operator = match quote {
            Quote::None if rest.starts_with("&&") => Some("&&"),
            Quote::None if c == ';' => Some(";"),
            _ => None,
        };
        let Some(operator) = operator else {
            quote = quote.step(c);
            current.push(c);
            rest = &rest[c.len_utf8()..];
            continue;
        };

        let text = current.trim();
        if text.is_empty() {
            return Err(ParseError::UnexpectedOperator { operator });
        }
        segments.push(ChainSegment {
            text: text.to_string(),
            requires_prior_success: gated,
        });
        current.clear();
        gated = operator == "&&";
        last_operator = Some(operator);
        rest = &rest[operator.len()..];
    }

    let text = current.trim();
    if text.is_empty() {
        if last_operator == Some("&&") {
            return Err(ParseError::TrailingOperator { operator: "&&" });
        }
    } else {
        segments.push(ChainSegment {
            text: text.to_string(),
            requires_prior_success: gated,
        });
    }
    Ok(segments)
}
