//! Text builtins and pipe filters (echo, head, tail, grep, wc, sort, uniq,
//! cowsay, bc).
//!
//! Filters read their file operands, or the previous pipe stage when given
//! none: `ls | grep foo | head -5`

use regex::RegexBuilder;
use thiserror::Error;

use crate::config::filters;
use crate::error::ShellError;
use crate::session::Shell;

use super::files::read_through_link;
use super::{CommandResult, Invocation};

/// One input of a filter: a named file or the unnamed pipe.
struct Input {
    name: Option<String>,
    text: String,
}

/// Collect the inputs of a filter. Unreadable operands are reported on
/// `result` and skipped.
fn gather(
    shell: &Shell,
    command: &str,
    operands: &[String],
    stdin: Option<&str>,
    result: &mut CommandResult,
) -> Vec<Input> {
    if operands.is_empty() {
        return match stdin {
            Some(text) => vec![Input {
                name: None,
                text: text.to_string(),
            }],
            None => {
                result.push_stderr(&format!("{}: missing file operand", command));
                Vec::new()
            }
        };
    }
    operands
        .iter()
        .filter_map(|operand| {
            let text = if operand == "-" {
                Ok(stdin.unwrap_or_default())
            } else {
                read_through_link(shell, operand)
            };
            match text {
                Ok(text) => Some(Input {
                    name: Some(operand.clone()),
                    text: text.to_string(),
                }),
                Err(err) => {
                    result.push_stderr(&format!("{}: {}: {}", command, operand, err.reason()));
                    None
                }
            }
        })
        .collect()
}

// =============================================================================
// echo
// =============================================================================

pub fn echo(inv: &Invocation) -> CommandResult {
    let mut escapes = false;
    let mut words = inv.args.as_slice();
    while let Some((first, rest)) = words.split_first() {
        let is_flag = first.len() > 1
            && first.starts_with('-')
            && first[1..].chars().all(|c| matches!(c, 'n' | 'e' | 'E'));
        if !is_flag {
            break;
        }
        for c in first[1..].chars() {
            match c {
                'e' => escapes = true,
                'E' => escapes = false,
                // Output never carries a trailing newline, so -n changes nothing.
                _ => {}
            }
        }
        words = rest;
    }

    let text = words.join(" ");
    if escapes {
        CommandResult::ok(unescape(&text))
    } else {
        CommandResult::ok(text)
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('a') => out.push('\u{7}'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

// =============================================================================
// head / tail
// =============================================================================

/// Split `-n N`, `-nN`, `-N` off the operands.
fn parse_line_count(
    command: &'static str,
    args: &[String],
    default: usize,
) -> Result<(usize, Vec<String>), ShellError> {
    let invalid = |value: &str| ShellError::InvalidArgument {
        command,
        message: format!("invalid number of lines: '{}'", value),
    };
    let mut count = default;
    let mut operands = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let value = if arg == "-n" {
            iter.next().ok_or(ShellError::MissingOperand { command })?.as_str()
        } else if let Some(value) = arg.strip_prefix("-n") {
            value
        } else if arg.len() > 1 && arg.starts_with('-') && arg[1..].chars().all(|c| c.is_ascii_digit()) {
            &arg[1..]
        } else {
            operands.push(arg.clone());
            continue;
        };
        count = value.parse().map_err(|_| invalid(value))?;
    }
    Ok((count, operands))
}

pub fn head(shell: &Shell, inv: &Invocation, stdin: Option<&str>) -> CommandResult {
    slice_lines(shell, inv, stdin, filters::DEFAULT_HEAD_LINES, |lines, n| {
        lines.iter().take(n).copied().collect()
    })
}

pub fn tail(shell: &Shell, inv: &Invocation, stdin: Option<&str>) -> CommandResult {
    slice_lines(shell, inv, stdin, filters::DEFAULT_TAIL_LINES, |lines, n| {
        lines[lines.len().saturating_sub(n)..].to_vec()
    })
}

fn slice_lines<F>(
    shell: &Shell,
    inv: &Invocation,
    stdin: Option<&str>,
    default: usize,
    select: F,
) -> CommandResult
where
    F: for<'a> Fn(&[&'a str], usize) -> Vec<&'a str>,
{
    let command = inv.builtin.name();
    let (count, operands) = match parse_line_count(command, &inv.positional, default) {
        Ok(parsed) => parsed,
        Err(err) => return err.into(),
    };

    let mut result = CommandResult::empty();
    let inputs = gather(shell, command, &operands, stdin, &mut result);
    let headers = inputs.len() > 1;
    let mut blocks = Vec::new();
    for input in &inputs {
        let lines: Vec<&str> = input.text.lines().collect();
        let selected = select(&lines, count).join("\n");
        match (&input.name, headers) {
            (Some(name), true) => blocks.push(format!("==> {} <==\n{}", name, selected)),
            _ => blocks.push(selected),
        }
    }
    let separator = if headers { "\n\n" } else { "\n" };
    result.stdout = blocks.join(separator);
    result
}

// =============================================================================
// grep
// =============================================================================

pub fn grep(shell: &Shell, inv: &Invocation, stdin: Option<&str>) -> CommandResult {
    if inv.has('c') && inv.has('n') {
        return ShellError::InvalidFlagCombination {
            command: "grep",
            message: "-c and -n cannot be used together",
        }
        .into();
    }
    let Some((pattern, operands)) = inv.positional.split_first() else {
        return CommandResult::error("grep: missing pattern");
    };
    let regex = match RegexBuilder::new(pattern)
        .case_insensitive(inv.has('i'))
        .build()
    {
        Ok(regex) => regex,
        Err(_) => return CommandResult::error(format!("grep: invalid pattern: '{}'", pattern)),
    };
    let invert = inv.has('v');

    let mut result = CommandResult::empty();
    let inputs = gather(shell, "grep", operands, stdin, &mut result);
    let prefix_names = inputs.len() > 1;
    let mut matched = 0usize;
    let mut lines = Vec::new();
    for input in &inputs {
        let prefix = match (&input.name, prefix_names) {
            (Some(name), true) => format!("{}:", name),
            _ => String::new(),
        };
        let mut count = 0usize;
        for (i, line) in input.text.lines().enumerate() {
            if regex.is_match(line) == invert {
                continue;
            }
            count += 1;
            if inv.has('c') {
                continue;
            }
            if inv.has('n') {
                lines.push(format!("{}{}:{}", prefix, i + 1, line));
            } else {
                lines.push(format!("{}{}", prefix, line));
            }
        }
        if inv.has('c') {
            lines.push(format!("{}{}", prefix, count));
        }
        matched += count;
    }

    result.stdout = lines.join("\n");
    if matched == 0 {
        result.success = false;
    }
    result
}

// =============================================================================
// wc
// =============================================================================

/// Line count is the number of `\n`-separated segments, so a trailing
/// newline adds one.
fn counts(text: &str) -> [usize; 3] {
    [
        text.split('\n').count(),
        text.split_whitespace().count(),
        text.len(),
    ]
}

pub fn wc(shell: &Shell, inv: &Invocation, stdin: Option<&str>) -> CommandResult {
    let selected: Vec<usize> = match (inv.has('l'), inv.has('w'), inv.has('c')) {
        (false, false, false) => vec![0, 1, 2],
        (l, w, c) => [l, w, c]
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .map(|(i, _)| i)
            .collect(),
    };
    let render = |values: [usize; 3], name: Option<&str>| {
        let mut fields: Vec<String> = selected.iter().map(|i| values[*i].to_string()).collect();
        if let Some(name) = name {
            fields.push(name.to_string());
        }
        fields.join(" ")
    };

    let mut result = CommandResult::empty();
    let inputs = gather(shell, "wc", &inv.positional, stdin, &mut result);
    let mut total = [0usize; 3];
    let mut lines = Vec::new();
    for input in &inputs {
        let values = counts(&input.text);
        for (sum, value) in total.iter_mut().zip(values) {
            *sum += value;
        }
        lines.push(render(values, input.name.as_deref()));
    }
    if inputs.len() > 1 {
        lines.push(render(total, Some("total")));
    }
    result.stdout = lines.join("\n");
    result
}

// =============================================================================
// sort / uniq
// =============================================================================

/// Leading numeric value of a line; lines without one sort as zero.
fn numeric_key(line: &str) -> f64 {
    let trimmed = line.trim_start();
    let end = trimmed
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && *c == '-')))
        .map_or(trimmed.len(), |(i, _)| i);
    trimmed[..end].parse().unwrap_or(0.0)
}

pub fn sort(shell: &Shell, inv: &Invocation, stdin: Option<&str>) -> CommandResult {
    let mut result = CommandResult::empty();
    let inputs = gather(shell, "sort", &inv.positional, stdin, &mut result);
    let mut lines: Vec<&str> = inputs.iter().flat_map(|input| input.text.lines()).collect();

    if inv.has('n') {
        lines.sort_by(|a, b| numeric_key(a).total_cmp(&numeric_key(b)).then_with(|| a.cmp(b)));
    } else {
        lines.sort_unstable();
    }
    if inv.has('u') {
        lines.dedup();
    }
    if inv.has('r') {
        lines.reverse();
    }
    result.stdout = lines.join("\n");
    result
}

pub fn uniq(shell: &Shell, inv: &Invocation, stdin: Option<&str>) -> CommandResult {
    if inv.positional.len() > 1 {
        return CommandResult::error(format!("uniq: extra operand '{}'", inv.positional[1]));
    }
    let mut result = CommandResult::empty();
    let inputs = gather(shell, "uniq", &inv.positional, stdin, &mut result);

    let mut groups: Vec<(usize, &str)> = Vec::new();
    for line in inputs.iter().flat_map(|input| input.text.lines()) {
        match groups.last_mut() {
            Some((count, last)) if *last == line => *count += 1,
            _ => groups.push((1, line)),
        }
    }
    result.stdout = groups
        .iter()
        .map(|(count, line)| {
            if inv.has('c') {
                format!("{:>7} {}", count, line)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    result
}

// =============================================================================
// cowsay
// =============================================================================

const COW: &str = r"        \   ^__^
         \  (oo)\_______
            (__)\       )\/\
                ||----w |
                ||     ||";

const BUBBLE_WIDTH: usize = 40;

pub fn cowsay(inv: &Invocation, stdin: Option<&str>) -> CommandResult {
    let text = if inv.args.is_empty() {
        stdin.unwrap_or_default().trim().to_string()
    } else {
        inv.args.join(" ")
    };
    let text = if text.is_empty() { "Moo!".to_string() } else { text };

    let lines = wrap(&text, BUBBLE_WIDTH);
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let mut out = vec![format!(" {}", "_".repeat(width + 2))];
    let last = lines.len() - 1;
    for (i, line) in lines.iter().enumerate() {
        let (open, close) = match (i, last) {
            (_, 0) => ('<', '>'),
            (0, _) => ('/', '\\'),
            (i, last) if i == last => ('\\', '/'),
            _ => ('|', '|'),
        };
        out.push(format!("{} {:<width$} {}", open, line, close, width = width));
    }
    out.push(format!(" {}", "-".repeat(width + 2)));
    out.push(COW.to_string());
    CommandResult::ok(out.join("\n"))
}

/// Greedy word wrap. Always yields at least one line.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    lines.push(current);
    lines
}

// =============================================================================
// bc
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
enum BcError {
    #[error("syntax error")]
    Syntax,
    #[error("divide by zero")]
    DivideByZero,
    #[error("expression nested too deeply")]
    TooDeep,
}

/// Parentheses, unary signs and `^` chains share this bound.
const MAX_NESTING: usize = 256;

pub fn bc(inv: &Invocation, stdin: Option<&str>) -> CommandResult {
    let source = if inv.args.is_empty() {
        stdin.unwrap_or_default().to_string()
    } else {
        inv.args.join(" ")
    };

    let mut result = CommandResult::empty();
    for line in source.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match evaluate(line) {
            Ok(value) => result.push_stdout(&value),
            Err(err) => result.push_stderr(&format!("bc: {}", err)),
        }
    }
    result
}

/// Evaluate one expression. Without a decimal point in the input, division
/// truncates like bc's default scale of zero.
fn evaluate(expr: &str) -> Result<String, BcError> {
    let mut calc = Calc {
        bytes: expr.as_bytes(),
        pos: 0,
        depth: 0,
        integer: !expr.contains('.'),
    };
    let value = calc.expr()?;
    calc.skip_spaces();
    if calc.pos != calc.bytes.len() {
        return Err(BcError::Syntax);
    }
    if calc.integer || value.fract() == 0.0 {
        Ok(format!("{}", value.trunc() as i64))
    } else {
        let text = format!("{:.10}", value);
        Ok(text.trim_end_matches('0').trim_end_matches('.').to_string())
    }
}

struct Calc<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
    integer: bool,
}

impl Calc<'_> {
    fn skip_spaces(&mut self) {
        while self.bytes.get(self.pos).is_some_and(u8::is_ascii_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, op: u8) -> bool {
        self.skip_spaces();
        if self.bytes.get(self.pos) == Some(&op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Run one level of recursion, failing past [`MAX_NESTING`].
    fn nested(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<f64, BcError>,
    ) -> Result<f64, BcError> {
        if self.depth >= MAX_NESTING {
            return Err(BcError::TooDeep);
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn expr(&mut self) -> Result<f64, BcError> {
        let mut value = self.term()?;
        loop {
            if self.eat(b'+') {
                value += self.term()?;
            } else if self.eat(b'-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn term(&mut self) -> Result<f64, BcError> {
        let mut value = self.power()?;
        loop {
            if self.eat(b'*') {
                value *= self.power()?;
            } else if self.eat(b'/') {
                let rhs = self.power()?;
                if rhs == 0.0 {
                    return Err(BcError::DivideByZero);
                }
                value /= rhs;
                if self.integer {
                    value = value.trunc();
                }
            } else if self.eat(b'%') {
                let rhs = self.power()?;
                if rhs == 0.0 {
                    return Err(BcError::DivideByZero);
                }
                value %= rhs;
            } else {
                return Ok(value);
            }
        }
    }

    fn power(&mut self) -> Result<f64, BcError> {
        let base = self.unary()?;
        if self.eat(b'^') {
            let exponent = self.nested(Self::power)?;
            return Ok(base.powi(exponent.trunc() as i32));
        }
        Ok(base)
    }

    fn unary(&mut self) -> Result<f64, BcError> {
        if self.eat(b'-') {
            return Ok(-self.nested(Self::unary)?);
        }
        if self.eat(b'+') {
            return self.nested(Self::unary);
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<f64, BcError> {
        if self.eat(b'(') {
            let value = self.nested(Self::expr)?;
            if !self.eat(b')') {
                return Err(BcError::Syntax);
            }
            return Ok(value);
        }
        self.skip_spaces();
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_digit() || *b == b'.')
        {
            self.pos += 1;
        }
        std::str::from_utf8(&self.bytes[start..self.pos])
            .ok()
            .and_then(|digits| digits.parse().ok())
            .ok_or(BcError::Syntax)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShellConfig;

    fn run(line: &str) -> crate::session::LineResult {
        Shell::new(&ShellConfig::default()).execute(line)
    }

    #[test]
    fn test_echo_flags() {
        assert_eq!(run("echo hello world").output, "hello world");
        assert_eq!(run("echo -n hi").output, "hi");
        assert_eq!(run("echo -e 'a\\tb'").output, "a\tb");
        assert_eq!(run("echo -x").output, "-x");
    }

    #[test]
    fn test_head_tail_counts() {
        let input = "1\n2\n3\n4\n5";
        assert_eq!(run(&format!("echo -e '{}' | head -n 2", input.replace('\n', "\\n"))).output, "1\n2");
        assert_eq!(run("echo -e '1\\n2\\n3' | tail -1").output, "3");
        assert_eq!(run("echo -e '1\\n2\\n3' | head -n2").output, "1\n2");
        let out = run("head -n x /etc/passwd");
        assert_eq!(out.output, "head: invalid number of lines: 'x'");
    }

    #[test]
    fn test_grep_basic() {
        let out = run("grep root /etc/passwd");
        assert!(out.success);
        assert!(out.output.starts_with("root:x:0:0"));
        assert!(!run("grep nomatch /etc/passwd").success);
    }

    #[test]
    fn test_grep_flags() {
        assert_eq!(run("echo -e 'Apple\\nbanana' | grep -i apple").output, "Apple");
        assert_eq!(run("echo -e 'a\\nb\\na' | grep -c a").output, "2");
        assert_eq!(run("echo -e 'a\\nb' | grep -n b").output, "2:b");
        assert_eq!(run("echo -e 'a\\nb' | grep -v a").output, "b");
        let out = run("echo a | grep -c -n a");
        assert!(!out.success);
        assert_eq!(out.output, "grep: -c and -n cannot be used together");
        assert_eq!(run("grep").output, "grep: missing pattern");
    }

    #[test]
    fn test_wc_counts_split_segments() {
        // "termfs\n" splits into two segments.
        assert_eq!(run("wc -l /etc/hostname").output, "2 /etc/hostname");
        assert_eq!(run("echo one two | wc -w").output, "2");
        assert_eq!(run("echo abc | wc").output, "1 1 3");
    }

    #[test]
    fn test_sort_flags() {
        assert_eq!(run("echo -e 'b\\na\\nc' | sort").output, "a\nb\nc");
        assert_eq!(run("echo -e 'b\\na\\nc' | sort -r").output, "c\nb\na");
        assert_eq!(run("echo -e '10\\n9\\n100' | sort -n").output, "9\n10\n100");
        assert_eq!(run("echo -e 'a\\na\\nb' | sort -u").output, "a\nb");
    }

    #[test]
    fn test_uniq() {
        assert_eq!(run("echo -e 'a\\na\\nb\\na' | uniq").output, "a\nb\na");
        assert_eq!(
            run("echo -e 'a\\na\\nb' | uniq -c").output,
            "      2 a\n      1 b"
        );
    }

    #[test]
    fn test_cowsay() {
        let out = run("cowsay hi");
        assert!(out.output.starts_with(" ____\n< hi >\n ----"));
        assert!(out.output.contains("(oo)"));
    }

    #[test]
    fn test_bc() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), "14");
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), "20");
        assert_eq!(evaluate("7 / 2").unwrap(), "3");
        assert_eq!(evaluate("7.0 / 2").unwrap(), "3.5");
        assert_eq!(evaluate("2 ^ 10").unwrap(), "1024");
        assert_eq!(evaluate("-3 + 1").unwrap(), "-2");
        assert_eq!(evaluate("1 / 0").unwrap_err(), BcError::DivideByZero);
        assert_eq!(evaluate("2 +").unwrap_err(), BcError::Syntax);
        assert_eq!(run("echo '6 * 7' | bc").output, "42");
    }

    #[test]
    fn test_bc_nesting_limit() {
        let shallow = format!("{}1{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(evaluate(&shallow).unwrap(), "1");
        assert_eq!(evaluate(&format!("{}5", "-".repeat(100))).unwrap(), "5");

        let parens = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        assert_eq!(evaluate(&parens).unwrap_err(), BcError::TooDeep);
        assert_eq!(evaluate(&"(".repeat(100_000)).unwrap_err(), BcError::TooDeep);
        assert_eq!(evaluate(&format!("{}1", "-".repeat(100_000))).unwrap_err(), BcError::TooDeep);
        assert_eq!(evaluate(&"2^".repeat(100_000)).unwrap_err(), BcError::TooDeep);

        let out = run(&format!("echo '{}1' | bc", "+".repeat(1000)));
        assert!(!out.success);
        assert_eq!(out.output, "bc: expression nested too deeply");
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("a b c", 3), vec!["a b", "c"]);
        assert_eq!(wrap("", 10), vec![""]);
    }
}
