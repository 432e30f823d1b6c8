//! Builtins that report on the simulated machine and the command table.

use rand::seq::SliceRandom;

use crate::config::{FORTUNES, MEMORY_MIB, NEOFETCH_LOGO, OS_PRETTY_NAME, PROCESSES, uname as sys};
use crate::error::ShellError;
use crate::filesystem::{now_millis, path};
use crate::session::Shell;
use crate::utils::{DateTime, format_calendar, format_date_long, format_duration};

use super::{Builtin, CommandResult, Effect, Invocation};

// =============================================================================
// Help
// =============================================================================

pub fn help(inv: &Invocation) -> CommandResult {
    let Some(topic) = inv.positional.first() else {
        let mut lines = vec!["Available commands:".to_string()];
        lines.extend(
            Builtin::ALL
                .iter()
                .map(|b| format!("  {:<10} {}", b.name(), b.summary())),
        );
        lines.push(String::new());
        lines.push("Type 'help <command>' or '<command> --help' for usage.".to_string());
        return CommandResult::ok(lines.join("\n"));
    };
    match Builtin::from_name(topic) {
        Some(builtin) => CommandResult::ok(format!(
            "{}: {}\nusage: {}",
            builtin.name(),
            builtin.summary(),
            builtin.usage()
        )),
        None => CommandResult::error(format!("help: no help topics match '{}'", topic)),
    }
}

pub fn man(inv: &Invocation) -> CommandResult {
    let Some(topic) = inv.positional.first() else {
        return CommandResult::error("What manual page do you want?");
    };
    let Some(builtin) = Builtin::from_name(topic) else {
        return CommandResult::error(format!("No manual entry for {}", topic));
    };

    let mut lines = vec![
        "NAME".to_string(),
        format!("    {} - {}", builtin.name(), builtin.summary()),
        String::new(),
        "SYNOPSIS".to_string(),
        format!("    {}", builtin.usage()),
    ];
    if let Some(options) = builtin.options().filter(|o| !o.short.is_empty()) {
        lines.push(String::new());
        lines.push("OPTIONS".to_string());
        for flag in options.short.chars() {
            let long = options
                .long
                .iter()
                .filter(|(_, short)| *short == flag)
                .map(|(name, _)| format!(", --{}", name))
                .collect::<String>();
            lines.push(format!("    -{}{}", flag, long));
        }
    }
    CommandResult::ok(lines.join("\n"))
}

// =============================================================================
// Session
// =============================================================================

pub fn exit(shell: &Shell, inv: &Invocation) -> CommandResult {
    let code = match inv.positional.first() {
        None => i32::from(!shell.last_status),
        Some(arg) => match arg.parse::<i32>() {
            Ok(code) => code,
            Err(_) => {
                return CommandResult::error(format!("exit: {}: numeric argument required", arg))
                    .with_effect(Effect::Exit(2));
            }
        },
    };
    CommandResult::empty().with_effect(Effect::Exit(code))
}

pub fn id(shell: &Shell, inv: &Invocation) -> CommandResult {
    let user = inv
        .positional
        .first()
        .map_or(shell.identity.user.as_str(), String::as_str);
    let uid = if user == shell.identity.user {
        shell.identity.uid
    } else if user == "root" {
        0
    } else {
        return CommandResult::error(format!("id: '{}': no such user", user));
    };
    CommandResult::ok(format!(
        "uid={uid}({user}) gid={uid}({user}) groups={uid}({user})"
    ))
}

pub fn uname(shell: &Shell, inv: &Invocation) -> CommandResult {
    if inv.has('a') {
        return CommandResult::ok(format!(
            "{} {} {} {} {} {}",
            sys::SYSNAME,
            shell.identity.hostname,
            sys::RELEASE,
            sys::VERSION,
            sys::MACHINE,
            sys::OS
        ));
    }
    let fields: Vec<&str> = [
        ('s', sys::SYSNAME),
        ('n', shell.identity.hostname.as_str()),
        ('r', sys::RELEASE),
        ('m', sys::MACHINE),
    ]
    .into_iter()
    .filter(|(flag, _)| inv.has(*flag))
    .map(|(_, value)| value)
    .collect();
    if fields.is_empty() {
        CommandResult::ok(sys::SYSNAME)
    } else {
        CommandResult::ok(fields.join(" "))
    }
}

// =============================================================================
// Time
// =============================================================================

/// The simulated machine runs on UTC, so `-u` changes nothing.
pub fn date(inv: &Invocation) -> CommandResult {
    let now = now_millis();
    match inv.positional.as_slice() {
        [] => CommandResult::ok(format_date_long(now)),
        [format] if format.starts_with('+') => {
            CommandResult::ok(strftime(&format[1..], DateTime::from_millis(now), now / 1000))
        }
        [other, ..] => CommandResult::error(format!("date: invalid date '{}'", other)),
    }
}

fn strftime(format: &str, dt: DateTime, epoch_secs: u64) -> String {
    let mut out = String::new();
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('Y') => out.push_str(&dt.year.to_string()),
            Some('m') => out.push_str(&format!("{:02}", dt.month)),
            Some('d') => out.push_str(&format!("{:02}", dt.day)),
            Some('e') => out.push_str(&format!("{:2}", dt.day)),
            Some('H') => out.push_str(&format!("{:02}", dt.hour)),
            Some('M') => out.push_str(&format!("{:02}", dt.minute)),
            Some('S') => out.push_str(&format!("{:02}", dt.second)),
            Some('a') => out.push_str(dt.weekday_abbrev()),
            Some('b') => out.push_str(dt.month_abbrev()),
            Some('F') => out.push_str(&format!("{:04}-{:02}-{:02}", dt.year, dt.month, dt.day)),
            Some('T') => out.push_str(&format!("{:02}:{:02}:{:02}", dt.hour, dt.minute, dt.second)),
            Some('s') => out.push_str(&epoch_secs.to_string()),
            Some('Z') => out.push_str("UTC"),
            Some('%') => out.push('%'),
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }
    out
}

fn uptime_line(shell: &Shell) -> String {
    let now = now_millis();
    let dt = DateTime::from_millis(now);
    let elapsed = now.saturating_sub(shell.started_at) / 1000;
    format!(
        " {:02}:{:02}:{:02} up {},  1 user,  load average: 0.00, 0.01, 0.05",
        dt.hour,
        dt.minute,
        dt.second,
        format_duration(elapsed)
    )
}

pub fn uptime(shell: &Shell) -> CommandResult {
    CommandResult::ok(uptime_line(shell))
}

pub fn sleep(inv: &Invocation) -> CommandResult {
    let Some(arg) = inv.positional.first() else {
        return ShellError::MissingOperand { command: "sleep" }.into();
    };
    let (number, unit) = match arg.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => (&arg[..i], c),
        _ => (arg.as_str(), 's'),
    };
    let scale = match unit {
        's' => 1.0,
        'm' => 60.0,
        'h' => 3600.0,
        'd' => 86_400.0,
        _ => return CommandResult::error(format!("sleep: invalid time interval '{}'", arg)),
    };
    match number.parse::<f64>() {
        Ok(value) if value >= 0.0 => {
            let seconds = value * scale;
            let plural = if seconds == 1.0 { "" } else { "s" };
            CommandResult::ok(format!("slept for {} second{}", seconds, plural))
        }
        _ => CommandResult::error(format!("sleep: invalid time interval '{}'", arg)),
    }
}

pub fn cal(inv: &Invocation) -> CommandResult {
    let parse = |arg: &String| arg.parse::<i64>().ok();
    let now = DateTime::from_millis(now_millis());
    let (months, year): (Vec<u32>, i64) = match inv.positional.as_slice() {
        [] => (vec![now.month], now.year),
        [year] => match parse(year) {
            Some(year) => ((1..=12).collect(), year),
            None => return CommandResult::error(format!("cal: invalid year '{}'", year)),
        },
        [month, year] => match (parse(month), parse(year)) {
            (Some(month), Some(year)) if (1..=12).contains(&month) => (vec![month as u32], year),
            (Some(_), Some(_)) => {
                return CommandResult::error(format!(
                    "cal: {} is not a month number (1..12)",
                    month
                ));
            }
            _ => return CommandResult::error("cal: invalid argument"),
        },
        _ => return CommandResult::error("cal: too many arguments"),
    };
    if !(1..=9999).contains(&year) {
        return CommandResult::error(format!("cal: year '{}' not in range 1..9999", year));
    }
    let grids: Vec<String> = months
        .into_iter()
        .filter_map(|month| format_calendar(year, month))
        .collect();
    CommandResult::ok(grids.join("\n\n"))
}

// =============================================================================
// Processes
// =============================================================================

fn live_processes(shell: &Shell) -> impl Iterator<Item = &(u32, &'static str, f32, f32)> {
    PROCESSES
        .iter()
        .filter(move |(pid, ..)| !shell.killed.contains(pid))
}

fn process_owner<'a>(shell: &'a Shell, command: &str) -> &'a str {
    if command == "bash" {
        shell.identity.user.as_str()
    } else {
        "root"
    }
}

pub fn ps(shell: &Shell) -> CommandResult {
    let mut lines = vec!["  PID TTY          TIME CMD".to_string()];
    lines.extend(
        live_processes(shell).map(|(pid, cmd, ..)| format!("{:>5} pts/0    00:00:00 {}", pid, cmd)),
    );
    CommandResult::ok(lines.join("\n"))
}

pub fn top(shell: &Shell) -> CommandResult {
    let processes: Vec<_> = live_processes(shell).collect();
    let (total, used) = MEMORY_MIB;
    let mut lines = vec![
        format!("top -{}", uptime_line(shell)),
        format!(
            "Tasks: {:>3} total,   1 running, {:>3} sleeping,   0 stopped,   0 zombie",
            processes.len(),
            processes.len().saturating_sub(1)
        ),
        format!(
            "MiB Mem : {:>8.1} total, {:>8.1} free, {:>8.1} used",
            total as f64,
            (total - used) as f64,
            used as f64
        ),
        String::new(),
        "  PID USER      %CPU %MEM COMMAND".to_string(),
    ];
    for (pid, cmd, cpu, mem) in processes {
        lines.push(format!(
            "{:>5} {:<8} {:>5.1} {:>4.1} {}",
            pid,
            process_owner(shell, cmd),
            cpu,
            mem,
            cmd
        ));
    }
    CommandResult::ok(lines.join("\n"))
}

const SIGNALS: &[(u32, &str)] = &[
    (1, "HUP"),
    (2, "INT"),
    (3, "QUIT"),
    (9, "KILL"),
    (15, "TERM"),
    (18, "CONT"),
    (19, "STOP"),
];

pub fn kill(shell: &mut Shell, inv: &Invocation) -> CommandResult {
    let mut args = inv.positional.as_slice();
    match args.first().map(String::as_str) {
        Some("-l") => {
            let list: Vec<String> = SIGNALS
                .iter()
                .map(|(n, name)| format!("{:>2}) SIG{}", n, name))
                .collect();
            return CommandResult::ok(list.join("\n"));
        }
        Some("-s") => args = args.get(2..).unwrap_or_default(),
        Some(flag) if flag.starts_with('-') => {
            let signal = &flag[1..];
            let known = SIGNALS.iter().any(|(n, name)| {
                signal == *name
                    || signal.strip_prefix("SIG") == Some(*name)
                    || signal.parse::<u32>().ok() == Some(*n)
            });
            if !known {
                return CommandResult::error(format!("kill: {}: invalid signal specification", signal));
            }
            args = &args[1..];
        }
        _ => {}
    }
    if args.is_empty() {
        return ShellError::InvalidArgument {
            command: "kill",
            message: format!("usage: {}", Builtin::Kill.usage()),
        }
        .into();
    }

    let mut result = CommandResult::empty();
    for arg in args {
        let Ok(pid) = arg.parse::<u32>() else {
            result.push_stderr(&format!(
                "kill: {}: arguments must be process or job IDs",
                arg
            ));
            continue;
        };
        if pid == 1 {
            result.push_stderr("kill: (1) - Operation not permitted");
        } else if live_processes(shell).any(|(p, ..)| *p == pid) {
            shell.killed.insert(pid);
        } else {
            result.push_stderr(&format!("kill: ({}) - No such process", pid));
        }
    }
    result
}

// =============================================================================
// Command Lookup
// =============================================================================

/// First regular file called `name` in a `$PATH` directory.
pub(crate) fn search_path(shell: &Shell, name: &str) -> Option<String> {
    shell
        .env
        .get("PATH")
        .unwrap_or_default()
        .split(':')
        .filter(|dir| !dir.is_empty())
        .map(|dir| path::join(dir, name))
        .find(|candidate| {
            shell
                .fs
                .resolve_path(candidate)
                .is_some_and(|node| !node.is_folder())
        })
}

pub fn which(shell: &Shell, inv: &Invocation) -> CommandResult {
    if inv.positional.is_empty() {
        return CommandResult::failure();
    }
    let mut result = CommandResult::empty();
    for name in &inv.positional {
        match search_path(shell, name) {
            Some(found) => result.push_stdout(&found),
            None => result.push_stderr(&format!(
                "which: no {} in ({})",
                name,
                shell.env.get("PATH").unwrap_or_default()
            )),
        }
    }
    result
}

pub fn type_of(shell: &Shell, inv: &Invocation) -> CommandResult {
    if inv.positional.is_empty() {
        return CommandResult::empty();
    }
    let mut result = CommandResult::empty();
    for name in &inv.positional {
        if let Some(value) = shell.env.alias(name) {
            result.push_stdout(&format!("{} is aliased to `{}'", name, value));
        } else if Builtin::from_name(name).is_some_and(Builtin::is_keyword) {
            result.push_stdout(&format!("{} is a shell builtin", name));
        } else if let Some(found) = search_path(shell, name) {
            result.push_stdout(&format!("{} is {}", name, found));
        } else if Builtin::from_name(name).is_some() {
            result.push_stdout(&format!("{} is a shell builtin", name));
        } else {
            result.push_stderr(&format!("type: {}: not found", name));
        }
    }
    result
}

// =============================================================================
// Fun
// =============================================================================

pub fn neofetch(shell: &Shell) -> CommandResult {
    let title = format!("{}@{}", shell.identity.user, shell.identity.hostname);
    let elapsed = now_millis().saturating_sub(shell.started_at) / 1000;
    let (total, used) = MEMORY_MIB;
    let info = [
        title.clone(),
        "-".repeat(title.len()),
        format!("OS: {} {}", OS_PRETTY_NAME, sys::MACHINE),
        format!("Kernel: {}", sys::RELEASE),
        format!("Uptime: {}", format_duration(elapsed)),
        format!(
            "Shell: {}",
            path::base_name(shell.env.get("SHELL").unwrap_or("/bin/bash"))
        ),
        format!("Terminal: {}", shell.env.get("TERM").unwrap_or("unknown")),
        format!("Memory: {}MiB / {}MiB", used, total),
    ];
    let width = NEOFETCH_LOGO.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let rows = info.len().max(NEOFETCH_LOGO.len());
    let lines: Vec<String> = (0..rows)
        .map(|i| {
            let logo = NEOFETCH_LOGO.get(i).copied().unwrap_or_default();
            let text = info.get(i).map(String::as_str).unwrap_or_default();
            format!("{:<width$}  {}", logo, text, width = width)
                .trim_end()
                .to_string()
        })
        .collect();
    CommandResult::ok(lines.join("\n"))
}

pub fn fortune() -> CommandResult {
    match FORTUNES.choose(&mut rand::thread_rng()) {
        Some(saying) => CommandResult::ok(*saying),
        None => CommandResult::empty(),
    }
}
