//! File system builtins.
//!
//! Every handler formats engine errors into the message its GNU counterpart
//! prints, quoting the operand exactly as typed.

use regex::RegexBuilder;

use crate::config::{DF_ROWS, DU_BLOCKS};
use crate::error::{FsError, ShellError};
use crate::filesystem::path;
use crate::models::FileNode;
use crate::session::Shell;
use crate::utils::{format_date_short, format_size};

use super::{CommandResult, Invocation};

/// Mime type marking a symbolic link. The link target is the content.
pub const SYMLINK_MIME: &str = "inode/symlink";

const DIR_SIZE: u64 = 4096;

fn is_symlink(node: &FileNode) -> bool {
    node.metadata.mime_type.as_deref() == Some(SYMLINK_MIME)
}

// =============================================================================
// Navigation
// =============================================================================

pub fn pwd(shell: &Shell) -> CommandResult {
    CommandResult::ok(shell.fs.current_dir())
}

pub fn cd(shell: &mut Shell, inv: &Invocation) -> CommandResult {
    if inv.positional.len() > 1 {
        return CommandResult::error("cd: too many arguments");
    }
    let (target, announce) = match inv.positional.first().map(String::as_str) {
        None => (
            shell
                .env
                .get("HOME")
                .unwrap_or(shell.fs.home_dir())
                .to_string(),
            false,
        ),
        Some("-") => match shell.env.get("OLDPWD") {
            Some(old) => (old.to_string(), true),
            None => return CommandResult::error("cd: OLDPWD not set"),
        },
        Some(arg) => (arg.to_string(), false),
    };

    let previous = shell.fs.current_dir().to_string();
    match shell.fs.change_dir(&target) {
        Ok(current) => {
            let current = current.to_string();
            shell.set_var("OLDPWD", &previous);
            shell.set_var("PWD", &current);
            if announce {
                CommandResult::ok(current)
            } else {
                CommandResult::empty()
            }
        }
        Err(FsError::NotADirectory(_)) => {
            CommandResult::error(format!("cd: not a directory: {}", target))
        }
        Err(_) => CommandResult::error(format!("cd: no such file or directory: {}", target)),
    }
}

// =============================================================================
// Listing
// =============================================================================

pub fn ls(shell: &Shell, inv: &Invocation) -> CommandResult {
    let operands: Vec<&str> = if inv.positional.is_empty() {
        vec![""]
    } else {
        inv.positional.iter().map(String::as_str).collect()
    };
    let long = inv.has('l');
    let all = inv.has('a');
    let human = inv.has('h');
    let headers = operands.len() > 1;

    let mut result = CommandResult::empty();
    let mut blocks = Vec::new();
    for operand in operands {
        let Some(node) = shell.fs.resolve_path(operand) else {
            result.push_stderr(&format!(
                "ls: cannot access '{}': No such file or directory",
                operand
            ));
            continue;
        };

        if !node.is_folder() {
            blocks.push(if long {
                long_line(shell, node, operand, human)
            } else {
                operand.to_string()
            });
            continue;
        }

        let mut entries: Vec<(String, &FileNode)> = Vec::new();
        if all {
            let parent = node
                .parent_id
                .and_then(|id| shell.fs.get(id))
                .unwrap_or(node);
            entries.push((".".to_string(), node));
            entries.push(("..".to_string(), parent));
        }
        let mut children: Vec<&FileNode> = shell
            .fs
            .list_directory(&node.path)
            .unwrap_or_default()
            .into_iter()
            .filter(|child| all || !child.is_hidden())
            .collect();
        children.sort_by_key(|child| child.name.to_lowercase());
        entries.extend(children.into_iter().map(|child| (child.name.clone(), child)));

        let lines: Vec<String> = entries
            .iter()
            .map(|(name, entry)| {
                if long {
                    long_line(shell, entry, name, human)
                } else if entry.is_folder() && name != "." && name != ".." {
                    format!("{}/", name)
                } else {
                    name.clone()
                }
            })
            .collect();
        let mut block = lines.join("\n");
        if headers {
            block = if block.is_empty() {
                format!("{}:", operand)
            } else {
                format!("{}:\n{}", operand, block)
            };
        }
        blocks.push(block);
    }

    let separator = if headers { "\n\n" } else { "\n" };
    let listing = blocks.join(separator);
    if !listing.is_empty() {
        result.push_stdout(&listing);
    }
    result
}

fn long_line(shell: &Shell, node: &FileNode, name: &str, human: bool) -> String {
    let (mode, links, size) = if node.is_folder() {
        let sub_dirs = node
            .children()
            .unwrap_or_default()
            .iter()
            .filter(|id| shell.fs.get(**id).is_some_and(FileNode::is_folder))
            .count();
        ("drwxr-xr-x", 2 + sub_dirs, DIR_SIZE)
    } else if is_symlink(node) {
        ("lrwxrwxrwx", 1, node.metadata.size)
    } else if node.kind == crate::models::NodeKind::Application {
        ("-rwxr-xr-x", 1, node.metadata.size)
    } else {
        ("-rw-r--r--", 1, node.metadata.size)
    };
    let owner = owner_of(shell, node);
    let mut line = format!(
        "{} {:>2} {} {} {:>5} {} {}",
        mode,
        links,
        owner,
        owner,
        format_size(size, human),
        format_date_short(node.metadata.modified_at),
        name
    );
    if is_symlink(node) {
        line.push_str(" -> ");
        line.push_str(node.content().unwrap_or_default());
    }
    line
}

fn owner_of<'a>(shell: &'a Shell, node: &FileNode) -> &'a str {
    if path::is_within(&node.path, shell.fs.home_dir()) || path::is_within(&node.path, "/tmp") {
        shell.identity.user.as_str()
    } else {
        "root"
    }
}

pub fn tree(shell: &Shell, inv: &Invocation) -> CommandResult {
    let operand = inv.positional.first().map_or(".", String::as_str);
    let Some(root) = shell.fs.resolve_path(operand).filter(|n| n.is_folder()) else {
        return CommandResult::error(format!("{} [error opening dir]", operand));
    };

    let mut lines = vec![operand.to_string()];
    let mut counts = (0usize, 0usize);
    tree_level(shell, root, "", inv.has('a'), &mut lines, &mut counts);
    lines.push(String::new());
    lines.push(format!(
        "{} {}, {} {}",
        counts.0,
        if counts.0 == 1 { "directory" } else { "directories" },
        counts.1,
        if counts.1 == 1 { "file" } else { "files" }
    ));
    CommandResult::ok(lines.join("\n"))
}

fn tree_level(
    shell: &Shell,
    dir: &FileNode,
    prefix: &str,
    all: bool,
    lines: &mut Vec<String>,
    counts: &mut (usize, usize),
) {
    let mut children: Vec<&FileNode> = dir
        .children()
        .unwrap_or_default()
        .iter()
        .filter_map(|id| shell.fs.get(*id))
        .filter(|child| all || !child.is_hidden())
        .collect();
    children.sort_by_key(|child| child.name.to_lowercase());

    let last = children.len().saturating_sub(1);
    for (i, child) in children.into_iter().enumerate() {
        let (branch, indent) = if i == last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        lines.push(format!("{}{}{}", prefix, branch, child.name));
        if child.is_folder() {
            counts.0 += 1;
            tree_level(shell, child, &format!("{}{}", prefix, indent), all, lines, counts);
        } else {
            counts.1 += 1;
        }
    }
}

pub fn find(shell: &Shell, inv: &Invocation) -> CommandResult {
    let mut args = inv.positional.iter().map(String::as_str).peekable();
    let start = match args.peek() {
        Some(first) if !first.starts_with('-') => args.next().unwrap_or("."),
        _ => ".",
    };

    let mut patterns = Vec::new();
    let mut kind = None;
    while let Some(predicate) = args.next() {
        let value = match predicate {
            "-name" | "-iname" | "-type" => match args.next() {
                Some(value) => value,
                None => {
                    return CommandResult::error(format!(
                        "find: missing argument to '{}'",
                        predicate
                    ));
                }
            },
            other => return CommandResult::error(format!("find: unknown predicate '{}'", other)),
        };
        match predicate {
            "-type" => match value {
                "f" => kind = Some(false),
                "d" => kind = Some(true),
                other => {
                    return CommandResult::error(format!("find: Unknown argument to -type: {}", other));
                }
            },
            _ => match glob_to_regex(value, predicate == "-iname") {
                Some(regex) => patterns.push(regex),
                None => {
                    return CommandResult::error(format!("find: invalid pattern '{}'", value));
                }
            },
        }
    }

    let base = shell.fs.absolute(start);
    let Ok(nodes) = shell.fs.walk(start) else {
        return CommandResult::error(format!("find: '{}': No such file or directory", start));
    };
    let shown = start.trim_end_matches('/');
    let lines: Vec<String> = nodes
        .into_iter()
        .filter(|node| kind.is_none_or(|dir| node.is_folder() == dir))
        .filter(|node| patterns.iter().all(|re| re.is_match(&node.name)))
        .map(|node| {
            if node.path == base {
                start.to_string()
            } else if base == path::ROOT {
                format!("{}{}", shown, node.path)
            } else {
                format!("{}{}", shown, &node.path[base.len()..])
            }
        })
        .collect();
    CommandResult::ok(lines.join("\n"))
}

/// Translate a shell glob into an anchored regex.
fn glob_to_regex(glob: &str, ignore_case: bool) -> Option<regex::Regex> {
    let mut pattern = String::from("^");
    let mut chars = glob.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            '[' => {
                pattern.push('[');
                for c in chars.by_ref() {
                    match c {
                        ']' => break,
                        '\\' => pattern.push_str("\\\\"),
                        c => pattern.push(c),
                    }
                }
                pattern.push(']');
            }
            c => pattern.push_str(&regex::escape(&c.to_string())),
        }
    }
    pattern.push('$');
    RegexBuilder::new(&pattern)
        .case_insensitive(ignore_case)
        .build()
        .ok()
}

// =============================================================================
// Reading
// =============================================================================

pub fn cat(shell: &Shell, inv: &Invocation, stdin: Option<&str>) -> CommandResult {
    let command = inv.builtin.name();
    if inv.positional.is_empty() {
        return match stdin {
            Some(input) => CommandResult::ok(number_lines(input, inv.has('n'))),
            None => CommandResult::error(format!("{}: missing file operand", command)),
        };
    }

    let mut result = CommandResult::empty();
    let mut content = String::new();
    for operand in &inv.positional {
        if operand == "-" {
            content.push_str(stdin.unwrap_or_default());
            continue;
        }
        match read_through_link(shell, operand) {
            Ok(text) => content.push_str(text),
            Err(err) => result.push_stderr(&format!("{}: {}: {}", command, operand, err.reason())),
        }
    }
    if !content.is_empty() {
        result.stdout = number_lines(&content, inv.has('n'));
    }
    result
}

/// Read a file's content, following one level of symbolic link.
pub(crate) fn read_through_link<'a>(shell: &'a Shell, operand: &str) -> Result<&'a str, FsError> {
    let node = shell
        .fs
        .resolve_path(operand)
        .ok_or_else(|| FsError::NotFound(operand.to_string()))?;
    let content = node
        .content()
        .ok_or_else(|| FsError::IsADirectory(operand.to_string()))?;
    if !is_symlink(node) {
        return Ok(content);
    }
    let target = path::resolve_path_string(path::parent_path(&node.path), shell.fs.home_dir(), content);
    shell
        .fs
        .read_file(&target)
        .map_err(|err| match err {
            FsError::IsADirectory(_) => FsError::IsADirectory(operand.to_string()),
            _ => FsError::NotFound(operand.to_string()),
        })
}

fn number_lines(text: &str, number: bool) -> String {
    if !number {
        return text.to_string();
    }
    text.lines()
        .enumerate()
        .map(|(i, line)| format!("{:>6}\t{}", i + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// Creating and Removing
// =============================================================================

pub fn touch(shell: &mut Shell, inv: &Invocation) -> CommandResult {
    if inv.positional.is_empty() {
        return ShellError::MissingOperand { command: "touch" }.into();
    }
    let mut result = CommandResult::empty();
    for operand in &inv.positional {
        let outcome = if shell.fs.exists(operand) {
            shell.fs.touch(operand)
        } else {
            let target = shell.fs.absolute(operand);
            shell
                .fs
                .create_file(path::parent_path(&target), path::base_name(&target), None, None)
                .map(|_| ())
        };
        if let Err(err) = outcome {
            result.push_stderr(&format!("touch: cannot touch '{}': {}", operand, err.reason()));
        }
    }
    result
}

pub fn mkdir(shell: &mut Shell, inv: &Invocation) -> CommandResult {
    if inv.positional.is_empty() {
        return ShellError::MissingOperand { command: "mkdir" }.into();
    }
    let mut result = CommandResult::empty();
    for operand in &inv.positional {
        let outcome = if inv.has('p') {
            shell.fs.create_dir_all(operand).map(|_| ())
        } else {
            let target = shell.fs.absolute(operand);
            shell
                .fs
                .create_folder(path::parent_path(&target), path::base_name(&target), None, None)
                .map(|_| ())
        };
        if let Err(err) = outcome {
            result.push_stderr(&format!(
                "mkdir: cannot create directory '{}': {}",
                operand,
                err.reason()
            ));
        }
    }
    result
}

pub fn rm(shell: &mut Shell, inv: &Invocation) -> CommandResult {
    let force = inv.has('f');
    let recursive = inv.has('r') || inv.has('R');
    if inv.positional.is_empty() {
        return if force {
            CommandResult::empty()
        } else {
            ShellError::MissingOperand { command: "rm" }.into()
        };
    }

    let mut result = CommandResult::empty();
    for operand in &inv.positional {
        if is_dot_operand(operand) {
            result.push_stderr(&format!(
                "rm: refusing to remove '.' or '..' directory: skipping '{}'",
                operand
            ));
            continue;
        }
        let Some(node) = shell.fs.resolve_path(operand) else {
            if !force {
                result.push_stderr(&format!(
                    "rm: cannot remove '{}': No such file or directory",
                    operand
                ));
            }
            continue;
        };
        if node.is_root() {
            result.push_stderr("rm: it is dangerous to operate recursively on '/'");
            continue;
        }
        if path::is_within(shell.fs.current_dir(), &node.path) {
            result.push_stderr(&format!(
                "rm: refusing to remove '{}': current directory is inside it",
                operand
            ));
            continue;
        }
        if node.is_folder() && !recursive {
            result.push_stderr(&format!("rm: cannot remove '{}': Is a directory", operand));
            continue;
        }
        if let Err(err) = shell.fs.delete(operand) {
            result.push_stderr(&format!("rm: cannot remove '{}': {}", operand, err.reason()));
        }
    }
    result
}

/// `.` or `..` as the last segment (`.`, `a/..`, `../`).
fn is_dot_operand(operand: &str) -> bool {
    matches!(
        operand.trim_end_matches('/').rsplit('/').next(),
        Some("." | "..")
    )
}

pub fn rmdir(shell: &mut Shell, inv: &Invocation) -> CommandResult {
    if inv.positional.is_empty() {
        return ShellError::MissingOperand { command: "rmdir" }.into();
    }
    let mut result = CommandResult::empty();
    for operand in &inv.positional {
        let target = shell.fs.absolute(operand);
        if is_dot_operand(operand) || path::is_within(shell.fs.current_dir(), &target) {
            result.push_stderr(&format!("rmdir: failed to remove '{}': Invalid argument", operand));
            continue;
        }
        if let Err(err) = shell.fs.remove_dir(operand) {
            result.push_stderr(&format!(
                "rmdir: failed to remove '{}': {}",
                operand,
                err.reason()
            ));
        }
    }
    result
}

// =============================================================================
// Copying and Moving
// =============================================================================

#[derive(Clone, Copy, PartialEq, Eq)]
enum Transfer {
    Copy,
    Move,
}

impl Transfer {
    fn command(self) -> &'static str {
        match self {
            Self::Copy => "cp",
            Self::Move => "mv",
        }
    }
}

pub fn cp(shell: &mut Shell, inv: &Invocation) -> CommandResult {
    transfer(shell, inv, Transfer::Copy)
}

pub fn mv(shell: &mut Shell, inv: &Invocation) -> CommandResult {
    transfer(shell, inv, Transfer::Move)
}

fn transfer(shell: &mut Shell, inv: &Invocation, mode: Transfer) -> CommandResult {
    let command = mode.command();
    let Some((dest, sources)) = inv.positional.split_last().filter(|(_, s)| !s.is_empty()) else {
        return ShellError::MissingOperand { command }.into();
    };
    let dest_is_dir = shell.fs.is_directory(dest);
    if sources.len() > 1 && !dest_is_dir {
        return CommandResult::error(format!("{}: target '{}' is not a directory", command, dest));
    }

    let mut result = CommandResult::empty();
    for source in sources {
        if let Err(message) = transfer_one(shell, inv, mode, source, dest, dest_is_dir) {
            result.push_stderr(&message);
        }
    }
    result
}

fn transfer_one(
    shell: &mut Shell,
    inv: &Invocation,
    mode: Transfer,
    source: &str,
    dest: &str,
    dest_is_dir: bool,
) -> Result<(), String> {
    let command = mode.command();
    let Some(node) = shell.fs.resolve_path(source) else {
        return Err(format!(
            "{}: cannot stat '{}': No such file or directory",
            command, source
        ));
    };
    let source_is_dir = node.is_folder();
    if mode == Transfer::Copy && source_is_dir && !(inv.has('r') || inv.has('R')) {
        return Err(format!("cp: -r not specified; omitting directory '{}'", source));
    }

    let source_path = shell.fs.absolute(source);
    let dest_path = shell.fs.absolute(dest);
    if source_path == dest_path && !source_is_dir {
        return Err(format!(
            "{}: '{}' and '{}' are the same file",
            command, source, dest
        ));
    }

    let (parent, name) = if dest_is_dir {
        (dest_path.clone(), None)
    } else {
        if shell.fs.exists(&dest_path) {
            if source_is_dir {
                return Err(format!(
                    "{}: cannot overwrite non-directory '{}' with directory '{}'",
                    command, dest, source
                ));
            }
            match mode {
                Transfer::Copy => {
                    let content = read_through_link(shell, source)
                        .map_err(|err| format!("cp: cannot open '{}': {}", source, err.reason()))?
                        .to_string();
                    return shell
                        .fs
                        .write_file(&dest_path, &content)
                        .map_err(|err| format!("cp: cannot create '{}': {}", dest, err.reason()));
                }
                Transfer::Move => shell
                    .fs
                    .delete(&dest_path)
                    .map_err(|err| format!("mv: cannot move '{}': {}", source, err.reason()))?,
            }
        }
        (
            path::parent_path(&dest_path).to_string(),
            Some(path::base_name(&dest_path).to_string()),
        )
    };

    let outcome = match mode {
        Transfer::Copy => shell.fs.copy(&source_path, &parent, name.as_deref()).map(|_| ()),
        Transfer::Move => shell.fs.move_node(&source_path, &parent, name.as_deref()).map(|_| ()),
    };
    outcome.map_err(|err| match (mode, err) {
        (Transfer::Move, FsError::CannotMoveIntoSelf { .. }) => format!(
            "mv: cannot move '{}' to a subdirectory of itself, '{}'",
            source, dest
        ),
        (Transfer::Copy, FsError::CannotMoveIntoSelf { .. }) => format!(
            "cp: cannot copy a directory, '{}', into itself, '{}'",
            source, dest
        ),
        (_, err) => format!("{}: cannot create '{}': {}", command, dest, err.reason()),
    })
}

pub fn ln(shell: &mut Shell, inv: &Invocation) -> CommandResult {
    if !inv.has('s') {
        return ShellError::InvalidArgument {
            command: "ln",
            message: "hard links are not supported; use -s".to_string(),
        }
        .into();
    }
    let (target, link) = match inv.positional.as_slice() {
        [target] => (target.as_str(), path::base_name(target)),
        [target, link] => (target.as_str(), link.as_str()),
        [] => return ShellError::MissingOperand { command: "ln" }.into(),
        _ => return CommandResult::error("ln: extra operand"),
    };

    let mut link_path = shell.fs.absolute(link);
    if shell.fs.is_directory(&link_path) {
        link_path = path::join(&link_path, path::base_name(target));
    }
    match shell.fs.create_file(
        path::parent_path(&link_path),
        path::base_name(&link_path),
        Some(target),
        Some(SYMLINK_MIME),
    ) {
        Ok(_) => CommandResult::empty(),
        Err(err) => CommandResult::error(format!(
            "ln: failed to create symbolic link '{}': {}",
            link,
            err.reason()
        )),
    }
}

// =============================================================================
// Ownership and Mode
// =============================================================================

pub fn chmod(shell: &Shell, inv: &Invocation) -> CommandResult {
    let Some((mode, files)) = inv.positional.split_first().filter(|(_, f)| !f.is_empty()) else {
        return ShellError::MissingOperand { command: "chmod" }.into();
    };
    if !is_valid_mode(mode) {
        return CommandResult::error(format!("chmod: invalid mode: '{}'", mode));
    }
    check_operands(shell, "chmod", files)
}

pub fn chown(shell: &Shell, inv: &Invocation) -> CommandResult {
    let Some((owner, files)) = inv.positional.split_first().filter(|(_, f)| !f.is_empty()) else {
        return ShellError::MissingOperand { command: "chown" }.into();
    };
    let (user, group) = owner.split_once(':').unwrap_or((owner.as_str(), ""));
    for name in [user, group] {
        if !name.is_empty() && name != "root" && name != shell.identity.user {
            return CommandResult::error(format!("chown: invalid user: '{}'", owner));
        }
    }
    check_operands(shell, "chown", files)
}

fn check_operands(shell: &Shell, command: &str, files: &[String]) -> CommandResult {
    let mut result = CommandResult::empty();
    for file in files {
        if !shell.fs.exists(file) {
            result.push_stderr(&format!(
                "{}: cannot access '{}': No such file or directory",
                command, file
            ));
        }
    }
    result
}

/// Octal (`755`, `0644`) or symbolic (`u+x,go-w`) mode.
fn is_valid_mode(mode: &str) -> bool {
    if mode.chars().all(|c| c.is_digit(8)) {
        return (1..=4).contains(&mode.len());
    }
    mode.split(',').all(|clause| {
        let rest = clause.trim_start_matches(['u', 'g', 'o', 'a']);
        let mut chars = rest.chars();
        matches!(chars.next(), Some('+' | '-' | '='))
            && chars.all(|c| matches!(c, 'r' | 'w' | 'x' | 'X' | 's' | 't'))
    })
}

// =============================================================================
// Disk Usage
// =============================================================================

pub fn du(shell: &Shell, inv: &Invocation) -> CommandResult {
    let operands: Vec<&str> = if inv.positional.is_empty() {
        vec!["."]
    } else {
        inv.positional.iter().map(String::as_str).collect()
    };
    let size = if inv.has('h') {
        format_size(DU_BLOCKS * 1024, true)
    } else {
        DU_BLOCKS.to_string()
    };

    let mut result = CommandResult::empty();
    for operand in operands {
        let Ok(nodes) = shell.fs.walk(operand) else {
            result.push_stderr(&format!(
                "du: cannot access '{}': No such file or directory",
                operand
            ));
            continue;
        };
        let base = shell.fs.absolute(operand);
        let shown = operand.trim_end_matches('/');
        let mut lines: Vec<String> = Vec::new();
        if !inv.has('s') {
            for node in nodes.iter().rev().filter(|n| n.is_folder() && n.path != base) {
                let suffix = if base == path::ROOT {
                    node.path.clone()
                } else {
                    node.path[base.len()..].to_string()
                };
                lines.push(format!("{}\t{}{}", size, shown, suffix));
            }
        }
        lines.push(format!("{}\t{}", size, operand));
        result.push_stdout(&lines.join("\n"));
    }
    result
}

pub fn df(inv: &Invocation) -> CommandResult {
    let human = inv.has('h');
    let mut lines = vec![if human {
        format!(
            "{:<14} {:>6} {:>6} {:>6} {:>4} {}",
            "Filesystem", "Size", "Used", "Avail", "Use%", "Mounted on"
        )
    } else {
        format!(
            "{:<14} {:>10} {:>10} {:>10} {:>4} {}",
            "Filesystem", "1K-blocks", "Used", "Available", "Use%", "Mounted on"
        )
    }];
    for &(name, blocks, used, mount) in DF_ROWS {
        let available = blocks.saturating_sub(used);
        let percent = (used * 100).div_ceil(blocks.max(1));
        lines.push(if human {
            format!(
                "{:<14} {:>6} {:>6} {:>6} {:>3}% {}",
                name,
                format_size(blocks * 1024, true),
                format_size(used * 1024, true),
                format_size(available * 1024, true),
                percent,
                mount
            )
        } else {
            format!(
                "{:<14} {:>10} {:>10} {:>10} {:>3}% {}",
                name, blocks, used, available, percent, mount
            )
        });
    }
    CommandResult::ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShellConfig;

    fn shell() -> Shell {
        Shell::new(&ShellConfig::default())
    }

    fn run(shell: &mut Shell, line: &str) -> crate::session::LineResult {
        shell.execute(line)
    }

    #[test]
    fn test_cd_errors() {
        let mut sh = shell();
        let out = run(&mut sh, "cd /nope");
        assert!(!out.success);
        assert_eq!(out.output, "cd: no such file or directory: /nope");

        let out = run(&mut sh, "cd /etc/passwd");
        assert_eq!(out.output, "cd: not a directory: /etc/passwd");
    }

    #[test]
    fn test_cd_updates_pwd_and_oldpwd() {
        let mut sh = shell();
        run(&mut sh, "cd /tmp");
        assert_eq!(sh.env().get("PWD"), Some("/tmp"));
        assert_eq!(sh.env().get("OLDPWD"), Some("/home/user"));
        let out = run(&mut sh, "cd -");
        assert_eq!(out.output, "/home/user");
        assert_eq!(sh.fs().current_dir(), "/home/user");
    }

    #[test]
    fn test_cd_home() {
        let mut sh = shell();
        run(&mut sh, "cd /");
        run(&mut sh, "cd");
        assert_eq!(sh.fs().current_dir(), "/home/user");
        run(&mut sh, "cd ~/Documents");
        assert_eq!(sh.fs().current_dir(), "/home/user/Documents");
    }

    #[test]
    fn test_ls_hides_dotfiles() {
        let mut sh = shell();
        let out = run(&mut sh, "ls");
        assert!(out.output.contains("Documents/"));
        assert!(!out.output.contains(".bashrc"));

        let out = run(&mut sh, "ls -a");
        assert!(out.output.starts_with(".\n..\n"));
        assert!(out.output.contains(".bashrc"));
    }

    #[test]
    fn test_ls_missing() {
        let mut sh = shell();
        let out = run(&mut sh, "ls /missing");
        assert!(!out.success);
        assert_eq!(
            out.output,
            "ls: cannot access '/missing': No such file or directory"
        );
    }

    #[test]
    fn test_ls_long() {
        let mut sh = shell();
        let out = run(&mut sh, "ls -l /etc");
        let line = out.output.lines().find(|l| l.ends_with("hostname")).unwrap();
        assert!(line.starts_with("-rw-r--r--"));
        assert!(line.contains("root root"));
    }

    #[test]
    fn test_cat_and_missing_file() {
        let mut sh = shell();
        let out = run(&mut sh, "cat /etc/hostname");
        assert_eq!(out.output, "termfs");

        let out = run(&mut sh, "cat nope.txt");
        assert!(!out.success);
        assert_eq!(out.output, "cat: nope.txt: No such file or directory");

        let out = run(&mut sh, "cat /etc");
        assert_eq!(out.output, "cat: /etc: Is a directory");
    }

    #[test]
    fn test_cat_number() {
        let mut sh = shell();
        let out = run(&mut sh, "cat -n /etc/passwd");
        assert!(out.output.starts_with("     1\troot"));
    }

    #[test]
    fn test_mkdir_touch_rm() {
        let mut sh = shell();
        assert!(run(&mut sh, "mkdir /t").success);
        let out = run(&mut sh, "mkdir /t");
        assert_eq!(out.output, "mkdir: cannot create directory '/t': File exists");
        assert!(run(&mut sh, "touch /t/a.txt").success);
        let out = run(&mut sh, "rm /t");
        assert_eq!(out.output, "rm: cannot remove '/t': Is a directory");
        assert!(run(&mut sh, "rm -r /t").success);
        assert!(!sh.fs().exists("/t"));
    }

    #[test]
    fn test_mkdir_parents() {
        let mut sh = shell();
        assert!(run(&mut sh, "mkdir -p /x/y/z").success);
        assert!(sh.fs().is_directory("/x/y/z"));
        assert!(!run(&mut sh, "mkdir /q/r").success);
    }

    #[test]
    fn test_rm_force_is_silent() {
        let mut sh = shell();
        let out = run(&mut sh, "rm -f /nothing");
        assert!(out.success);
        assert!(out.output.is_empty());
    }

    #[test]
    fn test_rmdir_not_empty() {
        let mut sh = shell();
        let out = run(&mut sh, "rmdir /etc");
        assert_eq!(out.output, "rmdir: failed to remove '/etc': Directory not empty");
    }

    #[test]
    fn test_rmdir_keeps_current_directory() {
        let mut sh = shell();
        run(&mut sh, "mkdir -p /w/x && cd /w/x");
        let out = run(&mut sh, "rmdir .");
        assert_eq!(out.output, "rmdir: failed to remove '.': Invalid argument");
        let out = run(&mut sh, "rmdir /w/x");
        assert!(!out.success);
        assert!(sh.fs().exists("/w/x"));
        assert_eq!(sh.fs().current_dir(), "/w/x");
    }

    #[test]
    fn test_cp_requires_recursive_for_dirs() {
        let mut sh = shell();
        let out = run(&mut sh, "cp /etc /tmp");
        assert_eq!(out.output, "cp: -r not specified; omitting directory '/etc'");
        assert!(run(&mut sh, "cp -r /etc /tmp/etc2").success);
        assert!(sh.fs().exists("/tmp/etc2/hostname"));
    }

    #[test]
    fn test_cp_file_over_file() {
        let mut sh = shell();
        run(&mut sh, "touch /tmp/a.txt");
        assert!(run(&mut sh, "cp /etc/hostname /tmp/a.txt").success);
        assert_eq!(sh.fs().read_file("/tmp/a.txt").unwrap(), "termfs\n");
    }

    #[test]
    fn test_mv_rename_and_into_dir() {
        let mut sh = shell();
        run(&mut sh, "touch /tmp/a.txt");
        assert!(run(&mut sh, "mv /tmp/a.txt /tmp/b.txt").success);
        assert!(sh.fs().exists("/tmp/b.txt"));
        assert!(run(&mut sh, "mv /tmp/b.txt /etc").success);
        assert!(sh.fs().exists("/etc/b.txt"));
    }

    #[test]
    fn test_mv_into_itself() {
        let mut sh = shell();
        run(&mut sh, "mkdir -p /a/b");
        let out = run(&mut sh, "mv /a /a/b");
        assert_eq!(
            out.output,
            "mv: cannot move '/a' to a subdirectory of itself, '/a/b'"
        );
        assert!(sh.fs().exists("/a/b"));
    }

    #[test]
    fn test_ln_symlink() {
        let mut sh = shell();
        assert!(run(&mut sh, "ln -s /etc/hostname /tmp/host").success);
        assert_eq!(run(&mut sh, "cat /tmp/host").output, "termfs");
        let out = run(&mut sh, "ls -l /tmp");
        assert!(out.output.contains("host -> /etc/hostname"));
        assert!(!run(&mut sh, "ln /etc/hostname /tmp/h2").success);
    }

    #[test]
    fn test_chmod_validates_mode() {
        let mut sh = shell();
        assert!(run(&mut sh, "chmod 755 /etc/hostname").success);
        assert!(run(&mut sh, "chmod u+x,go-w /etc/hostname").success);
        let out = run(&mut sh, "chmod 9z /etc/hostname");
        assert_eq!(out.output, "chmod: invalid mode: '9z'");
        assert!(!run(&mut sh, "chown nobody /etc/hostname").success);
    }

    #[test]
    fn test_find_by_name() {
        let mut sh = shell();
        let out = run(&mut sh, "find /etc -name 'host*'");
        assert_eq!(out.output, "/etc/hostname");
        let out = run(&mut sh, "find . -type d -iname 'DOC*'");
        assert_eq!(out.output, "./Documents");
    }

    #[test]
    fn test_tree_counts() {
        let mut sh = shell();
        run(&mut sh, "mkdir -p /t/a && touch /t/a/f.txt /t/g.txt");
        let out = run(&mut sh, "tree /t");
        assert_eq!(
            out.output,
            "/t\n├── a\n│   └── f.txt\n└── g.txt\n\n1 directory, 2 files"
        );
    }

    #[test]
    fn test_du_and_df_are_canned() {
        let mut sh = shell();
        assert_eq!(run(&mut sh, "du -s /etc").output, "4\t/etc");
        assert_eq!(run(&mut sh, "du -sh /etc").output, "4.0K\t/etc");
        let out = run(&mut sh, "df");
        assert!(out.output.starts_with("Filesystem"));
        assert_eq!(out.output.lines().count(), 1 + DF_ROWS.len());
    }

    #[test]
    fn test_glob_to_regex() {
        let re = glob_to_regex("*.t?t", false).unwrap();
        assert!(re.is_match("notes.txt"));
        assert!(!re.is_match("notes.md"));
        assert!(glob_to_regex("A*", true).unwrap().is_match("abc"));
    }
}
