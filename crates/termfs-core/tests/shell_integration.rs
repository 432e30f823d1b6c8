//! End-to-end behaviour of a shell session.

use termfs_core::{FsError, Shell, ShellConfig};

fn shell() -> Shell {
    Shell::new(&ShellConfig::default())
}

fn tree_paths(sh: &Shell) -> Vec<String> {
    sh.fs()
        .walk("/")
        .unwrap()
        .into_iter()
        .map(|node| node.path.clone())
        .collect()
}

#[test]
fn test_chaining_short_circuit() {
    let mut sh = shell();
    let gated = sh.execute("false && echo hi");
    assert!(!gated.output.contains("hi"));
    assert!(!gated.success);

    let sequenced = sh.execute("false ; echo hi");
    assert!(sequenced.output.contains("hi"));
}

#[test]
fn test_round_trip() {
    let mut sh = shell();
    let created = sh.execute("mkdir /t && touch /t/f.txt && cat /t/f.txt");
    assert!(created.success);
    assert_eq!(created.output, "");

    let removed = sh.execute("rm -r /t");
    assert!(removed.success);
    assert!(!sh.fs().exists("/t/f.txt"));

    let listed = sh.execute("ls /t");
    assert!(!listed.success);
    assert_eq!(listed.output, "ls: cannot access '/t': No such file or directory");
}

#[test]
fn test_rm_refuses_dot_operands() {
    let mut sh = shell();
    let result = sh.execute("rm -rf ..");
    assert!(!result.success);
    assert_eq!(
        result.output,
        "rm: refusing to remove '.' or '..' directory: skipping '..'"
    );
    assert!(sh.fs().exists("/home/user"));
    assert_eq!(sh.fs().current_dir(), "/home/user");

    sh.execute("mkdir -p /w/x && cd /w/x");
    for operand in [".", "./", "../x/.", "../.."] {
        let result = sh.execute(&format!("rm -r {}", operand));
        assert!(!result.success, "rm -r {} should fail", operand);
    }
    assert!(sh.fs().exists("/w/x"));
    assert_eq!(sh.fs().current_dir(), "/w/x");
}

#[test]
fn test_rm_refuses_ancestor_of_current_directory() {
    let mut sh = shell();
    sh.execute("mkdir -p /w/x && cd /w/x");
    let result = sh.execute("rm -rf /w");
    assert!(!result.success);
    assert_eq!(
        result.output,
        "rm: refusing to remove '/w': current directory is inside it"
    );
    assert!(sh.fs().exists("/w/x"));
    assert_eq!(sh.execute("pwd").output, "/w/x");

    sh.execute("cd /");
    assert!(sh.execute("rm -r /w").success);
    assert!(!sh.fs().exists("/w"));
}

#[test]
fn test_rename_cascade() {
    let mut sh = shell();
    sh.execute("mkdir -p /a/b && touch /a/b/c.txt");
    assert!(sh.execute("mv /a /z").success);
    assert!(sh.fs().exists("/z/b/c.txt"));
    assert!(sh.fs().resolve_path("/a/b/c.txt").is_none());
    assert_eq!(sh.fs().resolve_path("/z/b/c.txt").unwrap().path, "/z/b/c.txt");
    sh.fs().check_invariants().unwrap();
}

#[test]
fn test_copy_independence() {
    let mut sh = shell();
    sh.execute("mkdir -p /a/b");
    sh.fs_mut().create_file("/a", "f.txt", Some("original"), None).unwrap();
    assert!(sh.execute("cp -r /a /copy").success);

    let fs = sh.fs();
    for (original, copy) in [("/a", "/copy"), ("/a/b", "/copy/b"), ("/a/f.txt", "/copy/f.txt")] {
        assert_ne!(
            fs.resolve_path(original).unwrap().id,
            fs.resolve_path(copy).unwrap().id
        );
    }

    sh.fs_mut().write_file("/copy/f.txt", "changed").unwrap();
    assert_eq!(sh.fs().read_file("/a/f.txt").unwrap(), "original");
    assert_eq!(sh.fs().read_file("/copy/f.txt").unwrap(), "changed");
}

#[test]
fn test_move_into_self_rejected() {
    let mut sh = shell();
    sh.execute("mkdir -p /a/b");
    let before = tree_paths(&sh);

    let err = sh.fs_mut().move_node("/a", "/a/b", None).unwrap_err();
    assert!(matches!(err, FsError::CannotMoveIntoSelf { .. }));
    assert_eq!(tree_paths(&sh), before);

    let result = sh.execute("mv /a /a/b");
    assert!(!result.success);
    assert_eq!(tree_paths(&sh), before);
}

#[test]
fn test_alias_matches_direct_command() {
    let mut sh = shell();
    sh.execute("alias ll='ls -la'");
    let via_alias = sh.execute("ll /");
    let direct = sh.execute("ls -la /");
    assert!(direct.success);
    assert_eq!(via_alias, direct);
}

#[test]
fn test_alias_expands_once() {
    let mut sh = shell();
    sh.execute("alias first='second'");
    sh.execute("alias second='echo nested'");
    // The value of `first` names another alias; it is not expanded again.
    let result = sh.execute("first");
    assert!(!result.success);
    assert_eq!(result.output, "command not found: second");
}

#[test]
fn test_variables_and_aliases_combine() {
    let mut sh = shell();
    sh.execute("export TARGET=/etc");
    sh.execute("alias show='ls'");
    assert_eq!(sh.execute("show $TARGET").output, sh.execute("ls /etc").output);
}

#[test]
fn test_source_runs_script() {
    let mut sh = shell();
    sh.fs_mut()
        .create_file("/tmp", "setup.sh", Some("# setup\nmkdir -p /work\ncd /work\nexport MODE=test\n"), None)
        .unwrap();
    let result = sh.execute(". /tmp/setup.sh");
    assert!(result.success);
    assert_eq!(sh.execute("pwd").output, "/work");
    assert_eq!(sh.execute("echo $MODE").output, "test");
}

#[test]
fn test_pipeline_of_text_commands() {
    let mut sh = shell();
    sh.fs_mut()
        .create_file("/tmp", "words.txt", Some("pear\napple\npear\nfig\n"), None)
        .unwrap();
    assert_eq!(
        sh.execute("cat /tmp/words.txt | sort | uniq").output,
        "apple\nfig\npear"
    );
    assert_eq!(sh.execute("grep -c pear /tmp/words.txt").output, "2");
    assert_eq!(sh.execute("sort -r /tmp/words.txt | head -n 1").output, "pear");
}

#[test]
fn test_wc_counts_trailing_newline_segment() {
    let mut sh = shell();
    sh.fs_mut()
        .create_file("/tmp", "two.txt", Some("a\nb\n"), None)
        .unwrap();
    assert_eq!(sh.execute("wc -l /tmp/two.txt").output, "3 /tmp/two.txt");
}

#[test]
fn test_errors_do_not_end_session() {
    let mut sh = shell();
    assert!(!sh.execute("cd /nope").success);
    assert!(!sh.execute("rm /").success);
    assert!(!sh.execute("bogus").success);
    let result = sh.execute("pwd");
    assert!(result.success);
    assert_eq!(result.output, "/home/user");
    assert!(result.exit.is_none());
}

#[test]
fn test_history_records_raw_lines() {
    let mut sh = shell();
    sh.execute("echo a && echo b");
    sh.execute("bogus");
    let lines: Vec<&str> = sh.history().entries().map(|(_, line)| line).collect();
    assert_eq!(lines, ["echo a && echo b", "bogus"]);
}

#[test]
fn test_completion_through_session() {
    let mut sh = shell();
    sh.execute("mkdir /projects");
    assert_eq!(
        sh.complete("cd /proj"),
        termfs_core::AutocompleteResult::Single("cd /projects/".to_string())
    );
    assert_eq!(sh.hint("cd /proj"), Some("ects/".to_string()));
}
