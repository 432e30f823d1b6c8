//! Path string handling.
//!
//! All canonical paths are absolute: the root is `"/"`, every other path is
//! `"/"`-separated segments with no trailing slash. These helpers are purely
//! lexical; existence checks happen against the node store.

/// Root path.
pub const ROOT: &str = "/";

/// Resolve `path` against the current directory and home directory.
///
/// - empty or `.` resolves to `current`
/// - `~` and `~/...` resolve against `home`
/// - absolute paths reset from the root
/// - `..` pops one segment (never above the root)
pub fn resolve_path_string(current: &str, home: &str, path: &str) -> String {
    if path.is_empty() || path == "." {
        return normalize_path(current);
    }
    if path == "~" {
        return normalize_path(home);
    }
    if let Some(rest) = path.strip_prefix("~/") {
        return normalize_path(&format!("{}/{}", home, rest));
    }
    if path.starts_with('/') {
        return normalize_path(path);
    }
    normalize_path(&format!("{}/{}", current, path))
}

/// Normalize a path by resolving `.` and `..` components.
///
/// The result is always absolute.
pub fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/').filter(|s| !s.is_empty()) {
        match part {
            ".." => {
                parts.pop();
            }
            "." => {}
            _ => parts.push(part),
        }
    }
    format!("/{}", parts.join("/"))
}

/// Split a canonical path into its segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Get the parent of a canonical path. The root is its own parent.
pub fn parent_path(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some(("", _)) | None => ROOT,
        Some((parent, _)) => parent,
    }
}

/// Last segment of a canonical path (empty for the root).
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}

/// Canonical path of a child called `name` under `parent`.
pub fn join(parent: &str, name: &str) -> String {
    if parent == ROOT {
        format!("/{}", name)
    } else {
        format!("{}/{}", parent, name)
    }
}

/// True when `path` equals `ancestor` or lies below it.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    if ancestor == ROOT {
        return true;
    }
    path == ancestor
        || path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Check whether a string is usable as a single path segment.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains('/') && !name.contains('\0')
}

/// Render a canonical path relative to `home` (`~`, `~/docs`), for prompts.
pub fn display_path(path: &str, home: &str) -> String {
    if path == home {
        "~".to_string()
    } else if is_within(path, home) && home != ROOT {
        format!("~{}", &path[home.len()..])
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path_string() {
        let home = "/home/user";
        assert_eq!(resolve_path_string("/anywhere", home, "~"), "/home/user");
        assert_eq!(
            resolve_path_string("/anywhere", home, "~/docs"),
            "/home/user/docs"
        );
        assert_eq!(resolve_path_string("/a", home, "b"), "/a/b");
        assert_eq!(resolve_path_string("/a/b", home, ".."), "/a");
        assert_eq!(resolve_path_string("/a", home, ".."), "/");
        assert_eq!(resolve_path_string("/a", home, "."), "/a");
        assert_eq!(resolve_path_string("/a", home, ""), "/a");
        assert_eq!(resolve_path_string("/a/b/c", home, "../../d"), "/a/d");
        assert_eq!(resolve_path_string("/a", home, "/x/./y/"), "/x/y");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/home/./user"), "/home/user");
        assert_eq!(normalize_path("/home/user/../etc"), "/home/etc");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/../.."), "/");
        assert_eq!(normalize_path("//a//b/"), "/a/b");
    }

    #[test]
    fn test_parent_path() {
        assert_eq!(parent_path("/home/user"), "/home");
        assert_eq!(parent_path("/home"), "/");
        assert_eq!(parent_path("/"), "/");
    }

    #[test]
    fn test_base_name_and_join() {
        assert_eq!(base_name("/a/b.txt"), "b.txt");
        assert_eq!(base_name("/"), "");
        assert_eq!(join("/", "a"), "/a");
        assert_eq!(join("/a", "b"), "/a/b");
    }

    #[test]
    fn test_is_within() {
        assert!(is_within("/a/b", "/a"));
        assert!(is_within("/a", "/a"));
        assert!(!is_within("/ab", "/a"));
        assert!(is_within("/anything", "/"));
    }

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("file.txt"));
        assert!(is_valid_name(".hidden"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("."));
        assert!(!is_valid_name(".."));
        assert!(!is_valid_name("a/b"));
    }

    #[test]
    fn test_display_path() {
        assert_eq!(display_path("/home/user", "/home/user"), "~");
        assert_eq!(display_path("/home/user/docs", "/home/user"), "~/docs");
        assert_eq!(display_path("/home/username", "/home/user"), "/home/username");
        assert_eq!(display_path("/etc", "/home/user"), "/etc");
    }
}
