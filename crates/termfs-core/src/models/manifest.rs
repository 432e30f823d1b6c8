use serde::{Deserialize, Serialize};

use crate::commands::Builtin;

/// Initial layout of a file system.
///
/// Paths are absolute. Parents of every entry are created on demand.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Manifest {
    /// Folder entries (created even when empty)
    #[serde(default)]
    pub directories: Vec<DirectoryEntry>,
    /// File entries
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

/// Folder entry of a manifest.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DirectoryEntry {
    pub path: String,
    /// Icon identifier (e.g., "folder-code")
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// File entry of a manifest.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FileEntry {
    pub path: String,
    #[serde(default)]
    pub content: String,
    /// Explicit mime type (kind is inferred from it when present)
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl DirectoryEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            icon: None,
            color: None,
        }
    }

    fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }
}

impl FileEntry {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            mime_type: None,
        }
    }

    fn executable(path: String, name: &str) -> Self {
        Self {
            path,
            content: format!("#!/bin/sh\n# {}: simulated binary\n", name),
            mime_type: Some("application/x-executable".to_string()),
        }
    }
}

/// Commands whose simulated binaries live in `/bin`; every other
/// non-keyword builtin lives in `/usr/bin`.
const BIN_COMMANDS: &[&str] = &[
    "cat", "chmod", "chown", "cp", "date", "echo", "hostname", "kill", "less", "ln", "ls", "mkdir",
    "more", "mv", "ps", "pwd", "rm", "rmdir", "sleep", "touch", "uname",
];

impl Manifest {
    /// The stock layout of a fresh session for `user` on `hostname`.
    pub fn default_layout(user: &str, hostname: &str) -> Self {
        let home = format!("/home/{}", user);
        let mut directories = vec![
            DirectoryEntry::new("/bin"),
            DirectoryEntry::new("/usr/bin"),
            DirectoryEntry::new("/usr/local/bin"),
            DirectoryEntry::new("/etc"),
            DirectoryEntry::new("/tmp"),
            DirectoryEntry::new("/var/log"),
        ];
        for (name, icon) in [
            ("Desktop", "desktop"),
            ("Documents", "folder-docs"),
            ("Downloads", "folder-download"),
            ("Music", "folder-music"),
            ("Pictures", "folder-images"),
            ("Videos", "folder-video"),
        ] {
            directories.push(DirectoryEntry::new(format!("{}/{}", home, name)).with_icon(icon));
        }

        let mut files = vec![
            FileEntry::new("/etc/hostname", format!("{}\n", hostname)),
            FileEntry::new(
                "/etc/passwd",
                format!(
                    "root:x:0:0:root:/root:/bin/bash\n{user}:x:1000:1000:{user}:/home/{user}:/bin/bash\n"
                ),
            ),
            FileEntry::new("/etc/motd", "Welcome to TermFS.\n"),
            FileEntry::new("/var/log/system.log", "[    0.000000] boot: system started\n"),
            FileEntry::new(
                format!("{}/.bashrc", home),
                "# ~/.bashrc\nalias ll='ls -la'\nexport EDITOR=vim\n",
            ),
            FileEntry::new(
                format!("{}/Documents/readme.txt", home),
                "Welcome to your home directory.\nType 'help' to list commands.\n",
            ),
            FileEntry::new(
                format!("{}/Documents/notes.md", home),
                "# Notes\n\n- buy milk\n- write code\n",
            ),
        ];

        for builtin in Builtin::ALL.iter().filter(|b| !b.is_keyword()) {
            let name = builtin.name();
            let dir = if BIN_COMMANDS.contains(&name) {
                "/bin"
            } else {
                "/usr/bin"
            };
            files.push(FileEntry::executable(format!("{}/{}", dir, name), name));
        }
        files.push(FileEntry::executable("/bin/bash".to_string(), "bash"));

        Self { directories, files }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_has_home() {
        let manifest = Manifest::default_layout("alice", "box");
        assert!(
            manifest
                .directories
                .iter()
                .any(|d| d.path == "/home/alice/Documents")
        );
        let hostname = manifest
            .files
            .iter()
            .find(|f| f.path == "/etc/hostname")
            .unwrap();
        assert_eq!(hostname.content, "box\n");
    }

    #[test]
    fn test_default_layout_binaries() {
        let manifest = Manifest::default_layout("user", "host");
        assert!(manifest.files.iter().any(|f| f.path == "/bin/ls"));
        assert!(manifest.files.iter().any(|f| f.path == "/usr/bin/grep"));
        // Shell keywords have no binary.
        assert!(!manifest.files.iter().any(|f| f.path.ends_with("/cd")));
    }

    #[test]
    fn test_manifest_from_json() {
        let manifest: Manifest =
            serde_json::from_str(r#"{"files": [{"path": "/a/b.txt", "content": "x"}]}"#).unwrap();
        assert!(manifest.directories.is_empty());
        assert_eq!(manifest.files[0].path, "/a/b.txt");
        assert!(manifest.files[0].mime_type.is_none());
    }
}
