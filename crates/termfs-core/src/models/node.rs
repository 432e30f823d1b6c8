use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// =============================================================================
// Node Id
// =============================================================================

// Process-wide id generator: ids stay unique across sessions.
static NODE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque, generator-issued node identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Issue a fresh id.
    pub fn generate() -> Self {
        Self(NODE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Make sure ids issued from now on are greater than `seen`.
    ///
    /// Called after restoring nodes from a backing store.
    pub fn reserve_past(seen: NodeId) {
        NODE_ID_COUNTER.fetch_max(seen.0 + 1, Ordering::Relaxed);
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Node Kind
// =============================================================================

/// Kind of a node: one structural kind and six content kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    File,
    Application,
    Image,
    Video,
    Audio,
    Document,
}

impl NodeKind {
    pub fn is_folder(self) -> bool {
        matches!(self, Self::Folder)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::File => "file",
            Self::Application => "application",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
        }
    }

    /// Infer a content kind from an explicit mime type or, failing that,
    /// the name's extension.
    pub fn infer(name: &str, mime_type: Option<&str>) -> Self {
        if let Some(mime) = mime_type {
            return Self::from_mime(mime);
        }
        match extension(name).as_deref() {
            Some("png" | "jpg" | "jpeg" | "gif" | "bmp" | "svg" | "webp" | "ico") => Self::Image,
            Some("mp4" | "mov" | "avi" | "mkv" | "webm") => Self::Video,
            Some("mp3" | "wav" | "ogg" | "flac" | "m4a") => Self::Audio,
            Some(
                "pdf" | "doc" | "docx" | "odt" | "rtf" | "md" | "xls" | "xlsx" | "ppt" | "pptx"
                | "csv",
            ) => Self::Document,
            Some("app" | "exe" | "sh" | "bin") => Self::Application,
            _ => Self::File,
        }
    }

    fn from_mime(mime: &str) -> Self {
        let mime = mime.to_ascii_lowercase();
        if mime.starts_with("image/") {
            Self::Image
        } else if mime.starts_with("video/") {
            Self::Video
        } else if mime.starts_with("audio/") {
            Self::Audio
        } else if mime == "application/pdf"
            || mime.contains("document")
            || mime.contains("msword")
            || mime == "text/markdown"
        {
            Self::Document
        } else if mime == "application/x-executable" || mime == "application/x-sh" {
            Self::Application
        } else {
            Self::File
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guess a mime type from the name's extension.
pub fn mime_for_name(name: &str) -> Option<&'static str> {
    let mime = match extension(name)?.as_str() {
        "txt" | "log" => "text/plain",
        "md" => "text/markdown",
        "json" => "application/json",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "text/javascript",
        "rs" => "text/x-rust",
        "sh" => "application/x-sh",
        "csv" => "text/csv",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => return None,
    };
    Some(mime)
}

fn extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

// =============================================================================
// Node Record
// =============================================================================

/// Timestamps, size and display hints of a node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    /// Creation time, milliseconds since the Unix epoch.
    pub created_at: u64,
    /// Last modification time, milliseconds since the Unix epoch.
    pub modified_at: u64,
    /// Content length in bytes (0 for folders).
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl NodeMetadata {
    pub fn stamped(now: u64) -> Self {
        Self {
            created_at: now,
            modified_at: now,
            ..Default::default()
        }
    }
}

/// Payload of a node: folders own an ordered child list, everything else
/// owns text content. A node never carries both.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeBody {
    Children(Vec<NodeId>),
    Content(String),
}

/// One entry of the file system tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub id: NodeId,
    /// Single path segment; empty only for the root.
    pub name: String,
    pub kind: NodeKind,
    /// Canonical absolute path, `"/"` for the root.
    pub path: String,
    /// `None` only for the root.
    pub parent_id: Option<NodeId>,
    pub metadata: NodeMetadata,
    pub body: NodeBody,
}

impl FileNode {
    /// Create a folder record with a fresh id.
    pub fn folder(name: &str, path: String, parent_id: Option<NodeId>, now: u64) -> Self {
        Self {
            id: NodeId::generate(),
            name: name.to_string(),
            kind: NodeKind::Folder,
            path,
            parent_id,
            metadata: NodeMetadata::stamped(now),
            body: NodeBody::Children(Vec::new()),
        }
    }

    /// Create a content record with a fresh id.
    ///
    /// A `Folder` kind is coerced to `File`: content nodes are never folders.
    pub fn leaf(
        name: &str,
        kind: NodeKind,
        path: String,
        parent_id: NodeId,
        content: String,
        now: u64,
    ) -> Self {
        let kind = if kind.is_folder() { NodeKind::File } else { kind };
        let mut metadata = NodeMetadata::stamped(now);
        metadata.size = content.len() as u64;
        Self {
            id: NodeId::generate(),
            name: name.to_string(),
            kind,
            path,
            parent_id: Some(parent_id),
            metadata,
            body: NodeBody::Content(content),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }

    /// Child ids (folders only).
    pub fn children(&self) -> Option<&[NodeId]> {
        match &self.body {
            NodeBody::Children(children) => Some(children),
            NodeBody::Content(_) => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match &mut self.body {
            NodeBody::Children(children) => Some(children),
            NodeBody::Content(_) => None,
        }
    }

    /// Text content (non-folders only).
    pub fn content(&self) -> Option<&str> {
        match &self.body {
            NodeBody::Content(content) => Some(content),
            NodeBody::Children(_) => None,
        }
    }
}
