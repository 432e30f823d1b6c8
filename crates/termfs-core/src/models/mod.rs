//! Data models for the file system.
//!
//! - [`FileNode`], [`NodeId`], [`NodeKind`], [`NodeMetadata`] - node records
//! - [`Manifest`] - initial tree layout

mod manifest;
mod node;

pub use manifest::{DirectoryEntry, FileEntry, Manifest};
pub use node::{FileNode, NodeBody, NodeId, NodeKind, NodeMetadata, mime_for_name};
