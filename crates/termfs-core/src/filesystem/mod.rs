//! Virtual file system engine.
//!
//! [`FileSystemEngine`] is the only writer of the node arena. It layers path
//! resolution, CRUD, rename/move/copy and search over a [`NodeStore`], keeps
//! the session's current directory, emits [`FsEvent`]s after every successful
//! mutation and mirrors changes into an optional [`Storage`].
//!
//! # Path Convention
//!
//! Every public method accepts absolute paths, paths relative to the current
//! directory, and `~`-prefixed paths. Errors carry the absolute path.

mod events;
pub mod path;
mod store;

pub use events::{FsEvent, Subscription, SubscriptionId};
pub use store::NodeStore;

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{FsError, InvariantViolation, StorageError};
use crate::models::{FileNode, Manifest, NodeBody, NodeId, NodeKind, mime_for_name};
use crate::storage::{NODE_PREFIX, Storage};

use events::EventBus;

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn node_key(id: NodeId) -> String {
    format!("{}{}", NODE_PREFIX, id)
}

pub struct FileSystemEngine {
    store: NodeStore,
    /// Canonical path of the current directory.
    current: String,
    /// Canonical path `~` expands to.
    home: String,
    events: EventBus,
    storage: Option<Box<dyn Storage>>,
}

impl std::fmt::Debug for FileSystemEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSystemEngine")
            .field("nodes", &self.store.len())
            .field("current", &self.current)
            .field("home", &self.home)
            .field("subscribers", &self.events.len())
            .field("persistent", &self.storage.is_some())
            .finish()
    }
}

impl FileSystemEngine {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Create a file system holding only the root folder.
    pub fn new(home: &str) -> Self {
        Self {
            store: NodeStore::new(now_millis()),
            current: path::ROOT.to_string(),
            home: path::normalize_path(home),
            events: EventBus::default(),
            storage: None,
        }
    }

    /// Build a file system from a manifest.
    ///
    /// Entries that conflict with earlier ones (e.g. a file where a folder is
    /// expected) are skipped with a warning. The current directory starts at
    /// `home` when it exists, at the root otherwise.
    pub fn from_manifest(manifest: &Manifest, home: &str) -> Self {
        let mut fs = Self::new(home);

        for dir in &manifest.directories {
            match fs.create_dir_all(&dir.path) {
                Ok(node) => {
                    let id = node.id;
                    if let Some(node) = fs.store.get_mut(id) {
                        node.metadata.icon = dir.icon.clone();
                        node.metadata.color = dir.color.clone();
                    }
                }
                Err(err) => {
                    tracing::warn!(path = %dir.path, %err, "manifest directory skipped");
                }
            }
        }

        for file in &manifest.files {
            let canonical = path::normalize_path(&file.path);
            let parent = path::parent_path(&canonical).to_string();
            let name = path::base_name(&canonical).to_string();
            let created = match fs.create_dir_all(&parent) {
                Ok(_) => fs
                    .create_file(&parent, &name, Some(&file.content), file.mime_type.as_deref())
                    .map(|_| ()),
                Err(err) => Err(err),
            };
            if let Err(err) = created {
                tracing::warn!(path = %file.path, %err, "manifest file skipped");
            }
        }

        if fs.is_directory(&fs.home.clone()) {
            fs.current = fs.home.clone();
        }
        fs
    }

    /// Restore a file system from a backing store.
    ///
    /// An empty store is seeded from `fallback`. Restored records must satisfy
    /// every structural invariant.
    pub fn load(
        storage: Box<dyn Storage>,
        fallback: &Manifest,
        home: &str,
    ) -> Result<Self, StorageError> {
        let keys = storage.list(NODE_PREFIX)?;
        if keys.is_empty() {
            let mut fs = Self::from_manifest(fallback, home);
            fs.attach_storage(storage)?;
            return Ok(fs);
        }

        let mut records = Vec::with_capacity(keys.len());
        for key in &keys {
            let Some(json) = storage.read(key)? else {
                return Err(StorageError::Corrupt(format!("{} vanished while loading", key)));
            };
            records.push(serde_json::from_str::<FileNode>(&json)?);
        }
        if let Some(max) = records.iter().map(|n| n.id).max() {
            NodeId::reserve_past(max);
        }

        let store = NodeStore::from_records(records).inspect_err(|err| {
            tracing::error!(%err, "persisted file system is corrupt");
        })?;
        tracing::info!(nodes = store.len(), "file system restored");

        let mut fs = Self {
            store,
            current: path::ROOT.to_string(),
            home: path::normalize_path(home),
            events: EventBus::default(),
            storage: Some(storage),
        };
        if fs.is_directory(&fs.home.clone()) {
            fs.current = fs.home.clone();
        }
        Ok(fs)
    }

    /// Attach a backing store and write every node to it.
    pub fn attach_storage(&mut self, mut storage: Box<dyn Storage>) -> Result<(), StorageError> {
        for node in self.store.iter() {
            storage.write(&node_key(node.id), &serde_json::to_string(node)?)?;
        }
        self.storage = Some(storage);
        Ok(())
    }

    /// The attached backing store, if any.
    pub fn storage(&self) -> Option<&dyn Storage> {
        self.storage.as_deref()
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn current_dir(&self) -> &str {
        &self.current
    }

    pub fn home_dir(&self) -> &str {
        &self.home
    }

    /// Canonical absolute form of `path` (no existence check).
    pub fn absolute(&self, path: &str) -> String {
        path::resolve_path_string(&self.current, &self.home, path)
    }

    /// Change the current directory. Returns the new canonical path.
    pub fn change_dir(&mut self, path: &str) -> Result<&str, FsError> {
        let target = self.absolute(path);
        let node = self
            .store
            .lookup(&target)
            .and_then(|id| self.store.get(id))
            .ok_or_else(|| FsError::NotFound(target.clone()))?;
        if !node.is_folder() {
            return Err(FsError::NotADirectory(target));
        }
        self.current = target;
        Ok(&self.current)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn root(&self) -> &FileNode {
        self.store.root()
    }

    pub fn get(&self, id: NodeId) -> Option<&FileNode> {
        self.store.get(id)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.len() <= 1
    }

    fn resolve_id(&self, path: &str) -> Option<NodeId> {
        self.store.lookup(&self.absolute(path))
    }

    fn node(&self, id: NodeId) -> &FileNode {
        self.store
            .get(id)
            .unwrap_or_else(|| unreachable!("node {} missing from arena", id))
    }

    /// Resolve a path to its node. The empty path is the current directory.
    pub fn resolve_path(&self, path: &str) -> Option<&FileNode> {
        self.resolve_id(path).and_then(|id| self.store.get(id))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.resolve_id(path).is_some()
    }

    pub fn is_directory(&self, path: &str) -> bool {
        self.resolve_path(path).is_some_and(FileNode::is_folder)
    }

    /// Children of a folder, in insertion order.
    pub fn list_directory(&self, path: &str) -> Result<Vec<&FileNode>, FsError> {
        let target = self.absolute(path);
        let node = self
            .store
            .lookup(&target)
            .map(|id| self.node(id))
            .ok_or_else(|| FsError::NotFound(target.clone()))?;
        let children = node.children().ok_or(FsError::NotADirectory(target))?;
        Ok(children.iter().map(|id| self.node(*id)).collect())
    }

    /// Text content of a non-folder node.
    pub fn read_file(&self, path: &str) -> Result<&str, FsError> {
        let target = self.absolute(path);
        let node = self
            .store
            .lookup(&target)
            .map(|id| self.node(id))
            .ok_or_else(|| FsError::NotFound(target.clone()))?;
        node.content().ok_or(FsError::IsADirectory(target))
    }

    /// Nodes of the subtree at `path`, depth-first pre-order, starting with
    /// the node itself.
    pub fn walk(&self, path: &str) -> Result<Vec<&FileNode>, FsError> {
        let target = self.absolute(path);
        let id = self.store.lookup(&target).ok_or(FsError::NotFound(target))?;
        Ok(self
            .store
            .subtree(id)
            .into_iter()
            .map(|id| self.node(id))
            .collect())
    }

    /// Case-insensitive substring match over names in the subtree at `from`.
    ///
    /// Matches come back in depth-first traversal order.
    pub fn search(&self, query: &str, from: &str) -> Result<Vec<&FileNode>, FsError> {
        let needle = query.to_lowercase();
        Ok(self
            .walk(from)?
            .into_iter()
            .filter(|node| !node.is_root() && node.name.to_lowercase().contains(&needle))
            .collect())
    }

    /// Total content size of the subtree at `path`, in bytes.
    pub fn get_size(&self, path: &str) -> Result<u64, FsError> {
        Ok(self
            .walk(path)?
            .iter()
            .map(|node| node.metadata.size)
            .sum())
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.store.check_invariants()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Resolve a folder that will receive a new child called `name`.
    fn prepare_child(&self, parent: &str, name: &str) -> Result<(NodeId, String), FsError> {
        let parent_path = self.absolute(parent);
        let parent_node = self
            .store
            .lookup(&parent_path)
            .map(|id| self.node(id))
            .ok_or_else(|| FsError::ParentNotFound(parent_path.clone()))?;
        if !parent_node.is_folder() {
            return Err(FsError::ParentNotDirectory(parent_path));
        }
        if !path::is_valid_name(name) {
            return Err(FsError::InvalidName(name.to_string()));
        }
        let child_path = path::join(&parent_path, name);
        if self.store.child_named(parent_node.id, name).is_some() {
            return Err(FsError::NameExists(child_path));
        }
        Ok((parent_node.id, child_path))
    }

    fn attach(&mut self, parent: NodeId, node: FileNode, now: u64) -> NodeId {
        let id = node.id;
        self.store.insert(node);
        if let Some(parent) = self.store.get_mut(parent) {
            if let Some(children) = parent.children_mut() {
                children.push(id);
            }
            parent.metadata.modified_at = now;
        }
        id
    }

    /// Create a content node. Kind and mime type are inferred from the
    /// name's extension unless `mime_type` is given.
    pub fn create_file(
        &mut self,
        parent: &str,
        name: &str,
        content: Option<&str>,
        mime_type: Option<&str>,
    ) -> Result<&FileNode, FsError> {
        let (parent_id, child_path) = self.prepare_child(parent, name)?;
        let now = now_millis();
        let kind = NodeKind::infer(name, mime_type);
        let mut node = FileNode::leaf(
            name,
            kind,
            child_path.clone(),
            parent_id,
            content.unwrap_or_default().to_string(),
            now,
        );
        node.metadata.mime_type = mime_type
            .map(str::to_string)
            .or_else(|| mime_for_name(name).map(str::to_string));

        let id = self.attach(parent_id, node, now);
        self.commit(&[id, parent_id], &[]);
        self.events.emit(FsEvent::Created {
            path: child_path,
            kind,
        });
        Ok(self.node(id))
    }

    /// Create an empty folder.
    pub fn create_folder(
        &mut self,
        parent: &str,
        name: &str,
        icon: Option<&str>,
        color: Option<&str>,
    ) -> Result<&FileNode, FsError> {
        let (parent_id, child_path) = self.prepare_child(parent, name)?;
        let now = now_millis();
        let mut node = FileNode::folder(name, child_path.clone(), Some(parent_id), now);
        node.metadata.icon = icon.map(str::to_string);
        node.metadata.color = color.map(str::to_string);

        let id = self.attach(parent_id, node, now);
        self.commit(&[id, parent_id], &[]);
        self.events.emit(FsEvent::Created {
            path: child_path,
            kind: NodeKind::Folder,
        });
        Ok(self.node(id))
    }

    /// Create a folder and any missing ancestors. Existing folders are fine.
    pub fn create_dir_all(&mut self, path: &str) -> Result<&FileNode, FsError> {
        let target = self.absolute(path);
        let mut current = self.store.root_id();
        for segment in path::segments(&target).map(str::to_string).collect::<Vec<_>>() {
            current = match self.store.child_named(current, &segment) {
                Some(id) if self.node(id).is_folder() => id,
                Some(id) => return Err(FsError::NotADirectory(self.node(id).path.clone())),
                None => {
                    let parent_path = self.node(current).path.clone();
                    self.create_folder(&parent_path, &segment, None, None)?.id
                }
            };
        }
        Ok(self.node(current))
    }

    /// Replace the content of a non-folder node.
    pub fn write_file(&mut self, path: &str, content: &str) -> Result<(), FsError> {
        let target = self.absolute(path);
        let id = self
            .store
            .lookup(&target)
            .ok_or_else(|| FsError::NotFound(target.clone()))?;
        let now = now_millis();
        let node = self
            .store
            .get_mut(id)
            .ok_or_else(|| FsError::NotFound(target.clone()))?;
        let NodeBody::Content(body) = &mut node.body else {
            return Err(FsError::IsADirectory(target));
        };
        *body = content.to_string();
        node.metadata.size = content.len() as u64;
        node.metadata.modified_at = now;

        self.commit(&[id], &[]);
        self.events.emit(FsEvent::Written {
            path: target,
            size: content.len() as u64,
        });
        Ok(())
    }

    /// Refresh the modification time of an existing node.
    pub fn touch(&mut self, path: &str) -> Result<(), FsError> {
        let target = self.absolute(path);
        let id = self
            .store
            .lookup(&target)
            .ok_or_else(|| FsError::NotFound(target.clone()))?;
        if let Some(node) = self.store.get_mut(id) {
            node.metadata.modified_at = now_millis();
        }
        self.commit(&[id], &[]);
        self.events.emit(FsEvent::Touched { path: target });
        Ok(())
    }

    /// Rename a node in place; paths of all descendants follow.
    pub fn rename(&mut self, path: &str, new_name: &str) -> Result<&FileNode, FsError> {
        let target = self.absolute(path);
        let id = self
            .store
            .lookup(&target)
            .ok_or_else(|| FsError::NotFound(target.clone()))?;
        let node = self.node(id);
        let Some(parent_id) = node.parent_id else {
            return Err(FsError::InvalidName(new_name.to_string()));
        };
        if node.name == new_name {
            return Ok(self.node(id));
        }
        if !path::is_valid_name(new_name) {
            return Err(FsError::InvalidName(new_name.to_string()));
        }
        if self.store.child_named(parent_id, new_name).is_some() {
            return Err(FsError::NameExists(path::join(path::parent_path(&target), new_name)));
        }

        let now = now_millis();
        if let Some(node) = self.store.get_mut(id) {
            node.name = new_name.to_string();
            node.metadata.modified_at = now;
        }
        let mut changed = self.store.recompute_paths(id);
        changed.push(parent_id);
        let new_path = self.node(id).path.clone();
        self.follow_current(&target, &new_path);

        self.commit(&changed, &[]);
        self.events.emit(FsEvent::Renamed {
            old_path: target,
            new_path,
        });
        Ok(self.node(id))
    }

    /// Move a node into the folder at `destination`, optionally renaming it.
    pub fn move_node(
        &mut self,
        source: &str,
        destination: &str,
        new_name: Option<&str>,
    ) -> Result<&FileNode, FsError> {
        let source_path = self.absolute(source);
        let dest_path = self.absolute(destination);
        let id = self
            .store
            .lookup(&source_path)
            .ok_or_else(|| FsError::SourceNotFound(source_path.clone()))?;
        let dest_id = self.resolve_destination(&dest_path)?;
        if path::is_within(&dest_path, &source_path) {
            return Err(FsError::CannotMoveIntoSelf {
                from: source_path,
                to: dest_path,
            });
        }

        let node = self.node(id);
        let name = new_name.unwrap_or(node.name.as_str()).to_string();
        if !path::is_valid_name(&name) {
            return Err(FsError::InvalidName(name));
        }
        let Some(old_parent) = node.parent_id else {
            return Err(FsError::CannotMoveIntoSelf {
                from: source_path,
                to: dest_path,
            });
        };
        match self.store.child_named(dest_id, &name) {
            Some(existing) if existing == id => return Ok(self.node(id)),
            Some(_) => return Err(FsError::NameExists(path::join(&dest_path, &name))),
            None => {}
        }

        let now = now_millis();
        if let Some(children) = self.store.get_mut(old_parent).and_then(|p| p.children_mut()) {
            children.retain(|child| *child != id);
        }
        if let Some(node) = self.store.get_mut(id) {
            node.parent_id = Some(dest_id);
            node.name = name;
            node.metadata.modified_at = now;
        }
        for parent in [old_parent, dest_id] {
            if let Some(parent) = self.store.get_mut(parent) {
                parent.metadata.modified_at = now;
            }
        }
        if let Some(children) = self.store.get_mut(dest_id).and_then(|p| p.children_mut()) {
            children.push(id);
        }

        let mut changed = self.store.recompute_paths(id);
        changed.extend([old_parent, dest_id]);
        let new_path = self.node(id).path.clone();
        self.follow_current(&source_path, &new_path);

        self.commit(&changed, &[]);
        self.events.emit(FsEvent::Moved {
            old_path: source_path,
            new_path,
        });
        Ok(self.node(id))
    }

    /// Deep-copy a subtree into the folder at `destination`.
    ///
    /// Every node of the copy gets a fresh id and fresh timestamps; the source
    /// is left untouched.
    pub fn copy(
        &mut self,
        source: &str,
        destination: &str,
        new_name: Option<&str>,
    ) -> Result<&FileNode, FsError> {
        let source_path = self.absolute(source);
        let dest_path = self.absolute(destination);
        let source_id = self
            .store
            .lookup(&source_path)
            .ok_or_else(|| FsError::SourceNotFound(source_path.clone()))?;
        let dest_id = self.resolve_destination(&dest_path)?;
        if self.node(source_id).is_folder() && path::is_within(&dest_path, &source_path) {
            return Err(FsError::CannotMoveIntoSelf {
                from: source_path,
                to: dest_path,
            });
        }

        let name = new_name
            .unwrap_or(self.node(source_id).name.as_str())
            .to_string();
        if !path::is_valid_name(&name) {
            return Err(FsError::InvalidName(name));
        }
        if self.store.child_named(dest_id, &name).is_some() {
            return Err(FsError::NameExists(path::join(&dest_path, &name)));
        }

        let now = now_millis();
        let mut created = Vec::new();
        let copy_id = self.clone_subtree(source_id, dest_id, &name, now, &mut created);
        if let Some(parent) = self.store.get_mut(dest_id) {
            if let Some(children) = parent.children_mut() {
                children.push(copy_id);
            }
            parent.metadata.modified_at = now;
        }
        created.push(dest_id);

        let path = self.node(copy_id).path.clone();
        self.commit(&created, &[]);
        self.events.emit(FsEvent::Copied {
            source: source_path,
            path,
        });
        Ok(self.node(copy_id))
    }

    /// Clone `source` (and descendants) under `parent`. The parent's child
    /// list is not updated for the top node.
    fn clone_subtree(
        &mut self,
        source: NodeId,
        parent: NodeId,
        name: &str,
        now: u64,
        created: &mut Vec<NodeId>,
    ) -> NodeId {
        let original = self.node(source).clone();
        let new_path = path::join(&self.node(parent).path, name);
        let mut metadata = original.metadata.clone();
        metadata.created_at = now;
        metadata.modified_at = now;

        let id = NodeId::generate();
        let body = match &original.body {
            NodeBody::Content(content) => NodeBody::Content(content.clone()),
            NodeBody::Children(_) => NodeBody::Children(Vec::new()),
        };
        self.store.insert(FileNode {
            id,
            name: name.to_string(),
            kind: original.kind,
            path: new_path,
            parent_id: Some(parent),
            metadata,
            body,
        });
        created.push(id);

        if let NodeBody::Children(children) = original.body {
            for child in children {
                let child_name = self.node(child).name.clone();
                let child_copy = self.clone_subtree(child, id, &child_name, now, created);
                if let Some(list) = self.store.get_mut(id).and_then(|n| n.children_mut()) {
                    list.push(child_copy);
                }
            }
        }
        id
    }

    /// Remove a node and its whole subtree.
    pub fn delete(&mut self, path: &str) -> Result<(), FsError> {
        let target = self.absolute(path);
        let id = self
            .store
            .lookup(&target)
            .ok_or_else(|| FsError::NotFound(target.clone()))?;
        let Some(parent_id) = self.node(id).parent_id else {
            return Err(FsError::CannotDeleteRoot);
        };

        if let Some(parent) = self.store.get_mut(parent_id) {
            if let Some(children) = parent.children_mut() {
                children.retain(|child| *child != id);
            }
            parent.metadata.modified_at = now_millis();
        }
        let removed = self.store.subtree(id);
        for node_id in &removed {
            self.store.remove(*node_id);
        }
        if path::is_within(&self.current, &target) {
            self.current = path::parent_path(&target).to_string();
        }

        self.commit(&[parent_id], &removed);
        self.events.emit(FsEvent::Deleted { path: target });
        Ok(())
    }

    /// Remove an empty folder.
    pub fn remove_dir(&mut self, path: &str) -> Result<(), FsError> {
        let target = self.absolute(path);
        let node = self
            .store
            .lookup(&target)
            .map(|id| self.node(id))
            .ok_or_else(|| FsError::NotFound(target.clone()))?;
        let Some(children) = node.children() else {
            return Err(FsError::NotADirectory(target));
        };
        if node.is_root() {
            return Err(FsError::CannotDeleteRoot);
        }
        if !children.is_empty() {
            return Err(FsError::DirectoryNotEmpty(target));
        }
        self.delete(&target)
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Receive an event for every successful mutation from now on.
    pub fn subscribe(&mut self) -> Subscription {
        self.events.subscribe()
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn resolve_destination(&self, dest_path: &str) -> Result<NodeId, FsError> {
        let dest_id = self
            .store
            .lookup(dest_path)
            .ok_or_else(|| FsError::DestinationNotFound(dest_path.to_string()))?;
        if !self.node(dest_id).is_folder() {
            return Err(FsError::DestinationNotDirectory(dest_path.to_string()));
        }
        Ok(dest_id)
    }

    /// Keep the current directory valid after `old` was relocated to `new`.
    fn follow_current(&mut self, old: &str, new: &str) {
        if path::is_within(&self.current, old) {
            self.current = format!("{}{}", new, &self.current[old.len()..]);
        }
    }

    /// Mirror changed and removed records into the backing store.
    ///
    /// Best effort: a failed write is logged and the in-memory state stands.
    fn commit(&mut self, changed: &[NodeId], removed: &[NodeId]) {
        let Some(storage) = self.storage.as_mut() else {
            return;
        };
        for id in changed {
            let Some(node) = self.store.get(*id) else {
                continue;
            };
            let result = serde_json::to_string(node)
                .map_err(StorageError::from)
                .and_then(|json| storage.write(&node_key(*id), &json));
            if let Err(err) = result {
                tracing::warn!(id = %id, %err, "failed to persist node");
            }
        }
        for id in removed {
            if let Err(err) = storage.delete(&node_key(*id)) {
                tracing::warn!(id = %id, %err, "failed to delete persisted node");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn create_test_fs() -> FileSystemEngine {
        let mut fs = FileSystemEngine::new("/home/user");
        fs.create_dir_all("/home/user").unwrap();
        fs.create_folder("/", "a", None, None).unwrap();
        fs.create_folder("/a", "b", None, None).unwrap();
        fs.create_file("/a/b", "c.txt", Some("hello"), None).unwrap();
        fs
    }

    #[test]
    fn test_new_fs_is_root_only() {
        let fs = FileSystemEngine::new("/home/user");
        assert_eq!(fs.len(), 1);
        assert!(fs.is_empty());
        assert_eq!(fs.current_dir(), "/");
        assert!(fs.root().is_root());
    }

    #[test]
    fn test_resolve_path() {
        let mut fs = create_test_fs();
        assert_eq!(fs.resolve_path("/a/b/c.txt").unwrap().name, "c.txt");
        assert!(fs.resolve_path("/a/missing").is_none());

        fs.change_dir("/a/b").unwrap();
        assert_eq!(fs.resolve_path("").unwrap().path, "/a/b");
        assert_eq!(fs.resolve_path("..").unwrap().path, "/a");
        assert_eq!(fs.resolve_path("c.txt").unwrap().path, "/a/b/c.txt");
        assert_eq!(fs.resolve_path("~").unwrap().path, "/home/user");
    }

    #[test]
    fn test_list_directory() {
        let fs = create_test_fs();
        let names: Vec<_> = fs
            .list_directory("/")
            .unwrap()
            .iter()
            .map(|n| n.name.clone())
            .collect();
        assert_eq!(names, vec!["home", "a"]);
        assert_eq!(
            fs.list_directory("/a/b/c.txt").unwrap_err(),
            FsError::NotADirectory("/a/b/c.txt".into())
        );
        assert_eq!(
            fs.list_directory("/nope").unwrap_err(),
            FsError::NotFound("/nope".into())
        );
    }

    #[test]
    fn test_create_errors() {
        let mut fs = create_test_fs();
        assert_eq!(
            fs.create_file("/missing", "x", None, None).unwrap_err(),
            FsError::ParentNotFound("/missing".into())
        );
        assert_eq!(
            fs.create_file("/a/b/c.txt", "x", None, None).unwrap_err(),
            FsError::ParentNotDirectory("/a/b/c.txt".into())
        );
        assert_eq!(
            fs.create_folder("/a", "b", None, None).unwrap_err(),
            FsError::NameExists("/a/b".into())
        );
        assert_eq!(
            fs.create_file("/a", "x/y", None, None).unwrap_err(),
            FsError::InvalidName("x/y".into())
        );
    }

    #[test]
    fn test_create_file_infers_kind() {
        let mut fs = create_test_fs();
        let node = fs.create_file("/a", "pic.png", None, None).unwrap();
        assert_eq!(node.kind, NodeKind::Image);
        assert_eq!(node.metadata.mime_type.as_deref(), Some("image/png"));
        assert_eq!(node.content(), Some(""));
    }

    #[test]
    fn test_read_write() {
        let mut fs = create_test_fs();
        assert_eq!(fs.read_file("/a/b/c.txt").unwrap(), "hello");
        fs.write_file("/a/b/c.txt", "bye!").unwrap();
        assert_eq!(fs.read_file("/a/b/c.txt").unwrap(), "bye!");
        assert_eq!(fs.resolve_path("/a/b/c.txt").unwrap().metadata.size, 4);
        assert_eq!(
            fs.read_file("/a").unwrap_err(),
            FsError::IsADirectory("/a".into())
        );
        assert_eq!(
            fs.write_file("/a", "x").unwrap_err(),
            FsError::IsADirectory("/a".into())
        );
        assert_eq!(
            fs.write_file("/zzz", "x").unwrap_err(),
            FsError::NotFound("/zzz".into())
        );
    }

    #[test]
    fn test_rename_cascades() {
        let mut fs = create_test_fs();
        fs.rename("/a", "z").unwrap();
        assert!(fs.resolve_path("/z/b/c.txt").is_some());
        assert!(fs.resolve_path("/a/b/c.txt").is_none());
        assert_eq!(fs.resolve_path("/z/b/c.txt").unwrap().path, "/z/b/c.txt");
        assert!(fs.check_invariants().is_ok());
    }

    #[test]
    fn test_rename_collision() {
        let mut fs = create_test_fs();
        fs.create_folder("/", "z", None, None).unwrap();
        assert_eq!(
            fs.rename("/a", "z").unwrap_err(),
            FsError::NameExists("/z".into())
        );
    }

    #[test]
    fn test_move_into_self_rejected() {
        let mut fs = create_test_fs();
        let before = fs.len();
        assert!(matches!(
            fs.move_node("/a", "/a/b", None),
            Err(FsError::CannotMoveIntoSelf { .. })
        ));
        assert!(matches!(
            fs.move_node("/a", "/a", None),
            Err(FsError::CannotMoveIntoSelf { .. })
        ));
        assert_eq!(fs.len(), before);
        assert!(fs.resolve_path("/a/b/c.txt").is_some());
        assert!(fs.check_invariants().is_ok());
    }

    #[test]
    fn test_move_reparents() {
        let mut fs = create_test_fs();
        fs.create_folder("/", "dest", None, None).unwrap();
        fs.move_node("/a/b", "/dest", None).unwrap();
        assert!(fs.resolve_path("/dest/b/c.txt").is_some());
        assert!(fs.list_directory("/a").unwrap().is_empty());
        assert!(fs.check_invariants().is_ok());
    }

    #[test]
    fn test_move_errors() {
        let mut fs = create_test_fs();
        assert_eq!(
            fs.move_node("/nope", "/a", None).unwrap_err(),
            FsError::SourceNotFound("/nope".into())
        );
        assert_eq!(
            fs.move_node("/a/b", "/nope", None).unwrap_err(),
            FsError::DestinationNotFound("/nope".into())
        );
        assert_eq!(
            fs.move_node("/a/b", "/a/b/c.txt", None).unwrap_err(),
            FsError::DestinationNotDirectory("/a/b/c.txt".into())
        );
    }

    #[test]
    fn test_move_with_rename_and_same_parent() {
        let mut fs = create_test_fs();
        fs.move_node("/a/b/c.txt", "/a", Some("d.txt")).unwrap();
        assert_eq!(fs.read_file("/a/d.txt").unwrap(), "hello");
        // Moving to where it already is changes nothing.
        fs.move_node("/a/d.txt", "/a", None).unwrap();
        assert!(fs.check_invariants().is_ok());
    }

    #[test]
    fn test_move_follows_current_dir() {
        let mut fs = create_test_fs();
        fs.change_dir("/a/b").unwrap();
        fs.rename("/a", "z").unwrap();
        assert_eq!(fs.current_dir(), "/z/b");
    }

    #[test]
    fn test_copy_is_independent() {
        let mut fs = create_test_fs();
        let original_ids: Vec<NodeId> = fs.walk("/a").unwrap().iter().map(|n| n.id).collect();
        fs.copy("/a", "/", Some("copy")).unwrap();
        let copy_ids: Vec<NodeId> = fs.walk("/copy").unwrap().iter().map(|n| n.id).collect();
        assert_eq!(copy_ids.len(), original_ids.len());
        assert!(copy_ids.iter().all(|id| !original_ids.contains(id)));

        fs.write_file("/copy/b/c.txt", "changed").unwrap();
        assert_eq!(fs.read_file("/a/b/c.txt").unwrap(), "hello");
        assert!(fs.check_invariants().is_ok());
    }

    #[test]
    fn test_copy_into_itself_rejected() {
        let mut fs = create_test_fs();
        assert!(matches!(
            fs.copy("/a", "/a/b", None),
            Err(FsError::CannotMoveIntoSelf { .. })
        ));
        assert_eq!(
            fs.copy("/a/b", "/a", None).unwrap_err(),
            FsError::NameExists("/a/b".into())
        );
    }

    #[test]
    fn test_delete_recursive() {
        let mut fs = create_test_fs();
        let before = fs.len();
        fs.delete("/a").unwrap();
        assert_eq!(fs.len(), before - 3);
        assert!(fs.resolve_path("/a").is_none());
        assert_eq!(fs.delete("/").unwrap_err(), FsError::CannotDeleteRoot);
        assert!(fs.check_invariants().is_ok());
    }

    #[test]
    fn test_delete_moves_current_dir_up() {
        let mut fs = create_test_fs();
        fs.change_dir("/a/b").unwrap();
        fs.delete("/a").unwrap();
        assert_eq!(fs.current_dir(), "/");
    }

    #[test]
    fn test_remove_dir() {
        let mut fs = create_test_fs();
        assert_eq!(
            fs.remove_dir("/a").unwrap_err(),
            FsError::DirectoryNotEmpty("/a".into())
        );
        assert_eq!(
            fs.remove_dir("/a/b/c.txt").unwrap_err(),
            FsError::NotADirectory("/a/b/c.txt".into())
        );
        fs.delete("/a/b/c.txt").unwrap();
        fs.remove_dir("/a/b").unwrap();
        assert!(!fs.exists("/a/b"));
    }

    #[test]
    fn test_search() {
        let mut fs = create_test_fs();
        fs.create_file("/a", "C-notes.md", None, None).unwrap();
        let found: Vec<_> = fs
            .search("c", "/a")
            .unwrap()
            .iter()
            .map(|n| n.path.clone())
            .collect();
        assert_eq!(found, vec!["/a/b/c.txt", "/a/C-notes.md"]);
        assert!(fs.search("x", "/missing").is_err());
    }

    #[test]
    fn test_create_dir_all() {
        let mut fs = create_test_fs();
        fs.create_dir_all("/x/y/z").unwrap();
        assert!(fs.is_directory("/x/y/z"));
        // Existing folders are accepted.
        fs.create_dir_all("/x/y").unwrap();
        assert_eq!(
            fs.create_dir_all("/a/b/c.txt/d").unwrap_err(),
            FsError::NotADirectory("/a/b/c.txt".into())
        );
    }

    #[test]
    fn test_get_size() {
        let mut fs = create_test_fs();
        fs.create_file("/a", "d.txt", Some("12345"), None).unwrap();
        assert_eq!(fs.get_size("/a").unwrap(), 10);
    }

    #[test]
    fn test_events_on_mutation_only() {
        let mut fs = create_test_fs();
        let sub = fs.subscribe();
        fs.read_file("/a/b/c.txt").unwrap();
        fs.list_directory("/a").unwrap();
        assert!(sub.receiver.try_recv().is_err());

        fs.write_file("/a/b/c.txt", "x").unwrap();
        assert_eq!(
            sub.receiver.try_recv().unwrap(),
            FsEvent::Written {
                path: "/a/b/c.txt".into(),
                size: 1
            }
        );

        // Failed mutations are silent.
        assert!(fs.delete("/").is_err());
        assert!(sub.receiver.try_recv().is_err());
    }

    type Mutation = fn(&mut FileSystemEngine) -> Result<(), FsError>;

    #[test]
    fn test_each_mutation_emits_one_event() {
        let cases: [(Mutation, FsEvent); 9] = [
            (
                |fs| fs.create_folder("/", "d", None, None).map(|_| ()),
                FsEvent::Created {
                    path: "/d".into(),
                    kind: NodeKind::Folder,
                },
            ),
            (
                |fs| fs.create_file("/a", "n.txt", Some("hi"), None).map(|_| ()),
                FsEvent::Created {
                    path: "/a/n.txt".into(),
                    kind: NodeKind::infer("n.txt", None),
                },
            ),
            (
                |fs| fs.write_file("/a/b/c.txt", "xy"),
                FsEvent::Written {
                    path: "/a/b/c.txt".into(),
                    size: 2,
                },
            ),
            (
                |fs| fs.touch("/a/b/c.txt"),
                FsEvent::Touched {
                    path: "/a/b/c.txt".into(),
                },
            ),
            (
                |fs| fs.rename("/a/b", "z").map(|_| ()),
                FsEvent::Renamed {
                    old_path: "/a/b".into(),
                    new_path: "/a/z".into(),
                },
            ),
            (
                |fs| fs.move_node("/a/b/c.txt", "/", None).map(|_| ()),
                FsEvent::Moved {
                    old_path: "/a/b/c.txt".into(),
                    new_path: "/c.txt".into(),
                },
            ),
            (
                |fs| fs.copy("/a", "/home/user", None).map(|_| ()),
                FsEvent::Copied {
                    source: "/a".into(),
                    path: "/home/user/a".into(),
                },
            ),
            (
                |fs| fs.delete("/a"),
                FsEvent::Deleted { path: "/a".into() },
            ),
            (
                |fs| fs.remove_dir("/home/user"),
                FsEvent::Deleted {
                    path: "/home/user".into(),
                },
            ),
        ];

        for (mutate, expected) in cases {
            let mut fs = create_test_fs();
            let sub = fs.subscribe();
            mutate(&mut fs).unwrap();
            assert_eq!(sub.receiver.try_recv().unwrap(), expected);
            assert!(sub.receiver.try_recv().is_err(), "extra event after {:?}", expected);
        }
    }

    #[test]
    fn test_failed_mutations_emit_nothing() {
        let failures: [Mutation; 9] = [
            |fs| fs.move_node("/a", "/a/b", None).map(|_| ()),
            |fs| fs.copy("/a", "/a/b", None).map(|_| ()),
            |fs| fs.rename("/a", "home").map(|_| ()),
            |fs| fs.create_folder("/a", "b", None, None).map(|_| ()),
            |fs| fs.create_file("/missing", "f", None, None).map(|_| ()),
            |fs| fs.write_file("/a", "x"),
            |fs| fs.touch("/nope"),
            |fs| fs.delete("/nope"),
            |fs| fs.remove_dir("/a"),
        ];

        for mutate in failures {
            let mut fs = create_test_fs();
            let sub = fs.subscribe();
            assert!(mutate(&mut fs).is_err());
            assert!(sub.receiver.try_recv().is_err());
        }
    }

    #[test]
    fn test_persistence_round_trip() {
        let manifest = Manifest::default_layout("user", "host");
        let mut fs =
            FileSystemEngine::load(Box::new(MemoryStorage::new()), &manifest, "/home/user")
                .unwrap();
        fs.create_file("~", "saved.txt", Some("kept"), None).unwrap();
        fs.delete("/tmp").unwrap();

        let storage = fs.storage().unwrap();
        let mut copy = MemoryStorage::new();
        for key in storage.list("").unwrap() {
            let value = storage.read(&key).unwrap().unwrap();
            copy.write(&key, &value).unwrap();
        }

        let restored =
            FileSystemEngine::load(Box::new(copy), &Manifest::default(), "/home/user").unwrap();
        assert_eq!(restored.read_file("/home/user/saved.txt").unwrap(), "kept");
        assert!(!restored.exists("/tmp"));
        assert_eq!(restored.len(), fs.len());
        assert_eq!(restored.current_dir(), "/home/user");
    }

    struct FailingStorage;

    impl Storage for FailingStorage {
        fn list(&self, _prefix: &str) -> Result<Vec<String>, StorageError> {
            Ok(Vec::new())
        }
        fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }
        fn write(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Corrupt("disk full".into()))
        }
        fn delete(&mut self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Corrupt("disk full".into()))
        }
        fn exists(&self, _key: &str) -> Result<bool, StorageError> {
            Ok(false)
        }
    }

    #[test]
    fn test_persistence_failure_keeps_memory_state() {
        let mut fs = create_test_fs();
        fs.storage = Some(Box::new(FailingStorage));
        fs.create_file("/a", "new.txt", Some("x"), None).unwrap();
        assert_eq!(fs.read_file("/a/new.txt").unwrap(), "x");
    }

    #[test]
    fn test_load_rejects_corrupt_records() {
        let mut storage = MemoryStorage::new();
        let root = FileNode::folder("", "/".into(), None, 0);
        let mut child = FileNode::folder("a", "/wrong".into(), Some(root.id), 0);
        child.body = NodeBody::Children(Vec::new());
        let mut root = root;
        root.body = NodeBody::Children(vec![child.id]);
        storage
            .write(&node_key(root.id), &serde_json::to_string(&root).unwrap())
            .unwrap();
        storage
            .write(&node_key(child.id), &serde_json::to_string(&child).unwrap())
            .unwrap();
        assert!(matches!(
            FileSystemEngine::load(Box::new(storage), &Manifest::default(), "/"),
            Err(StorageError::Corrupt(_))
        ));
    }
}
