//! Arena of node records keyed by [`NodeId`].
//!
//! Parent and child links are ids, never references, so structural edits are
//! plain map updates. A path index maps every canonical path to its id and is
//! kept in step by `insert`, `remove` and `recompute_paths`. Only the file
//! system engine holds a mutable store.

use std::collections::HashMap;

use crate::error::InvariantViolation;
use crate::models::{FileNode, NodeId};

use super::path;

#[derive(Clone, Debug)]
pub struct NodeStore {
    nodes: HashMap<NodeId, FileNode>,
    /// Canonical path -> id.
    paths: HashMap<String, NodeId>,
    root: NodeId,
}

impl NodeStore {
    /// Create a store holding only the root folder.
    pub fn new(now: u64) -> Self {
        let root = FileNode::folder("", path::ROOT.to_string(), None, now);
        let root_id = root.id;
        let mut store = Self {
            nodes: HashMap::new(),
            paths: HashMap::new(),
            root: root_id,
        };
        store.insert(root);
        store
    }

    /// Rebuild a store from persisted records and validate it.
    pub fn from_records(records: Vec<FileNode>) -> Result<Self, InvariantViolation> {
        let roots: Vec<NodeId> = records
            .iter()
            .filter(|n| n.parent_id.is_none())
            .map(|n| n.id)
            .collect();
        let [root] = roots.as_slice() else {
            return Err(InvariantViolation::new(
                1,
                format!("expected exactly one root, found {}", roots.len()),
            ));
        };
        let root = *root;
        let paths = records.iter().map(|n| (n.path.clone(), n.id)).collect();
        let nodes = records.into_iter().map(|n| (n.id, n)).collect();
        let store = Self { nodes, paths, root };
        store.check_invariants()?;
        Ok(store)
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn root(&self) -> &FileNode {
        &self.nodes[&self.root]
    }

    pub fn get(&self, id: NodeId) -> Option<&FileNode> {
        self.nodes.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut FileNode> {
        self.nodes.get_mut(&id)
    }

    pub(crate) fn insert(&mut self, node: FileNode) {
        self.paths.insert(node.path.clone(), node.id);
        self.nodes.insert(node.id, node);
    }

    pub(crate) fn remove(&mut self, id: NodeId) -> Option<FileNode> {
        let node = self.nodes.remove(&id)?;
        self.unindex(&node.path, id);
        Some(node)
    }

    fn unindex(&mut self, path: &str, id: NodeId) {
        if self.paths.get(path) == Some(&id) {
            self.paths.remove(path);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileNode> {
        self.nodes.values()
    }

    /// Find the child of `parent` named `name`.
    pub fn child_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.get(parent)?
            .children()?
            .iter()
            .copied()
            .find(|id| self.get(*id).is_some_and(|n| n.name == name))
    }

    /// Id of the node at a canonical path.
    pub fn lookup(&self, canonical: &str) -> Option<NodeId> {
        self.paths.get(canonical).copied()
    }

    /// Ids of `id` and all its descendants, depth-first pre-order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(node) = self.get(next) else {
                continue;
            };
            out.push(next);
            if let Some(children) = node.children() {
                stack.extend(children.iter().rev().copied());
            }
        }
        out
    }

    /// Recompute `path` for `id` and every descendant from the parent chain.
    ///
    /// Returns the ids whose path was rewritten.
    pub(crate) fn recompute_paths(&mut self, id: NodeId) -> Vec<NodeId> {
        let ids = self.subtree(id);
        // Drop every stale entry first so old and new paths never clash.
        for &node_id in &ids {
            if let Some(old) = self.get(node_id).map(|n| n.path.clone()) {
                self.unindex(&old, node_id);
            }
        }
        for &node_id in &ids {
            let Some(node) = self.get(node_id) else {
                continue;
            };
            let new_path = match node.parent_id.and_then(|p| self.get(p)) {
                Some(parent) => path::join(&parent.path, &node.name),
                None => path::ROOT.to_string(),
            };
            self.paths.insert(new_path.clone(), node_id);
            if let Some(node) = self.get_mut(node_id) {
                node.path = new_path;
            }
        }
        ids
    }

    /// Verify structural invariants 1-6 over the whole arena.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let root = self
            .get(self.root)
            .ok_or_else(|| InvariantViolation::new(1, "root id does not resolve"))?;
        if root.parent_id.is_some() || root.path != path::ROOT || !root.is_folder() {
            return Err(InvariantViolation::new(1, "root must be a parentless folder at '/'"));
        }

        for node in self.nodes.values() {
            // 6: folders own children, leaves own content
            if node.is_folder() != node.children().is_some() {
                return Err(InvariantViolation::new(
                    6,
                    format!("{} has a body that does not match its kind", node.path),
                ));
            }

            if node.id == self.root {
                continue;
            }
            if node.parent_id.is_none() {
                return Err(InvariantViolation::new(1, format!("second root {}", node.path)));
            }
            if !path::is_valid_name(&node.name) {
                return Err(InvariantViolation::new(
                    2,
                    format!("invalid name '{}' at {}", node.name, node.path),
                ));
            }

            // 2: path matches the ancestor chain
            let expected = self.path_from_chain(node.id)?;
            if expected != node.path {
                return Err(InvariantViolation::new(
                    2,
                    format!("path {} should be {}", node.path, expected),
                ));
            }

            // 3: listed by its parent exactly once
            let parent = node
                .parent_id
                .and_then(|p| self.get(p))
                .ok_or_else(|| InvariantViolation::new(3, format!("{} is orphaned", node.path)))?;
            let listed = parent
                .children()
                .map(|c| c.iter().filter(|id| **id == node.id).count())
                .unwrap_or(0);
            if listed != 1 {
                return Err(InvariantViolation::new(
                    3,
                    format!("{} listed {} times by its parent", node.path, listed),
                ));
            }
        }

        for node in self.nodes.values() {
            let Some(children) = node.children() else {
                continue;
            };
            let mut names = std::collections::HashSet::new();
            for child_id in children {
                // 3: no dangling ids, back-reference matches
                let child = self.get(*child_id).ok_or_else(|| {
                    InvariantViolation::new(3, format!("{} lists a dangling id {}", node.path, child_id))
                })?;
                if child.parent_id != Some(node.id) {
                    return Err(InvariantViolation::new(
                        3,
                        format!("{} lists {} which has another parent", node.path, child.path),
                    ));
                }
                // 4: unique sibling names
                if !names.insert(child.name.as_str()) {
                    return Err(InvariantViolation::new(
                        4,
                        format!("duplicate name '{}' in {}", child.name, node.path),
                    ));
                }
            }
        }

        // 2: the path index agrees with the records
        if self.paths.len() != self.nodes.len() {
            return Err(InvariantViolation::new(
                2,
                format!("path index has {} entries for {} nodes", self.paths.len(), self.nodes.len()),
            ));
        }
        for node in self.nodes.values() {
            if self.paths.get(&node.path) != Some(&node.id) {
                return Err(InvariantViolation::new(
                    2,
                    format!("path index does not map {} to its node", node.path),
                ));
            }
        }
        Ok(())
    }

    /// Build a node's path by walking parent ids up to the root.
    ///
    /// Fails with invariant 5 on a cycle.
    fn path_from_chain(&self, id: NodeId) -> Result<String, InvariantViolation> {
        let mut names = Vec::new();
        let mut current = id;
        for _ in 0..=self.nodes.len() {
            let node = self
                .get(current)
                .ok_or_else(|| InvariantViolation::new(3, format!("dangling parent id {}", current)))?;
            match node.parent_id {
                None => {
                    names.reverse();
                    return Ok(format!("/{}", names.join("/")));
                }
                Some(parent) => {
                    names.push(node.name.as_str());
                    current = parent;
                }
            }
        }
        Err(InvariantViolation::new(5, format!("node {} is its own ancestor", id)))
    }
}
