// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! OIRi tree model.
//!
//! A [`ContentModel`] owns one synthetic root [`TreeNode`]. Nodes below it
//! are created lazily, level by level, the first time a path needs them, and
//! live as long as the model. Children are keyed by [`Segment`], so sibling
//! iteration is always in ascending-id order.
//!
//! A node may hold a scalar value and children at the same time (for example
//! a Resource written with `/3/0/0` and later `/3/0/0/1`). Both are kept and
//! both are retrievable.

use crate::error::{IpcError, Result};
use crate::label::Label;
use crate::path::{Path, Segment};
use std::collections::BTreeMap;
use std::fmt;

/// One addressable node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeNode {
    id: Option<Segment>,
    value: Option<String>,
    label: Option<Label>,
    result: Option<String>,
    change_type: Option<String>,
    children: BTreeMap<Segment, TreeNode>,
}

impl TreeNode {
    /// Synthetic root (no id).
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(id: Segment) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn id(&self) -> Option<&Segment> {
        self.id.as_ref()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: Option<String>) {
        self.value = value;
    }

    pub fn label(&self) -> Option<Label> {
        self.label
    }

    pub fn set_label(&mut self, label: Option<Label>) {
        self.label = label;
    }

    /// `<Result><Error>` text reported by the server for this path.
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn set_result(&mut self, result: Option<String>) {
        self.result = result;
    }

    /// `<ChangeType>` text of a change notification.
    pub fn change_type(&self) -> Option<&str> {
        self.change_type.as_deref()
    }

    pub fn set_change_type(&mut self, change_type: Option<String>) {
        self.change_type = change_type;
    }

    pub fn child(&self, id: &Segment) -> Option<&TreeNode> {
        self.children.get(id)
    }

    /// Link a child under its own id, replacing any previous child with that id.
    pub fn add_child(&mut self, child: TreeNode) {
        if let Some(id) = child.id.clone() {
            tracing::trace!(parent = ?self.id, child = %id, "add child");
            self.children.insert(id, child);
        }
    }

    /// Children in ascending-id order.
    pub fn children(&self) -> impl Iterator<Item = &TreeNode> {
        self.children.values()
    }

    pub fn child_ids(&self) -> impl Iterator<Item = &Segment> {
        self.children.keys()
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Walk down `path`, creating missing nodes. Returns the final node.
    /// Walking an existing path twice creates nothing new.
    fn build_path(&mut self, segments: &[Segment]) -> &mut TreeNode {
        let mut node = self;
        for segment in segments {
            node = node
                .children
                .entry(segment.clone())
                .or_insert_with(|| TreeNode::new(segment.clone()));
        }
        node
    }

    fn find(&self, segments: &[Segment]) -> Option<&TreeNode> {
        let mut node = self;
        for segment in segments {
            node = node.children.get(segment)?;
        }
        Some(node)
    }

    fn walk<'a, F>(&'a self, depth: usize, visit: &mut F)
    where
        F: FnMut(usize, &'a TreeNode),
    {
        visit(depth, self);
        for child in self.children.values() {
            child.walk(depth + 1, visit);
        }
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ ID ")?;
        match &self.id {
            Some(id) => write!(f, "{}", id)?,
            None => f.write_str("-")?,
        }
        if let Some(value) = &self.value {
            write!(f, ", value {}", value)?;
        }
        if let Some(label) = self.label {
            write!(f, ", label {}", label)?;
        }
        if !self.children.is_empty() {
            f.write_str(", children")?;
            for id in self.children.keys() {
                write!(f, " {}", id)?;
            }
        }
        f.write_str(" ]")
    }
}

/// Tree-structured payload of one IPC message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentModel {
    root: Option<TreeNode>,
}

impl ContentModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already-built root node.
    pub fn from_root(root: TreeNode) -> Self {
        Self { root: Some(root) }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    /// Merge a value and label into the tree at `path`.
    ///
    /// Missing nodes along the way are created. The value and label at the
    /// final node are overwritten (last write wins). Shape validation is the
    /// caller's job; the model accepts any depth and the codec rejects what
    /// the wire cannot carry.
    pub fn add(&mut self, path: &Path, value: Option<String>, label: Option<Label>) {
        tracing::debug!(path = %path, ?value, ?label, "content add");
        let root = self.root.get_or_insert_with(TreeNode::root);
        let leaf = root.build_path(path.segments());
        leaf.value = value;
        leaf.label = label;
    }

    /// Node at `path`, at any depth.
    pub fn node(&self, path: &Path) -> Option<&TreeNode> {
        self.root.as_ref()?.find(path.segments())
    }

    /// Value stored at a Resource or ResourceInstance path.
    ///
    /// `Ok(None)` means nothing is stored there; only a path of the wrong
    /// length is an error.
    pub fn get_value(&self, path: &Path) -> Result<Option<&str>> {
        check_value_path(path)?;
        Ok(self.node(path).and_then(TreeNode::value))
    }

    /// Depth-first, ascending-id traversal. The root is visited at depth 0.
    pub fn walk<'a, F>(&'a self, mut visit: F)
    where
        F: FnMut(usize, &'a TreeNode),
    {
        if let Some(root) = &self.root {
            root.walk(0, &mut visit);
        }
    }

    /// Every path that holds a value, in traversal order.
    pub fn value_paths(&self) -> Vec<(Path, &str)> {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            let mut prefix = Vec::new();
            collect_values(root, &mut prefix, &mut out);
        }
        out
    }
}

/// Value lookups address Resources or ResourceInstances only.
pub(crate) fn check_value_path(path: &Path) -> Result<()> {
    if matches!(path.len(), 3 | 4) {
        Ok(())
    } else {
        Err(IpcError::InvalidArgument(
            "getValue expects path of length 3 or 4".to_string(),
        ))
    }
}

fn collect_values<'a>(node: &'a TreeNode, prefix: &mut Vec<Segment>, out: &mut Vec<(Path, &'a str)>) {
    if let Some(value) = node.value() {
        out.push((Path::new(prefix.clone()), value));
    }
    for (id, child) in &node.children {
        prefix.push(id.clone());
        collect_values(child, prefix, out);
        prefix.pop();
    }
}

impl fmt::Display for ContentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.root.is_none() {
            return f.write_str("-");
        }
        let mut result = Ok(());
        self.walk(|depth, node| {
            if result.is_ok() {
                result = writeln!(f, "{}{}", "  ".repeat(depth), node);
            }
        });
        result
    }
}
