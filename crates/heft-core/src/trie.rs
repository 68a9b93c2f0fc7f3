//! Path trie aggregator.
//!
//! Directories are internal nodes keyed by path segment; chunks, modules and
//! assets are leaves. Every directory's totals equal the sum of its direct
//! children's contributions after every insertion.

use crate::types::Metrics;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// A node of the size tree.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Path segment grouping other nodes.
    Directory(Directory),
    /// Generated code chunk, with its attributed modules nested below it.
    Chunk(ChunkNode),
    /// Original module inside a chunk.
    Module(Leaf),
    /// Non-code artifact.
    Asset(Leaf),
}

impl TreeNode {
    /// The node's path segment.
    pub fn name(&self) -> &str {
        match self {
            TreeNode::Directory(dir) => &dir.name,
            TreeNode::Chunk(chunk) => &chunk.name,
            TreeNode::Module(leaf) | TreeNode::Asset(leaf) => &leaf.name,
        }
    }

    /// What this node adds to each ancestor directory.
    ///
    /// A chunk contributes its own whole-artifact metrics, never the sum of
    /// its modules.
    pub fn contribution(&self) -> Metrics {
        match self {
            TreeNode::Directory(dir) => dir.totals,
            TreeNode::Chunk(chunk) => chunk.metrics,
            TreeNode::Module(leaf) | TreeNode::Asset(leaf) => leaf.metrics,
        }
    }

    fn set_name(&mut self, name: &str) {
        let slot = match self {
            TreeNode::Directory(dir) => &mut dir.name,
            TreeNode::Chunk(chunk) => &mut chunk.name,
            TreeNode::Module(leaf) | TreeNode::Asset(leaf) => &mut leaf.name,
        };
        *slot = name.to_string();
    }

    /// Nodes below this one (module directory for chunks).
    pub fn children(&self) -> &[TreeNode] {
        match self {
            TreeNode::Directory(dir) => &dir.children,
            TreeNode::Chunk(chunk) => &chunk.modules.children,
            TreeNode::Module(_) | TreeNode::Asset(_) => &[],
        }
    }

    fn descend(&self) -> Option<&Directory> {
        match self {
            TreeNode::Directory(dir) => Some(dir),
            TreeNode::Chunk(chunk) => Some(&chunk.modules),
            TreeNode::Module(_) | TreeNode::Asset(_) => None,
        }
    }
}

/// Module or asset leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaf {
    /// Last path segment.
    pub name: String,
    /// Sizes of this leaf.
    #[serde(flatten)]
    pub metrics: Metrics,
}

impl Leaf {
    /// Creates a leaf. The name is replaced by the last path segment on insertion.
    pub fn new(name: impl Into<String>, metrics: Metrics) -> Self {
        Self {
            name: name.into(),
            metrics,
        }
    }
}

/// Chunk node: whole-artifact metrics plus the modules attributed to it.
#[derive(Debug, Clone)]
pub struct ChunkNode {
    /// Last segment of the chunk's file name.
    pub name: String,
    /// Whole-artifact sizes.
    pub metrics: Metrics,
    /// Attributed modules, keyed by module path. `modules.totals` is the
    /// attributed size, which may differ from `metrics`.
    pub modules: Directory,
}

impl ChunkNode {
    /// Creates a chunk with no modules.
    pub fn new(name: impl Into<String>, metrics: Metrics) -> Self {
        Self {
            name: name.into(),
            metrics,
            modules: Directory::default(),
        }
    }

    /// Adds an attributed module under `path`.
    pub fn insert_module(&mut self, path: &str, metrics: Metrics) {
        self.modules
            .insert(path, TreeNode::Module(Leaf::new(path, metrics)));
    }

    /// Sum of the attributed module metrics.
    pub fn attributed(&self) -> Metrics {
        self.modules.totals
    }
}

impl Serialize for ChunkNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let has_modules = !self.modules.children.is_empty();
        let mut state = serializer.serialize_struct("ChunkNode", if has_modules { 6 } else { 4 })?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("parsedSize", &self.metrics.parsed_size)?;
        state.serialize_field("gzipSize", &self.metrics.gzip_size)?;
        state.serialize_field("mapSize", &self.metrics.map_size)?;
        if has_modules {
            state.serialize_field("attributed", &self.modules.totals)?;
            state.serialize_field("children", &self.modules.children)?;
        }
        state.end()
    }
}

/// Directory node with pre-computed totals.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Directory {
    /// Path segment (the workspace name for the root).
    pub name: String,
    /// Sum of the children's contributions.
    #[serde(flatten)]
    pub totals: Metrics,
    /// Children in insertion order.
    pub children: Vec<TreeNode>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

/// Splits a path on `/` and `\`, skipping empty and `.` segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect()
}

impl Directory {
    /// Creates an empty directory.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Inserts `node` at `path`, creating intermediate directories as needed.
    ///
    /// The node is renamed to the last path segment and appended after any
    /// existing sibling, including one with the same name. Its contribution
    /// is added to this directory and every directory created or visited on
    /// the way down. An empty path appends the node here under its own name.
    pub fn insert(&mut self, path: &str, mut node: TreeNode) {
        let segments = split_path(path);
        let Some((leaf_name, parents)) = segments.split_last() else {
            self.totals += node.contribution();
            self.children.push(node);
            return;
        };

        node.set_name(leaf_name);
        let contribution = node.contribution();
        self.insert_at(parents, node, contribution);
    }

    fn insert_at(&mut self, parents: &[&str], node: TreeNode, contribution: Metrics) {
        self.totals += contribution;
        match parents {
            [] => self.children.push(node),
            [first, rest @ ..] => {
                let position = self.directory_position(first);
                match &mut self.children[position] {
                    TreeNode::Directory(dir) => dir.insert_at(rest, node, contribution),
                    _ => unreachable!("directory index only records directories"),
                }
            }
        }
    }

    fn directory_position(&mut self, name: &str) -> usize {
        if let Some(&position) = self.index.get(name) {
            return position;
        }
        self.children.push(TreeNode::Directory(Directory::new(name)));
        let position = self.children.len() - 1;
        self.index.insert(name.to_string(), position);
        position
    }

    /// Finds the first node at `path`. Chunks are descended into their modules.
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        let segments = split_path(path);
        let (last, parents) = segments.split_last()?;

        let mut current = self;
        for segment in parents {
            current = current
                .children
                .iter()
                .filter(|child| child.name() == *segment)
                .find_map(TreeNode::descend)?;
        }
        current.children.iter().find(|child| child.name() == *last)
    }

    /// Checks the roll-up invariant for this directory and everything below it,
    /// including the module directories of chunks.
    pub fn is_consistent(&self) -> bool {
        let sum: Metrics = self.children.iter().map(TreeNode::contribution).sum();
        sum == self.totals
            && self.children.iter().all(|child| match child {
                TreeNode::Directory(dir) => dir.is_consistent(),
                TreeNode::Chunk(chunk) => chunk.modules.is_consistent(),
                TreeNode::Module(_) | TreeNode::Asset(_) => true,
            })
    }

    /// Number of leaves (chunks, modules, assets) at or below this directory.
    pub fn leaf_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| match child {
                TreeNode::Directory(dir) => dir.leaf_count(),
                TreeNode::Chunk(chunk) => 1 + chunk.modules.leaf_count(),
                TreeNode::Module(_) | TreeNode::Asset(_) => 1,
            })
            .sum()
    }
}
