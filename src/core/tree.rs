use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::builders::ignores::IgnoreRules;

/// Index of a node inside a [`DirectoryTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// One slot in a directory's child list.
///
/// A subdirectory excluded by an inherited ignore rule keeps its slot as
/// `Absent`: it was never listed, and nothing below it exists in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Child {
    Present(NodeId),
    Absent,
}

#[derive(Debug)]
pub struct DirNode {
    path: PathBuf,
    parent: Option<NodeId>,
    children: Vec<Child>,
    ignores: Option<IgnoreRules>,
}

impl DirNode {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// Rules declared by this directory itself, ignoring ancestors.
    pub fn own_ignores(&self) -> Option<&IgnoreRules> {
        self.ignores.as_ref()
    }
}

/// A snapshot of the directories below a scan root.
///
/// Nodes live in a flat arena; parents are referenced by index so that
/// ignore rules can be resolved up the chain without shared ownership.
#[derive(Debug)]
pub struct DirectoryTree {
    nodes: Vec<DirNode>,
    ignore_file: String,
}

impl DirectoryTree {
    /// Builds the tree rooted at `root`, honouring `ignore_file` in every
    /// directory.
    ///
    /// Subdirectories are listed in file-name order. Symlinked directories are
    /// not followed.
    pub fn build(root: &Path, ignore_file: &str) -> Result<Self> {
        let mut tree = Self {
            nodes: Vec::new(),
            ignore_file: ignore_file.to_string(),
        };
        // The root has no parent, so it can never come back absent.
        tree.build_node(root.to_path_buf(), None)?;
        Ok(tree)
    }

    fn build_node(&mut self, path: PathBuf, parent: Option<NodeId>) -> Result<Child> {
        if let Some(parent) = parent
            && let Some(rules) = self.ignores(parent)
            && rules.matches(&path)
        {
            debug!(
                "excluding {} (matched {})",
                path.display(),
                rules.source().display()
            );
            return Ok(Child::Absent);
        }

        let ignores = IgnoreRules::load(&path, &self.ignore_file)?;
        let subdirs = list_subdirectories(&path)?;

        let id = NodeId(self.nodes.len());
        self.nodes.push(DirNode {
            path,
            parent,
            children: Vec::with_capacity(subdirs.len()),
            ignores,
        });

        for subdir in subdirs {
            let child = self.build_node(subdir, Some(id))?;
            self.nodes[id.0].children.push(child);
        }

        Ok(Child::Present(id))
    }

    /// Resolves the ignore rules in force for `id`: its own if it declares
    /// any, otherwise the nearest ancestor's.
    pub fn ignores(&self, id: NodeId) -> Option<&IgnoreRules> {
        let mut current = Some(id);
        while let Some(id) = current {
            let node = &self.nodes[id.0];
            if let Some(rules) = node.ignores.as_ref() {
                return Some(rules);
            }
            current = node.parent;
        }
        None
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &DirNode {
        &self.nodes[id.0]
    }

    /// Number of directories present in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of child slots left absent by ignore rules.
    pub fn excluded(&self) -> usize {
        self.nodes
            .iter()
            .flat_map(|node| node.children.iter())
            .filter(|child| matches!(child, Child::Absent))
            .count()
    }

    /// Finds the node for `path`, if it is present in the tree.
    pub fn find(&self, path: &Path) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.path == path)
            .map(NodeId)
    }
}

fn list_subdirectories(path: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(path)
        .with_context(|| format!("Failed to list directory {}", path.display()))?;

    let mut subdirs = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("Failed to read entry in {}", path.display()))?;
        let file_type = entry
            .file_type()
            .with_context(|| format!("Failed to stat {}", entry.path().display()))?;
        if file_type.is_dir() {
            subdirs.push(entry.path());
        }
    }
    subdirs.sort();

    Ok(subdirs)
}
