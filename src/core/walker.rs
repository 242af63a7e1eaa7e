use anyhow::{Context, Result};
use log::{debug, trace};

use crate::builders::generator::Generator;
use crate::core::tree::{Child, DirectoryTree, NodeId};

/// Counters collected while walking a tree.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkSummary {
    /// Directories that were offered to at least one generator.
    pub directories: usize,
    /// Total `visit_dir` calls made.
    pub visits: usize,
}

/// Offers every directory of `tree` to `generators`, in preorder.
///
/// Each directory is offered to the generators still active for it, in list
/// order. A generator that asks to skip the subtree is dropped for everything
/// below; a generator that claims a directory hides that directory and its
/// subtree from every generator listed after it. The active list only ever
/// shrinks on the way down. The first genuine error aborts the walk.
pub fn walk(tree: &DirectoryTree, generators: &mut [Box<dyn Generator>]) -> Result<WalkSummary> {
    let active: Vec<usize> = (0..generators.len()).collect();
    let mut summary = WalkSummary::default();
    walk_node(tree, tree.root(), generators, &active, &mut summary)?;
    Ok(summary)
}

fn walk_node(
    tree: &DirectoryTree,
    id: NodeId,
    generators: &mut [Box<dyn Generator>],
    active: &[usize],
    summary: &mut WalkSummary,
) -> Result<()> {
    if active.is_empty() {
        return Ok(());
    }

    let node = tree.node(id);
    let path = node.path();
    summary.directories += 1;

    let mut next = Vec::with_capacity(active.len());
    for &index in active {
        let generator = &mut generators[index];
        summary.visits += 1;

        let visit = generator.visit_dir(path).with_context(|| {
            format!(
                "Generator '{}' failed in {}",
                generator.name(),
                path.display()
            )
        })?;
        trace!("{} @ {}: {:?}", generator.name(), path.display(), visit);

        if visit.skips_subtree() {
            debug!(
                "{} skips the subtree below {}",
                generator.name(),
                path.display()
            );
        } else {
            next.push(index);
        }

        if visit.found {
            debug!("{} claimed {}", generator.name(), path.display());
            break;
        }
    }

    for child in node.children() {
        match child {
            Child::Present(child) => walk_node(tree, *child, generators, &next, summary)?,
            Child::Absent => {}
        }
    }

    Ok(())
}
