//! core::traverse
//!
//! Breadth-first dependency traversal for the `tree` command.
//!
//! Starting at the root package, each node's children are read from the
//! manifest blob stored inside its orphan commit
//! (`refs/pkgs/<name>/<rev>/<name>:pkgs.json`; a missing blob means no
//! children). A package visited once - at any revision - is never
//! expanded again; a reappearance is emitted with a `deduped`
//! annotation so cycles and diamonds terminate.
//!
//! The output is a flat list of ancestry-keyed nodes suitable for a
//! downstream formatter: each node carries the chain of `name@rev`
//! labels from the root down to itself.

use std::collections::{HashSet, VecDeque};

use crate::core::manifest::Manifest;
use crate::core::refs::PkgRef;
use crate::core::resolver::ResolveError;
use crate::core::types::{PkgName, Revision};
use crate::git::interface::Git;

/// One traversal node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// `name@rev` labels from the root down to this node, inclusive.
    pub ancestry: Vec<String>,
    /// Package name of this node.
    pub name: PkgName,
    /// Revision of this node.
    pub revision: Revision,
    /// Whether this package already appeared elsewhere in the traversal.
    pub deduped: bool,
}

impl TreeNode {
    /// Depth of the node; the root is depth 0.
    pub fn depth(&self) -> usize {
        self.ancestry.len().saturating_sub(1)
    }

    /// The ancestry key, `:`-joined.
    pub fn key(&self) -> String {
        self.ancestry.join(":")
    }

    /// The display label of this node.
    pub fn label(&self) -> String {
        let mut label = format!("{}@{}", self.name, self.revision);
        if self.deduped {
            label.push_str(" (deduped)");
        }
        label
    }
}

/// Traverse the dependency graph of `root@rev` breadth-first.
///
/// `root_manifest` supplies the root's children when traversing HEAD
/// (where no orphan snapshot of the root need exist yet); snapshots of
/// dependencies are always read out of their orphan commits.
pub fn traverse(
    git: &Git,
    root: &PkgName,
    rev: &Revision,
    root_manifest: &Manifest,
    manifest_file: &str,
) -> Result<Vec<TreeNode>, ResolveError> {
    let mut nodes = Vec::new();
    let mut visited: HashSet<PkgName> = HashSet::new();
    let mut queue: VecDeque<TreeNode> = VecDeque::new();

    queue.push_back(TreeNode {
        ancestry: vec![format!("{root}@{rev}")],
        name: root.clone(),
        revision: rev.clone(),
        deduped: false,
    });
    visited.insert(root.clone());

    while let Some(node) = queue.pop_front() {
        let children = if node.name == *root && node.revision == *rev {
            root_children(git, root, rev, root_manifest, manifest_file)?
        } else {
            manifest_at(git, &node.name, &node.revision, manifest_file)?
                .map(|m| m.dependencies())
                .unwrap_or_default()
                .into_iter()
                .map(|(key, rev)| (key.name, rev))
                .collect()
        };

        for (child, child_rev) in children {
            let mut ancestry = node.ancestry.clone();
            ancestry.push(format!("{child}@{child_rev}"));
            let deduped = !visited.insert(child.clone());
            let child_node = TreeNode {
                ancestry,
                name: child,
                revision: child_rev,
                deduped,
            };
            if !deduped {
                queue.push_back(child_node.clone());
            }
            nodes.push(child_node);
        }
        if node.depth() == 0 {
            // The root itself leads the output.
            nodes.insert(0, node);
        }
    }

    Ok(nodes)
}

/// Children of the root node.
///
/// HEAD uses the working-tree manifest; a released revision reads the
/// manifest committed into that snapshot's root orphan.
fn root_children(
    git: &Git,
    root: &PkgName,
    rev: &Revision,
    root_manifest: &Manifest,
    manifest_file: &str,
) -> Result<Vec<(PkgName, Revision)>, ResolveError> {
    let manifest = if rev.is_head() {
        Some(root_manifest.clone())
    } else {
        manifest_at(git, root, rev, manifest_file)?
    };
    Ok(manifest
        .map(|m| m.dependencies())
        .unwrap_or_default()
        .into_iter()
        .map(|(key, rev)| (key.name, rev))
        .collect())
}

/// Read the manifest blob out of `refs/pkgs/<name>/<rev>/<name>`.
///
/// Missing ref or missing blob both degrade to `None` (empty manifest);
/// a malformed blob is reported.
fn manifest_at(
    git: &Git,
    name: &PkgName,
    rev: &Revision,
    manifest_file: &str,
) -> Result<Option<Manifest>, ResolveError> {
    let refname = PkgRef::pkg_orphan(name, rev);
    let Some(oid) = git.try_resolve_ref(refname.as_str())? else {
        return Ok(None);
    };
    let Some(blob) = git.tree_entry_blob(&oid, manifest_file)? else {
        return Ok(None);
    };
    let text = String::from_utf8_lossy(&blob);
    let manifest = Manifest::from_json(&text).map_err(|message| {
        crate::core::manifest::ManifestError::Invalid {
            path: std::path::PathBuf::from(format!("{refname}:{manifest_file}")),
            message,
        }
    })?;
    Ok(Some(manifest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(ancestry: &[&str], deduped: bool) -> TreeNode {
        let last = ancestry.last().unwrap();
        let (name, rev) = last.split_once('@').unwrap();
        TreeNode {
            ancestry: ancestry.iter().map(|s| s.to_string()).collect(),
            name: PkgName::new(name).unwrap(),
            revision: Revision::new(rev).unwrap(),
            deduped,
        }
    }

    #[test]
    fn depth_counts_from_root() {
        assert_eq!(node(&["app@HEAD"], false).depth(), 0);
        assert_eq!(node(&["app@HEAD", "libfoo@1.0"], false).depth(), 1);
    }

    #[test]
    fn key_joins_with_colon() {
        assert_eq!(
            node(&["app@HEAD", "libfoo@1.0"], false).key(),
            "app@HEAD:libfoo@1.0"
        );
    }

    #[test]
    fn deduped_label() {
        assert_eq!(node(&["app@HEAD"], false).label(), "app@HEAD");
        assert_eq!(
            node(&["app@HEAD", "c@1.1"], true).label(),
            "c@1.1 (deduped)"
        );
    }
}
