//! status command - show the active dependency graph.

use std::collections::HashSet;

use anyhow::Result;

use super::Session;
use crate::core::refs::{self, PkgRef};
use crate::core::resolver::Resolver;
use crate::core::strategy::KeepExisting;
use crate::core::types::{Fingerprint, Revision};

/// Print the root package, every active edge with its direct or
/// transitive standing, and whether HEAD has drifted from the last
/// release.
pub fn status(session: &Session) -> Result<()> {
    let resolver = Resolver::new(&session.git, &session.ctx, &KeepExisting);
    let root = resolver.root(&session.manifest)?;

    match session.manifest.version() {
        Some(version) => println!("{root}@{version}"),
        None => println!("{root}"),
    }

    let direct: HashSet<(Option<String>, String)> = session
        .manifest
        .dependencies()
        .into_iter()
        .map(|(key, _)| {
            (
                key.namespace.map(|ns| ns.to_string()),
                key.name.to_string(),
            )
        })
        .collect();

    let mut edges = resolver.head_edges(&root)?;
    edges.sort_by(|a, b| a.name.cmp(&b.name));
    for edge in &edges {
        if edge.name == root {
            continue;
        }
        let key = (
            edge.namespace.as_ref().map(|ns| ns.to_string()),
            edge.name.to_string(),
        );
        let standing = if direct.contains(&key) {
            "direct"
        } else {
            "transitive"
        };
        match &edge.namespace {
            Some(ns) => println!("  {ns}:{}@{} ({standing})", edge.name, edge.revision),
            None => println!("  {}@{} ({standing})", edge.name, edge.revision),
        }
    }

    // Compare HEAD against the last release, pointwise by edge.
    if let Some(version) = session.manifest.version() {
        if let Ok(version) = Revision::new(version) {
            let head = namespace_fingerprint(session, &PkgRef::head_prefix(&root))?;
            let snapshot =
                namespace_fingerprint(session, &PkgRef::snapshot_prefix(&root, &version))?;
            if snapshot.is_some() && head != snapshot {
                println!("  (modified since release {version})");
            }
        }
    }
    Ok(())
}

/// Fingerprint a namespace by its edge suffixes, so HEAD and a snapshot
/// compare pointwise regardless of their differing prefixes.
fn namespace_fingerprint(session: &Session, prefix: &str) -> Result<Option<Fingerprint>> {
    let entries = session.git.list_refs_by_prefix(prefix)?;
    if entries.is_empty() {
        return Ok(None);
    }
    let pairs: Vec<(String, _)> = entries
        .into_iter()
        .filter_map(|entry| {
            refs::edge_suffix(&entry.name, prefix).map(|suffix| (suffix.to_string(), entry.oid))
        })
        .collect();
    Ok(Some(Fingerprint::compute(&pairs)))
}
