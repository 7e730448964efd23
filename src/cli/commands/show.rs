//! show command - print provenance of an imported package.

use anyhow::{bail, Result};

use super::Session;
use crate::core::refs::PkgRef;
use crate::core::resolver::Resolver;
use crate::core::strategy::KeepExisting;
use crate::core::types::PkgName;

/// Print the provenance trailers of `pkg`'s active edge, falling back
/// to its latest import when the package is not in HEAD.
pub fn show(session: &Session, pkg: &str) -> Result<()> {
    let pkg = PkgName::new(pkg)?;
    let resolver = Resolver::new(&session.git, &session.ctx, &KeepExisting);
    let root = resolver.root(&session.manifest)?;

    let (oid, provenance) = match resolver.find_head_edge(&root, &pkg)? {
        Some(edge) => (edge.oid, edge.provenance),
        None => {
            let head_ref = PkgRef::pkg_head(&pkg);
            let Some(oid) = session.git.try_resolve_ref(head_ref.as_str())? else {
                bail!("'{pkg}' has never been imported");
            };
            let Some(provenance) = session.git.commit_provenance(&oid)? else {
                bail!("'{pkg}' carries no provenance");
            };
            (oid, provenance)
        }
    };

    println!("name:     {}", provenance.name);
    println!("revision: {}", provenance.revision);
    if !provenance.pkg_type.is_empty() {
        println!("type:     {}", provenance.pkg_type);
    }
    println!("snapshot: {oid}");
    if let Some(commit) = &provenance.commit {
        println!("commit:   {commit}");
    }
    if !provenance.url.is_empty() {
        println!("url:      {}", provenance.url);
    }
    Ok(())
}
