//! tree command - display the dependency tree.

use anyhow::Result;

use super::Session;
use crate::core::resolver::Resolver;
use crate::core::strategy::KeepExisting;
use crate::core::traverse;
use crate::core::types::Revision;
use crate::ui::tree_fmt;

/// Print the dependency tree of `rev` (default: HEAD).
pub fn tree(session: &Session, rev: Option<&str>) -> Result<()> {
    let rev = match rev {
        Some(rev) => Revision::new(rev)?,
        None => Revision::head(),
    };

    let resolver = Resolver::new(&session.git, &session.ctx, &KeepExisting);
    let root = resolver.root(&session.manifest)?;

    let nodes = traverse::traverse(
        &session.git,
        &root,
        &rev,
        &session.manifest,
        &session.ctx.manifest_file,
    )?;
    print!("{}", tree_fmt::render(&nodes));
    Ok(())
}
