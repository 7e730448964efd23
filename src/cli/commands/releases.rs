//! ls-releases command - list release snapshots.

use anyhow::Result;

use super::Session;
use crate::core::resolver::Resolver;
use crate::core::strategy::KeepExisting;

/// Print release snapshot revisions, version-sorted.
pub fn ls_releases(session: &Session) -> Result<()> {
    let resolver = Resolver::new(&session.git, &session.ctx, &KeepExisting);
    let root = resolver.root(&session.manifest)?;
    for rev in resolver.releases(&root)? {
        println!("{rev}");
    }
    Ok(())
}
