//! prune command - garbage-collect unreferenced imports.

use anyhow::Result;

use super::Session;
use crate::core::resolver::Resolver;
use crate::core::strategy::KeepExisting;

/// Delete imported namespaces no snapshot or HEAD edge references.
pub fn prune(session: &Session) -> Result<()> {
    let resolver = Resolver::new(&session.git, &session.ctx, &KeepExisting);
    let pruned = resolver.prune(&session.manifest)?;
    if pruned.is_empty() && !session.ctx.quiet {
        println!("nothing to prune");
    }
    Ok(())
}
