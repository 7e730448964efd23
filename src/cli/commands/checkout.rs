//! checkout command - switch to a release snapshot.

use anyhow::{Context as _, Result};

use super::Session;
use crate::core::resolver::Resolver;
use crate::core::types::Revision;

/// Restore the repository - refs, manifest, and worktrees - to release
/// `rev`. `checkout HEAD` re-materializes the active graph in place.
pub fn checkout(session: &mut Session, rev: &str) -> Result<()> {
    let rev = Revision::new(rev)?;

    let prompt = session.prompt();
    let resolver = Resolver::new(&session.git, &session.ctx, prompt.as_ref());
    session.manifest = resolver
        .checkout(&session.manifest, &rev)
        .with_context(|| format!("failed to check out {rev}"))?;
    Ok(())
}
