//! release command - freeze HEAD as a versioned snapshot.

use anyhow::{Context as _, Result};

use super::Session;
use crate::core::resolver::Resolver;
use crate::core::types::Revision;

/// Snapshot the HEAD namespace as release `rev`, commit the manifest,
/// and tag it.
pub fn release(session: &mut Session, rev: &str) -> Result<()> {
    let rev = Revision::new(rev)?;

    let prompt = session.prompt();
    let resolver = Resolver::new(&session.git, &session.ctx, prompt.as_ref());
    resolver
        .release(&mut session.manifest, &rev)
        .with_context(|| format!("failed to release {rev}"))?;
    Ok(())
}
