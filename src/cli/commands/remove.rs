//! remove command - drop a direct dependency.

use anyhow::{Context as _, Result};

use super::Session;
use crate::core::resolver::Resolver;
use crate::core::types::PkgName;

/// Remove the direct dependency `pkg`, restoring transitive edges that
/// remaining dependencies still declare.
pub fn remove(session: &mut Session, pkg: &str) -> Result<()> {
    let pkg = PkgName::new(pkg)?;

    let prompt = session.prompt();
    let resolver = Resolver::new(&session.git, &session.ctx, prompt.as_ref());
    resolver
        .remove(&mut session.manifest, &pkg)
        .with_context(|| format!("failed to remove {pkg}"))?;

    session.manifest.save(&session.manifest_path)?;
    Ok(())
}
