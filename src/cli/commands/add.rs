//! add command - import a package revision from a git URL.

use anyhow::{Context as _, Result};

use super::Session;
use crate::core::resolver::Resolver;
use crate::core::types::{PkgName, Revision};

/// Import `pkg` at `rev` (default revision when omitted) and fold its
/// frozen graph into HEAD.
pub fn add(session: &mut Session, pkg: &str, rev: Option<&str>, url: Option<&str>) -> Result<()> {
    let pkg = PkgName::new(pkg)?;
    let rev = match rev {
        Some(rev) => Revision::new(rev)?,
        None => session.ctx.default_revision.clone(),
    };

    let prompt = session.prompt();
    let resolver = Resolver::new(&session.git, &session.ctx, prompt.as_ref());
    resolver
        .add(&mut session.manifest, &pkg, &rev, url)
        .with_context(|| format!("failed to add {pkg}@{rev}"))?;

    session.manifest.save(&session.manifest_path)?;
    Ok(())
}
