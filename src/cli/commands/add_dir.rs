//! add-dir command - import a local directory as a package revision.

use std::path::Path;

use anyhow::{bail, Context as _, Result};

use super::Session;
use crate::core::resolver::Resolver;
use crate::core::types::{PkgName, Revision};

/// Snapshot `path` as `pkg@rev` and attach it to the graph.
pub fn add_dir(
    session: &mut Session,
    pkg: &str,
    rev: &str,
    path: &str,
    url: Option<&str>,
) -> Result<()> {
    let pkg = PkgName::new(pkg)?;
    let rev = Revision::new(rev)?;
    let dir = Path::new(path);
    if !dir.is_dir() {
        bail!("'{path}' is not a directory");
    }

    let prompt = session.prompt();
    let resolver = Resolver::new(&session.git, &session.ctx, prompt.as_ref());
    resolver
        .add_dir(&mut session.manifest, &pkg, &rev, dir, url)
        .with_context(|| format!("failed to import {} as {pkg}@{rev}", dir.display()))?;

    session.manifest.save(&session.manifest_path)?;
    Ok(())
}
