//! Remote commands - fetch, push, pull, clone.
//!
//! The non-trivial contract here is `push`: it ships HEAD, the release
//! tag, and everything under `refs/pkgs/*`, so a plain `git fetch` on
//! the other side reconstructs the full registry. `clone` bootstraps a
//! working tree and finishes by configuring the package name from the
//! cloned tip's trailers and checking out HEAD.

use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};

use super::Session;
use crate::core::context::{Context, Overrides};
use crate::core::manifest::Manifest;
use crate::core::resolver::Resolver;
use crate::core::strategy::KeepExisting;
use crate::core::types::Revision;
use crate::git::interface::FetchOptions;
use crate::git::Git;

/// Refspec mirroring the entire package namespace.
const PKGS_REFSPEC: &str = "+refs/pkgs/*:refs/pkgs/*";

/// Fetch package refs and release tags from a remote.
pub fn fetch(session: &Session, url: Option<&str>) -> Result<()> {
    let url = resolve_url(session, url)?;
    session.git.fetch(
        &url,
        &[PKGS_REFSPEC.to_string(), "+refs/tags/*:refs/tags/*".to_string()],
        FetchOptions {
            force: true,
            no_tags: true,
            ..Default::default()
        },
    )?;
    Ok(())
}

/// Push HEAD, the release tag, and the package namespace.
pub fn push(session: &Session, url: Option<&str>) -> Result<()> {
    let url = resolve_url(session, url)?;
    let mut refspecs = vec!["HEAD".to_string(), PKGS_REFSPEC.to_string()];
    if session.ctx.all {
        refspecs.push("refs/tags/*:refs/tags/*".to_string());
    } else if let Some(version) = session.manifest.version() {
        refspecs.push(format!("refs/tags/{version}:refs/tags/{version}"));
    }
    session.git.push(&url, &refspecs)?;
    Ok(())
}

/// Fetch, then re-materialize the active graph.
pub fn pull(session: &mut Session, url: Option<&str>) -> Result<()> {
    fetch(session, url)?;
    let resolver = Resolver::new(&session.git, &session.ctx, &KeepExisting);
    session.manifest = resolver.checkout(&session.manifest, &Revision::head())?;
    Ok(())
}

/// Clone a package repository and check out its graph.
///
/// Runs before any session exists: clones, opens the fresh repository,
/// configures `name` from the cloned tip's trailers when the manifest
/// doesn't carry one, and re-materializes every worktree.
pub fn clone(url: &str, dir: Option<&str>, overrides: Overrides) -> Result<()> {
    let dst = match dir {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(dir_from_url(url)?),
    };
    Git::clone(url, &dst)?;

    let git = Git::open(&dst).context("failed to open the cloned repository")?;
    let ctx = Context::build(overrides.clone(), &Manifest::default())?;
    let manifest_path = git.work_dir().join(&ctx.manifest_file);
    let mut manifest = Manifest::load(&manifest_path)?;

    // The cloned tip's trailers name the root package.
    if manifest.name().is_none() {
        let tip = git.resolve_committish("HEAD")?;
        if let Some(provenance) = git.commit_provenance(&tip)? {
            manifest.set("name", provenance.name.as_str())?;
            manifest.save(&manifest_path)?;
        }
    }

    // A repository that never entered the system clones like any other.
    if manifest.name().is_none() {
        return Ok(());
    }

    let ctx = Context::build(overrides, &manifest)?;
    let resolver = Resolver::new(&git, &ctx, &KeepExisting);
    resolver.checkout(&manifest, &Revision::head())?;
    Ok(())
}

/// Derive a destination directory from a clone URL.
fn dir_from_url(url: &str) -> Result<&str> {
    let trimmed = url.trim_end_matches('/');
    let base = trimmed
        .rsplit(['/', ':'])
        .next()
        .map(|base| base.strip_suffix(".git").unwrap_or(base))
        .filter(|base| !base.is_empty());
    match base {
        Some(base) => Ok(base),
        None => bail!("cannot derive a directory name from '{url}'"),
    }
}

/// Explicit URL, or the configured default remote.
fn resolve_url(session: &Session, url: Option<&str>) -> Result<String> {
    if let Some(url) = url {
        return Ok(url.to_string());
    }
    match session.git.default_remote_url()? {
        Some(url) => Ok(url),
        None => bail!("no remote configured; pass a url"),
    }
}
