//! json-import / json-export commands.
//!
//! The export document describes the active graph well enough for
//! another repository to reconstruct it:
//!
//! ```json
//! {
//!   "name": "<root>",
//!   "revision": "<git describe>",
//!   "packages": [
//!     { "name": "...", "revision": "...", "author": "...",
//!       "email": "...", "description": "...", "snapshot": "...",
//!       "reference": "...", "url": "...", "mirror": "..." }
//!   ]
//! }
//! ```
//!
//! Import reads `{ "packages": [ { name, revision, url }, ... ] }` and
//! replays `add` for each entry.

use std::io::Read;

use anyhow::{bail, Context as _, Result};
use serde::Deserialize;
use serde_json::{json, Value};

use super::Session;
use crate::core::manifest::Manifest;
use crate::core::resolver::Resolver;
use crate::core::types::{PkgName, Revision};

/// Export the active graph as JSON on stdout.
pub fn export(session: &Session) -> Result<()> {
    let resolver = Resolver::new(&session.git, &session.ctx, &crate::core::strategy::KeepExisting);
    let root = resolver.root(&session.manifest)?;
    let mirror = session
        .git
        .default_remote_url()?
        .unwrap_or_else(|| session.git.work_dir().display().to_string());

    let mut packages = Vec::new();
    let mut edges = resolver.head_edges(&root)?;
    edges.sort_by(|a, b| a.name.cmp(&b.name));
    for edge in edges {
        if edge.name == root {
            continue;
        }
        let info = session.git.commit_info(&edge.oid)?;
        let description = session
            .git
            .tree_entry_blob(&edge.oid, &session.ctx.manifest_file)?
            .and_then(|blob| {
                Manifest::from_json(&String::from_utf8_lossy(&blob))
                    .ok()
                    .and_then(|m| m.get("description"))
            })
            .unwrap_or_default();

        packages.push(json!({
            "name": edge.name.as_str(),
            "revision": edge.revision.as_str(),
            "author": info.author_name,
            "email": info.author_email,
            "description": description,
            "snapshot": edge.oid.as_str(),
            "reference": edge.provenance.commit.as_ref().map(|c| c.as_str().to_string()).unwrap_or_default(),
            "url": edge.provenance.url,
            "mirror": mirror,
        }));
    }

    let document = json!({
        "name": root.as_str(),
        "revision": session.git.describe(),
        "packages": packages,
    });
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

/// One entry of an import document.
#[derive(Debug, Deserialize)]
struct ImportEntry {
    name: String,
    revision: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct ImportDocument {
    #[serde(default)]
    packages: Vec<ImportEntry>,
}

/// Replay `add` for every package in the document.
pub fn import(session: &mut Session, file: Option<&str>) -> Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {path}"))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            buffer
        }
    };
    let document: ImportDocument = match serde_json::from_str::<Value>(&text) {
        Ok(value) => serde_json::from_value(value).context("unexpected import document shape")?,
        Err(e) => bail!("invalid import document: {e}"),
    };

    let prompt = session.prompt();
    let resolver = Resolver::new(&session.git, &session.ctx, prompt.as_ref());
    for entry in document.packages {
        let pkg = PkgName::new(entry.name)?;
        let rev = Revision::new(entry.revision)?;
        resolver
            .add(&mut session.manifest, &pkg, &rev, Some(&entry.url))
            .with_context(|| format!("failed to import {pkg}@{rev}"))?;
    }

    session.manifest.save(&session.manifest_path)?;
    Ok(())
}
