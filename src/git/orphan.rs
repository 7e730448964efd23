//! git::orphan
//!
//! Conversion of imported revisions into provenance-carrying orphans.
//!
//! An imported package revision starts life as a ref pointing at a full
//! commit fetched from its origin, history and all. Freezing it means
//! replacing that ref with a **single parentless commit** whose tree is
//! identical to the original and whose message carries the
//! `git-pkgs-*` provenance trailers. Only the orphan is ever pushed or
//! copied into snapshots, so importers never drag upstream history
//! around.
//!
//! Orphanization is idempotent: a ref that already names a parentless,
//! revision-matching commit is left untouched, which is what makes a
//! re-run of an interrupted `add` converge.

use crate::core::types::Oid;
use crate::git::interface::{Git, GitError};
use crate::git::trailers::{self, Provenance};

/// Replace `refname` with an orphan commit carrying `provenance`.
///
/// The original commit's tree and message are reused; trailers are
/// appended with add-if-different policy. Returns the OID the ref ends
/// up pointing at (the pre-existing orphan in the idempotent case).
///
/// # Errors
///
/// - [`GitError::RefNotFound`] when `refname` doesn't exist
pub fn orphanize(git: &Git, refname: &str, provenance: &Provenance) -> Result<Oid, GitError> {
    let current = git.resolve_ref(refname)?;
    let info = git.commit_info(&current)?;

    // Already an orphan recording this (name, revision): nothing to do.
    if info.parent_count == 0 {
        if let Some(existing) = git.commit_provenance(&current)? {
            if existing.name == provenance.name && existing.revision == provenance.revision {
                return Ok(current);
            }
        }
    }

    let message = trailers::append(&info.message, &provenance.to_pairs());
    let orphan = git.commit_tree(&info.tree, &message, &[])?;
    git.update_ref(
        refname,
        &orphan,
        &format!("git-pkgs: orphanize {}@{}", provenance.name, provenance.revision),
    )?;
    Ok(orphan)
}

/// Commit a freshly built tree as an orphan and return its OID.
///
/// Used by directory imports, where there is no origin commit to reuse:
/// the message is synthesized and the trailers are the only history the
/// package will ever have.
pub fn orphan_from_tree(
    git: &Git,
    tree: &Oid,
    subject: &str,
    provenance: &Provenance,
) -> Result<Oid, GitError> {
    let message = trailers::append(subject, &provenance.to_pairs());
    git.commit_tree(tree, &message, &[])
}
