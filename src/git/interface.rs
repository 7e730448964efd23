//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module is the **single doorway** to all Git operations in
//! git-pkgs. No other module imports `git2` directly. This ensures:
//!
//! - Consistent error handling across all Git operations
//! - Strong type guarantees at the boundary
//! - One place that knows which operations run in-process and which
//!   shell out to the `git` binary
//!
//! # In-process vs porcelain
//!
//! Object and ref plumbing (resolve, update, delete, enumerate, blob and
//! tree reads, commit creation) run in-process through `git2`. Operations
//! that only the `git` porcelain implements well - `fetch --porcelain`,
//! worktree management, `push`, `clone`, working-tree checkout - shell
//! out to the binary and parse the porcelain output into structured
//! records.
//!
//! # Example
//!
//! ```ignore
//! use git_pkgs::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let oid = git.resolve_ref("refs/pkgs/app/HEAD/libfoo")?;
//! println!("libfoo is at {}", oid.short(7));
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use crate::core::types::{Oid, TypeError};
use crate::git::trailers::{self, Provenance};

/// Minimum supported version of the underlying git binary.
///
/// `fetch --porcelain` and orphan-friendly worktree handling both need
/// at least this.
pub const MIN_GIT_VERSION: (u32, u32) = (2, 41);

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Blob content is not valid UTF-8.
    #[error("blob is not valid UTF-8: {oid}")]
    InvalidUtf8 {
        /// The OID of the blob
        oid: String,
    },

    /// A fetch, push, or clone against a remote failed.
    #[error("remote operation against '{url}' failed: {message}")]
    RemoteFailed {
        /// The remote URL or path
        url: String,
        /// Trimmed stderr of the underlying command
        message: String,
    },

    /// The installed git binary is too old.
    #[error("git {found} is too old, need at least {}.{}", MIN_GIT_VERSION.0, MIN_GIT_VERSION.1)]
    UnsupportedGitVersion {
        /// The version that was found
        found: String,
    },

    /// A shelled-out git command failed.
    #[error("git {command} failed: {message}")]
    CommandFailed {
        /// The subcommand that failed
        command: String,
        /// Trimmed stderr
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::RefNotFound {
                refname: err.message().to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: err.message().to_string(),
            },
            _ => GitError::Internal {
                message: err.message().to_string(),
            },
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            other => GitError::Internal {
                message: other.to_string(),
            },
        }
    }
}

/// A ref with its name and target OID.
#[derive(Debug, Clone)]
pub struct RefEntry {
    /// The full ref name
    pub name: String,
    /// The OID the ref points to
    pub oid: Oid,
}

/// Status flag of one `fetch --porcelain` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Fast-forward update (` `).
    FastForward,
    /// Forced update (`+`).
    Forced,
    /// Pruned ref (`-`).
    Pruned,
    /// Tag update (`t`).
    TagUpdate,
    /// Newly created ref (`*`).
    New,
    /// Rejected update (`!`).
    Rejected,
    /// Already up to date (`=`).
    UpToDate,
}

impl FetchStatus {
    fn from_flag(flag: char) -> Option<Self> {
        match flag {
            ' ' => Some(Self::FastForward),
            '+' => Some(Self::Forced),
            '-' => Some(Self::Pruned),
            't' => Some(Self::TagUpdate),
            '*' => Some(Self::New),
            '!' => Some(Self::Rejected),
            '=' => Some(Self::UpToDate),
            _ => None,
        }
    }
}

/// One ref update produced by a fetch, in the order the remote
/// produced it.
#[derive(Debug, Clone)]
pub struct FetchUpdate {
    pub status: FetchStatus,
    /// Previous value of the local ref; `None` for newly created refs.
    pub old: Option<Oid>,
    /// New value of the local ref; `None` for pruned refs.
    pub new: Option<Oid>,
    /// The local ref that was updated.
    pub local_ref: String,
}

/// Options for a fetch.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Shallow-fetch depth (`--depth`).
    pub depth: Option<u32>,
    /// Allow non-fast-forward ref updates (`--force`).
    pub force: bool,
    /// Do not fetch tags (`--no-tags`).
    pub no_tags: bool,
    /// Prune local refs that disappeared from the source (`--prune`).
    pub prune: bool,
}

/// Result of running a git subcommand.
#[derive(Debug, Clone)]
pub struct GitCommandResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Commit information surfaced to callers.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    pub oid: Oid,
    pub summary: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub author_time: chrono::DateTime<chrono::Utc>,
    pub parent_count: usize,
    pub tree: Oid,
}

/// The Git interface.
///
/// Wraps a discovered repository and exposes the typed operations the
/// rest of the crate is written against.
pub struct Git {
    repo: git2::Repository,
}

impl Git {
    /// Open the repository containing `path`.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] when no repository is found
    /// - [`GitError::BareRepo`] when the repository has no working tree
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;
        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }
        Ok(Self { repo })
    }

    /// Check that the installed git binary is recent enough.
    ///
    /// Called once at startup; every later porcelain shell-out assumes
    /// the gate passed.
    pub fn check_version() -> Result<(), GitError> {
        let output = Command::new("git")
            .arg("version")
            .output()
            .map_err(|e| GitError::Internal {
                message: format!("failed to run git version: {e}"),
            })?;
        let text = String::from_utf8_lossy(&output.stdout);
        let found = text
            .split_whitespace()
            .nth(2)
            .unwrap_or_default()
            .to_string();
        let mut parts = found.split('.');
        let major: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
        let minor: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
        if (major, minor) < MIN_GIT_VERSION {
            return Err(GitError::UnsupportedGitVersion { found });
        }
        Ok(())
    }

    /// Path to the working directory.
    pub fn work_dir(&self) -> PathBuf {
        // Bare repositories are rejected in open().
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.repo.path().to_path_buf())
    }

    /// Path to the `.git` directory.
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    // =========================================================================
    // Ref Operations
    // =========================================================================

    /// Resolve a ref to the commit it names.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if the ref doesn't exist
    pub fn resolve_ref(&self, refname: &str) -> Result<Oid, GitError> {
        self.try_resolve_ref(refname)?
            .ok_or_else(|| GitError::RefNotFound {
                refname: refname.to_string(),
            })
    }

    /// Resolve a ref, returning `None` when it doesn't exist.
    pub fn try_resolve_ref(&self, refname: &str) -> Result<Option<Oid>, GitError> {
        match self.repo.find_reference(refname) {
            Ok(reference) => {
                let resolved = reference.resolve().unwrap_or(reference);
                let target = resolved.target().ok_or_else(|| GitError::Internal {
                    message: format!("ref {refname} has no target"),
                })?;
                // Peel annotated tags down to the commit.
                let oid = match self.repo.find_tag(target) {
                    Ok(tag) => tag.target_id(),
                    Err(_) => target,
                };
                Ok(Some(Oid::new(oid.to_string())?))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve an arbitrary committish (`HEAD`, a tag, a sha).
    pub fn resolve_committish(&self, spec: &str) -> Result<Oid, GitError> {
        let object = self
            .repo
            .revparse_single(spec)
            .map_err(|_| GitError::RefNotFound {
                refname: spec.to_string(),
            })?;
        let commit = object.peel_to_commit().map_err(|_| GitError::ObjectNotFound {
            oid: spec.to_string(),
        })?;
        Ok(Oid::new(commit.id().to_string())?)
    }

    /// Check whether a ref exists.
    pub fn ref_exists(&self, refname: &str) -> bool {
        self.repo.find_reference(refname).is_ok()
    }

    /// Point `refname` at `oid`, creating or force-updating it.
    pub fn update_ref(&self, refname: &str, oid: &Oid, log_message: &str) -> Result<(), GitError> {
        let oid = git2::Oid::from_str(oid.as_str()).map_err(|_| GitError::InvalidOid {
            oid: oid.to_string(),
        })?;
        self.repo.reference(refname, oid, true, log_message)?;
        Ok(())
    }

    /// Delete a ref.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if the ref doesn't exist
    pub fn delete_ref(&self, refname: &str) -> Result<(), GitError> {
        let mut reference =
            self.repo
                .find_reference(refname)
                .map_err(|_| GitError::RefNotFound {
                    refname: refname.to_string(),
                })?;
        reference.delete()?;
        Ok(())
    }

    /// List refs whose names start with `prefix`, sorted by name.
    pub fn list_refs_by_prefix(&self, prefix: &str) -> Result<Vec<RefEntry>, GitError> {
        let mut entries = Vec::new();
        for reference in self.repo.references()? {
            let reference = reference?;
            let Some(name) = reference.name().map(String::from) else {
                continue;
            };
            if !name.starts_with(prefix) {
                continue;
            }
            let resolved = reference.resolve().unwrap_or(reference);
            if let Some(target) = resolved.target() {
                entries.push(RefEntry {
                    name,
                    oid: Oid::new(target.to_string())?,
                });
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    // =========================================================================
    // Commit and Object Operations
    // =========================================================================

    /// Get information about a commit.
    pub fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError> {
        let commit = self.find_commit(oid)?;
        let author = commit.author();
        let author_time = chrono::DateTime::from_timestamp(author.when().seconds(), 0)
            .unwrap_or(chrono::DateTime::UNIX_EPOCH)
            .with_timezone(&chrono::Utc);

        Ok(CommitInfo {
            oid: oid.clone(),
            summary: commit.summary().unwrap_or("").to_string(),
            message: commit.message().unwrap_or("").to_string(),
            author_name: author.name().unwrap_or("").to_string(),
            author_email: author.email().unwrap_or("").to_string(),
            author_time,
            parent_count: commit.parent_count(),
            tree: Oid::new(commit.tree_id().to_string())?,
        })
    }

    /// Read the provenance trailers of a commit, if it carries any.
    pub fn commit_provenance(&self, oid: &Oid) -> Result<Option<Provenance>, GitError> {
        let commit = self.find_commit(oid)?;
        let map: HashMap<String, String> = trailers::parse_map(commit.message().unwrap_or(""));
        Ok(Provenance::from_map(&map))
    }

    /// Read a blob by OID.
    pub fn read_blob(&self, oid: &Oid) -> Result<Vec<u8>, GitError> {
        let git_oid = git2::Oid::from_str(oid.as_str()).map_err(|_| GitError::InvalidOid {
            oid: oid.to_string(),
        })?;
        let blob = self
            .repo
            .find_blob(git_oid)
            .map_err(|_| GitError::ObjectNotFound {
                oid: oid.to_string(),
            })?;
        Ok(blob.content().to_vec())
    }

    /// Read the blob at `path` inside the tree of `commit`.
    ///
    /// Returns `None` when the entry doesn't exist or is not a blob.
    pub fn tree_entry_blob(&self, commit: &Oid, path: &str) -> Result<Option<Vec<u8>>, GitError> {
        let commit = self.find_commit(commit)?;
        let tree = commit.tree()?;
        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match entry.to_object(&self.repo)?.into_blob() {
            Ok(blob) => Ok(Some(blob.content().to_vec())),
            Err(_) => Ok(None),
        }
    }

    /// Build a tree from a directory without touching its contents or
    /// the repository's real index.
    ///
    /// Uses an ephemeral in-memory index. Files under any `.git`
    /// directory are skipped. `extra_blobs` entries are written on top
    /// of the directory contents (and may overwrite a file of the same
    /// path in the resulting tree).
    pub fn write_tree_from_dir(
        &self,
        dir: &Path,
        extra_blobs: &[(String, Vec<u8>)],
    ) -> Result<Oid, GitError> {
        let mut index = git2::Index::new()?;

        let mut files = Vec::new();
        collect_files(dir, dir, &mut files).map_err(|e| GitError::Internal {
            message: format!("failed to read directory {}: {e}", dir.display()),
        })?;
        files.sort();

        for rel in files {
            let full = dir.join(&rel);
            let content = std::fs::read(&full).map_err(|e| GitError::Internal {
                message: format!("failed to read {}: {e}", full.display()),
            })?;
            let blob = self.repo.blob(&content)?;
            let mode = file_mode(&full);
            index.add(&index_entry(&rel, blob, mode))?;
        }

        for (path, content) in extra_blobs {
            let blob = self.repo.blob(content)?;
            index.add(&index_entry(Path::new(path), blob, 0o100644))?;
        }

        let tree = index.write_tree_to(&self.repo)?;
        Ok(Oid::new(tree.to_string())?)
    }

    /// Create a commit from an existing tree.
    ///
    /// `parents` empty produces a parentless (orphan) commit. No ref is
    /// updated; callers point refs explicitly.
    pub fn commit_tree(
        &self,
        tree: &Oid,
        message: &str,
        parents: &[Oid],
    ) -> Result<Oid, GitError> {
        let tree_oid = git2::Oid::from_str(tree.as_str()).map_err(|_| GitError::InvalidOid {
            oid: tree.to_string(),
        })?;
        let tree = self.repo.find_tree(tree_oid)?;
        let sig = self.signature()?;

        let mut parent_commits = Vec::with_capacity(parents.len());
        for parent in parents {
            parent_commits.push(self.find_commit(parent)?);
        }
        let parent_refs: Vec<&git2::Commit> = parent_commits.iter().collect();

        let oid = self
            .repo
            .commit(None, &sig, &sig, message, &tree, &parent_refs)?;
        Ok(Oid::new(oid.to_string())?)
    }

    /// Stage the given working-tree paths and commit onto HEAD.
    ///
    /// The commit is created even when the tree is unchanged. Handles an
    /// unborn HEAD (first commit in the repository).
    pub fn commit_paths(&self, paths: &[&Path], message: &str) -> Result<Oid, GitError> {
        let mut index = self.repo.index()?;
        for path in paths {
            index.add_path(path).map_err(|e| GitError::Internal {
                message: format!("failed to stage {}: {}", path.display(), e.message()),
            })?;
        }
        index.write()?;
        let tree_oid = index.write_tree()?;
        let tree = self.repo.find_tree(tree_oid)?;
        let sig = self.signature()?;

        let head = self
            .repo
            .head()
            .ok()
            .and_then(|h| h.target())
            .and_then(|t| self.repo.find_commit(t).ok());
        let parents: Vec<&git2::Commit> = head.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;
        Ok(Oid::new(oid.to_string())?)
    }

    /// Create or force-move a lightweight tag.
    pub fn tag(&self, name: &str, oid: &Oid, force: bool) -> Result<(), GitError> {
        let target = git2::Oid::from_str(oid.as_str()).map_err(|_| GitError::InvalidOid {
            oid: oid.to_string(),
        })?;
        let refname = format!("refs/tags/{name}");
        if !force && self.ref_exists(&refname) {
            return Err(GitError::Internal {
                message: format!("tag {name} already exists"),
            });
        }
        self.repo
            .reference(&refname, target, true, &format!("git-pkgs: tag {name}"))?;
        Ok(())
    }

    // =========================================================================
    // Remote Operations (porcelain shell-outs)
    // =========================================================================

    /// Fetch refspecs from a remote URL, returning one record per
    /// updated ref in the order the remote produced them.
    pub fn fetch(
        &self,
        url: &str,
        refspecs: &[String],
        opts: FetchOptions,
    ) -> Result<Vec<FetchUpdate>, GitError> {
        let mut args: Vec<String> = vec![
            "fetch".into(),
            "--porcelain".into(),
            "--no-write-fetch-head".into(),
        ];
        if opts.force {
            args.push("--force".into());
        }
        if opts.no_tags {
            args.push("--no-tags".into());
        }
        if opts.prune {
            args.push("--prune".into());
        }
        if let Some(depth) = opts.depth {
            args.push(format!("--depth={depth}"));
        }
        args.push(url.to_string());
        args.extend(refspecs.iter().cloned());

        let result = self.run_command(&args)?;
        if !result.success {
            return Err(GitError::RemoteFailed {
                url: url.to_string(),
                message: result.stderr.trim().to_string(),
            });
        }
        parse_fetch_porcelain(&result.stdout)
    }

    /// Fetch refspecs with this repository itself as the origin.
    pub fn fetch_local(
        &self,
        refspecs: &[String],
        opts: FetchOptions,
    ) -> Result<Vec<FetchUpdate>, GitError> {
        self.fetch(".", refspecs, opts)
    }

    /// Push refspecs to a remote URL.
    pub fn push(&self, url: &str, refspecs: &[String]) -> Result<(), GitError> {
        let mut args: Vec<String> = vec!["push".into(), url.to_string()];
        args.extend(refspecs.iter().cloned());
        let result = self.run_command(&args)?;
        if !result.success {
            return Err(GitError::RemoteFailed {
                url: url.to_string(),
                message: result.stderr.trim().to_string(),
            });
        }
        Ok(())
    }

    /// Clone `url` into `dst`. Static: runs before any repository exists.
    pub fn clone(url: &str, dst: &Path) -> Result<(), GitError> {
        let output = Command::new("git")
            .args(["clone", url])
            .arg(dst)
            .output()
            .map_err(|e| GitError::Internal {
                message: format!("failed to run git clone: {e}"),
            })?;
        if !output.status.success() {
            return Err(GitError::RemoteFailed {
                url: url.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    /// Get the URL for a remote, `None` when the remote doesn't exist.
    pub fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(String::from)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// The default remote URL: `origin` if configured, else the first
    /// remote, else `None`.
    pub fn default_remote_url(&self) -> Result<Option<String>, GitError> {
        if let Some(url) = self.remote_url("origin")? {
            return Ok(Some(url));
        }
        let remotes = self.repo.remotes()?;
        match remotes.iter().flatten().next() {
            Some(name) => self.remote_url(name),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Working Tree Operations
    // =========================================================================

    /// Check out a committish into the main working tree.
    pub fn checkout(&self, committish: &str) -> Result<(), GitError> {
        let result = self.run_command(&["checkout".into(), committish.into()])?;
        if !result.success {
            return Err(GitError::CommandFailed {
                command: "checkout".into(),
                message: result.stderr.trim().to_string(),
            });
        }
        Ok(())
    }

    /// Add a detached worktree for `oid` at `path`.
    pub fn worktree_add(&self, path: &Path, oid: &Oid, no_checkout: bool) -> Result<(), GitError> {
        let mut args: Vec<String> = vec![
            "worktree".into(),
            "add".into(),
            "--force".into(),
            "--detach".into(),
        ];
        if no_checkout {
            args.push("--no-checkout".into());
        }
        args.push(path.display().to_string());
        args.push(oid.to_string());
        let result = self.run_command(&args)?;
        if !result.success {
            return Err(GitError::CommandFailed {
                command: "worktree add".into(),
                message: result.stderr.trim().to_string(),
            });
        }
        Ok(())
    }

    /// Remove the worktree at `path`.
    pub fn worktree_remove(&self, path: &Path, force: bool) -> Result<(), GitError> {
        let mut args: Vec<String> = vec!["worktree".into(), "remove".into()];
        if force {
            args.push("--force".into());
        }
        args.push(path.display().to_string());
        let result = self.run_command(&args)?;
        if !result.success {
            return Err(GitError::CommandFailed {
                command: "worktree remove".into(),
                message: result.stderr.trim().to_string(),
            });
        }
        Ok(())
    }

    /// Prune stale worktree bookkeeping.
    pub fn worktree_prune(&self) -> Result<(), GitError> {
        let result = self.run_command(&["worktree".into(), "prune".into()])?;
        if !result.success {
            return Err(GitError::CommandFailed {
                command: "worktree prune".into(),
                message: result.stderr.trim().to_string(),
            });
        }
        Ok(())
    }

    /// `git describe --tags --always` of HEAD, empty when unborn.
    pub fn describe(&self) -> String {
        self.run_command(&[
            "describe".into(),
            "--tags".into(),
            "--always".into(),
        ])
        .ok()
        .filter(|r| r.success)
        .map(|r| r.stdout.trim().to_string())
        .unwrap_or_default()
    }

    /// Run a git command with the given arguments.
    ///
    /// Low-level escape hatch; prefer the typed methods above.
    pub fn run_command(&self, args: &[String]) -> Result<GitCommandResult, GitError> {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.work_dir())
            .output()
            .map_err(|e| GitError::Internal {
                message: format!(
                    "failed to run git {}: {e}",
                    args.first().map(String::as_str).unwrap_or_default()
                ),
            })?;

        Ok(GitCommandResult {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    fn find_commit(&self, oid: &Oid) -> Result<git2::Commit<'_>, GitError> {
        let git_oid = git2::Oid::from_str(oid.as_str()).map_err(|_| GitError::InvalidOid {
            oid: oid.to_string(),
        })?;
        self.repo
            .find_commit(git_oid)
            .map_err(|_| GitError::ObjectNotFound {
                oid: oid.to_string(),
            })
    }

    fn signature(&self) -> Result<git2::Signature<'static>, GitError> {
        self.repo
            .signature()
            .or_else(|_| git2::Signature::now("git-pkgs", "git-pkgs@localhost"))
            .map_err(Into::into)
    }
}

/// Collect files under `dir` relative to `base`, skipping `.git`.
fn collect_files(base: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if entry.file_name() == ".git" {
                continue;
            }
            collect_files(base, &path, out)?;
        } else if file_type.is_file() {
            if let Ok(rel) = path.strip_prefix(base) {
                out.push(rel.to_path_buf());
            }
        }
        // Symlinks and other specials are skipped.
    }
    Ok(())
}

#[cfg(unix)]
fn file_mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    let executable = std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false);
    if executable {
        0o100755
    } else {
        0o100644
    }
}

#[cfg(not(unix))]
fn file_mode(_path: &Path) -> u32 {
    0o100644
}

fn index_entry(path: &Path, blob: git2::Oid, mode: u32) -> git2::IndexEntry {
    git2::IndexEntry {
        ctime: git2::IndexTime::new(0, 0),
        mtime: git2::IndexTime::new(0, 0),
        dev: 0,
        ino: 0,
        mode,
        uid: 0,
        gid: 0,
        file_size: 0,
        id: blob,
        flags: 0,
        flags_extended: 0,
        path: path.to_string_lossy().replace('\\', "/").into_bytes(),
    }
}

/// Parse the output of `git fetch --porcelain`.
///
/// Each line has the form `<flag> <old-object-id> <new-object-id>
/// <local-reference>` with a single-character flag. Record order is
/// preserved.
fn parse_fetch_porcelain(output: &str) -> Result<Vec<FetchUpdate>, GitError> {
    let mut updates = Vec::new();
    for line in output.lines() {
        if line.is_empty() {
            continue;
        }
        let (flag, rest) = line.split_at(1);
        let flag = flag.chars().next().unwrap_or(' ');
        let Some(status) = FetchStatus::from_flag(flag) else {
            continue;
        };
        let mut fields = rest.trim_start().splitn(3, ' ');
        let (Some(old), Some(new), Some(local_ref)) =
            (fields.next(), fields.next(), fields.next())
        else {
            return Err(GitError::Internal {
                message: format!("malformed fetch record: {line}"),
            });
        };
        let old = Oid::new(old)?;
        let new = Oid::new(new)?;
        updates.push(FetchUpdate {
            status,
            old: (!old.is_zero()).then_some(old),
            new: (!new.is_zero()).then_some(new),
            local_ref: local_ref.to_string(),
        });
    }
    Ok(updates)
}
