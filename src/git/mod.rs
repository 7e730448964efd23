//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! All Git interactions flow through [`interface::Git`], which provides
//! structured results and normalizes errors into typed failure
//! categories. [`orphan`] builds the parentless provenance commits the
//! ref namespace is made of, and [`trailers`] owns the `git-pkgs-*`
//! trailer format.

pub mod interface;
pub mod orphan;
pub mod trailers;

pub use interface::{
    CommitInfo, FetchOptions, FetchStatus, FetchUpdate, Git, GitCommandResult, GitError, RefEntry,
};
pub use trailers::Provenance;
