//! git-pkgs - A decentralized, git-native package manager
//!
//! git-pkgs turns any git repository into its own package registry. Release
//! snapshots, dependency edges, and per-package provenance live in the
//! `refs/pkgs/` namespace of the repository itself, alongside a `pkgs.json`
//! manifest committed into the working tree. Dependencies are imported from
//! remote git URLs, frozen as parentless orphan commits, and shared with
//! plain `git push` / `git fetch` - no central server involved.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to core)
//! - [`core`] - Domain types, manifest, path routing, and the graph resolver
//! - [`git`] - Single interface for all Git operations
//! - [`ui`] - Output formatting and the tree renderer
//!
//! # Correctness Invariants
//!
//! git-pkgs maintains the following invariants:
//!
//! 1. Every ref `refs/pkgs/<p>/<r>/<p>` names a parentless commit whose
//!    trailers record `<p>` and `<r>`
//! 2. Release snapshots are pointwise copies of the HEAD namespace
//! 3. The manifest's `dependencies` keys equal the direct edges in HEAD
//! 4. Repeated imports of the same `(pkg, rev)` converge (idempotence)

pub mod cli;
pub mod core;
pub mod git;
pub mod ui;
