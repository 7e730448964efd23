//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Gate on the minimum supported git version
//! - Delegate to command handlers
//!
//! The CLI layer is thin: it parses arguments via clap and dispatches
//! to handlers, which drive the resolver. All graph mutations live in
//! [`crate::core::resolver`].

pub mod args;
pub mod commands;

pub use args::Cli;

use anyhow::Result;

use crate::git::Git;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    Git::check_version()?;
    commands::dispatch(cli)
}
