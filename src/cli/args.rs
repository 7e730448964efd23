//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! - `-q` / `--quiet`: minimal output, disables prompts
//! - `-c` / `--config <FILE>`: manifest filename override
//! - `-P` / `--prefix <DIR>`: worktree prefix override

use clap::{Parser, Subcommand};

/// git-pkgs - a decentralized, git-native package manager
#[derive(Parser, Debug)]
#[command(name = "git-pkgs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Minimal output; implies non-interactive
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Manifest filename (default: pkgs.json)
    #[arg(short = 'c', long = "config", global = true, value_name = "FILE")]
    pub config: Option<String>,

    /// Worktree prefix for unrouted packages
    #[arg(short = 'P', long, global = true, value_name = "DIR")]
    pub prefix: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import a package revision from a git URL
    Add {
        /// Package name
        pkg: String,

        /// Revision to import (default: HEAD)
        rev: Option<String>,

        /// Origin URL (reused from a previous import when omitted)
        url: Option<String>,

        /// Conflict strategy: max, min, keep, update, interactive
        #[arg(short, long)]
        strategy: Option<String>,

        /// Namespace to scope the edge to (e.g. dev)
        #[arg(short, long)]
        namespace: Option<String>,

        /// Shallow-fetch depth for the revision import
        #[arg(long)]
        depth: Option<u32>,

        /// Package type recorded in provenance
        #[arg(long = "pkg-type", value_name = "TYPE")]
        pkg_type: Option<String>,
    },

    /// Import a local directory as a package revision
    #[command(name = "add-dir")]
    AddDir {
        /// Package name
        pkg: String,

        /// Revision to record
        rev: String,

        /// Directory to import
        path: String,

        /// Namespace to scope the edge to
        #[arg(short, long)]
        namespace: Option<String>,

        /// Override the recorded package name
        #[arg(long = "pkg-name", value_name = "NAME")]
        pkg_name: Option<String>,

        /// Override the recorded revision
        #[arg(long = "pkg-revision", value_name = "REV")]
        pkg_revision: Option<String>,

        /// Package type recorded in provenance
        #[arg(long = "pkg-type", value_name = "TYPE")]
        pkg_type: Option<String>,

        /// Override the recorded URL (default: the directory path)
        #[arg(long = "pkg-url", value_name = "URL")]
        pkg_url: Option<String>,
    },

    /// Freeze HEAD as a release snapshot and tag it
    Release {
        /// Release revision (becomes the manifest version and the tag)
        rev: String,

        /// Commit message for the release
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Switch to a release snapshot (or re-materialize HEAD)
    Checkout {
        /// Snapshot revision, or HEAD
        rev: String,
    },

    /// Remove a direct dependency
    Remove {
        /// Package name
        pkg: String,
    },

    /// Display the dependency tree
    Tree {
        /// Revision to display (default: HEAD)
        rev: Option<String>,
    },

    /// Show the active dependency graph
    Status,

    /// Show provenance of an imported package
    Show {
        /// Package name
        pkg: String,
    },

    /// List release snapshots
    #[command(name = "ls-releases")]
    LsReleases,

    /// Fetch package refs from a remote
    Fetch {
        /// Remote URL (default: origin)
        url: Option<String>,
    },

    /// Push HEAD, the release tag, and all package refs
    Push {
        /// Remote URL (default: origin)
        url: Option<String>,

        /// Push all tags instead of just the current release
        #[arg(long)]
        all: bool,
    },

    /// Fetch package refs and re-materialize the working tree
    Pull {
        /// Remote URL (default: origin)
        url: Option<String>,
    },

    /// Clone a package repository and check out its graph
    Clone {
        /// Source URL
        url: String,

        /// Destination directory (default: derived from the URL)
        dir: Option<String>,
    },

    /// Replay `add` for every package in a JSON document
    #[command(name = "json-import")]
    JsonImport {
        /// Input file (default: stdin)
        file: Option<String>,

        /// Conflict strategy: max, min, keep, update, interactive
        #[arg(short, long)]
        strategy: Option<String>,
    },

    /// Export the active graph as JSON
    #[command(name = "json-export")]
    JsonExport,

    /// Read or write manifest configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Delete imported namespaces nothing references
    Prune,
}

/// Manifest configuration actions.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Set a configuration value (dotted key)
    Add {
        /// Dotted key, e.g. `name` or `config.flag`
        key: String,
        /// Value; `true`/`false` are stored as booleans
        value: String,
    },

    /// Print a configuration value
    Get {
        /// Dotted key
        key: String,
    },

    /// Print the canonical manifest
    List,
}
