//! core::context
//!
//! The immutable execution context.
//!
//! # Precedence
//!
//! Every tunable is resolved once at startup, layered in this order
//! (earlier wins):
//!
//! 1. CLI flags
//! 2. Manifest fields (`prefix`)
//! 3. Environment (`PKGS_DEFAULT_*`, `GIT_PKGS_JSON`, ...)
//! 4. Hard-coded defaults
//!
//! The resulting [`Context`] is threaded explicitly through the
//! resolver and command handlers; nothing reads the environment after
//! construction.

use crate::core::manifest::{Manifest, DEFAULT_MANIFEST_FILE};
use crate::core::strategy::{Strategy, StrategyError};
use crate::core::types::{Namespace, Revision, TypeError};

/// Environment variable naming the manifest file.
pub const ENV_MANIFEST_FILE: &str = "GIT_PKGS_JSON";
/// Default worktree prefix when neither CLI, manifest, nor environment
/// set one.
pub const ENV_DEFAULT_PREFIX: &str = "PKGS_DEFAULT_PREFIX";
/// Default revision for imports that don't name one.
pub const ENV_DEFAULT_REVISION: &str = "PKGS_DEFAULT_REVISION";
/// Default package type recorded in provenance trailers.
pub const ENV_DEFAULT_TYPE: &str = "PKGS_DEFAULT_TYPE";
/// Default conflict strategy.
pub const ENV_DEFAULT_STRATEGY: &str = "PKGS_DEFAULT_STRATEGY";
/// Constant ref suffix stripped from package names during path routing.
pub const ENV_REF_SUFFIX: &str = "PKGS_REF_SUFFIX";
/// Alternate spelling honored for the stripped ref suffix.
pub const ENV_STRIP_REF_SUFFIX: &str = "PKGS_STRIP_REF_SUFFIX";
/// Inline manifest JSON injected into directory imports.
pub const ENV_IMPORT_CONFIG_JSON: &str = "PKGS_IMPORT_CONFIG_JSON";

const DEFAULT_PREFIX: &str = "pkgs";
const DEFAULT_TYPE: &str = "pkg";

/// Errors from context construction.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// CLI-provided overrides, all optional.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub quiet: bool,
    pub manifest_file: Option<String>,
    pub prefix: Option<String>,
    pub strategy: Option<String>,
    pub namespace: Option<String>,
    pub message: Option<String>,
    pub depth: Option<u32>,
    pub all: bool,
    pub pkg_type: Option<String>,
}

/// The immutable execution context.
#[derive(Debug, Clone)]
pub struct Context {
    /// Minimal output.
    pub quiet: bool,
    /// Manifest filename relative to the working tree root.
    pub manifest_file: String,
    /// Worktree prefix for packages not matched by a `paths` pattern.
    pub prefix: String,
    /// Revision used when an import doesn't name one.
    pub default_revision: Revision,
    /// Package type recorded in provenance trailers.
    pub default_type: String,
    /// Conflict strategy for the transitive fold.
    pub strategy: Strategy,
    /// Namespace scoping this invocation's edges.
    pub namespace: Option<Namespace>,
    /// Commit message override.
    pub message: Option<String>,
    /// Shallow-fetch depth override.
    pub depth: Option<u32>,
    /// Operate on all targets where a command distinguishes.
    pub all: bool,
    /// Constant ref suffix stripped during path routing.
    pub ref_suffix: Option<String>,
    /// Inline manifest payload for directory imports.
    pub import_config_json: Option<String>,
    /// Whether interactive prompts are allowed.
    pub interactive: bool,
}

impl Context {
    /// Build the context from CLI overrides and the loaded manifest.
    pub fn build(overrides: Overrides, manifest: &Manifest) -> Result<Self, ContextError> {
        let manifest_file = overrides
            .manifest_file
            .or_else(|| env_nonempty(ENV_MANIFEST_FILE))
            .unwrap_or_else(|| DEFAULT_MANIFEST_FILE.to_string());

        let prefix = overrides
            .prefix
            .or_else(|| manifest.prefix())
            .or_else(|| env_nonempty(ENV_DEFAULT_PREFIX))
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string());

        let default_revision = match env_nonempty(ENV_DEFAULT_REVISION) {
            Some(rev) => Revision::new(rev)?,
            None => Revision::head(),
        };

        let default_type = overrides
            .pkg_type
            .or_else(|| env_nonempty(ENV_DEFAULT_TYPE))
            .unwrap_or_else(|| DEFAULT_TYPE.to_string());

        let strategy = match overrides
            .strategy
            .or_else(|| env_nonempty(ENV_DEFAULT_STRATEGY))
        {
            Some(raw) => raw.parse::<Strategy>()?,
            None => Strategy::default(),
        };

        let namespace = overrides
            .namespace
            .map(Namespace::new)
            .transpose()?;

        let ref_suffix =
            env_nonempty(ENV_STRIP_REF_SUFFIX).or_else(|| env_nonempty(ENV_REF_SUFFIX));

        let quiet = overrides.quiet;
        Ok(Self {
            quiet,
            manifest_file,
            prefix,
            default_revision,
            default_type,
            strategy,
            namespace,
            message: overrides.message,
            depth: overrides.depth,
            all: overrides.all,
            ref_suffix,
            import_config_json: env_nonempty(ENV_IMPORT_CONFIG_JSON),
            interactive: !quiet,
        })
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
