//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls the resolver (or a projection over the Git interface)
//! 3. Formats and displays output
//!
//! Handlers own manifest persistence: a handler that mutates the
//! manifest saves it before returning.

mod add;
mod add_dir;
mod checkout;
mod config_cmd;
mod json;
mod prune;
mod release;
mod releases;
mod remote;
mod remove;
mod show;
mod status;
mod tree;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::cli::args::{Cli, Command, ConfigAction};
use crate::core::context::{Context, Overrides, ENV_MANIFEST_FILE};
use crate::core::manifest::{Manifest, DEFAULT_MANIFEST_FILE};
use crate::core::strategy::{KeepExisting, PromptPolicy, Strategy, TerminalPrompt};
use crate::git::Git;

/// Everything a repository-bound command needs.
pub struct Session {
    pub git: Git,
    pub ctx: Context,
    pub manifest: Manifest,
    pub manifest_path: PathBuf,
}

impl Session {
    /// Open the repository at the current directory and build the
    /// execution context from the given overrides.
    fn open(cli: &Cli, overrides: Overrides) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to determine current directory")?;
        let git = Git::open(&cwd)?;

        let manifest_file = cli
            .config
            .clone()
            .or_else(|| std::env::var(ENV_MANIFEST_FILE).ok().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| DEFAULT_MANIFEST_FILE.to_string());
        let manifest_path = git.work_dir().join(&manifest_file);
        let manifest = Manifest::load(&manifest_path)?;

        let ctx = Context::build(overrides, &manifest)?;
        Ok(Self {
            git,
            ctx,
            manifest,
            manifest_path,
        })
    }

    /// The prompt policy for this invocation: a real terminal prompt
    /// only when the interactive strategy is active in an interactive
    /// run.
    pub fn prompt(&self) -> Box<dyn PromptPolicy> {
        if self.ctx.strategy == Strategy::Interactive && self.ctx.interactive {
            Box::new(TerminalPrompt)
        } else {
            Box::new(KeepExisting)
        }
    }
}

/// Dispatch a parsed command line.
pub fn dispatch(cli: Cli) -> Result<()> {
    let base = Overrides {
        quiet: cli.quiet,
        manifest_file: cli.config.clone(),
        prefix: cli.prefix.clone(),
        ..Default::default()
    };

    // clone bootstraps a working tree; everything else requires one.
    if let Command::Clone { url, dir } = &cli.command {
        return remote::clone(url, dir.as_deref(), base);
    }

    match cli.command {
        Command::Add {
            ref pkg,
            ref rev,
            ref url,
            ref strategy,
            ref namespace,
            depth,
            ref pkg_type,
        } => {
            let overrides = Overrides {
                strategy: strategy.clone(),
                namespace: namespace.clone(),
                depth,
                pkg_type: pkg_type.clone(),
                ..base
            };
            let mut session = Session::open(&cli, overrides)?;
            add::add(&mut session, pkg, rev.as_deref(), url.as_deref())
        }

        Command::AddDir {
            ref pkg,
            ref rev,
            ref path,
            ref namespace,
            ref pkg_name,
            ref pkg_revision,
            ref pkg_type,
            ref pkg_url,
        } => {
            let overrides = Overrides {
                namespace: namespace.clone(),
                pkg_type: pkg_type.clone(),
                ..base
            };
            let mut session = Session::open(&cli, overrides)?;
            add_dir::add_dir(
                &mut session,
                pkg_name.as_deref().unwrap_or(pkg),
                pkg_revision.as_deref().unwrap_or(rev),
                path,
                pkg_url.as_deref(),
            )
        }

        Command::Release { ref rev, ref message } => {
            let overrides = Overrides {
                message: message.clone(),
                ..base
            };
            let mut session = Session::open(&cli, overrides)?;
            release::release(&mut session, rev)
        }

        Command::Checkout { ref rev } => {
            let mut session = Session::open(&cli, base)?;
            checkout::checkout(&mut session, rev)
        }

        Command::Remove { ref pkg } => {
            let mut session = Session::open(&cli, base)?;
            remove::remove(&mut session, pkg)
        }

        Command::Tree { ref rev } => {
            let session = Session::open(&cli, base)?;
            tree::tree(&session, rev.as_deref())
        }

        Command::Status => {
            let session = Session::open(&cli, base)?;
            status::status(&session)
        }

        Command::Show { ref pkg } => {
            let session = Session::open(&cli, base)?;
            show::show(&session, pkg)
        }

        Command::LsReleases => {
            let session = Session::open(&cli, base)?;
            releases::ls_releases(&session)
        }

        Command::Fetch { ref url } => {
            let session = Session::open(&cli, base)?;
            remote::fetch(&session, url.as_deref())
        }

        Command::Push { ref url, all } => {
            let overrides = Overrides { all, ..base };
            let session = Session::open(&cli, overrides)?;
            remote::push(&session, url.as_deref())
        }

        Command::Pull { ref url } => {
            let mut session = Session::open(&cli, base)?;
            remote::pull(&mut session, url.as_deref())
        }

        Command::JsonImport { ref file, ref strategy } => {
            let overrides = Overrides {
                strategy: strategy.clone(),
                ..base
            };
            let mut session = Session::open(&cli, overrides)?;
            json::import(&mut session, file.as_deref())
        }

        Command::JsonExport => {
            let session = Session::open(&cli, base)?;
            json::export(&session)
        }

        Command::Config { ref action } => {
            let mut session = Session::open(&cli, base)?;
            match action {
                ConfigAction::Add { key, value } => config_cmd::add(&mut session, key, value),
                ConfigAction::Get { key } => config_cmd::get(&session, key),
                ConfigAction::List => config_cmd::list(&session),
            }
        }

        Command::Prune => {
            let session = Session::open(&cli, base)?;
            prune::prune(&session)
        }

        Command::Clone { .. } => unreachable!("handled before session setup"),
    }
}
