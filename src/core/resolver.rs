//! core::resolver
//!
//! The graph resolver: every state transition over the ref namespace.
//!
//! # Model
//!
//! The root package's dependency graph is the set of refs under
//! `refs/pkgs/<R>/HEAD/`. Each imported package revision carries its
//! own complete frozen graph under `refs/pkgs/<pkg>/<rev>/`, so
//! reconciling an added or removed edge only ever merges **one level**:
//! the dependency's namespace is folded into HEAD, record by record, in
//! the order the underlying ref-update stream produces them.
//!
//! Conflicts between an existing HEAD edge and an incoming edge are
//! decided by the active [`Strategy`]; the resolver prints one
//! `[add]`/`[update]`/`[keep]` line per decision.
//!
//! # Idempotence
//!
//! `add` of an already-imported `(pkg, rev)` skips orphanization and
//! folds to all-keep decisions, so interrupted runs can simply be
//! re-run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::context::Context;
use crate::core::manifest::{Manifest, ManifestError};
use crate::core::refs::{self, PkgRef};
use crate::core::router::PathRouter;
use crate::core::strategy::{self, Choice, PromptPolicy};
use crate::core::types::{Namespace, Oid, PkgName, Revision, TypeError};
use crate::git::interface::{FetchOptions, FetchStatus, FetchUpdate, Git, GitError};
use crate::git::orphan;
use crate::git::trailers::Provenance;
use crate::ui::output;

/// Errors from resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The root package name is unset.
    #[error("package name is not set; run 'git pkgs config add name <name>' first")]
    NoPkgName,

    /// No URL given and none recorded for the package.
    #[error("no url known for '{pkg}'; pass one explicitly")]
    NoUrl {
        /// The package missing a URL
        pkg: String,
    },

    /// A ref that must exist is absent.
    #[error("ref not found: {refname}")]
    RefMissing {
        /// The missing ref
        refname: String,
    },

    /// `remove` was asked to drop a transitive dependency.
    #[error("'{pkg}' is not a direct dependency; remove the package that pulls it in")]
    NotDirectDep {
        /// The package that was requested
        pkg: String,
    },

    /// Git operation failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// Manifest operation failed.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Invalid name or revision encountered.
    #[error(transparent)]
    Type(#[from] TypeError),
}

/// An active edge in the root's HEAD namespace.
#[derive(Debug, Clone)]
pub struct HeadEdge {
    /// Full ref name of the edge.
    pub refname: String,
    /// The orphan commit the edge points at.
    pub oid: Oid,
    /// Package name, read from the commit's trailers.
    pub name: PkgName,
    /// Imported revision, read from the commit's trailers.
    pub revision: Revision,
    /// Namespace segment of the edge, when scoped.
    pub namespace: Option<Namespace>,
    /// Full provenance of the orphan.
    pub provenance: Provenance,
}

/// The graph resolver.
///
/// Borrows the Git interface, the immutable context, and the prompt
/// policy; holds no state of its own.
pub struct Resolver<'a> {
    git: &'a Git,
    ctx: &'a Context,
    prompt: &'a dyn PromptPolicy,
}

impl<'a> Resolver<'a> {
    /// Create a resolver.
    pub fn new(git: &'a Git, ctx: &'a Context, prompt: &'a dyn PromptPolicy) -> Self {
        Self { git, ctx, prompt }
    }

    /// The root package name, required by every graph mutation.
    pub fn root(&self, manifest: &Manifest) -> Result<PkgName, ResolveError> {
        manifest.name().ok_or(ResolveError::NoPkgName)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Enumerate the edges of a namespace (HEAD or a snapshot).
    ///
    /// Edges whose commits carry no readable provenance are skipped.
    pub fn edges_under(&self, prefix: &str) -> Result<Vec<HeadEdge>, ResolveError> {
        let mut edges = Vec::new();
        for entry in self.git.list_refs_by_prefix(prefix)? {
            let Some(provenance) = self.git.commit_provenance(&entry.oid)? else {
                continue;
            };
            let namespace = refs::parse_edge(&entry.name, prefix, provenance.name.as_str())
                .and_then(|parsed| parsed.namespace);
            edges.push(HeadEdge {
                refname: entry.name,
                oid: entry.oid,
                name: provenance.name.clone(),
                revision: provenance.revision.clone(),
                namespace,
                provenance,
            });
        }
        Ok(edges)
    }

    /// Enumerate the root's active HEAD edges.
    pub fn head_edges(&self, root: &PkgName) -> Result<Vec<HeadEdge>, ResolveError> {
        self.edges_under(&PkgRef::head_prefix(root))
    }

    /// Find the HEAD edge for `pkg`, in any namespace.
    pub fn find_head_edge(
        &self,
        root: &PkgName,
        pkg: &PkgName,
    ) -> Result<Option<HeadEdge>, ResolveError> {
        Ok(self
            .head_edges(root)?
            .into_iter()
            .find(|edge| &edge.name == pkg))
    }

    /// List release snapshot revisions, version-sorted.
    pub fn releases(&self, root: &PkgName) -> Result<Vec<Revision>, ResolveError> {
        let base = format!("{}/{}/", refs::REF_BASE, root);
        let mut seen = HashSet::new();
        let mut revisions = Vec::new();
        for entry in self.git.list_refs_by_prefix(&base)? {
            let Some(rest) = entry.name.strip_prefix(&base) else {
                continue;
            };
            let Some((rev, _)) = rest.split_once('/') else {
                continue;
            };
            if rev == crate::core::types::HEAD_REVISION {
                continue;
            }
            if let Ok(rev) = Revision::new(rev) {
                if seen.insert(rev.clone()) {
                    revisions.push(rev);
                }
            }
        }
        revisions.sort_by(|a, b| a.version_cmp(b));
        Ok(revisions)
    }

    // =========================================================================
    // add
    // =========================================================================

    /// Import `pkg@rev` from `url` and fold its graph into HEAD.
    ///
    /// When `url` is `None` the URL recorded by a previous import of the
    /// package is reused.
    pub fn add(
        &self,
        manifest: &mut Manifest,
        pkg: &PkgName,
        rev: &Revision,
        url: Option<&str>,
    ) -> Result<(), ResolveError> {
        let root = self.root(manifest)?;
        let url = match url {
            Some(url) => url.to_string(),
            None => self.known_url(&root, pkg)?,
        };

        // Pull the package's own frozen graph into our namespace.
        let namespace_spec = format!(
            "+{prefix}*:{prefix}*",
            prefix = PkgRef::pkg_prefix(pkg, rev)
        );
        self.git.fetch(
            &url,
            &[namespace_spec],
            FetchOptions {
                force: true,
                no_tags: true,
                ..Default::default()
            },
        )?;

        self.import_orphan(pkg, rev, &url)?;

        manifest.add_dep(pkg, rev, self.ctx.namespace.as_ref());
        self.fold_namespace(manifest, &root, pkg, rev, self.ctx.namespace.clone())?;
        Ok(())
    }

    /// Ensure `refs/pkgs/<pkg>/<rev>/<pkg>` names a provenance orphan,
    /// shallow-fetching the revision when needed.
    fn import_orphan(
        &self,
        pkg: &PkgName,
        rev: &Revision,
        url: &str,
    ) -> Result<Oid, ResolveError> {
        let orphan_ref = PkgRef::pkg_orphan(pkg, rev);

        if let Some(oid) = self.git.try_resolve_ref(orphan_ref.as_str())? {
            let info = self.git.commit_info(&oid)?;
            if info.parent_count == 0 {
                if let Some(provenance) = self.git.commit_provenance(&oid)? {
                    if provenance.revision == *rev {
                        // Already imported; refresh the latest-import pointer.
                        self.git.update_ref(
                            PkgRef::pkg_head(pkg).as_str(),
                            &oid,
                            "git-pkgs: import",
                        )?;
                        return Ok(oid);
                    }
                }
            }
        }

        // Acquire just the revision's tree, not upstream history.
        self.git.fetch(
            url,
            &[format!("+{}:{}", rev, orphan_ref.as_str())],
            FetchOptions {
                depth: Some(self.ctx.depth.unwrap_or(1)),
                force: true,
                no_tags: true,
                ..Default::default()
            },
        )?;
        let origin = self.git.resolve_ref(orphan_ref.as_str())?;

        let provenance = Provenance {
            name: pkg.clone(),
            pkg_type: self.ctx.default_type.clone(),
            revision: rev.clone(),
            commit: Some(origin),
            url: url.to_string(),
        };
        let oid = orphan::orphanize(self.git, orphan_ref.as_str(), &provenance)?;
        self.git
            .update_ref(PkgRef::pkg_head(pkg).as_str(), &oid, "git-pkgs: import")?;
        Ok(oid)
    }

    /// The URL recorded by a previous import of `pkg`, if any.
    fn known_url(&self, root: &PkgName, pkg: &PkgName) -> Result<String, ResolveError> {
        if let Some(edge) = self.find_head_edge(root, pkg)? {
            if !edge.provenance.url.is_empty() {
                return Ok(edge.provenance.url);
            }
        }
        let head_ref = PkgRef::pkg_head(pkg);
        if let Some(oid) = self.git.try_resolve_ref(head_ref.as_str())? {
            if let Some(provenance) = self.git.commit_provenance(&oid)? {
                if !provenance.url.is_empty() {
                    return Ok(provenance.url);
                }
            }
        }
        Err(ResolveError::NoUrl {
            pkg: pkg.to_string(),
        })
    }

    // =========================================================================
    // add-dir
    // =========================================================================

    /// Import a local directory as `pkg@rev` and attach it to the graph.
    ///
    /// The directory is snapshotted through an ephemeral index; its
    /// working copy is never touched. An inline manifest payload from
    /// the context, when present, is injected into the tree so
    /// ecosystem importers can declare a dependency structure the
    /// source tree doesn't carry. Transitive edges are published only
    /// for dependencies already registered as refs.
    pub fn add_dir(
        &self,
        manifest: &mut Manifest,
        pkg: &PkgName,
        rev: &Revision,
        dir: &Path,
        url_override: Option<&str>,
    ) -> Result<(), ResolveError> {
        let root = self.root(manifest)?;

        let mut extra_blobs = Vec::new();
        let synthetic = match &self.ctx.import_config_json {
            Some(json) => {
                let synthetic = Manifest::from_json(json).map_err(|message| {
                    ManifestError::Invalid {
                        path: PathBuf::from("<inline import config>"),
                        message,
                    }
                })?;
                extra_blobs.push((
                    self.ctx.manifest_file.clone(),
                    synthetic.to_canonical_json().into_bytes(),
                ));
                Some(synthetic)
            }
            None => None,
        };

        let tree = self.git.write_tree_from_dir(dir, &extra_blobs)?;
        let url = url_override
            .map(str::to_string)
            .unwrap_or_else(|| dir.display().to_string());
        let provenance = Provenance {
            name: pkg.clone(),
            pkg_type: self.ctx.default_type.clone(),
            revision: rev.clone(),
            commit: Some(tree.clone()),
            url,
        };
        let oid = orphan::orphan_from_tree(
            self.git,
            &tree,
            &format!("Import {pkg} {rev}"),
            &provenance,
        )?;

        self.git
            .update_ref(PkgRef::pkg_orphan(pkg, rev).as_str(), &oid, "git-pkgs: import")?;
        self.git
            .update_ref(PkgRef::pkg_head(pkg).as_str(), &oid, "git-pkgs: import")?;

        // Publish transitive edges for dependencies that already exist
        // as refs; the rest wait until the caller registers them.
        if let Some(synthetic) = synthetic {
            for (key, dep_rev) in synthetic.dependencies() {
                let source = PkgRef::pkg_orphan(&key.name, &dep_rev);
                if let Some(dep_oid) = self.git.try_resolve_ref(source.as_str())? {
                    self.git.update_ref(
                        PkgRef::pkg_transitive(pkg, rev, key.name.as_str()).as_str(),
                        &dep_oid,
                        "git-pkgs: import",
                    )?;
                } else {
                    self.warn(format!(
                        "{}@{} referenced by {} is not registered; skipping",
                        key.name, dep_rev, pkg
                    ));
                }
            }
        }

        manifest.add_dep(pkg, rev, self.ctx.namespace.as_ref());
        self.fold_namespace(manifest, &root, pkg, rev, self.ctx.namespace.clone())?;
        Ok(())
    }

    // =========================================================================
    // Transitive fold
    // =========================================================================

    /// Fold every edge declared by `pkg@rev` into the root's HEAD
    /// namespace under `ns`, applying the conflict strategy.
    fn fold_namespace(
        &self,
        manifest: &Manifest,
        root: &PkgName,
        pkg: &PkgName,
        rev: &Revision,
        ns: Option<Namespace>,
    ) -> Result<(), ResolveError> {
        let prefix = PkgRef::pkg_prefix(pkg, rev);
        let mut refspecs = Vec::new();
        for entry in self.git.list_refs_by_prefix(&prefix)? {
            let Some(dep) = refs::edge_suffix(&entry.name, &prefix) else {
                continue;
            };
            let dep = PkgName::new(dep)?;
            let target = PkgRef::root_head(root, ns.as_ref(), &dep);
            refspecs.push(format!("+{}:{}", entry.name, target.as_str()));
        }
        if refspecs.is_empty() {
            return Ok(());
        }

        let updates = self.git.fetch_local(
            &refspecs,
            FetchOptions {
                force: true,
                no_tags: true,
                ..Default::default()
            },
        )?;
        self.apply_updates(manifest, root, &updates)
    }

    /// Apply conflict resolution to a stream of porcelain fetch records,
    /// in the order the store produced them.
    fn apply_updates(
        &self,
        manifest: &Manifest,
        root: &PkgName,
        updates: &[FetchUpdate],
    ) -> Result<(), ResolveError> {
        let head_prefix = PkgRef::head_prefix(root);
        for update in updates {
            match update.status {
                FetchStatus::Rejected | FetchStatus::Pruned => continue,
                _ => {}
            }
            let Some(new) = &update.new else {
                continue;
            };
            let Some(incoming) = self.git.commit_provenance(new)? else {
                self.warn(format!(
                    "{} has no provenance trailers; reverting",
                    update.local_ref
                ));
                self.restore(update)?;
                continue;
            };

            // Self-reference back to the root: never an edge.
            if incoming.name == *root {
                self.restore(update)?;
                continue;
            }

            let namespace = refs::parse_edge(&update.local_ref, &head_prefix, incoming.name.as_str())
                .and_then(|parsed| parsed.namespace);

            let existing = match &update.old {
                Some(old) => self.git.commit_provenance(old)?,
                None => None,
            };
            let existing_rev = existing.as_ref().map(|p| p.revision.clone());

            // Same revision from a different parent's snapshot: keep
            // what we have and say so.
            if let (Some(old), Some(existing_rev)) = (&update.old, &existing_rev) {
                if existing_rev == &incoming.revision && old != new {
                    self.warn(format!(
                        "two snapshots exist for {}@{} ({} and {}); keeping the current one",
                        incoming.name,
                        incoming.revision,
                        old.short(7),
                        new.short(7),
                    ));
                    self.restore(update)?;
                    self.say(format!("[keep] {}@{}", incoming.name, existing_rev));
                    continue;
                }
            }

            let choice = strategy::pick(
                self.ctx.strategy,
                existing_rev.as_ref(),
                &incoming.revision,
                incoming.name.as_str(),
                self.prompt,
            );

            match choice {
                Choice::Existing => {
                    self.restore(update)?;
                    let kept = existing_rev.unwrap_or_else(|| incoming.revision.clone());
                    self.say(format!("[keep] {}@{}", incoming.name, kept));
                }
                Choice::Incoming => {
                    let verb = if update.old.is_some() { "update" } else { "add" };
                    self.say(format!("[{verb}] {}@{}", incoming.name, incoming.revision));
                    self.materialize(manifest, &incoming.name, namespace.as_ref(), new)?;
                }
            }
        }
        Ok(())
    }

    /// Undo one porcelain update: restore the old value, or delete the
    /// ref when it didn't exist before.
    fn restore(&self, update: &FetchUpdate) -> Result<(), ResolveError> {
        match &update.old {
            Some(old) => {
                self.git
                    .update_ref(&update.local_ref, old, "git-pkgs: keep existing")?;
            }
            None => {
                if self.git.ref_exists(&update.local_ref) {
                    self.git.delete_ref(&update.local_ref)?;
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // remove
    // =========================================================================

    /// Remove the direct dependency `pkg`, re-resolving transitive
    /// edges that other direct dependencies still declare.
    pub fn remove(&self, manifest: &mut Manifest, pkg: &PkgName) -> Result<(), ResolveError> {
        let root = self.root(manifest)?;
        let edge = self.find_head_edge(&root, pkg)?.ok_or_else(|| {
            ResolveError::RefMissing {
                refname: PkgRef::root_head(&root, None, pkg).to_string(),
            }
        })?;

        if !self.is_direct(pkg, &edge.oid)? {
            return Err(ResolveError::NotDirectDep {
                pkg: pkg.to_string(),
            });
        }

        // Tear down every HEAD edge this package's namespace declared.
        let declared = self
            .git
            .list_refs_by_prefix(&PkgRef::pkg_prefix(pkg, &edge.revision))?;
        let mut removed: Vec<(PkgName, Option<Namespace>)> = Vec::new();
        for entry in declared {
            let Some(provenance) = self.git.commit_provenance(&entry.oid)? else {
                continue;
            };
            let Some(target) = self.find_head_edge(&root, &provenance.name)? else {
                continue;
            };
            self.teardown(manifest, &target.name, target.namespace.as_ref())?;
            self.git.delete_ref(&target.refname)?;
            self.say(format!("[remove] {}@{}", target.name, target.revision));
            if target.name != *pkg {
                removed.push((target.name, target.namespace));
            }
        }

        // Restore edges still declared by the remaining direct deps.
        manifest.remove_dep(pkg, edge.namespace.as_ref());
        for (q, q_ns) in removed {
            for (key, parent_rev) in manifest.dependencies() {
                let candidate = PkgRef::pkg_transitive(&key.name, &parent_rev, q.as_str());
                if !self.git.ref_exists(candidate.as_str()) {
                    continue;
                }
                let target = PkgRef::root_head(&root, q_ns.as_ref(), &q);
                let updates = self.git.fetch_local(
                    &[format!("+{}:{}", candidate.as_str(), target.as_str())],
                    FetchOptions {
                        force: true,
                        no_tags: true,
                        ..Default::default()
                    },
                )?;
                self.apply_updates(manifest, &root, &updates)?;
            }
        }

        self.git.worktree_prune()?;
        Ok(())
    }

    /// A package is direct when one of its own namespaces names the
    /// exact commit its HEAD edge points at.
    fn is_direct(&self, pkg: &PkgName, head_oid: &Oid) -> Result<bool, ResolveError> {
        let base = format!("{}/{}/", refs::REF_BASE, pkg);
        for entry in self.git.list_refs_by_prefix(&base)? {
            if entry.oid != *head_oid {
                continue;
            }
            let Some(rest) = entry.name.strip_prefix(&base) else {
                continue;
            };
            let Some((_rev, leaf)) = rest.split_once('/') else {
                continue;
            };
            if leaf == pkg.as_str() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // =========================================================================
    // release
    // =========================================================================

    /// Freeze HEAD as the release snapshot `rev`.
    pub fn release(&self, manifest: &mut Manifest, rev: &Revision) -> Result<(), ResolveError> {
        let root = self.root(manifest)?;
        let work_dir = self.git.work_dir();

        manifest.set("version", rev.as_str())?;
        manifest.save(&work_dir.join(&self.ctx.manifest_file))?;

        let url = self
            .git
            .default_remote_url()?
            .unwrap_or_else(|| work_dir.display().to_string());
        let provenance = Provenance {
            name: root.clone(),
            pkg_type: self.ctx.default_type.clone(),
            revision: rev.clone(),
            commit: None,
            url: url.clone(),
        };
        let subject = self
            .ctx
            .message
            .clone()
            .unwrap_or_else(|| format!("Release {rev}"));
        let message =
            crate::git::trailers::append(&subject, &provenance.to_pairs());
        let commit = self
            .git
            .commit_paths(&[Path::new(&self.ctx.manifest_file)], &message)?;
        self.git.tag(rev.as_str(), &commit, true)?;

        // Copy the HEAD namespace pointwise into the snapshot.
        let head_prefix = PkgRef::head_prefix(&root);
        let snapshot_prefix = PkgRef::snapshot_prefix(&root, rev);
        for entry in self.git.list_refs_by_prefix(&head_prefix)? {
            let Some(suffix) = refs::edge_suffix(&entry.name, &head_prefix) else {
                continue;
            };
            self.git.update_ref(
                &format!("{snapshot_prefix}{suffix}"),
                &entry.oid,
                "git-pkgs: release",
            )?;
        }

        // The root's own entry: the tagged commit, orphanized like any
        // dependency, then mirrored into HEAD.
        let root_entry = PkgRef::root_snapshot(&root, rev, None, &root);
        self.git
            .update_ref(root_entry.as_str(), &commit, "git-pkgs: release")?;
        let root_provenance = Provenance {
            commit: Some(commit),
            ..provenance
        };
        let orphaned = orphan::orphanize(self.git, root_entry.as_str(), &root_provenance)?;
        self.git.update_ref(
            PkgRef::root_head(&root, None, &root).as_str(),
            &orphaned,
            "git-pkgs: release",
        )?;

        self.say(format!("[release] {root}@{rev}"));
        Ok(())
    }

    // =========================================================================
    // checkout
    // =========================================================================

    /// Switch the repository to release `rev`, re-materializing every
    /// worktree. Returns the manifest active after the switch.
    pub fn checkout(
        &self,
        manifest: &Manifest,
        rev: &Revision,
    ) -> Result<Manifest, ResolveError> {
        let root = self.root(manifest)?;
        let work_dir = self.git.work_dir();

        if !rev.is_head() {
            let snapshot_prefix = PkgRef::snapshot_prefix(&root, rev);
            if self.git.list_refs_by_prefix(&snapshot_prefix)?.is_empty() {
                return Err(ResolveError::RefMissing {
                    refname: snapshot_prefix,
                });
            }

            // Routing for teardown must use the outgoing manifest, so
            // collect the current edges before the tree changes.
            let outgoing = self.head_edges(&root)?;

            self.git.checkout(rev.as_str())?;

            for edge in &outgoing {
                if edge.name == root {
                    continue;
                }
                self.teardown(manifest, &edge.name, edge.namespace.as_ref())?;
            }
            for entry in self.git.list_refs_by_prefix(&PkgRef::head_prefix(&root))? {
                self.git.delete_ref(&entry.name)?;
            }

            self.git.fetch_local(
                &[format!(
                    "+{}*:{}*",
                    PkgRef::snapshot_prefix(&root, rev),
                    PkgRef::head_prefix(&root)
                )],
                FetchOptions {
                    force: true,
                    no_tags: true,
                    prune: true,
                    ..Default::default()
                },
            )?;
        }

        let incoming = Manifest::load(&work_dir.join(&self.ctx.manifest_file))?;
        for edge in self.head_edges(&root)? {
            if edge.name == root {
                continue;
            }
            self.materialize_reusing(&incoming, &edge.name, edge.namespace.as_ref(), &edge.oid)?;
        }
        self.git.worktree_prune()?;
        Ok(incoming)
    }

    // =========================================================================
    // prune
    // =========================================================================

    /// Delete imported namespaces no snapshot or HEAD edge references.
    ///
    /// Keeps every `(pkg, rev)` whose orphan is named under the root's
    /// namespace, plus anything a kept namespace still declares, plus
    /// latest-import pointers. Returns the pruned `(pkg, rev)` pairs.
    pub fn prune(&self, manifest: &Manifest) -> Result<Vec<(PkgName, Revision)>, ResolveError> {
        let root = self.root(manifest)?;
        let root_base = format!("{}/{}/", refs::REF_BASE, root);

        let mut referenced: HashSet<Oid> = self
            .git
            .list_refs_by_prefix(&root_base)?
            .into_iter()
            .map(|entry| entry.oid)
            .collect();

        // Candidate namespaces: every (pkg, rev) self-entry outside the
        // root's namespace, HEAD pointers excluded.
        let mut candidates: Vec<(PkgName, Revision, Oid)> = Vec::new();
        for entry in self.git.list_refs_by_prefix(&format!("{}/", refs::REF_BASE))? {
            if entry.name.starts_with(&root_base) {
                continue;
            }
            let Some(provenance) = self.git.commit_provenance(&entry.oid)? else {
                continue;
            };
            if provenance.revision.is_head() {
                continue;
            }
            let self_entry = PkgRef::pkg_orphan(&provenance.name, &provenance.revision);
            if entry.name != self_entry.as_str() {
                continue;
            }
            candidates.push((provenance.name, provenance.revision, entry.oid));
        }

        // Grow the kept set to a fixpoint: a kept namespace keeps
        // everything it declares.
        loop {
            let mut grew = false;
            for (pkg, rev, oid) in &candidates {
                if !referenced.contains(oid) {
                    continue;
                }
                for entry in self
                    .git
                    .list_refs_by_prefix(&PkgRef::pkg_prefix(pkg, rev))?
                {
                    if referenced.insert(entry.oid) {
                        grew = true;
                    }
                }
            }
            if !grew {
                break;
            }
        }

        let mut pruned = Vec::new();
        for (pkg, rev, oid) in candidates {
            if referenced.contains(&oid) {
                continue;
            }
            for entry in self
                .git
                .list_refs_by_prefix(&PkgRef::pkg_prefix(&pkg, &rev))?
            {
                self.git.delete_ref(&entry.name)?;
            }
            self.say(format!("[prune] {pkg}@{rev}"));
            pruned.push((pkg, rev));
        }
        Ok(pruned)
    }

    // =========================================================================
    // Worktree materialization
    // =========================================================================

    fn router<'m>(&'m self, paths: &'m [(String, String)]) -> PathRouter<'m> {
        PathRouter::new(&self.ctx.prefix, paths, self.ctx.ref_suffix.as_deref())
    }

    /// Create (or re-create) the worktree for an edge.
    fn materialize(
        &self,
        manifest: &Manifest,
        pkg: &PkgName,
        ns: Option<&Namespace>,
        oid: &Oid,
    ) -> Result<(), ResolveError> {
        let paths = manifest.paths();
        let Some(rel) = self.router(&paths).route(pkg, ns) else {
            return Ok(());
        };
        let abs = self.git.work_dir().join(rel);
        if abs.exists() {
            let _ = self.git.worktree_remove(&abs, true);
            if abs.exists() {
                std::fs::remove_dir_all(&abs).map_err(|e| GitError::Internal {
                    message: format!("failed to clear {}: {e}", abs.display()),
                })?;
            }
        }
        self.git.worktree_add(&abs, oid, false)?;
        Ok(())
    }

    /// Materialize an edge, reusing an existing directory when present.
    fn materialize_reusing(
        &self,
        manifest: &Manifest,
        pkg: &PkgName,
        ns: Option<&Namespace>,
        oid: &Oid,
    ) -> Result<(), ResolveError> {
        let paths = manifest.paths();
        let Some(rel) = self.router(&paths).route(pkg, ns) else {
            return Ok(());
        };
        let abs = self.git.work_dir().join(rel);
        if abs.exists() {
            return Ok(());
        }
        self.git.worktree_add(&abs, oid, false)?;
        Ok(())
    }

    /// Remove the worktree for an edge, tolerating a missing directory.
    fn teardown(
        &self,
        manifest: &Manifest,
        pkg: &PkgName,
        ns: Option<&Namespace>,
    ) -> Result<(), ResolveError> {
        let paths = manifest.paths();
        let Some(rel) = self.router(&paths).route(pkg, ns) else {
            return Ok(());
        };
        let abs = self.git.work_dir().join(rel);
        if !abs.exists() {
            return Ok(());
        }
        if self.git.worktree_remove(&abs, true).is_err() && abs.exists() {
            std::fs::remove_dir_all(&abs).map_err(|e| GitError::Internal {
                message: format!("failed to clear {}: {e}", abs.display()),
            })?;
        }
        Ok(())
    }

    // =========================================================================
    // Output
    // =========================================================================

    fn say(&self, line: String) {
        output::print(line, output::Verbosity::from_quiet(self.ctx.quiet));
    }

    fn warn(&self, line: String) {
        output::warn(line, output::Verbosity::from_quiet(self.ctx.quiet));
    }
}
