//! End-to-end resolver tests over real git repositories.
//!
//! Each test builds a small universe of package origin repositories
//! with tempfile, drives the resolver through the library API, and
//! asserts on the resulting HEAD edge sets, manifests, and worktrees.

use std::collections::BTreeSet;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use git_pkgs::core::context::{Context, Overrides};
use git_pkgs::core::manifest::Manifest;
use git_pkgs::core::refs::PkgRef;
use git_pkgs::core::resolver::Resolver;
use git_pkgs::core::strategy::KeepExisting;
use git_pkgs::core::types::{PkgName, Revision};
use git_pkgs::git::Git;

/// Run a git command in the given directory, panicking on failure.
fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed to spawn");
    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

/// A git-pkgs-enabled repository rooted in a temp directory.
struct PkgRepo {
    dir: TempDir,
    name: String,
}

impl PkgRepo {
    /// Initialize a repository owning package `name`, with one commit.
    fn init(name: &str) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        run_git(dir.path(), &["init", "-b", "main"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);

        std::fs::write(dir.path().join("README.md"), format!("# {name}\n")).unwrap();
        run_git(dir.path(), &["add", "README.md"]);
        run_git(dir.path(), &["commit", "-m", "Initial commit"]);

        let mut manifest = Manifest::default();
        manifest.set("name", name).unwrap();
        manifest.save(&dir.path().join("pkgs.json")).unwrap();

        Self {
            dir,
            name: name.to_string(),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The repository path as a fetchable URL.
    fn url(&self) -> String {
        self.path().display().to_string()
    }

    fn git(&self) -> Git {
        Git::open(self.path()).expect("failed to open test repo")
    }

    fn manifest(&self) -> Manifest {
        Manifest::load(&self.path().join("pkgs.json")).unwrap()
    }

    /// Run one resolver operation with a fresh context and persist the
    /// manifest afterwards.
    fn with_resolver<R>(
        &self,
        overrides: Overrides,
        op: impl FnOnce(&Resolver<'_>, &mut Manifest) -> R,
    ) -> R {
        let git = self.git();
        let mut manifest = self.manifest();
        let ctx = Context::build(overrides, &manifest).unwrap();
        let resolver = Resolver::new(&git, &ctx, &KeepExisting);
        let result = op(&resolver, &mut manifest);
        manifest.save(&self.path().join("pkgs.json")).unwrap();
        result
    }

    fn quiet() -> Overrides {
        Overrides {
            quiet: true,
            ..Default::default()
        }
    }

    fn add(&self, pkg: &str, rev: &str, url: &str) {
        self.with_resolver(Self::quiet(), |resolver, manifest| {
            resolver
                .add(
                    manifest,
                    &PkgName::new(pkg).unwrap(),
                    &Revision::new(rev).unwrap(),
                    Some(url),
                )
                .unwrap_or_else(|e| panic!("add {pkg}@{rev} failed: {e}"));
        });
    }

    fn add_in_namespace(&self, ns: &str, pkg: &str, rev: &str, url: &str) {
        let overrides = Overrides {
            quiet: true,
            namespace: Some(ns.to_string()),
            ..Default::default()
        };
        self.with_resolver(overrides, |resolver, manifest| {
            resolver
                .add(
                    manifest,
                    &PkgName::new(pkg).unwrap(),
                    &Revision::new(rev).unwrap(),
                    Some(url),
                )
                .unwrap_or_else(|e| panic!("add -n {ns} {pkg}@{rev} failed: {e}"));
        });
    }

    fn release(&self, rev: &str) {
        self.with_resolver(Self::quiet(), |resolver, manifest| {
            resolver
                .release(manifest, &Revision::new(rev).unwrap())
                .unwrap_or_else(|e| panic!("release {rev} failed: {e}"));
        });
    }

    fn checkout(&self, rev: &str) {
        let git = self.git();
        let manifest = self.manifest();
        let ctx = Context::build(Self::quiet(), &manifest).unwrap();
        let resolver = Resolver::new(&git, &ctx, &KeepExisting);
        resolver
            .checkout(&manifest, &Revision::new(rev).unwrap())
            .unwrap_or_else(|e| panic!("checkout {rev} failed: {e}"));
    }

    fn remove(&self, pkg: &str) {
        self.with_resolver(Self::quiet(), |resolver, manifest| {
            resolver
                .remove(manifest, &PkgName::new(pkg).unwrap())
                .unwrap_or_else(|e| panic!("remove {pkg} failed: {e}"));
        });
    }

    /// The HEAD edge set as `name@rev` strings, root entry excluded.
    fn head_set(&self) -> BTreeSet<String> {
        let git = self.git();
        let manifest = self.manifest();
        let ctx = Context::build(Self::quiet(), &manifest).unwrap();
        let resolver = Resolver::new(&git, &ctx, &KeepExisting);
        let root = PkgName::new(self.name.as_str()).unwrap();
        resolver
            .head_edges(&root)
            .unwrap()
            .into_iter()
            .filter(|edge| edge.name != root)
            .map(|edge| format!("{}@{}", edge.name, edge.revision))
            .collect()
    }

    /// All ref names under a prefix.
    fn refs_under(&self, prefix: &str) -> BTreeSet<String> {
        self.git()
            .list_refs_by_prefix(prefix)
            .unwrap()
            .into_iter()
            .map(|entry| entry.name)
            .collect()
    }
}

fn set(entries: &[&str]) -> BTreeSet<String> {
    entries.iter().map(|s| s.to_string()).collect()
}

/// Build the shared universe: leaf packages c (1.0, 1.1, 1.2) and
/// d (1.0, 1.1), plus e@1.0 depending on d@1.0.
struct Universe {
    c: PkgRepo,
    d: PkgRepo,
    e: PkgRepo,
}

impl Universe {
    fn build() -> Self {
        let c = PkgRepo::init("c");
        c.release("1.0");
        c.release("1.1");
        c.release("1.2");

        let d = PkgRepo::init("d");
        d.release("1.0");
        d.release("1.1");

        let e = PkgRepo::init("e");
        e.add("d", "1.0", &d.url());
        e.release("1.0");

        Self { c, d, e }
    }

    /// a@1.0 depends on c@1.0 and d@1.0.
    fn repo_a(&self) -> PkgRepo {
        let a = PkgRepo::init("a");
        a.add("c", "1.0", &self.c.url());
        a.add("d", "1.0", &self.d.url());
        a.release("1.0");
        a
    }

    /// b@1.0 depends on c@1.1 and d@1.1.
    fn repo_b(&self) -> PkgRepo {
        let b = PkgRepo::init("b");
        b.add("c", "1.1", &self.c.url());
        b.add("d", "1.1", &self.d.url());
        b.release("1.0");
        b
    }
}

// =============================================================================
// Scenario 1: transitive upgrade under max
// =============================================================================

#[test]
fn transitive_upgrade_under_max() {
    let universe = Universe::build();
    let a = universe.repo_a();

    let app = PkgRepo::init("app");
    app.add("a", "1.0", &a.url());
    assert_eq!(app.head_set(), set(&["a@1.0", "c@1.0", "d@1.0"]));

    app.add("c", "1.1", &universe.c.url());
    assert_eq!(app.head_set(), set(&["a@1.0", "c@1.1", "d@1.0"]));
}

// =============================================================================
// Scenario 2: diamond resolution
// =============================================================================

#[test]
fn diamond_resolution_takes_newest() {
    let universe = Universe::build();
    let a = universe.repo_a();
    let b = universe.repo_b();

    let app = PkgRepo::init("app");
    app.add("a", "1.0", &a.url());
    app.add("b", "1.0", &b.url());
    assert_eq!(
        app.head_set(),
        set(&["a@1.0", "b@1.0", "c@1.1", "d@1.1"])
    );
}

// =============================================================================
// Scenario 3: release round-trip
// =============================================================================

#[test]
fn release_checkout_roundtrip() {
    let universe = Universe::build();
    let a = universe.repo_a();
    let b = universe.repo_b();

    let app = PkgRepo::init("app");
    app.add("a", "1.0", &a.url());
    app.add("b", "1.0", &b.url());
    let before = app.head_set();

    app.release("1.0");

    // checkout HEAD is a no-op on the edge set.
    app.checkout("HEAD");
    assert_eq!(app.head_set(), before);

    app.add("c", "1.2", &universe.c.url());
    app.release("1.1");
    let after = app.head_set();
    assert!(after.contains("c@1.2"));

    app.checkout("1.0");
    assert_eq!(app.head_set(), before);
    assert_eq!(app.manifest().version().as_deref(), Some("1.0"));

    app.checkout("1.1");
    assert_eq!(app.head_set(), after);
    assert_eq!(app.manifest().version().as_deref(), Some("1.1"));
}

// =============================================================================
// Scenario 4: cyclic guard
// =============================================================================

#[test]
fn cycle_is_absorbed_by_later_revision() {
    let universe = Universe::build();

    // a@1.0 pulls e@1.0 (which itself declared d@1.0).
    let a = PkgRepo::init("a");
    a.add("e", "1.0", &universe.e.url());
    a.add("c", "1.0", &universe.c.url());
    a.release("1.0");

    // e@1.1 depends on a@1.0, closing the cycle e -> a -> e.
    universe.e.add("a", "1.0", &a.url());
    universe.e.release("1.1");

    let app = PkgRepo::init("app");
    app.add("e", "1.1", &universe.e.url());

    let head = app.head_set();
    assert!(head.contains("e@1.1"), "head was {head:?}");
    assert!(head.contains("a@1.0"), "head was {head:?}");

    // The orphan entry for e stays at 1.1; the older cyclic e@1.0
    // never overwrites it.
    let git = app.git();
    let oid = git
        .resolve_ref(
            PkgRef::pkg_orphan(
                &PkgName::new("e").unwrap(),
                &Revision::new("1.1").unwrap(),
            )
            .as_str(),
        )
        .unwrap();
    let provenance = git.commit_provenance(&oid).unwrap().unwrap();
    assert_eq!(provenance.revision.as_str(), "1.1");
}

// =============================================================================
// Scenario 5: remove with substitution
// =============================================================================

#[test]
fn remove_restores_edges_from_other_parents() {
    let universe = Universe::build();
    let a = universe.repo_a();
    let b = universe.repo_b();

    let app = PkgRepo::init("app");
    app.add("a", "1.0", &a.url());
    app.add("b", "1.0", &b.url());

    app.remove("a");
    assert_eq!(app.head_set(), set(&["b@1.0", "c@1.1", "d@1.1"]));
}

#[test]
fn remove_refuses_transitive_dependency() {
    let universe = Universe::build();
    let a = universe.repo_a();

    let app = PkgRepo::init("app");
    app.add("a", "1.0", &a.url());

    let git = app.git();
    let manifest = app.manifest();
    let ctx = Context::build(PkgRepo::quiet(), &manifest).unwrap();
    let resolver = Resolver::new(&git, &ctx, &KeepExisting);
    let mut manifest = app.manifest();
    let err = resolver
        .remove(&mut manifest, &PkgName::new("c").unwrap())
        .unwrap_err();
    assert!(err.to_string().contains("not a direct dependency"));
}

// =============================================================================
// Scenario 6: namespaced path routing
// =============================================================================

#[test]
fn namespaced_edges_route_to_their_prefix() {
    let universe = Universe::build();

    let app = PkgRepo::init("app");
    let mut manifest = app.manifest();
    manifest.set("paths.dev:*", "dev_pkgs").unwrap();
    manifest.set("paths.*", "pkgs").unwrap();
    manifest.save(&app.path().join("pkgs.json")).unwrap();

    app.add_in_namespace("dev", "c", "1.0", &universe.c.url());
    app.add("d", "1.0", &universe.d.url());

    assert!(app.path().join("dev_pkgs/c").is_dir());
    assert!(app.path().join("pkgs/d").is_dir());
    assert!(app
        .refs_under("refs/pkgs/app/HEAD/dev/")
        .contains("refs/pkgs/app/HEAD/dev/c"));
}

// =============================================================================
// Idempotence and snapshot closure
// =============================================================================

#[test]
fn repeated_add_is_a_noop() {
    let universe = Universe::build();
    let a = universe.repo_a();

    let app = PkgRepo::init("app");
    app.add("a", "1.0", &a.url());
    let head_before = app.head_set();
    let refs_before = app.refs_under("refs/pkgs/");
    let manifest_before = app.manifest().to_canonical_json();

    app.add("a", "1.0", &a.url());
    assert_eq!(app.head_set(), head_before);
    assert_eq!(app.refs_under("refs/pkgs/"), refs_before);
    assert_eq!(app.manifest().to_canonical_json(), manifest_before);
}

#[test]
fn release_snapshot_closes_over_head() {
    let universe = Universe::build();
    let a = universe.repo_a();

    let app = PkgRepo::init("app");
    app.add("a", "1.0", &a.url());

    let head_before: BTreeSet<String> = app
        .refs_under("refs/pkgs/app/HEAD/")
        .into_iter()
        .map(|r| r.trim_start_matches("refs/pkgs/app/HEAD/").to_string())
        .collect();

    app.release("1.0");

    let snapshot: BTreeSet<String> = app
        .refs_under("refs/pkgs/app/1.0/")
        .into_iter()
        .map(|r| r.trim_start_matches("refs/pkgs/app/1.0/").to_string())
        .collect();

    let mut expected = head_before;
    expected.insert("app".to_string());
    assert_eq!(snapshot, expected);
}

#[test]
fn orphan_refs_are_parentless_and_labelled() {
    let universe = Universe::build();
    let a = universe.repo_a();

    let app = PkgRepo::init("app");
    app.add("a", "1.0", &a.url());

    let git = app.git();
    let oid = git
        .resolve_ref("refs/pkgs/a/1.0/a")
        .expect("orphan ref must exist for a direct dependency");
    let info = git.commit_info(&oid).unwrap();
    assert_eq!(info.parent_count, 0);

    let provenance = git.commit_provenance(&oid).unwrap().unwrap();
    assert_eq!(provenance.name.as_str(), "a");
    assert_eq!(provenance.revision.as_str(), "1.0");
    assert!(!provenance.url.is_empty());
}

// =============================================================================
// Manifest / edge consistency
// =============================================================================

#[test]
fn manifest_dependencies_match_direct_edges() {
    let universe = Universe::build();
    let a = universe.repo_a();
    let b = universe.repo_b();

    let app = PkgRepo::init("app");
    app.add("a", "1.0", &a.url());
    app.add("b", "1.0", &b.url());

    let deps: BTreeSet<String> = app
        .manifest()
        .dependencies()
        .into_iter()
        .map(|(key, _)| key.to_string())
        .collect();
    assert_eq!(deps, set(&["a", "b"]));
}

// =============================================================================
// Export / import round trip
// =============================================================================

#[test]
fn export_style_replay_reconstructs_head() {
    let universe = Universe::build();
    let a = universe.repo_a();
    let b = universe.repo_b();

    let app = PkgRepo::init("app");
    app.add("a", "1.0", &a.url());
    app.add("b", "1.0", &b.url());

    // Replay direct dependencies (name, revision, url) into a fresh
    // repository, the way json-import does.
    let git = app.git();
    let manifest = app.manifest();
    let ctx = Context::build(PkgRepo::quiet(), &manifest).unwrap();
    let resolver = Resolver::new(&git, &ctx, &KeepExisting);
    let root = PkgName::new("app").unwrap();
    let direct: Vec<(String, String, String)> = resolver
        .head_edges(&root)
        .unwrap()
        .into_iter()
        .filter(|edge| {
            manifest
                .dependencies()
                .iter()
                .any(|(key, _)| key.name == edge.name)
        })
        .map(|edge| {
            (
                edge.name.to_string(),
                edge.revision.to_string(),
                edge.provenance.url.clone(),
            )
        })
        .collect();

    let replica = PkgRepo::init("app");
    for (name, revision, url) in direct {
        replica.add(&name, &revision, &url);
    }
    assert_eq!(replica.head_set(), app.head_set());
}

// =============================================================================
// Worktree materialization
// =============================================================================

#[test]
fn dependencies_materialize_under_prefix() {
    let universe = Universe::build();
    let a = universe.repo_a();

    let app = PkgRepo::init("app");
    app.add("a", "1.0", &a.url());

    // Default routing is <prefix>/<pkg> with prefix "pkgs".
    assert!(app.path().join("pkgs/a").is_dir());
    assert!(app.path().join("pkgs/c").is_dir());
    assert!(app.path().join("pkgs/d").is_dir());
    assert!(app.path().join("pkgs/a/README.md").is_file());
}

#[test]
fn checkout_tears_down_dropped_worktrees() {
    let universe = Universe::build();
    let a = universe.repo_a();
    let b = universe.repo_b();

    let app = PkgRepo::init("app");
    app.add("a", "1.0", &a.url());
    app.release("1.0");
    app.add("b", "1.0", &b.url());
    app.release("1.1");

    assert!(app.path().join("pkgs/b").is_dir());
    app.checkout("1.0");
    assert!(!app.path().join("pkgs/b").exists());
    assert!(app.path().join("pkgs/a").is_dir());
}

// =============================================================================
// Directory imports
// =============================================================================

#[test]
fn add_dir_imports_a_plain_directory() {
    let vendor = TempDir::new().unwrap();
    std::fs::create_dir_all(vendor.path().join("src")).unwrap();
    std::fs::write(vendor.path().join("src/lib.c"), "int x;\n").unwrap();
    std::fs::write(vendor.path().join("COPYING"), "license\n").unwrap();

    let app = PkgRepo::init("app");
    app.with_resolver(PkgRepo::quiet(), |resolver, manifest| {
        resolver
            .add_dir(
                manifest,
                &PkgName::new("vendored").unwrap(),
                &Revision::new("0.1").unwrap(),
                vendor.path(),
                None,
            )
            .unwrap();
    });

    assert!(app.head_set().contains("vendored@0.1"));
    assert!(app.path().join("pkgs/vendored/src/lib.c").is_file());

    let git = app.git();
    let oid = git.resolve_ref("refs/pkgs/vendored/0.1/vendored").unwrap();
    assert_eq!(git.commit_info(&oid).unwrap().parent_count, 0);

    // The imported directory itself is untouched (no .git inside).
    assert!(!vendor.path().join(".git").exists());
}

// =============================================================================
// Pruning
// =============================================================================

#[test]
fn prune_drops_unreferenced_imports() {
    let universe = Universe::build();
    let a = universe.repo_a();
    let b = universe.repo_b();

    let app = PkgRepo::init("app");
    app.add("a", "1.0", &a.url());
    app.add("b", "1.0", &b.url());
    app.remove("a");

    let git = app.git();
    let manifest = app.manifest();
    let ctx = Context::build(PkgRepo::quiet(), &manifest).unwrap();
    let resolver = Resolver::new(&git, &ctx, &KeepExisting);
    let pruned = resolver.prune(&manifest).unwrap();

    assert!(pruned
        .iter()
        .any(|(pkg, rev)| pkg.as_str() == "a" && rev.as_str() == "1.0"));
    assert!(app.refs_under("refs/pkgs/a/1.0/").is_empty());
    // b stays: its orphan is still an active HEAD edge.
    assert!(!app.refs_under("refs/pkgs/b/1.0/").is_empty());
}
