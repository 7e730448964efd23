//! core::router
//!
//! Worktree placement for imported packages.
//!
//! A package edge is materialized as a detached worktree somewhere
//! under the repository root. Where exactly is decided by the root
//! manifest's `prefix` and `paths` fields:
//!
//! - With no `paths` table, every package lands at `<prefix>/<pkg>`.
//! - Otherwise `paths` entries are tried in declaration order. A
//!   pattern `[<ns>:]<glob>` matches edges in that namespace whose
//!   package name matches the glob. The first match wins:
//!   - mapped to the literal `"false"`, the edge is recorded but no
//!     worktree is created;
//!   - mapped to a prefix string, the package lands at
//!     `<mapped>/<pkg>`.
//! - No match falls through to `<prefix>/<pkg>`.
//!
//! A configured ref suffix (e.g. `/PKG` for ecosystems whose import
//! paths end in a constant leaf) is stripped from the package name
//! before any matching.
//!
//! # Example
//!
//! ```
//! use git_pkgs::core::router::PathRouter;
//! use git_pkgs::core::types::{Namespace, PkgName};
//!
//! let paths = vec![
//!     ("dev:*".to_string(), "dev_pkgs".to_string()),
//!     ("*".to_string(), "pkgs".to_string()),
//! ];
//! let router = PathRouter::new("pkgs", &paths, None);
//!
//! let dev = Namespace::new("dev").unwrap();
//! let tool = PkgName::new("tool").unwrap();
//! assert_eq!(
//!     router.route(&tool, Some(&dev)).unwrap().to_str().unwrap(),
//!     "dev_pkgs/tool"
//! );
//! ```

use std::path::PathBuf;

use crate::core::types::{Namespace, PkgName};

/// Decides filesystem placement for package edges.
#[derive(Debug, Clone)]
pub struct PathRouter<'a> {
    prefix: &'a str,
    paths: &'a [(String, String)],
    ref_suffix: Option<&'a str>,
}

impl<'a> PathRouter<'a> {
    /// Create a router over the active `(prefix, paths)` configuration.
    pub fn new(
        prefix: &'a str,
        paths: &'a [(String, String)],
        ref_suffix: Option<&'a str>,
    ) -> Self {
        Self {
            prefix,
            paths,
            ref_suffix,
        }
    }

    /// Compute the worktree path for `pkg` in `ns`.
    ///
    /// Returns `None` when a matching pattern suppresses checkout.
    pub fn route(&self, pkg: &PkgName, ns: Option<&Namespace>) -> Option<PathBuf> {
        let name = self.stripped(pkg);

        if self.paths.is_empty() {
            return Some(PathBuf::from(self.prefix).join(name));
        }

        for (pattern, mapped) in self.paths {
            let (pattern_ns, glob) = split_pattern(pattern);
            if pattern_ns != ns.map(Namespace::as_str) {
                continue;
            }
            if !wildmatch(glob, name) {
                continue;
            }
            if mapped == "false" {
                return None;
            }
            return Some(PathBuf::from(mapped).join(name));
        }

        Some(PathBuf::from(self.prefix).join(name))
    }

    /// The package name with any configured ref suffix stripped.
    fn stripped<'p>(&self, pkg: &'p PkgName) -> &'p str {
        let name = pkg.as_str();
        match self.ref_suffix {
            Some(suffix) if !suffix.is_empty() => name.strip_suffix(suffix).unwrap_or(name),
            _ => name,
        }
    }
}

/// Split a routing pattern into its optional namespace and glob parts.
fn split_pattern(pattern: &str) -> (Option<&str>, &str) {
    match pattern.split_once(':') {
        Some((ns, glob)) => (Some(ns), glob),
        None => (None, pattern),
    }
}

/// Glob match with `*` (any run, including `/`) and `?` (any single
/// character).
fn wildmatch(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    // Iterative matcher with backtracking over the last `*`.
    let (mut pi, mut ti) = (0usize, 0usize);
    let (mut star, mut mark) = (None::<usize>, 0usize);

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            mark = ti;
            pi += 1;
        } else if let Some(s) = star {
            pi = s + 1;
            mark += 1;
            ti = mark;
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(s: &str) -> PkgName {
        PkgName::new(s).unwrap()
    }

    fn ns(s: &str) -> Namespace {
        Namespace::new(s).unwrap()
    }

    mod wildcards {
        use super::*;

        #[test]
        fn literal_match() {
            assert!(wildmatch("libfoo", "libfoo"));
            assert!(!wildmatch("libfoo", "libbar"));
        }

        #[test]
        fn star_matches_any_run() {
            assert!(wildmatch("*", "anything"));
            assert!(wildmatch("lib*", "libfoo"));
            assert!(wildmatch("*foo", "libfoo"));
            assert!(wildmatch("l*o", "libfoo"));
            assert!(wildmatch("*", ""));
        }

        #[test]
        fn star_crosses_slashes() {
            assert!(wildmatch("vendor/*", "vendor/a/b"));
            assert!(wildmatch("*", "a/b/c"));
        }

        #[test]
        fn question_matches_one() {
            assert!(wildmatch("li?foo", "libfoo"));
            assert!(!wildmatch("li?foo", "lifoo"));
        }
    }

    mod routing {
        use super::*;

        #[test]
        fn empty_paths_use_prefix() {
            let paths = vec![];
            let router = PathRouter::new("pkgs", &paths, None);
            assert_eq!(
                router.route(&pkg("libfoo"), None).unwrap(),
                PathBuf::from("pkgs/libfoo")
            );
        }

        #[test]
        fn first_match_wins() {
            let paths = vec![
                ("lib*".to_string(), "libs".to_string()),
                ("*".to_string(), "other".to_string()),
            ];
            let router = PathRouter::new("pkgs", &paths, None);
            assert_eq!(
                router.route(&pkg("libfoo"), None).unwrap(),
                PathBuf::from("libs/libfoo")
            );
            assert_eq!(
                router.route(&pkg("tool"), None).unwrap(),
                PathBuf::from("other/tool")
            );
        }

        #[test]
        fn namespaced_patterns_only_match_their_namespace() {
            let paths = vec![
                ("dev:*".to_string(), "dev_pkgs".to_string()),
                ("*".to_string(), "pkgs".to_string()),
            ];
            let router = PathRouter::new("pkgs", &paths, None);
            assert_eq!(
                router.route(&pkg("tool"), Some(&ns("dev"))).unwrap(),
                PathBuf::from("dev_pkgs/tool")
            );
            assert_eq!(
                router.route(&pkg("tool"), None).unwrap(),
                PathBuf::from("pkgs/tool")
            );
        }

        #[test]
        fn false_suppresses_checkout() {
            let paths = vec![("hidden:*".to_string(), "false".to_string())];
            let router = PathRouter::new("pkgs", &paths, None);
            assert!(router.route(&pkg("secret"), Some(&ns("hidden"))).is_none());
        }

        #[test]
        fn no_match_falls_through_to_prefix() {
            let paths = vec![("dev:*".to_string(), "dev_pkgs".to_string())];
            let router = PathRouter::new("pkgs", &paths, None);
            assert_eq!(
                router.route(&pkg("plain"), None).unwrap(),
                PathBuf::from("pkgs/plain")
            );
        }

        #[test]
        fn ref_suffix_stripped() {
            let paths = vec![];
            let router = PathRouter::new("pkgs", &paths, Some("/PKG"));
            assert_eq!(
                router.route(&pkg("github.com/x/y/PKG"), None).unwrap(),
                PathBuf::from("pkgs/github.com/x/y")
            );
        }
    }
}
