//! core::refs
//!
//! The single formatter for the `refs/pkgs/` namespace.
//!
//! # Layout
//!
//! One repository owns one root package `R`:
//!
//! ```text
//! refs/pkgs/<R>/HEAD/<pkg>        currently active edge to <pkg>
//! refs/pkgs/<R>/HEAD/<ns>/<pkg>   active edge in namespace <ns>
//! refs/pkgs/<R>/<rev>/...         frozen snapshot of HEAD at release <rev>
//! refs/pkgs/<pkg>/<rev>/<pkg>     the orphan commit for <pkg>@<rev>
//! refs/pkgs/<pkg>/<rev>/<dep>     transitive edge declared by <pkg>@<rev>
//! refs/pkgs/<pkg>/HEAD/<pkg>      most-recently-imported revision of <pkg>
//! ```
//!
//! No other module builds ref strings by hand; every ref is produced by a
//! [`PkgRef`] constructor. Parsing a ref back into its parts is inherently
//! ambiguous when names contain `/`, so the parsers here take the known
//! root or package name as context.
//!
//! # Example
//!
//! ```
//! use git_pkgs::core::refs::PkgRef;
//! use git_pkgs::core::types::{PkgName, Revision};
//!
//! let root = PkgName::new("app").unwrap();
//! let pkg = PkgName::new("libfoo").unwrap();
//! let rev = Revision::new("1.0").unwrap();
//!
//! assert_eq!(
//!     PkgRef::root_head(&root, None, &pkg).as_str(),
//!     "refs/pkgs/app/HEAD/libfoo"
//! );
//! assert_eq!(
//!     PkgRef::pkg_orphan(&pkg, &rev).as_str(),
//!     "refs/pkgs/libfoo/1.0/libfoo"
//! );
//! ```

use crate::core::types::{Namespace, PkgName, Revision, HEAD_REVISION};

/// Root of the entire ref namespace.
pub const REF_BASE: &str = "refs/pkgs";

/// A fully formed ref in the `refs/pkgs/` namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PkgRef(String);

impl PkgRef {
    /// Active edge to `pkg` in the root's HEAD namespace, optionally
    /// scoped to a namespace.
    pub fn root_head(root: &PkgName, ns: Option<&Namespace>, pkg: &PkgName) -> Self {
        match ns {
            Some(ns) => Self(format!("{REF_BASE}/{root}/{HEAD_REVISION}/{ns}/{pkg}")),
            None => Self(format!("{REF_BASE}/{root}/{HEAD_REVISION}/{pkg}")),
        }
    }

    /// Edge to `pkg` inside the root's frozen snapshot `rev`.
    pub fn root_snapshot(
        root: &PkgName,
        rev: &Revision,
        ns: Option<&Namespace>,
        pkg: &PkgName,
    ) -> Self {
        match ns {
            Some(ns) => Self(format!("{REF_BASE}/{root}/{rev}/{ns}/{pkg}")),
            None => Self(format!("{REF_BASE}/{root}/{rev}/{pkg}")),
        }
    }

    /// The orphan commit for `pkg@rev`.
    pub fn pkg_orphan(pkg: &PkgName, rev: &Revision) -> Self {
        Self(format!("{REF_BASE}/{pkg}/{rev}/{pkg}"))
    }

    /// A transitive edge declared by `pkg@rev` towards `dep`.
    pub fn pkg_transitive(pkg: &PkgName, rev: &Revision, dep: &str) -> Self {
        Self(format!("{REF_BASE}/{pkg}/{rev}/{dep}"))
    }

    /// The most-recently-imported revision of `pkg`.
    pub fn pkg_head(pkg: &PkgName) -> Self {
        Self(format!("{REF_BASE}/{pkg}/{HEAD_REVISION}/{pkg}"))
    }

    /// Prefix (with trailing `/`) of the root's HEAD namespace.
    pub fn head_prefix(root: &PkgName) -> String {
        format!("{REF_BASE}/{root}/{HEAD_REVISION}/")
    }

    /// Prefix (with trailing `/`) of the root's snapshot `rev`.
    pub fn snapshot_prefix(root: &PkgName, rev: &Revision) -> String {
        format!("{REF_BASE}/{root}/{rev}/")
    }

    /// Prefix (with trailing `/`) of the namespace declared by `pkg@rev`.
    pub fn pkg_prefix(pkg: &PkgName, rev: &Revision) -> String {
        format!("{REF_BASE}/{pkg}/{rev}/")
    }

    /// Get the full ref name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PkgRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PkgRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A parsed HEAD (or snapshot) edge: the optional namespace segment plus
/// the remainder naming the dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEdge {
    /// Namespace segment, when the edge is scoped.
    pub namespace: Option<Namespace>,
    /// The dependency name as it appears in the ref (may contain `/`).
    pub leaf: String,
}

/// Parse an edge ref under a known prefix (HEAD or snapshot namespace).
///
/// The trailing package name is supplied by the caller (normally read from
/// the commit's trailers), which disambiguates namespaced edges from
/// packages whose names contain `/`.
///
/// Returns `None` when the ref does not live under `prefix` or does not
/// end with `pkg_name`.
///
/// # Example
///
/// ```
/// use git_pkgs::core::refs::{parse_edge, PkgRef};
/// use git_pkgs::core::types::PkgName;
///
/// let root = PkgName::new("app").unwrap();
/// let prefix = PkgRef::head_prefix(&root);
///
/// let parsed = parse_edge("refs/pkgs/app/HEAD/dev/tool", &prefix, "tool").unwrap();
/// assert_eq!(parsed.namespace.unwrap().as_str(), "dev");
/// assert_eq!(parsed.leaf, "tool");
/// ```
pub fn parse_edge(refname: &str, prefix: &str, pkg_name: &str) -> Option<ParsedEdge> {
    let rest = refname.strip_prefix(prefix)?;
    if rest == pkg_name {
        return Some(ParsedEdge {
            namespace: None,
            leaf: rest.to_string(),
        });
    }
    let ns = rest
        .strip_suffix(pkg_name)
        .and_then(|head| head.strip_suffix('/'))?;
    // Namespaces are a single segment; anything else is a name mismatch.
    if ns.is_empty() || ns.contains('/') {
        return None;
    }
    Some(ParsedEdge {
        namespace: Namespace::new(ns).ok(),
        leaf: pkg_name.to_string(),
    })
}

/// Strip a known prefix from an edge ref, returning the edge remainder
/// (`[<ns>/]<leaf>`), without attempting to split the namespace.
pub fn edge_suffix<'a>(refname: &'a str, prefix: &str) -> Option<&'a str> {
    refname.strip_prefix(prefix)
}
