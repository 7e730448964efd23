//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`PkgName`] - Validated package name (may contain `/`)
//! - [`Revision`] - Opaque revision token with version-sort ordering
//! - [`Namespace`] - Optional dependency group tag (e.g. `dev`)
//! - [`Oid`] - Git object identifier (SHA)
//! - [`Fingerprint`] - Hash over a set of (ref, oid) pairs
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs. Package
//! names and revisions are embedded into ref names, so the validation
//! rules follow `git check-ref-format`.
//!
//! # Examples
//!
//! ```
//! use git_pkgs::core::types::{PkgName, Revision};
//!
//! let pkg = PkgName::new("vendor/util").unwrap();
//! assert_eq!(pkg.as_str(), "vendor/util");
//!
//! let a = Revision::new("1.9").unwrap();
//! let b = Revision::new("1.10").unwrap();
//! assert!(a.version_cmp(&b).is_lt());
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid package name: {0}")]
    InvalidPkgName(String),

    #[error("invalid revision: {0}")]
    InvalidRevision(String),

    #[error("invalid namespace: {0}")]
    InvalidNamespace(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),
}

/// Validate a string destined for a ref path component.
///
/// `allow_slash` permits `/` for multi-segment names (package names);
/// single-segment tokens (revisions, namespaces) reject it.
fn validate_ref_token(value: &str, what: &str, allow_slash: bool) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{what} cannot be empty"));
    }
    if value.starts_with('.') || value.starts_with('-') || value.starts_with('/') {
        return Err(format!("{what} cannot start with '.', '-', or '/'"));
    }
    if value.ends_with('/') || value.ends_with(".lock") {
        return Err(format!("{what} cannot end with '/' or '.lock'"));
    }
    if value.contains("..") || value.contains("@{") || value.contains("//") {
        return Err(format!("{what} cannot contain '..', '@{{', or '//'"));
    }
    if !allow_slash && value.contains('/') {
        return Err(format!("{what} cannot contain '/'"));
    }
    const INVALID_CHARS: [char; 9] = [' ', '~', '^', ':', '\\', '?', '*', '[', '\x7f'];
    for c in INVALID_CHARS {
        if value.contains(c) {
            return Err(format!("{what} cannot contain '{c}'"));
        }
    }
    for c in value.chars() {
        if c.is_ascii_control() {
            return Err(format!("{what} cannot contain control characters"));
        }
    }
    for component in value.split('/') {
        if component.starts_with('.') {
            return Err(format!("{what} component cannot start with '.'"));
        }
        if component.ends_with(".lock") {
            return Err(format!("{what} component cannot end with '.lock'"));
        }
    }
    Ok(())
}

/// A validated package name.
///
/// Package names are opaque strings, unique within the owning repository.
/// They may contain `/` (e.g. `vendor/util`), which nests the package's
/// refs one level deeper. Every name must survive embedding into a ref,
/// so the rules of `git check-ref-format` apply.
///
/// # Example
///
/// ```
/// use git_pkgs::core::types::PkgName;
///
/// assert!(PkgName::new("libfoo").is_ok());
/// assert!(PkgName::new("vendor/libfoo").is_ok());
/// assert!(PkgName::new("bad..name").is_err());
/// assert!(PkgName::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PkgName(String);

impl PkgName {
    /// Create a new validated package name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPkgName` if the name cannot be embedded
    /// into a ref.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        validate_ref_token(&name, "package name", true).map_err(TypeError::InvalidPkgName)?;
        Ok(Self(name))
    }

    /// Get the package name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PkgName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<PkgName> for String {
    fn from(name: PkgName) -> Self {
        name.0
    }
}

impl AsRef<str> for PkgName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PkgName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The distinguished revision token naming the mutable HEAD namespace.
pub const HEAD_REVISION: &str = "HEAD";

/// An opaque revision token: a tag name, a commit hash, or `HEAD`.
///
/// Revisions are never range-solved. When two candidate revisions of the
/// same package collide during resolution, the winner is decided by a
/// stable version sort: runs of digits compare numerically, everything
/// else compares lexicographically.
///
/// # Example
///
/// ```
/// use git_pkgs::core::types::Revision;
///
/// let old = Revision::new("1.9").unwrap();
/// let new = Revision::new("1.10").unwrap();
/// assert!(old.version_cmp(&new).is_lt());
/// assert!(Revision::new("HEAD").unwrap().is_head());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Revision(String);

impl Revision {
    /// Create a new validated revision token.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRevision` if the token cannot be
    /// embedded into a ref.
    pub fn new(rev: impl Into<String>) -> Result<Self, TypeError> {
        let rev = rev.into();
        validate_ref_token(&rev, "revision", false).map_err(TypeError::InvalidRevision)?;
        Ok(Self(rev))
    }

    /// The `HEAD` revision.
    pub fn head() -> Self {
        Self(HEAD_REVISION.to_string())
    }

    /// Check whether this is the `HEAD` revision.
    pub fn is_head(&self) -> bool {
        self.0 == HEAD_REVISION
    }

    /// Compare two revisions by stable version sort.
    ///
    /// Digit runs compare numerically (so `1.10 > 1.9`), non-digit runs
    /// compare lexicographically, and a revision that is a strict prefix
    /// of another sorts first.
    pub fn version_cmp(&self, other: &Revision) -> std::cmp::Ordering {
        version_cmp(&self.0, &other.0)
    }

    /// Get the revision as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Revision {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Revision> for String {
    fn from(rev: Revision) -> Self {
        rev.0
    }
}

impl AsRef<str> for Revision {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compare two version strings with a numeric-aware, lexicographic-fallback
/// ordering.
///
/// The strings are tokenized into alternating digit and non-digit chunks.
/// Two digit chunks compare as integers (leading zeros ignored); any other
/// pair of chunks compares lexicographically. Exhausting one string first
/// sorts it earlier.
pub fn version_cmp(a: &str, b: &str) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    fn chunks(s: &str) -> Vec<&str> {
        let mut out = Vec::new();
        let bytes = s.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let digit = bytes[i].is_ascii_digit();
            let mut j = i;
            while j < bytes.len() && bytes[j].is_ascii_digit() == digit {
                j += 1;
            }
            out.push(&s[i..j]);
            i = j;
        }
        out
    }

    fn numeric_cmp(a: &str, b: &str) -> Ordering {
        let a = a.trim_start_matches('0');
        let b = b.trim_start_matches('0');
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    }

    let ca = chunks(a);
    let cb = chunks(b);
    for (xa, xb) in ca.iter().zip(cb.iter()) {
        let both_numeric = xa.as_bytes().first().is_some_and(|c| c.is_ascii_digit())
            && xb.as_bytes().first().is_some_and(|c| c.is_ascii_digit());
        let ord = if both_numeric {
            numeric_cmp(xa, xb)
        } else {
            xa.cmp(xb)
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    ca.len().cmp(&cb.len()).then_with(|| a.cmp(b))
}

/// An optional dependency group tag.
///
/// Namespaces scope a dependency to a group (e.g. `dev`). They appear as
/// a single extra path segment in HEAD refs, as a `<ns>:` key prefix in
/// the manifest, and as a pattern prefix in path routing.
///
/// # Example
///
/// ```
/// use git_pkgs::core::types::Namespace;
///
/// let ns = Namespace::new("dev").unwrap();
/// assert_eq!(ns.as_str(), "dev");
/// assert!(Namespace::new("a/b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    /// Create a new validated namespace tag.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidNamespace` for multi-segment or
    /// unembeddable tags.
    pub fn new(ns: impl Into<String>) -> Result<Self, TypeError> {
        let ns = ns.into();
        validate_ref_token(&ns, "namespace", false).map_err(TypeError::InvalidNamespace)?;
        Ok(Self(ns))
    }

    /// Get the namespace as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Namespace {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.0
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Git object identifier (SHA-1 or SHA-256).
///
/// OIDs are normalized to lowercase.
///
/// # Example
///
/// ```
/// use git_pkgs::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// assert!(Oid::zero().is_zero());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    const ZERO_SHA1: &'static str = "0000000000000000000000000000000000000000";

    /// Create a new validated object id, normalized to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a valid hex OID.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(Self(oid))
    }

    /// Create the zero/null OID (40 zeros).
    pub fn zero() -> Self {
        Self(Self::ZERO_SHA1.to_string())
    }

    /// Check if this is the zero/null OID.
    pub fn is_zero(&self) -> bool {
        self.0.chars().all(|c| c == '0')
    }

    /// Get an abbreviated form of the OID.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stable hash over a set of (ref, oid) pairs.
///
/// Used to decide whether two ref namespaces are pointwise identical,
/// e.g. to detect that checking out the active snapshot is a no-op.
/// The pairs are sorted by ref name before hashing so the result is
/// independent of enumeration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute a fingerprint from (refname, oid) pairs.
    pub fn compute(refs: &[(String, Oid)]) -> Self {
        let mut sorted: Vec<_> = refs.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let mut hasher = Sha256::new();
        for (refname, oid) in sorted {
            hasher.update(refname.as_bytes());
            hasher.update(b"\0");
            hasher.update(oid.as_str().as_bytes());
            hasher.update(b"\n");
        }

        Self(hex::encode(hasher.finalize()))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
