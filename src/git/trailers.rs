//! git::trailers
//!
//! Provenance trailers carried by orphan commits.
//!
//! Every imported package revision is recorded as a parentless commit
//! whose message ends with a trailer block:
//!
//! ```text
//! git-pkgs-name: libfoo
//! git-pkgs-type: pkg
//! git-pkgs-revision: 1.0
//! git-pkgs-commit: <origin sha>
//! git-pkgs-url: https://example.com/libfoo.git
//! ```
//!
//! Trailers are appended with an add-if-different policy so repeated
//! imports of the same `(pkg, rev)` leave the message unchanged.

use std::collections::HashMap;

use crate::core::types::{Oid, PkgName, Revision};

/// Trailer key for the package name.
pub const TRAILER_NAME: &str = "git-pkgs-name";
/// Trailer key for the package type (e.g. `pkg`, `npm`, `go`).
pub const TRAILER_TYPE: &str = "git-pkgs-type";
/// Trailer key for the imported revision token.
pub const TRAILER_REVISION: &str = "git-pkgs-revision";
/// Trailer key for the origin commit the orphan was built from.
pub const TRAILER_COMMIT: &str = "git-pkgs-commit";
/// Trailer key for the origin URL.
pub const TRAILER_URL: &str = "git-pkgs-url";

/// Provenance recorded in an orphan commit's trailers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub name: PkgName,
    pub pkg_type: String,
    pub revision: Revision,
    /// The origin object the orphan was derived from, if any.
    pub commit: Option<Oid>,
    pub url: String,
}

impl Provenance {
    /// Render as ordered `(key, value)` trailer pairs.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            (TRAILER_NAME.to_string(), self.name.to_string()),
            (TRAILER_TYPE.to_string(), self.pkg_type.clone()),
            (TRAILER_REVISION.to_string(), self.revision.to_string()),
        ];
        if let Some(commit) = &self.commit {
            pairs.push((TRAILER_COMMIT.to_string(), commit.to_string()));
        }
        pairs.push((TRAILER_URL.to_string(), self.url.clone()));
        pairs
    }

    /// Reconstruct provenance from a parsed trailer map.
    ///
    /// Returns `None` when the name or revision trailer is missing or
    /// invalid; the other keys degrade to defaults.
    pub fn from_map(map: &HashMap<String, String>) -> Option<Self> {
        let name = PkgName::new(map.get(TRAILER_NAME)?.clone()).ok()?;
        let revision = Revision::new(map.get(TRAILER_REVISION)?.clone()).ok()?;
        Some(Self {
            name,
            pkg_type: map.get(TRAILER_TYPE).cloned().unwrap_or_default(),
            revision,
            commit: map.get(TRAILER_COMMIT).and_then(|c| Oid::new(c.clone()).ok()),
            url: map.get(TRAILER_URL).cloned().unwrap_or_default(),
        })
    }
}

/// Check whether a line has trailer shape (`key: value` with a
/// `[A-Za-z0-9-]+` key).
fn is_trailer_line(line: &str) -> bool {
    match line.split_once(':') {
        Some((key, _)) => {
            !key.is_empty()
                && key
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-')
        }
        None => false,
    }
}

/// Parse the trailer block of a commit message into `(key, value)` pairs.
///
/// The trailer block is the final paragraph of the message, and only
/// counts when every non-empty line in it has trailer shape. A message
/// without a trailer block yields an empty vec.
pub fn parse(message: &str) -> Vec<(String, String)> {
    let block = trailer_block(message);
    block
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Parse trailers into a map, keeping the last value for repeated keys.
pub fn parse_map(message: &str) -> HashMap<String, String> {
    parse(message).into_iter().collect()
}

/// Locate the trailer block (final all-trailer paragraph) of a message.
fn trailer_block(message: &str) -> &str {
    let trimmed = message.trim_end();
    let start = match trimmed.rfind("\n\n") {
        Some(idx) => idx + 2,
        None => return "",
    };
    let candidate = &trimmed[start..];
    let all_trailers = candidate
        .lines()
        .filter(|l| !l.trim().is_empty())
        .all(is_trailer_line);
    if all_trailers && candidate.lines().any(|l| !l.trim().is_empty()) {
        candidate
    } else {
        ""
    }
}

/// Append trailers to a commit message with add-if-different policy.
///
/// A `(key, value)` pair already present in the trailer block is not
/// duplicated; a key present with a different value gets an additional
/// line (the newest value wins when read back through [`parse_map`]).
/// When the message has no trailer block, one is started as a new final
/// paragraph.
pub fn append(message: &str, pairs: &[(String, String)]) -> String {
    let existing = parse(message);
    let missing: Vec<_> = pairs
        .iter()
        .filter(|(k, v)| !existing.iter().any(|(ek, ev)| ek == k && ev == v))
        .collect();
    if missing.is_empty() {
        return message.to_string();
    }

    let mut out = message.trim_end().to_string();
    if trailer_block(message).is_empty() {
        out.push_str("\n\n");
    } else {
        out.push('\n');
    }
    for (key, value) in missing {
        out.push_str(&format!("{key}: {value}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provenance() -> Provenance {
        Provenance {
            name: PkgName::new("libfoo").unwrap(),
            pkg_type: "pkg".to_string(),
            revision: Revision::new("1.0").unwrap(),
            commit: Some(Oid::new("abc123def4567890abc123def4567890abc12345").unwrap()),
            url: "https://example.com/libfoo.git".to_string(),
        }
    }

    #[test]
    fn parse_trailer_block() {
        let msg = "Import libfoo\n\ngit-pkgs-name: libfoo\ngit-pkgs-revision: 1.0\n";
        let map = parse_map(msg);
        assert_eq!(map.get(TRAILER_NAME).unwrap(), "libfoo");
        assert_eq!(map.get(TRAILER_REVISION).unwrap(), "1.0");
    }

    #[test]
    fn body_without_trailers_is_empty() {
        assert!(parse("just a subject line").is_empty());
        assert!(parse("subject\n\nplain body text here").is_empty());
    }

    #[test]
    fn mixed_final_paragraph_is_not_a_block() {
        let msg = "subject\n\nsome text\ngit-pkgs-name: libfoo";
        assert!(parse(msg).is_empty());
    }

    #[test]
    fn append_starts_block() {
        let out = append("Import libfoo", &provenance().to_pairs());
        let map = parse_map(&out);
        assert_eq!(map.get(TRAILER_NAME).unwrap(), "libfoo");
        assert_eq!(map.get(TRAILER_URL).unwrap(), "https://example.com/libfoo.git");
    }

    #[test]
    fn append_is_idempotent() {
        let once = append("Import libfoo", &provenance().to_pairs());
        let twice = append(&once, &provenance().to_pairs());
        assert_eq!(once, twice);
    }

    #[test]
    fn append_extends_existing_block() {
        let msg = "subject\n\nSigned-off-by: someone <s@example.com>\n";
        let out = append(msg, &provenance().to_pairs());
        let map = parse_map(&out);
        assert_eq!(map.get("Signed-off-by").unwrap(), "someone <s@example.com>");
        assert_eq!(map.get(TRAILER_NAME).unwrap(), "libfoo");
    }

    #[test]
    fn differing_value_appended_and_newest_wins() {
        let msg = "subject\n\ngit-pkgs-revision: 1.0\n";
        let out = append(
            msg,
            &[(TRAILER_REVISION.to_string(), "1.1".to_string())],
        );
        assert_eq!(parse_map(&out).get(TRAILER_REVISION).unwrap(), "1.1");
    }

    #[test]
    fn provenance_roundtrip() {
        let p = provenance();
        let msg = append("Import libfoo 1.0", &p.to_pairs());
        let restored = Provenance::from_map(&parse_map(&msg)).unwrap();
        assert_eq!(p, restored);
    }

    #[test]
    fn provenance_without_commit() {
        let mut p = provenance();
        p.commit = None;
        let msg = append("Import", &p.to_pairs());
        let restored = Provenance::from_map(&parse_map(&msg)).unwrap();
        assert_eq!(restored.commit, None);
    }
}
