//! core::manifest
//!
//! The package manifest document (`pkgs.json`).
//!
//! # Schema
//!
//! The manifest is a JSON object with a fixed set of recognized fields,
//! written in canonical order:
//!
//! `name, description, version, author, authors, contributors, license,
//! repository, url, homepage, funding, prefix, dependencies, paths,
//! engines, files, config, extra, scripts`
//!
//! Unknown top-level keys are dropped on write. `dependencies` maps
//! `"[<namespace>:]<pkg>"` to a revision token and is emitted with
//! unnamespaced keys first, then namespaced keys, each block sorted
//! lexicographically. `paths` maps routing patterns to filesystem
//! prefixes (or the literal `"false"`) and keeps its declaration order.
//!
//! # Failure model
//!
//! A missing file loads as an empty manifest; a syntactically invalid
//! file is fatal ([`ManifestError::Invalid`]) with no partial mutation.
//! Saving is atomic (write to a temp file, then rename).
//!
//! # Example
//!
//! ```
//! use git_pkgs::core::manifest::Manifest;
//! use git_pkgs::core::types::{PkgName, Revision};
//!
//! let mut manifest = Manifest::default();
//! manifest.set("name", "app").unwrap();
//! manifest.add_dep(
//!     &PkgName::new("libfoo").unwrap(),
//!     &Revision::new("1.0").unwrap(),
//!     None,
//! );
//! assert_eq!(manifest.get("dependencies.libfoo").unwrap(), "1.0");
//! ```

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::core::types::{Namespace, PkgName, Revision, TypeError};

/// Default manifest filename; overridable via `GIT_PKGS_JSON`.
pub const DEFAULT_MANIFEST_FILE: &str = "pkgs.json";

/// Recognized top-level fields in canonical output order.
pub const FIELD_ORDER: [&str; 19] = [
    "name",
    "description",
    "version",
    "author",
    "authors",
    "contributors",
    "license",
    "repository",
    "url",
    "homepage",
    "funding",
    "prefix",
    "dependencies",
    "paths",
    "engines",
    "files",
    "config",
    "extra",
    "scripts",
];

/// Errors from manifest operations.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file exists but is not valid JSON (or not an object).
    #[error("invalid manifest {path}: {message}")]
    Invalid {
        /// Path of the offending file
        path: PathBuf,
        /// Parser diagnostic
        message: String,
    },

    /// Filesystem failure while reading or writing.
    #[error("failed to access manifest {path}: {source}")]
    Io {
        /// Path of the manifest
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// A dotted path traversed through a non-object value.
    #[error("cannot set '{key}': intermediate value is not an object")]
    NotAnObject {
        /// The dotted key being set
        key: String,
    },

    /// Invalid name or revision in a dependency key.
    #[error(transparent)]
    Type(#[from] TypeError),
}

/// A dependency key: optional namespace plus package name.
///
/// Rendered as `name` or `namespace:name` in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DepKey {
    pub namespace: Option<Namespace>,
    pub name: PkgName,
}

impl DepKey {
    /// Create a key for `name`, optionally scoped to `namespace`.
    pub fn new(name: PkgName, namespace: Option<Namespace>) -> Self {
        Self { namespace, name }
    }

    /// Parse a manifest key of the form `[<namespace>:]<name>`.
    pub fn parse(key: &str) -> Result<Self, TypeError> {
        match key.split_once(':') {
            Some((ns, name)) => Ok(Self {
                namespace: Some(Namespace::new(ns)?),
                name: PkgName::new(name)?,
            }),
            None => Ok(Self {
                namespace: None,
                name: PkgName::new(key)?,
            }),
        }
    }
}

impl std::fmt::Display for DepKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}:{}", ns, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// The manifest document.
///
/// Internally an ordered JSON object; recognized fields are normalized
/// on save, unknown fields are discarded.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    doc: Map<String, Value>,
}

impl Manifest {
    /// Load the manifest at `path`.
    ///
    /// A missing file yields an empty manifest.
    ///
    /// # Errors
    ///
    /// - [`ManifestError::Invalid`] for malformed JSON or a non-object root
    /// - [`ManifestError::Io`] for other filesystem failures
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ManifestError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        Self::from_json(&text).map_err(|message| ManifestError::Invalid {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse a manifest from a JSON string.
    pub fn from_json(text: &str) -> Result<Self, String> {
        let value: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
        match value {
            Value::Object(doc) => Ok(Self { doc }),
            other => Err(format!("expected a JSON object, got {}", kind_of(&other))),
        }
    }

    /// Whether no fields are set.
    pub fn is_empty(&self) -> bool {
        self.doc.is_empty()
    }

    /// The root package name, when set and valid.
    pub fn name(&self) -> Option<PkgName> {
        self.get("name").and_then(|n| PkgName::new(n).ok())
    }

    /// The `prefix` field, when set.
    pub fn prefix(&self) -> Option<String> {
        self.get("prefix")
    }

    /// The `version` field, when set.
    pub fn version(&self) -> Option<String> {
        self.get("version")
    }

    /// Look up a dotted path, rendering scalars as strings.
    ///
    /// Returns `None` for missing keys and non-scalar values.
    pub fn get(&self, dotted: &str) -> Option<String> {
        let mut segments = dotted.split('.');
        let mut value = self.doc.get(segments.next()?)?;
        for segment in segments {
            value = value.as_object()?.get(segment)?;
        }
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Set a dotted path to a string or boolean value.
    ///
    /// The literals `true` and `false` are stored as JSON booleans;
    /// everything else is stored as a string. Intermediate objects are
    /// created as needed. Setting an existing key to the same scalar is
    /// a no-op.
    pub fn set(&mut self, dotted: &str, value: &str) -> Result<(), ManifestError> {
        let new_value = match value {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            other => Value::String(other.to_string()),
        };

        let mut map = &mut self.doc;
        let segments: Vec<&str> = dotted.split('.').collect();
        for (i, segment) in segments.iter().enumerate() {
            if i + 1 == segments.len() {
                map.insert(segment.to_string(), new_value);
                return Ok(());
            }
            let entry = map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            map = entry.as_object_mut().ok_or_else(|| ManifestError::NotAnObject {
                key: dotted.to_string(),
            })?;
        }
        Ok(())
    }

    /// Upsert a dependency edge.
    pub fn add_dep(&mut self, name: &PkgName, rev: &Revision, namespace: Option<&Namespace>) {
        let key = DepKey::new(name.clone(), namespace.cloned()).to_string();
        let deps = self
            .doc
            .entry("dependencies".to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(deps) = deps.as_object_mut() {
            deps.insert(key, Value::String(rev.to_string()));
        }
    }

    /// Remove a dependency edge. Returns whether it was present.
    pub fn remove_dep(&mut self, name: &PkgName, namespace: Option<&Namespace>) -> bool {
        let key = DepKey::new(name.clone(), namespace.cloned()).to_string();
        let removed = self
            .doc
            .get_mut("dependencies")
            .and_then(Value::as_object_mut)
            .map(|deps| deps.remove(&key).is_some())
            .unwrap_or(false);
        if let Some(deps) = self.doc.get("dependencies").and_then(Value::as_object) {
            if deps.is_empty() {
                self.doc.remove("dependencies");
            }
        }
        removed
    }

    /// All dependency edges in canonical order.
    ///
    /// Entries with invalid keys or non-string revisions are skipped.
    pub fn dependencies(&self) -> Vec<(DepKey, Revision)> {
        let Some(deps) = self.doc.get("dependencies").and_then(Value::as_object) else {
            return Vec::new();
        };
        let mut entries: Vec<(DepKey, Revision)> = deps
            .iter()
            .filter_map(|(key, value)| {
                let key = DepKey::parse(key).ok()?;
                let rev = Revision::new(value.as_str()?).ok()?;
                Some((key, rev))
            })
            .collect();
        entries.sort_by(dep_order);
        entries
    }

    /// The `paths` routing table in declaration order.
    ///
    /// Values may be a filesystem prefix or the literal `"false"`;
    /// boolean `false` is normalized to the literal.
    pub fn paths(&self) -> Vec<(String, String)> {
        let Some(paths) = self.doc.get("paths").and_then(Value::as_object) else {
            return Vec::new();
        };
        paths
            .iter()
            .filter_map(|(pattern, value)| {
                let mapped = match value {
                    Value::String(s) => s.clone(),
                    Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((pattern.clone(), mapped))
            })
            .collect()
    }

    /// Render the canonical form of the document.
    ///
    /// Recognized fields in fixed order, unknown fields dropped, null
    /// values omitted, dependencies sorted canonically.
    pub fn to_canonical_value(&self) -> Value {
        let mut out = Map::new();
        for field in FIELD_ORDER {
            let Some(value) = self.doc.get(field) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            if field == "dependencies" {
                if let Some(deps) = value.as_object() {
                    let mut entries: Vec<(String, Value)> = deps
                        .iter()
                        .filter(|(_, v)| !v.is_null())
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect();
                    entries.sort_by(|(a, _), (b, _)| key_order(a, b));
                    if entries.is_empty() {
                        continue;
                    }
                    let mut sorted = Map::new();
                    for (k, v) in entries {
                        sorted.insert(k, v);
                    }
                    out.insert(field.to_string(), Value::Object(sorted));
                    continue;
                }
            }
            out.insert(field.to_string(), value.clone());
        }
        Value::Object(out)
    }

    /// Serialize the canonical form as pretty JSON with a trailing
    /// newline.
    pub fn to_canonical_json(&self) -> String {
        let mut text = serde_json::to_string_pretty(&self.to_canonical_value())
            .unwrap_or_else(|_| "{}".to_string());
        text.push('\n');
        text
    }

    /// Write the manifest to `path` atomically (write-then-rename).
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let text = self.to_canonical_json();
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let tmp = dir.join(format!(
            ".{}.tmp",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| DEFAULT_MANIFEST_FILE.to_string())
        ));
        std::fs::write(&tmp, text).map_err(|e| ManifestError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp, path).map_err(|e| ManifestError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }
}

/// Canonical order of dependency keys: unnamespaced before namespaced,
/// lexicographic within each block.
fn key_order(a: &str, b: &str) -> std::cmp::Ordering {
    let a_ns = a.contains(':');
    let b_ns = b.contains(':');
    a_ns.cmp(&b_ns).then_with(|| a.cmp(b))
}

fn dep_order(a: &(DepKey, Revision), b: &(DepKey, Revision)) -> std::cmp::Ordering {
    key_order(&a.0.to_string(), &b.0.to_string())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(s: &str) -> PkgName {
        PkgName::new(s).unwrap()
    }

    fn rev(s: &str) -> Revision {
        Revision::new(s).unwrap()
    }

    fn ns(s: &str) -> Namespace {
        Namespace::new(s).unwrap()
    }

    mod loading {
        use super::*;

        #[test]
        fn missing_file_is_empty() {
            let dir = tempfile::tempdir().unwrap();
            let manifest = Manifest::load(&dir.path().join("pkgs.json")).unwrap();
            assert!(manifest.is_empty());
        }

        #[test]
        fn malformed_json_is_fatal() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("pkgs.json");
            std::fs::write(&path, "{not json").unwrap();
            assert!(matches!(
                Manifest::load(&path),
                Err(ManifestError::Invalid { .. })
            ));
        }

        #[test]
        fn non_object_root_is_fatal() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("pkgs.json");
            std::fs::write(&path, "[1, 2]").unwrap();
            assert!(matches!(
                Manifest::load(&path),
                Err(ManifestError::Invalid { .. })
            ));
        }

        #[test]
        fn roundtrip_through_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("pkgs.json");

            let mut manifest = Manifest::default();
            manifest.set("name", "app").unwrap();
            manifest.add_dep(&pkg("libfoo"), &rev("1.0"), None);
            manifest.save(&path).unwrap();

            let loaded = Manifest::load(&path).unwrap();
            assert_eq!(loaded.name().unwrap().as_str(), "app");
            assert_eq!(loaded.dependencies().len(), 1);
        }
    }

    mod accessors {
        use super::*;

        #[test]
        fn get_and_set_scalars() {
            let mut m = Manifest::default();
            m.set("name", "app").unwrap();
            m.set("config.flag", "true").unwrap();
            assert_eq!(m.get("name").unwrap(), "app");
            assert_eq!(m.get("config.flag").unwrap(), "true");
            assert!(m.get("missing").is_none());
            assert!(m.get("config.missing").is_none());
        }

        #[test]
        fn set_is_idempotent() {
            let mut m = Manifest::default();
            m.set("name", "app").unwrap();
            let before = m.to_canonical_json();
            m.set("name", "app").unwrap();
            assert_eq!(before, m.to_canonical_json());
        }

        #[test]
        fn set_through_scalar_fails() {
            let mut m = Manifest::default();
            m.set("name", "app").unwrap();
            assert!(matches!(
                m.set("name.sub", "x"),
                Err(ManifestError::NotAnObject { .. })
            ));
        }
    }

    mod dependencies {
        use super::*;

        #[test]
        fn add_and_remove() {
            let mut m = Manifest::default();
            m.add_dep(&pkg("libfoo"), &rev("1.0"), None);
            m.add_dep(&pkg("tool"), &rev("2.0"), Some(&ns("dev")));
            assert_eq!(m.dependencies().len(), 2);

            assert!(m.remove_dep(&pkg("libfoo"), None));
            assert!(!m.remove_dep(&pkg("libfoo"), None));
            assert_eq!(m.dependencies().len(), 1);
        }

        #[test]
        fn upsert_replaces_revision() {
            let mut m = Manifest::default();
            m.add_dep(&pkg("libfoo"), &rev("1.0"), None);
            m.add_dep(&pkg("libfoo"), &rev("1.1"), None);
            let deps = m.dependencies();
            assert_eq!(deps.len(), 1);
            assert_eq!(deps[0].1.as_str(), "1.1");
        }

        #[test]
        fn canonical_ordering() {
            let mut m = Manifest::default();
            m.add_dep(&pkg("zeta"), &rev("1.0"), None);
            m.add_dep(&pkg("tool"), &rev("1.0"), Some(&ns("dev")));
            m.add_dep(&pkg("alpha"), &rev("1.0"), None);
            m.add_dep(&pkg("aid"), &rev("1.0"), Some(&ns("build")));

            let keys: Vec<String> = m
                .dependencies()
                .iter()
                .map(|(k, _)| k.to_string())
                .collect();
            assert_eq!(keys, vec!["alpha", "zeta", "build:aid", "dev:tool"]);
        }

        #[test]
        fn empty_dependencies_dropped() {
            let mut m = Manifest::default();
            m.add_dep(&pkg("libfoo"), &rev("1.0"), None);
            m.remove_dep(&pkg("libfoo"), None);
            assert!(!m.to_canonical_json().contains("dependencies"));
        }
    }

    mod canonical_form {
        use super::*;

        #[test]
        fn unknown_keys_dropped() {
            let m = Manifest::from_json(r#"{"name": "app", "bogus": 1}"#).unwrap();
            let json = m.to_canonical_json();
            assert!(json.contains("\"name\""));
            assert!(!json.contains("bogus"));
        }

        #[test]
        fn null_values_omitted() {
            let m = Manifest::from_json(r#"{"name": "app", "description": null}"#).unwrap();
            assert!(!m.to_canonical_json().contains("description"));
        }

        #[test]
        fn field_order_is_fixed() {
            let m = Manifest::from_json(
                r#"{"version": "1.0", "name": "app", "prefix": "pkgs"}"#,
            )
            .unwrap();
            let json = m.to_canonical_json();
            let name_at = json.find("\"name\"").unwrap();
            let version_at = json.find("\"version\"").unwrap();
            let prefix_at = json.find("\"prefix\"").unwrap();
            assert!(name_at < version_at);
            assert!(version_at < prefix_at);
        }

        #[test]
        fn paths_keep_declaration_order() {
            let m = Manifest::from_json(
                r#"{"paths": {"dev:*": "dev_pkgs", "*": "pkgs"}}"#,
            )
            .unwrap();
            let paths = m.paths();
            assert_eq!(paths[0].0, "dev:*");
            assert_eq!(paths[1].0, "*");
        }

        #[test]
        fn boolean_path_normalized() {
            let m = Manifest::from_json(r#"{"paths": {"hidden:*": false}}"#).unwrap();
            assert_eq!(m.paths()[0].1, "false");
        }
    }

    mod dep_key {
        use super::*;

        #[test]
        fn parse_plain() {
            let key = DepKey::parse("libfoo").unwrap();
            assert_eq!(key.namespace, None);
            assert_eq!(key.name.as_str(), "libfoo");
        }

        #[test]
        fn parse_namespaced() {
            let key = DepKey::parse("dev:tool").unwrap();
            assert_eq!(key.namespace.unwrap().as_str(), "dev");
            assert_eq!(key.name.as_str(), "tool");
        }

        #[test]
        fn display_roundtrip() {
            for raw in ["libfoo", "dev:tool", "ns:vendor/util"] {
                assert_eq!(DepKey::parse(raw).unwrap().to_string(), raw);
            }
        }
    }
}
