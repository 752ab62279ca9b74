//! Dependency records.
//!
//! A DependencyRecord is one observed occurrence of a dependency in some
//! package manifest: the declared name, where it was resolved from, and the
//! directory it was installed into.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which manifest table a dependency was declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    Normal,
    Dev,
    Unsaved,
}

impl DependencyKind {
    /// All dependency tables, in the order they are read.
    pub const ALL: [DependencyKind; 3] = [
        DependencyKind::Normal,
        DependencyKind::Dev,
        DependencyKind::Unsaved,
    ];

    /// The manifest key holding this table.
    pub fn manifest_key(self) -> &'static str {
        match self {
            DependencyKind::Normal => "dependencies",
            DependencyKind::Dev => "devDependencies",
            DependencyKind::Unsaved => "unsavedDependencies",
        }
    }
}

/// One observed dependency occurrence.
///
/// Fields other than `name`, `from` and `path` (version, resolved URL, ...)
/// are carried through untouched in `extra`, as are `from` and `path` values
/// that are not strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct DependencyRecord {
    /// Declared package name
    pub name: String,

    /// Source relation (the specifier it was resolved from)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Install path on disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Remaining manifest fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TryFrom<Map<String, Value>> for DependencyRecord {
    type Error = String;

    fn try_from(object: Map<String, Value>) -> Result<Self, Self::Error> {
        match object.get("name") {
            Some(Value::String(name)) => Ok(DependencyRecord::from_fields(name.clone(), &object)),
            _ => Err("dependency record has no string `name`".to_string()),
        }
    }
}

impl DependencyRecord {
    /// Create a record with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        DependencyRecord {
            name: name.into(),
            from: None,
            path: None,
            extra: Map::new(),
        }
    }

    /// Set the source relation.
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Set the install path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Build a record from a manifest entry.
    ///
    /// `name` defaults to the key the entry was declared under. Returns `None`
    /// only if the entry is not an object.
    pub fn from_manifest_entry(dep_name: &str, info: &Value) -> Option<Self> {
        let object = info.as_object()?;
        let name = match object.get("name") {
            Some(Value::String(name)) => name.clone(),
            Some(other) => {
                tracing::warn!(
                    "dependency `{}` has a non-string name {}, using the key",
                    dep_name,
                    other
                );
                dep_name.to_string()
            }
            None => dep_name.to_string(),
        };
        Some(DependencyRecord::from_fields(name, object))
    }

    fn from_fields(name: String, object: &Map<String, Value>) -> Self {
        let mut record = DependencyRecord::new(name);
        for (key, value) in object {
            match (key.as_str(), value) {
                ("name", _) => {}
                ("from", Value::String(from)) => record.from = Some(from.clone()),
                ("path", Value::String(path)) => record.path = Some(path.clone()),
                _ => {
                    record.extra.insert(key.clone(), value.clone());
                }
            }
        }
        record
    }

    /// The identity triple, only when all three parts are known.
    fn identity(&self) -> Option<(&str, &str, &str)> {
        Some((self.name.as_str(), self.from.as_deref()?, self.path.as_deref()?))
    }

    /// Whether two records describe the same dependency occurrence.
    ///
    /// Records missing a source relation or install path never match anything,
    /// so under-specified records always survive deduplication.
    pub fn same_occurrence(&self, other: &DependencyRecord) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_name_defaults_to_key() {
        let record =
            DependencyRecord::from_manifest_entry("lodash", &json!({"version": "4.17.21"}))
                .unwrap();
        assert_eq!(record.name, "lodash");
        assert_eq!(record.extra["version"], json!("4.17.21"));
    }

    #[test]
    fn test_explicit_name_kept() {
        let record =
            DependencyRecord::from_manifest_entry("alias", &json!({"name": "real-name"})).unwrap();
        assert_eq!(record.name, "real-name");
    }

    #[test]
    fn test_non_object_entry_ignored() {
        assert!(DependencyRecord::from_manifest_entry("x", &json!("^1.0.0")).is_none());
    }

    #[test]
    fn test_wrong_typed_fields_kept_raw() {
        let record =
            DependencyRecord::from_manifest_entry("foo", &json!({"path": "/r/foo", "from": 3}))
                .unwrap();
        assert_eq!(record.name, "foo");
        assert_eq!(record.path.as_deref(), Some("/r/foo"));
        assert_eq!(record.from, None);
        assert_eq!(record.extra["from"], json!(3));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"name": "foo", "path": "/r/foo", "from": 3}));
        let reloaded: DependencyRecord = serde_json::from_value(value).unwrap();
        assert_eq!(reloaded, record);

        let record = DependencyRecord::from_manifest_entry("bar", &json!({"name": 1})).unwrap();
        assert_eq!(record.name, "bar");
        assert!(record.extra.is_empty());
    }

    #[test]
    fn test_record_without_name_rejected() {
        assert!(serde_json::from_value::<DependencyRecord>(json!({"path": "/r/foo"})).is_err());
    }

    #[test]
    fn test_same_occurrence() {
        let a = DependencyRecord::new("foo").with_from("foo").with_path("/r/foo");
        let mut b = a.clone();
        b.extra.insert("version".to_string(), json!("2.0.0"));
        assert!(a.same_occurrence(&b));

        let c = DependencyRecord::new("foo").with_from("foo").with_path("/r/other");
        assert!(!a.same_occurrence(&c));
    }

    #[test]
    fn test_under_specified_never_duplicate() {
        let a = DependencyRecord::new("foo").with_path("/r/foo");
        let b = a.clone();
        assert!(!a.same_occurrence(&b));
    }
}
