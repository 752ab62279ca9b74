//! Installed-dependency manifest documents.
//!
//! A manifest document is what the package manager reports for one workspace
//! module: either a single object or an array of objects, each optionally
//! holding `dependencies`, `devDependencies` and `unsavedDependencies` tables.

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::core::dependency::{DependencyKind, DependencyRecord};

/// Error loading a manifest document.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest `{}`", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A parsed manifest document.
#[derive(Debug, Clone)]
pub struct ManifestDocument {
    root: Value,
}

impl ManifestDocument {
    /// Wrap an already parsed JSON value.
    pub fn from_value(root: Value) -> Self {
        ManifestDocument { root }
    }

    /// Parse a manifest from a string.
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents).map(ManifestDocument::from_value)
    }

    /// Load a manifest from disk.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The package objects in this document.
    fn packages(&self) -> Vec<&serde_json::Map<String, Value>> {
        match &self.root {
            Value::Object(object) => vec![object],
            Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
            _ => Vec::new(),
        }
    }

    /// Every well-formed dependency entry, in document order.
    ///
    /// Yields `(declared name, record)` pairs. Tables that are not mappings and
    /// entries that are not objects are skipped.
    pub fn dependencies(&self) -> Vec<(String, DependencyRecord)> {
        let mut entries = Vec::new();

        for package in self.packages() {
            for kind in DependencyKind::ALL {
                let Some(table) = package.get(kind.manifest_key()).and_then(Value::as_object)
                else {
                    continue;
                };

                for (dep_name, info) in table {
                    if let Some(record) = DependencyRecord::from_manifest_entry(dep_name, info) {
                        entries.push((dep_name.clone(), record));
                    }
                }
            }
        }

        entries
    }
}
