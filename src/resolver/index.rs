//! Aggregated dependency index.
//!
//! Every manifest in the workspace contributes its dependency records; the
//! index maps each package name to the distinct occurrences seen anywhere,
//! in first-seen order. It is built once per run and only read afterwards.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::{DependencyRecord, ManifestDocument};

/// Package name to observed dependency occurrences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyIndex {
    packages: IndexMap<String, Vec<DependencyRecord>>,
}

impl DependencyIndex {
    pub fn new() -> Self {
        DependencyIndex::default()
    }

    /// Load a previously written index file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read dependency index: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse dependency index: {}", path.display()))
    }

    /// Write the index as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        crate::util::fs::write_string(path, &self.to_json()?)
    }

    fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize dependency index")
    }

    /// Hex SHA-256 of the serialized index.
    ///
    /// Two builds over the same manifests produce the same digest.
    pub fn digest(&self) -> Result<String> {
        let json = self.to_json()?;
        Ok(hex::encode(Sha256::digest(json.as_bytes())))
    }

    /// Add one occurrence under `dep_name` unless an identical one is present.
    ///
    /// Returns true if the record was added.
    pub fn insert(&mut self, dep_name: &str, record: DependencyRecord) -> bool {
        let records = self.packages.entry(dep_name.to_string()).or_default();
        if records.iter().any(|existing| existing.same_occurrence(&record)) {
            return false;
        }
        records.push(record);
        true
    }

    /// Occurrences recorded for a package.
    pub fn get(&self, name: &str) -> Option<&[DependencyRecord]> {
        self.packages.get(name).map(Vec::as_slice)
    }

    /// Distinct install paths recorded for a package, in record order.
    pub fn install_paths(&self, name: &str) -> Vec<&str> {
        let mut paths: Vec<&str> = Vec::new();
        for path in self
            .get(name)
            .unwrap_or_default()
            .iter()
            .filter_map(|r| r.path.as_deref())
        {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
        paths
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// Number of package names.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<DependencyRecord>)> {
        self.packages.iter()
    }
}

/// Accumulates manifests into a [`DependencyIndex`].
#[derive(Debug, Default)]
pub struct IndexBuilder {
    index: DependencyIndex,
    unique_paths: BTreeSet<String>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        IndexBuilder::default()
    }

    /// Merge every dependency entry of one manifest document.
    pub fn add_manifest(&mut self, manifest: &ManifestDocument) {
        for (dep_name, record) in manifest.dependencies() {
            if let Some(path) = &record.path {
                self.unique_paths.insert(path.clone());
            }
            self.index.insert(&dep_name, record);
        }
    }

    pub fn finish(self) -> (DependencyIndex, BTreeSet<String>) {
        (self.index, self.unique_paths)
    }
}
