//! Test utilities for apimap unit tests.
//!
//! [`WorkspaceFixture`] lays out a temporary workspace with the directories
//! the pipeline reads: package-manager manifests, per-package catalogs keyed
//! by install path, collected package configs, and usage documents.
//!
//! # Example
//!
//! ```rust,ignore
//! use apimap::test_support::{fixtures, WorkspaceFixture};
//!
//! #[test]
//! fn test_example() {
//!     let ws = WorkspaceFixture::new();
//!     ws.add_package("node_modules/foo", fixtures::catalog(&["foo.init()"], &[]));
//!     ws.add_usage("web.json", fixtures::usage("src/a.js", &["<foo>.init()"]));
//! }
//! ```

pub mod fixtures;

use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;

use crate::resolver::CatalogKey;

/// A temporary workspace on disk.
///
/// Dropping the fixture removes the directory.
pub struct WorkspaceFixture {
    tmp: TempDir,
}

impl WorkspaceFixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let ws = WorkspaceFixture { tmp };
        let dirs = [
            ws.root(),
            ws.manifest_dir(),
            ws.catalog_dir(),
            ws.config_dir(),
            ws.usage_dir(),
        ];
        for dir in dirs {
            std::fs::create_dir_all(dir).expect("failed to create fixture dir");
        }
        ws
    }

    /// Root of the analyzed project; install paths live under it.
    pub fn root(&self) -> PathBuf {
        self.tmp.path().join("repo")
    }

    pub fn manifest_dir(&self) -> PathBuf {
        self.tmp.path().join("manifests")
    }

    pub fn catalog_dir(&self) -> PathBuf {
        self.tmp.path().join("catalogs")
    }

    pub fn config_dir(&self) -> PathBuf {
        self.tmp.path().join("configs")
    }

    pub fn usage_dir(&self) -> PathBuf {
        self.tmp.path().join("usage")
    }

    /// Any path inside the temporary directory.
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.tmp.path().join(relative)
    }

    /// Absolute install path for a path relative to the project root.
    pub fn install_path(&self, relative: &str) -> String {
        self.root().join(relative).to_string_lossy().to_string()
    }

    pub fn add_manifest(&self, file_name: &str, manifest: Value) {
        write_json(&self.manifest_dir().join(file_name), &manifest);
    }

    /// Install a package: create its directory and write its catalog.
    ///
    /// Returns the absolute install path.
    pub fn add_package(&self, relative: &str, catalog: Value) -> String {
        let install = self.root().join(relative);
        std::fs::create_dir_all(&install).expect("failed to create install dir");
        let key = CatalogKey::for_install_path(&install, &self.root());
        write_json(&self.catalog_dir().join(key.file_name()), &catalog);
        install.to_string_lossy().to_string()
    }

    pub fn add_usage(&self, file_name: &str, usage: Value) {
        write_json(&self.usage_dir().join(file_name), &usage);
    }

    /// Read a JSON file written by an operation.
    pub fn read_json(&self, path: impl AsRef<Path>) -> Value {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .unwrap_or_else(|_| panic!("file not found: {}", path.display()));
        serde_json::from_str(&contents).expect("invalid JSON")
    }
}

impl Default for WorkspaceFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn write_json(path: &Path, value: &Value) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create parent dir");
    }
    let contents = serde_json::to_string_pretty(value).expect("failed to serialize fixture");
    std::fs::write(path, contents).expect("failed to write fixture");
}

/// Assertion helpers for testing.
pub mod assertions {
    /// Assert that an error chain contains a substring.
    pub fn assert_error_contains<T: std::fmt::Debug>(
        result: Result<T, anyhow::Error>,
        substring: &str,
    ) {
        match result {
            Ok(v) => panic!("expected Err containing '{}', got Ok: {:?}", substring, v),
            Err(e) => {
                let msg = format!("{:#}", e);
                assert!(
                    msg.contains(substring),
                    "error '{}' does not contain '{}'",
                    msg,
                    substring
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_layout() {
        let ws = WorkspaceFixture::new();
        let install = ws.add_package(
            "node_modules/my-lib",
            fixtures::catalog(&["lib.run()"], &[]),
        );

        assert!(Path::new(&install).is_dir());
        assert!(ws.catalog_dir().join("node_modules-my_lib.json").is_file());
    }

    #[test]
    fn test_assert_error_contains() {
        let result: Result<(), anyhow::Error> =
            Err(anyhow::anyhow!("inner").context("failed to load"));
        assertions::assert_error_contains(result, "inner");
    }
}
