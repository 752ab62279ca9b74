//! Catalog location.
//!
//! Catalogs (and collected package configs) are stored flat in one directory,
//! one file per install path. The file key is derived from the install path
//! relative to the workspace root: `-` becomes `_`, then each path separator
//! becomes `-`, and the root itself maps to `root`. Writers and readers must
//! derive keys the same way; a mismatch shows up only as missing catalogs.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::sync::{Arc, RwLock};

use crate::core::Catalog;
use crate::resolver::errors::CatalogError;
use crate::util::fs::relative_path;

/// Key used for the workspace root itself.
pub const ROOT_KEY: &str = "root";

/// File key of a catalog, without extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogKey(String);

impl CatalogKey {
    /// Derive the key for `install_path` under `workspace_root`.
    pub fn for_install_path(install_path: &Path, workspace_root: &Path) -> Self {
        let relative = relative_path(workspace_root, install_path);
        let relative = relative.to_string_lossy();

        if relative.is_empty() || relative == "." {
            return CatalogKey(ROOT_KEY.to_string());
        }

        let key = relative
            .replace('-', "_")
            .replace(MAIN_SEPARATOR, "-");
        CatalogKey(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the catalog document.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Somewhere catalogs can be looked up by key.
pub trait CatalogSource: Send + Sync {
    /// Load the catalog stored under `key`.
    ///
    /// `Ok(None)` means there is no catalog for this key, which is a normal
    /// outcome.
    fn load(&self, key: &CatalogKey) -> Result<Option<Arc<Catalog>>, CatalogError>;
}

/// Catalogs stored as `<key>.json` files in one directory.
///
/// Parsed catalogs are cached, since popular packages are looked up once per
/// call site.
pub struct CatalogDir {
    dir: PathBuf,
    cache: RwLock<HashMap<CatalogKey, Option<Arc<Catalog>>>>,
}

impl CatalogDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CatalogDir {
            dir: dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Path of the catalog file for a key.
    pub fn path_for(&self, key: &CatalogKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    fn read(&self, key: &CatalogKey) -> Result<Option<Arc<Catalog>>, CatalogError> {
        let path = self.path_for(key);
        if !path.exists() {
            tracing::debug!("no catalog at {}", path.display());
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path).map_err(|source| CatalogError::Io {
            path: path.clone(),
            source,
        })?;
        let catalog =
            Catalog::parse(&contents).map_err(|source| CatalogError::Parse { path, source })?;

        Ok(Some(Arc::new(catalog)))
    }
}

impl CatalogSource for CatalogDir {
    fn load(&self, key: &CatalogKey) -> Result<Option<Arc<Catalog>>, CatalogError> {
        if let Ok(cache) = self.cache.read() {
            if let Some(hit) = cache.get(key) {
                return Ok(hit.clone());
            }
        }

        // Faults are not cached; the next lookup retries the read.
        let loaded = self.read(key)?;
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key.clone(), loaded.clone());
        }
        Ok(loaded)
    }
}

/// In-memory catalogs, keyed directly.
#[derive(Debug, Default)]
pub struct CatalogMap {
    catalogs: HashMap<CatalogKey, Arc<Catalog>>,
}

impl CatalogMap {
    pub fn new() -> Self {
        CatalogMap::default()
    }

    /// Register the catalog for an install path.
    pub fn insert(&mut self, key: CatalogKey, catalog: Catalog) {
        self.catalogs.insert(key, Arc::new(catalog));
    }
}

impl CatalogSource for CatalogMap {
    fn load(&self, key: &CatalogKey) -> Result<Option<Arc<Catalog>>, CatalogError> {
        Ok(self.catalogs.get(key).cloned())
    }
}
