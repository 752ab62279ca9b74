//! Resolution error types.

use std::path::PathBuf;

use thiserror::Error;

/// Fault reading one catalog file.
///
/// These never abort a batch: the resolver logs them and treats the catalog
/// as having no matches.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog `{}`", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CatalogError {
    /// The catalog file involved.
    pub fn path(&self) -> &PathBuf {
        match self {
            CatalogError::Io { path, .. } | CatalogError::Parse { path, .. } => path,
        }
    }
}
