//! apimap - resolve third-party API calls to exported function signatures
//!
//! This crate provides the library behind the `apimap` CLI: building the
//! dependency index from package-manager manifests, resolving call
//! expressions against per-package function catalogs, and narrowing
//! ambiguous matches with a ranking service.

pub mod core;
pub mod ops;
pub mod ranking;
pub mod resolver;
pub mod util;

/// Test utilities for apimap unit tests.
///
/// This module is only available when compiling with `--cfg test`. It lays
/// out manifests, catalogs and usage documents in a temporary workspace.
#[cfg(test)]
pub mod test_support;

pub use core::{ApiSignature, Catalog, DependencyRecord, MatchCandidate, UsageDocument};
pub use ops::ResolutionStats;
pub use resolver::{CatalogDir, DependencyIndex, InstallPathStrategy, SignatureResolver};
pub use util::Config;
