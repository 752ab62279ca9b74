//! Core data structures for apimap.
//!
//! This module contains the documents and records the pipeline passes around:
//! - Dependency records and the manifests they come from
//! - Call expressions and their candidate signatures
//! - Function catalogs
//! - Call-usage documents and resolution results

pub mod catalog;
pub mod dependency;
pub mod manifest;
pub mod signature;
pub mod usage;

pub use catalog::{Catalog, ReexportList};
pub use dependency::{DependencyKind, DependencyRecord};
pub use manifest::{ManifestDocument, ManifestError};
pub use signature::ApiSignature;
pub use usage::{
    ApiCallRecord, EnrichedUsage, MatchCandidate, MatchedModule, UsageDocument, UsageEntry,
};
