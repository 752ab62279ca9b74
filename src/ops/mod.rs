//! High-level operations.
//!
//! This module contains the implementation of apimap commands.

pub mod build_index;
pub mod configs;
pub mod enhance;
pub mod filter;
pub mod summary;

pub use build_index::{build_index, write_index, BuildIndexReport};
pub use configs::{collect_configs, workspace_modules, CollectReport};
pub use enhance::{classify, enhance_dir, Aggregator, EnhanceOptions, EnhanceReport, Exclusion};
pub use filter::{filter_dir, FilterReport, FilterStats, ModuleFilter};
pub use summary::ResolutionStats;
