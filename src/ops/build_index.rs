//! Dependency index construction.

use std::path::Path;

use anyhow::Result;

use crate::core::ManifestDocument;
use crate::resolver::{DependencyIndex, IndexBuilder};
use crate::util::fs::{json_files, write_lines};

/// Outcome of building the dependency index.
#[derive(Debug, Clone, Default)]
pub struct BuildIndexReport {
    /// Manifests merged into the index
    pub manifests: usize,

    /// Manifests skipped because they could not be read or parsed
    pub skipped: usize,

    /// Distinct package names
    pub packages: usize,

    /// Distinct install paths
    pub unique_paths: usize,

    /// SHA-256 of the written index
    pub digest: String,
}

/// Build the index from every manifest in `manifest_dir`.
///
/// Manifests are read in file-name order, so the same directory always yields
/// the same index. Unreadable manifests are logged and skipped.
pub fn build_index(manifest_dir: &Path) -> Result<(DependencyIndex, Vec<String>, BuildIndexReport)> {
    let files = json_files(manifest_dir)?;
    tracing::info!("found {} manifest files", files.len());

    let mut builder = IndexBuilder::new();
    let mut report = BuildIndexReport::default();

    for file in &files {
        match ManifestDocument::load(file) {
            Ok(manifest) => {
                tracing::debug!("merging {}", file.display());
                builder.add_manifest(&manifest);
                report.manifests += 1;
            }
            Err(e) => {
                tracing::warn!("skipping manifest: {:#}", anyhow::Error::from(e));
                report.skipped += 1;
            }
        }
    }

    let (index, paths) = builder.finish();
    report.packages = index.len();
    report.unique_paths = paths.len();
    report.digest = index.digest()?;

    Ok((index, paths.into_iter().collect(), report))
}

/// Build the index and write it, plus the unique install path listing.
pub fn write_index(manifest_dir: &Path, index_out: &Path, paths_out: &Path) -> Result<BuildIndexReport> {
    let (index, paths, report) = build_index(manifest_dir)?;

    index.save(index_out)?;
    tracing::info!("wrote {} packages to {}", report.packages, index_out.display());

    write_lines(paths_out, &paths)?;
    tracing::info!("wrote {} install paths to {}", report.unique_paths, paths_out.display());

    Ok(report)
}
