//! Workspace module listing and package config collection.

use std::path::Path;

use anyhow::Result;

use crate::resolver::CatalogKey;
use crate::util::fs::{ensure_dir, write_string};

/// First-party workspace modules from an install path listing.
///
/// Drops blank lines and anything under `node_modules`, sorted.
pub fn workspace_modules<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut modules: Vec<String> = lines
        .into_iter()
        .map(|line| line.as_ref().trim().to_string())
        .filter(|line| !line.is_empty() && !line.contains("node_modules"))
        .collect();
    modules.sort();
    modules
}

/// Outcome of collecting package configs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectReport {
    pub written: usize,
    pub skipped: usize,
}

/// Copy each install path's `package.json` into `out_dir`.
///
/// Files are named by the catalog key of their install path, so the ranking
/// stage finds them from a match's module path.
pub fn collect_configs<I, S>(paths: I, workspace_root: &Path, out_dir: &Path) -> Result<CollectReport>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ensure_dir(out_dir)?;
    let mut report = CollectReport::default();

    for path in paths {
        let path = Path::new(path.as_ref());
        let manifest = path.join("package.json");

        if !manifest.is_file() {
            tracing::warn!("no package.json in {}, skipping", path.display());
            report.skipped += 1;
            continue;
        }

        let parsed = std::fs::read_to_string(&manifest)
            .map_err(anyhow::Error::from)
            .and_then(|s| serde_json::from_str::<serde_json::Value>(&s).map_err(Into::into));
        let value = match parsed {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("failed to read {}: {:#}", manifest.display(), e);
                report.skipped += 1;
                continue;
            }
        };

        let key = CatalogKey::for_install_path(path, workspace_root);
        let target = out_dir.join(key.file_name());
        let written = serde_json::to_string_pretty(&value)
            .map_err(anyhow::Error::from)
            .and_then(|contents| write_string(&target, &contents));
        if let Err(e) = written {
            tracing::warn!("failed to write {}: {:#}", target.display(), e);
            report.skipped += 1;
            continue;
        }

        tracing::debug!("collected {} as {}", manifest.display(), key);
        report.written += 1;
    }

    Ok(report)
}
