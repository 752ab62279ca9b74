//! Narrowing ambiguous matches with a ranker.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::ProgressBar;

use crate::core::{EnrichedUsage, MatchedModule, UsageDocument, UsageEntry};
use crate::ranking::{parse_ranked_lines, RankRequest, Ranker};
use crate::resolver::CatalogKey;
use crate::util::fs::{ensure_dir, json_files};

/// Counters for a filter run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// Matched modules visited
    pub modules: u64,

    /// Modules sent to the ranker
    pub ranked: u64,

    /// Ranked modules that kept every candidate after a failure or an unusable reply
    pub fallbacks: u64,
}

impl FilterStats {
    fn merge(&mut self, other: &FilterStats) {
        self.modules += other.modules;
        self.ranked += other.ranked;
        self.fallbacks += other.fallbacks;
    }
}

/// Outcome of [`filter_dir`].
#[derive(Debug, Clone, Default)]
pub struct FilterReport {
    pub files: usize,
    pub failed: Vec<PathBuf>,
    pub stats: FilterStats,
}

/// Fills `filtered_functions` for every matched module.
pub struct ModuleFilter<'a> {
    ranker: &'a dyn Ranker,
    config_dir: &'a Path,
    workspace_root: &'a Path,
}

impl<'a> ModuleFilter<'a> {
    pub fn new(ranker: &'a dyn Ranker, config_dir: &'a Path, workspace_root: &'a Path) -> Self {
        ModuleFilter {
            ranker,
            config_dir,
            workspace_root,
        }
    }

    /// Read the collected `package.json` for a module, if present.
    fn package_config(&self, module_path: &str) -> Option<String> {
        let key = CatalogKey::for_install_path(Path::new(module_path), self.workspace_root);
        let path = self.config_dir.join(key.file_name());
        match std::fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("package config not found: {}", path.display());
                None
            }
            Err(e) => {
                tracing::warn!("failed to read package config {}: {}", path.display(), e);
                None
            }
        }
    }

    fn filter_module(
        &self,
        usage_api: &str,
        import_type: Option<&str>,
        module: &mut MatchedModule,
        stats: &mut FilterStats,
    ) {
        stats.modules += 1;

        if module.matched_functions.len() <= 1 {
            module.filtered_functions = Some(module.matched_functions.clone());
            return;
        }

        stats.ranked += 1;
        let config = self.package_config(&module.module_path);
        let request = RankRequest {
            api: usage_api,
            import_type,
            candidates: &module.matched_functions,
            package_config: config.as_deref(),
        };

        let chosen = match self.ranker.rank(&request) {
            Ok(reply) => select_candidates(&reply, &module.matched_functions),
            Err(e) => {
                tracing::warn!("ranking failed for {}: {:#}", usage_api, anyhow::Error::from(e));
                Vec::new()
            }
        };

        if chosen.is_empty() {
            stats.fallbacks += 1;
            tracing::debug!(
                "keeping all {} candidates for {}",
                module.matched_functions.len(),
                usage_api
            );
            module.filtered_functions = Some(module.matched_functions.clone());
        } else {
            module.filtered_functions = Some(chosen);
        }
    }

    fn filter_usage(&self, usage: &mut EnrichedUsage, stats: &mut FilterStats) {
        let EnrichedUsage {
            api,
            import_type,
            matched_module,
            ..
        } = usage;
        for module in matched_module.iter_mut() {
            self.filter_module(api, import_type.as_deref(), module, stats);
        }
    }

    /// Filter every enriched entry of a document in place.
    pub fn filter_document(&self, doc: &mut UsageDocument) -> FilterStats {
        let mut stats = FilterStats::default();
        if let Some(api_usage) = doc.api_usage.as_mut() {
            for entry in api_usage.values_mut().flatten() {
                if let UsageEntry::Enriched(usage) = entry {
                    self.filter_usage(usage, &mut stats);
                }
            }
        }
        stats
    }

    /// Filter one file into `output_dir`, under the same file name.
    pub fn filter_file(&self, input: &Path, output_dir: &Path) -> Result<FilterStats> {
        let mut doc = UsageDocument::load(input)?;
        let stats = self.filter_document(&mut doc);

        let file_name = input
            .file_name()
            .with_context(|| format!("input has no file name: {}", input.display()))?;
        doc.save(&output_dir.join(file_name))?;
        Ok(stats)
    }
}

/// Keep the reply lines that name a candidate, in reply order, once each.
fn select_candidates(reply: &str, candidates: &[String]) -> Vec<String> {
    let mut chosen: Vec<String> = Vec::new();
    for line in parse_ranked_lines(reply) {
        if !candidates.contains(&line) {
            tracing::debug!("ranker returned a non-candidate: {}", line);
        } else if !chosen.contains(&line) {
            chosen.push(line);
        }
    }
    chosen
}

/// Filter every `*.json` file of `input_dir`, in file-name order.
///
/// Files that fail to load are logged and skipped.
pub fn filter_dir(
    filter: &ModuleFilter<'_>,
    input_dir: &Path,
    output_dir: &Path,
    progress: Option<&ProgressBar>,
) -> Result<FilterReport> {
    ensure_dir(output_dir)?;
    let files = json_files(input_dir)?;
    tracing::info!("found {} files to filter", files.len());

    let mut report = FilterReport {
        files: files.len(),
        ..Default::default()
    };

    for (i, input) in files.iter().enumerate() {
        match filter.filter_file(input, output_dir) {
            Ok(stats) => {
                report.stats.merge(&stats);
                tracing::info!("filtered {} ({}/{})", input.display(), i + 1, files.len());
            }
            Err(e) => {
                tracing::warn!("failed to filter {}: {:#}", input.display(), e);
                report.failed.push(input.clone());
            }
        }
        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    Ok(report)
}
