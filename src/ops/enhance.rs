//! Batch resolution of call-usage documents.
//!
//! Each usage entry is checked against the exclusion policy, parsed into
//! candidate signatures, and resolved; the deduplicated matches replace the
//! raw entry. Entries that cannot be interpreted are passed through so later
//! stages can audit coverage.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use rayon::prelude::*;

use crate::core::{ApiSignature, EnrichedUsage, MatchCandidate, UsageDocument, UsageEntry};
use crate::ops::summary::ResolutionStats;
use crate::resolver::SignatureResolver;
use crate::util::config::PolicyConfig;
use crate::util::fs::{ensure_dir, json_files};

/// Why a call was not resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// Listed as nonexistent API surface
    Nonexistent,
    /// Listed as hard to resolve, or a default-export call
    HardToResolve,
    /// A call on the result of another call
    ApiOfApi,
}

/// Check a raw call expression against the exclusion policy.
pub fn classify(policy: &PolicyConfig, api: &str) -> Option<Exclusion> {
    if policy.nonexistent.contains(api) {
        return Some(Exclusion::Nonexistent);
    }
    if policy.hard_to_resolve.contains(api)
        || (!policy.default_export_suffix.is_empty() && api.ends_with(&policy.default_export_suffix))
    {
        return Some(Exclusion::HardToResolve);
    }
    if !policy.api_of_api_marker.is_empty() && api.contains(&policy.api_of_api_marker) {
        return Some(Exclusion::ApiOfApi);
    }
    None
}

/// Resolves usage entries and keeps the counters.
pub struct Aggregator<'a> {
    resolver: &'a SignatureResolver<'a>,
    policy: &'a PolicyConfig,
}

impl<'a> Aggregator<'a> {
    pub fn new(resolver: &'a SignatureResolver<'a>, policy: &'a PolicyConfig) -> Self {
        Aggregator { resolver, policy }
    }

    /// Resolve every candidate signature of a call, deduplicated.
    ///
    /// Returns `None` if the expression does not parse as a call.
    pub fn resolve_call(&self, api: &str, origin: Option<&Path>) -> Option<Vec<MatchCandidate>> {
        let signatures = ApiSignature::parse_call(api);
        if signatures.is_empty() {
            return None;
        }

        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for signature in &signatures {
            for candidate in self.resolver.resolve(signature, origin) {
                if seen.insert(candidate.clone()) {
                    unique.push(candidate);
                }
            }
        }

        Some(unique)
    }

    /// Process one usage entry.
    ///
    /// Returns the entry to emit, or `None` if the policy drops it.
    pub fn process_entry(
        &self,
        file_key: &str,
        entry: UsageEntry,
        stats: &mut ResolutionStats,
    ) -> Option<UsageEntry> {
        stats.total_api_calls += 1;

        let call = match entry {
            UsageEntry::Enriched(usage) => {
                if !usage.matched_module.is_empty() {
                    stats.matched_api_calls_count += 1;
                }
                return Some(UsageEntry::Enriched(usage));
            }
            UsageEntry::Other(value) => {
                if is_truthy(value.get("matched_module")) {
                    stats.matched_api_calls_count += 1;
                }
                return Some(UsageEntry::Other(value));
            }
            UsageEntry::Call(call) => call,
        };

        if call.api.is_empty() {
            return Some(UsageEntry::Call(call));
        }

        match classify(self.policy, &call.api) {
            Some(Exclusion::Nonexistent) => {
                stats.api_in_black_list += 1;
                return None;
            }
            Some(Exclusion::HardToResolve) => {
                stats.api_in_hard_list += 1;
                return None;
            }
            Some(Exclusion::ApiOfApi) => {
                stats.api_of_api_count += 1;
                return None;
            }
            None => {}
        }

        let Some(matches) = self.resolve_call(&call.api, Some(Path::new(file_key))) else {
            tracing::debug!("not a call expression: {}", call.api);
            return Some(UsageEntry::Call(call));
        };

        stats.record_resolved(matches.len());
        if matches.is_empty() {
            tracing::info!("no matching function signature: {}", call.api);
        }

        Some(UsageEntry::Enriched(EnrichedUsage::from_candidates(
            &call, &matches,
        )))
    }

    /// Resolve every entry of a document.
    ///
    /// Documents without `apiUsage` are returned unchanged with empty stats.
    pub fn enhance_document(&self, mut doc: UsageDocument) -> (UsageDocument, ResolutionStats) {
        let mut stats = ResolutionStats::new();

        if let Some(api_usage) = doc.api_usage.take() {
            let enhanced = api_usage
                .into_iter()
                .map(|(file_key, entries)| {
                    let entries = entries
                        .into_iter()
                        .filter_map(|entry| self.process_entry(&file_key, entry, &mut stats))
                        .collect();
                    (file_key, entries)
                })
                .collect();
            doc.api_usage = Some(enhanced);
        }

        (doc, stats)
    }

    /// Enhance one usage file into `output_dir`, under the same file name.
    ///
    /// Files without `apiUsage` produce no output.
    pub fn enhance_file(&self, input: &Path, output_dir: &Path) -> Result<ResolutionStats> {
        let doc = UsageDocument::load(input)?;
        if doc.api_usage.is_none() {
            tracing::debug!("{} has no apiUsage, skipping", input.display());
            return Ok(ResolutionStats::new());
        }

        let (doc, stats) = self.enhance_document(doc);

        let file_name = input
            .file_name()
            .with_context(|| format!("input has no file name: {}", input.display()))?;
        let output = output_dir.join(file_name);
        doc.save(&output)?;

        tracing::info!("enhanced {} -> {}", input.display(), output.display());
        Ok(stats)
    }
}

fn is_truthy(value: Option<&serde_json::Value>) -> bool {
    match value {
        None | Some(serde_json::Value::Null) => false,
        Some(serde_json::Value::Array(items)) => !items.is_empty(),
        Some(serde_json::Value::Object(map)) => !map.is_empty(),
        Some(serde_json::Value::String(s)) => !s.is_empty(),
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::Number(_)) => true,
    }
}

/// Options for [`enhance_dir`].
#[derive(Debug, Clone, Default)]
pub struct EnhanceOptions {
    /// Number of parallel jobs (None = sequential)
    pub jobs: Option<usize>,

    /// Progress bar ticked once per file
    pub progress: Option<ProgressBar>,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default)]
pub struct EnhanceReport {
    /// Files found in the input directory
    pub files: usize,

    /// Files that could not be processed
    pub failed: Vec<PathBuf>,

    /// Counters merged over all files
    pub stats: ResolutionStats,
}

/// Enhance every `*.json` usage file in `input_dir`.
///
/// A file that fails to load or write is logged and contributes no counts.
pub fn enhance_dir(
    aggregator: &Aggregator<'_>,
    input_dir: &Path,
    output_dir: &Path,
    opts: &EnhanceOptions,
) -> Result<EnhanceReport> {
    ensure_dir(output_dir)?;
    let files = json_files(input_dir)?;
    tracing::info!("found {} usage files", files.len());

    let run_one = |input: &PathBuf| -> (PathBuf, Option<ResolutionStats>) {
        let result = aggregator.enhance_file(input, output_dir);
        if let Some(pb) = &opts.progress {
            pb.inc(1);
        }
        match result {
            Ok(stats) => (input.clone(), Some(stats)),
            Err(e) => {
                tracing::warn!("failed to enhance {}: {:#}", input.display(), e);
                (input.clone(), None)
            }
        }
    };

    let outcomes: Vec<_> = match opts.jobs {
        Some(jobs) if jobs > 1 => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .context("failed to build thread pool")?;
            pool.install(|| files.par_iter().map(run_one).collect::<Vec<_>>())
        }
        _ => files.iter().map(run_one).collect(),
    };

    let mut report = EnhanceReport {
        files: files.len(),
        ..Default::default()
    };
    for (path, stats) in outcomes {
        match stats {
            Some(stats) => report.stats += stats,
            None => report.failed.push(path),
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Catalog, DependencyRecord};
    use crate::resolver::{CatalogKey, CatalogMap, DependencyIndex};
    use serde_json::json;

    struct Setup {
        root: PathBuf,
        index: DependencyIndex,
        catalogs: CatalogMap,
        policy: PolicyConfig,
    }

    impl Setup {
        fn new() -> Self {
            let root = PathBuf::from("/repo");
            let mut index = DependencyIndex::new();
            let mut catalogs = CatalogMap::new();

            let mut add = |name: &str, path: &str, catalog: serde_json::Value| {
                index.insert(name, DependencyRecord::new(name).with_from(name).with_path(path));
                catalogs.insert(
                    CatalogKey::for_install_path(Path::new(path), &root),
                    serde_json::from_value::<Catalog>(catalog).unwrap(),
                );
            };
            add(
                "foo",
                "/repo/node_modules/foo",
                json!({"functions": ["foo.init()"], "reexports": {}}),
            );
            add(
                "@s/ui",
                "/repo/node_modules/@s/ui",
                json!({"functions": ["Button.show()", "Dialog.show()"], "reexports": {}}),
            );

            let mut policy = PolicyConfig::default();
            policy.nonexistent.insert("<fs-extra>.mkdirSync()".to_string());
            policy.hard_to_resolve.insert("<vitest>.it()".to_string());

            Setup { root, index, catalogs, policy }
        }

        fn run(&self, doc: serde_json::Value) -> (serde_json::Value, ResolutionStats) {
            let resolver = SignatureResolver::new(&self.index, &self.catalogs, &self.root);
            let aggregator = Aggregator::new(&resolver, &self.policy);
            let doc: UsageDocument = serde_json::from_value(doc).unwrap();
            let (doc, stats) = aggregator.enhance_document(doc);
            (serde_json::to_value(doc).unwrap(), stats)
        }
    }

    fn usage(entries: serde_json::Value) -> serde_json::Value {
        json!({"apiUsage": {"src/index.js": entries}})
    }

    #[test]
    fn test_classify() {
        let policy = Setup::new().policy;
        assert_eq!(classify(&policy, "<fs-extra>.mkdirSync()"), Some(Exclusion::Nonexistent));
        assert_eq!(classify(&policy, "<vitest>.it()"), Some(Exclusion::HardToResolve));
        assert_eq!(classify(&policy, "<lib>.default()"), Some(Exclusion::HardToResolve));
        assert_eq!(classify(&policy, "<lib>.a…b()"), Some(Exclusion::ApiOfApi));
        assert_eq!(classify(&policy, "<lib>.run()"), None);
    }

    #[test]
    fn test_single_match() {
        let (out, stats) = Setup::new().run(usage(json!([
            {"api": "<foo>.init()", "importType": "esm"}
        ])));

        assert_eq!(
            out["apiUsage"]["src/index.js"][0],
            json!({
                "api": "<foo>.init()",
                "importType": "esm",
                "matched_module": [{
                    "moduleName": "foo",
                    "modulePath": "/repo/node_modules/foo",
                    "matched_functions": ["foo.init()"],
                }],
            })
        );
        assert_eq!(stats.total_api_calls, 1);
        assert_eq!(stats.matched_api_calls_count, 1);
        assert_eq!(stats.matched_apis_with_exactly_one_function, 1);
    }

    #[test]
    fn test_scoped_package_candidates_deduplicated() {
        let (out, stats) = Setup::new().run(usage(json!([
            {"api": "<@s/ui>.show()", "importType": "esm"}
        ])));

        let modules = &out["apiUsage"]["src/index.js"][0]["matched_module"];
        assert_eq!(modules.as_array().unwrap().len(), 1);
        assert_eq!(
            modules[0]["matched_functions"],
            json!(["Button.show()", "Dialog.show()"])
        );
        assert_eq!(stats.matched_api_calls_count, 1);
        assert_eq!(stats.matched_apis_with_exactly_one_function, 0);
    }

    #[test]
    fn test_exclusions_dropped_and_counted() {
        let (out, stats) = Setup::new().run(usage(json!([
            {"api": "<fs-extra>.mkdirSync()", "importType": "cjs"},
            {"api": "<vitest>.it()", "importType": "esm"},
            {"api": "<foo>.default()", "importType": "esm"},
            {"api": "<foo>.init…then()", "importType": "esm"},
        ])));

        assert_eq!(out["apiUsage"]["src/index.js"], json!([]));
        assert_eq!(stats.total_api_calls, 4);
        assert_eq!(stats.api_in_black_list, 1);
        assert_eq!(stats.api_in_hard_list, 2);
        assert_eq!(stats.api_of_api_count, 1);
        assert_eq!(stats.matched_api_calls_count, 0);
    }

    #[test]
    fn test_unresolved_and_unparsable_entries_kept() {
        let (out, stats) = Setup::new().run(usage(json!([
            {"api": "<foo>.missing()", "importType": "esm"},
            {"api": "require(foo)", "importType": "cjs", "line": 3},
            {"importType": "esm"},
            {"api": "require(bar)"},
        ])));

        let entries = &out["apiUsage"]["src/index.js"];
        assert_eq!(entries[0]["matched_module"], json!([]));
        assert_eq!(
            entries[1],
            json!({"api": "require(foo)", "importType": "cjs", "line": 3})
        );
        assert_eq!(entries[2], json!({"importType": "esm"}));
        assert_eq!(entries[3], json!({"api": "require(bar)"}));
        assert_eq!(stats.total_api_calls, 4);
        assert_eq!(stats.matched_api_calls_count, 0);
    }

    #[test]
    fn test_already_enriched_passthrough() {
        let entry = json!({
            "api": "<foo>.init()",
            "importType": "esm",
            "line": 7,
            "matched_module": [{
                "moduleName": "foo",
                "modulePath": "/elsewhere/foo",
                "matched_functions": ["foo.init()"],
                "note": 1,
            }],
        });
        let (out, stats) = Setup::new().run(usage(json!([entry.clone()])));

        assert_eq!(out["apiUsage"]["src/index.js"][0], entry);
        assert_eq!(stats.total_api_calls, 1);
        assert_eq!(stats.matched_api_calls_count, 1);
        assert_eq!(stats.matched_apis_with_exactly_one_function, 0);
    }

    #[test]
    fn test_document_without_usage() {
        let (out, stats) = Setup::new().run(json!({"callGraph": {}}));
        assert_eq!(out, json!({"callGraph": {}}));
        assert_eq!(stats, ResolutionStats::new());
    }

    #[test]
    fn test_enhance_dir_parallel() {
        use crate::resolver::CatalogDir;
        use crate::test_support::{fixtures, WorkspaceFixture};

        let ws = WorkspaceFixture::new();
        let foo = ws.add_package("node_modules/foo", fixtures::catalog(&["foo.init()"], &[]));
        ws.add_usage("a.json", fixtures::usage("src/a.js", &["<foo>.init()", "<foo>.default()"]));
        ws.add_usage("b.json", fixtures::usage("src/b.js", &["<foo>.init()", "<bar>.run()"]));
        ws.add_usage("c.json", json!({"callGraph": {}}));
        std::fs::write(ws.usage_dir().join("broken.json"), "{").unwrap();

        let mut index = DependencyIndex::new();
        index.insert("foo", DependencyRecord::new("foo").with_from("foo").with_path(foo.as_str()));
        let catalogs = CatalogDir::new(ws.catalog_dir());
        let root = ws.root();
        let resolver = SignatureResolver::new(&index, &catalogs, &root);
        let policy = PolicyConfig::default();
        let aggregator = Aggregator::new(&resolver, &policy);

        let output = ws.path("out");
        let opts = EnhanceOptions {
            jobs: Some(2),
            progress: None,
        };
        let report = enhance_dir(&aggregator, &ws.usage_dir(), &output, &opts).unwrap();

        assert_eq!(report.files, 4);
        assert_eq!(report.failed, vec![ws.usage_dir().join("broken.json")]);
        assert_eq!(report.stats.total_api_calls, 4);
        assert_eq!(report.stats.matched_api_calls_count, 2);
        assert_eq!(report.stats.api_in_hard_list, 1);

        let a = ws.read_json(output.join("a.json"));
        assert_eq!(a["apiUsage"]["src/a.js"].as_array().unwrap().len(), 1);
        assert_eq!(
            a["apiUsage"]["src/a.js"][0]["matched_module"][0]["modulePath"],
            json!(foo)
        );
        assert!(!output.join("c.json").exists());
    }
}
