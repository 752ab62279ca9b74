//! Call-usage documents.
//!
//! The analyzer writes one document per workspace module:
//!
//! ```json
//! { "apiUsage": { "<file>": [ { "api": "<pkg>.fn()", "importType": "esm" } ] } }
//! ```
//!
//! Resolution rewrites each entry into an enriched form carrying the matched
//! modules and functions. Every other member of the document is preserved.

use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One concrete resolution result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchCandidate {
    /// Package name the signature was found under
    pub module_name: String,

    /// Install path of that package
    pub module_path: String,

    /// Matched function signature
    pub function_signature: String,
}

/// One observed call against an imported module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCallRecord {
    /// Raw call expression
    pub api: String,

    /// How the module was imported
    #[serde(rename = "importType", default, skip_serializing_if = "Option::is_none")]
    pub import_type: Option<String>,

    /// Other analyzer fields, kept when the entry is passed through
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ApiCallRecord {
    pub fn new(api: impl Into<String>, import_type: Option<&str>) -> Self {
        ApiCallRecord {
            api: api.into(),
            import_type: import_type.map(str::to_string),
            extra: serde_json::Map::new(),
        }
    }
}

/// Functions matched in one module for one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedModule {
    #[serde(rename = "moduleName")]
    pub module_name: String,

    #[serde(rename = "modulePath")]
    pub module_path: String,

    /// Candidate signatures, in first-seen order
    pub matched_functions: Vec<String>,

    /// Candidates narrowed by the ranking stage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filtered_functions: Option<Vec<String>>,

    /// Members added by other tools
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A call enriched with its resolution results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedUsage {
    pub api: String,

    #[serde(rename = "importType", default)]
    pub import_type: Option<String>,

    #[serde(alias = "matchedModule")]
    pub matched_module: Vec<MatchedModule>,

    /// Members added by other tools
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl EnrichedUsage {
    /// Group deduplicated candidates by `(module name, module path)`.
    ///
    /// Groups and the functions inside them keep first-seen order.
    pub fn from_candidates(call: &ApiCallRecord, candidates: &[MatchCandidate]) -> Self {
        let mut groups: IndexMap<(&str, &str), Vec<String>> = IndexMap::new();
        for candidate in candidates {
            groups
                .entry((&candidate.module_name, &candidate.module_path))
                .or_default()
                .push(candidate.function_signature.clone());
        }

        let matched_module = groups
            .into_iter()
            .map(|((name, path), functions)| MatchedModule {
                module_name: name.to_string(),
                module_path: path.to_string(),
                matched_functions: functions,
                filtered_functions: None,
                extra: serde_json::Map::new(),
            })
            .collect();

        EnrichedUsage {
            api: call.api.clone(),
            import_type: call.import_type.clone(),
            matched_module,
            extra: serde_json::Map::new(),
        }
    }

    /// Total number of matched functions across modules.
    pub fn match_count(&self) -> usize {
        self.matched_module
            .iter()
            .map(|m| m.matched_functions.len())
            .sum()
    }
}

/// An entry of a file's usage list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UsageEntry {
    /// Already resolved
    Enriched(EnrichedUsage),
    /// Raw analyzer output
    Call(ApiCallRecord),
    /// Anything else, carried through verbatim
    Other(Value),
}

/// A call-usage document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageDocument {
    /// Usage lists keyed by owning file
    #[serde(rename = "apiUsage", default, skip_serializing_if = "Option::is_none")]
    pub api_usage: Option<IndexMap<String, Vec<UsageEntry>>>,

    /// Remaining members of the document
    #[serde(flatten)]
    pub rest: serde_json::Map<String, Value>,
}

impl UsageDocument {
    /// Load a usage document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read usage file: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse usage file: {}", path.display()))
    }

    /// Save a usage document as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(self).context("failed to serialize usage document")?;
        crate::util::fs::write_string(path, &contents)
    }
}
