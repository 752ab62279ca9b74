//! Candidate ranking.
//!
//! When a call matches several functions in one module, a [`Ranker`] is asked
//! which of them the call most likely refers to. The reply is plain text with
//! one signature per line.

pub mod http;
pub mod prompt;

pub use http::HttpRanker;

use thiserror::Error;

/// Everything a ranker sees about one ambiguous match.
#[derive(Debug, Clone, Copy)]
pub struct RankRequest<'a> {
    /// Raw call expression
    pub api: &'a str,

    /// How the module was imported, if known
    pub import_type: Option<&'a str>,

    /// Matched signatures to choose from
    pub candidates: &'a [String],

    /// Text of the matched package's `package.json`, if collected
    pub package_config: Option<&'a str>,
}

/// Errors from a ranking backend.
#[derive(Debug, Error)]
pub enum RankError {
    #[error("ranker is not configured: missing {0}")]
    NotConfigured(&'static str),

    #[error("invalid ranker endpoint `{url}`")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("ranking request failed")]
    Http(#[from] reqwest::Error),

    #[error("ranking request returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("ranking response contained no choices")]
    EmptyResponse,

    #[error("malformed ranking response: {0}")]
    Malformed(String),
}

/// Picks the most likely signatures out of a candidate list.
pub trait Ranker: Send + Sync {
    /// Return the raw reply text for one request.
    fn rank(&self, request: &RankRequest<'_>) -> Result<String, RankError>;
}

/// Stand-in used when no ranking service is configured.
///
/// Every request fails, so ambiguous matches keep all their candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRanker;

impl Ranker for NoRanker {
    fn rank(&self, _request: &RankRequest<'_>) -> Result<String, RankError> {
        Err(RankError::NotConfigured("ranker.base_url"))
    }
}

/// Split a ranker reply into signatures.
///
/// Blank lines are dropped; each line is trimmed and loses one layer of
/// matching single or double quotes.
pub fn parse_ranked_lines(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| strip_quotes(line).to_string())
        .collect()
}

fn strip_quotes(line: &str) -> &str {
    for quote in ['"', '\''] {
        if line.len() >= 2 && line.starts_with(quote) && line.ends_with(quote) {
            return &line[1..line.len() - 1];
        }
    }
    line
}
