//! Chat-completion ranking backend.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::prompt::build_prompt;
use super::{RankError, RankRequest, Ranker};
use crate::util::config::RankerConfig;

/// Ranks candidates through an OpenAI-compatible `chat/completions` endpoint.
#[derive(Debug)]
pub struct HttpRanker {
    client: reqwest::blocking::Client,
    endpoint: Url,
    model: String,
    api_key: Option<String>,
    knowledge_base: String,
    max_attempts: u32,
    backoff_base_ms: u64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

impl HttpRanker {
    /// Create a ranker from the `[ranker]` config section.
    ///
    /// The API key is read from the environment variable named by
    /// `api_key_env`; requests are sent without a token if it is unset.
    pub fn from_config(config: &RankerConfig) -> Result<Self, RankError> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or(RankError::NotConfigured("ranker.base_url"))?;
        let model = config
            .model
            .clone()
            .ok_or(RankError::NotConfigured("ranker.model"))?;
        let endpoint = completions_url(base_url)?;

        let api_key = std::env::var(&config.api_key_env).ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            tracing::warn!("{} is not set, sending unauthenticated requests", config.api_key_env);
        }

        let knowledge_base = match &config.knowledge_base {
            Some(path) => std::fs::read_to_string(path).unwrap_or_else(|e| {
                tracing::warn!("failed to read knowledge base {}: {}", path.display(), e);
                String::new()
            }),
            None => String::new(),
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(HttpRanker {
            client,
            endpoint,
            model,
            api_key,
            knowledge_base,
            max_attempts: config.max_attempts.max(1),
            backoff_base_ms: config.backoff_base_ms,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn send(&self, body: &str) -> Result<String, RankError> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string());
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send()?;
        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(RankError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| RankError::Malformed(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(RankError::EmptyResponse)
    }
}

impl Ranker for HttpRanker {
    fn rank(&self, request: &RankRequest<'_>) -> Result<String, RankError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": build_prompt(request, &self.knowledge_base)}
            ]
        });
        let body = payload.to_string();

        let mut attempt = 0;
        loop {
            match self.send(&body) {
                Ok(reply) => return Ok(reply),
                // A well-formed reply without choices will not improve on retry.
                Err(RankError::EmptyResponse) => return Err(RankError::EmptyResponse),
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        return Err(e);
                    }
                    let delay = backoff_delay(self.backoff_base_ms, attempt - 1);
                    tracing::warn!(
                        "ranking attempt {}/{} failed: {}, retrying in {:?}",
                        attempt,
                        self.max_attempts,
                        e,
                        delay
                    );
                    std::thread::sleep(delay);
                }
            }
        }
    }
}

/// Join `chat/completions` onto a base URL, keeping its path.
fn completions_url(base_url: &str) -> Result<Url, RankError> {
    let invalid = |source| RankError::InvalidEndpoint {
        url: base_url.to_string(),
        source,
    };

    let mut base = Url::parse(base_url).map_err(invalid)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("chat/completions").map_err(invalid)
}

/// Delay before retry number `attempt` (zero-based).
fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    Duration::from_millis(base_ms.saturating_mul(1u64 << attempt.min(16)))
}
