//! [`RevisionSource`] backed by the live MediaWiki action API.

use std::time::Duration;

use crate::{
    api::{Continuation, RawApiResponse, RevisionSource, TransportError},
    content::RevisionId,
};

pub const WIKIDATA_API_URL: &str = "https://www.wikidata.org/w/api.php";

// the API cuts responses off at around 12 MiB, leave some headroom
const MAX_RESPONSE_BYTES: u64 = 32 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSourceConfig {
    pub api_url: String,
    /// Wikimedia asks API clients to identify themselves with contact information.
    pub user_agent: String,
    /// Upper bound for a single request including reading the body.
    pub timeout: Duration,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            api_url: WIKIDATA_API_URL.to_owned(),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_owned(),
            timeout: Duration::from_secs(60),
        }
    }
}

pub struct HttpSource {
    agent: ureq::Agent,
    config: HttpSourceConfig,
}

impl HttpSource {
    pub fn new(config: HttpSourceConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .build()
            .into();
        Self { agent, config }
    }

    pub fn config(&self) -> &HttpSourceConfig {
        &self.config
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new(HttpSourceConfig::default())
    }
}

/// Query parameters of a revisions request, continuation parameters last.
pub(crate) fn query_parameters(
    ids: &[RevisionId],
    continuation: Option<&Continuation>,
) -> Vec<(String, String)> {
    let revids = ids
        .iter()
        .map(RevisionId::to_string)
        .collect::<Vec<_>>()
        .join("|");

    let mut parameters: Vec<(String, String)> = [
        ("action", "query"),
        ("prop", "revisions"),
        ("rvslots", "main"),
        ("rvprop", "content|ids|comment"),
        ("format", "json"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_owned(), value.to_owned()))
    .collect();
    parameters.push(("revids".to_owned(), revids));
    parameters.extend(continuation.into_iter().flatten().map(|(key, value)| (key.clone(), value.clone())));
    parameters
}

fn map_error(error: ureq::Error) -> TransportError {
    match error {
        ureq::Error::StatusCode(429) => TransportError::RateLimited,
        ureq::Error::StatusCode(status) => TransportError::Status(status),
        other => TransportError::Request(other.to_string()),
    }
}

impl RevisionSource for HttpSource {
    fn query_revisions(
        &self,
        ids: &[RevisionId],
        continuation: Option<&Continuation>,
    ) -> Result<RawApiResponse, TransportError> {
        let mut request = self
            .agent
            .get(&self.config.api_url)
            .header("User-Agent", &self.config.user_agent);
        for (key, value) in query_parameters(ids, continuation) {
            request = request.query(key, value);
        }

        tracing::debug!(ids = ids.len(), continued = continuation.is_some(), "querying revisions");
        let mut response = request.call().map_err(map_error)?;
        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_RESPONSE_BYTES)
            .read_to_string()
            .map_err(map_error)?;

        RawApiResponse::from_json(&body)
    }
}
