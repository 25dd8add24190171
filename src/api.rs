//! Retrieval of revision content from the MediaWiki action API.
//!
//! The transport is abstracted behind [`RevisionSource`]; this module only knows the shape of a
//! `action=query&prop=revisions` response and how to turn its revisions into [`RevisionRecord`]s.

use std::{collections::BTreeMap, thread};

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::{
    config::RetryPolicy,
    content::{ContentModel, RevisionId},
};

/// The `continue` object of a response, echoed back verbatim as request parameters.
pub type Continuation = BTreeMap<String, String>;

/// Anything that can answer a revisions query for a list of revision IDs.
pub trait RevisionSource: Sync {
    fn query_revisions(
        &self,
        ids: &[RevisionId],
        continuation: Option<&Continuation>,
    ) -> Result<RawApiResponse, TransportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("rate limited by the API")]
    RateLimited,
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("API error {code}: {info}")]
    Api { code: String, info: String },
    #[error("request failed: {0}")]
    Request(String),
    #[error("malformed API response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("still rate limited after {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("content of revision {revid} is not valid JSON")]
    MalformedContent {
        revid: RevisionId,
        #[source]
        source: serde_json::Error,
    },
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawApiResponse {
    /// Pages by page ID.
    pub pages: Option<BTreeMap<String, RawPage>>,
    pub continuation: Option<Continuation>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPage {
    /// Missing when the API truncated the response, not when the page has no revisions.
    #[serde(default)]
    pub revisions: Option<Vec<RawRevision>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawRevision {
    #[serde(default)]
    pub revid: Option<RevisionId>,
    #[serde(default)]
    pub parentid: Option<RevisionId>,
    #[serde(default)]
    pub comment: Option<String>,
    /// Present (usually as `""`) when the content was suppressed.
    #[serde(default)]
    pub texthidden: Option<Value>,
    #[serde(default)]
    pub commenthidden: Option<Value>,
    #[serde(default)]
    pub slots: Option<RawSlots>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawSlots {
    #[serde(default)]
    pub main: Option<RawSlot>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawSlot {
    #[serde(default)]
    pub contentmodel: Option<String>,
    /// The serialized entity JSON.
    #[serde(rename = "*", default)]
    pub content: Option<String>,
}

impl RawRevision {
    fn main_slot(&self) -> Option<&RawSlot> {
        self.slots.as_ref()?.main.as_ref()
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    query: Option<EnvelopeQuery>,
    #[serde(rename = "continue", default)]
    continuation: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    error: Option<EnvelopeError>,
}

#[derive(Deserialize)]
struct EnvelopeQuery {
    #[serde(default)]
    pages: Option<BTreeMap<String, RawPage>>,
}

#[derive(Deserialize)]
struct EnvelopeError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    info: String,
}

impl RawApiResponse {
    /// Parse a raw response body (`format=json`, format version 1).
    ///
    /// API error objects become [`TransportError::Api`], except for the throttling codes `ratelimited` and
    /// `maxlag`, which become [`TransportError::RateLimited`].
    pub fn from_json(body: &str) -> Result<Self, TransportError> {
        let envelope: Envelope = serde_json::from_str(body)
            .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;

        if let Some(error) = envelope.error {
            return Err(match error.code.as_str() {
                "ratelimited" | "maxlag" => TransportError::RateLimited,
                _ => TransportError::Api {
                    code: error.code,
                    info: error.info,
                },
            });
        }

        // continuation values are strings in practice, but render anything else instead of dropping it
        let continuation = envelope.continuation.map(|continuation| {
            continuation
                .into_iter()
                .map(|(key, value)| match value {
                    Value::String(value) => (key, value),
                    other => (key, other.to_string()),
                })
                .collect()
        });

        Ok(Self {
            pages: envelope.query.and_then(|query| query.pages),
            continuation,
        })
    }
}

/// A revision as needed for diffing.
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionRecord {
    pub revid: RevisionId,
    /// `Some(0)` for the first revision of an entity.
    pub parentid: Option<RevisionId>,
    /// `None` if the content is hidden or missing.
    pub content: Option<Value>,
    pub comment: Option<String>,
    pub model: ContentModel,
}

pub type RevisionRecords = FxHashMap<RevisionId, RevisionRecord>;

/// Turn one raw revision into a record.
///
/// Returns `Ok(None)` for revisions with a non-Wikibase content model. A revision without a usable `revid`
/// becomes an empty record with ID 0.
pub fn parse_revision(raw: &RawRevision) -> Result<Option<RevisionRecord>, FetchError> {
    let Some(model) = raw
        .main_slot()
        .and_then(|slot| slot.contentmodel.as_deref())
        .and_then(ContentModel::from_api_name)
    else {
        tracing::trace!(revid = ?raw.revid, "skipping revision with unsupported content model");
        return Ok(None);
    };

    let revid = match raw.revid {
        Some(revid) if revid != 0 => revid,
        _ => {
            tracing::debug!("revision without revid in response");
            return Ok(Some(RevisionRecord {
                revid: 0,
                parentid: None,
                content: None,
                comment: None,
                model: ContentModel::Item,
            }));
        }
    };

    if raw.texthidden.is_some() {
        return Ok(Some(RevisionRecord {
            revid,
            parentid: raw.parentid,
            content: None,
            comment: None,
            model,
        }));
    }

    let content = match raw.main_slot().and_then(|slot| slot.content.as_deref()) {
        Some(content) => Some(
            serde_json::from_str(content)
                .map_err(|source| FetchError::MalformedContent { revid, source })?,
        ),
        None => None,
    };
    let comment = if raw.commenthidden.is_some() {
        None
    } else {
        raw.comment.clone()
    };

    Ok(Some(RevisionRecord {
        revid,
        parentid: raw.parentid,
        content,
        comment,
        model,
    }))
}

/// Query `source` once, retrying while rate limited.
fn query_with_retry<S: RevisionSource + ?Sized>(
    source: &S,
    ids: &[RevisionId],
    continuation: Option<&Continuation>,
    retry: &RetryPolicy,
) -> Result<RawApiResponse, FetchError> {
    let max_attempts = retry.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match source.query_revisions(ids, continuation) {
            Err(TransportError::RateLimited) if attempt < max_attempts => {
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay = ?retry.delay,
                    "rate limited, retrying"
                );
                thread::sleep(retry.delay);
                attempt += 1;
            }
            Err(TransportError::RateLimited) => {
                return Err(FetchError::RateLimitExhausted {
                    attempts: max_attempts,
                })
            }
            result => return result.map_err(FetchError::from),
        }
    }
}

/// Fetch and parse the given revisions.
///
/// Duplicates and the sentinel ID 0 are removed before querying; no request is made if nothing remains.
/// Continuations are followed until the API reports completion and revisions of the same page from
/// different responses are concatenated.
#[instrument(skip(source, ids, retry), fields(ids = ids.len()))]
pub fn get_revision_contents<S: RevisionSource + ?Sized>(
    source: &S,
    ids: &[RevisionId],
    retry: &RetryPolicy,
) -> Result<RevisionRecords, FetchError> {
    let mut seen = FxHashSet::default();
    let ids: Vec<RevisionId> = ids
        .iter()
        .copied()
        .filter(|&id| id != 0 && seen.insert(id))
        .collect();
    if ids.is_empty() {
        return Ok(RevisionRecords::default());
    }

    let mut pages: BTreeMap<String, Vec<RawRevision>> = BTreeMap::new();
    let mut continuation: Option<Continuation> = None;
    loop {
        let response = query_with_retry(source, &ids, continuation.as_ref(), retry)?;
        tracing::debug!(
            pages = response.pages.as_ref().map_or(0, BTreeMap::len),
            has_continuation = response.continuation.is_some(),
            "received response"
        );

        for (page_id, page) in response.pages.into_iter().flatten() {
            match page.revisions {
                Some(revisions) => pages.entry(page_id).or_default().extend(revisions),
                None => {
                    tracing::warn!(page_id = %page_id, "page without revisions in response, probably truncated")
                }
            }
        }

        match response.continuation {
            Some(next) if continuation.as_ref() == Some(&next) => {
                return Err(TransportError::MalformedResponse(
                    "continuation did not advance".to_owned(),
                )
                .into())
            }
            Some(next) => continuation = Some(next),
            None => break,
        }
    }

    let mut records = RevisionRecords::default();
    for revision in pages.values().flatten() {
        if let Some(record) = parse_revision(revision)? {
            records.insert(record.revid, record);
        }
    }
    Ok(records)
}
