//! Fetching large revision sets in batches, together with the parent of every revision.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        mpsc,
    },
    thread,
};

use serde_json::Value;
use tracing::instrument;

use crate::{
    api::{get_revision_contents, FetchError, RevisionRecords, RevisionSource},
    config::{AnalyzerConfig, RetryPolicy},
    content::{ContentModel, RevisionId},
};

/// A revision joined with the content of its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionPair {
    pub revid: RevisionId,
    pub parentid: Option<RevisionId>,
    /// `None` if the content is hidden.
    pub current: Option<Value>,
    /// `None` for the first revision of an entity, and whenever the parent content could not be obtained.
    pub parent: Option<Value>,
    pub comment: Option<String>,
    pub model: ContentModel,
}

impl RevisionPair {
    /// The revision created its entity.
    pub fn is_first_revision(&self) -> bool {
        self.parentid == Some(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub pairs: BTreeMap<RevisionId, RevisionPair>,
    /// Number of batches that were skipped after an error.
    pub failed_batches: usize,
}

/// The records of one batch and of its parents. A failed parent fetch leaves the children usable.
type BatchResult = Result<(RevisionRecords, Result<RevisionRecords, FetchError>), FetchError>;

/// Fetch one batch and then the parents of everything it returned.
fn fetch_batch<S: RevisionSource + ?Sized>(
    source: &S,
    batch: &[RevisionId],
    retry: &RetryPolicy,
) -> BatchResult {
    let children = get_revision_contents(source, batch, retry)?;
    let parent_ids: BTreeSet<RevisionId> = children
        .values()
        .filter_map(|record| record.parentid)
        .filter(|&parentid| parentid != 0)
        .collect();
    let parent_ids: Vec<RevisionId> = parent_ids.into_iter().collect();
    let parents = get_revision_contents(source, &parent_ids, retry);
    Ok((children, parents))
}

/// Fetch `ids` and their parents in batches of `config.batch_size` on `config.workers` threads.
///
/// A batch that fails is logged and skipped, so its revisions are simply missing from the result. If only the
/// parents of a batch cannot be fetched, its revisions are kept and paired with no parent. With the `strict`
/// feature the first failure of either kind is returned instead.
#[instrument(skip(source, ids, config), fields(ids = ids.len()))]
pub fn fetch_revision_pairs<S: RevisionSource + ?Sized>(
    source: &S,
    ids: &[RevisionId],
    config: &AnalyzerConfig,
) -> Result<BatchOutcome, FetchError> {
    let config = config.clone().validated();
    let batches: Vec<&[RevisionId]> = ids.chunks(config.batch_size).collect();
    let workers = config.workers.min(batches.len());
    tracing::debug!(batches = batches.len(), workers, "fetching revisions");

    let mut revision_contents = RevisionRecords::default();
    let mut parent_contents = RevisionRecords::default();
    let mut failed_batches = 0;
    let mut first_error = None;

    let next_batch = AtomicUsize::new(0);
    let abort = AtomicBool::new(false);
    let (sender, receiver) = mpsc::channel::<(usize, BatchResult)>();

    thread::scope(|scope| {
        for _ in 0..workers {
            let sender = sender.clone();
            let (batches, next_batch, abort, retry) = (&batches, &next_batch, &abort, &config.retry);
            scope.spawn(move || {
                while !abort.load(Ordering::Relaxed) {
                    let index = next_batch.fetch_add(1, Ordering::Relaxed);
                    let Some(batch) = batches.get(index) else {
                        break;
                    };
                    if sender.send((index, fetch_batch(source, batch, retry))).is_err() {
                        break;
                    }
                }
            });
        }
        // the receiver loop ends once every worker dropped its sender
        drop(sender);

        for (index, result) in receiver {
            match result {
                Ok((children, Ok(parents))) => {
                    revision_contents.extend(children);
                    parent_contents.extend(parents);
                }
                Ok((children, Err(error))) => {
                    tracing::error!(batch = index, %error, "failed to fetch parents of batch");
                    revision_contents.extend(children);
                    if cfg!(feature = "strict") {
                        abort.store(true, Ordering::Relaxed);
                    }
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
                Err(error) => {
                    tracing::error!(batch = index, %error, "failed to fetch batch");
                    failed_batches += 1;
                    if cfg!(feature = "strict") {
                        abort.store(true, Ordering::Relaxed);
                    } else {
                        tracing::warn!(
                            batch = index,
                            "skipping batch, its revisions will not be analyzed"
                        );
                    }
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
            }
        }
    });

    if cfg!(feature = "strict") {
        if let Some(error) = first_error {
            return Err(error);
        }
    }

    let pairs = revision_contents
        .into_iter()
        .map(|(revid, record)| {
            let parent = match record.parentid {
                Some(parentid) if parentid != 0 => parent_contents
                    .get(&parentid)
                    .and_then(|parent| parent.content.clone()),
                _ => None,
            };
            let pair = RevisionPair {
                revid,
                parentid: record.parentid,
                current: record.content,
                parent,
                comment: record.comment,
                model: record.model,
            };
            (revid, pair)
        })
        .collect();

    Ok(BatchOutcome {
        pairs,
        failed_batches,
    })
}
