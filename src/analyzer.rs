//! Entry point: fetch a set of revisions, diff each against its parent and aggregate the counts.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::instrument;

use crate::{
    api::{FetchError, RevisionSource},
    batch::{fetch_revision_pairs, RevisionPair},
    config::AnalyzerConfig,
    content::RevisionId,
    revision::{diff_entity, DiffRecord},
    total::Totals,
};

#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("failed to fetch revisions: {0}")]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub analyzed_count: usize,
    /// Requested IDs without a diff, in request order: ID 0, unsupported content models, hidden content,
    /// revisions the API did not return and revisions of failed batches.
    pub not_analyzed: Vec<RevisionId>,
    pub diffs: BTreeMap<RevisionId, DiffRecord>,
    pub totals: Totals,
}

pub struct Analyzer<S> {
    source: S,
    config: AnalyzerConfig,
}

impl<S: RevisionSource> Analyzer<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, AnalyzerConfig::default())
    }

    pub fn with_config(source: S, config: AnalyzerConfig) -> Self {
        Self {
            source,
            config: config.validated(),
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Analyze the given revisions. Duplicate IDs are analyzed once.
    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    pub fn analyze(&self, ids: &[RevisionId]) -> Result<AnalysisReport, AnalyzeError> {
        let mut seen = FxHashSet::default();
        let to_fetch: Vec<RevisionId> = ids
            .iter()
            .copied()
            .filter(|&id| id != 0 && seen.insert(id))
            .collect();

        let outcome = fetch_revision_pairs(&self.source, &to_fetch, &self.config)?;
        let report = summarize(ids, &outcome.pairs);

        tracing::info!(
            analyzed = report.analyzed_count,
            not_analyzed = report.not_analyzed.len(),
            failed_batches = outcome.failed_batches,
            "analysis finished"
        );
        Ok(report)
    }
}

#[cfg(feature = "http")]
impl Analyzer<crate::http::HttpSource> {
    /// An analyzer querying wikidata.org with default settings.
    pub fn wikidata() -> Self {
        Self::new(crate::http::HttpSource::default())
    }
}

/// Diff every requested revision that has content and fold the records into totals.
///
/// `requested` may contain duplicates; each revision is diffed and counted once, and `not_analyzed` keeps the
/// order of first occurrence.
pub fn summarize(
    requested: &[RevisionId],
    pairs: &BTreeMap<RevisionId, RevisionPair>,
) -> AnalysisReport {
    let mut seen = FxHashSet::default();
    let requested: Vec<RevisionId> = requested.iter().copied().filter(|&id| seen.insert(id)).collect();

    let mut diffs = BTreeMap::new();
    let mut totals = Totals::new();

    for revid in requested.iter().copied().filter(|&id| id != 0) {
        let Some(pair) = pairs.get(&revid) else {
            continue;
        };
        let Some(current) = &pair.current else {
            tracing::debug!(revid, "no content to analyze");
            continue;
        };
        let record = diff_entity(
            current,
            pair.parent.as_ref(),
            pair.comment.as_deref(),
            pair.model,
        )
        .to_record();
        totals.accumulate(&record);
        diffs.insert(revid, record);
    }

    let not_analyzed = requested
        .into_iter()
        .filter(|id| !diffs.contains_key(id))
        .collect();

    AnalysisReport {
        analyzed_count: diffs.len(),
        not_analyzed,
        diffs,
        totals,
    }
}
