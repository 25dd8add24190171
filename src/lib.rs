// SPDX-License-Identifier: MPL-2.0
//! # wikidata-diff
//!
//! Structural diffs between revisions of Wikidata entities (items, properties and lexemes), reduced to
//! per-category counts that can be aggregated over thousands of revisions.
//!
//! ## Overview
//!
//! For every revision ID, `wikidata-diff` fetches the revision's entity JSON and the JSON of its parent revision
//! from the MediaWiki API, compares the two field by field and records how many statements, references,
//! qualifiers, labels, descriptions, aliases, sitelinks, lemmas, forms and senses were added, removed or
//! changed. Edit summaries are classified too (merges, redirects, undo/restore, entity creation).
//!
//! **Key Features:**
//!
//! - **Batch Fetching**: Revisions are requested 50 at a time on a small worker pool, following API
//!   continuations and retrying when rate limited.
//! - **Shape Tolerant**: Absent, `null` and wrongly typed fields (e.g. `"claims": []`) are treated as empty
//!   instead of failing the analysis.
//! - **Pluggable Transport**: The core only depends on the [`api::RevisionSource`] trait. An HTTP implementation
//!   is included behind the default `http` feature.
//!
//! ## Getting Started
//!
//! ### Diffing Two Snapshots
//!
//! The field diffs work on plain [`serde_json::Value`]s and need no network access:
//!
//! ```rust
//! use serde_json::json;
//! use wikidata_diff::{content::ContentModel, revision::diff_entity};
//!
//! let parent = json!({"claims": {}});
//! let current = json!({"claims": {"P31": [{"mainsnak": {"property": "P31"}}]}});
//!
//! let diff = diff_entity(&current, Some(&parent), None, ContentModel::Item);
//! assert_eq!(diff.claims.claims.added.len(), 1);
//!
//! let record = diff.to_record();
//! assert_eq!(record.get("added_claims"), Some(1));
//! assert_eq!(record.get("removed_claims"), Some(0));
//! ```
//!
//! ### Analyzing Revisions from Wikidata
//!
//! ```rust,no_run
//! use wikidata_diff::analyzer::Analyzer;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let analyzer = Analyzer::wikidata();
//!     let report = analyzer.analyze(&[1596238100, 1898156691, 1895908644])?;
//!
//!     println!("analyzed {} revisions", report.analyzed_count);
//!     println!("{}", serde_json::to_string_pretty(&report.totals)?);
//!     Ok(())
//! }
//! ```
//!
//! ### Custom Sources
//!
//! Anything that answers a revisions query can be analyzed, e.g. recorded API responses:
//!
//! ```rust
//! use serde_json::json;
//! use wikidata_diff::{
//!     analyzer::Analyzer,
//!     api::{Continuation, RawApiResponse, RevisionSource, TransportError},
//!     content::RevisionId,
//! };
//!
//! struct Recorded(String);
//!
//! impl RevisionSource for Recorded {
//!     fn query_revisions(
//!         &self,
//!         _ids: &[RevisionId],
//!         _continuation: Option<&Continuation>,
//!     ) -> Result<RawApiResponse, TransportError> {
//!         RawApiResponse::from_json(&self.0)
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let content = json!({"labels": {"en": {"language": "en", "value": "Douglas Adams"}}});
//!     let body = json!({"query": {"pages": {"42": {"revisions": [{
//!         "revid": 5,
//!         "parentid": 0,
//!         "comment": "/* wbeditentity-create-item:0| */",
//!         "slots": {"main": {"contentmodel": "wikibase-item", "*": content.to_string()}},
//!     }]}}}});
//!
//!     let report = Analyzer::new(Recorded(body.to_string())).analyze(&[5, 0])?;
//!     assert_eq!(report.analyzed_count, 1);
//!     assert_eq!(report.not_analyzed, vec![0]);
//!     assert_eq!(report.totals.get("labels_added"), Some(1));
//!     assert_eq!(report.totals.get("create_item"), Some(1));
//!     Ok(())
//! }
//! ```
//!
//! ## Modules and API
//!
//! - [`api`]: the [`api::RevisionSource`] trait, raw response types and [`api::get_revision_contents`].
//! - [`batch`]: batched, parallel fetching of revisions together with their parents.
//! - [`content`], [`claims`], [`terms`], [`sitelinks`], [`lexeme`]: the field diffs.
//! - [`comment`]: edit summary classification.
//! - [`revision`]: selects the field diffs for a content model and produces a [`revision::DiffRecord`].
//! - [`total`], [`analyzer`]: aggregation and the [`analyzer::Analyzer`] entry point.
//!
//! ## Comparison Rules
//!
//! - Statements (by property), aliases (by language), qualifiers (by property), forms and senses are compared
//!   **by position**. Reordering is reported as changes, statements are never matched by their `id`.
//! - Labels, descriptions, lemmas, representations and glosses are compared by language, sitelinks by site.
//! - A revision without parent (the first revision of an entity) reports everything as added.
//!
//! ## Features and Configuration
//!
//! - `http` (default): [`http::HttpSource`] using `ureq`.
//! - `strict`: abort on the first failed batch instead of skipping its revisions.
//!
//! Batch size, worker count and the rate limit retry policy are set through [`config::AnalyzerConfig`].
//!
//! ### Logging and Error Handling
//!
//! - Uses the `tracing` crate for logging retries, truncated responses and failed batches.
//! - Fetching is designed to keep going when possible: revisions that cannot be analyzed end up in
//!   [`analyzer::AnalysisReport::not_analyzed`].
//!
//! ## Licensing
//!
//! This project is licensed under the Mozilla Public License 2.0.

pub mod analyzer;
pub mod api;
pub mod batch;
pub mod claims;
pub mod comment;
pub mod config;
pub mod content;
#[cfg(feature = "http")]
pub mod http;
pub mod lexeme;
pub mod revision;
pub mod sitelinks;
pub mod terms;
#[cfg(test)]
mod test_support;
pub mod total;
