//! Fixtures shared by the unit and integration tests: JSON builders for entity content and a scripted
//! in-memory [`RevisionSource`].

use std::{
    collections::{BTreeMap, VecDeque},
    sync::Mutex,
};

use rustc_hash::FxHashSet;
use serde_json::{json, Map, Value};

use crate::{
    api::{Continuation, RawApiResponse, RawPage, RawRevision, RawSlot, RawSlots, RevisionSource, TransportError},
    content::RevisionId,
};

pub mod prelude {
    pub(crate) use super::proptest as proptest_support;
    pub(crate) use super::{entity, form, sense, sitelink, statement, statement_with, terms, MockSource};
    pub(crate) use proptest::prelude::*;
    pub(crate) use serde_json::json;
}

/// Wrap fields into an item-like entity object.
pub fn entity(fields: Value) -> Value {
    let mut object = Map::new();
    object.insert("type".into(), json!("item"));
    object.insert("id".into(), json!("Q1"));
    if let Value::Object(fields) = fields {
        object.extend(fields);
    }
    Value::Object(object)
}

fn snak(property: &str, value: &str) -> Value {
    json!({
        "snaktype": "value",
        "property": property,
        "datavalue": {"value": value, "type": "string"},
    })
}

pub fn statement(value: &str) -> Value {
    json!({
        "mainsnak": snak("P1", value),
        "type": "statement",
        "rank": "normal",
    })
}

pub fn statement_with(value: &str, qualifiers: Value, references: Value) -> Value {
    let mut statement = statement(value);
    statement["qualifiers"] = qualifiers;
    statement["references"] = references;
    statement
}

/// A reference whose `snaks` are distinct for distinct `value`s.
pub fn reference(value: &str) -> Value {
    json!({
        "hash": format!("hash-{value}"),
        "snaks": {"P248": [snak("P248", value)]},
        "snaks-order": ["P248"],
    })
}

pub fn terms(values: &[(&str, &str)]) -> Value {
    Value::Object(
        values
            .iter()
            .map(|(lang, value)| {
                (
                    lang.to_string(),
                    json!({"language": lang, "value": value}),
                )
            })
            .collect(),
    )
}

pub fn aliases(values: &[(&str, &[&str])]) -> Value {
    Value::Object(
        values
            .iter()
            .map(|(lang, aliases)| {
                let aliases = aliases
                    .iter()
                    .map(|value| json!({"language": lang, "value": value}))
                    .collect();
                (lang.to_string(), Value::Array(aliases))
            })
            .collect(),
    )
}

pub fn sitelink(site: &str, title: &str) -> Value {
    json!({"site": site, "title": title, "badges": []})
}

pub fn form(id: &str, representations: &[(&str, &str)], claims: Value) -> Value {
    json!({
        "id": id,
        "representations": terms(representations),
        "grammaticalFeatures": [],
        "claims": claims,
    })
}

pub fn sense(id: &str, glosses: &[(&str, &str)], claims: Value) -> Value {
    json!({
        "id": id,
        "glosses": terms(glosses),
        "claims": claims,
    })
}

pub fn raw_revision(
    revid: RevisionId,
    parentid: Option<RevisionId>,
    model: &str,
    content: Option<&Value>,
    comment: Option<&str>,
) -> RawRevision {
    RawRevision {
        revid: Some(revid),
        parentid,
        comment: comment.map(str::to_owned),
        texthidden: None,
        commenthidden: None,
        slots: Some(RawSlots {
            main: Some(RawSlot {
                contentmodel: Some(model.to_owned()),
                content: content.map(Value::to_string),
            }),
        }),
    }
}

/// An in-memory revisions API.
///
/// Answers with every known revision among the requested IDs, `page_size` revisions per response, and records
/// the ID list of every call (retries included).
pub struct MockSource {
    revisions: Vec<(String, RawRevision)>,
    page_size: usize,
    truncated: FxHashSet<RevisionId>,
    broken: FxHashSet<RevisionId>,
    rate_limits: Mutex<u32>,
    failures: Mutex<VecDeque<TransportError>>,
    calls: Mutex<Vec<Vec<RevisionId>>>,
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            revisions: Vec::new(),
            page_size: usize::MAX,
            truncated: FxHashSet::default(),
            broken: FxHashSet::default(),
            rate_limits: Mutex::new(0),
            failures: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_raw(mut self, page: &str, revision: RawRevision) -> Self {
        self.revisions.push((page.to_owned(), revision));
        self
    }

    pub fn with_revision(
        self,
        revid: RevisionId,
        parentid: RevisionId,
        model: &str,
        content: Value,
        comment: Option<&str>,
    ) -> Self {
        let page = format!("page-{revid}");
        self.with_raw(
            &page,
            raw_revision(revid, Some(parentid), model, Some(&content), comment),
        )
    }

    pub fn with_item(self, revid: RevisionId, parentid: RevisionId, content: Value) -> Self {
        self.with_revision(revid, parentid, "wikibase-item", content, None)
    }

    /// Return at most `page_size` revisions per response and a continuation for the rest.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Omit the `revisions` of the page holding `revid`, as the API does for oversized responses.
    pub fn with_truncated(mut self, revid: RevisionId) -> Self {
        self.truncated.insert(revid);
        self
    }

    /// Fail every request that asks for `revid`.
    pub fn with_broken(mut self, revid: RevisionId) -> Self {
        self.broken.insert(revid);
        self
    }

    /// Answer the next `count` calls with [`TransportError::RateLimited`].
    pub fn with_rate_limits(self, count: u32) -> Self {
        *self.rate_limits.lock().unwrap() = count;
        self
    }

    /// Answer the next call with `error`.
    pub fn with_failure(self, error: TransportError) -> Self {
        self.failures.lock().unwrap().push_back(error);
        self
    }

    pub fn calls(&self) -> Vec<Vec<RevisionId>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn requested_ids(&self) -> FxHashSet<RevisionId> {
        self.calls().into_iter().flatten().collect()
    }
}

impl RevisionSource for MockSource {
    fn query_revisions(
        &self,
        ids: &[RevisionId],
        continuation: Option<&Continuation>,
    ) -> Result<RawApiResponse, TransportError> {
        self.calls.lock().unwrap().push(ids.to_vec());

        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        {
            let mut rate_limits = self.rate_limits.lock().unwrap();
            if *rate_limits > 0 {
                *rate_limits -= 1;
                return Err(TransportError::RateLimited);
            }
        }
        if ids.iter().any(|id| self.broken.contains(id)) {
            return Err(TransportError::Status(500));
        }

        let matching: Vec<&(String, RawRevision)> = self
            .revisions
            .iter()
            .filter(|(_, revision)| revision.revid.is_some_and(|revid| ids.contains(&revid)))
            .collect();

        let offset: usize = continuation
            .and_then(|continuation| continuation.get("rvcontinue"))
            .and_then(|offset| offset.parse().ok())
            .unwrap_or(0);
        let end = offset.saturating_add(self.page_size).min(matching.len());

        let mut pages: BTreeMap<String, RawPage> = BTreeMap::new();
        for (page, revision) in &matching[offset.min(end)..end] {
            let entry = pages.entry(page.clone()).or_default();
            if revision.revid.is_some_and(|revid| self.truncated.contains(&revid)) {
                continue;
            }
            entry
                .revisions
                .get_or_insert_with(Vec::new)
                .push(revision.clone());
        }

        let continuation = (end < matching.len()).then(|| {
            Continuation::from([
                ("rvcontinue".to_owned(), end.to_string()),
                ("continue".to_owned(), "||".to_owned()),
            ])
        });

        Ok(RawApiResponse {
            pages: Some(pages),
            continuation,
        })
    }
}

pub mod proptest {
    use std::collections::BTreeMap;

    use proptest::prelude::*;
    use serde_json::{json, Map, Value};

    const PROPERTIES: &[&str] = &["P31", "P21", "P18", "P856"];
    const LANGUAGES: &[&str] = &["en", "de", "fr", "he"];
    const SITES: &[&str] = &["enwiki", "dewiki", "arzwiki"];
    const VALUES: &[&str] = &["Q1", "Q2", "Q5", "x"];

    fn value() -> impl Strategy<Value = &'static str> {
        prop::sample::select(VALUES)
    }

    /// Empty maps are serialized as `[]` by the API, so do the same here.
    fn object_or_empty_array(map: Map<String, Value>) -> Value {
        if map.is_empty() {
            json!([])
        } else {
            Value::Object(map)
        }
    }

    prop_compose! {
        pub fn any_statement()
                (value in value(),
                 qualifiers in prop::collection::vec(value(), 0..3),
                 references in prop::collection::vec(value(), 0..3))
        -> Value {
            let qualifiers: Vec<Value> = qualifiers.into_iter().map(|q| json!({"datavalue": q})).collect();
            let qualifiers = if qualifiers.is_empty() { json!({}) } else { json!({"P585": qualifiers}) };
            super::statement_with(
                value,
                qualifiers,
                Value::Array(references.into_iter().map(super::reference).collect()),
            )
        }
    }

    pub fn any_claims() -> impl Strategy<Value = Value> {
        prop::collection::btree_map(
            prop::sample::select(PROPERTIES),
            prop::collection::vec(any_statement(), 0..3),
            0..=PROPERTIES.len(),
        )
        .prop_map(|claims| {
            object_or_empty_array(
                claims
                    .into_iter()
                    .map(|(property, statements)| (property.to_owned(), Value::Array(statements)))
                    .collect(),
            )
        })
    }

    fn term_map(values: BTreeMap<&str, &str>) -> Value {
        object_or_empty_array(
            values
                .into_iter()
                .map(|(lang, value)| (lang.to_owned(), json!({"language": lang, "value": value})))
                .collect(),
        )
    }

    pub fn any_terms() -> impl Strategy<Value = Value> {
        prop::collection::btree_map(prop::sample::select(LANGUAGES), value(), 0..=LANGUAGES.len())
            .prop_map(term_map)
    }

    pub fn any_aliases() -> impl Strategy<Value = Value> {
        prop::collection::btree_map(
            prop::sample::select(LANGUAGES),
            prop::collection::vec(value(), 0..4),
            0..=LANGUAGES.len(),
        )
        .prop_map(|aliases| {
            object_or_empty_array(
                aliases
                    .into_iter()
                    .map(|(lang, values)| {
                        let values = values
                            .into_iter()
                            .map(|value| json!({"language": lang, "value": value}))
                            .collect();
                        (lang.to_owned(), Value::Array(values))
                    })
                    .collect(),
            )
        })
    }

    pub fn any_sitelinks() -> impl Strategy<Value = Value> {
        prop::collection::btree_map(prop::sample::select(SITES), value(), 0..=SITES.len()).prop_map(
            |sitelinks| {
                object_or_empty_array(
                    sitelinks
                        .into_iter()
                        .map(|(site, title)| (site.to_owned(), super::sitelink(site, title)))
                        .collect(),
                )
            },
        )
    }

    prop_compose! {
        pub fn any_sub_entity(term_field: &'static str)
                (terms in any_terms(), claims in any_claims())
        -> Value {
            let mut entry = Map::new();
            entry.insert(term_field.to_owned(), terms);
            entry.insert("claims".to_owned(), claims);
            Value::Object(entry)
        }
    }

    prop_compose! {
        /// An entity carrying every field family, so it can be diffed under any content model.
        pub fn any_entity()
                (claims in any_claims(),
                 labels in any_terms(),
                 descriptions in any_terms(),
                 aliases in any_aliases(),
                 sitelinks in any_sitelinks(),
                 lemmas in any_terms(),
                 forms in prop::collection::vec(any_sub_entity("representations"), 0..3),
                 senses in prop::collection::vec(any_sub_entity("glosses"), 0..3))
        -> Value {
            super::entity(json!({
                "claims": claims,
                "labels": labels,
                "descriptions": descriptions,
                "aliases": aliases,
                "sitelinks": sitelinks,
                "lemmas": lemmas,
                "forms": forms,
                "senses": senses,
            }))
        }
    }
}
