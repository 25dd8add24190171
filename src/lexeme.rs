//! Forms and senses of lexemes.
//!
//! Both are positional arrays of sub-entities. A form carries `representations` (one value per language)
//! and its own `claims`; a sense carries `glosses` and `claims`. These nested families are only looked at
//! for forms/senses that were added, removed or changed, mirroring how statements treat their references.

use serde::Serialize;
use serde_json::Value;

use crate::{
    claims::diff_nested_claims,
    content::{list_field, walk_list, Change, FieldDiff, Locator},
    terms::diff_terms,
};

/// Diff of one sub-entity array. Locators of `terms` and `claims` are [`Locator::Nested`] in the index of
/// the owning form/sense.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubEntityDiff {
    pub entries: FieldDiff,
    pub terms: FieldDiff,
    pub claims: FieldDiff,
}

impl SubEntityDiff {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.terms.is_empty() && self.claims.is_empty()
    }
}

/// Forms, their representations and their statements.
pub fn diff_forms(current: &Value, parent: Option<&Value>) -> SubEntityDiff {
    diff_sub_entities(current, parent, "forms", "representations")
}

/// Senses, their glosses and their statements.
pub fn diff_senses(current: &Value, parent: Option<&Value>) -> SubEntityDiff {
    diff_sub_entities(current, parent, "senses", "glosses")
}

fn diff_sub_entities(
    current: &Value,
    parent: Option<&Value>,
    field: &str,
    term_field: &str,
) -> SubEntityDiff {
    let mut diff = SubEntityDiff::default();

    walk_list(
        list_field(current, field),
        parent.map(|parent| list_field(parent, field)),
        |index, change| {
            diff.entries.push(change.kind(), Locator::Index { index });

            let (terms, claims) = match change {
                Change::Added(entry) => (
                    diff_terms(entry, None, term_field),
                    diff_nested_claims(entry, None),
                ),
                Change::Removed(entry) => (
                    diff_terms(entry, None, term_field).reversed(),
                    diff_nested_claims(entry, None).reversed(),
                ),
                Change::Changed { current, parent } => (
                    diff_terms(current, Some(parent), term_field),
                    diff_nested_claims(current, Some(parent)),
                ),
            };
            diff.terms.extend(terms.nested(index));
            diff.claims.extend(claims.nested(index));
        },
    );

    diff
}
