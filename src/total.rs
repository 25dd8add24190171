//! Running totals over many revisions.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::revision::DiffRecord;

/// Which [`DiffRecord`] key is added to which [`Totals`] key.
///
/// This table is the only place that defines both key spaces: diff records hold exactly the source keys and
/// totals exactly the destination keys.
pub const KEY_MAPPING: [(&str, &str); 51] = [
    ("added_claims", "claims_added"),
    ("removed_claims", "claims_removed"),
    ("changed_claims", "claims_changed"),
    ("added_qualifiers", "qualifiers_added"),
    ("removed_qualifiers", "qualifiers_removed"),
    ("changed_qualifiers", "qualifiers_changed"),
    ("added_references", "references_added"),
    ("removed_references", "references_removed"),
    ("changed_references", "references_changed"),
    ("added_aliases", "aliases_added"),
    ("removed_aliases", "aliases_removed"),
    ("changed_aliases", "aliases_changed"),
    ("added_labels", "labels_added"),
    ("removed_labels", "labels_removed"),
    ("changed_labels", "labels_changed"),
    ("added_descriptions", "descriptions_added"),
    ("removed_descriptions", "descriptions_removed"),
    ("changed_descriptions", "descriptions_changed"),
    ("added_sitelinks", "sitelinks_added"),
    ("removed_sitelinks", "sitelinks_removed"),
    ("changed_sitelinks", "sitelinks_changed"),
    ("added_lemmas", "lemmas_added"),
    ("removed_lemmas", "lemmas_removed"),
    ("changed_lemmas", "lemmas_changed"),
    ("added_forms", "forms_added"),
    ("removed_forms", "forms_removed"),
    ("changed_forms", "forms_changed"),
    ("added_representations", "representations_added"),
    ("removed_representations", "representations_removed"),
    ("changed_representations", "representations_changed"),
    ("added_formclaims", "formclaims_added"),
    ("removed_formclaims", "formclaims_removed"),
    ("changed_formclaims", "formclaims_changed"),
    ("added_senses", "senses_added"),
    ("removed_senses", "senses_removed"),
    ("changed_senses", "senses_changed"),
    ("added_glosses", "glosses_added"),
    ("removed_glosses", "glosses_removed"),
    ("changed_glosses", "glosses_changed"),
    ("added_senseclaims", "senseclaims_added"),
    ("removed_senseclaims", "senseclaims_removed"),
    ("changed_senseclaims", "senseclaims_changed"),
    ("merge_from", "merge_from"),
    ("merge_to", "merge_to"),
    ("undo", "undo"),
    ("restore", "restore"),
    ("clear_item", "clear_item"),
    ("create_item", "create_item"),
    ("create_property", "create_property"),
    ("create_lexeme", "create_lexeme"),
    ("redirect", "redirect"),
];

/// Sums of all analyzed diff records, keyed by the destination keys of [`KEY_MAPPING`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Totals(BTreeMap<&'static str, u64>);

impl Default for Totals {
    fn default() -> Self {
        Self::new()
    }
}

impl Totals {
    /// All keys present, all zero.
    pub fn new() -> Self {
        Self(
            KEY_MAPPING
                .iter()
                .map(|(_, total_key)| (*total_key, 0))
                .collect(),
        )
    }

    pub fn accumulate(&mut self, record: &DiffRecord) {
        for (diff_key, total_key) in KEY_MAPPING {
            if let (Some(value), Some(total)) = (record.get(diff_key), self.0.get_mut(total_key)) {
                *total += value;
            }
        }
    }

    /// Add another set of totals, e.g. from a separate run.
    pub fn merge(&mut self, other: &Totals) {
        for (key, value) in &other.0 {
            *self.0.entry(*key).or_insert(0) += value;
        }
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.0.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.0.iter().map(|(key, value)| (*key, *value))
    }
}
