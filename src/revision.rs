//! Per-revision dispatch: which field families apply to which content model, and the flat count record
//! produced for every analyzed revision.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::{
    claims::{diff_claims, ClaimsDiff},
    comment::{classify_comment, CommentFlags},
    content::{ContentModel, FieldDiff},
    lexeme::{diff_forms, diff_senses, SubEntityDiff},
    sitelinks::{diff_sitelinks, SitelinksDiff},
    terms::{diff_aliases, diff_descriptions, diff_labels, diff_lemmas},
    total::KEY_MAPPING,
};

/// All field diffs of one revision against its parent.
///
/// Families that do not apply to `model` are left empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityDiff {
    pub model: ContentModel,
    pub claims: ClaimsDiff,
    pub aliases: FieldDiff,
    pub labels: FieldDiff,
    pub descriptions: FieldDiff,
    pub sitelinks: SitelinksDiff,
    pub lemmas: FieldDiff,
    pub forms: SubEntityDiff,
    pub senses: SubEntityDiff,
    pub comment: CommentFlags,
}

impl EntityDiff {
    fn empty(model: ContentModel, comment: CommentFlags) -> Self {
        Self {
            model,
            claims: ClaimsDiff::default(),
            aliases: FieldDiff::default(),
            labels: FieldDiff::default(),
            descriptions: FieldDiff::default(),
            sitelinks: SitelinksDiff::default(),
            lemmas: FieldDiff::default(),
            forms: SubEntityDiff::default(),
            senses: SubEntityDiff::default(),
            comment,
        }
    }

    /// Reduce to counts.
    pub fn to_record(&self) -> DiffRecord {
        let mut record = DiffRecord::zeroed();

        record.set_counts("claims", self.claims.claims.counts());
        record.set_counts("references", self.claims.references.counts());
        record.set_counts("qualifiers", self.claims.qualifiers.counts());
        record.set_counts("aliases", self.aliases.counts());
        record.set_counts("labels", self.labels.counts());
        record.set_counts("descriptions", self.descriptions.counts());
        record.set_counts("sitelinks", self.sitelinks.counts());
        record.set_counts("lemmas", self.lemmas.counts());
        record.set_counts("forms", self.forms.entries.counts());
        record.set_counts("representations", self.forms.terms.counts());
        record.set_counts("formclaims", self.forms.claims.counts());
        record.set_counts("senses", self.senses.entries.counts());
        record.set_counts("glosses", self.senses.terms.counts());
        record.set_counts("senseclaims", self.senses.claims.counts());

        let flags = &self.comment;
        record.set_flag("merge_from", flags.merge_from);
        record.set_flag("merge_to", flags.merge_to);
        record.set_flag("redirect", flags.redirect);
        record.set_flag("undo", flags.undo);
        record.set_flag("restore", flags.restore);
        record.set_flag("clear_item", flags.clear_item);
        let create_key = match self.model {
            ContentModel::Item => "create_item",
            ContentModel::Property => "create_property",
            ContentModel::Lexeme => "create_lexeme",
        };
        record.set_flag(create_key, flags.create);

        record
    }
}

/// Diff `current` against `parent` (`None` for the first revision of an entity).
pub fn diff_entity(
    current: &Value,
    parent: Option<&Value>,
    comment: Option<&str>,
    model: ContentModel,
) -> EntityDiff {
    let mut diff = EntityDiff::empty(model, classify_comment(comment));
    diff.claims = diff_claims(current, parent);

    match model {
        ContentModel::Item | ContentModel::Property => {
            diff.aliases = diff_aliases(current, parent);
            diff.labels = diff_labels(current, parent);
            diff.descriptions = diff_descriptions(current, parent);
            if model == ContentModel::Item {
                diff.sitelinks = diff_sitelinks(current, parent);
            }
        }
        ContentModel::Lexeme => {
            diff.lemmas = diff_lemmas(current, parent);
            diff.forms = diff_forms(current, parent);
            diff.senses = diff_senses(current, parent);
        }
    }

    diff
}

/// Counts of one revision, keyed `added_claims`, `changed_glosses`, `undo`, ...
///
/// Every record holds the same keys (the source keys of [`KEY_MAPPING`]) regardless of content model; families
/// that do not apply stay at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DiffRecord(BTreeMap<&'static str, u64>);

impl DiffRecord {
    pub fn zeroed() -> Self {
        Self(KEY_MAPPING.iter().map(|(key, _)| (*key, 0)).collect())
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.0.get(key).copied()
    }

    /// Overwrite the count of an existing key. Unknown keys are ignored.
    pub fn set(&mut self, key: &str, value: u64) {
        let slot = self.0.get_mut(key);
        debug_assert!(slot.is_some(), "unknown diff record key: {key}");
        if let Some(slot) = slot {
            *slot = value;
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.0.iter().map(|(key, value)| (*key, *value))
    }

    fn set_counts(&mut self, category: &str, (added, removed, changed): (usize, usize, usize)) {
        self.set(&format!("added_{category}"), added as u64);
        self.set(&format!("removed_{category}"), removed as u64);
        self.set(&format!("changed_{category}"), changed as u64);
    }

    fn set_flag(&mut self, key: &str, flag: bool) {
        self.set(key, u64::from(flag));
    }
}
