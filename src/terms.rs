//! Multilingual term diffs: labels, descriptions and lemmas (one value per language) and aliases (a list per
//! language). Form representations and sense glosses use the same single-valued rule.

use serde_json::Value;

use crate::content::{diff_keyed, ChangeKind, FieldDiff, Locator, Section};

/// Diff a map of single-valued terms keyed by language.
///
/// A language missing from the parent is added, one with a different value is changed and a language that
/// disappeared from `current` is removed.
pub fn diff_terms(current: &Value, parent: Option<&Value>, field: &str) -> FieldDiff {
    let current = Section::of(current, field);
    let parent = parent.map(|parent| Section::of(parent, field));
    let mut diff = FieldDiff::new();

    for (lang, value) in current.iter() {
        match parent.and_then(|parent| parent.get(lang)) {
            None => diff.push(ChangeKind::Added, Locator::term(lang)),
            Some(previous) if previous != value => {
                diff.push(ChangeKind::Changed, Locator::term(lang))
            }
            Some(_) => {}
        }
    }

    if let Some(parent) = parent {
        for (lang, _) in parent.iter() {
            if !current.contains(lang) {
                diff.push(ChangeKind::Removed, Locator::term(lang));
            }
        }
    }

    diff
}

pub fn diff_labels(current: &Value, parent: Option<&Value>) -> FieldDiff {
    diff_terms(current, parent, "labels")
}

pub fn diff_descriptions(current: &Value, parent: Option<&Value>) -> FieldDiff {
    diff_terms(current, parent, "descriptions")
}

pub fn diff_lemmas(current: &Value, parent: Option<&Value>) -> FieldDiff {
    diff_terms(current, parent, "lemmas")
}

/// Aliases are compared by language and then by position in the language's alias list.
pub fn diff_aliases(current: &Value, parent: Option<&Value>) -> FieldDiff {
    diff_keyed(
        Section::of(current, "aliases"),
        parent.map(|parent| Section::of(parent, "aliases")),
        Locator::alias,
    )
}
