//! Shape normalization for entity JSON and the result types shared by all field diffs.
//!
//! The API has historically returned inconsistent shapes for the same logical field (`"claims": []` for an
//! entity without statements, a bare string where an alias array is expected, ...). Every comparison in this
//! crate first resolves a field through [`Section`] or [`list_field`], so the diff algorithms themselves never
//! have to check what kind of JSON value they are looking at.

use compact_str::CompactString;
use serde::Serialize;
use serde_json::{Map, Value};

pub type RevisionId = u64;

/// The Wikibase content model of a revision. Determines which field families are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentModel {
    Item,
    Property,
    Lexeme,
}

impl ContentModel {
    /// Parse the `contentmodel` value reported by the API. Non-Wikibase models (e.g. `wikitext`) yield `None`.
    pub fn from_api_name(name: &str) -> Option<Self> {
        match name {
            "wikibase-item" => Some(ContentModel::Item),
            "wikibase-property" => Some(ContentModel::Property),
            "wikibase-lexeme" => Some(ContentModel::Lexeme),
            _ => None,
        }
    }

    pub fn api_name(self) -> &'static str {
        match self {
            ContentModel::Item => "wikibase-item",
            ContentModel::Property => "wikibase-property",
            ContentModel::Lexeme => "wikibase-lexeme",
        }
    }
}

/// A map-valued field after normalization.
///
/// Absent keys, `null`, and values of the wrong type (most commonly an empty array standing in for an empty
/// map) all collapse to [`Section::Empty`].
#[derive(Debug, Clone, Copy)]
pub enum Section<'a> {
    Map(&'a Map<String, Value>),
    Empty,
}

impl<'a> Section<'a> {
    /// Resolve the top-level `field` of an entity (or of a form/sense object).
    pub fn of(content: &'a Value, field: &str) -> Self {
        Self::from_value(content.get(field))
    }

    pub fn from_value(value: Option<&'a Value>) -> Self {
        match value {
            Some(Value::Object(map)) if !map.is_empty() => Section::Map(map),
            _ => Section::Empty,
        }
    }

    fn as_map(&self) -> Option<&'a Map<String, Value>> {
        match self {
            Section::Map(map) => Some(map),
            Section::Empty => None,
        }
    }

    /// Look up `key`, treating an explicit `null` the same as a missing key.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.as_map()
            .and_then(|map| map.get(key))
            .filter(|value| !value.is_null())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterate over all non-null entries.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> {
        self.as_map()
            .into_iter()
            .flat_map(|map| map.iter())
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| (key.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

/// The elements of a list-valued entry.
///
/// `null` is an empty list and a lone scalar/object is treated as a list of one (aliases are occasionally
/// stored as a single object instead of an array).
pub fn elements(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items,
        Value::Null => &[],
        other => std::slice::from_ref(other),
    }
}

/// Resolve a list-valued field (`forms`, `senses`, `references`). Anything but an array is an empty list.
pub fn list_field<'a>(content: &'a Value, field: &str) -> &'a [Value] {
    match content.get(field) {
        Some(Value::Array(items)) => items,
        _ => &[],
    }
}

/// Where a change occurred.
///
/// Serializes as the bare object of its fields, e.g. `{"key":"P31","index":0}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Locator {
    /// A statement, addressed by property key and position.
    Claim { key: CompactString, index: usize },
    /// An entry of a top-level lexeme array (forms, senses).
    Index { index: usize },
    /// An alias, addressed by language and position.
    Alias { lang: CompactString, index: usize },
    /// A single-valued term (label, description, lemma, representation, gloss).
    Term { lang: CompactString },
    Site { site: CompactString },
    Reference {
        claim_key: CompactString,
        claim_index: usize,
        reference_index: usize,
    },
    Qualifier {
        claim_key: CompactString,
        claim_index: usize,
        qualifier_key: CompactString,
        qualifier_index: usize,
    },
    /// A change inside the form or sense at `index`.
    Nested { index: usize, inner: Box<Locator> },
}

impl Locator {
    pub fn claim(key: &str, index: usize) -> Self {
        Locator::Claim {
            key: key.into(),
            index,
        }
    }

    pub fn alias(lang: &str, index: usize) -> Self {
        Locator::Alias {
            lang: lang.into(),
            index,
        }
    }

    pub fn term(lang: &str) -> Self {
        Locator::Term { lang: lang.into() }
    }

    pub fn site(site: &str) -> Self {
        Locator::Site { site: site.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Changed,
}

/// Added/removed/changed locators of one field family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldDiff {
    pub added: Vec<Locator>,
    pub removed: Vec<Locator>,
    pub changed: Vec<Locator>,
}

impl FieldDiff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ChangeKind, locator: Locator) {
        match kind {
            ChangeKind::Added => self.added.push(locator),
            ChangeKind::Removed => self.removed.push(locator),
            ChangeKind::Changed => self.changed.push(locator),
        }
    }

    pub fn extend(&mut self, other: FieldDiff) {
        self.added.extend(other.added);
        self.removed.extend(other.removed);
        self.changed.extend(other.changed);
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// `(added, removed, changed)` counts.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.added.len(), self.removed.len(), self.changed.len())
    }

    /// Swap added and removed. Used to report everything inside a removed form/sense as removed.
    pub(crate) fn reversed(self) -> Self {
        Self {
            added: self.removed,
            removed: self.added,
            changed: self.changed,
        }
    }

    /// Scope every locator to the form/sense at `index`.
    pub(crate) fn nested(self, index: usize) -> Self {
        let wrap = |locators: Vec<Locator>| -> Vec<Locator> {
            locators
                .into_iter()
                .map(|inner| Locator::Nested {
                    index,
                    inner: Box::new(inner),
                })
                .collect()
        };
        Self {
            added: wrap(self.added),
            removed: wrap(self.removed),
            changed: wrap(self.changed),
        }
    }
}

/// One positional difference found by [`walk_list`] or [`walk_keyed`].
#[derive(Debug, Clone, Copy)]
pub(crate) enum Change<'a> {
    Added(&'a Value),
    Removed(&'a Value),
    Changed { current: &'a Value, parent: &'a Value },
}

impl Change<'_> {
    pub(crate) fn kind(&self) -> ChangeKind {
        match self {
            Change::Added(_) => ChangeKind::Added,
            Change::Removed(_) => ChangeKind::Removed,
            Change::Changed { .. } => ChangeKind::Changed,
        }
    }
}

/// Compare two lists strictly by position.
///
/// Without a parent every element is added. Otherwise index `i` missing in `parent` is added, present but
/// unequal is changed, and parent indices beyond the end of `current` are removed. Reordering is never
/// detected as such.
pub(crate) fn walk_list<'a>(
    current: &'a [Value],
    parent: Option<&'a [Value]>,
    mut visit: impl FnMut(usize, Change<'a>),
) {
    let Some(parent) = parent else {
        for (index, value) in current.iter().enumerate() {
            visit(index, Change::Added(value));
        }
        return;
    };

    for (index, value) in current.iter().enumerate() {
        match parent.get(index) {
            None => visit(index, Change::Added(value)),
            Some(previous) if previous != value => visit(
                index,
                Change::Changed {
                    current: value,
                    parent: previous,
                },
            ),
            Some(_) => {}
        }
    }
    for (index, previous) in parent.iter().enumerate().skip(current.len()) {
        visit(index, Change::Removed(previous));
    }
}

/// Compare two maps of lists (claims by property, aliases by language, qualifiers by property) by key and
/// then by position within each key, see [`walk_list`].
pub(crate) fn walk_keyed<'a>(
    current: Section<'a>,
    parent: Option<Section<'a>>,
    mut visit: impl FnMut(&'a str, usize, Change<'a>),
) {
    for (key, values) in current.iter() {
        let previous = match parent {
            // first revision: nothing to compare against
            None => None,
            // a key unknown to the parent behaves like an empty parent list
            Some(parent) => Some(parent.get(key).map(elements).unwrap_or(&[])),
        };
        walk_list(elements(values), previous, |index, change| {
            visit(key, index, change)
        });
    }

    let Some(parent) = parent else {
        return;
    };
    for (key, values) in parent.iter() {
        if current.contains(key) {
            continue;
        }
        for (index, value) in elements(values).iter().enumerate() {
            visit(key, index, Change::Removed(value));
        }
    }
}

/// Positional diff of a map of lists, producing one locator per difference.
pub(crate) fn diff_keyed(
    current: Section<'_>,
    parent: Option<Section<'_>>,
    locate: impl Fn(&str, usize) -> Locator,
) -> FieldDiff {
    let mut diff = FieldDiff::new();
    walk_keyed(current, parent, |key, index, change| {
        diff.push(change.kind(), locate(key, index))
    });
    diff
}
