//! Sitelink diffs. Sitelinks are keyed by site id and never positional.

use std::collections::BTreeMap;

use compact_str::CompactString;
use serde::Serialize;
use serde_json::Value;

use crate::content::{ChangeKind, FieldDiff, Locator, Section};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SitelinkChange {
    pub current: Value,
    pub parent: Value,
}

/// Sitelinks by site, carrying the linked values so callers can inspect what changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SitelinksDiff {
    pub added: BTreeMap<CompactString, Value>,
    pub removed: BTreeMap<CompactString, Value>,
    pub changed: BTreeMap<CompactString, SitelinkChange>,
}

impl SitelinksDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        (self.added.len(), self.removed.len(), self.changed.len())
    }

    /// The same diff expressed as site locators.
    pub fn to_field_diff(&self) -> FieldDiff {
        let mut diff = FieldDiff::new();
        for site in self.added.keys() {
            diff.push(ChangeKind::Added, Locator::site(site));
        }
        for site in self.removed.keys() {
            diff.push(ChangeKind::Removed, Locator::site(site));
        }
        for site in self.changed.keys() {
            diff.push(ChangeKind::Changed, Locator::site(site));
        }
        diff
    }
}

pub fn diff_sitelinks(current: &Value, parent: Option<&Value>) -> SitelinksDiff {
    let current = Section::of(current, "sitelinks");
    let parent = parent.map(|parent| Section::of(parent, "sitelinks"));
    let mut diff = SitelinksDiff::default();

    for (site, link) in current.iter() {
        match parent.and_then(|parent| parent.get(site)) {
            None => {
                diff.added.insert(site.into(), link.clone());
            }
            Some(previous) if previous != link => {
                diff.changed.insert(
                    site.into(),
                    SitelinkChange {
                        current: link.clone(),
                        parent: previous.clone(),
                    },
                );
            }
            Some(_) => {}
        }
    }

    if let Some(parent) = parent {
        for (site, link) in parent.iter() {
            if !current.contains(site) {
                diff.removed.insert(site.into(), link.clone());
            }
        }
    }

    diff
}
