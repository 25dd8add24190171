//! Statement diffs.
//!
//! Statements are compared by property key and array position (see [`crate::content::walk_keyed`]), never by
//! their `id`. References and qualifiers are only inspected for statements that were added, removed or
//! changed; an unchanged statement cannot contain changed references or qualifiers.

use serde::Serialize;
use serde_json::Value;

use crate::content::{
    diff_keyed, list_field, walk_keyed, Change, ChangeKind, FieldDiff, Locator, Section,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClaimsDiff {
    pub claims: FieldDiff,
    pub references: FieldDiff,
    pub qualifiers: FieldDiff,
}

impl ClaimsDiff {
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty() && self.references.is_empty() && self.qualifiers.is_empty()
    }
}

/// Diff the `claims` of two entity (or form/sense) objects.
///
/// `parent == None` means the revision has no parent, so every statement, reference and qualifier in
/// `current` is reported as added.
pub fn diff_claims(current: &Value, parent: Option<&Value>) -> ClaimsDiff {
    let mut diff = ClaimsDiff::default();

    walk_keyed(
        Section::of(current, "claims"),
        parent.map(|parent| Section::of(parent, "claims")),
        |key, index, change| {
            diff.claims.push(change.kind(), Locator::claim(key, index));

            match change {
                Change::Added(claim) => {
                    push_all_references(&mut diff.references, ChangeKind::Added, claim, key, index);
                    push_all_qualifiers(&mut diff.qualifiers, ChangeKind::Added, claim, key, index);
                }
                Change::Removed(claim) => {
                    push_all_references(&mut diff.references, ChangeKind::Removed, claim, key, index);
                    push_all_qualifiers(&mut diff.qualifiers, ChangeKind::Removed, claim, key, index);
                }
                Change::Changed { current, parent } => {
                    diff_references(&mut diff.references, current, parent, key, index);
                    diff.qualifiers
                        .extend(diff_qualifiers(current, parent, key, index));
                }
            }
        },
    );

    diff
}

/// Diff the `claims` of a form or sense. Nested statements are counted without a reference/qualifier
/// breakdown.
pub fn diff_nested_claims(current: &Value, parent: Option<&Value>) -> FieldDiff {
    diff_keyed(
        Section::of(current, "claims"),
        parent.map(|parent| Section::of(parent, "claims")),
        Locator::claim,
    )
}

fn reference_locator(claim_key: &str, claim_index: usize, reference_index: usize) -> Locator {
    Locator::Reference {
        claim_key: claim_key.into(),
        claim_index,
        reference_index,
    }
}

fn push_all_references(
    out: &mut FieldDiff,
    kind: ChangeKind,
    claim: &Value,
    claim_key: &str,
    claim_index: usize,
) {
    for reference_index in 0..list_field(claim, "references").len() {
        out.push(kind, reference_locator(claim_key, claim_index, reference_index));
    }
}

/// References of a changed statement.
///
/// References are matched by value, not by position: a current reference that equals none of the parent's
/// is added, and a parent reference that equals none of the current ones is removed. A reference that still
/// exists counts as changed when its `snaks` differ from those of any parent reference. That last rule only
/// looks at `snaks` and is kept as is, even though it reports untouched references of statements that carry
/// several distinct references.
fn diff_references(
    out: &mut FieldDiff,
    current_claim: &Value,
    parent_claim: &Value,
    claim_key: &str,
    claim_index: usize,
) {
    let current_references = list_field(current_claim, "references");
    let parent_references = list_field(parent_claim, "references");

    for (reference_index, reference) in current_references.iter().enumerate() {
        let kind = if parent_references.is_empty() || !parent_references.contains(reference) {
            ChangeKind::Added
        } else if snaks_modified(reference, parent_references) {
            ChangeKind::Changed
        } else {
            continue;
        };
        out.push(kind, reference_locator(claim_key, claim_index, reference_index));
    }

    for (reference_index, reference) in parent_references.iter().enumerate() {
        if !current_references.contains(reference) {
            out.push(
                ChangeKind::Removed,
                reference_locator(claim_key, claim_index, reference_index),
            );
        }
    }
}

fn snaks_modified(reference: &Value, parent_references: &[Value]) -> bool {
    let snaks = reference.get("snaks");
    parent_references
        .iter()
        .any(|parent| parent.get("snaks") != snaks)
}

fn qualifier_locator(
    claim_key: &str,
    claim_index: usize,
    qualifier_key: &str,
    qualifier_index: usize,
) -> Locator {
    Locator::Qualifier {
        claim_key: claim_key.into(),
        claim_index,
        qualifier_key: qualifier_key.into(),
        qualifier_index,
    }
}

fn push_all_qualifiers(
    out: &mut FieldDiff,
    kind: ChangeKind,
    claim: &Value,
    claim_key: &str,
    claim_index: usize,
) {
    walk_keyed(
        Section::of(claim, "qualifiers"),
        None,
        |qualifier_key, qualifier_index, _| {
            out.push(
                kind,
                qualifier_locator(claim_key, claim_index, qualifier_key, qualifier_index),
            )
        },
    );
}

/// Qualifiers of a changed statement, positional within each qualifier property.
fn diff_qualifiers(
    current_claim: &Value,
    parent_claim: &Value,
    claim_key: &str,
    claim_index: usize,
) -> FieldDiff {
    diff_keyed(
        Section::of(current_claim, "qualifiers"),
        Some(Section::of(parent_claim, "qualifiers")),
        |qualifier_key, qualifier_index| {
            qualifier_locator(claim_key, claim_index, qualifier_key, qualifier_index)
        },
    )
}
