//! Classification of edit summaries by the auto-comment markers Wikibase writes for special operations.
//!
//! This is plain substring containment. Tools that write custom summaries containing the same markers are
//! counted too.

use std::sync::LazyLock;

use aho_corasick::AhoCorasick;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    MergeFrom,
    MergeTo,
    Redirect,
    Undo,
    Restore,
    ClearItem,
    Create,
}

// order must match the pattern ids used by the automaton below
const MARKERS: &[(&str, Marker)] = &[
    ("wbmergeitems-from", Marker::MergeFrom),
    ("wbmergeitems-to", Marker::MergeTo),
    ("wbcreateredirect", Marker::Redirect),
    ("undo:", Marker::Undo),
    ("restore:", Marker::Restore),
    ("wbeditentity-override", Marker::ClearItem),
    // shared by item, property and lexeme creation; the content model decides which one it was
    ("wbeditentity-create", Marker::Create),
];

/// Operations detected in an edit summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommentFlags {
    pub merge_to: bool,
    pub merge_from: bool,
    pub redirect: bool,
    pub undo: bool,
    pub restore: bool,
    pub clear_item: bool,
    /// An entity was created. Not yet resolved to item/property/lexeme.
    pub create: bool,
}

impl CommentFlags {
    fn set(&mut self, marker: Marker) {
        match marker {
            Marker::MergeFrom => self.merge_from = true,
            Marker::MergeTo => self.merge_to = true,
            Marker::Redirect => self.redirect = true,
            Marker::Undo => self.undo = true,
            Marker::Restore => self.restore = true,
            Marker::ClearItem => self.clear_item = true,
            Marker::Create => self.create = true,
        }
    }
}

/// Detect all markers in `comment`. A missing (or hidden) comment yields no flags.
pub fn classify_comment(comment: Option<&str>) -> CommentFlags {
    static AHO_CORASICK: LazyLock<AhoCorasick> = LazyLock::new(|| {
        let aho_corasick = AhoCorasick::new(MARKERS.iter().map(|(pattern, _)| *pattern))
            .expect("comment markers are valid patterns");
        tracing::debug!(
            "built aho-corasick successfully, kind: {:?}",
            aho_corasick.kind()
        );
        aho_corasick
    });

    let mut flags = CommentFlags::default();
    let Some(comment) = comment else {
        return flags;
    };

    // markers may overlap in unusual summaries, so report every match
    for m in AHO_CORASICK.find_overlapping_iter(comment) {
        flags.set(MARKERS[m.pattern().as_usize()].1);
    }
    flags
}
