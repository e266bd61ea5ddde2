//! Sequence kinds for contact change tracking.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two per-user change sequences.
///
/// Timeline advances on content changes only. History advances on every
/// accepted mutation, trash and untrash included.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SequenceKind {
    Timeline,
    History,
}

impl SequenceKind {
    pub const ALL: [SequenceKind; 2] = [SequenceKind::Timeline, SequenceKind::History];

    pub fn as_str(&self) -> &'static str {
        match self {
            SequenceKind::Timeline => "timeline",
            SequenceKind::History => "history",
        }
    }

    /// Column on `contacts` holding the last value of this sequence.
    pub(crate) fn contact_column(&self) -> &'static str {
        match self {
            SequenceKind::Timeline => "timeline_id",
            SequenceKind::History => "history_id",
        }
    }
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
