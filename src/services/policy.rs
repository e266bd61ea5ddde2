//! Change-log policy.
//!
//! Decides, for an accepted mutation, which per-user sequences advance,
//! which status the contact ends up in, and whether `modified_at` moves.

use crate::models::{ContactStatus, SequenceKind};

/// Kinds of contact mutation tracked by the change log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Insert,
    ContentUpdate,
    Trash,
    Untrash,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Insert => "insert",
            MutationKind::ContentUpdate => "content_update",
            MutationKind::Trash => "trash",
            MutationKind::Untrash => "untrash",
        }
    }
}

/// What an accepted mutation does to the change log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeLogEffect {
    pub bump_timeline: bool,
    pub bump_history: bool,
    pub status: ContactStatus,
    pub touch_modified_at: bool,
}

impl ChangeLogEffect {
    /// Sequences to advance, in allocation order.
    pub fn sequences(&self) -> Vec<SequenceKind> {
        let mut kinds = Vec::with_capacity(2);
        if self.bump_timeline {
            kinds.push(SequenceKind::Timeline);
        }
        if self.bump_history {
            kinds.push(SequenceKind::History);
        }
        kinds
    }
}

/// Maps mutation kinds to their change-log effect.
pub struct ChangeLogPolicy;

impl ChangeLogPolicy {
    pub fn effect(mutation: MutationKind) -> ChangeLogEffect {
        match mutation {
            MutationKind::Insert => ChangeLogEffect {
                bump_timeline: true,
                bump_history: true,
                status: ContactStatus::Active,
                touch_modified_at: false,
            },
            MutationKind::ContentUpdate => ChangeLogEffect {
                bump_timeline: true,
                bump_history: true,
                status: ContactStatus::Modified,
                touch_modified_at: true,
            },
            MutationKind::Trash => ChangeLogEffect {
                bump_timeline: false,
                bump_history: true,
                status: ContactStatus::Trashed,
                touch_modified_at: true,
            },
            // Untrash restores Active even if the contact was Modified before
            MutationKind::Untrash => ChangeLogEffect {
                bump_timeline: false,
                bump_history: true,
                status: ContactStatus::Active,
                touch_modified_at: true,
            },
        }
    }

    /// Mutation kind for a trash toggle request.
    pub fn trash_toggle(trashed: bool) -> MutationKind {
        if trashed {
            MutationKind::Trash
        } else {
            MutationKind::Untrash
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(MutationKind::Insert, true, true, ContactStatus::Active, false)]
    #[case(MutationKind::ContentUpdate, true, true, ContactStatus::Modified, true)]
    #[case(MutationKind::Trash, false, true, ContactStatus::Trashed, true)]
    #[case(MutationKind::Untrash, false, true, ContactStatus::Active, true)]
    fn test_policy_table(
        #[case] mutation: MutationKind,
        #[case] timeline: bool,
        #[case] history: bool,
        #[case] status: ContactStatus,
        #[case] touch: bool,
    ) {
        let effect = ChangeLogPolicy::effect(mutation);
        assert_eq!(effect.bump_timeline, timeline);
        assert_eq!(effect.bump_history, history);
        assert_eq!(effect.status, status);
        assert_eq!(effect.touch_modified_at, touch);
    }

    #[test]
    fn test_every_mutation_bumps_history() {
        for mutation in [
            MutationKind::Insert,
            MutationKind::ContentUpdate,
            MutationKind::Trash,
            MutationKind::Untrash,
        ] {
            assert!(ChangeLogPolicy::effect(mutation)
                .sequences()
                .contains(&SequenceKind::History));
        }
    }

    #[test]
    fn test_trash_toggle_mapping() {
        assert_eq!(ChangeLogPolicy::trash_toggle(true), MutationKind::Trash);
        assert_eq!(ChangeLogPolicy::trash_toggle(false), MutationKind::Untrash);
        assert_eq!(
            ChangeLogPolicy::effect(MutationKind::Trash).sequences(),
            vec![SequenceKind::History]
        );
    }
}
