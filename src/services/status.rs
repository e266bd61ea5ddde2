//! Contact status state machine.
//!
//! Legal moves:
//! - (none) -> Active on create
//! - Active | Modified -> Modified on content change
//! - Active | Modified -> Trashed on trash
//! - Trashed -> Active on untrash
//!
//! Identity fields (id, uuid) can never be written after creation.

use crate::error::{Error, Result};
use crate::models::{ContactPatch, ContactStatus};

use super::policy::{ChangeLogPolicy, MutationKind};

pub struct StatusStateMachine;

impl StatusStateMachine {
    /// Status of a freshly created contact.
    pub fn initial() -> ContactStatus {
        ContactStatus::Active
    }

    /// Validate applying `mutation` to a contact currently in `from`.
    pub fn check(from: ContactStatus, mutation: MutationKind) -> Result<()> {
        let allowed = match mutation {
            MutationKind::Insert => false,
            MutationKind::ContentUpdate | MutationKind::Trash => matches!(
                from,
                ContactStatus::Active | ContactStatus::Modified
            ),
            MutationKind::Untrash => from == ContactStatus::Trashed,
        };

        if allowed {
            Ok(())
        } else {
            Err(Error::DisallowedTransition {
                from,
                to: ChangeLogPolicy::effect(mutation).status,
            })
        }
    }

    /// Resolve a raw target status requested by a client into a mutation.
    ///
    /// Modified can only be reached through a content change, so it is never
    /// a valid explicit target.
    pub fn mutation_for_target(from: ContactStatus, target: &str) -> Result<MutationKind> {
        let mutation = match ContactStatus::parse(target)? {
            ContactStatus::Trashed => MutationKind::Trash,
            ContactStatus::Active => MutationKind::Untrash,
            ContactStatus::Modified => {
                return Err(Error::DisallowedTransition {
                    from,
                    to: ContactStatus::Modified,
                })
            }
        };

        Self::check(from, mutation)?;
        Ok(mutation)
    }

    /// Reject any attempt to write an identity field.
    pub fn check_identity(patch: &ContactPatch) -> Result<()> {
        if patch.id.is_some() {
            return Err(Error::ImmutableField("id"));
        }
        if patch.uuid.is_some() {
            return Err(Error::ImmutableField("uuid"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use crate::models::ContactStatus::{Active, Modified, Trashed};

    #[rstest]
    #[case(Active, MutationKind::ContentUpdate, true)]
    #[case(Modified, MutationKind::ContentUpdate, true)]
    #[case(Trashed, MutationKind::ContentUpdate, false)]
    #[case(Active, MutationKind::Trash, true)]
    #[case(Modified, MutationKind::Trash, true)]
    #[case(Trashed, MutationKind::Trash, false)]
    #[case(Trashed, MutationKind::Untrash, true)]
    #[case(Active, MutationKind::Untrash, false)]
    #[case(Modified, MutationKind::Untrash, false)]
    #[case(Active, MutationKind::Insert, false)]
    fn test_transition_table(
        #[case] from: ContactStatus,
        #[case] mutation: MutationKind,
        #[case] allowed: bool,
    ) {
        assert_eq!(StatusStateMachine::check(from, mutation).is_ok(), allowed);
    }

    #[test]
    fn test_trashed_to_modified_is_disallowed() {
        let err = StatusStateMachine::check(Trashed, MutationKind::ContentUpdate).unwrap_err();
        assert!(matches!(
            err,
            Error::DisallowedTransition { from: Trashed, to: Modified }
        ));
    }

    #[test]
    fn test_raw_targets() {
        assert_eq!(
            StatusStateMachine::mutation_for_target(Modified, "trashed").unwrap(),
            MutationKind::Trash
        );
        assert_eq!(
            StatusStateMachine::mutation_for_target(Trashed, "active").unwrap(),
            MutationKind::Untrash
        );
        assert!(matches!(
            StatusStateMachine::mutation_for_target(Trashed, "modified"),
            Err(Error::DisallowedTransition { .. })
        ));
        assert!(matches!(
            StatusStateMachine::mutation_for_target(Active, "deleted"),
            Err(Error::InvalidStatus(_))
        ));
        assert!(matches!(
            StatusStateMachine::mutation_for_target(Active, "active"),
            Err(Error::DisallowedTransition { from: Active, to: Active })
        ));
    }

    #[test]
    fn test_identity_fields_rejected() {
        let patch = ContactPatch {
            uuid: Some("0000".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            StatusStateMachine::check_identity(&patch),
            Err(Error::ImmutableField("uuid"))
        ));

        let patch = ContactPatch {
            id: Some(1),
            email_address: Some("a@example.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            StatusStateMachine::check_identity(&patch),
            Err(Error::ImmutableField("id"))
        ));

        assert!(StatusStateMachine::check_identity(&ContactPatch::default()).is_ok());
    }

    #[test]
    fn test_initial_status() {
        assert_eq!(StatusStateMachine::initial(), Active);
    }
}
