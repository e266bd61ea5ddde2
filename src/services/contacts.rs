//! Contact service.
//!
//! Every mutation runs inside the owning user's write scope. Validation
//! happens before the transaction opens; the sequence bump and the row
//! write then commit together or not at all.

use tracing::{debug, info};

use crate::db::{self, DbPool, InsertContact};
use crate::error::{Error, Result};
use crate::models::{
    new_uuid, now, Contact, ContactFields, ContactPatch, ContactSync, SequenceKind,
};

use super::policy::{ChangeLogPolicy, MutationKind};
use super::sequencer::{SequenceAllocator, UserWriteScope};
use super::status::StatusStateMachine;

/// Service for contact mutations and incremental sync reads.
#[derive(Clone)]
pub struct ContactService {
    db: DbPool,
    sequencer: SequenceAllocator,
}

impl ContactService {
    /// Create a new contact service.
    pub fn new(db: DbPool, sequencer: SequenceAllocator) -> Self {
        Self { db, sequencer }
    }

    /// Create a contact for `user_id`.
    pub async fn create_contact(&self, user_id: i64, fields: ContactFields) -> Result<Contact> {
        let scope = self.sequencer.write_scope(user_id).await?;

        // Unknown users get NotFound rather than a provisioning failure
        db::get_user(&self.db, user_id).await?;

        let effect = ChangeLogPolicy::effect(MutationKind::Insert);
        debug_assert_eq!(effect.status, StatusStateMachine::initial());

        let mut tx = self.db.begin().await?;
        let allocation = self.sequencer.allocate(&scope, &mut tx, &effect).await?;

        let contact = db::insert_contact(
            &mut tx,
            InsertContact {
                user_id,
                uuid: new_uuid(),
                fields,
                created_at: now(),
                timeline_id: allocation.timeline_or(0),
                history_id: allocation.history_or(0),
                status: effect.status,
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            user_id,
            contact_id = contact.id,
            timeline_id = contact.timeline_id,
            history_id = contact.history_id,
            "Created contact"
        );

        Ok(contact)
    }

    /// Update the content fields of a contact.
    ///
    /// A patch that changes nothing returns the stored contact untouched.
    pub async fn update_contact_fields(
        &self,
        user_id: i64,
        contact_id: i64,
        patch: ContactPatch,
    ) -> Result<Contact> {
        StatusStateMachine::check_identity(&patch)?;

        let scope = self.sequencer.write_scope(user_id).await?;
        let current = self.load(&scope, contact_id).await?;

        let Some(fields) = patch.merge(&current.content()) else {
            debug!(user_id, contact_id, "Contact update changes nothing, skipping");
            return Ok(current);
        };

        let mutation = MutationKind::ContentUpdate;
        StatusStateMachine::check(current.status, mutation)?;
        let effect = ChangeLogPolicy::effect(mutation);

        let mut tx = self.db.begin().await?;
        let allocation = self.sequencer.allocate(&scope, &mut tx, &effect).await?;

        let contact = db::update_contact_content(
            &mut tx,
            &current,
            &fields,
            now(),
            allocation.timeline_or(current.timeline_id),
            allocation.history_or(current.history_id),
            effect.status,
        )
        .await?;

        tx.commit().await?;

        info!(
            user_id,
            contact_id,
            timeline_id = contact.timeline_id,
            history_id = contact.history_id,
            "Updated contact"
        );

        Ok(contact)
    }

    /// Trash (`true`) or untrash (`false`) a contact.
    pub async fn set_trashed(&self, user_id: i64, contact_id: i64, trashed: bool) -> Result<Contact> {
        let scope = self.sequencer.write_scope(user_id).await?;
        let current = self.load(&scope, contact_id).await?;

        let mutation = ChangeLogPolicy::trash_toggle(trashed);
        StatusStateMachine::check(current.status, mutation)?;

        self.apply_status_change(&scope, current, mutation).await
    }

    /// Apply a raw status requested by a client.
    ///
    /// Unknown values fail with `InvalidStatus`; `trashed` and `active` map to
    /// trash and untrash.
    pub async fn set_status(&self, user_id: i64, contact_id: i64, status: &str) -> Result<Contact> {
        let scope = self.sequencer.write_scope(user_id).await?;
        let current = self.load(&scope, contact_id).await?;

        let mutation = StatusStateMachine::mutation_for_target(current.status, status)?;

        self.apply_status_change(&scope, current, mutation).await
    }

    /// Get a single contact of `user_id`.
    pub async fn get_contact(&self, user_id: i64, contact_id: i64) -> Result<Contact> {
        db::get_contact(&self.db, user_id, contact_id)
            .await?
            .ok_or_else(|| Error::contact_not_found(contact_id))
    }

    /// List contacts of `user_id` in timeline order.
    pub async fn list_contacts(&self, user_id: i64, include_trashed: bool) -> Result<Vec<Contact>> {
        db::list_contacts(&self.db, user_id, include_trashed).await
    }

    /// Contacts changed after checkpoint `after` on sequence `kind`.
    ///
    /// Each contact appears once, at its latest state. Trashed contacts are
    /// included. The returned checkpoint is the next `after` to poll with.
    pub async fn get_contacts_since(
        &self,
        user_id: i64,
        kind: SequenceKind,
        after: i64,
    ) -> Result<ContactSync> {
        let contacts = db::list_contacts_since(&self.db, user_id, kind, after, None).await?;
        Ok(ContactSync::new(kind, after, contacts))
    }

    /// Bounded variant of [`get_contacts_since`](Self::get_contacts_since).
    pub async fn get_contacts_since_page(
        &self,
        user_id: i64,
        kind: SequenceKind,
        after: i64,
        limit: u32,
    ) -> Result<ContactSync> {
        if limit == 0 {
            return Err(Error::InvalidInput("Page limit must be positive".to_string()));
        }
        let contacts = db::list_contacts_since(&self.db, user_id, kind, after, Some(limit)).await?;
        Ok(ContactSync::new(kind, after, contacts))
    }

    async fn load(&self, scope: &UserWriteScope, contact_id: i64) -> Result<Contact> {
        db::get_contact(&self.db, scope.user_id(), contact_id)
            .await?
            .ok_or_else(|| Error::contact_not_found(contact_id))
    }

    /// Persist a validated trash or untrash.
    async fn apply_status_change(
        &self,
        scope: &UserWriteScope,
        current: Contact,
        mutation: MutationKind,
    ) -> Result<Contact> {
        let effect = ChangeLogPolicy::effect(mutation);

        let mut tx = self.db.begin().await?;
        let allocation = self.sequencer.allocate(scope, &mut tx, &effect).await?;

        let contact = db::update_contact_status(
            &mut tx,
            &current,
            effect.status,
            now(),
            allocation.history_or(current.history_id),
        )
        .await?;

        tx.commit().await?;

        info!(
            user_id = scope.user_id(),
            contact_id = contact.id,
            mutation = mutation.as_str(),
            history_id = contact.history_id,
            "Changed contact status"
        );

        Ok(contact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SequencerConfig;
    use crate::db::{create_user, init_memory_pool};
    use crate::models::{ContactStatus, CreateUser};

    async fn setup() -> (ContactService, i64) {
        let pool = init_memory_pool().await.unwrap();
        let user = create_user(&pool, CreateUser::new("u1")).await.unwrap();
        let sequencer = SequenceAllocator::new(pool.clone(), &SequencerConfig::default());
        (ContactService::new(pool, sequencer), user.id)
    }

    fn email(address: &str) -> ContactFields {
        ContactFields {
            email_address: Some(address.to_string()),
            ..Default::default()
        }
    }

    fn email_patch(address: &str) -> ContactPatch {
        ContactPatch {
            email_address: Some(address.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_lifecycle_scenario() {
        let (service, user_id) = setup().await;

        let c1 = service.create_contact(user_id, email("a@example.com")).await.unwrap();
        assert_eq!((c1.timeline_id, c1.history_id, c1.status), (1, 1, ContactStatus::Active));
        assert!(c1.modified_at.is_none());

        let c1 = service
            .update_contact_fields(user_id, c1.id, email_patch("b@example.com"))
            .await
            .unwrap();
        assert_eq!((c1.timeline_id, c1.history_id, c1.status), (2, 2, ContactStatus::Modified));
        assert!(c1.modified_at.is_some());

        let c1 = service.set_trashed(user_id, c1.id, true).await.unwrap();
        assert_eq!((c1.timeline_id, c1.history_id, c1.status), (2, 3, ContactStatus::Trashed));

        let c1 = service.set_trashed(user_id, c1.id, false).await.unwrap();
        assert_eq!((c1.timeline_id, c1.history_id, c1.status), (2, 4, ContactStatus::Active));

        let sync = service
            .get_contacts_since(user_id, SequenceKind::History, 0)
            .await
            .unwrap();
        assert_eq!(sync.contacts.len(), 1);
        assert_eq!(sync.contacts[0].history_id, 4);
        assert_eq!(sync.contacts[0].status, ContactStatus::Active);
        assert_eq!(sync.checkpoint, 4);
    }

    #[tokio::test]
    async fn test_noop_update_does_not_bump() {
        let (service, user_id) = setup().await;
        let created = service.create_contact(user_id, email("a@example.com")).await.unwrap();

        let same = service
            .update_contact_fields(user_id, created.id, email_patch("a@example.com"))
            .await
            .unwrap();

        assert_eq!(same, created);
        for kind in SequenceKind::ALL {
            assert_eq!(service.sequencer.current(user_id, kind).await.unwrap(), 1);
        }
    }

    #[tokio::test]
    async fn test_untrash_of_active_contact_rejected() {
        let (service, user_id) = setup().await;
        let created = service.create_contact(user_id, email("a@example.com")).await.unwrap();

        let err = service.set_trashed(user_id, created.id, false).await.unwrap_err();
        assert!(matches!(err, Error::DisallowedTransition { .. }));

        let err = service.set_status(user_id, created.id, "modified").await.unwrap_err();
        assert!(matches!(err, Error::DisallowedTransition { .. }));

        assert_eq!(
            service.sequencer.current(user_id, SequenceKind::History).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_update_of_trashed_contact_rejected() {
        let (service, user_id) = setup().await;
        let created = service.create_contact(user_id, email("a@example.com")).await.unwrap();
        service.set_trashed(user_id, created.id, true).await.unwrap();

        let err = service
            .update_contact_fields(user_id, created.id, email_patch("b@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DisallowedTransition {
                from: ContactStatus::Trashed,
                to: ContactStatus::Modified
            }
        ));
    }

    #[tokio::test]
    async fn test_set_status_rejects_unknown_value() {
        let (service, user_id) = setup().await;
        let created = service.create_contact(user_id, email("a@example.com")).await.unwrap();

        let err = service.set_status(user_id, created.id, "deleted").await.unwrap_err();
        assert!(matches!(err, Error::InvalidStatus(_)));

        let trashed = service.set_status(user_id, created.id, "trashed").await.unwrap();
        assert_eq!(trashed.status, ContactStatus::Trashed);
        assert_eq!(trashed.history_id, 2);
    }

    #[tokio::test]
    async fn test_create_for_unknown_user() {
        let (service, _) = setup().await;
        let err = service.create_contact(999, email("a@example.com")).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_page_limit_must_be_positive() {
        let (service, user_id) = setup().await;
        let err = service
            .get_contacts_since_page(user_id, SequenceKind::Timeline, 0, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
