//! Contact database queries.
//!
//! Row writes never touch `id` or `uuid`; the only statement that sets
//! them is the insert. Sequence values are supplied by the caller, which
//! allocates them in the same transaction.

use chrono::{DateTime, Utc};

use crate::models::{Contact, ContactFields, ContactRow, ContactStatus, SequenceKind};
use crate::{Error, Result};

use super::{DbConnection, DbPool};

/// Input for inserting a contact row.
#[derive(Debug, Clone)]
pub struct InsertContact {
    pub user_id: i64,
    pub uuid: String,
    pub fields: ContactFields,
    pub created_at: DateTime<Utc>,
    pub timeline_id: i64,
    pub history_id: i64,
    pub status: ContactStatus,
}

fn into_contact(row: Option<ContactRow>) -> Result<Option<Contact>> {
    row.map(Contact::try_from).transpose()
}

fn into_contacts(rows: Vec<ContactRow>) -> Result<Vec<Contact>> {
    rows.into_iter().map(Contact::try_from).collect()
}

/// Insert a new contact row.
pub async fn insert_contact(conn: &mut DbConnection, input: InsertContact) -> Result<Contact> {
    let row = sqlx::query_as::<_, ContactRow>(
        r#"
        INSERT INTO contacts (
            user_id, uuid, email_address, firstname, lastname,
            created_at, modified_at, timeline_id, history_id, status
        ) VALUES (?, ?, ?, ?, ?, ?, NULL, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(input.user_id)
    .bind(&input.uuid)
    .bind(&input.fields.email_address)
    .bind(&input.fields.firstname)
    .bind(&input.fields.lastname)
    .bind(input.created_at)
    .bind(input.timeline_id)
    .bind(input.history_id)
    .bind(input.status.as_str())
    .fetch_one(&mut *conn)
    .await?;

    Contact::try_from(row)
}

/// Overwrite the content fields of a contact along with both sequence values.
pub async fn update_contact_content(
    conn: &mut DbConnection,
    contact: &Contact,
    fields: &ContactFields,
    modified_at: DateTime<Utc>,
    timeline_id: i64,
    history_id: i64,
    status: ContactStatus,
) -> Result<Contact> {
    let row = sqlx::query_as::<_, ContactRow>(
        r#"
        UPDATE contacts
        SET email_address = ?, firstname = ?, lastname = ?,
            modified_at = ?, timeline_id = ?, history_id = ?, status = ?
        WHERE id = ? AND user_id = ?
        RETURNING *
        "#,
    )
    .bind(&fields.email_address)
    .bind(&fields.firstname)
    .bind(&fields.lastname)
    .bind(modified_at)
    .bind(timeline_id)
    .bind(history_id)
    .bind(status.as_str())
    .bind(contact.id)
    .bind(contact.user_id)
    .fetch_optional(&mut *conn)
    .await?;

    into_contact(row)?.ok_or_else(|| Error::contact_not_found(contact.id))
}

/// Change the status of a contact along with its history value.
pub async fn update_contact_status(
    conn: &mut DbConnection,
    contact: &Contact,
    status: ContactStatus,
    modified_at: DateTime<Utc>,
    history_id: i64,
) -> Result<Contact> {
    let row = sqlx::query_as::<_, ContactRow>(
        r#"
        UPDATE contacts
        SET status = ?, modified_at = ?, history_id = ?
        WHERE id = ? AND user_id = ?
        RETURNING *
        "#,
    )
    .bind(status.as_str())
    .bind(modified_at)
    .bind(history_id)
    .bind(contact.id)
    .bind(contact.user_id)
    .fetch_optional(&mut *conn)
    .await?;

    into_contact(row)?.ok_or_else(|| Error::contact_not_found(contact.id))
}

/// Get a contact owned by `user_id`.
///
/// Contacts of other users are indistinguishable from missing ones.
pub async fn get_contact(pool: &DbPool, user_id: i64, id: i64) -> Result<Option<Contact>> {
    let row = sqlx::query_as::<_, ContactRow>(
        "SELECT * FROM contacts WHERE id = ? AND user_id = ?",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    into_contact(row)
}

/// Contacts whose `kind` value exceeds `after`, ascending by that value.
///
/// Trashed contacts are included so removals reach sync clients.
pub async fn list_contacts_since(
    pool: &DbPool,
    user_id: i64,
    kind: SequenceKind,
    after: i64,
    limit: Option<u32>,
) -> Result<Vec<Contact>> {
    let column = kind.contact_column();
    let query = format!(
        "SELECT * FROM contacts WHERE user_id = ? AND {column} > ? ORDER BY {column} ASC LIMIT ?"
    );

    // SQLite treats a negative LIMIT as unbounded
    let limit = limit.map(i64::from).unwrap_or(-1);

    let rows = sqlx::query_as::<_, ContactRow>(&query)
        .bind(user_id)
        .bind(after)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    into_contacts(rows)
}

/// List a user's contacts in timeline order.
pub async fn list_contacts(pool: &DbPool, user_id: i64, include_trashed: bool) -> Result<Vec<Contact>> {
    let rows = if include_trashed {
        sqlx::query_as::<_, ContactRow>(
            "SELECT * FROM contacts WHERE user_id = ? ORDER BY timeline_id ASC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query_as::<_, ContactRow>(
            "SELECT * FROM contacts WHERE user_id = ? AND status != ? ORDER BY timeline_id ASC",
        )
        .bind(user_id)
        .bind(ContactStatus::Trashed.as_str())
        .fetch_all(pool)
        .await?
    };

    into_contacts(rows)
}
