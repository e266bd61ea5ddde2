//! Contact models and sync payloads.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::SequenceKind;
use crate::error::{Error, Result};

/// Contact lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    Active,
    Modified,
    Trashed,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::Active => "active",
            ContactStatus::Modified => "modified",
            ContactStatus::Trashed => "trashed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ContactStatus::Active),
            "modified" => Some(ContactStatus::Modified),
            "trashed" => Some(ContactStatus::Trashed),
            _ => None,
        }
    }

    /// Parse a client supplied status, rejecting anything outside the set.
    pub fn parse(s: &str) -> Result<Self> {
        Self::from_str(s).ok_or_else(|| Error::InvalidStatus(s.to_string()))
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contact owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Contact {
    pub id: i64,
    pub user_id: i64,
    pub uuid: String,

    pub email_address: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,

    pub created_at: DateTime<Utc>,
    /// Unset until the first update, trash or untrash
    pub modified_at: Option<DateTime<Utc>>,

    /// Last timeline value assigned to this contact
    pub timeline_id: i64,
    /// Last history value assigned to this contact
    pub history_id: i64,

    pub status: ContactStatus,
}

impl Contact {
    /// Sequence value this contact currently holds for `kind`.
    pub fn sequence_value(&self, kind: SequenceKind) -> i64 {
        match kind {
            SequenceKind::Timeline => self.timeline_id,
            SequenceKind::History => self.history_id,
        }
    }

    pub fn content(&self) -> ContactFields {
        ContactFields {
            email_address: self.email_address.clone(),
            firstname: self.firstname.clone(),
            lastname: self.lastname.clone(),
        }
    }
}

/// Raw `contacts` row. The status column is validated on conversion.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct ContactRow {
    pub id: i64,
    pub user_id: i64,
    pub uuid: String,
    pub email_address: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    pub timeline_id: i64,
    pub history_id: i64,
    pub status: String,
}

impl TryFrom<ContactRow> for Contact {
    type Error = Error;

    fn try_from(row: ContactRow) -> Result<Self> {
        Ok(Contact {
            status: ContactStatus::parse(&row.status)?,
            id: row.id,
            user_id: row.user_id,
            uuid: row.uuid,
            email_address: row.email_address,
            firstname: row.firstname,
            lastname: row.lastname,
            created_at: row.created_at,
            modified_at: row.modified_at,
            timeline_id: row.timeline_id,
            history_id: row.history_id,
        })
    }
}

/// Mutable content of a contact.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactFields {
    pub email_address: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

/// Partial update request for a contact.
///
/// `None` leaves a field untouched and an empty string clears it. Identity
/// fields are accepted here only so that attempts to change them can be
/// rejected explicitly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactPatch {
    pub id: Option<i64>,
    pub uuid: Option<String>,
    pub email_address: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

impl ContactPatch {
    /// Apply the patch over the stored content, returning the merged
    /// content if at least one field actually differs.
    pub fn merge(&self, current: &ContactFields) -> Option<ContactFields> {
        let merged = ContactFields {
            email_address: patch_field(&self.email_address, &current.email_address),
            firstname: patch_field(&self.firstname, &current.firstname),
            lastname: patch_field(&self.lastname, &current.lastname),
        };

        (merged != *current).then_some(merged)
    }
}

fn patch_field(patch: &Option<String>, current: &Option<String>) -> Option<String> {
    match patch.as_deref() {
        None => current.clone(),
        Some("") => None,
        Some(value) => Some(value.to_string()),
    }
}

/// Result of an incremental sync read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactSync {
    pub kind: SequenceKind,
    pub contacts: Vec<Contact>,
    /// Highest sequence value observed; the next `after` for this kind
    pub checkpoint: i64,
}

impl ContactSync {
    pub(crate) fn new(kind: SequenceKind, after: i64, contacts: Vec<Contact>) -> Self {
        let checkpoint = contacts
            .iter()
            .map(|c| c.sequence_value(kind))
            .max()
            .unwrap_or(after);
        Self {
            kind,
            contacts,
            checkpoint,
        }
    }
}
