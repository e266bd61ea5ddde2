//! User models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A mailbox owner. Each user owns one timeline and one history counter.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "snake_case")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Full name, or the username when no name is set
    pub fn display(&self) -> String {
        match (&self.firstname, &self.lastname) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(name), None) | (None, Some(name)) => name.clone(),
            (None, None) => self.username.clone(),
        }
    }
}

/// Input for creating a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

impl CreateUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            firstname: None,
            lastname: None,
        }
    }
}
