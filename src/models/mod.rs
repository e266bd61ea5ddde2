//! Data models for Cargomail.
//!
//! Defines users, contacts, sequence kinds and the sync payload.

mod contact;
mod sequence;
mod user;

pub use contact::*;
pub use sequence::*;
pub use user::*;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new external identity token
pub fn new_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}
