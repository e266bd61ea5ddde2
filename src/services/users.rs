//! User provisioning service.
//!
//! Creating a user seeds both of its sequence counters, so contact
//! mutations are accepted from the moment the user exists.

use tracing::info;

use crate::db::{self, DbPool};
use crate::error::{Error, Result};
use crate::models::{CreateUser, User};

use super::sequencer::SequenceAllocator;

/// Service for managing users.
#[derive(Clone)]
pub struct UserService {
    db: DbPool,
    sequencer: SequenceAllocator,
}

impl UserService {
    /// Create a new user service.
    pub fn new(db: DbPool, sequencer: SequenceAllocator) -> Self {
        Self { db, sequencer }
    }

    /// Create a user with zeroed counters.
    pub async fn create(&self, input: CreateUser) -> Result<User> {
        if input.username.trim().is_empty() {
            return Err(Error::InvalidInput("Username is required".to_string()));
        }

        let user = db::create_user(&self.db, input).await?;

        info!(user_id = user.id, username = %user.username, "Created user");

        Ok(user)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: i64) -> Result<User> {
        db::get_user(&self.db, id).await
    }

    /// Get a user by username.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        db::get_user_by_username(&self.db, username).await
    }

    /// List all users.
    pub async fn list(&self) -> Result<Vec<User>> {
        db::list_users(&self.db).await
    }

    /// Delete a user together with its contacts and counters.
    ///
    /// Waits for in-flight contact mutations of the user to finish.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let scope = self.sequencer.write_scope(id).await?;

        db::delete_user(&self.db, id).await?;

        drop(scope);
        self.sequencer.forget(id);

        info!(user_id = id, "Deleted user");

        Ok(())
    }
}
