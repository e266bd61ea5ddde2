//! Application state for Cargomail.
//!
//! Contains the shared services handed to callers.

use crate::config::Config;
use crate::db::DbPool;
use crate::services::{ContactService, MailIngest, SequenceAllocator, UserService};
use crate::{config, Result};

/// Application state shared across callers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: DbPool,
    /// Per-user sequence allocator.
    pub sequencer: SequenceAllocator,
    /// User provisioning service.
    pub users: UserService,
    /// Contact service.
    pub contacts: ContactService,
    /// Capabilities for the mail transport.
    pub mail: MailIngest,
}

impl AppState {
    /// Create a new application state from the global configuration.
    pub async fn new() -> Result<Self> {
        let config = config::config();

        let pool_config = crate::db::pool::PoolConfig::from_config(&config.database);
        let db = crate::db::pool::create_pool_with_config(&config.database.path, pool_config).await?;

        crate::db::initialize_schema(&db).await?;

        Ok(Self::with_pool(db, config))
    }

    /// Build the services on top of an existing, initialized pool.
    pub fn with_pool(db: DbPool, config: &Config) -> Self {
        let sequencer = SequenceAllocator::new(db.clone(), &config.sequencer);
        let users = UserService::new(db.clone(), sequencer.clone());
        let contacts = ContactService::new(db.clone(), sequencer.clone());
        let mail = MailIngest::from_config(&config.smtp);

        Self {
            db,
            sequencer,
            users,
            contacts,
            mail,
        }
    }
}
