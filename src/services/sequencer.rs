//! Per-user sequence allocation.
//!
//! Each user has a timeline and a history counter. All contact writes for a
//! user run inside that user's write scope, a per-user async mutex, so
//! allocation and the row write that consumes the value are serialized.
//! Users never share a scope.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error};

use crate::config::SequencerConfig;
use crate::db::{self, DbConnection, DbPool};
use crate::error::{Error, Result};
use crate::models::SequenceKind;

use super::policy::ChangeLogEffect;

/// Exclusive write access to one user's counters and contacts.
///
/// Released on drop.
pub struct UserWriteScope {
    user_id: i64,
    _guard: OwnedMutexGuard<()>,
}

impl UserWriteScope {
    pub fn user_id(&self) -> i64 {
        self.user_id
    }
}

/// Sequence values allocated for one mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Allocation {
    pub timeline: Option<i64>,
    pub history: Option<i64>,
}

impl Allocation {
    pub fn timeline_or(&self, current: i64) -> i64 {
        self.timeline.unwrap_or(current)
    }

    pub fn history_or(&self, current: i64) -> i64 {
        self.history.unwrap_or(current)
    }
}

/// Allocator for per-(user, kind) counters.
#[derive(Clone)]
pub struct SequenceAllocator {
    db: DbPool,
    scopes: Arc<DashMap<i64, Arc<Mutex<()>>>>,
    lock_timeout: Duration,
}

impl SequenceAllocator {
    /// Create a new allocator.
    pub fn new(db: DbPool, config: &SequencerConfig) -> Self {
        Self {
            db,
            scopes: Arc::new(DashMap::new()),
            lock_timeout: config.lock_timeout,
        }
    }

    /// Enter the write scope of a user, waiting at most the configured timeout.
    pub async fn write_scope(&self, user_id: i64) -> Result<UserWriteScope> {
        let lock = self.scopes.entry(user_id).or_default().clone();

        let guard = tokio::time::timeout(self.lock_timeout, lock.lock_owned())
            .await
            .map_err(|_| Error::LockTimeout { user_id })?;

        Ok(UserWriteScope {
            user_id,
            _guard: guard,
        })
    }

    /// Drop the scope entry of a removed user.
    pub fn forget(&self, user_id: i64) {
        self.scopes.remove(&user_id);
    }

    /// Allocate the next value of one counter on the caller's transaction.
    pub async fn next(
        &self,
        scope: &UserWriteScope,
        conn: &mut DbConnection,
        kind: SequenceKind,
    ) -> Result<i64> {
        let user_id = scope.user_id();
        match db::next_sequence_value(conn, user_id, kind).await {
            Ok(value) => {
                debug!(user_id, kind = %kind, value, "Allocated sequence value");
                Ok(value)
            }
            Err(e) => {
                if e.is_fatal() {
                    error!(user_id, kind = %kind, "Sequence counter missing; user was not provisioned");
                }
                Err(e)
            }
        }
    }

    /// Allocate every counter an effect asks for.
    pub async fn allocate(
        &self,
        scope: &UserWriteScope,
        conn: &mut DbConnection,
        effect: &ChangeLogEffect,
    ) -> Result<Allocation> {
        let mut allocation = Allocation::default();
        for kind in effect.sequences() {
            let value = self.next(scope, conn, kind).await?;
            match kind {
                SequenceKind::Timeline => allocation.timeline = Some(value),
                SequenceKind::History => allocation.history = Some(value),
            }
        }
        Ok(allocation)
    }

    /// Last committed value of a counter.
    pub async fn current(&self, user_id: i64, kind: SequenceKind) -> Result<i64> {
        db::current_sequence_value(&self.db, user_id, kind).await
    }
}
