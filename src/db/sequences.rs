//! Per-user sequence counter queries.
//!
//! Writes take a connection so they can join the caller's transaction.

use crate::models::SequenceKind;
use crate::{Error, Result};

use super::{DbConnection, DbPool};

/// Seed both counters of a user at zero.
pub async fn provision_sequences(conn: &mut DbConnection, user_id: i64) -> Result<()> {
    for kind in SequenceKind::ALL {
        sqlx::query(
            r#"
            INSERT INTO contact_sequences (user_id, kind, last_value)
            VALUES (?, ?, 0)
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Advance a counter and return the new value.
///
/// Fails with `SequenceNotProvisioned` when the counter row is missing.
pub async fn next_sequence_value(
    conn: &mut DbConnection,
    user_id: i64,
    kind: SequenceKind,
) -> Result<i64> {
    let row: Option<(i64,)> = sqlx::query_as(
        r#"
        UPDATE contact_sequences
        SET last_value = last_value + 1
        WHERE user_id = ? AND kind = ?
        RETURNING last_value
        "#,
    )
    .bind(user_id)
    .bind(kind.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    row.map(|(value,)| value)
        .ok_or(Error::SequenceNotProvisioned { user_id, kind })
}

/// Last allocated value of a counter.
pub async fn current_sequence_value(pool: &DbPool, user_id: i64, kind: SequenceKind) -> Result<i64> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT last_value FROM contact_sequences WHERE user_id = ? AND kind = ?",
    )
    .bind(user_id)
    .bind(kind.as_str())
    .fetch_optional(pool)
    .await?;

    row.map(|(value,)| value)
        .ok_or(Error::SequenceNotProvisioned { user_id, kind })
}
