//! User database queries.
//!
//! User creation provisions the user's sequence counters in the same
//! transaction, so no user is ever visible without them.

use crate::models::{now, CreateUser, User};
use crate::{Error, Result};

use super::{provision_sequences, DbPool};

/// Create a new user and seed both of its counters at zero.
pub async fn create_user(pool: &DbPool, input: CreateUser) -> Result<User> {
    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, firstname, lastname, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.username)
    .bind(&input.firstname)
    .bind(&input.lastname)
    .bind(now())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            Error::AlreadyExists(format!("User {} already exists", input.username))
        }
        _ => Error::StoreUnavailable(e),
    })?;

    provision_sequences(&mut tx, user.id).await?;

    tx.commit().await?;

    Ok(user)
}

/// Get a user by ID.
pub async fn get_user(pool: &DbPool, id: i64) -> Result<User> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User not found: {}", id)))
}

/// Get a user by username.
pub async fn get_user_by_username(pool: &DbPool, username: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await
        .map_err(Error::StoreUnavailable)
}

/// List all users.
pub async fn list_users(pool: &DbPool) -> Result<Vec<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(Error::StoreUnavailable)
}

/// Delete a user; contacts and counters cascade.
pub async fn delete_user(pool: &DbPool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("User not found: {}", id)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_pool;

    #[tokio::test]
    async fn test_create_and_get_user() {
        let pool = init_memory_pool().await.unwrap();

        let user = create_user(
            &pool,
            CreateUser {
                username: "ada".to_string(),
                firstname: Some("Ada".to_string()),
                lastname: Some("Lovelace".to_string()),
            },
        )
        .await
        .unwrap();

        let fetched = get_user(&pool, user.id).await.unwrap();
        assert_eq!(fetched.username, "ada");
        assert_eq!(fetched.display(), "Ada Lovelace");

        let by_name = get_user_by_username(&pool, "ada").await.unwrap();
        assert_eq!(by_name.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let pool = init_memory_pool().await.unwrap();
        create_user(&pool, CreateUser::new("ada")).await.unwrap();

        let err = create_user(&pool, CreateUser::new("ada")).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));

        // The failed attempt must not leave counters behind
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contact_sequences")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_delete_user_cascades_counters() {
        let pool = init_memory_pool().await.unwrap();
        let user = create_user(&pool, CreateUser::new("ada")).await.unwrap();

        delete_user(&pool, user.id).await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contact_sequences WHERE user_id = ?")
            .bind(user.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert!(matches!(get_user(&pool, user.id).await, Err(Error::NotFound(_))));
        assert!(matches!(delete_user(&pool, user.id).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_deleted_user_id_not_reused() {
        let pool = init_memory_pool().await.unwrap();
        create_user(&pool, CreateUser::new("ada")).await.unwrap();
        let bob = create_user(&pool, CreateUser::new("bob")).await.unwrap();

        delete_user(&pool, bob.id).await.unwrap();

        let carol = create_user(&pool, CreateUser::new("carol")).await.unwrap();
        assert!(carol.id > bob.id);
    }
}
