//! Repository for the `users` table.

use crate::models::user::{CreateUser, User};
use crate::DbPool;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, public_signing_key, public_encryption_key, display_name, \
                       signed_display_name, status, signed_status, profile_picture_url, \
                       settings, settings_nonce, created_at";

/// Provides key registration and profile updates.
pub struct UserRepo;

impl UserRepo {
    /// Register a key pair, returning the created row.
    pub async fn create(pool: &DbPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (id, public_signing_key, public_encryption_key)
             VALUES (?1, ?2, ?3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.id)
            .bind(&input.public_signing_key)
            .bind(&input.public_encryption_key)
            .fetch_one(pool)
            .await
    }

    /// True if either key already belongs to a registered user.
    pub async fn any_key_in_use(
        pool: &DbPool,
        public_signing_key: &str,
        public_encryption_key: &str,
    ) -> Result<bool, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users
             WHERE public_signing_key = ?1 OR public_encryption_key = ?2",
        )
        .bind(public_signing_key)
        .bind(public_encryption_key)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    /// Find a user by public signing key (lowercase hex).
    pub async fn find_by_public_signing_key(
        pool: &DbPool,
        public_signing_key: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE public_signing_key = ?1");
        sqlx::query_as::<_, User>(&query)
            .bind(public_signing_key)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by display name.
    pub async fn find_by_display_name(
        pool: &DbPool,
        display_name: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE display_name = ?1");
        sqlx::query_as::<_, User>(&query)
            .bind(display_name)
            .fetch_optional(pool)
            .await
    }

    /// Store a new display name alongside the signed blob it was opened from.
    pub async fn update_display_name(
        pool: &DbPool,
        id: &str,
        display_name: &str,
        signed_display_name: &[u8],
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET display_name = ?1, signed_display_name = ?2 WHERE id = ?3",
        )
        .bind(display_name)
        .bind(signed_display_name)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Store a new status. `None` clears the opened status but the signed
    /// blob is always kept.
    pub async fn update_status(
        pool: &DbPool,
        id: &str,
        status: Option<&str>,
        signed_status: &[u8],
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET status = ?1, signed_status = ?2 WHERE id = ?3")
            .bind(status)
            .bind(signed_status)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the encrypted settings blob and its nonce.
    pub async fn update_settings(
        pool: &DbPool,
        id: &str,
        settings: &[u8],
        settings_nonce: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET settings = ?1, settings_nonce = ?2 WHERE id = ?3")
                .bind(settings)
                .bind(settings_nonce)
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
