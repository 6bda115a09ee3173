//! Repository for the `contacts` table.

use crate::models::contact::{Contact, CreateContact};
use crate::DbPool;

const COLUMNS: &str = "id, combined_id, secret_id, user_id, user_id_salt";

pub struct ContactRepo;

impl ContactRepo {
    /// Add a contact. Re-adding an existing `combined_id` is a no-op.
    ///
    /// Returns `true` if a row was inserted.
    pub async fn add(pool: &DbPool, input: &CreateContact) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO contacts (id, combined_id, secret_id, user_id, user_id_salt)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (combined_id) DO NOTHING",
        )
        .bind(&input.id)
        .bind(&input.combined_id)
        .bind(&input.secret_id)
        .bind(&input.user_id)
        .bind(&input.user_id_salt)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a contact by combined id. Absent rows are not an error.
    pub async fn remove(pool: &DbPool, combined_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM contacts WHERE combined_id = ?1")
            .bind(combined_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List all contacts filed under `secret_id`.
    pub async fn list_by_secret_id(
        pool: &DbPool,
        secret_id: &str,
    ) -> Result<Vec<Contact>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM contacts WHERE secret_id = ?1 ORDER BY rowid");
        sqlx::query_as::<_, Contact>(&query)
            .bind(secret_id)
            .fetch_all(pool)
            .await
    }
}
