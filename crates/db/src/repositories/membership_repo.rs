//! Repository for the `blocked_users` and `muted_users` tables.

use crate::models::membership::{MembershipEntry, MembershipList};
use crate::DbPool;

/// Add/remove/list operations shared by the block and mute lists.
pub struct MembershipRepo;

impl MembershipRepo {
    /// Insert an entry. An existing `combined_id` is left untouched.
    pub async fn add(
        pool: &DbPool,
        list: MembershipList,
        combined_id: &str,
        secret_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "INSERT INTO {} (combined_id, secret_id) VALUES (?1, ?2)
             ON CONFLICT (combined_id) DO NOTHING",
            list.table()
        );
        let result = sqlx::query(&query)
            .bind(combined_id)
            .bind(secret_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove an entry. Absent rows are not an error.
    pub async fn remove(
        pool: &DbPool,
        list: MembershipList,
        combined_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let query = format!("DELETE FROM {} WHERE combined_id = ?1", list.table());
        let result = sqlx::query(&query).bind(combined_id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// List the entries filed under `secret_id`.
    pub async fn list_by_secret_id(
        pool: &DbPool,
        list: MembershipList,
        secret_id: &str,
    ) -> Result<Vec<MembershipEntry>, sqlx::Error> {
        let query = format!(
            "SELECT combined_id, secret_id FROM {} WHERE secret_id = ?1 ORDER BY rowid",
            list.table()
        );
        sqlx::query_as::<_, MembershipEntry>(&query)
            .bind(secret_id)
            .fetch_all(pool)
            .await
    }
}
