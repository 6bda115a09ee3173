//! Block and mute lists. Both share one row shape.

use sqlx::FromRow;

/// Which membership table an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipList {
    Blocked,
    Muted,
}

impl MembershipList {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Blocked => "blocked_users",
            Self::Muted => "muted_users",
        }
    }
}

/// A row from `blocked_users` or `muted_users`.
#[derive(Debug, Clone, FromRow)]
pub struct MembershipEntry {
    pub combined_id: String,
    pub secret_id: String,
}
