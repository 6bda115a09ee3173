use sqlx::FromRow;

/// A row from the `contacts` table.
#[derive(Debug, Clone, FromRow)]
pub struct Contact {
    pub id: String,
    pub combined_id: String,
    pub secret_id: String,
    pub user_id: Vec<u8>,
    pub user_id_salt: Vec<u8>,
}

/// DTO for adding a contact.
#[derive(Debug, Clone)]
pub struct CreateContact {
    pub id: String,
    pub combined_id: String,
    pub secret_id: String,
    pub user_id: Vec<u8>,
    pub user_id_salt: Vec<u8>,
}
