//! Row structs and insert DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the table and,
//! where rows are created through the API, a plain DTO for inserts.

pub mod contact;
pub mod membership;
pub mod message;
pub mod user;
