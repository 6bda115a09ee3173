pub mod contacts;
pub mod membership;
pub mod messages;
pub mod stream;
pub mod users;
