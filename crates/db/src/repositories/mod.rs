//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&DbPool` as the first argument.

pub mod contact_repo;
pub mod membership_repo;
pub mod message_repo;
pub mod user_repo;

pub use contact_repo::ContactRepo;
pub use membership_repo::MembershipRepo;
pub use message_repo::MessageRepo;
pub use user_repo::UserRepo;
