//! Domain primitives shared by every sealpost crate.
//!
//! - [`proof`]: the signed-proof verifier gating sensitive mutations.
//! - [`validation`]: field shape checks (hex keys, base64 blobs, lengths).
//! - [`error`]: the [`CoreError`](error::CoreError) taxonomy.

pub mod error;
pub mod proof;
pub mod types;
pub mod validation;
