//! Routes for contacts and the block / mute lists.
//!
//! Three routers are provided, one per list, each exposing the same
//! `POST /` (mutate) and `GET /` (list) pair.

use axum::routing::get;
use axum::Router;

use crate::handlers::{contacts, membership};
use crate::state::AppState;

/// Mounted at `/contacts`.
pub fn contacts_router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(contacts::list_contacts).post(contacts::update_contact),
    )
}

/// Mounted at `/blocks`.
pub fn blocks_router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(membership::list_blocks).post(membership::update_block),
    )
}

/// Mounted at `/mutes`.
pub fn mutes_router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(membership::list_mutes).post(membership::update_mute),
    )
}
