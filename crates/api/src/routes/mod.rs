pub mod health;
pub mod membership;
pub mod messages;
pub mod stream;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /messages                     send (POST), edit (PUT), delete (DELETE), list (GET)
///
/// /stream                       open SSE event stream (GET)
/// /stream/heartbeat             renew stream liveness (POST)
///
/// /users                        register keys (POST)
/// /users/{user_id}              lookup by signing key or display name (GET)
/// /users/display-name           update signed display name (PUT)
/// /users/status                 update signed status (PUT)
/// /users/settings               sync (PUT), retrieve (GET)
///
/// /contacts                     add/remove (POST), list (GET)
/// /blocks                       block/unblock (POST), list (GET)
/// /mutes                        mute/unmute (POST), list (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/messages", messages::router())
        .nest("/stream", stream::router())
        .nest("/users", users::router())
        .nest("/contacts", membership::contacts_router())
        .nest("/blocks", membership::blocks_router())
        .nest("/mutes", membership::mutes_router())
}
