use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// User routes mounted at `/users`.
///
/// ```text
/// POST /               -> register_keys
/// PUT  /display-name   -> update_display_name
/// PUT  /status         -> update_status
/// GET  /settings       -> retrieve_settings
/// PUT  /settings       -> sync_settings
/// GET  /{user_id}      -> get_user
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(users::register_keys))
        .route("/display-name", put(users::update_display_name))
        .route("/status", put(users::update_status))
        .route(
            "/settings",
            get(users::retrieve_settings).put(users::sync_settings),
        )
        .route("/{user_id}", get(users::get_user))
}
