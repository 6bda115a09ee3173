use axum::routing::get;
use axum::Router;

use crate::handlers::messages;
use crate::state::AppState;

/// Message log routes mounted at `/messages`.
///
/// ```text
/// GET    /  -> list_messages
/// POST   /  -> send_message
/// PUT    /  -> edit_message
/// DELETE /  -> delete_message
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(messages::list_messages)
            .post(messages::send_message)
            .put(messages::edit_message)
            .delete(messages::delete_message),
    )
}
