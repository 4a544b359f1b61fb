use axum::Router;
use axum::routing::{delete, get};

use crate::presentation::AppState;
use crate::presentation::http::handlers::comments::{
    create_comment, delete_comment, list_comments,
};

/// Comment routes resolve the caller themselves so guests get through.
pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/posts/{id}/comments",
            get(list_comments).post(create_comment),
        )
        .route("/api/comments/{id}", delete(delete_comment))
}
