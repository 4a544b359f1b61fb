use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::like_service::LikeStatus;
use crate::presentation::AppState;
use crate::presentation::http::app_error::AppResult;
use crate::presentation::http::middleware::auth::AuthenticatedUser;

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct LikeStatusDto {
    pub(crate) liked: bool,
    pub(crate) likes: i64,
}

impl From<LikeStatus> for LikeStatusDto {
    fn from(status: LikeStatus) -> Self {
        Self {
            liked: status.liked,
            likes: status.likes,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/like",
    tag = "likes",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Like toggled", body = LikeStatusDto),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn toggle_like(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(post_id): Path<i64>,
) -> AppResult<(StatusCode, Json<LikeStatusDto>)> {
    let status = state.like_service.toggle(&auth.actor, post_id).await?;
    Ok((StatusCode::OK, Json(status.into())))
}

#[utoipa::path(
    delete,
    path = "/api/posts/{id}/like",
    tag = "likes",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Like removed (no-op when absent)", body = LikeStatusDto),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn unlike(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(post_id): Path<i64>,
) -> AppResult<(StatusCode, Json<LikeStatusDto>)> {
    let status = state.like_service.unlike(&auth.actor, post_id).await?;
    Ok((StatusCode::OK, Json(status.into())))
}
