use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::blog_service::ListPostsResult;
use crate::data::post_repository::PostStats;
use crate::domain::post::{CreatePostRequest, Post, SchedulePostRequest, UpdatePostRequest};
use crate::infrastructure::image_store::LocalImageStore;
use crate::presentation::AppState;
use crate::presentation::http::app_error::AppResult;
use crate::presentation::http::handlers::comments::CommentDto;
use crate::presentation::http::middleware::auth::{AuthenticatedUser, MaybeUser};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CreatePostDto {
    #[validate(length(min = 1, max = 255))]
    pub(crate) title: String,
    #[validate(length(min = 1))]
    pub(crate) content: String,
    /// Path of an already stored image, relative to the image root.
    #[validate(length(max = 1024))]
    pub(crate) image: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct SchedulePostDto {
    #[validate(length(min = 1, max = 255))]
    pub(crate) title: String,
    #[validate(length(min = 1))]
    pub(crate) content: String,
    #[validate(length(max = 1024))]
    pub(crate) image: Option<String>,
    /// RFC 3339 instant; must not be in the past.
    pub(crate) scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct UpdatePostDto {
    #[validate(length(min = 1, max = 255))]
    pub(crate) title: String,
    #[validate(length(min = 1))]
    pub(crate) content: String,
    /// Omit to keep the current image.
    #[validate(length(max = 1024))]
    pub(crate) image: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct PaginationQuery {
    #[validate(range(min = 1, max = 100))]
    pub(crate) limit: Option<u32>,
    pub(crate) offset: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostDto {
    pub(crate) id: i64,
    pub(crate) owner_id: i64,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) image: Option<String>,
    /// Public URL of `image`, if any.
    pub(crate) image_url: Option<String>,
    pub(crate) is_published: bool,
    pub(crate) scheduled_at: Option<DateTime<Utc>>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ListPostsResponseDto {
    pub(crate) posts: Vec<PostDto>,
    pub(crate) limit: u32,
    pub(crate) offset: u32,
    pub(crate) total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostDetailsDto {
    pub(crate) post: PostDto,
    /// Newest first.
    pub(crate) comments: Vec<CommentDto>,
    pub(crate) likes: i64,
    /// Whether the caller likes the post; always `false` for guests.
    pub(crate) liked: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostStatsDto {
    pub(crate) post: PostDto,
    pub(crate) likes: i64,
    pub(crate) comments: i64,
}

impl PostDto {
    fn new(post: Post, images: &LocalImageStore) -> Self {
        let image_url = post
            .image
            .as_deref()
            .map(|reference| images.public_url(reference));
        Self {
            id: post.id,
            owner_id: post.owner_id,
            title: post.title,
            content: post.content,
            image: post.image,
            image_url,
            is_published: post.is_published,
            scheduled_at: post.scheduled_at,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

impl ListPostsResponseDto {
    fn new(result: ListPostsResult, images: &LocalImageStore) -> Self {
        Self {
            posts: result
                .posts
                .into_iter()
                .map(|post| PostDto::new(post, images))
                .collect(),
            limit: result.limit,
            offset: result.offset,
            total: result.total,
        }
    }
}

impl PostStatsDto {
    fn new(stats: PostStats, images: &LocalImageStore) -> Self {
        Self {
            post: PostDto::new(stats.post, images),
            likes: stats.likes,
            comments: stats.comments,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    params(
        ("limit" = Option<u32>, Query, description = "Items per page (1..=100)"),
        ("offset" = Option<u32>, Query, description = "Offset from the beginning (>= 0)")
    ),
    responses(
        (status = 200, description = "Published posts, newest first", body = ListPostsResponseDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Malformed or expired token"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn list_posts(
    State(state): State<AppState>,
    caller: MaybeUser,
    Query(query): Query<PaginationQuery>,
) -> AppResult<(StatusCode, Json<ListPostsResponseDto>)> {
    query.validate()?;
    let limit = query.limit.unwrap_or(20);
    let offset = query.offset.unwrap_or(0);

    let result = state
        .blog_service
        .list_posts(caller.actor(), limit, offset)
        .await?;

    Ok((StatusCode::OK, Json(ListPostsResponseDto::new(result, &state.images))))
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "posts",
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Post with comments and likes", body = PostDetailsDto),
        (status = 401, description = "Malformed or expired token"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn get_post(
    State(state): State<AppState>,
    caller: MaybeUser,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<PostDetailsDto>)> {
    let post = state.blog_service.view_post(caller.actor(), id).await?;
    let comments = state.comment_service.list_for_post(id).await?;
    let like_status = state.like_service.status(caller.actor(), id).await?;

    let details = PostDetailsDto {
        post: PostDto::new(post, &state.images),
        comments: comments.into_iter().map(CommentDto::from).collect(),
        likes: like_status.likes,
        liked: like_status.liked,
    };
    Ok((StatusCode::OK, Json(details)))
}

#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    request_body = CreatePostDto,
    responses(
        (status = 201, description = "Post created and published", body = PostDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn create_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(dto): Json<CreatePostDto>,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    dto.validate()?;
    let req = CreatePostRequest {
        title: dto.title,
        content: dto.content,
        image: dto.image,
    };

    let result = state
        .blog_service
        .create_post(Some(&auth.actor), req)
        .await?;
    Ok((StatusCode::CREATED, Json(PostDto::new(result, &state.images))))
}

#[utoipa::path(
    post,
    path = "/api/posts/schedule",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    request_body = SchedulePostDto,
    responses(
        (status = 201, description = "Post scheduled", body = PostDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn schedule_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(dto): Json<SchedulePostDto>,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    dto.validate()?;
    let req = SchedulePostRequest {
        title: dto.title,
        content: dto.content,
        image: dto.image,
        scheduled_at: dto.scheduled_at,
    };

    let result = state
        .blog_service
        .schedule_post(Some(&auth.actor), req, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(PostDto::new(result, &state.images))))
}

#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    request_body = UpdatePostDto,
    responses(
        (status = 200, description = "Post updated", body = PostDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner or an admin"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn update_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(dto): Json<UpdatePostDto>,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    dto.validate()?;
    let req = UpdatePostRequest {
        title: dto.title,
        content: dto.content,
        image: dto.image,
    };

    let result = state
        .blog_service
        .update_post(Some(&auth.actor), id, req)
        .await?;
    Ok((StatusCode::OK, Json(PostDto::new(result, &state.images))))
}

#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 204, description = "Post deleted with its comments and likes"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner or an admin"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn delete_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state
        .blog_service
        .delete_post(Some(&auth.actor), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/me/statistics",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Caller's posts with counts", body = Vec<PostStatsDto>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn my_statistics(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> AppResult<(StatusCode, Json<Vec<PostStatsDto>>)> {
    let stats = state.blog_service.owner_statistics(&auth.actor).await?;
    Ok((
        StatusCode::OK,
        Json(
            stats
                .into_iter()
                .map(|stats| PostStatsDto::new(stats, &state.images))
                .collect(),
        ),
    ))
}
