use axum::Router;
use axum::middleware;
use axum::routing::{get, post, put};

use crate::presentation::AppState;
use crate::presentation::http::handlers::likes::{toggle_like, unlike};
use crate::presentation::http::handlers::posts::{
    create_post, delete_post, get_post, list_posts, my_statistics, schedule_post, update_post,
};
use crate::presentation::http::middleware::auth::jwt_auth_middleware;

pub(crate) fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/api/posts", get(list_posts))
        .route("/api/posts/{id}", get(get_post));

    let protected = Router::new()
        .route("/api/posts", post(create_post))
        .route("/api/posts/schedule", post(schedule_post))
        .route("/api/posts/{id}", put(update_post).delete(delete_post))
        .route("/api/posts/{id}/like", post(toggle_like).delete(unlike))
        .route("/api/me/statistics", get(my_statistics))
        .layer(middleware::from_fn_with_state(state, jwt_auth_middleware));

    public.merge(protected)
}
