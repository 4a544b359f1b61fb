use std::sync::Arc;

use sqlx::PgPool;

use crate::application::auth_service::AuthService;
use crate::application::blog_service::BlogService;
use crate::application::comment_service::CommentService;
use crate::application::like_service::LikeService;
use crate::data::repositories::postgres::comment_repository::PostgresCommentRepository;
use crate::data::repositories::postgres::like_repository::PostgresLikeRepository;
use crate::data::repositories::postgres::post_repository::PostgresPostRepository;
use crate::data::repositories::postgres::user_repository::PostgresUserRepository;
use crate::infrastructure::image_store::LocalImageStore;
use crate::infrastructure::jwt::JwtService;
use crate::infrastructure::settings::Settings;

pub mod http;

pub type PgAuthService = AuthService<PostgresUserRepository>;
pub type PgBlogService = BlogService<PostgresPostRepository, LocalImageStore>;
pub type PgCommentService = CommentService<PostgresCommentRepository, PostgresPostRepository>;
pub type PgLikeService = LikeService<PostgresLikeRepository, PostgresPostRepository>;

#[derive(Clone)]
pub struct AppState {
    pub(crate) pool: PgPool,
    pub(crate) auth_service: Arc<PgAuthService>,
    pub(crate) blog_service: Arc<PgBlogService>,
    pub(crate) comment_service: Arc<PgCommentService>,
    pub(crate) like_service: Arc<PgLikeService>,
    pub(crate) images: LocalImageStore,
    pub(crate) jwt: Arc<JwtService>,
}

impl AppState {
    pub fn new(pool: PgPool, settings: &Settings) -> Self {
        let jwt = JwtService::new(&settings.jwt_secret, settings.jwt_ttl_seconds);
        let posts = PostgresPostRepository::new(pool.clone());
        let images = LocalImageStore::new(
            settings.image_root.clone(),
            settings.image_base_url.clone(),
        );

        Self {
            auth_service: Arc::new(AuthService::new(
                PostgresUserRepository::new(pool.clone()),
                jwt.clone(),
            )),
            blog_service: Arc::new(BlogService::new(posts.clone(), images.clone())),
            comment_service: Arc::new(CommentService::new(
                PostgresCommentRepository::new(pool.clone()),
                posts.clone(),
            )),
            like_service: Arc::new(LikeService::new(
                PostgresLikeRepository::new(pool.clone()),
                posts,
            )),
            images,
            jwt: Arc::new(jwt),
            pool,
        }
    }
}
