use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::error::DomainError;
use crate::domain::post::Post;

#[derive(Debug, Clone)]
pub struct NewPost {
    pub owner_id: i64,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub is_published: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct PostPatch {
    pub title: String,
    pub content: String,
    /// `None` keeps the stored image.
    pub image: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone)]
pub struct PostStats {
    pub post: Post,
    pub likes: i64,
    pub comments: i64,
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError>;
    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError>;
    async fn update_post(
        &self,
        post_id: i64,
        patch: PostPatch,
    ) -> Result<Option<Post>, DomainError>;
    /// Removes the post together with its comments and likes.
    async fn delete_post(&self, id: i64) -> Result<bool, DomainError>;
    async fn list_published_posts(
        &self,
        pagination: Pagination,
    ) -> Result<Vec<Post>, DomainError>;
    async fn total_published_posts(&self) -> Result<i64, DomainError>;
    async fn owner_statistics(&self, owner_id: i64) -> Result<Vec<PostStats>, DomainError>;

    /// Unpublished posts with `scheduled_at <= now` and `id > after_id`,
    /// ordered by id, at most `limit` of them. Fewer than `limit` means the
    /// scan is exhausted. Stored rows that fail to decode are skipped.
    async fn find_due_posts(
        &self,
        now: DateTime<Utc>,
        after_id: i64,
        limit: u32,
    ) -> Result<Vec<Post>, DomainError>;

    /// Conditional write: publishes the post only while it is still
    /// unpublished and due at `now`. Returns whether this call made the
    /// transition.
    async fn try_set_published(
        &self,
        post_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError>;
}
