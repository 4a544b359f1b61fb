use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::like::LikeToggle;

#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// Removes the user's like if present, creates it otherwise.
    /// A (post, user) pair never holds more than one like.
    async fn toggle_like(&self, post_id: i64, user_id: i64) -> Result<LikeToggle, DomainError>;
    async fn remove_like(&self, post_id: i64, user_id: i64) -> Result<bool, DomainError>;
    async fn count_likes(&self, post_id: i64) -> Result<i64, DomainError>;
    async fn is_liked_by(&self, post_id: i64, user_id: i64) -> Result<bool, DomainError>;
}
