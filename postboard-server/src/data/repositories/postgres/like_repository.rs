use async_trait::async_trait;
use sqlx::PgPool;

use super::FOREIGN_KEY_VIOLATION;
use crate::data::like_repository::LikeRepository;
use crate::domain::error::DomainError;
use crate::domain::like::LikeToggle;

#[derive(Debug, Clone)]
pub struct PostgresLikeRepository {
    pool: PgPool,
}

impl PostgresLikeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LikeRepository for PostgresLikeRepository {
    async fn toggle_like(&self, post_id: i64, user_id: i64) -> Result<LikeToggle, DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_like_db_error)?;

        let removed = sqlx::query("DELETE FROM likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(map_like_db_error)?;

        let outcome = if removed.rows_affected() > 0 {
            LikeToggle::Unliked
        } else {
            // likes_post_id_user_id_key keeps a racing toggle from adding a second row
            sqlx::query(
                r#"
                INSERT INTO likes (post_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT (post_id, user_id) DO NOTHING
                "#,
            )
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(map_like_db_error)?;
            LikeToggle::Liked
        };

        tx.commit().await.map_err(map_like_db_error)?;
        Ok(outcome)
    }

    async fn remove_like(&self, post_id: i64, user_id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(map_like_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_likes(&self, post_id: i64) -> Result<i64, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_like_db_error)?;

        Ok(count)
    }

    async fn is_liked_by(&self, post_id: i64, user_id: i64) -> Result<bool, DomainError> {
        let liked: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM likes WHERE post_id = $1 AND user_id = $2)",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_like_db_error)?;

        Ok(liked)
    }
}

fn map_like_db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION)
    {
        let resource = match db_err.constraint() {
            Some("likes_user_id_fkey") => "user",
            _ => "post",
        };
        return DomainError::NotFound(resource.to_string());
    }
    DomainError::Unexpected(err.to_string())
}
