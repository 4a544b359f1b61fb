use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::warn;

use super::FOREIGN_KEY_VIOLATION;
use crate::data::post_repository::{NewPost, Pagination, PostPatch, PostRepository, PostStats};
use crate::domain::error::DomainError;
use crate::domain::post::Post;

#[derive(Debug, Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct PostRow {
    id: i64,
    owner_id: i64,
    title: String,
    content: String,
    image: Option<String>,
    is_published: bool,
    scheduled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct PostStatsRow {
    #[sqlx(flatten)]
    post: PostRow,
    likes: i64,
    comments: i64,
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (owner_id, title, content, image, is_published, scheduled_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, owner_id, title, content, image, is_published, scheduled_at,
                      created_at, updated_at
            "#,
        )
        .bind(input.owner_id)
        .bind(input.title)
        .bind(input.content)
        .bind(input.image)
        .bind(input.is_published)
        .bind(input.scheduled_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        map_row_to_post(row)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT
            id,
            owner_id,
            title,
            content,
            image,
            is_published,
            scheduled_at,
            created_at,
            updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        row.map(map_row_to_post).transpose()
    }

    async fn update_post(
        &self,
        post_id: i64,
        patch: PostPatch,
    ) -> Result<Option<Post>, DomainError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            UPDATE posts
            SET title = $2,
                content = $3,
                image = COALESCE($4, image),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, owner_id, title, content, image, is_published, scheduled_at,
                      created_at, updated_at
            "#,
        )
        .bind(post_id)
        .bind(patch.title)
        .bind(patch.content)
        .bind(patch.image)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        row.map(map_row_to_post).transpose()
    }

    async fn delete_post(&self, id: i64) -> Result<bool, DomainError> {
        // comments and likes go with the post (ON DELETE CASCADE)
        let result = sqlx::query(
            r#"
            DELETE FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_published_posts(
        &self,
        pagination: Pagination,
    ) -> Result<Vec<Post>, DomainError> {
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT
                id,
                owner_id,
                title,
                content,
                image,
                is_published,
                scheduled_at,
                created_at,
                updated_at
            FROM posts
            WHERE is_published
            ORDER BY COALESCE(scheduled_at, created_at) DESC, id DESC
            LIMIT $1
            OFFSET $2
            "#,
        )
        .bind(i64::from(pagination.limit))
        .bind(i64::from(pagination.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        rows.into_iter().map(map_row_to_post).collect()
    }

    async fn total_published_posts(&self) -> Result<i64, DomainError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM posts
            WHERE is_published
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Ok(count)
    }

    async fn owner_statistics(&self, owner_id: i64) -> Result<Vec<PostStats>, DomainError> {
        let rows = sqlx::query_as::<_, PostStatsRow>(
            r#"
            SELECT
                p.id,
                p.owner_id,
                p.title,
                p.content,
                p.image,
                p.is_published,
                p.scheduled_at,
                p.created_at,
                p.updated_at,
                (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes,
                (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments
            FROM posts p
            WHERE p.owner_id = $1
            ORDER BY p.created_at DESC, p.id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        rows.into_iter()
            .map(|row| -> Result<PostStats, DomainError> {
                Ok(PostStats {
                    post: map_row_to_post(row.post)?,
                    likes: row.likes,
                    comments: row.comments,
                })
            })
            .collect()
    }

    async fn find_due_posts(
        &self,
        now: DateTime<Utc>,
        after_id: i64,
        limit: u32,
    ) -> Result<Vec<Post>, DomainError> {
        let mut posts = Vec::new();
        let mut cursor = after_id;

        // undecodable rows are skipped, so keep scanning until the page is full
        while posts.len() < limit as usize {
            let wanted = limit as usize - posts.len();
            let rows = sqlx::query_as::<_, PostRow>(
                r#"
                SELECT
                    id,
                    owner_id,
                    title,
                    content,
                    image,
                    is_published,
                    scheduled_at,
                    created_at,
                    updated_at
                FROM posts
                WHERE is_published = FALSE
                  AND scheduled_at <= $1
                  AND id > $2
                ORDER BY id
                LIMIT $3
                "#,
            )
            .bind(now)
            .bind(cursor)
            .bind(wanted as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(map_post_db_error)?;

            let scanned = rows.len();
            if let Some(last_id) = decode_due_rows(rows, &mut posts) {
                cursor = last_id;
            }
            if scanned < wanted {
                break;
            }
        }

        Ok(posts)
    }

    async fn try_set_published(
        &self,
        post_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        // guarded write: a concurrent sweep that got here first leaves nothing to update
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET is_published = TRUE,
                updated_at = GREATEST(NOW(), created_at)
            WHERE id = $1
              AND is_published = FALSE
              AND scheduled_at <= $2
            "#,
        )
        .bind(post_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Ok(result.rows_affected() == 1)
    }
}

fn map_row_to_post(row: PostRow) -> Result<Post, DomainError> {
    Post::new(
        row.id,
        row.owner_id,
        row.title,
        row.content,
        row.image,
        row.is_published,
        row.scheduled_at,
        row.created_at,
        row.updated_at,
    )
    .map_err(|err| DomainError::Unexpected(err.to_string()))
}

/// Decodes a page of due rows, skipping rows that do not form a valid post.
/// Returns the id of the last row scanned.
fn decode_due_rows(rows: Vec<PostRow>, posts: &mut Vec<Post>) -> Option<i64> {
    let mut last_id = None;
    for row in rows {
        let id = row.id;
        last_id = Some(id);
        match map_row_to_post(row) {
            Ok(post) => posts.push(post),
            Err(err) => warn!(post_id = id, error = %err, "skipping undecodable due post"),
        }
    }
    last_id
}

fn map_post_db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION)
    {
        return DomainError::NotFound("owner".to_string());
    }
    DomainError::Unexpected(err.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{PostRow, decode_due_rows};

    fn due_row(id: i64, scheduled: bool) -> PostRow {
        let now = Utc::now();
        PostRow {
            id,
            owner_id: 1,
            title: format!("post {id}"),
            content: "body".to_string(),
            image: None,
            is_published: false,
            scheduled_at: scheduled.then(|| now - Duration::minutes(1)),
            created_at: now - Duration::hours(1),
            updated_at: now - Duration::hours(1),
        }
    }

    #[test]
    fn bad_row_is_skipped_without_dropping_the_rest() {
        let mut posts = Vec::new();
        let last = decode_due_rows(
            vec![due_row(3, true), due_row(4, false), due_row(7, true)],
            &mut posts,
        );

        let ids: Vec<i64> = posts.iter().map(|post| post.id).collect();
        assert_eq!(ids, vec![3, 7]);
        assert_eq!(last, Some(7));
    }

    #[test]
    fn cursor_advances_past_a_page_of_bad_rows() {
        let mut posts = Vec::new();
        let last = decode_due_rows(vec![due_row(5, false), due_row(6, false)], &mut posts);

        assert!(posts.is_empty());
        assert_eq!(last, Some(6));
        assert_eq!(decode_due_rows(Vec::new(), &mut posts), None);
    }
}
