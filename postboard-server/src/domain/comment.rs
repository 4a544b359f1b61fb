use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;

pub const COMMENT_MAX_CHARS: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    /// `None` for guest comments.
    pub author_id: Option<i64>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
}

impl CreateCommentRequest {
    pub fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            body: normalize_body(&self.body)?,
        })
    }
}

impl Comment {
    pub fn new(
        id: i64,
        post_id: i64,
        author_id: Option<i64>,
        body: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if id <= 0 || post_id <= 0 || author_id.is_some_and(|author| author <= 0) {
            return Err(DomainError::Validation {
                field: "id",
                message: "must be > 0",
            });
        }
        let body = normalize_body(&body.into())?;

        Ok(Self {
            id,
            post_id,
            author_id,
            body,
            created_at,
        })
    }
}

fn normalize_body(body: &str) -> Result<String, DomainError> {
    let body = body.trim();
    if body.is_empty() || body.chars().count() > COMMENT_MAX_CHARS {
        return Err(DomainError::Validation {
            field: "body",
            message: "must be 1..2000 chars",
        });
    }
    Ok(body.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{Comment, CreateCommentRequest};

    #[test]
    fn body_is_trimmed() {
        let req = CreateCommentRequest {
            body: "  nice post  ".to_string(),
        };
        assert_eq!(req.validate().expect("valid").body, "nice post");
    }

    #[test]
    fn body_length_is_bounded() {
        let max = CreateCommentRequest {
            body: "é".repeat(2000),
        };
        assert!(max.validate().is_ok());

        let too_long = CreateCommentRequest {
            body: "a".repeat(2001),
        };
        assert!(too_long.validate().is_err());

        let empty = CreateCommentRequest {
            body: " \n ".to_string(),
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn guest_comment_has_no_author() {
        let comment = Comment::new(1, 2, None, "hello", Utc::now()).expect("valid comment");
        assert!(comment.author_id.is_none());
        assert!(Comment::new(1, 2, Some(0), "hello", Utc::now()).is_err());
    }
}
