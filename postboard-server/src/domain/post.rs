use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;

pub const TITLE_MAX_CHARS: usize = 255;
const IMAGE_REF_MAX_CHARS: usize = 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub is_published: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where a post sits in its publication lifecycle at a given instant.
///
/// `Published` is terminal: nothing moves a post back to an unpublished state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationState {
    Scheduled,
    Due,
    Published,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub image: Option<String>,
}

impl CreatePostRequest {
    pub fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            title: normalize_title(&self.title)?,
            content: normalize_content(&self.content)?,
            image: normalize_image(self.image)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulePostRequest {
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub scheduled_at: DateTime<Utc>,
}

impl SchedulePostRequest {
    pub fn validate(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        if self.scheduled_at < now {
            return Err(DomainError::Validation {
                field: "scheduled_at",
                message: "must not be in the past",
            });
        }
        Ok(Self {
            title: normalize_title(&self.title)?,
            content: normalize_content(&self.content)?,
            image: normalize_image(self.image)?,
            scheduled_at: self.scheduled_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    pub title: String,
    pub content: String,
    /// Replacement image. `None` keeps the current one.
    pub image: Option<String>,
}

impl UpdatePostRequest {
    pub fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            title: normalize_title(&self.title)?,
            content: normalize_content(&self.content)?,
            image: normalize_image(self.image)?,
        })
    }
}

impl Post {
    /// Builds a post from stored fields.
    ///
    /// Text is kept as stored; requests are normalized before they are
    /// written. Only the structural invariants are checked here.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: i64,
        owner_id: i64,
        title: impl Into<String>,
        content: impl Into<String>,
        image: Option<String>,
        is_published: bool,
        scheduled_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        validate_positive_i64("id", id)?;
        validate_positive_i64("owner_id", owner_id)?;
        if !is_published && scheduled_at.is_none() {
            return Err(DomainError::Validation {
                field: "scheduled_at",
                message: "unpublished post must be scheduled",
            });
        }

        if updated_at < created_at {
            return Err(DomainError::Validation {
                field: "updated_at",
                message: "must be >= created_at",
            });
        }

        Ok(Self {
            id,
            owner_id,
            title: title.into(),
            content: content.into(),
            image,
            is_published,
            scheduled_at,
            created_at,
            updated_at,
        })
    }

    pub fn publication_state(&self, now: DateTime<Utc>) -> PublicationState {
        if self.is_published {
            return PublicationState::Published;
        }
        match self.scheduled_at {
            Some(at) if at > now => PublicationState::Scheduled,
            _ => PublicationState::Due,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.publication_state(now) == PublicationState::Due
    }
}

fn validate_positive_i64(field: &'static str, value: i64) -> Result<(), DomainError> {
    if value <= 0 {
        return Err(DomainError::Validation {
            field,
            message: "must be > 0",
        });
    }
    Ok(())
}

fn normalize_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > TITLE_MAX_CHARS {
        return Err(DomainError::Validation {
            field: "title",
            message: "must be 1..255 chars",
        });
    }
    Ok(title.to_string())
}

fn normalize_content(content: &str) -> Result<String, DomainError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(DomainError::Validation {
            field: "content",
            message: "must not be empty",
        });
    }
    Ok(content.to_string())
}

/// Image references are relative paths inside the image store.
fn normalize_image(image: Option<String>) -> Result<Option<String>, DomainError> {
    let Some(image) = image else {
        return Ok(None);
    };
    let image = image.trim();
    if image.is_empty() {
        return Ok(None);
    }

    let escapes_root = image.starts_with('/')
        || image.contains('\\')
        || image.split('/').any(|segment| segment == "..");
    if escapes_root || image.chars().count() > IMAGE_REF_MAX_CHARS {
        return Err(DomainError::Validation {
            field: "image",
            message: "must be a relative path inside the image store",
        });
    }
    Ok(Some(image.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{
        CreatePostRequest, DomainError, Post, PublicationState, SchedulePostRequest,
        UpdatePostRequest,
    };

    #[test]
    fn create_post_request_validate_rejects_empty_title() {
        let req = CreatePostRequest {
            title: "   ".to_string(),
            content: "valid content".to_string(),
            image: None,
        };

        let err = req.validate().expect_err("title must be rejected");
        assert_validation_field(err, "title");
    }

    #[test]
    fn create_post_request_validate_rejects_long_title() {
        let req = CreatePostRequest {
            title: "t".repeat(256),
            content: "valid content".to_string(),
            image: None,
        };

        let err = req.validate().expect_err("title must be rejected");
        assert_validation_field(err, "title");
    }

    #[test]
    fn update_post_request_validate_rejects_empty_content() {
        let req = UpdatePostRequest {
            title: "valid title".to_string(),
            content: "   ".to_string(),
            image: None,
        };

        let err = req.validate().expect_err("content must be rejected");
        assert_validation_field(err, "content");
    }

    #[test]
    fn create_post_request_validate_normalizes_fields() {
        let req = CreatePostRequest {
            title: "  title  ".to_string(),
            content: "  content  ".to_string(),
            image: Some("   ".to_string()),
        };

        let validated = req.validate().expect("must validate");
        assert_eq!(validated.title, "title");
        assert_eq!(validated.content, "content");
        assert_eq!(validated.image, None);
    }

    #[test]
    fn image_reference_must_stay_inside_store() {
        for image in ["/etc/passwd", "posts/../../secret", "posts\\a.png"] {
            let req = CreatePostRequest {
                title: "title".to_string(),
                content: "content".to_string(),
                image: Some(image.to_string()),
            };
            let err = req.validate().expect_err("image must be rejected");
            assert_validation_field(err, "image");
        }
    }

    #[test]
    fn schedule_request_rejects_past_time() {
        let now = Utc::now();
        let req = SchedulePostRequest {
            title: "title".to_string(),
            content: "content".to_string(),
            image: None,
            scheduled_at: now - Duration::seconds(1),
        };

        let err = req.validate(now).expect_err("past schedule must fail");
        assert_validation_field(err, "scheduled_at");
    }

    #[test]
    fn schedule_request_accepts_now() {
        let now = Utc::now();
        let req = SchedulePostRequest {
            title: "title".to_string(),
            content: "content".to_string(),
            image: Some("posts/cover.png".to_string()),
            scheduled_at: now,
        };

        let validated = req.validate(now).expect("now is allowed");
        assert_eq!(validated.image.as_deref(), Some("posts/cover.png"));
    }

    #[test]
    fn post_new_keeps_stored_text_verbatim() {
        let created_at = Utc::now();
        let updated_at = created_at + Duration::seconds(1);

        let post = Post::new(
            1,
            10,
            "  Title  ",
            "  Content  ",
            None,
            true,
            None,
            created_at,
            updated_at,
        )
        .expect("post should be created");

        assert_eq!(post.id, 1);
        assert_eq!(post.owner_id, 10);
        assert_eq!(post.title, "  Title  ");
        assert_eq!(post.content, "  Content  ");
    }

    #[test]
    fn post_new_rejects_non_positive_owner_id() {
        let now = Utc::now();
        let err = Post::new(1, 0, "Title", "Content", None, true, None, now, now)
            .expect_err("owner_id must be > 0");
        assert_validation_field(err, "owner_id");
    }

    #[test]
    fn post_new_rejects_unpublished_without_schedule() {
        let now = Utc::now();
        let err = Post::new(1, 10, "Title", "Content", None, false, None, now, now)
            .expect_err("unscheduled draft must fail");
        assert_validation_field(err, "scheduled_at");
    }

    #[test]
    fn post_new_rejects_updated_before_created() {
        let updated_at = Utc::now();
        let created_at = updated_at + Duration::seconds(1);

        let err = Post::new(
            1, 10, "Title", "Content", None, true, None, created_at, updated_at,
        )
        .expect_err("updated_at < created_at must fail");
        assert_validation_field(err, "updated_at");
    }

    #[test]
    fn publication_state_follows_schedule() {
        let now = Utc::now();
        let at = now + Duration::hours(1);
        let post = Post::new(1, 10, "Title", "Content", None, false, Some(at), now, now)
            .expect("valid scheduled post");

        assert_eq!(post.publication_state(now), PublicationState::Scheduled);
        assert_eq!(post.publication_state(at), PublicationState::Due);
        assert!(post.is_due(at + Duration::seconds(1)));

        let published = Post {
            is_published: true,
            ..post
        };
        assert_eq!(
            published.publication_state(at + Duration::days(1)),
            PublicationState::Published
        );
    }

    fn assert_validation_field(err: DomainError, expected_field: &'static str) {
        match err {
            DomainError::Validation { field, .. } => assert_eq!(field, expected_field),
            _ => panic!("expected DomainError::Validation"),
        }
    }
}
