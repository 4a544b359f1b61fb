use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::data::post_repository::{NewPost, Pagination, PostPatch, PostRepository, PostStats};
use crate::domain::error::DomainError;
use crate::domain::policy::{
    can_create_post, can_delete_post, can_update_post, can_view_any_post, can_view_post,
};
use crate::domain::post::{CreatePostRequest, Post, SchedulePostRequest, UpdatePostRequest};
use crate::domain::user::Actor;
use crate::infrastructure::image_store::ImageStore;

#[derive(Debug, Clone)]
pub struct ListPostsResult {
    pub posts: Vec<Post>,
    pub limit: u32,
    pub offset: u32,
    pub total: i64,
}

pub struct BlogService<R: PostRepository, I: ImageStore> {
    repo: R,
    images: I,
}

impl<R: PostRepository, I: ImageStore> BlogService<R, I> {
    pub fn new(repo: R, images: I) -> Self {
        Self { repo, images }
    }

    /// Creates a post that is visible right away.
    pub async fn create_post(
        &self,
        actor: Option<&Actor>,
        req: CreatePostRequest,
    ) -> Result<Post, DomainError> {
        let owner_id = Self::creator(actor)?;
        let req = req.validate()?;

        let new_post = NewPost {
            owner_id,
            title: req.title,
            content: req.content,
            image: req.image,
            is_published: true,
            scheduled_at: None,
        };
        self.repo.create_post(new_post).await
    }

    /// Creates an unpublished post that the publish sweep promotes once
    /// `scheduled_at` has passed.
    pub async fn schedule_post(
        &self,
        actor: Option<&Actor>,
        req: SchedulePostRequest,
        now: DateTime<Utc>,
    ) -> Result<Post, DomainError> {
        let owner_id = Self::creator(actor)?;
        let req = req.validate(now)?;

        let new_post = NewPost {
            owner_id,
            title: req.title,
            content: req.content,
            image: req.image,
            is_published: false,
            scheduled_at: Some(req.scheduled_at),
        };
        let post = self.repo.create_post(new_post).await?;
        info!(post_id = post.id, scheduled_at = %req.scheduled_at, "post scheduled");
        Ok(post)
    }

    /// Reader-facing lookup; the policy decides whether `actor` may see it.
    pub async fn view_post(&self, actor: Option<&Actor>, id: i64) -> Result<Post, DomainError> {
        let post = self.get_post(id).await?;
        can_view_post(actor, &post).into_result()?;
        Ok(post)
    }

    pub async fn get_post(&self, id: i64) -> Result<Post, DomainError> {
        self.repo
            .get_post(id)
            .await?
            .ok_or(DomainError::NotFound(format!("post id: {id}")))
    }

    pub async fn update_post(
        &self,
        actor: Option<&Actor>,
        post_id: i64,
        req: UpdatePostRequest,
    ) -> Result<Post, DomainError> {
        let req = req.validate()?;
        let original = self.get_post(post_id).await?;
        can_update_post(actor, &original).into_result()?;

        let patch = PostPatch {
            title: req.title,
            content: req.content,
            image: req.image,
        };
        let updated = self
            .repo
            .update_post(post_id, patch)
            .await?
            .ok_or(DomainError::NotFound(format!("post id: {post_id}")))?;

        if let Some(previous) = original.image.as_deref()
            && updated.image.as_deref() != Some(previous)
        {
            self.release_image(post_id, previous).await;
        }
        Ok(updated)
    }

    pub async fn delete_post(
        &self,
        actor: Option<&Actor>,
        post_id: i64,
    ) -> Result<(), DomainError> {
        let original = self.get_post(post_id).await?;
        can_delete_post(actor, &original).into_result()?;

        let deleted = self.repo.delete_post(post_id).await?;
        if !deleted {
            return Err(DomainError::NotFound(format!("post id: {post_id}")));
        }

        if let Some(image) = original.image.as_deref() {
            self.release_image(post_id, image).await;
        }
        Ok(())
    }

    /// Published posts only, newest first.
    pub async fn list_posts(
        &self,
        actor: Option<&Actor>,
        limit: u32,
        offset: u32,
    ) -> Result<ListPostsResult, DomainError> {
        can_view_any_post(actor).into_result()?;
        let pagination = Pagination { limit, offset };
        let posts = self.repo.list_published_posts(pagination).await?;
        let total = self.repo.total_published_posts().await?;

        Ok(ListPostsResult {
            posts,
            limit,
            offset,
            total,
        })
    }

    /// Every post of the actor, scheduled ones included, with engagement counts.
    pub async fn owner_statistics(&self, actor: &Actor) -> Result<Vec<PostStats>, DomainError> {
        self.repo.owner_statistics(actor.id).await
    }

    fn creator(actor: Option<&Actor>) -> Result<i64, DomainError> {
        can_create_post(actor).into_result()?;
        actor
            .map(|actor| actor.id)
            .ok_or_else(|| DomainError::Forbidden("no actor".to_string()))
    }

    // The post row is already gone or updated; a leftover file is only logged.
    async fn release_image(&self, post_id: i64, image: &str) {
        if let Err(err) = self.images.release(image).await {
            warn!(post_id, image, error = %err, "failed to release post image");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    use super::BlogService;
    use crate::data::comment_repository::{CommentRepository, NewComment};
    use crate::data::like_repository::LikeRepository;
    use crate::data::repositories::memory::MemoryStore;
    use crate::data::user_repository::{NewUser, UserRepository};
    use crate::domain::error::DomainError;
    use crate::domain::post::{CreatePostRequest, SchedulePostRequest, UpdatePostRequest};
    use crate::domain::user::{Actor, Role};
    use crate::infrastructure::image_store::ImageStore;

    #[derive(Clone, Default)]
    struct FakeImageStore {
        released: Arc<Mutex<Vec<String>>>,
    }

    impl FakeImageStore {
        fn released(&self) -> Vec<String> {
            self.released
                .lock()
                .expect("released mutex poisoned")
                .clone()
        }
    }

    #[async_trait]
    impl ImageStore for FakeImageStore {
        async fn release(&self, reference: &str) -> Result<bool, DomainError> {
            self.released
                .lock()
                .expect("released mutex poisoned")
                .push(reference.to_string());
            Ok(true)
        }
    }

    struct Fixture {
        store: MemoryStore,
        images: FakeImageStore,
        service: BlogService<MemoryStore, FakeImageStore>,
        owner: Actor,
        stranger: Actor,
        admin: Actor,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let owner = seed_actor(&store, "owner@example.com", Role::Member).await;
        let stranger = seed_actor(&store, "stranger@example.com", Role::Member).await;
        let admin = seed_actor(&store, "admin@example.com", Role::Admin).await;
        let images = FakeImageStore::default();
        let service = BlogService::new(store.clone(), images.clone());
        Fixture {
            store,
            images,
            service,
            owner,
            stranger,
            admin,
        }
    }

    #[tokio::test]
    async fn create_post_is_published_immediately() {
        let fx = fixture().await;
        let post = fx
            .service
            .create_post(Some(&fx.owner), create_req("  title  ", Some("posts/a.png")))
            .await
            .expect("create must succeed");

        assert_eq!(post.title, "title");
        assert_eq!(post.owner_id, fx.owner.id);
        assert!(post.is_published);
        assert!(post.scheduled_at.is_none());
        assert_eq!(post.image.as_deref(), Some("posts/a.png"));
    }

    #[tokio::test]
    async fn guest_cannot_create_post() {
        let fx = fixture().await;
        let err = fx
            .service
            .create_post(None, create_req("title", None))
            .await
            .expect_err("guest must be refused");
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn schedule_post_starts_unpublished() {
        let fx = fixture().await;
        let now = Utc::now();
        let at = now + Duration::hours(1);
        let post = fx
            .service
            .schedule_post(Some(&fx.owner), schedule_req(at), now)
            .await
            .expect("schedule must succeed");

        assert!(!post.is_published);
        assert_eq!(post.scheduled_at, Some(at));

        let feed = fx.service.list_posts(None, 20, 0).await.expect("list");
        assert_eq!(feed.total, 0);
        assert!(feed.posts.is_empty());

        let direct = fx
            .service
            .view_post(None, post.id)
            .await
            .expect("direct lookup is open to guests");
        assert_eq!(direct.id, post.id);
    }

    #[tokio::test]
    async fn schedule_post_rejects_past_time() {
        let fx = fixture().await;
        let now = Utc::now();
        let err = fx
            .service
            .schedule_post(Some(&fx.owner), schedule_req(now - Duration::minutes(1)), now)
            .await
            .expect_err("past schedule must fail");
        assert!(matches!(err, DomainError::Validation { field: "scheduled_at", .. }));
    }

    #[tokio::test]
    async fn get_post_returns_not_found_when_missing() {
        let fx = fixture().await;
        let err = fx.service.get_post(42).await.expect_err("post must be missing");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_post_allows_owner_and_admin_only() {
        let fx = fixture().await;
        let post = fx
            .service
            .create_post(Some(&fx.owner), create_req("title", None))
            .await
            .expect("create");

        let err = fx
            .service
            .update_post(Some(&fx.stranger), post.id, update_req("hijack", None))
            .await
            .expect_err("stranger must be refused");
        assert!(matches!(err, DomainError::Forbidden(reason) if reason == "not authorized"));

        let by_owner = fx
            .service
            .update_post(Some(&fx.owner), post.id, update_req("  owner edit ", None))
            .await
            .expect("owner may edit");
        assert_eq!(by_owner.title, "owner edit");

        let by_admin = fx
            .service
            .update_post(Some(&fx.admin), post.id, update_req("admin edit", None))
            .await
            .expect("admin may edit");
        assert_eq!(by_admin.title, "admin edit");
        assert_eq!(by_admin.owner_id, fx.owner.id);
    }

    #[tokio::test]
    async fn update_missing_post_is_not_found_before_policy() {
        let fx = fixture().await;
        let err = fx
            .service
            .update_post(None, 404, update_req("title", None))
            .await
            .expect_err("missing post");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn replacing_image_releases_previous_one() {
        let fx = fixture().await;
        let post = fx
            .service
            .create_post(Some(&fx.owner), create_req("title", Some("posts/old.png")))
            .await
            .expect("create");

        fx.service
            .update_post(Some(&fx.owner), post.id, update_req("title", None))
            .await
            .expect("update without image");
        assert!(fx.images.released().is_empty());

        let updated = fx
            .service
            .update_post(Some(&fx.owner), post.id, update_req("title", Some("posts/new.png")))
            .await
            .expect("update with image");
        assert_eq!(updated.image.as_deref(), Some("posts/new.png"));
        assert_eq!(fx.images.released(), vec!["posts/old.png".to_string()]);
    }

    #[tokio::test]
    async fn delete_post_returns_forbidden_for_non_owner() {
        let fx = fixture().await;
        let post = fx
            .service
            .create_post(Some(&fx.owner), create_req("title", None))
            .await
            .expect("create");

        let err = fx
            .service
            .delete_post(Some(&fx.stranger), post.id)
            .await
            .expect_err("must be forbidden");
        assert!(matches!(err, DomainError::Forbidden(_)));

        let err = fx
            .service
            .delete_post(None, post.id)
            .await
            .expect_err("guest must be forbidden");
        assert!(matches!(err, DomainError::Forbidden(reason) if reason == "no actor"));
    }

    #[tokio::test]
    async fn admin_delete_cascades_and_releases_image() {
        let fx = fixture().await;
        let post = fx
            .service
            .create_post(Some(&fx.owner), create_req("title", Some("posts/cover.png")))
            .await
            .expect("create");
        let comment = fx
            .store
            .create_comment(NewComment {
                post_id: post.id,
                author_id: Some(fx.stranger.id),
                body: "nice".to_string(),
            })
            .await
            .expect("comment");
        fx.store
            .toggle_like(post.id, fx.stranger.id)
            .await
            .expect("like");

        fx.service
            .delete_post(Some(&fx.admin), post.id)
            .await
            .expect("admin may delete");

        assert!(fx.store.get_comment(comment.id).await.expect("get").is_none());
        assert_eq!(fx.store.count_likes(post.id).await.expect("count"), 0);
        assert_eq!(fx.images.released(), vec!["posts/cover.png".to_string()]);

        let err = fx.service.get_post(post.id).await.expect_err("post is gone");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_posts_returns_posts_and_total() {
        let fx = fixture().await;
        for title in ["a", "b", "c"] {
            fx.service
                .create_post(Some(&fx.owner), create_req(title, None))
                .await
                .expect("create");
        }

        let result = fx.service.list_posts(None, 2, 1).await.expect("list");
        assert_eq!(result.limit, 2);
        assert_eq!(result.offset, 1);
        assert_eq!(result.total, 3);
        assert_eq!(result.posts.len(), 2);
    }

    #[tokio::test]
    async fn owner_statistics_include_scheduled_posts_and_counts() {
        let fx = fixture().await;
        let now = Utc::now();
        let visible = fx
            .service
            .create_post(Some(&fx.owner), create_req("visible", None))
            .await
            .expect("create");
        fx.service
            .schedule_post(Some(&fx.owner), schedule_req(now + Duration::days(1)), now)
            .await
            .expect("schedule");
        fx.store
            .toggle_like(visible.id, fx.stranger.id)
            .await
            .expect("like");
        fx.store
            .create_comment(NewComment {
                post_id: visible.id,
                author_id: None,
                body: "guest says hi".to_string(),
            })
            .await
            .expect("comment");

        let stats = fx
            .service
            .owner_statistics(&fx.owner)
            .await
            .expect("stats");
        assert_eq!(stats.len(), 2);
        let visible_stats = stats
            .iter()
            .find(|s| s.post.id == visible.id)
            .expect("visible post listed");
        assert_eq!(visible_stats.likes, 1);
        assert_eq!(visible_stats.comments, 1);

        let none = fx
            .service
            .owner_statistics(&fx.stranger)
            .await
            .expect("stats");
        assert!(none.is_empty());
    }

    async fn seed_actor(store: &MemoryStore, email: &str, role: Role) -> Actor {
        let user = store
            .create_user(NewUser {
                name: "User".to_string(),
                email: email.to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .expect("user must be created");
        Actor::new(user.id, role)
    }

    fn create_req(title: &str, image: Option<&str>) -> CreatePostRequest {
        CreatePostRequest {
            title: title.to_string(),
            content: "content".to_string(),
            image: image.map(str::to_string),
        }
    }

    fn update_req(title: &str, image: Option<&str>) -> UpdatePostRequest {
        UpdatePostRequest {
            title: title.to_string(),
            content: "content".to_string(),
            image: image.map(str::to_string),
        }
    }

    fn schedule_req(at: chrono::DateTime<Utc>) -> SchedulePostRequest {
        SchedulePostRequest {
            title: "scheduled".to_string(),
            content: "content".to_string(),
            image: None,
            scheduled_at: at,
        }
    }
}
