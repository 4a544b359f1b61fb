use crate::data::like_repository::LikeRepository;
use crate::data::post_repository::PostRepository;
use crate::domain::error::DomainError;
use crate::domain::user::Actor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeStatus {
    pub liked: bool,
    pub likes: i64,
}

pub struct LikeService<L: LikeRepository, P: PostRepository> {
    likes: L,
    posts: P,
}

impl<L: LikeRepository, P: PostRepository> LikeService<L, P> {
    pub fn new(likes: L, posts: P) -> Self {
        Self { likes, posts }
    }

    /// Likes the post, or removes the like if the actor already liked it.
    pub async fn toggle(&self, actor: &Actor, post_id: i64) -> Result<LikeStatus, DomainError> {
        self.ensure_post_exists(post_id).await?;
        let outcome = self.likes.toggle_like(post_id, actor.id).await?;
        let likes = self.likes.count_likes(post_id).await?;
        Ok(LikeStatus {
            liked: outcome.is_liked(),
            likes,
        })
    }

    /// Explicit unlike; a no-op when there is nothing to remove.
    pub async fn unlike(&self, actor: &Actor, post_id: i64) -> Result<LikeStatus, DomainError> {
        self.ensure_post_exists(post_id).await?;
        self.likes.remove_like(post_id, actor.id).await?;
        let likes = self.likes.count_likes(post_id).await?;
        Ok(LikeStatus {
            liked: false,
            likes,
        })
    }

    pub async fn status(
        &self,
        actor: Option<&Actor>,
        post_id: i64,
    ) -> Result<LikeStatus, DomainError> {
        let likes = self.likes.count_likes(post_id).await?;
        let liked = match actor {
            Some(actor) => self.likes.is_liked_by(post_id, actor.id).await?,
            None => false,
        };
        Ok(LikeStatus { liked, likes })
    }

    async fn ensure_post_exists(&self, post_id: i64) -> Result<(), DomainError> {
        match self.posts.get_post(post_id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::NotFound(format!("post id: {post_id}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LikeService, LikeStatus};
    use crate::data::post_repository::{NewPost, PostRepository};
    use crate::data::repositories::memory::MemoryStore;
    use crate::data::user_repository::{NewUser, UserRepository};
    use crate::domain::error::DomainError;
    use crate::domain::user::{Actor, Role};

    async fn setup() -> (LikeService<MemoryStore, MemoryStore>, Actor, Actor, i64) {
        let store = MemoryStore::new();
        let mut actors = Vec::new();
        for email in ["a@example.com", "b@example.com"] {
            let user = store
                .create_user(NewUser {
                    name: "User".to_string(),
                    email: email.to_string(),
                    password_hash: "hash".to_string(),
                })
                .await
                .expect("user must be created");
            actors.push(Actor::new(user.id, Role::Member));
        }
        let post_id = store
            .create_post(NewPost {
                owner_id: actors[0].id,
                title: "Post".to_string(),
                content: "Body".to_string(),
                image: None,
                is_published: true,
                scheduled_at: None,
            })
            .await
            .expect("post must be created")
            .id;

        (
            LikeService::new(store.clone(), store),
            actors[0],
            actors[1],
            post_id,
        )
    }

    #[tokio::test]
    async fn second_like_removes_the_first() {
        let (service, alice, _, post_id) = setup().await;

        let liked = service.toggle(&alice, post_id).await.expect("toggle");
        assert_eq!(liked, LikeStatus { liked: true, likes: 1 });

        let unliked = service.toggle(&alice, post_id).await.expect("toggle");
        assert_eq!(unliked, LikeStatus { liked: false, likes: 0 });
    }

    #[tokio::test]
    async fn status_reflects_the_viewer() {
        let (service, alice, bob, post_id) = setup().await;
        service.toggle(&alice, post_id).await.expect("toggle");

        let for_alice = service.status(Some(&alice), post_id).await.expect("status");
        assert!(for_alice.liked);
        let for_bob = service.status(Some(&bob), post_id).await.expect("status");
        assert!(!for_bob.liked);
        let for_guest = service.status(None, post_id).await.expect("status");
        assert_eq!(for_guest, LikeStatus { liked: false, likes: 1 });
    }

    #[tokio::test]
    async fn unlike_is_idempotent() {
        let (service, alice, bob, post_id) = setup().await;
        service.toggle(&alice, post_id).await.expect("toggle");
        service.toggle(&bob, post_id).await.expect("toggle");

        let first = service.unlike(&alice, post_id).await.expect("unlike");
        assert_eq!(first, LikeStatus { liked: false, likes: 1 });
        let again = service.unlike(&alice, post_id).await.expect("unlike");
        assert_eq!(again, LikeStatus { liked: false, likes: 1 });
    }

    #[tokio::test]
    async fn liking_missing_post_is_not_found() {
        let (service, alice, _, _) = setup().await;
        let err = service.toggle(&alice, 777).await.expect_err("missing post");
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
