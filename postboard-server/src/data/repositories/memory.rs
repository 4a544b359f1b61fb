//! Process-local store implementing every repository trait over one shared
//! state. Mirrors the PostgreSQL constraints: foreign keys, cascades, the
//! unique email and the unique (post, user) like.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::data::comment_repository::{CommentRepository, NewComment};
use crate::data::like_repository::LikeRepository;
use crate::data::post_repository::{NewPost, Pagination, PostPatch, PostRepository, PostStats};
use crate::data::user_repository::{NewUser, UserCredentials, UserRepository};
use crate::domain::comment::Comment;
use crate::domain::error::DomainError;
use crate::domain::like::{Like, LikeToggle};
use crate::domain::post::Post;
use crate::domain::user::{Role, User};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeMap<i64, UserCredentials>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    likes: BTreeMap<i64, Like>,
    last_user_id: i64,
    last_post_id: i64,
    last_comment_id: i64,
    last_like_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, DomainError> {
        self.state
            .lock()
            .map_err(|_| DomainError::Unexpected("memory store lock poisoned".to_string()))
    }
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

fn invalid_row(err: DomainError) -> DomainError {
    DomainError::Unexpected(err.to_string())
}

fn published_order_key(post: &Post) -> (DateTime<Utc>, i64) {
    (post.scheduled_at.unwrap_or(post.created_at), post.id)
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let mut state = self.state()?;
        if !state.users.contains_key(&input.owner_id) {
            return Err(DomainError::NotFound("owner".to_string()));
        }

        let now = Utc::now();
        let id = next_id(&mut state.last_post_id);
        let post = Post::new(
            id,
            input.owner_id,
            input.title,
            input.content,
            input.image,
            input.is_published,
            input.scheduled_at,
            now,
            now,
        )
        .map_err(invalid_row)?;

        state.posts.insert(id, post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        Ok(self.state()?.posts.get(&id).cloned())
    }

    async fn update_post(
        &self,
        post_id: i64,
        patch: PostPatch,
    ) -> Result<Option<Post>, DomainError> {
        let mut state = self.state()?;
        let Some(post) = state.posts.get_mut(&post_id) else {
            return Ok(None);
        };

        post.title = patch.title;
        post.content = patch.content;
        if let Some(image) = patch.image {
            post.image = Some(image);
        }
        post.updated_at = Utc::now().max(post.created_at);
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: i64) -> Result<bool, DomainError> {
        let mut state = self.state()?;
        if state.posts.remove(&id).is_none() {
            return Ok(false);
        }
        state.comments.retain(|_, comment| comment.post_id != id);
        state.likes.retain(|_, like| like.post_id != id);
        Ok(true)
    }

    async fn list_published_posts(
        &self,
        pagination: Pagination,
    ) -> Result<Vec<Post>, DomainError> {
        let state = self.state()?;
        let mut posts: Vec<Post> = state
            .posts
            .values()
            .filter(|post| post.is_published)
            .cloned()
            .collect();
        posts.sort_by_key(|post| std::cmp::Reverse(published_order_key(post)));

        Ok(posts
            .into_iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .collect())
    }

    async fn total_published_posts(&self) -> Result<i64, DomainError> {
        let state = self.state()?;
        Ok(state.posts.values().filter(|post| post.is_published).count() as i64)
    }

    async fn owner_statistics(&self, owner_id: i64) -> Result<Vec<PostStats>, DomainError> {
        let state = self.state()?;
        let mut stats: Vec<PostStats> = state
            .posts
            .values()
            .filter(|post| post.owner_id == owner_id)
            .map(|post| PostStats {
                post: post.clone(),
                likes: state.likes.values().filter(|l| l.post_id == post.id).count() as i64,
                comments: state
                    .comments
                    .values()
                    .filter(|c| c.post_id == post.id)
                    .count() as i64,
            })
            .collect();
        stats.sort_by_key(|s| std::cmp::Reverse((s.post.created_at, s.post.id)));
        Ok(stats)
    }

    async fn find_due_posts(
        &self,
        now: DateTime<Utc>,
        after_id: i64,
        limit: u32,
    ) -> Result<Vec<Post>, DomainError> {
        let state = self.state()?;
        // BTreeMap iteration is already ordered by id
        Ok(state
            .posts
            .range(after_id.saturating_add(1)..)
            .map(|(_, post)| post)
            .filter(|post| post.is_due(now))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn try_set_published(
        &self,
        post_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let mut state = self.state()?;
        match state.posts.get_mut(&post_id) {
            Some(post) if post.is_due(now) => {
                post.is_published = true;
                post.updated_at = Utc::now().max(post.created_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create_comment(&self, input: NewComment) -> Result<Comment, DomainError> {
        let mut state = self.state()?;
        if !state.posts.contains_key(&input.post_id) {
            return Err(DomainError::NotFound("post".to_string()));
        }
        if let Some(author_id) = input.author_id
            && !state.users.contains_key(&author_id)
        {
            return Err(DomainError::NotFound("author".to_string()));
        }

        let id = next_id(&mut state.last_comment_id);
        let comment = Comment::new(id, input.post_id, input.author_id, input.body, Utc::now())
            .map_err(invalid_row)?;
        state.comments.insert(id, comment.clone());
        Ok(comment)
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>, DomainError> {
        Ok(self.state()?.comments.get(&id).cloned())
    }

    async fn delete_comment(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.state()?.comments.remove(&id).is_some())
    }

    async fn list_comments_for_post(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        let state = self.state()?;
        let mut comments: Vec<Comment> = state
            .comments
            .values()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| std::cmp::Reverse((c.created_at, c.id)));
        Ok(comments)
    }
}

#[async_trait]
impl LikeRepository for MemoryStore {
    async fn toggle_like(&self, post_id: i64, user_id: i64) -> Result<LikeToggle, DomainError> {
        let mut state = self.state()?;
        if !state.posts.contains_key(&post_id) {
            return Err(DomainError::NotFound("post".to_string()));
        }
        if !state.users.contains_key(&user_id) {
            return Err(DomainError::NotFound("user".to_string()));
        }

        let existing = state
            .likes
            .iter()
            .find(|(_, like)| like.post_id == post_id && like.user_id == user_id)
            .map(|(id, _)| *id);

        if let Some(id) = existing {
            state.likes.remove(&id);
            return Ok(LikeToggle::Unliked);
        }

        let id = next_id(&mut state.last_like_id);
        state.likes.insert(
            id,
            Like {
                id,
                post_id,
                user_id,
                created_at: Utc::now(),
            },
        );
        Ok(LikeToggle::Liked)
    }

    async fn remove_like(&self, post_id: i64, user_id: i64) -> Result<bool, DomainError> {
        let mut state = self.state()?;
        let before = state.likes.len();
        state
            .likes
            .retain(|_, like| !(like.post_id == post_id && like.user_id == user_id));
        Ok(state.likes.len() < before)
    }

    async fn count_likes(&self, post_id: i64) -> Result<i64, DomainError> {
        let state = self.state()?;
        Ok(state.likes.values().filter(|l| l.post_id == post_id).count() as i64)
    }

    async fn is_liked_by(&self, post_id: i64, user_id: i64) -> Result<bool, DomainError> {
        let state = self.state()?;
        Ok(state
            .likes
            .values()
            .any(|like| like.post_id == post_id && like.user_id == user_id))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
        let mut state = self.state()?;
        if state.users.values().any(|c| c.user.email == input.email) {
            return Err(DomainError::AlreadyExists("email".to_string()));
        }

        let id = next_id(&mut state.last_user_id);
        let user = User::new(id, input.name, input.email, Role::Member, Utc::now())
            .map_err(invalid_row)?;
        state.users.insert(
            id,
            UserCredentials {
                user: user.clone(),
                password_hash: input.password_hash,
            },
        );
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, DomainError> {
        let state = self.state()?;
        Ok(state.users.values().find(|c| c.user.email == email).cloned())
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, DomainError> {
        Ok(self.state()?.users.get(&id).map(|c| c.user.clone()))
    }

    async fn set_role(&self, email: &str, role: Role) -> Result<Option<User>, DomainError> {
        let mut state = self.state()?;
        Ok(state
            .users
            .values_mut()
            .find(|c| c.user.email == email)
            .map(|c| {
                c.user.role = role;
                c.user.clone()
            }))
    }
}
