use tracing::debug;

use crate::data::comment_repository::{CommentRepository, NewComment};
use crate::data::post_repository::PostRepository;
use crate::domain::comment::{Comment, CreateCommentRequest};
use crate::domain::error::DomainError;
use crate::domain::policy::can_delete_comment;
use crate::domain::user::Actor;

pub struct CommentService<C: CommentRepository, P: PostRepository> {
    comments: C,
    posts: P,
}

impl<C: CommentRepository, P: PostRepository> CommentService<C, P> {
    pub fn new(comments: C, posts: P) -> Self {
        Self { comments, posts }
    }

    /// Guests (`actor == None`) may comment too; their comments carry no author.
    pub async fn add_comment(
        &self,
        actor: Option<&Actor>,
        post_id: i64,
        req: CreateCommentRequest,
    ) -> Result<Comment, DomainError> {
        let req = req.validate()?;
        self.ensure_post_exists(post_id).await?;

        let new_comment = NewComment {
            post_id,
            author_id: actor.map(|actor| actor.id),
            body: req.body,
        };
        self.comments.create_comment(new_comment).await
    }

    pub async fn delete_comment(
        &self,
        actor: Option<&Actor>,
        comment_id: i64,
    ) -> Result<(), DomainError> {
        let comment = self
            .comments
            .get_comment(comment_id)
            .await?
            .ok_or(DomainError::NotFound(format!("comment id: {comment_id}")))?;
        let parent = self.posts.get_post(comment.post_id).await?;

        can_delete_comment(actor, &comment, parent.as_ref()).into_result()?;

        let deleted = self.comments.delete_comment(comment_id).await?;
        if !deleted {
            return Err(DomainError::NotFound(format!("comment id: {comment_id}")));
        }
        debug!(comment_id, post_id = comment.post_id, "comment deleted");
        Ok(())
    }

    pub async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        self.ensure_post_exists(post_id).await?;
        self.comments.list_comments_for_post(post_id).await
    }

    async fn ensure_post_exists(&self, post_id: i64) -> Result<(), DomainError> {
        match self.posts.get_post(post_id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::NotFound(format!("post id: {post_id}"))),
        }
    }
}
