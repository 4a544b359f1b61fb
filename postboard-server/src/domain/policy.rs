//! Authorization decisions for posts and comments.
//!
//! Every function here is pure: it looks only at its arguments. A deny is an
//! ordinary return value; callers decide how to surface it.

use std::fmt;

use super::comment::Comment;
use super::error::DomainError;
use super::post::Post;
use super::user::Actor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NoActor,
    OrphanComment,
    NotAuthorized,
}

impl DenyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DenyReason::NoActor => "no actor",
            DenyReason::OrphanComment => "orphan comment",
            DenyReason::NotAuthorized => "not authorized",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn deny_reason(self) -> Option<DenyReason> {
        match self {
            Decision::Allow => None,
            Decision::Deny(reason) => Some(reason),
        }
    }

    /// Turns a deny into `DomainError::Forbidden` for callers that refuse to proceed.
    pub fn into_result(self) -> Result<(), DomainError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(DomainError::Forbidden(reason.to_string())),
        }
    }
}

pub fn can_view_any_post(_actor: Option<&Actor>) -> Decision {
    Decision::Allow
}

pub fn can_view_post(_actor: Option<&Actor>, _post: &Post) -> Decision {
    Decision::Allow
}

pub fn can_create_post(actor: Option<&Actor>) -> Decision {
    match actor {
        Some(_) => Decision::Allow,
        None => Decision::Deny(DenyReason::NoActor),
    }
}

pub fn can_update_post(actor: Option<&Actor>, post: &Post) -> Decision {
    owner_or_admin(actor, post)
}

pub fn can_delete_post(actor: Option<&Actor>, post: &Post) -> Decision {
    owner_or_admin(actor, post)
}

/// `parent` is the comment's post as resolved by the caller; `None` means the
/// lookup found nothing.
pub fn can_delete_comment(
    actor: Option<&Actor>,
    comment: &Comment,
    parent: Option<&Post>,
) -> Decision {
    let Some(actor) = actor else {
        return Decision::Deny(DenyReason::NoActor);
    };
    let Some(parent) = parent.filter(|post| post.id == comment.post_id) else {
        return Decision::Deny(DenyReason::OrphanComment);
    };

    if comment.author_id == Some(actor.id) || parent.owner_id == actor.id {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::NotAuthorized)
    }
}

fn owner_or_admin(actor: Option<&Actor>, post: &Post) -> Decision {
    match actor {
        None => Decision::Deny(DenyReason::NoActor),
        Some(actor) if actor.id == post.owner_id || actor.is_admin() => Decision::Allow,
        Some(_) => Decision::Deny(DenyReason::NotAuthorized),
    }
}
