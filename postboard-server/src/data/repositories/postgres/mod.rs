pub mod comment_repository;
pub mod like_repository;
pub mod post_repository;
pub mod user_repository;

pub(crate) const FOREIGN_KEY_VIOLATION: &str = "23503";
pub(crate) const UNIQUE_VIOLATION: &str = "23505";
