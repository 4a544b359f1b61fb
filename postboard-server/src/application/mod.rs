pub mod auth_service;
pub mod blog_service;
pub mod comment_service;
pub mod like_service;
pub mod publish_service;
