pub mod comment;
pub mod error;
pub mod like;
pub mod policy;
pub mod post;
pub mod user;
