pub mod database;
pub mod image_store;
pub mod jwt;
pub mod logging;
pub mod publisher;
pub mod settings;
