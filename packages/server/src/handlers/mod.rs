pub mod auth;
pub mod blog;
pub mod comment;
pub mod tag;
