pub mod blog;
pub mod blog_tag;
pub mod comment;
pub mod tag;
pub mod user;
