mod common;

mod comment;
mod tag;
