use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

use super::shared::{int_or_string, opt_int_or_string, validate_text};

/// Request body for creating a comment.
///
/// The author is always the caller; an `author` field in the body is ignored.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCommentRequest {
    #[schema(example = "Great post!")]
    pub comment_text: String,
    /// Integer or numeric string. Defaults to 0.
    #[serde(default, deserialize_with = "opt_int_or_string")]
    #[schema(value_type = Option<i32>, example = 3)]
    pub likes_count: Option<i32>,
    /// ID of the blog being commented on.
    #[schema(example = 1)]
    pub blog: i32,
}

/// Request body for a full comment replace (PUT).
///
/// `author` and `blog` are kept from the stored row.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ReplaceCommentRequest {
    pub comment_text: String,
    #[serde(deserialize_with = "int_or_string")]
    #[schema(value_type = i32)]
    pub likes_count: i32,
}

/// Request body for a partial comment update (PATCH).
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateCommentRequest {
    pub comment_text: Option<String>,
    #[serde(default, deserialize_with = "opt_int_or_string")]
    #[schema(value_type = Option<i32>, example = "30")]
    pub likes_count: Option<i32>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct CommentListQuery {
    /// Only return comments on this blog.
    pub blog: Option<i32>,
}

#[derive(Serialize, Clone, Debug, PartialEq, utoipa::ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub comment_text: String,
    pub likes_count: i32,
    /// ID of the commenting user.
    pub author: i32,
    /// ID of the blog commented on.
    pub blog: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::comment::Model> for CommentResponse {
    fn from(m: crate::entity::comment::Model) -> Self {
        Self {
            id: m.id,
            comment_text: m.comment_text,
            likes_count: m.likes_count,
            author: m.author_id,
            blog: m.blog_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

fn validate_comment_text(text: &str) -> Result<(), AppError> {
    validate_text(text, "Comment text", None)
}

fn validate_likes_count(likes: i32) -> Result<(), AppError> {
    if likes < 0 {
        return Err(AppError::Validation("Likes count must be >= 0".into()));
    }
    Ok(())
}

pub fn validate_create_comment(req: &CreateCommentRequest) -> Result<(), AppError> {
    validate_comment_text(&req.comment_text)?;
    if let Some(likes) = req.likes_count {
        validate_likes_count(likes)?;
    }
    Ok(())
}

pub fn validate_replace_comment(req: &ReplaceCommentRequest) -> Result<(), AppError> {
    validate_comment_text(&req.comment_text)?;
    validate_likes_count(req.likes_count)
}

pub fn validate_update_comment(req: &UpdateCommentRequest) -> Result<(), AppError> {
    if let Some(ref text) = req.comment_text {
        validate_comment_text(text)?;
    }
    if let Some(likes) = req.likes_count {
        validate_likes_count(likes)?;
    }
    Ok(())
}
