use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

use super::comment::CommentResponse;
use super::shared::validate_text;
use super::tag::{TagResponse, validate_tag_name};

pub const TITLE_MAX: usize = 50;

/// A tag embedded in a blog payload, resolved by name.
#[derive(Deserialize, Clone, Debug, PartialEq, utoipa::ToSchema)]
pub struct TagDescriptor {
    #[schema(example = "Latest")]
    pub name: String,
}

/// Request body for creating (POST) or replacing (PUT) a blog.
///
/// The author is always the caller; an `author` field in the body is ignored.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateBlogRequest {
    #[schema(example = "Sample blog title")]
    pub title: String,
    #[schema(example = "Sample blog excerpt.")]
    pub excerpt: String,
    #[schema(example = "This content is a sample blog content.")]
    pub content: String,
    /// Tags to attach. Existing tags are reused by name.
    #[serde(default)]
    pub tags: Vec<TagDescriptor>,
}

/// Request body for a partial blog update (PATCH). Absent fields are kept.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateBlogRequest {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    /// Tags to add. Tags already on the blog stay attached.
    pub tags: Option<Vec<TagDescriptor>>,
}

#[derive(Serialize, Debug, utoipa::ToSchema)]
pub struct BlogResponse {
    pub id: i32,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    /// ID of the authoring user.
    pub author: i32,
    pub tags: Vec<TagResponse>,
    pub comments: Vec<CommentResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogResponse {
    pub fn new(
        m: crate::entity::blog::Model,
        tags: Vec<TagResponse>,
        comments: Vec<CommentResponse>,
    ) -> Self {
        Self {
            id: m.id,
            title: m.title,
            excerpt: m.excerpt,
            content: m.content,
            author: m.author_id,
            tags,
            comments,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Validate every descriptor up front so that no tag is created for a
/// payload that is rejected later.
pub fn validate_tags(tags: &[TagDescriptor]) -> Result<(), AppError> {
    tags.iter().try_for_each(|t| validate_tag_name(&t.name))
}

fn validate_title(title: &str) -> Result<(), AppError> {
    validate_text(title, "Title", Some(TITLE_MAX))
}

pub fn validate_create_blog(req: &CreateBlogRequest) -> Result<(), AppError> {
    validate_title(&req.title)?;
    validate_text(&req.excerpt, "Excerpt", None)?;
    validate_text(&req.content, "Content", None)?;
    validate_tags(&req.tags)
}

pub fn validate_update_blog(req: &UpdateBlogRequest) -> Result<(), AppError> {
    if let Some(ref title) = req.title {
        validate_title(title)?;
    }
    if let Some(ref excerpt) = req.excerpt {
        validate_text(excerpt, "Excerpt", None)?;
    }
    if let Some(ref content) = req.content {
        validate_text(content, "Content", None)?;
    }
    if let Some(ref tags) = req.tags {
        validate_tags(tags)?;
    }
    Ok(())
}
