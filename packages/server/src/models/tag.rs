use serde::{Deserialize, Serialize};

use crate::error::AppError;

use super::shared::validate_text;

pub const TAG_NAME_MAX: usize = 255;

/// Request body for creating or renaming a tag (POST / PUT).
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateTagRequest {
    #[schema(example = "Latest")]
    pub name: String,
}

/// Request body for a partial tag update (PATCH).
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateTagRequest {
    #[schema(example = "Technical")]
    pub name: Option<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq, utoipa::ToSchema)]
pub struct TagResponse {
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "Latest")]
    pub name: String,
}

impl From<crate::entity::tag::Model> for TagResponse {
    fn from(m: crate::entity::tag::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
        }
    }
}

pub fn validate_tag_name(name: &str) -> Result<(), AppError> {
    validate_text(name, "Tag name", Some(TAG_NAME_MAX))
}

pub fn validate_update_tag(req: &UpdateTagRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_tag_name(name)?;
    }
    Ok(())
}
