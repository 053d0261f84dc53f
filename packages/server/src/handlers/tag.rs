use axum::Json;
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{blog_tag, tag};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Actor;
use crate::extractors::json::AppJson;
use crate::models::tag::*;
use crate::policy::{self, Action};
use crate::query;
use crate::state::AppState;
use crate::tag_sync;

#[utoipa::path(
    get,
    path = "/",
    tag = "Tags",
    operation_id = "listTags",
    summary = "List tags",
    description = "Returns all tags ordered by name, descending. Requires authentication.",
    responses(
        (status = 200, description = "List of tags", body = Vec<TagResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, actor, method))]
pub async fn list_tags(
    actor: Actor,
    method: Method,
    State(state): State<AppState>,
) -> Result<Json<Vec<TagResponse>>, AppError> {
    policy::TAG.check_request(&actor, &method, Action::List)?;

    let tags = query::collection::<tag::Entity>(tag::Column::Name, Order::Desc, true)
        .all(&state.db)
        .await?;

    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Tags",
    operation_id = "createTag",
    summary = "Create a tag",
    description = "Looks up a tag by name and creates it if absent. Returns 201 when a new tag was created and 200 when an existing one was returned.",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Tag created", body = TagResponse),
        (status = 200, description = "Tag already existed", body = TagResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, actor, method, payload))]
pub async fn create_tag(
    actor: Actor,
    method: Method,
    State(state): State<AppState>,
    payload: Result<AppJson<CreateTagRequest>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    policy::TAG.check_request(&actor, &method, Action::Create)?;
    let AppJson(payload) = payload?;
    validate_tag_name(&payload.name)?;

    let (model, created) = tag_sync::get_or_create_tag(&state.db, payload.name.trim()).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(TagResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Tags",
    operation_id = "getTag",
    summary = "Get a tag by ID",
    params(("id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Tag details", body = TagResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, actor, method), fields(id))]
pub async fn get_tag(
    actor: Actor,
    method: Method,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TagResponse>, AppError> {
    policy::TAG.check_request(&actor, &method, Action::Retrieve)?;

    let model = find_tag(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Tags",
    operation_id = "replaceTag",
    summary = "Rename a tag",
    params(("id" = i32, Path, description = "Tag ID")),
    request_body = CreateTagRequest,
    responses(
        (status = 200, description = "Tag renamed", body = TagResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Another tag has this name (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, actor, method, payload), fields(id))]
pub async fn replace_tag(
    actor: Actor,
    method: Method,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Result<AppJson<CreateTagRequest>, AppError>,
) -> Result<Json<TagResponse>, AppError> {
    policy::TAG.check_request(&actor, &method, Action::Update)?;

    let existing = find_tag(&state.db, id).await?;
    let AppJson(payload) = payload?;
    validate_tag_name(&payload.name)?;

    let model = rename(&state.db, existing, &payload.name).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Tags",
    operation_id = "updateTag",
    summary = "Partially update a tag",
    params(("id" = i32, Path, description = "Tag ID")),
    request_body = UpdateTagRequest,
    responses(
        (status = 200, description = "Tag updated", body = TagResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Another tag has this name (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, actor, method, payload), fields(id))]
pub async fn update_tag(
    actor: Actor,
    method: Method,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Result<AppJson<UpdateTagRequest>, AppError>,
) -> Result<Json<TagResponse>, AppError> {
    policy::TAG.check_request(&actor, &method, Action::PartialUpdate)?;

    let existing = find_tag(&state.db, id).await?;
    let AppJson(payload) = payload?;
    validate_update_tag(&payload)?;

    match payload.name {
        Some(ref name) => Ok(Json(rename(&state.db, existing, name).await?.into())),
        None => Ok(Json(existing.into())),
    }
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Tags",
    operation_id = "deleteTag",
    summary = "Delete a tag",
    description = "Deletes a tag and detaches it from every blog.",
    params(("id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, actor, method), fields(id))]
pub async fn delete_tag(
    actor: Actor,
    method: Method,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    policy::TAG.check_request(&actor, &method, Action::Destroy)?;

    let txn = state.db.begin().await?;

    find_tag(&txn, id).await?;
    blog_tag::Entity::delete_many()
        .filter(blog_tag::Column::TagId.eq(id))
        .exec(&txn)
        .await?;
    tag::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn find_tag<C: ConnectionTrait>(db: &C, id: i32) -> Result<tag::Model, AppError> {
    tag::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".into()))
}

async fn rename<C: ConnectionTrait>(
    db: &C,
    existing: tag::Model,
    name: &str,
) -> Result<tag::Model, AppError> {
    let name = name.trim();
    if existing.name == name {
        return Ok(existing);
    }

    let mut active: tag::ActiveModel = existing.into();
    active.name = Set(name.to_string());

    active.update(db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Tag rename collided with an existing name");
            AppError::Conflict(format!("Tag '{name}' already exists"))
        }
        _ => AppError::from(e),
    })
}
