use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{blog, comment};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Actor;
use crate::extractors::json::AppJson;
use crate::models::comment::*;
use crate::policy::{self, Action};
use crate::query;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Comments",
    operation_id = "listComments",
    summary = "List comments",
    description = "Returns comments newest first, optionally restricted to one blog. Requires authentication.",
    params(CommentListQuery),
    responses(
        (status = 200, description = "List of comments", body = Vec<CommentResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, actor, method, params))]
pub async fn list_comments(
    actor: Actor,
    method: Method,
    State(state): State<AppState>,
    params: Result<Query<CommentListQuery>, QueryRejection>,
) -> Result<Json<Vec<CommentResponse>>, AppError> {
    policy::COMMENT.check_request(&actor, &method, Action::List)?;
    let Query(params) = params.map_err(|e| AppError::Validation(e.body_text()))?;

    let mut select = query::collection::<comment::Entity>(comment::Column::Id, Order::Desc, false);
    if let Some(blog_id) = params.blog {
        select = select.filter(comment::Column::BlogId.eq(blog_id));
    }

    let comments = select.all(&state.db).await?;
    Ok(Json(comments.into_iter().map(CommentResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Comments",
    operation_id = "createComment",
    summary = "Comment on a blog",
    description = "Creates a comment authored by the caller. `likes_count` accepts an integer or a numeric string and defaults to 0.",
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Validation error or unknown blog (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, actor, method, payload))]
pub async fn create_comment(
    actor: Actor,
    method: Method,
    State(state): State<AppState>,
    payload: Result<AppJson<CreateCommentRequest>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    policy::COMMENT.check_request(&actor, &method, Action::Create)?;
    let author = actor.require_user()?;
    let AppJson(payload) = payload?;
    validate_create_comment(&payload)?;

    let blog_exists = blog::Entity::find_by_id(payload.blog)
        .count(&state.db)
        .await?
        > 0;
    if !blog_exists {
        return Err(AppError::Validation(format!(
            "Blog {} does not exist",
            payload.blog
        )));
    }

    let now = chrono::Utc::now();
    let new_comment = comment::ActiveModel {
        comment_text: Set(payload.comment_text),
        likes_count: Set(payload.likes_count.unwrap_or(0)),
        author_id: Set(author.user_id),
        blog_id: Set(payload.blog),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_comment
        .insert(&state.db)
        .await
        .map_err(|e| match e.sql_err() {
            // Blog deleted between the existence check and the insert.
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                AppError::Validation(format!("Blog {} does not exist", payload.blog))
            }
            _ => AppError::from(e),
        })?;

    Ok((StatusCode::CREATED, Json(CommentResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Comments",
    operation_id = "getComment",
    summary = "Get a comment by ID",
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment details", body = CommentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, actor, method), fields(id))]
pub async fn get_comment(
    actor: Actor,
    method: Method,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CommentResponse>, AppError> {
    policy::COMMENT.check_request(&actor, &method, Action::Retrieve)?;

    let model = find_comment(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Comments",
    operation_id = "replaceComment",
    summary = "Replace a comment",
    description = "Replaces `comment_text` and `likes_count`. The author and blog are kept from the stored comment; any `author` or `blog` in the body is ignored.",
    params(("id" = i32, Path, description = "Comment ID")),
    request_body = ReplaceCommentRequest,
    responses(
        (status = 200, description = "Comment replaced", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, actor, method, payload), fields(id))]
pub async fn replace_comment(
    actor: Actor,
    method: Method,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Result<AppJson<ReplaceCommentRequest>, AppError>,
) -> Result<Json<CommentResponse>, AppError> {
    policy::COMMENT.check_request(&actor, &method, Action::Update)?;

    let existing = find_comment(&state.db, id).await?;
    let AppJson(payload) = payload?;
    validate_replace_comment(&payload)?;

    let mut active: comment::ActiveModel = existing.into();
    active.comment_text = Set(payload.comment_text);
    active.likes_count = Set(payload.likes_count);
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Comments",
    operation_id = "updateComment",
    summary = "Partially update a comment",
    description = "Only `comment_text` and `likes_count` can change; `author` and `blog` in the body are ignored. An empty payload returns the comment unchanged.",
    params(("id" = i32, Path, description = "Comment ID")),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, actor, method, payload), fields(id))]
pub async fn update_comment(
    actor: Actor,
    method: Method,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Result<AppJson<UpdateCommentRequest>, AppError>,
) -> Result<Json<CommentResponse>, AppError> {
    policy::COMMENT.check_request(&actor, &method, Action::PartialUpdate)?;

    let existing = find_comment(&state.db, id).await?;
    let AppJson(payload) = payload?;
    validate_update_comment(&payload)?;

    if payload == UpdateCommentRequest::default() {
        return Ok(Json(existing.into()));
    }

    let mut active: comment::ActiveModel = existing.into();
    if let Some(text) = payload.comment_text {
        active.comment_text = Set(text);
    }
    if let Some(likes) = payload.likes_count {
        active.likes_count = Set(likes);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Comments",
    operation_id = "deleteComment",
    summary = "Delete a comment",
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, actor, method), fields(id))]
pub async fn delete_comment(
    actor: Actor,
    method: Method,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    policy::COMMENT.check_request(&actor, &method, Action::Destroy)?;

    let result = comment::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Comment not found".into()));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn find_comment<C: ConnectionTrait>(db: &C, id: i32) -> Result<comment::Model, AppError> {
    comment::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))
}
