use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{blog, blog_tag, comment, tag};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Actor;
use crate::extractors::json::AppJson;
use crate::models::blog::*;
use crate::models::comment::CommentResponse;
use crate::models::tag::TagResponse;
use crate::policy::{self, Action};
use crate::query;
use crate::state::AppState;
use crate::tag_sync;

#[utoipa::path(
    get,
    path = "/",
    tag = "Blogs",
    operation_id = "listBlogs",
    summary = "List blogs",
    description = "Returns all blogs, newest first, with nested tags and comments. The only endpoint open to anonymous callers; a supplied token must still be valid.",
    responses(
        (status = 200, description = "List of blogs", body = Vec<BlogResponse>),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, actor, method))]
pub async fn list_blogs(
    actor: Actor,
    method: Method,
    State(state): State<AppState>,
) -> Result<Json<Vec<BlogResponse>>, AppError> {
    policy::BLOG.check_request(&actor, &method, Action::List)?;

    let blogs = query::collection::<blog::Entity>(blog::Column::Id, Order::Desc, true)
        .all(&state.db)
        .await?;

    Ok(Json(hydrate(&state.db, blogs).await?))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Blogs",
    operation_id = "createBlog",
    summary = "Create a blog",
    description = "Creates a blog authored by the caller. Embedded tags are looked up by name and created when missing; the whole tag list is validated before anything is written.",
    request_body = CreateBlogRequest,
    responses(
        (status = 201, description = "Blog created", body = BlogResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, actor, method, payload))]
pub async fn create_blog(
    actor: Actor,
    method: Method,
    State(state): State<AppState>,
    payload: Result<AppJson<CreateBlogRequest>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    policy::BLOG.check_request(&actor, &method, Action::Create)?;
    let author = actor.require_user()?;
    let AppJson(payload) = payload?;
    validate_create_blog(&payload)?;

    let txn = state.db.begin().await?;

    let now = chrono::Utc::now();
    let new_blog = blog::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        excerpt: Set(payload.excerpt),
        content: Set(payload.content),
        author_id: Set(author.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let model = new_blog.insert(&txn).await?;
    tag_sync::attach_tags(&txn, model.id, &payload.tags).await?;

    txn.commit().await?;

    let response = hydrate_one(&state.db, model).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Blogs",
    operation_id = "getBlog",
    summary = "Get a blog by ID",
    description = "Returns a single blog with nested tags and comments. Requires authentication.",
    params(("id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Blog details", body = BlogResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, actor, method), fields(id))]
pub async fn get_blog(
    actor: Actor,
    method: Method,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<BlogResponse>, AppError> {
    policy::BLOG.check_request(&actor, &method, Action::Retrieve)?;

    let model = find_blog(&state.db, id).await?;
    policy::BLOG.check_object(&actor, &method, model.author_id)?;

    Ok(Json(hydrate_one(&state.db, model).await?))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Blogs",
    operation_id = "replaceBlog",
    summary = "Replace a blog",
    description = "Replaces title, excerpt and content. Only the author may do this. Listed tags are added; existing tags are kept. An `author` field in the body is ignored.",
    params(("id" = i32, Path, description = "Blog ID")),
    request_body = CreateBlogRequest,
    responses(
        (status = 200, description = "Blog replaced", body = BlogResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, actor, method, payload), fields(id))]
pub async fn replace_blog(
    actor: Actor,
    method: Method,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Result<AppJson<CreateBlogRequest>, AppError>,
) -> Result<Json<BlogResponse>, AppError> {
    policy::BLOG.check_request(&actor, &method, Action::Update)?;

    let txn = state.db.begin().await?;

    let existing = find_blog_for_update(&txn, id).await?;
    policy::BLOG.check_object(&actor, &method, existing.author_id)?;
    let AppJson(payload) = payload?;
    validate_create_blog(&payload)?;

    let mut active: blog::ActiveModel = existing.into();
    active.title = Set(payload.title.trim().to_string());
    active.excerpt = Set(payload.excerpt);
    active.content = Set(payload.content);
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    tag_sync::attach_tags(&txn, model.id, &payload.tags).await?;

    txn.commit().await?;

    Ok(Json(hydrate_one(&state.db, model).await?))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Blogs",
    operation_id = "updateBlog",
    summary = "Partially update a blog",
    description = "Updates only the provided fields. Only the author may do this. Listed tags are added; existing tags are kept. An `author` field in the body is ignored. An empty payload returns the blog unchanged.",
    params(("id" = i32, Path, description = "Blog ID")),
    request_body = UpdateBlogRequest,
    responses(
        (status = 200, description = "Blog updated", body = BlogResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, actor, method, payload), fields(id))]
pub async fn update_blog(
    actor: Actor,
    method: Method,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Result<AppJson<UpdateBlogRequest>, AppError>,
) -> Result<Json<BlogResponse>, AppError> {
    policy::BLOG.check_request(&actor, &method, Action::PartialUpdate)?;

    let txn = state.db.begin().await?;

    let existing = find_blog_for_update(&txn, id).await?;
    policy::BLOG.check_object(&actor, &method, existing.author_id)?;
    let AppJson(payload) = payload?;

    if payload == UpdateBlogRequest::default() {
        txn.commit().await?;
        return Ok(Json(hydrate_one(&state.db, existing).await?));
    }
    validate_update_blog(&payload)?;

    let mut active: blog::ActiveModel = existing.into();
    if let Some(ref title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(excerpt) = payload.excerpt {
        active.excerpt = Set(excerpt);
    }
    if let Some(content) = payload.content {
        active.content = Set(content);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    if let Some(ref tags) = payload.tags {
        tag_sync::attach_tags(&txn, model.id, tags).await?;
    }

    txn.commit().await?;

    Ok(Json(hydrate_one(&state.db, model).await?))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Blogs",
    operation_id = "deleteBlog",
    summary = "Delete a blog",
    description = "Deletes a blog together with its comments and tag associations. Only the author may do this. Tags themselves are kept.",
    params(("id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 204, description = "Blog deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, actor, method), fields(id))]
pub async fn delete_blog(
    actor: Actor,
    method: Method,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    policy::BLOG.check_request(&actor, &method, Action::Destroy)?;

    let txn = state.db.begin().await?;

    let existing = find_blog_for_update(&txn, id).await?;
    policy::BLOG.check_object(&actor, &method, existing.author_id)?;

    comment::Entity::delete_many()
        .filter(comment::Column::BlogId.eq(id))
        .exec(&txn)
        .await?;
    blog_tag::Entity::delete_many()
        .filter(blog_tag::Column::BlogId.eq(id))
        .exec(&txn)
        .await?;
    blog::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn find_blog<C: ConnectionTrait>(db: &C, id: i32) -> Result<blog::Model, AppError> {
    blog::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog not found".into()))
}

async fn find_blog_for_update(txn: &DatabaseTransaction, id: i32) -> Result<blog::Model, AppError> {
    use sea_orm::sea_query::LockType;
    blog::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog not found".into()))
}

async fn hydrate_one<C: ConnectionTrait>(db: &C, model: blog::Model) -> Result<BlogResponse, AppError> {
    hydrate(db, vec![model])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("hydrate returned no blog".into()))
}

/// Attach nested tags and comments to each blog, keeping the input order.
///
/// Issues three queries regardless of how many blogs are passed in.
async fn hydrate<C: ConnectionTrait>(
    db: &C,
    blogs: Vec<blog::Model>,
) -> Result<Vec<BlogResponse>, AppError> {
    if blogs.is_empty() {
        return Ok(Vec::new());
    }
    let blog_ids: Vec<i32> = blogs.iter().map(|b| b.id).collect();

    let links = blog_tag::Entity::find()
        .filter(blog_tag::Column::BlogId.is_in(blog_ids.clone()))
        .order_by_asc(blog_tag::Column::TagId)
        .all(db)
        .await?;

    let mut tag_ids: Vec<i32> = links.iter().map(|l| l.tag_id).collect();
    tag_ids.sort_unstable();
    tag_ids.dedup();

    let tags: HashMap<i32, TagResponse> = tag::Entity::find()
        .filter(tag::Column::Id.is_in(tag_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.id, TagResponse::from(t)))
        .collect();

    let mut tags_by_blog: HashMap<i32, Vec<TagResponse>> = HashMap::new();
    for link in links {
        if let Some(tag) = tags.get(&link.tag_id) {
            tags_by_blog.entry(link.blog_id).or_default().push(tag.clone());
        }
    }

    let mut comments_by_blog: HashMap<i32, Vec<CommentResponse>> = HashMap::new();
    let comments = comment::Entity::find()
        .filter(comment::Column::BlogId.is_in(blog_ids))
        .order_by_asc(comment::Column::Id)
        .all(db)
        .await?;
    for c in comments {
        comments_by_blog
            .entry(c.blog_id)
            .or_default()
            .push(CommentResponse::from(c));
    }

    Ok(blogs
        .into_iter()
        .map(|b| {
            let tags = tags_by_blog.remove(&b.id).unwrap_or_default();
            let comments = comments_by_blog.remove(&b.id).unwrap_or_default();
            BlogResponse::new(b, tags, comments)
        })
        .collect())
}
