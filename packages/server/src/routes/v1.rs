use utoipa_axum::{router::OpenApiRouter, routes};

use crate::handlers::{auth, blog, comment, tag};
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/blogs", blog_routes())
        .nest("/tags", tag_routes())
        .nest("/comments", comment_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::register))
        .routes(routes!(auth::login))
        .routes(routes!(auth::me, auth::update_me, auth::delete_me))
}

// PUT takes the full create shape, PATCH the all-optional update shape.
fn blog_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(blog::list_blogs, blog::create_blog))
        .routes(routes!(
            blog::get_blog,
            blog::replace_blog,
            blog::update_blog,
            blog::delete_blog
        ))
}

fn tag_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(tag::list_tags, tag::create_tag))
        .routes(routes!(
            tag::get_tag,
            tag::replace_tag,
            tag::update_tag,
            tag::delete_tag
        ))
}

fn comment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(comment::list_comments, comment::create_comment))
        .routes(routes!(
            comment::get_comment,
            comment::replace_comment,
            comment::update_comment,
            comment::delete_comment
        ))
}
