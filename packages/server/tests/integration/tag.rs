use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use blog_server::entity::blog_tag;

use crate::common::{TestApp, routes};

mod access {
    use super::*;

    #[tokio::test]
    async fn listing_tags_requires_authentication() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::TAGS).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn creating_tags_requires_authentication() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::TAGS, &json!({"name": "Latest"}))
            .await;

        assert_eq!(res.status, 401);
    }

    #[tokio::test]
    async fn anonymous_create_with_malformed_body_is_unauthenticated() {
        let app = TestApp::spawn().await;

        let res = app.post_without_token(routes::TAGS, &json!({})).await;

        assert_eq!(res.status, 401, "{}", res.text);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn malformed_rename_of_missing_tag_is_not_found() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user@example.com").await;

        let res = app
            .put_with_token(&routes::tag(9999), &json!({"name": 1}), &user.token)
            .await;

        assert_eq!(res.status, 404);
    }
}

mod crud {
    use super::*;

    #[tokio::test]
    async fn tags_are_listed_by_name_descending() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user@example.com").await;
        app.post_with_token(routes::TAGS, &json!({"name": "Latest"}), &user.token)
            .await;
        app.post_with_token(routes::TAGS, &json!({"name": "Technical"}), &user.token)
            .await;

        let res = app.get_with_token(routes::TAGS, &user.token).await;

        assert_eq!(res.status, 200);
        let names: Vec<&str> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Technical", "Latest"]);
    }

    #[tokio::test]
    async fn creating_an_existing_tag_returns_it() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user@example.com").await;

        let first = app
            .post_with_token(routes::TAGS, &json!({"name": "Latest"}), &user.token)
            .await;
        let second = app
            .post_with_token(routes::TAGS, &json!({"name": "Latest"}), &user.token)
            .await;

        assert_eq!(first.status, 201);
        assert_eq!(second.status, 200);
        assert_eq!(first.id(), second.id());
    }

    #[tokio::test]
    async fn tag_can_be_retrieved_and_renamed() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user@example.com").await;
        let id = app
            .post_with_token(routes::TAGS, &json!({"name": "Old"}), &user.token)
            .await
            .id();

        let patched = app
            .patch_with_token(&routes::tag(id), &json!({"name": "New"}), &user.token)
            .await;
        assert_eq!(patched.status, 200, "{}", patched.text);

        let fetched = app.get_with_token(&routes::tag(id), &user.token).await;
        assert_eq!(fetched.body["name"], "New");
    }

    #[tokio::test]
    async fn renaming_onto_an_existing_name_conflicts() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user@example.com").await;
        app.post_with_token(routes::TAGS, &json!({"name": "Taken"}), &user.token)
            .await;
        let id = app
            .post_with_token(routes::TAGS, &json!({"name": "Free"}), &user.token)
            .await
            .id();

        let res = app
            .put_with_token(&routes::tag(id), &json!({"name": "Taken"}), &user.token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn deleting_a_tag_detaches_it_from_blogs() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user@example.com").await;
        let created = app
            .post_with_token(
                routes::BLOGS,
                &json!({
                    "title": "Tagged",
                    "excerpt": "E",
                    "content": "C",
                    "tags": [{"name": "Ephemeral"}],
                }),
                &user.token,
            )
            .await;
        let blog_id = created.id();
        let tag_id = created.body["tags"][0]["id"].as_i64().unwrap() as i32;

        let res = app.delete_with_token(&routes::tag(tag_id), &user.token).await;
        assert_eq!(res.status, 204);

        let links = blog_tag::Entity::find()
            .filter(blog_tag::Column::TagId.eq(tag_id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(links, 0);

        let blog = app.get_with_token(&routes::blog(blog_id), &user.token).await;
        assert_eq!(blog.body["tags"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn blank_tag_name_is_rejected() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user@example.com").await;

        let res = app
            .post_with_token(routes::TAGS, &json!({"name": ""}), &user.token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn missing_tag_returns_not_found() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user@example.com").await;

        let res = app.delete_with_token(&routes::tag(9999), &user.token).await;

        assert_eq!(res.status, 404);
    }
}
