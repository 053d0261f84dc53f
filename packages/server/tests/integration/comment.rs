use sea_orm::EntityTrait;
use serde_json::json;

use blog_server::entity::comment;

use crate::common::{TestApp, routes};

async fn stored(app: &TestApp, id: i32) -> Option<comment::Model> {
    comment::Entity::find_by_id(id)
        .one(&app.db)
        .await
        .expect("DB query failed")
}

mod access {
    use super::*;

    #[tokio::test]
    async fn anonymous_caller_cannot_list_comments() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::COMMENTS).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn anonymous_caller_cannot_comment() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user@example.com").await;
        let blog_id = app.create_blog(&user.token, "Open").await;

        let res = app
            .post_without_token(
                routes::COMMENTS,
                &json!({"comment_text": "hi", "blog": blog_id}),
            )
            .await;

        assert_eq!(res.status, 401);
    }

    #[tokio::test]
    async fn any_authenticated_user_can_edit_a_comment() {
        let app = TestApp::spawn().await;
        let owner = app.create_user("owner@example.com").await;
        let other = app.create_user("other@example.com").await;
        let blog_id = app.create_blog(&owner.token, "Open").await;
        let id = app.create_comment(&owner.token, blog_id, "original").await;

        let res = app
            .patch_with_token(
                &routes::comment(id),
                &json!({"comment_text": "edited"}),
                &other.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["comment_text"], "edited");
        assert_eq!(res.body["author"], owner.id);
    }
}

mod check_order {
    use super::*;

    #[tokio::test]
    async fn anonymous_create_with_malformed_body_is_unauthenticated() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::COMMENTS, &json!({"likes_count": "lots"}))
            .await;

        assert_eq!(res.status, 401, "{}", res.text);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn anonymous_list_with_malformed_filter_is_unauthenticated() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token("/api/v1/comments?blog=abc").await;

        assert_eq!(res.status, 401);
    }

    #[tokio::test]
    async fn malformed_filter_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user@example.com").await;

        let res = app
            .get_with_token("/api/v1/comments?blog=abc", &user.token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod crud {
    use super::*;

    #[tokio::test]
    async fn comment_is_created_with_the_caller_as_author() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user@example.com").await;
        let blog_id = app.create_blog(&user.token, "Discussed").await;

        let res = app
            .post_with_token(
                routes::COMMENTS,
                &json!({"comment_text": "This is a test comment.", "blog": blog_id}),
                &user.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["author"], user.id);
        assert_eq!(res.body["blog"], blog_id);
        assert_eq!(res.body["likes_count"], 0);
    }

    #[tokio::test]
    async fn numeric_string_likes_count_is_coerced() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user@example.com").await;
        let blog_id = app.create_blog(&user.token, "Liked").await;
        let id = app.create_comment(&user.token, blog_id, "nice").await;

        let res = app
            .patch_with_token(
                &routes::comment(id),
                &json!({"likes_count": "30"}),
                &user.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["likes_count"], 30);
        assert_eq!(stored(&app, id).await.unwrap().likes_count, 30);
    }

    #[tokio::test]
    async fn patch_ignores_blog_and_author() {
        let app = TestApp::spawn().await;
        let owner = app.create_user("owner@example.com").await;
        let other = app.create_user("other@example.com").await;
        let first_blog = app.create_blog(&owner.token, "First").await;
        let second_blog = app.create_blog(&owner.token, "Second").await;
        let id = app.create_comment(&owner.token, first_blog, "pinned").await;

        let res = app
            .patch_with_token(
                &routes::comment(id),
                &json!({"blog": second_blog, "author": other.id, "likes_count": 5}),
                &owner.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let model = stored(&app, id).await.unwrap();
        assert_eq!(model.blog_id, first_blog);
        assert_eq!(model.author_id, owner.id);
        assert_eq!(model.likes_count, 5);
    }

    #[tokio::test]
    async fn put_replaces_text_and_likes_only() {
        let app = TestApp::spawn().await;
        let owner = app.create_user("owner@example.com").await;
        let first_blog = app.create_blog(&owner.token, "First").await;
        let second_blog = app.create_blog(&owner.token, "Second").await;
        let id = app.create_comment(&owner.token, first_blog, "before").await;

        let res = app
            .put_with_token(
                &routes::comment(id),
                &json!({"comment_text": "after", "likes_count": 7, "blog": second_blog}),
                &owner.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let model = stored(&app, id).await.unwrap();
        assert_eq!(model.comment_text, "after");
        assert_eq!(model.likes_count, 7);
        assert_eq!(model.blog_id, first_blog);
        assert_eq!(model.author_id, owner.id);
    }

    #[tokio::test]
    async fn empty_patch_returns_the_comment_unchanged() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user@example.com").await;
        let blog_id = app.create_blog(&user.token, "Quiet").await;
        let id = app.create_comment(&user.token, blog_id, "same").await;

        let res = app
            .patch_with_token(&routes::comment(id), &json!({}), &user.token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["comment_text"], "same");
        assert_eq!(res.body["likes_count"], 3);
    }

    #[tokio::test]
    async fn comment_can_be_deleted() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user@example.com").await;
        let blog_id = app.create_blog(&user.token, "Short-lived").await;
        let id = app.create_comment(&user.token, blog_id, "bye").await;

        let res = app.delete_with_token(&routes::comment(id), &user.token).await;
        assert_eq!(res.status, 204);
        assert!(stored(&app, id).await.is_none());

        let again = app.delete_with_token(&routes::comment(id), &user.token).await;
        assert_eq!(again.status, 404);
    }

    #[tokio::test]
    async fn list_can_be_filtered_by_blog() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user@example.com").await;
        let first_blog = app.create_blog(&user.token, "First").await;
        let second_blog = app.create_blog(&user.token, "Second").await;
        let older = app.create_comment(&user.token, first_blog, "a").await;
        app.create_comment(&user.token, second_blog, "b").await;
        let newer = app.create_comment(&user.token, first_blog, "c").await;

        let res = app
            .get_with_token(&routes::blog_comments(first_blog), &user.token)
            .await;

        assert_eq!(res.status, 200);
        let ids: Vec<i64> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![newer as i64, older as i64]);

        let all = app.get_with_token(routes::COMMENTS, &user.token).await;
        assert_eq!(all.body.as_array().unwrap().len(), 3);
    }
}

mod validation {
    use super::*;

    #[tokio::test]
    async fn unknown_blog_is_rejected() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user@example.com").await;

        let res = app
            .post_with_token(
                routes::COMMENTS,
                &json!({"comment_text": "orphan", "blog": 9999}),
                &user.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn blank_comment_text_is_rejected() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user@example.com").await;
        let blog_id = app.create_blog(&user.token, "Blog").await;

        let res = app
            .post_with_token(
                routes::COMMENTS,
                &json!({"comment_text": "  ", "blog": blog_id}),
                &user.token,
            )
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn non_numeric_likes_count_is_rejected() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user@example.com").await;
        let blog_id = app.create_blog(&user.token, "Blog").await;
        let id = app.create_comment(&user.token, blog_id, "fine").await;

        let res = app
            .patch_with_token(
                &routes::comment(id),
                &json!({"likes_count": "lots"}),
                &user.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(stored(&app, id).await.unwrap().likes_count, 3);
    }

    #[tokio::test]
    async fn missing_comment_returns_not_found() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user@example.com").await;

        let res = app
            .patch_with_token(&routes::comment(9999), &json!({"likes_count": 1}), &user.token)
            .await;

        assert_eq!(res.status, 404);
    }
}
