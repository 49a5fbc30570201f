mod common;

use axum::http::{Method, StatusCode};
use common::{TestApp, spawn_app};
use serde_json::{Value, json};

async fn seeded() -> (TestApp, i64, String) {
    let app = spawn_app().await;
    let staff = app.staff("editor").await;
    let anime = app.create_anime(&staff, "Planetes").await;
    let user = app.register("hachimaki").await;
    (app, anime, user)
}

async fn comment(app: &TestApp, token: &str, body: Value) -> Value {
    let response = app.post("/api/v1/comment/", Some(token), body).await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body
}

#[tokio::test]
async fn create_validates_target_and_content() {
    let (app, anime, user) = seeded().await;

    let anonymous = app
        .post("/api/v1/comment/", None, json!({"content": "hi", "object_id": anime}))
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let empty = app
        .post(
            "/api/v1/comment/",
            Some(&user),
            json!({"content": "  ", "object_id": anime}),
        )
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.body["errors"][0]["location"], "content");

    let missing = app
        .post(
            "/api/v1/comment/",
            Some(&user),
            json!({"content": "hi", "object_id": 4242}),
        )
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["errors"][0]["location"], "object_id");

    let created = comment(&app, &user, json!({"content": "Great show", "object_id": anime})).await;
    let urlhash = created["urlhash"].as_str().unwrap();
    assert_eq!(urlhash.len(), 8);
    assert!(urlhash.chars().all(|c| c.is_ascii_lowercase()));
    assert_eq!(created["username"], "hachimaki");
    assert_eq!(created["is_edited"], false);
    assert_eq!(created["has_reply"], false);
}

#[tokio::test]
async fn replies_edits_and_listing() {
    let (app, anime, user) = seeded().await;
    let parent = comment(&app, &user, json!({"content": "First", "object_id": anime})).await;
    let parent_hash = parent["urlhash"].as_str().unwrap().to_string();

    comment(
        &app,
        &user,
        json!({"content": "Reply", "object_id": anime, "parent_id": parent["id"]}),
    )
    .await;

    let replies = app
        .get(&format!("/api/v1/comment/{parent_hash}/replies/"), None)
        .await;
    assert_eq!(replies.status, StatusCode::OK);
    assert_eq!(replies.body["count"], 1);
    assert_eq!(replies.body["results"][0]["content"], "Reply");

    let listing = app
        .get(&format!("/api/v1/anime/{anime}/planetes/comments/"), None)
        .await;
    assert_eq!(listing.body["count"], 1);
    assert_eq!(listing.body["results"][0]["has_reply"], true);

    let edited = app
        .call(
            Method::PATCH,
            &format!("/api/v1/comment/{parent_hash}/"),
            Some(&user),
            Some(json!({"content": "First (edited)"})),
        )
        .await;
    assert_eq!(edited.status, StatusCode::OK);
    assert_eq!(edited.body["content"], "First (edited)");
    assert_eq!(edited.body["content_main"], "First");
    assert_eq!(edited.body["is_edited"], true);
}

#[tokio::test]
async fn only_owner_edits_and_staff_may_delete() {
    let (app, anime, user) = seeded().await;
    let other = app.register("fee").await;
    let created = comment(&app, &user, json!({"content": "Mine", "object_id": anime})).await;
    let uri = format!("/api/v1/comment/{}/", created["urlhash"].as_str().unwrap());

    let foreign_edit = app
        .call(Method::PATCH, &uri, Some(&other), Some(json!({"content": "x"})))
        .await;
    assert_eq!(foreign_edit.status, StatusCode::FORBIDDEN);

    let foreign_delete = app.call(Method::DELETE, &uri, Some(&other), None).await;
    assert_eq!(foreign_delete.status, StatusCode::FORBIDDEN);

    let staff = app.staff("moderator").await;
    let deleted = app.call(Method::DELETE, &uri, Some(&staff), None).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body, json!({}));

    let gone = app.call(Method::DELETE, &uri, Some(&staff), None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reactions_and_pinning() {
    let (app, anime, user) = seeded().await;
    let older = comment(&app, &user, json!({"content": "Older", "object_id": anime})).await;
    comment(&app, &user, json!({"content": "Newer", "object_id": anime})).await;

    let reaction = app
        .post(
            &format!("/api/v1/comment/{}/reaction/", older["id"]),
            Some(&user),
            json!({"reaction": "LIKE"}),
        )
        .await;
    assert_eq!(reaction.status, StatusCode::OK);
    assert_eq!(reaction.body["action"], "NEW");

    let staff = app.staff("moderator").await;
    let pinned = app
        .post(
            &format!("/api/v1/staff/comments/{}/pin/", older["urlhash"].as_str().unwrap()),
            Some(&staff),
            json!({"is_pinned": true}),
        )
        .await;
    assert_eq!(pinned.status, StatusCode::OK);
    assert_eq!(pinned.body["is_pinned"], true);

    let listing = app
        .get(&format!("/api/v1/anime/{anime}/planetes/comments/"), None)
        .await;
    let first = &listing.body["results"][0];
    assert_eq!(first["content"], "Older");
    assert_eq!(first["count_like"], 1);
}

#[tokio::test]
async fn reaction_choice_is_validated() {
    let (app, anime, user) = seeded().await;
    let created = comment(&app, &user, json!({"content": "Hmm", "object_id": anime})).await;

    let response = app
        .post(
            &format!("/api/v1/comment/{}/reaction/", created["id"]),
            Some(&user),
            json!({"reaction": "MEH"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["errors"][0]["location"], "reaction");
}
