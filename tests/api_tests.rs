mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::{spawn_app, spawn_app_with, test_config};
use serde_json::json;

#[tokio::test]
async fn ping_and_request_id() {
    let app = spawn_app().await;

    let response = app
        .send(
            Request::builder()
                .uri("/ping/")
                .header("x-request-id", "trace-me")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "pong");
    assert_eq!(response.headers["x-request-id"], "trace-me");

    let response = app.get("/ping/", None).await;
    let minted = response.headers["x-request-id"].to_str().unwrap();
    assert_eq!(minted.len(), 32);
}

#[tokio::test]
async fn metrics_are_staff_only() {
    let app = spawn_app().await;
    let user = app.register("viewer").await;

    assert_eq!(app.get("/metrics", None).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        app.get("/metrics", Some(&user)).await.status,
        StatusCode::FORBIDDEN
    );

    let staff = app.staff("ops").await;
    assert_eq!(app.get("/metrics", Some(&staff)).await.status, StatusCode::OK);
}

#[tokio::test]
async fn empty_catalog() {
    let app = spawn_app().await;

    let random = app.get("/api/v1/anime/random/", None).await;
    assert_eq!(random.status, StatusCode::NOT_FOUND);

    let list = app.get("/api/v1/anime/list/", None).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(
        list.body,
        json!({
            "active_page": 1,
            "num_pages": 1,
            "count": 0,
            "next": null,
            "previous": null,
            "results": [],
        })
    );

    let past_end = app.get("/api/v1/anime/list/?page=2", None).await;
    assert_eq!(past_end.status, StatusCode::NOT_FOUND);
    assert_eq!(past_end.body["errors"][0]["message"], "Invalid page.");
}

#[tokio::test]
async fn staff_creates_anime_and_public_reads_it() {
    let app = spawn_app().await;
    let staff = app.staff("editor").await;
    let id = app.create_anime(&staff, "Cowboy Bebop").await;

    let detail = app
        .get(&format!("/api/v1/anime/{id}/cowboy-bebop/"), None)
        .await;
    assert_eq!(detail.status, StatusCode::OK, "{}", detail.body);
    assert_eq!(detail.body["slug"], "cowboy-bebop");
    assert_eq!(detail.body["status"], "COMES_OUT");
    assert_eq!(detail.body["season"], "SUMMER");
    assert_eq!(detail.body["count_episodes"], 0);
    assert_eq!(detail.body["reactions"], json!({"LIKE": 0, "DISLIKE": 0}));

    let episode = app
        .post(
            &format!("/api/v1/staff/anime/{id}/episodes/"),
            Some(&staff),
            json!({"title": "Asteroid Blues", "order": 1}),
        )
        .await;
    assert_eq!(episode.status, StatusCode::CREATED, "{}", episode.body);

    let duplicate = app
        .post(
            &format!("/api/v1/staff/anime/{id}/episodes/"),
            Some(&staff),
            json!({"title": "Again", "order": 1}),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate.body["errors"][0]["location"], "order");

    let episode = app
        .get(&format!("/api/v1/anime/{id}/cowboy-bebop/episode/1/"), None)
        .await;
    assert_eq!(episode.status, StatusCode::OK);
    assert_eq!(episode.body["title"], "Asteroid Blues");
    assert_eq!(episode.body["voiceover"], json!([]));

    let search = app.get("/api/v1/anime/search/?search=bebop", None).await;
    assert_eq!(search.body["count"], 1);
}

#[tokio::test]
async fn list_filters_are_validated() {
    let app = spawn_app().await;

    let response = app.get("/api/v1/anime/list/?status=SOON", None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body,
        json!({"errors": [{"message": "\"SOON\" is not a valid choice.", "location": "status"}]})
    );
}

#[tokio::test]
async fn pagination_links() {
    let app = spawn_app().await;
    let staff = app.staff("editor").await;
    for title in ["Alpha", "Beta", "Gamma"] {
        app.create_anime(&staff, title).await;
    }

    let page = app
        .get("/api/v1/anime/list/?type=ANIME&page_size=2", None)
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["num_pages"], 2);
    assert_eq!(page.body["results"].as_array().unwrap().len(), 2);
    assert_eq!(
        page.body["next"],
        "/api/v1/anime/list/?type=ANIME&page_size=2&page=2"
    );
    assert_eq!(page.body["previous"], json!(null));
}

#[tokio::test]
async fn top_section_is_bounded() {
    let mut config = test_config();
    config.catalog.count_top_anime = 1;
    let app = spawn_app_with(config).await;
    let staff = app.staff("editor").await;
    let first = app.create_anime(&staff, "First").await;
    let second = app.create_anime(&staff, "Second").await;

    let set = app
        .call(
            Method::POST,
            &format!("/api/v1/staff/anime/{first}/top/"),
            Some(&staff),
            None,
        )
        .await;
    assert_eq!(set.status, StatusCode::OK);
    assert_eq!(set.body["is_top"], true);

    let full = app
        .call(
            Method::POST,
            &format!("/api/v1/staff/anime/{second}/top/"),
            Some(&staff),
            None,
        )
        .await;
    assert_eq!(full.status, StatusCode::CONFLICT);
    assert_eq!(
        full.body["errors"][0]["message"],
        "The TOP-1 section already has enough anime; review the list and replace one"
    );

    let top = app.get("/api/v1/anime/top/", None).await;
    assert_eq!(top.body["count"], 1);

    let history = app
        .get(&format!("/api/v1/staff/anime/{first}/history/"), Some(&staff))
        .await;
    assert_eq!(history.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn anime_reaction_toggles() {
    let app = spawn_app().await;
    let staff = app.staff("editor").await;
    let id = app.create_anime(&staff, "Trigun").await;
    let user = app.register("vash").await;
    let uri = format!("/api/v1/anime/{id}/trigun/reaction/");

    let unauthenticated = app.post(&uri, None, json!({"reaction": "LIKE"})).await;
    assert_eq!(unauthenticated.status, StatusCode::UNAUTHORIZED);

    let steps = [("LIKE", "NEW"), ("DISLIKE", "CHANGE"), ("DISLIKE", "DELETE")];
    for (reaction, action) in steps {
        let response = app
            .post(&uri, Some(&user), json!({"reaction": reaction}))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["action"], action);
    }
}

#[tokio::test]
async fn user_anime_marks() {
    let app = spawn_app().await;
    let staff = app.staff("editor").await;
    let id = app.create_anime(&staff, "Mushishi").await;
    let user = app.register("ginko").await;

    let body = json!({"action": "VIEWED", "anime": id});
    let created = app.post("/api/v1/user/anime/", Some(&user), body.clone()).await;
    assert_eq!(created.status, StatusCode::CREATED);
    let again = app.post("/api/v1/user/anime/", Some(&user), body).await;
    assert_eq!(again.status, StatusCode::OK);

    let missing = app
        .post(
            "/api/v1/user/anime/",
            Some(&user),
            json!({"action": "VIEWED", "anime": 9999}),
        )
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        missing.body["errors"][0],
        json!({"message": "Anime not found.", "location": "anime"})
    );

    let me = app.get("/api/v1/user/me/", Some(&user)).await;
    assert_eq!(me.body["count_viewed_anime"], 1);

    let list = app.get("/api/v1/user/anime/?action=VIEWED", Some(&user)).await;
    assert_eq!(list.body["count"], 1);

    let removed = app
        .call(
            Method::DELETE,
            "/api/v1/user/anime/",
            Some(&user),
            Some(json!({"anime": id})),
        )
        .await;
    assert_eq!(removed.body, json!({"deleted": 1}));
}

#[tokio::test]
async fn malformed_json_uses_envelope() {
    let app = spawn_app().await;

    let response = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/auth/login/")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["errors"][0]["message"].is_string());
}

#[tokio::test]
async fn uploads_accept_bodies_over_two_mebibytes() {
    let app = spawn_app().await;
    let staff = app.staff("curator").await;
    let anime = app.create_anime(&staff, "Mushishi").await;
    let image = vec![0x89_u8; 3 * 1024 * 1024];

    let upload = |uri: String, token: String| {
        Request::builder()
            .method(Method::PUT)
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .header("content-type", "image/png")
            .body(Body::from(image.clone()))
            .unwrap()
    };

    let card = app
        .send(upload(
            format!("/api/v1/staff/anime/{anime}/images/card/?filename=cover.png"),
            staff.clone(),
        ))
        .await;
    assert_eq!(card.status, StatusCode::OK, "{}", card.body);

    let user = app.register("viewer").await;
    let avatar = app
        .send(upload("/api/v1/user/me/avatar/?filename=me.png".to_string(), user))
        .await;
    assert_eq!(avatar.status, StatusCode::OK, "{}", avatar.body);
}
