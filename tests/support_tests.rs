mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::{TestApp, spawn_app};
use serde_json::{Value, json};

fn help_request(ip: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/support/help/")
        .header("content-type", "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn help_body() -> Value {
    json!({
        "title": "Player stutters",
        "email": "fan@example.com",
        "message": "Episode 3 does not load",
    })
}

async fn open_help_appeal(app: &TestApp) -> i64 {
    let created = app.send(help_request("10.0.0.1", &help_body())).await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);

    let staff = app.staff("lookup").await;
    let list = app.get("/api/v1/staff/appeals/help/", Some(&staff)).await;
    list.body["results"][0]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn help_appeal_is_created_once_per_window() {
    let app = spawn_app().await;

    let first = app.send(help_request("10.0.0.1", &help_body())).await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.body, json!({}));

    let second = app.send(help_request("10.0.0.1", &help_body())).await;
    assert_eq!(second.status, StatusCode::FORBIDDEN);
    assert_eq!(
        second.body,
        json!({"errors": [{"message": "Try again in 30 seconds"}]})
    );

    let other_client = app.send(help_request("10.0.0.2", &help_body())).await;
    assert_eq!(other_client.status, StatusCode::CREATED);
}

#[tokio::test]
async fn help_appeal_validation() {
    let app = spawn_app().await;

    let response = app
        .send(help_request(
            "10.0.0.9",
            &json!({"title": "Hi", "email": "nope"}),
        ))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body,
        json!({"errors": [
            {"message": "Enter a valid email address.", "location": "email"},
            {"message": "This field is required.", "location": "message"},
        ]})
    );
}

#[tokio::test]
async fn rightholder_appeal_keeps_json_urls() {
    let app = spawn_app().await;

    let response = app
        .post(
            "/api/v1/support/rightholder/",
            None,
            json!({
                "organization": "Studio",
                "contact_person": "Legal",
                "email": "legal@example.com",
                "release_url": "[\"https://example.com/a\"]",
                "document_url": "https://example.com/doc.pdf",
                "explanation": "We own it",
                "message": "Please remove",
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

    let staff = app.staff("legal-team").await;
    let list = app
        .get("/api/v1/staff/appeals/rightholder/", Some(&staff))
        .await;
    let appeal = &list.body["results"][0];
    assert_eq!(appeal["release_url"], json!(["https://example.com/a"]));
    assert_eq!(appeal["document_url"], "https://example.com/doc.pdf");
    assert_eq!(appeal["status"], "OPEN");
}

#[tokio::test]
async fn staff_workflow_with_guards() {
    let app = spawn_app().await;
    let id = open_help_appeal(&app).await;
    let alice = app.staff("alice").await;
    let bob = app.staff("bob").await;
    let base = format!("/api/v1/staff/appeals/help/{id}");

    let assigned = app
        .call(Method::POST, &format!("{base}/assign/"), Some(&alice), None)
        .await;
    assert_eq!(assigned.status, StatusCode::OK);
    assert_eq!(assigned.body["status"], "IN_PROGRESS");

    let again = app
        .call(Method::POST, &format!("{base}/assign/"), Some(&alice), None)
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);

    let foreign = app
        .call(Method::POST, &format!("{base}/resolve/"), Some(&bob), None)
        .await;
    assert_eq!(foreign.status, StatusCode::CONFLICT);

    let note = app
        .post(&format!("{base}/notes/"), Some(&alice), json!({"message": "Checked logs"}))
        .await;
    assert_eq!(note.status, StatusCode::CREATED);
    assert_eq!(note.body["event"], "COMMENT");

    let resolved = app
        .call(Method::POST, &format!("{base}/resolve/"), Some(&alice), None)
        .await;
    assert_eq!(resolved.status, StatusCode::OK);
    assert_eq!(resolved.body["status"], "RESOLVED");

    let detail = app.get(&format!("{base}/"), Some(&alice)).await;
    let events: Vec<&str> = detail.body["history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["event"].as_str().unwrap())
        .collect();
    assert!(events.contains(&"OPEN"));
    assert!(events.contains(&"ASSIGNED"));
    assert!(events.contains(&"IN_PROGRESS"));
    assert!(events.contains(&"RESOLVED"));

    let filtered = app
        .get("/api/v1/staff/appeals/help/?status=RESOLVED", Some(&alice))
        .await;
    assert_eq!(filtered.body["count"], 1);
}

#[tokio::test]
async fn unknown_appeal_kind_is_not_found() {
    let app = spawn_app().await;
    let staff = app.staff("lookup").await;

    let response = app.get("/api/v1/staff/appeals/refund/", Some(&staff)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
