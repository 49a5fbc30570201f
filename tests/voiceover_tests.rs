mod common;

use axum::http::StatusCode;
use common::{TestApp, spawn_app};
use serde_json::{Value, json};

struct Fixture {
    app: TestApp,
    staff: String,
    dubber: String,
    episode: i64,
    team: i64,
}

async fn fixture() -> Fixture {
    let app = spawn_app().await;
    let staff = app.staff("curator").await;
    let anime = app.create_anime(&staff, "Monster").await;

    let episode = app
        .post(
            &format!("/api/v1/staff/anime/{anime}/episodes/"),
            Some(&staff),
            json!({"title": "Herr Dr. Tenma", "order": 1}),
        )
        .await;
    assert_eq!(episode.status, StatusCode::CREATED, "{}", episode.body);

    let team = app
        .post("/api/v1/staff/teams/", Some(&staff), json!({"name": "Night Owls"}))
        .await;
    assert_eq!(team.status, StatusCode::CREATED, "{}", team.body);

    let dubber = app.register("dubber").await;
    Fixture {
        episode: episode.body["id"].as_i64().unwrap(),
        team: team.body["id"].as_i64().unwrap(),
        app,
        staff,
        dubber,
    }
}

async fn join_team(fixture: &Fixture, username: &str) {
    let user = fixture
        .app
        .state
        .store()
        .users()
        .get_by_username(username)
        .await
        .unwrap()
        .unwrap();
    let response = fixture
        .app
        .post(
            &format!("/api/v1/staff/teams/{}/members/", fixture.team),
            Some(&fixture.staff),
            json!({"user": user.id}),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
}

fn submission(fixture: &Fixture) -> Value {
    json!({
        "episode": fixture.episode,
        "team": fixture.team,
        "type": "SUBTITLES",
        "url": "https://cdn.example.com/monster/1.vtt",
    })
}

#[tokio::test]
async fn only_team_members_submit() {
    let fixture = fixture().await;
    let app = &fixture.app;

    let invalid = app
        .post(
            "/api/v1/voiceover/",
            Some(&fixture.dubber),
            json!({"episode": 999, "team": fixture.team, "type": "DUB"}),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    let locations: Vec<&str> = invalid.body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["location"].as_str().unwrap())
        .collect();
    assert_eq!(locations, ["type", "url", "episode"]);

    let outsider = app
        .post("/api/v1/voiceover/", Some(&fixture.dubber), submission(&fixture))
        .await;
    assert_eq!(outsider.status, StatusCode::FORBIDDEN);

    join_team(&fixture, "dubber").await;
    let created = app
        .post("/api/v1/voiceover/", Some(&fixture.dubber), submission(&fixture))
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    assert_eq!(created.body["status"], "CREATED");
    assert_eq!(created.body["type"], "SUBTITLES");
}

#[tokio::test]
async fn review_events_drive_status() {
    let fixture = fixture().await;
    let app = &fixture.app;
    join_team(&fixture, "dubber").await;

    let created = app
        .post("/api/v1/voiceover/", Some(&fixture.dubber), submission(&fixture))
        .await;
    let id = created.body["id"].as_i64().unwrap();
    let events = format!("/api/v1/staff/voiceovers/{id}/events/");

    let wait = app
        .post(&events, Some(&fixture.staff), json!({"event": "WAIT"}))
        .await;
    assert_eq!(wait.status, StatusCode::CREATED);

    let pending = app
        .get("/api/v1/staff/voiceovers/?status=WAIT", Some(&fixture.staff))
        .await;
    assert_eq!(pending.body["count"], 1);

    let approved = app
        .post(
            &events,
            Some(&fixture.staff),
            json!({"event": "APPROVED", "message": "Timing is fine"}),
        )
        .await;
    assert_eq!(approved.status, StatusCode::CREATED);
    assert_eq!(approved.body["event"], "APPROVED");

    let detail = app
        .get(&format!("/api/v1/voiceover/{id}/"), Some(&fixture.dubber))
        .await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["status"], "APPROVED");
    assert!(detail.body["history"].as_array().unwrap().len() >= 2);

    let stranger = app.register("stranger").await;
    let hidden = app
        .get(&format!("/api/v1/voiceover/{id}/"), Some(&stranger))
        .await;
    assert_eq!(hidden.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submitter_cannot_approve_own_voiceover() {
    let fixture = fixture().await;
    let app = &fixture.app;
    join_team(&fixture, "curator").await;

    let created = app
        .post("/api/v1/voiceover/", Some(&fixture.staff), submission(&fixture))
        .await;
    let id = created.body["id"].as_i64().unwrap();

    let response = app
        .post(
            &format!("/api/v1/staff/voiceovers/{id}/events/"),
            Some(&fixture.staff),
            json!({"event": "APPROVED"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(
        response.body["errors"][0]["message"],
        "You cannot approve your own voiceover."
    );
}

#[tokio::test]
async fn review_event_is_validated_before_lookup() {
    let fixture = fixture().await;
    let app = &fixture.app;

    let missing = app
        .post("/api/v1/staff/voiceovers/4242/events/", Some(&fixture.staff), json!({}))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        missing.body,
        json!({"errors": [{"message": "This field is required.", "location": "event"}]})
    );

    let unknown = app
        .post(
            "/api/v1/staff/voiceovers/4242/events/",
            Some(&fixture.staff),
            json!({"event": "WAIT"}),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}
