mod common;

use axum::http::StatusCode;
use common::spawn_app;
use serde_json::json;

#[tokio::test]
async fn registration_returns_user_and_tokens() {
    let app = spawn_app().await;

    let response = app
        .post(
            "/api/v1/auth/registration/",
            None,
            json!({
                "username": "haruhi",
                "email": "haruhi@example.com",
                "password": "sos-brigade",
                "password2": "sos-brigade",
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["user"]["username"], "haruhi");
    assert_eq!(response.body["user"]["count_viewed_anime"], 0);
    assert!(response.body["access"].is_string());
    assert!(response.body["refresh"].is_string());
}

#[tokio::test]
async fn registration_reports_field_errors_in_order() {
    let app = spawn_app().await;
    app.register("taken").await;

    let response = app
        .post(
            "/api/v1/auth/registration/",
            None,
            json!({
                "username": "taken",
                "email": "not-an-email",
                "password_repeat": "x",
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body,
        json!({"errors": [
            {"message": "A user with that username already exists.", "location": "username"},
            {"message": "Enter a valid email address.", "location": "email"},
            {"message": "This field is required.", "location": "password"},
        ]})
    );
}

#[tokio::test]
async fn registration_password_mismatch() {
    let app = spawn_app().await;

    let response = app
        .post(
            "/api/v1/auth/registration/",
            None,
            json!({
                "username": "kyon",
                "email": "kyon@example.com",
                "password": "one",
                "password_repeat": "two",
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["errors"][0],
        json!({"message": "Password Does not match", "location": "password_repeat"})
    );
}

#[tokio::test]
async fn login_refresh_logout_cycle() {
    let app = spawn_app().await;
    app.register("mikuru").await;

    let bad = app
        .post(
            "/api/v1/auth/login/",
            None,
            json!({"username": "mikuru", "password": "wrong"}),
        )
        .await;
    assert_eq!(bad.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        bad.body,
        json!({"detail": "No active account found with the given credentials"})
    );

    let login = app
        .post(
            "/api/v1/auth/login/",
            None,
            json!({"username": "mikuru", "password": "secret-pass"}),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    let refresh = login.body["refresh"].as_str().unwrap().to_string();

    let refreshed = app
        .post(
            "/api/v1/auth/token/refresh/",
            None,
            json!({"refresh": refresh}),
        )
        .await;
    assert_eq!(refreshed.status, StatusCode::OK);
    assert!(refreshed.body["access"].is_string());

    let logout = app
        .post("/api/v1/auth/logout/", None, json!({"refresh": refresh}))
        .await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.body, json!({}));

    let reused = app
        .post(
            "/api/v1/auth/token/refresh/",
            None,
            json!({"refresh": refresh}),
        )
        .await;
    assert_eq!(reused.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        reused.body,
        json!({"detail": "Token is invalid or expired", "code": "token_not_valid"})
    );
}

#[tokio::test]
async fn access_token_is_not_a_refresh_token() {
    let app = spawn_app().await;
    let access = app.register("yuki").await;

    let response = app
        .post("/api/v1/auth/token/refresh/", None, json!({"refresh": access}))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["code"], "token_not_valid");
}

#[tokio::test]
async fn bearer_token_guards_protected_routes() {
    let app = spawn_app().await;

    let anonymous = app.get("/api/v1/user/me/", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        anonymous.body,
        json!({"detail": "Authentication credentials were not provided."})
    );

    let garbage = app.get("/api/v1/user/me/", Some("garbage")).await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.body["code"], "token_not_valid");

    let access = app.register("itsuki").await;
    let me = app.get("/api/v1/user/me/", Some(&access)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["username"], "itsuki");
    assert_eq!(me.body["email"], "itsuki@example.com");
    assert_eq!(me.body["count_commented_anime"], 0);
}

#[tokio::test]
async fn staff_routes_need_staff() {
    let app = spawn_app().await;
    let access = app.register("regular").await;

    let response = app.get("/api/v1/staff/voiceovers/", Some(&access)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(
        response.body,
        json!({"errors": [{"message": "You do not have permission to perform this action."}]})
    );

    let staff = app.staff("moderator").await;
    let response = app.get("/api/v1/staff/voiceovers/", Some(&staff)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["count"], 0);
}

#[tokio::test]
async fn registration_rejects_path_like_usernames() {
    let app = spawn_app().await;

    let response = app
        .post(
            "/api/v1/auth/registration/",
            None,
            json!({
                "username": "../../escape",
                "email": "escape@example.com",
                "password": "secret-pass",
                "password_repeat": "secret-pass",
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["errors"][0]["location"], "username");
    assert_eq!(
        response.body["errors"][0]["message"],
        "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
    );
}

#[tokio::test]
async fn padded_password_logs_in_as_registered() {
    let app = spawn_app().await;

    let registered = app
        .post(
            "/api/v1/auth/registration/",
            None,
            json!({
                "username": "nagato",
                "email": "nagato@example.com",
                "password": " secret-pass ",
                "password_repeat": " secret-pass ",
            }),
        )
        .await;
    assert_eq!(registered.status, StatusCode::CREATED);

    let login = app
        .post(
            "/api/v1/auth/login/",
            None,
            json!({"username": "nagato", "password": " secret-pass "}),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK, "{}", login.body);
    assert!(login.body["access"].is_string());
}
