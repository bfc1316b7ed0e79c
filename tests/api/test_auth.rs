//! Registration, login, sessions and logout.

use actix_web::test;
use serde_json::json;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_register_login_me() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, user_id) = register_and_login(&app, "alice").await;

    let (status, me) = send(
        &app,
        with_token(test::TestRequest::get().uri("/api/v1/auth/me"), &token),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(me["username"], "alice");
    assert_eq!(me["role"], "user");
    assert_eq!(me["user"]["id"], user_id.as_str());
    assert!(!me["user"]["last_login"].is_null());
}

#[actix_rt::test]
async fn test_login_sets_session_cookie() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    register_and_login(&app, "alice").await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "username": "alice", "password": "correct horse battery staple" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 200);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "triage_session")
        .expect("session cookie missing");
    assert!(cookie.http_only().unwrap_or(false));

    // The cookie alone authenticates
    let (status, me) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/auth/me")
            .cookie(cookie.into_owned()),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(me["username"], "alice");
}

#[actix_rt::test]
async fn test_duplicate_registration_names_field() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    register_and_login(&app, "alice").await;

    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({
                "username": "alice",
                "email": "other@example.com",
                "password": "pw",
            })),
    )
    .await;
    assert_eq!(status, 409);
    assert!(body["message"].as_str().unwrap().contains("username"));

    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({
                "username": "alice2",
                "email": "alice@example.com",
                "password": "pw",
            })),
    )
    .await;
    assert_eq!(status, 409);
    assert!(body["message"].as_str().unwrap().contains("email"));
}

#[actix_rt::test]
async fn test_register_requires_all_fields() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;

    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({ "username": "alice" })),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[actix_rt::test]
async fn test_login_failures() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (_, user_id) = register_and_login(&app, "alice").await;

    let (status, _) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "username": "alice", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, 401);

    let (status, _) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "username": "alice" })),
    )
    .await;
    assert_eq!(status, 400);

    send(
        &app,
        with_admin_key(
            test::TestRequest::put()
                .uri(&format!("/api/v1/admin/users/{}", user_id))
                .set_json(json!({ "is_active": false })),
        ),
    )
    .await;
    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "username": "alice", "password": "correct horse battery staple" })),
    )
    .await;
    assert_eq!(status, 401);
    assert!(body["message"].as_str().unwrap().contains("disabled"));
}

#[actix_rt::test]
async fn test_invalid_token_and_logout() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;

    let (status, _) = send(
        &app,
        with_token(test::TestRequest::get().uri("/api/v1/auth/me"), "not-a-jwt"),
    )
    .await;
    assert_eq!(status, 401);

    let (status, body) = send(&app, test::TestRequest::post().uri("/api/v1/auth/logout")).await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Logged out");
}

#[actix_rt::test]
async fn test_admin_key_acts_as_admin() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;

    let (status, me) = send(
        &app,
        with_admin_key(test::TestRequest::get().uri("/api/v1/auth/me")),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(me["role"], "admin");
    assert!(me["user"].is_null());
}
