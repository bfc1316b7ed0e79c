//! Free-text search, structured filters and catalog lookups.

use actix_web::test;
use serde_json::json;

use super::test_helpers::*;

async fn seed<S>(app: &S, token: &str)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let mut login = issue_body("Login page TIMEOUT", PARSABLE_PATH);
    login["build"] = json!("Weekly");
    create_issue(app, token, login).await;

    let mut export = issue_body("Export crashes", "/lan/fed/etpv5/release/231/rhel7.6/etautotest/e");
    export["severity"] = json!("Low");
    export["description"] = json!("50%_done then abort");
    create_issue(app, token, export).await;

    create_issue(app, token, issue_body("Unrelated", "/some/other/path")).await;
}

#[actix_rt::test]
async fn test_search_text_is_case_insensitive_substring() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;
    seed(&app, &token).await;

    let (status, body) = send(&app, test::TestRequest::get().uri("/api/v1/search?q=timeout")).await;
    assert_eq!(status, 200);
    assert_eq!(body["total"], 1);
    assert_eq!(body["issues"][0]["testcase_title"], "Login page TIMEOUT");

    // LIKE metacharacters match literally
    let (_, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/search")
            .set_json(json!({ "search": "50%_" })),
    )
    .await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["issues"][0]["testcase_title"], "Export crashes");
}

/// Surrounding whitespace in the query is part of the match.
#[actix_rt::test]
async fn test_search_text_is_not_trimmed() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;
    seed(&app, &token).await;

    let (_, body) = send(&app, test::TestRequest::get().uri("/api/v1/search?q=login")).await;
    assert_eq!(body["total"], 1);

    let (_, body) = send(&app, test::TestRequest::get().uri("/api/v1/search?q=%20login")).await;
    assert_eq!(body["total"], 0);

    let (_, body) = send(&app, test::TestRequest::get().uri("/api/v1/search?q=%20%20")).await;
    assert_eq!(body["total"], 3, "blank query is no text filter");
}

#[actix_rt::test]
async fn test_search_filters_and_text_combine() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;
    seed(&app, &token).await;

    let (_, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/search")
            .set_json(json!({ "release": "231", "platform": "rhel7.6", "severity": "Low" })),
    )
    .await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["issues"][0]["platform_display"], "RHEL7.6");

    let (_, body) = send(
        &app,
        test::TestRequest::get().uri("/api/v1/search?q=export&release=251"),
    )
    .await;
    assert_eq!(body["total"], 0);
}

/// The tag filter is accepted but does not narrow results.
#[actix_rt::test]
async fn test_search_tag_filter_is_a_no_op() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;
    seed(&app, &token).await;

    let (status, body) = send(
        &app,
        test::TestRequest::get().uri("/api/v1/search?tags=nonexistent"),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["total"], 3);
}

#[actix_rt::test]
async fn test_search_size_caps_results() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;
    seed(&app, &token).await;

    let (_, body) = send(&app, test::TestRequest::get().uri("/api/v1/search?size=2")).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["issues"][0]["testcase_title"], "Unrelated");
}

#[actix_rt::test]
async fn test_list_filters() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;
    seed(&app, &token).await;

    let (_, body) = send(
        &app,
        test::TestRequest::get().uri("/api/v1/issues?build=Weekly&status=open"),
    )
    .await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["issues"][0]["build"], "Weekly");

    let (_, body) = send(&app, test::TestRequest::get().uri("/api/v1/issues?status=%20")).await;
    assert_eq!(body["total"], 3, "blank filters are ignored");
}

#[actix_rt::test]
async fn test_catalog_lookups() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;
    seed(&app, &token).await;

    let (_, releases) = send(&app, test::TestRequest::get().uri("/api/v1/releases")).await;
    assert_eq!(releases, json!(["231", "251"]));

    let (_, platforms) = send(&app, test::TestRequest::get().uri("/api/v1/platforms")).await;
    assert_eq!(
        platforms,
        json!([
            { "code": "lnx86", "display": "Linux" },
            { "code": "rhel7.6", "display": "RHEL7.6" },
        ])
    );

    let (_, builds) = send(&app, test::TestRequest::get().uri("/api/v1/builds")).await;
    assert_eq!(builds, json!(["Weekly", "Daily", "Daily Plus"]));

    let (_, targets) = send(&app, test::TestRequest::get().uri("/api/v1/targets/261")).await;
    assert_eq!(targets, json!(["26.10-d075_1_May_08"]));

    let (status, targets) = send(&app, test::TestRequest::get().uri("/api/v1/targets/999")).await;
    assert_eq!(status, 200);
    assert_eq!(targets, json!([]));
}

#[actix_rt::test]
async fn test_health_and_openapi() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;

    let (status, body) = send(&app, test::TestRequest::get().uri("/api/v1/health")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, test::TestRequest::get().uri("/api/v1/ready")).await;
    assert_eq!(status, 200);
    assert_eq!(body["database"], "connected");

    let (status, body) = send(&app, test::TestRequest::get().uri("/api/v1/openapi.json")).await;
    assert_eq!(status, 200);
    assert!(body["paths"]["/api/v1/issues"].is_object());
    assert!(body["components"]["securitySchemes"]["session"].is_object());
}
