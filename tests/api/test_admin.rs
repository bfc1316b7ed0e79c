//! Admin gates, deletion and bulk operations.

use actix_web::test;
use serde_json::json;
use uuid::Uuid;

use super::test_helpers::*;

/// A missing id fails the whole batch and deletes nothing.
#[actix_rt::test]
async fn test_bulk_delete_is_all_or_nothing() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let admin = admin_token(&app, "root").await;
    let issue = create_issue(&app, &admin, issue_body("Keep me", PARSABLE_PATH)).await;
    let id1 = issue["id"].as_str().unwrap().to_string();
    let id2 = Uuid::now_v7().to_string();

    let (status, body) = send(
        &app,
        with_token(
            test::TestRequest::post()
                .uri("/api/v1/admin/issues/bulk-delete")
                .set_json(json!({ "issue_ids": [id1, id2] })),
            &admin,
        ),
    )
    .await;
    assert_eq!(status, 404, "{}", body);
    assert!(body["message"].as_str().unwrap().contains(&id2));

    let (status, _) = send(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/issues/{}", id1)),
    )
    .await;
    assert_eq!(status, 200, "id1 must survive a failed batch");
}

#[actix_rt::test]
async fn test_bulk_delete_by_filter() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let admin = admin_token(&app, "root").await;
    create_issue(&app, &admin, issue_body("A", PARSABLE_PATH)).await;
    create_issue(&app, &admin, issue_body("B", PARSABLE_PATH)).await;
    let other = create_issue(&app, &admin, issue_body("C", "/some/other/path")).await;

    let (status, ids) = send(
        &app,
        with_token(
            test::TestRequest::get().uri("/api/v1/admin/issues/ids?release=251"),
            &admin,
        ),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(ids["total"], 2);

    let (status, body) = send(
        &app,
        with_token(
            test::TestRequest::post()
                .uri("/api/v1/admin/issues/bulk-delete")
                .set_json(json!({ "issue_ids": ids["issue_ids"] })),
            &admin,
        ),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["deleted_count"], 2);
    assert_eq!(body["message"], "Deleted 2 issues");

    let (_, list) = send(&app, test::TestRequest::get().uri("/api/v1/issues")).await;
    assert_eq!(list["total"], 1);
    assert_eq!(list["issues"][0]["id"], other["id"]);
}

#[actix_rt::test]
async fn test_bulk_delete_rejects_empty_list() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;

    let (status, body) = send(
        &app,
        with_admin_key(
            test::TestRequest::post()
                .uri("/api/v1/admin/issues/bulk-delete")
                .set_json(json!({ "issue_ids": [] })),
        ),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[actix_rt::test]
async fn test_admin_routes_forbidden_for_users() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;
    let issue = create_issue(&app, &token, issue_body("Mine", PARSABLE_PATH)).await;
    let id = issue["id"].as_str().unwrap();

    let requests = [
        test::TestRequest::get().uri("/api/v1/admin/users"),
        test::TestRequest::get().uri("/api/v1/admin/issues/ids"),
        test::TestRequest::delete().uri(&format!("/api/v1/admin/issues/{}", id)),
        test::TestRequest::put()
            .uri(&format!("/api/v1/admin/issues/{}/edit", id))
            .set_json(json!({ "build": "Daily" })),
    ];
    for req in requests {
        let (status, _) = send(&app, with_token(req, &token)).await;
        assert_eq!(status, 403);
    }

    let (status, _) = send(&app, test::TestRequest::get().uri("/api/v1/admin/users")).await;
    assert_eq!(status, 401);

    let (status, _) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/admin/users")
            .insert_header(("X-Admin-Key", "wrong-key")),
    )
    .await;
    assert_eq!(status, 401);
}

#[actix_rt::test]
async fn test_delete_issue_cascades() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let admin = admin_token(&app, "root").await;
    let mut body = issue_body("Doomed", PARSABLE_PATH);
    body["tags"] = json!("flaky");
    let issue = create_issue(&app, &admin, body).await;
    let id = issue["id"].as_str().unwrap();
    let comment = create_comment(&app, &admin, id, "bye").await;

    let (status, _) = send(
        &app,
        with_token(
            test::TestRequest::delete().uri(&format!("/api/v1/admin/issues/{}", id)),
            &admin,
        ),
    )
    .await;
    assert_eq!(status, 200);

    let (status, _) = send(&app, test::TestRequest::get().uri(&format!("/api/v1/issues/{}", id))).await;
    assert_eq!(status, 404);
    let (status, _) = send(
        &app,
        with_token(
            test::TestRequest::post().uri(&format!(
                "/api/v1/comments/{}/upvote",
                comment["id"].as_str().unwrap()
            )),
            &admin,
        ),
    )
    .await;
    assert_eq!(status, 404);

    // Tags outlive the issues they were attached to
    let (_, tags) = send(&app, test::TestRequest::get().uri("/api/v1/tags")).await;
    assert_eq!(tags[0]["name"], "flaky");
}

#[actix_rt::test]
async fn test_admin_edit_changes_admin_fields() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let admin = admin_token(&app, "root").await;
    let issue = create_issue(&app, &admin, issue_body("Edit", PARSABLE_PATH)).await;
    let id = issue["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        with_token(
            test::TestRequest::put()
                .uri(&format!("/api/v1/admin/issues/{}/edit", id))
                .set_json(json!({ "severity": "critical", "ccr_number": "CCR-9" })),
            &admin,
        ),
    )
    .await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["severity"], "Critical");
    assert_eq!(body["ccr_number"], "CCR-9");
    assert_eq!(body["status"], "open", "ccr_number alone does not move status");
}

#[actix_rt::test]
async fn test_user_management() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, user_id) = register_and_login(&app, "alice").await;

    let (status, users) = send(
        &app,
        with_admin_key(test::TestRequest::get().uri("/api/v1/admin/users")),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(users[0]["username"], "alice");
    assert_eq!(users[0]["role"], "user");

    let (status, updated) = send(
        &app,
        with_admin_key(
            test::TestRequest::put()
                .uri(&format!("/api/v1/admin/users/{}", user_id))
                .set_json(json!({ "is_active": false })),
        ),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(updated["is_active"], false);

    // Existing sessions of a disabled user stop working
    let (status, _) = send(
        &app,
        with_token(test::TestRequest::get().uri("/api/v1/auth/me"), &token),
    )
    .await;
    assert_eq!(status, 401);

    let (status, _) = send(
        &app,
        with_admin_key(
            test::TestRequest::put()
                .uri(&format!("/api/v1/admin/users/{}", Uuid::now_v7()))
                .set_json(json!({ "role": "admin" })),
        ),
    )
    .await;
    assert_eq!(status, 404);
}

/// Editing the path re-derives release and platform, including back to none.
#[actix_rt::test]
async fn test_admin_edit_path_rederives_release_and_platform() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let admin = admin_token(&app, "root").await;
    let issue = create_issue(&app, &admin, issue_body("Moved", PARSABLE_PATH)).await;
    let id = issue["id"].as_str().unwrap();
    assert_eq!(issue["release"], "251");
    assert_eq!(issue["platform"], "lnx86");

    let (status, body) = send(
        &app,
        with_token(
            test::TestRequest::put()
                .uri(&format!("/api/v1/admin/issues/{}/edit", id))
                .set_json(json!({ "testcase_path": "/lan/fed/etpv5/release/261/lr/etautotest/a/b" })),
            &admin,
        ),
    )
    .await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["release"], "261");
    assert_eq!(body["platform"], "lr");
    assert_eq!(body["platform_display"], "LR");

    let (status, body) = send(
        &app,
        with_token(
            test::TestRequest::put()
                .uri(&format!("/api/v1/admin/issues/{}/edit", id))
                .set_json(json!({ "testcase_path": "/some/other/path" })),
            &admin,
        ),
    )
    .await;
    assert_eq!(status, 200, "{}", body);
    assert!(body["release"].is_null());
    assert!(body["platform"].is_null());

    let (_, detail) = send(&app, test::TestRequest::get().uri(&format!("/api/v1/issues/{}", id))).await;
    assert_eq!(detail["testcase_path"], "/some/other/path");
    assert!(detail["release"].is_null());
}
