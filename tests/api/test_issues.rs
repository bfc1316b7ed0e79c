//! Issue creation, retrieval, patching, CCR transitions and votes.

use actix_web::test;
use futures_util::future::join_all;
use serde_json::json;
use uuid::Uuid;

use triage_board_lib::models::{Caller, Role, VoteDirection};

use super::test_helpers::*;

/// Parsable path: release and platform are derived from it.
#[actix_rt::test]
async fn test_create_issue_derives_release_and_platform() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;

    let issue = create_issue(&app, &token, issue_body("Login", PARSABLE_PATH)).await;

    assert_eq!(issue["release"], "251");
    assert_eq!(issue["platform"], "lnx86");
    assert_eq!(issue["platform_display"], "Linux");
    assert_eq!(issue["status"], "open");
    assert_eq!(issue["upvotes"], 0);
    assert_eq!(issue["comment_count"], 0);
    assert_eq!(issue["has_verified_solution"], false);
    let id = issue["test_case_ids"].as_str().unwrap();
    assert!(id.starts_with("TC-") && id.len() == "TC-20250101-AAAA".len());
}

/// Unparsable path: both tokens absent, creation still succeeds.
#[actix_rt::test]
async fn test_create_issue_with_unparsable_path() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;

    let issue = create_issue(&app, &token, issue_body("Other", "/some/other/path")).await;

    assert!(issue["release"].is_null());
    assert!(issue["platform"].is_null());
    assert!(issue["platform_display"].is_null());
}

#[actix_rt::test]
async fn test_create_issue_reports_missing_fields() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;

    let (status, body) = send(
        &app,
        with_token(
            test::TestRequest::post()
                .uri("/api/v1/issues")
                .set_json(json!({ "testcase_title": "t", "severity": "Low" })),
            &token,
        ),
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    let message = body["message"].as_str().unwrap();
    for field in ["testcase_path", "description", "reporter_name"] {
        assert!(message.contains(field), "{} not named in: {}", field, message);
    }
    assert!(!message.contains("severity"));

    let (_, list) = send(&app, test::TestRequest::get().uri("/api/v1/issues")).await;
    assert_eq!(list["total"], 0, "rejected creation must not write");
}

#[actix_rt::test]
async fn test_create_issue_requires_authentication() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;

    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/issues")
            .set_json(issue_body("Login", PARSABLE_PATH)),
    )
    .await;

    assert_eq!(status, 401);
    assert_eq!(body["error"], "UNAUTHORIZED");
}

/// A drawn identifier contained in an existing one is skipped.
#[actix_rt::test]
async fn test_identifier_collision_draws_again() {
    let env = create_test_env_with_suffixes(&["AAAA", "AAAA", "BBBB"]).await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;

    let first = create_issue(&app, &token, issue_body("First", PARSABLE_PATH)).await;
    let second = create_issue(&app, &token, issue_body("Second", PARSABLE_PATH)).await;

    let first_id = first["test_case_ids"].as_str().unwrap();
    let second_id = second["test_case_ids"].as_str().unwrap();
    assert!(first_id.ends_with("-AAAA"));
    assert!(second_id.ends_with("-BBBB"));
    assert!(!first_id.contains(second_id) && !second_id.contains(first_id));
}

/// `"a, b, a"` and `["a", "b"]` attach the same tag set and reuse the tags.
#[actix_rt::test]
async fn test_tag_inputs_normalize_identically() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;

    let mut csv_body = issue_body("Csv", PARSABLE_PATH);
    csv_body["tags"] = json!("a, b, a");
    let mut list_body = issue_body("List", PARSABLE_PATH);
    list_body["tags"] = json!(["a", "b"]);

    let csv = create_issue(&app, &token, csv_body).await;
    let list = create_issue(&app, &token, list_body).await;

    let mut csv_tags: Vec<String> = serde_json::from_value(csv["tags"].clone()).unwrap();
    let mut list_tags: Vec<String> = serde_json::from_value(list["tags"].clone()).unwrap();
    csv_tags.sort();
    list_tags.sort();
    assert_eq!(csv_tags, vec!["a", "b"]);
    assert_eq!(csv_tags, list_tags);

    let (status, tags) = send(&app, test::TestRequest::get().uri("/api/v1/tags")).await;
    assert_eq!(status, 200);
    assert_eq!(tags.as_array().unwrap().len(), 2, "tags must be reused, not duplicated");
}

#[actix_rt::test]
async fn test_get_issue_not_found() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;

    let (status, body) = send(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/issues/{}", uuid::Uuid::now_v7())),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "NOT_FOUND");

    let (status, _) = send(&app, test::TestRequest::get().uri("/api/v1/issues/not-a-uuid")).await;
    assert_eq!(status, 400);
}

/// Absent keys stay, `null` clears, values overwrite; tags are a full overwrite.
#[actix_rt::test]
async fn test_patch_tri_state() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;

    let mut body = issue_body("Patch", PARSABLE_PATH);
    body["build"] = json!("Weekly");
    body["target"] = json!("25.11-d065_1_Jun23");
    body["additional_comments"] = json!("seen twice");
    body["tags"] = json!(["flaky", "login"]);
    let issue = create_issue(&app, &token, body).await;
    let id = issue["id"].as_str().unwrap();

    let (status, updated) = send(
        &app,
        with_token(
            test::TestRequest::put()
                .uri(&format!("/api/v1/issues/{}", id))
                .set_json(json!({ "build": null, "target": "25.11-d066_1_Jun30", "tags": ["timeout"] })),
            &token,
        ),
    )
    .await;

    assert_eq!(status, 200, "{}", updated);
    assert!(updated["build"].is_null());
    assert_eq!(updated["target"], "25.11-d066_1_Jun30");
    assert_eq!(updated["additional_comments"], "seen twice");
    assert_eq!(updated["tags"], json!(["timeout"]));
    assert_eq!(updated["test_case_ids"], issue["test_case_ids"]);

    let (status, cleared) = send(
        &app,
        with_token(
            test::TestRequest::put()
                .uri(&format!("/api/v1/issues/{}", id))
                .set_json(json!({ "tags": null })),
            &token,
        ),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(cleared["tags"], json!([]));
    assert_eq!(cleared["target"], "25.11-d066_1_Jun30");
}

#[actix_rt::test]
async fn test_patch_admin_fields_forbidden_for_users() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;
    let issue = create_issue(&app, &token, issue_body("Gate", PARSABLE_PATH)).await;
    let id = issue["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        with_token(
            test::TestRequest::put()
                .uri(&format!("/api/v1/issues/{}", id))
                .set_json(json!({ "status": "closed" })),
            &token,
        ),
    )
    .await;
    assert_eq!(status, 403);
    assert_eq!(body["error"], "FORBIDDEN");

    let admin = admin_token(&app, "root").await;
    let (status, body) = send(
        &app,
        with_token(
            test::TestRequest::put()
                .uri(&format!("/api/v1/issues/{}", id))
                .set_json(json!({ "status": "closed", "testcase_path": "/some/other/path" })),
            &admin,
        ),
    )
    .await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["status"], "closed");
    assert!(body["release"].is_null(), "path change re-derives release");
}

#[actix_rt::test]
async fn test_patch_rejects_null_required_field_and_identifier() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let admin = admin_token(&app, "root").await;
    let issue = create_issue(&app, &admin, issue_body("Strict", PARSABLE_PATH)).await;
    let id = issue["id"].as_str().unwrap();

    for patch in [
        json!({ "severity": null }),
        json!({ "testcase_title": "  " }),
        json!({ "test_case_ids": "TC-20200101-ZZZZ" }),
    ] {
        let (status, body) = send(
            &app,
            with_token(
                test::TestRequest::put()
                    .uri(&format!("/api/v1/issues/{}", id))
                    .set_json(patch.clone()),
                &admin,
            ),
        )
        .await;
        assert_eq!(status, 400, "{} should be rejected: {}", patch, body);
    }
}

#[actix_rt::test]
async fn test_move_to_ccr() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;
    let issue = create_issue(&app, &token, issue_body("Ccr", PARSABLE_PATH)).await;
    let id = issue["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        with_token(
            test::TestRequest::post()
                .uri(&format!("/api/v1/issues/{}/move-to-ccr", id))
                .set_json(json!({ "ccr_number": "" })),
            &token,
        ),
    )
    .await;
    assert_eq!(status, 400);
    assert!(body["message"].as_str().unwrap().contains("ccr_number"));

    let (status, body) = send(
        &app,
        with_token(
            test::TestRequest::post()
                .uri(&format!("/api/v1/issues/{}/move-to-ccr", id))
                .set_json(json!({ "ccr_number": "CCR-1234" })),
            &token,
        ),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ccr");
    assert_eq!(body["ccr_number"], "CCR-1234");
}

/// K upvotes and M downvotes, interleaved, give K, M and K - M.
#[actix_rt::test]
async fn test_issue_votes_accumulate() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;
    let issue = create_issue(&app, &token, issue_body("Votes", PARSABLE_PATH)).await;
    let id = issue["id"].as_str().unwrap();

    for direction in ["upvote", "downvote", "upvote", "upvote", "downvote"] {
        let (status, _) = send(
            &app,
            with_token(
                test::TestRequest::post().uri(&format!("/api/v1/issues/{}/{}", id, direction)),
                &token,
            ),
        )
        .await;
        assert_eq!(status, 200);
    }

    let (_, body) = send(&app, test::TestRequest::get().uri(&format!("/api/v1/issues/{}", id))).await;
    assert_eq!(body["upvotes"], 3);
    assert_eq!(body["downvotes"], 2);
    assert_eq!(body["score"], 1);

    let (status, _) = send(
        &app,
        with_token(
            test::TestRequest::post()
                .uri(&format!("/api/v1/issues/{}/upvote", uuid::Uuid::now_v7())),
            &token,
        ),
    )
    .await;
    assert_eq!(status, 404);
}

#[actix_rt::test]
async fn test_list_issues_paginates_newest_first() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;
    for i in 0..3 {
        create_issue(&app, &token, issue_body(&format!("Issue {}", i), PARSABLE_PATH)).await;
    }

    let (status, page) = send(
        &app,
        test::TestRequest::get().uri("/api/v1/issues?page=1&per_page=2"),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(page["total"], 3);
    assert_eq!(page["pages"], 2);
    assert_eq!(page["current_page"], 1);
    assert_eq!(page["issues"][0]["testcase_title"], "Issue 2");
    assert_eq!(page["issues"][1]["testcase_title"], "Issue 1");

    let (_, page) = send(
        &app,
        test::TestRequest::get().uri("/api/v1/issues?page=2&per_page=2"),
    )
    .await;
    assert_eq!(page["issues"].as_array().unwrap().len(), 1);
    assert_eq!(page["issues"][0]["testcase_title"], "Issue 0");
}

/// Concurrent votes on one issue are all applied.
#[actix_rt::test]
async fn test_concurrent_issue_votes_all_apply() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;
    let issue = create_issue(&app, &token, issue_body("Busy", PARSABLE_PATH)).await;
    let id: Uuid = issue["id"].as_str().unwrap().parse().unwrap();

    let caller = Caller {
        user_id: None,
        username: "voter".to_string(),
        role: Role::User,
    };
    let directions: Vec<VoteDirection> = (0..20)
        .map(|i| if i % 3 == 0 { VoteDirection::Down } else { VoteDirection::Up })
        .collect();
    let results = join_all(
        directions
            .iter()
            .map(|&direction| env.pool.vote_issue(&caller, id, direction)),
    )
    .await;
    assert!(results.iter().all(|r| r.is_ok()));

    let issue = env.pool.get_issue(id).await.unwrap();
    assert_eq!(issue.upvotes, 13);
    assert_eq!(issue.downvotes, 7);
    assert_eq!(issue.score, 6);
}
