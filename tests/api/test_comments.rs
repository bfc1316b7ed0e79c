//! Comment threads, verified solutions and comment votes.

use actix_web::test;
use futures_util::future::join_all;
use serde_json::json;
use uuid::Uuid;

use triage_board_lib::models::{Caller, Role, VoteDirection};

use super::test_helpers::*;

#[actix_rt::test]
async fn test_comments_listed_newest_first() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;
    let issue = create_issue(&app, &token, issue_body("Thread", PARSABLE_PATH)).await;
    let id = issue["id"].as_str().unwrap();

    create_comment(&app, &token, id, "first").await;
    create_comment(&app, &token, id, "second").await;

    let (status, comments) = send(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/issues/{}/comments", id)),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(comments[0]["content"], "second");
    assert_eq!(comments[1]["content"], "first");

    let (_, detail) = send(&app, test::TestRequest::get().uri(&format!("/api/v1/issues/{}", id))).await;
    assert_eq!(detail["comment_count"], 2);
    assert_eq!(detail["comments"].as_array().unwrap().len(), 2);
}

#[actix_rt::test]
async fn test_create_comment_validation_and_missing_issue() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;
    let issue = create_issue(&app, &token, issue_body("Thread", PARSABLE_PATH)).await;
    let id = issue["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        with_token(
            test::TestRequest::post()
                .uri(&format!("/api/v1/issues/{}/comments", id))
                .set_json(json!({ "commenter_name": "bob" })),
            &token,
        ),
    )
    .await;
    assert_eq!(status, 400);
    assert!(body["message"].as_str().unwrap().contains("content"));

    let (status, _) = send(
        &app,
        with_token(
            test::TestRequest::post()
                .uri(&format!("/api/v1/issues/{}/comments", Uuid::now_v7()))
                .set_json(json!({ "commenter_name": "bob", "content": "hi" })),
            &token,
        ),
    )
    .await;
    assert_eq!(status, 404);
}

/// Verifying moves the flag and resolves the issue.
#[actix_rt::test]
async fn test_verify_solution_keeps_exactly_one() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;
    let issue = create_issue(&app, &token, issue_body("Verify", PARSABLE_PATH)).await;
    let id = issue["id"].as_str().unwrap();

    let c1 = create_comment(&app, &token, id, "try a restart").await;
    let c2 = create_comment(&app, &token, id, "bump the timeout").await;

    for comment in [&c1, &c2] {
        let (status, body) = send(
            &app,
            with_token(
                test::TestRequest::post().uri(&format!(
                    "/api/v1/comments/{}/verify",
                    comment["id"].as_str().unwrap()
                )),
                &token,
            ),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body["is_verified_solution"], true);
    }

    let (_, detail) = send(&app, test::TestRequest::get().uri(&format!("/api/v1/issues/{}", id))).await;
    assert_eq!(detail["status"], "resolved");
    assert_eq!(detail["has_verified_solution"], true);
    let verified: Vec<&str> = detail["comments"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|c| c["is_verified_solution"] == true)
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(verified, vec![c2["id"].as_str().unwrap()]);
}

/// Two concurrent verifications on one issue leave exactly one verified comment.
#[actix_rt::test]
async fn test_concurrent_verify_solution() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;
    let issue = create_issue(&app, &token, issue_body("Race", PARSABLE_PATH)).await;
    let id = issue["id"].as_str().unwrap();
    let c1: Uuid = create_comment(&app, &token, id, "one").await["id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    let c2: Uuid = create_comment(&app, &token, id, "two").await["id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();

    let caller = Caller {
        user_id: None,
        username: "racer".to_string(),
        role: Role::User,
    };
    let (r1, r2) = tokio::join!(
        env.pool.verify_solution(&caller, c1),
        env.pool.verify_solution(&caller, c2)
    );
    r1.unwrap();
    r2.unwrap();

    let detail = env.pool.get_issue_detail(id.parse().unwrap()).await.unwrap();
    let verified = detail
        .comments
        .iter()
        .filter(|c| c.is_verified_solution)
        .count();
    assert_eq!(verified, 1);
    assert_eq!(detail.issue.status, "resolved");
}

#[actix_rt::test]
async fn test_verify_unknown_comment() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;

    let (status, body) = send(
        &app,
        with_token(
            test::TestRequest::post().uri(&format!("/api/v1/comments/{}/verify", Uuid::now_v7())),
            &token,
        ),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[actix_rt::test]
async fn test_comment_votes_accumulate() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;
    let issue = create_issue(&app, &token, issue_body("Votes", PARSABLE_PATH)).await;
    let comment = create_comment(&app, &token, issue["id"].as_str().unwrap(), "vote me").await;
    let comment_id = comment["id"].as_str().unwrap();

    let mut last = serde_json::Value::Null;
    for direction in ["downvote", "upvote", "downvote", "downvote"] {
        let (status, body) = send(
            &app,
            with_token(
                test::TestRequest::post()
                    .uri(&format!("/api/v1/comments/{}/{}", comment_id, direction)),
                &token,
            ),
        )
        .await;
        assert_eq!(status, 200);
        last = body;
    }

    assert_eq!(last["upvotes"], 1);
    assert_eq!(last["downvotes"], 3);
    assert_eq!(last["score"], -2);
}

/// Deleting the verified comment leaves the issue status alone.
#[actix_rt::test]
async fn test_delete_verified_comment_keeps_status() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let admin = admin_token(&app, "root").await;
    let issue = create_issue(&app, &admin, issue_body("Keep", PARSABLE_PATH)).await;
    let id = issue["id"].as_str().unwrap();
    let comment = create_comment(&app, &admin, id, "the fix").await;
    let comment_id = comment["id"].as_str().unwrap();

    send(
        &app,
        with_token(
            test::TestRequest::post().uri(&format!("/api/v1/comments/{}/verify", comment_id)),
            &admin,
        ),
    )
    .await;

    let (status, _) = send(
        &app,
        with_token(
            test::TestRequest::delete().uri(&format!("/api/v1/admin/comments/{}", comment_id)),
            &admin,
        ),
    )
    .await;
    assert_eq!(status, 200);

    let (_, detail) = send(&app, test::TestRequest::get().uri(&format!("/api/v1/issues/{}", id))).await;
    assert_eq!(detail["status"], "resolved");
    assert_eq!(detail["comment_count"], 0);
    assert_eq!(detail["has_verified_solution"], false);
}

/// Concurrent votes on one comment are all applied.
#[actix_rt::test]
async fn test_concurrent_comment_votes_all_apply() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;
    let issue = create_issue(&app, &token, issue_body("Busy thread", PARSABLE_PATH)).await;
    let comment = create_comment(&app, &token, issue["id"].as_str().unwrap(), "popular").await;
    let id: Uuid = comment["id"].as_str().unwrap().parse().unwrap();

    let caller = Caller {
        user_id: None,
        username: "voter".to_string(),
        role: Role::User,
    };
    let votes = (0..12).map(|i| {
        let direction = if i < 4 { VoteDirection::Down } else { VoteDirection::Up };
        env.pool.vote_comment(&caller, id, direction)
    });
    let results = join_all(votes).await;
    assert!(results.iter().all(|r| r.is_ok()));

    let comments = env.pool.list_comments(issue["id"].as_str().unwrap().parse().unwrap()).await.unwrap();
    assert_eq!(comments[0].upvotes, 8);
    assert_eq!(comments[0].downvotes, 4);
    assert_eq!(comments[0].score, 4);
}
