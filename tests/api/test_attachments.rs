//! Multipart submissions and attachment downloads.

use actix_web::test;
use serde_json::Value;

use super::test_helpers::*;

const BOUNDARY: &str = "----triage-test-boundary";

/// Build a `multipart/form-data` body from text fields and `(name, filename, bytes)` files.
fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    for (name, filename, data) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: text/plain\r\n\r\n",
                BOUNDARY, name, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_request(uri: &str, body: Vec<u8>) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .insert_header((
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(body)
}

#[actix_rt::test]
async fn test_multipart_issue_with_attachment() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;

    let body = multipart_body(
        &[
            ("testcase_title", "Crash on export"),
            ("testcase_path", PARSABLE_PATH),
            ("severity", "Critical"),
            ("description", "Segfault in exporter"),
            ("reporter_name", "alice"),
            ("tags", "crash"),
            ("tags", "export"),
        ],
        &[("files", "crash log (1).txt", &b"stack trace here"[..])],
    );
    let (status, issue) = send(&app, with_token(multipart_request("/api/v1/issues", body), &token)).await;
    assert_eq!(status, 201, "{}", issue);
    assert_eq!(issue["tags"], serde_json::json!(["crash", "export"]));

    let id = issue["id"].as_str().unwrap();
    let (_, detail) = send(&app, test::TestRequest::get().uri(&format!("/api/v1/issues/{}", id))).await;
    let attachments = detail["attachments"].as_array().unwrap();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0]["filename"], "crash log (1).txt");
    assert_eq!(attachments[0]["file_size"], 16);
    assert_eq!(attachments[0]["uploaded_by"], "alice");
    assert!(attachments[0]["comment_id"].is_null());

    let url = attachments[0]["download_url"].as_str().unwrap();
    let resp = test::call_service(&app, test::TestRequest::get().uri(url).to_request()).await;
    assert_eq!(resp.status().as_u16(), 200);
    let disposition = resp
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(
        disposition,
        "attachment; filename*=UTF-8''crash%20log%20%281%29.txt"
    );
    let bytes = test::read_body(resp).await;
    assert_eq!(&bytes[..], b"stack trace here");
}

#[actix_rt::test]
async fn test_multipart_comment_attachment_grouped_under_comment() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;
    let issue = create_issue(&app, &token, issue_body("Grouping", PARSABLE_PATH)).await;
    let id = issue["id"].as_str().unwrap();

    let body = multipart_body(
        &[("commenter_name", "bob"), ("content", "log attached")],
        &[("files", "run.log", &b"line 1\nline 2\n"[..])],
    );
    let (status, comment) = send(
        &app,
        with_token(
            multipart_request(&format!("/api/v1/issues/{}/comments", id), body),
            &token,
        ),
    )
    .await;
    assert_eq!(status, 201, "{}", comment);
    assert_eq!(comment["attachments"][0]["filename"], "run.log");
    assert_eq!(comment["attachments"][0]["uploaded_by"], "bob");

    let (_, detail) = send(&app, test::TestRequest::get().uri(&format!("/api/v1/issues/{}", id))).await;
    assert_eq!(detail["attachments"], Value::Array(vec![]));
    assert_eq!(detail["comments"][0]["attachments"].as_array().unwrap().len(), 1);
}

#[actix_rt::test]
async fn test_multipart_validation_failure_keeps_no_blob() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;

    let body = multipart_body(
        &[("testcase_title", "Missing most fields")],
        &[("files", "orphan.txt", &b"nobody owns me"[..])],
    );
    let (status, body) = send(&app, with_token(multipart_request("/api/v1/issues", body), &token)).await;
    assert_eq!(status, 400);
    assert!(body["message"].as_str().unwrap().contains("testcase_path"));

    let (_, list) = send(&app, test::TestRequest::get().uri("/api/v1/issues")).await;
    assert_eq!(list["total"], 0);
}

#[actix_rt::test]
async fn test_upload_limit() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let (token, _) = register_and_login(&app, "alice").await;

    let oversized = vec![b'x'; env.config.max_upload_size + 1];
    let body = multipart_body(
        &[
            ("testcase_title", "Big"),
            ("testcase_path", PARSABLE_PATH),
            ("severity", "Low"),
            ("description", "Too big"),
            ("reporter_name", "alice"),
        ],
        &[("files", "big.bin", oversized.as_slice())],
    );
    let (status, body) = send(&app, with_token(multipart_request("/api/v1/issues", body), &token)).await;
    assert_eq!(status, 400);
    assert!(body["message"].as_str().unwrap().contains("upload limit"));
}

#[actix_rt::test]
async fn test_download_unknown_attachment() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;

    let (status, body) = send(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/attachments/{}", uuid::Uuid::now_v7())),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "NOT_FOUND");
}
