//! End-to-end tests against a spawned server on 127.0.0.1:0, exercising the
//! public HTTP surface with a real client.

use reqwest::multipart::{Form, Part};
use reqwest::{redirect, Client, StatusCode};
use serde_json::Value;
use tempshare_server::test_helpers::{spawn_test_server, TEST_CRON_SECRET};

fn client() -> Client {
    Client::builder()
        .redirect(redirect::Policy::none())
        .build()
        .unwrap()
}

fn file_part(name: &str, content_type: &str, data: Vec<u8>) -> Part {
    Part::bytes(data)
        .file_name(name.to_string())
        .mime_str(content_type)
        .unwrap()
}

#[tokio::test]
async fn health_check() {
    let server = spawn_test_server().await;
    let resp = client()
        .get(format!("{}/api/health", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn upload_then_download_round_trip() {
    let server = spawn_test_server().await;
    let http = client();
    let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();

    let form = Form::new()
        .part("file", file_part("data set.bin", "application/octet-stream", data.clone()))
        .part("file", file_part("setup.exe", "application/x-msdownload", b"MZ".to_vec()));
    let resp = http
        .post(format!("{}/upload", server.base_url))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[1]["error"], "File type not allowed for security reasons");
    let access_id = files[0]["accessId"].as_str().unwrap().to_string();

    let info: Value = http
        .get(format!("{}/file/{access_id}", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(info["fileName"], "data set.bin");
    assert_eq!(info["fileSize"], 200_000);

    let resp = http
        .get(format!("{}/download/{access_id}", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.content_length(), Some(200_000));
    assert_eq!(
        resp.headers()["content-disposition"],
        "attachment; filename=\"data%20set.bin\""
    );
    let downloaded = resp.bytes().await.unwrap();
    assert_eq!(downloaded.as_ref(), data.as_slice());
}

#[tokio::test]
async fn cleanup_requires_bearer() {
    let server = spawn_test_server().await;
    let http = client();
    let url = format!("{}/cron/cleanup", server.base_url);

    let resp = http.get(&url).bearer_auth("nope").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = http
        .get(&url)
        .bearer_auth(TEST_CRON_SECRET)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["results"]["total"], 0);
}

#[tokio::test]
async fn unknown_file_page_redirects_to_expired() {
    let server = spawn_test_server().await;
    let resp = client()
        .get(format!("{}/f/doesnotexist0001", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_redirection());
    assert_eq!(resp.headers()["location"], "/expired");
}
