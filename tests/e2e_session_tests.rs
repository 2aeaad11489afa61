//! End-to-end tests for sessions and the edit-mode password gate

mod common;

use common::*;
use reqwest::StatusCode;
use serde_json::Value;
use soundboard_server::server::EDIT_TOGGLE_PER_MINUTE;

async fn edit_mode_of(response: reqwest::Response) -> bool {
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    body["editMode"].as_bool().unwrap()
}

#[tokio::test]
async fn test_first_request_sets_session_cookie() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/session", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response.headers()["set-cookie"].to_str().unwrap().to_string();
    assert!(cookie.starts_with("board_session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("SameSite=Lax"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["editMode"], false);
    assert_eq!(body["editEnabled"], true);
    assert_eq!(body["panel"]["state"], "hidden");
}

#[tokio::test]
async fn test_known_session_gets_no_new_cookie() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let first = client.get_session().await;
    assert!(first.headers().get("set-cookie").is_some());
    let second = client.get_session().await;
    assert!(second.headers().get("set-cookie").is_none());
}

#[tokio::test]
async fn test_toggle_requires_the_right_password() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.toggle_edit_mode(None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client.toggle_edit_mode(Some("wrong")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Incorrect password");

    let body: Value = client.get_session().await.json().await.unwrap();
    assert_eq!(body["editMode"], false);
    assert_eq!(body["authorized"], false);

    assert!(edit_mode_of(client.toggle_edit_mode(Some(EDIT_PASSWORD)).await).await);
}

#[tokio::test]
async fn test_authorization_is_cached_for_the_session() {
    let server = TestServer::spawn().await;
    let client = TestClient::editor(server.base_url.clone()).await;

    assert!(!edit_mode_of(client.toggle_edit_mode(None).await).await);
    assert!(edit_mode_of(client.toggle_edit_mode(None).await).await);

    let body: Value = client.get_session().await.json().await.unwrap();
    assert_eq!(body["editMode"], true);
    assert_eq!(body["authorized"], true);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let server = TestServer::spawn().await;
    let editor = TestClient::editor(server.base_url.clone()).await;
    let visitor = TestClient::new(server.base_url.clone());

    assert_eq!(editor.add_section().await.status(), StatusCode::CREATED);
    assert_eq!(visitor.add_section().await.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_deleting_session_drops_edit_mode() {
    let server = TestServer::spawn().await;
    let client = TestClient::editor(server.base_url.clone()).await;

    let response = client.delete_session().await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookie = response.headers()["set-cookie"].to_str().unwrap();
    assert!(cookie.starts_with("board_session=;"));

    let body: Value = client.get_session().await.json().await.unwrap();
    assert_eq!(body["editMode"], false);
    assert_eq!(body["authorized"], false);
    assert_eq!(client.add_section().await.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_malformed_toggle_body_is_bad_request() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .client
        .post(format!("{}/api/edit-mode/toggle", server.base_url))
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_home_reports_stats() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_path("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let stats: Value = response.json().await.unwrap();
    assert!(stats["uptime"].as_str().unwrap().starts_with("0d "));
    assert_eq!(stats["sections"], 3);
    assert_eq!(stats["sounds"], 17);
}

#[tokio::test]
async fn test_password_guessing_is_throttled_per_ip() {
    let server = TestServer::spawn().await;

    let mut throttled = 0;
    for _ in 0..(EDIT_TOGGLE_PER_MINUTE + 5) {
        // A fresh client per guess, so no session state carries over
        let client = TestClient::new(server.base_url.clone());
        let status = client.toggle_edit_mode(Some("wrong")).await.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            throttled += 1;
        } else {
            assert_eq!(status, StatusCode::FORBIDDEN);
        }
    }
    // Slow hashing may let a slot refill mid-loop
    assert!(throttled >= 3, "only {} guesses were throttled", throttled);
}

#[tokio::test]
async fn test_cookieless_media_requests_create_no_sessions() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for _ in 0..50 {
        let response = client
            .get(format!("{}/sounds/missing.mp3", server.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get("set-cookie").is_none());
    }

    let stats: Value = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["sessions"], 0);
}
