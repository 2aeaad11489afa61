//! HTTP client for end-to-end tests
//!
//! This module wraps reqwest and provides methods for all soundboard
//! endpoints. When API routes or request formats change, update only this
//! file.

use super::constants::*;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates a client with a fresh session and edit mode off
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true) // Automatically handle session cookies
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client whose session is already in edit mode
    ///
    /// # Panics
    ///
    /// Panics if unlocking edit mode fails (indicates test infrastructure problem).
    pub async fn editor(base_url: String) -> Self {
        let client = Self::new(base_url);

        let response = client.toggle_edit_mode(Some(EDIT_PASSWORD)).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "Unlocking edit mode failed: {:?}",
            response.text().await
        );

        client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // Media Endpoints
    // ========================================================================

    pub async fn list_sounds(&self) -> Response {
        self.client
            .get(self.url("/api/sounds"))
            .send()
            .await
            .expect("List sounds request failed")
    }

    pub async fn upload_sound(&self, file_name: &str, bytes: &[u8], label: Option<&str>) -> Response {
        self.client
            .post(self.url("/api/upload-sound"))
            .multipart(upload_form(file_name, bytes, label))
            .send()
            .await
            .expect("Upload request failed")
    }

    pub async fn upload_form_without_file(&self, path: &str) -> Response {
        self.client
            .post(self.url(path))
            .multipart(Form::new().text("label", "Lonely label"))
            .send()
            .await
            .expect("Upload request failed")
    }

    pub async fn get_path(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    // ========================================================================
    // Board Endpoints
    // ========================================================================

    pub async fn get_board(&self, query: &str) -> Response {
        self.client
            .get(self.url(&format!("/api/board{}", query)))
            .send()
            .await
            .expect("Get board request failed")
    }

    /// Fetches the unfiltered board and returns its sections.
    pub async fn board_sections(&self) -> Vec<Value> {
        let response = self.get_board("").await;
        assert!(response.status().is_success());
        let body: Value = response.json().await.expect("Board is not JSON");
        body["sections"]
            .as_array()
            .expect("Board has no sections array")
            .clone()
    }

    pub async fn reload_board(&self) -> Response {
        self.client
            .post(self.url("/api/board/reload"))
            .send()
            .await
            .expect("Reload request failed")
    }

    pub async fn add_section(&self) -> Response {
        self.client
            .post(self.url("/api/board/sections"))
            .send()
            .await
            .expect("Add section request failed")
    }

    pub async fn remove_section(&self, section_id: &str) -> Response {
        self.client
            .delete(self.url(&format!("/api/board/sections/{}", section_id)))
            .send()
            .await
            .expect("Remove section request failed")
    }

    pub async fn set_section_title(&self, section_id: &str, title: &str) -> Response {
        self.client
            .put(self.url(&format!("/api/board/sections/{}/title", section_id)))
            .json(&json!({ "title": title }))
            .send()
            .await
            .expect("Set title request failed")
    }

    pub async fn add_sound(&self, section_id: &str) -> Response {
        self.client
            .post(self.url(&format!("/api/board/sections/{}/sounds", section_id)))
            .send()
            .await
            .expect("Add sound request failed")
    }

    pub async fn set_sound_label(&self, section_id: &str, sound_id: &str, label: &str) -> Response {
        self.client
            .put(self.url(&sound_path(section_id, sound_id, "label")))
            .json(&json!({ "label": label }))
            .send()
            .await
            .expect("Set label request failed")
    }

    pub async fn set_sound_audio(&self, section_id: &str, sound_id: &str, url: &str) -> Response {
        self.client
            .put(self.url(&sound_path(section_id, sound_id, "audio")))
            .json(&json!({ "url": url }))
            .send()
            .await
            .expect("Set audio request failed")
    }

    pub async fn upload_sound_audio(
        &self,
        section_id: &str,
        sound_id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Response {
        self.client
            .post(self.url(&sound_path(section_id, sound_id, "audio")))
            .multipart(upload_form(file_name, bytes, None))
            .send()
            .await
            .expect("Upload audio request failed")
    }

    pub async fn patch_sound_meta(&self, section_id: &str, sound_id: &str, meta: Value) -> Response {
        self.client
            .patch(self.url(&sound_path(section_id, sound_id, "meta")))
            .json(&meta)
            .send()
            .await
            .expect("Patch meta request failed")
    }

    // ========================================================================
    // Session & Edit Mode Endpoints
    // ========================================================================

    pub async fn get_session(&self) -> Response {
        self.client
            .get(self.url("/api/session"))
            .send()
            .await
            .expect("Get session request failed")
    }

    pub async fn delete_session(&self) -> Response {
        self.client
            .delete(self.url("/api/session"))
            .send()
            .await
            .expect("Delete session request failed")
    }

    pub async fn toggle_edit_mode(&self, password: Option<&str>) -> Response {
        let request = self.client.post(self.url("/api/edit-mode/toggle"));
        let request = match password {
            Some(password) => request.json(&json!({ "password": password })),
            None => request,
        };
        request.send().await.expect("Toggle request failed")
    }

    // ========================================================================
    // Panel Endpoints
    // ========================================================================

    pub async fn get_panel(&self) -> Response {
        self.client
            .get(self.url("/api/panel"))
            .send()
            .await
            .expect("Get panel request failed")
    }

    pub async fn play(&self, sound_id: &str) -> Response {
        self.client
            .post(self.url("/api/panel/play"))
            .json(&json!({ "soundId": sound_id }))
            .send()
            .await
            .expect("Play request failed")
    }

    pub async fn playback_ended(&self, sound_id: &str) -> Response {
        self.client
            .post(self.url("/api/panel/ended"))
            .json(&json!({ "soundId": sound_id }))
            .send()
            .await
            .expect("Ended request failed")
    }

    /// Posts one of the bodiless panel events: hover-enter, hover-leave,
    /// click or close.
    pub async fn panel_event(&self, event: &str) -> Response {
        self.client
            .post(self.url(&format!("/api/panel/{}", event)))
            .send()
            .await
            .expect("Panel event request failed")
    }
}

fn sound_path(section_id: &str, sound_id: &str, leaf: &str) -> String {
    format!(
        "/api/board/sections/{}/sounds/{}/{}",
        section_id, sound_id, leaf
    )
}

fn upload_form(file_name: &str, bytes: &[u8], label: Option<&str>) -> Form {
    let part = Part::bytes(bytes.to_vec())
        .file_name(file_name.to_string())
        .mime_str("audio/mpeg")
        .expect("Invalid mime type");
    let form = Form::new().part("file", part);
    match label {
        Some(label) => form.text("label", label.to_string()),
        None => form,
    }
}
