//! Listing, uploading and serving audio files.

use super::state::{GuardedBlobRegistry, GuardedMediaLibrary, ServerState};
use crate::media::{MediaError, MediaItem, UploadedAudio};

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, warn};

pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

#[derive(Serialize)]
struct MediaListResponse {
    items: Vec<MediaItem>,
}

pub(super) fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Reads the `file` and `label` fields of an upload form.
/// Returns `None` when no file was sent.
pub(super) async fn read_upload_form(
    mut multipart: Multipart,
) -> Result<Option<UploadedAudio>, MultipartError> {
    let mut file = None;
    let mut label = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            Some("label") => {
                label = Some(field.text().await?).filter(|label| !label.is_empty());
            }
            other => debug!("Ignoring upload form field {:?}", other),
        }
    }

    Ok(file.map(|(file_name, content_type, bytes)| UploadedAudio {
        file_name,
        label,
        content_type,
        bytes,
    }))
}

async fn list_sounds(State(media): State<GuardedMediaLibrary>) -> Json<MediaListResponse> {
    Json(MediaListResponse {
        items: media.list_or_empty().await,
    })
}

async fn upload_sound(State(media): State<GuardedMediaLibrary>, multipart: Multipart) -> Response {
    let upload = match read_upload_form(multipart).await {
        Ok(Some(upload)) => upload,
        Ok(None) => return json_error(StatusCode::BAD_REQUEST, "No file provided"),
        Err(err) => {
            warn!("Could not read upload form: {}", err);
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save file");
        }
    };

    match media
        .save_upload(
            upload.file_name.as_deref(),
            upload.label.as_deref(),
            &upload.bytes,
        )
        .await
    {
        Ok(item) => Json(item).into_response(),
        Err(err) => {
            error!("Failed to save upload: {:?}", err);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save file")
        }
    }
}

async fn serve_sound(State(media): State<GuardedMediaLibrary>, Path(path): Path<String>) -> Response {
    match media.read(&path).await {
        Ok((bytes, content_type)) => (
            [
                (header::CONTENT_TYPE, content_type),
                (header::CACHE_CONTROL, IMMUTABLE_CACHE_CONTROL),
            ],
            bytes,
        )
            .into_response(),
        Err(MediaError::Forbidden) => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

async fn serve_blob(State(blobs): State<GuardedBlobRegistry>, Path(id): Path<String>) -> Response {
    match blobs.get(&id) {
        Some(blob) => (
            [
                (header::CONTENT_TYPE, blob.content_type),
                (header::CACHE_CONTROL, "no-store".to_string()),
            ],
            blob.bytes,
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub fn make_media_routes(state: ServerState) -> Router {
    Router::new()
        .route("/api/sounds", get(list_sounds))
        .route("/api/upload-sound", post(upload_sound))
        .route("/sounds/{*path}", get(serve_sound))
        .route("/blobs/{id}", get(serve_blob))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::server::tests::test_app;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn served_sounds_are_immutable() {
        let app = test_app().await;
        tokio::fs::write(app.media_dir.path().join("beep.wav"), b"RIFF")
            .await
            .unwrap();

        let request = Request::builder()
            .uri("/sounds/beep.wav")
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/wav");
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            IMMUTABLE_CACHE_CONTROL
        );
    }

    #[tokio::test]
    async fn traversal_is_forbidden_and_missing_is_not_found() {
        let app = test_app().await;

        let request = Request::builder()
            .uri("/sounds/a/..%2F..%2Fsecret.mp3")
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let request = Request::builder()
            .uri("/sounds/missing.mp3")
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_blob_is_not_found() {
        let app = test_app().await;
        let request = Request::builder()
            .uri("/blobs/nope")
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
