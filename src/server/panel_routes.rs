//! Session, edit-mode and now-playing panel endpoints.

use super::media_routes::json_error;
use super::http_layers::{limit_by_ip, IpRateLimiter};
use super::session::{attach_session, expired_session_cookie, CurrentSession};
use super::state::{GuardedBoardState, GuardedSessionManager, ServerState};
use crate::edit_gate::EditGateError;
use crate::panel::{PanelError, PanelView, PlaybackSource};

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

impl IntoResponse for EditGateError {
    fn into_response(self) -> Response {
        let status = match self {
            EditGateError::PasswordRequired => StatusCode::UNAUTHORIZED,
            EditGateError::WrongPassword | EditGateError::Disabled => StatusCode::FORBIDDEN,
        };
        json_error(status, &self.to_string())
    }
}

impl IntoResponse for PanelError {
    fn into_response(self) -> Response {
        json_error(StatusCode::NOT_FOUND, &self.to_string())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionInfo {
    edit_mode: bool,
    authorized: bool,
    edit_enabled: bool,
    panel: PanelView,
}

#[derive(Deserialize, Debug, Default)]
struct ToggleBody {
    password: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ToggleResponse {
    edit_mode: bool,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SoundRef {
    sound_id: String,
}

#[derive(Serialize)]
struct PlayResponse {
    source: PlaybackSource,
    panel: PanelView,
}

#[derive(Serialize)]
struct EndedResponse {
    accepted: bool,
    panel: PanelView,
}

async fn get_session(
    CurrentSession(session): CurrentSession,
    State(sessions): State<GuardedSessionManager>,
) -> Json<SessionInfo> {
    let (edit_mode, authorized) = {
        let gate = session.gate();
        (gate.is_edit_mode(), gate.is_authorized())
    };
    Json(SessionInfo {
        edit_mode,
        authorized,
        edit_enabled: sessions.is_edit_enabled(),
        panel: session.panel.view(),
    })
}

async fn delete_session(
    CurrentSession(session): CurrentSession,
    State(sessions): State<GuardedSessionManager>,
    jar: CookieJar,
) -> Response {
    sessions.remove(&session.id);
    info!("Session {} ended", session.id);
    (jar.add(expired_session_cookie()), StatusCode::NO_CONTENT).into_response()
}

/// The body is optional; leaving edit mode needs no password.
async fn toggle_edit_mode(CurrentSession(session): CurrentSession, body: Bytes) -> Response {
    let body: ToggleBody = if body.is_empty() {
        ToggleBody::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(body) => body,
            Err(err) => {
                debug!("Bad edit mode toggle body: {}", err);
                return json_error(StatusCode::BAD_REQUEST, "Invalid request body");
            }
        }
    };

    let result = session.gate().toggle(body.password.as_deref());
    match result {
        Ok(edit_mode) => Json(ToggleResponse { edit_mode }).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_panel(CurrentSession(session): CurrentSession) -> Json<PanelView> {
    Json(session.panel.view())
}

async fn play(
    CurrentSession(session): CurrentSession,
    State(board): State<GuardedBoardState>,
    Json(body): Json<SoundRef>,
) -> Result<Json<PlayResponse>, PanelError> {
    let source = session.panel.play(&board.sections(), &body.sound_id)?;
    Ok(Json(PlayResponse {
        source,
        panel: session.panel.view(),
    }))
}

async fn playback_ended(
    CurrentSession(session): CurrentSession,
    Json(body): Json<SoundRef>,
) -> Json<EndedResponse> {
    let accepted = session.panel.playback_ended(&body.sound_id);
    Json(EndedResponse {
        accepted,
        panel: session.panel.view(),
    })
}

async fn hover_enter(CurrentSession(session): CurrentSession) -> Json<PanelView> {
    session.panel.hover_enter();
    Json(session.panel.view())
}

async fn hover_leave(CurrentSession(session): CurrentSession) -> Json<PanelView> {
    session.panel.hover_leave();
    Json(session.panel.view())
}

async fn click(CurrentSession(session): CurrentSession) -> Json<PanelView> {
    session.panel.click();
    Json(session.panel.view())
}

async fn close(CurrentSession(session): CurrentSession) -> Json<PanelView> {
    session.panel.close();
    Json(session.panel.view())
}

pub fn make_panel_routes(state: ServerState) -> Router {
    let session_layer = middleware::from_fn_with_state(state.sessions.clone(), attach_session);
    let attempts_limiter = Arc::new(IpRateLimiter::per_minute(
        state.config.edit_attempts_per_minute,
    ));

    // Throttled requests are turned away before a session is created.
    let edit_toggle = Router::new()
        .route("/api/edit-mode/toggle", post(toggle_edit_mode))
        .route_layer(session_layer.clone())
        .route_layer(middleware::from_fn_with_state(attempts_limiter, limit_by_ip));

    Router::new()
        .route("/api/session", get(get_session).delete(delete_session))
        .route("/api/panel", get(get_panel))
        .route("/api/panel/play", post(play))
        .route("/api/panel/ended", post(playback_ended))
        .route("/api/panel/hover-enter", post(hover_enter))
        .route("/api/panel/hover-leave", post(hover_leave))
        .route("/api/panel/click", post(click))
        .route("/api/panel/close", post(close))
        .route_layer(session_layer)
        .merge(edit_toggle)
        .with_state(state)
}
