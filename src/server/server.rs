use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use crate::board::BoardState;
use crate::edit_gate::EditSecret;
use crate::media::{BlobRegistry, MediaLibrary};
use tower_http::services::ServeDir;

use axum::{
    extract::{DefaultBodyLimit, State},
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::board_routes::make_board_routes;
use super::media_routes::make_media_routes;
use super::panel_routes::make_panel_routes;
use super::session::{spawn_session_pruner, SessionManager};
use super::{log_requests, state::*, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: String,
    pub sections: usize,
    pub sounds: usize,
    pub sessions: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let sections = state.board.sections();
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sections: sections.len(),
        sounds: sections.iter().map(|section| section.sounds.len()).sum(),
        sessions: state.sessions.len(),
    };
    Json(stats)
}

pub fn make_app(
    config: ServerConfig,
    board: GuardedBoardState,
    media: MediaLibrary,
    edit_secret: Option<Arc<EditSecret>>,
) -> Result<Router> {
    let sessions = Arc::new(
        SessionManager::new(edit_secret, config.panel.clone())
            .with_max_sessions(config.max_sessions),
    );
    spawn_session_pruner(&sessions, config.session_idle_timeout);

    let state = ServerState {
        config: config.clone(),
        start_time: Instant::now(),
        board,
        media: Arc::new(media),
        blobs: Arc::new(BlobRegistry::new(config.max_blob_store_bytes)),
        sessions,
    };

    let home_router: Router = match &config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let app: Router = home_router
        .merge(make_media_routes(state.clone()))
        .merge(make_board_routes(state.clone()))
        .merge(make_panel_routes(state.clone()))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

/// Serves until the listener fails. Shutdown is driven by the caller.
pub async fn run_server(
    config: ServerConfig,
    board: Arc<BoardState>,
    media: MediaLibrary,
    edit_secret: Option<Arc<EditSecret>>,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, board, media, edit_secret)?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on {}", listener.local_addr()?);

    Ok(axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?)
}
