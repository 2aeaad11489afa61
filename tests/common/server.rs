//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own board database and media
//! directory.

use super::constants::*;
use super::fixtures::{create_test_db_dir, create_test_media};
use soundboard_server::board::{BoardState, LoadOutcome};
use soundboard_server::edit_gate::EditSecret;
use soundboard_server::media::MediaLibrary;
use soundboard_server::panel::PanelConfig;
use soundboard_server::remote_store::{RemoteStore, RestRemoteStore, SqliteRemoteStore};
use soundboard_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with isolated board and media
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Board state for direct inspection in tests
    pub board: Arc<BoardState>,

    /// What the initial board load did
    pub load_outcome: LoadOutcome,

    /// Media directory served under /sounds
    pub media_path: PathBuf,

    /// Path of the SQLite board database
    pub db_path: PathBuf,

    // Private fields - keep resources alive until drop
    _temp_media_dir: TempDir,
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server backed by a fresh SQLite board database.
    ///
    /// # Panics
    ///
    /// Panics if fixture creation, port binding or server startup fails.
    pub async fn spawn() -> Self {
        let (temp_db_dir, db_path) =
            create_test_db_dir().expect("Failed to create test db dir");
        let store: Arc<dyn RemoteStore> =
            Arc::new(SqliteRemoteStore::new(&db_path).expect("Failed to open board store"));
        Self::spawn_with_store(store, temp_db_dir, db_path).await
    }

    /// Spawns a server whose board store points at a port nothing listens
    /// on, so every store call fails.
    pub async fn spawn_with_unreachable_store() -> Self {
        let (temp_db_dir, db_path) =
            create_test_db_dir().expect("Failed to create test db dir");
        let unused_port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let store: Arc<dyn RemoteStore> = Arc::new(
            RestRemoteStore::new(format!("http://127.0.0.1:{}", unused_port), None, 1)
                .expect("Failed to build rest store"),
        );
        Self::spawn_with_store(store, temp_db_dir, db_path).await
    }

    async fn spawn_with_store(
        store: Arc<dyn RemoteStore>,
        temp_db_dir: TempDir,
        db_path: PathBuf,
    ) -> Self {
        let (temp_media_dir, media_path) =
            create_test_media().expect("Failed to create test media");
        let media = MediaLibrary::new(&media_path);

        let board = Arc::new(BoardState::new(store, media.clone()));
        let load_outcome = board.load_board().await;

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            max_inline_audio_bytes: 64,
            panel: PanelConfig {
                hide_delay: Duration::from_millis(TEST_HIDE_DELAY_MS),
                default_show_url: Some("https://example.org/show".to_string()),
            },
            ..Default::default()
        };
        let secret = Arc::new(EditSecret::new(EDIT_PASSWORD).expect("Failed to hash password"));

        let app = make_app(config, board.clone(), media, Some(secret)).expect("Failed to build app");

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            board,
            load_outcome,
            media_path,
            db_path,
            _temp_media_dir: temp_media_dir,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Send shutdown signal
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
        // TempDir will be cleaned up automatically
    }
}
