use axum::extract::FromRef;

use crate::board::BoardState;
use crate::media::{BlobRegistry, MediaLibrary};
use std::sync::Arc;
use std::time::Instant;

use super::session::SessionManager;
use super::ServerConfig;

pub type GuardedBoardState = Arc<BoardState>;
pub type GuardedMediaLibrary = Arc<MediaLibrary>;
pub type GuardedBlobRegistry = Arc<BlobRegistry>;
pub type GuardedSessionManager = Arc<SessionManager>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub board: GuardedBoardState,
    pub media: GuardedMediaLibrary,
    pub blobs: GuardedBlobRegistry,
    pub sessions: GuardedSessionManager,
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedBoardState {
    fn from_ref(input: &ServerState) -> Self {
        input.board.clone()
    }
}

impl FromRef<ServerState> for GuardedMediaLibrary {
    fn from_ref(input: &ServerState) -> Self {
        input.media.clone()
    }
}

impl FromRef<ServerState> for GuardedBlobRegistry {
    fn from_ref(input: &ServerState) -> Self {
        input.blobs.clone()
    }
}

impl FromRef<ServerState> for GuardedSessionManager {
    fn from_ref(input: &ServerState) -> Self {
        input.sessions.clone()
    }
}
