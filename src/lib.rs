//! Soundboard server library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod board;
pub mod config;
pub mod edit_gate;
pub mod media;
pub mod panel;
pub mod remote_store;
pub mod server;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use board::{BoardState, LoadOutcome};
pub use remote_store::{RemoteStore, RestRemoteStore, SqliteRemoteStore};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
