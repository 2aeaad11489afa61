mod board_routes;
pub mod config;
mod http_layers;
mod media_routes;
mod panel_routes;
pub mod server;
pub mod session;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::*;
pub use media_routes::IMMUTABLE_CACHE_CONTROL;
pub use server::{make_app, run_server};
pub use session::{SessionManager, COOKIE_SESSION_KEY};
