use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use soundboard_server::board::BoardState;
use soundboard_server::config;
use soundboard_server::edit_gate::EditSecret;
use soundboard_server::media::MediaLibrary;
use soundboard_server::panel::PanelConfig;
use soundboard_server::remote_store::{RemoteStore, RestRemoteStore, SqliteRemoteStore};
use soundboard_server::server::{run_server, RequestsLoggingLevel, ServerConfig};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

fn parse_dir(s: &str) -> Result<PathBuf, String> {
    let path = parse_path(s)?;
    if !path.exists() {
        return Err(format!("Directory does not exist: {}", s));
    }
    if !path.is_dir() {
        return Err(format!("Path is not a directory: {}", s));
    }
    Ok(path)
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding board.db. Can also be specified in config file.
    #[clap(long, value_parser = parse_dir)]
    pub db_dir: Option<PathBuf>,

    /// Directory of uploaded and served audio files. Defaults to <db-dir>/sounds.
    #[clap(long, value_parser = parse_path)]
    pub media_path: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Password unlocking edit mode. Edit mode is disabled without one.
    #[clap(long, env = "EDIT_PASSWORD", hide_env_values = true)]
    pub edit_password: Option<String>,

    /// Delay before the now-playing panel hides after playback ends.
    #[clap(long, default_value_t = soundboard_server::panel::DEFAULT_HIDE_DELAY_MS)]
    pub hide_delay_ms: u64,
}

impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_dir: args.db_dir.clone(),
            media_path: args.media_path.clone(),
            port: args.port,
            logging_level: args.logging_level.clone(),
            frontend_dir_path: args.frontend_dir_path.clone(),
            edit_password: args.edit_password.clone(),
            hide_delay_ms: args.hide_delay_ms,
        }
    }
}

fn make_remote_store(app_config: &config::AppConfig) -> Result<Arc<dyn RemoteStore>> {
    match &app_config.remote {
        Some(remote) => {
            info!("Using remote board store at {}", remote.url);
            Ok(Arc::new(RestRemoteStore::new(
                remote.url.clone(),
                remote.api_key.clone(),
                remote.timeout_sec,
            )?))
        }
        None => {
            if !app_config.board_db_path().exists() {
                info!(
                    "Creating new board database at {:?}",
                    app_config.board_db_path()
                );
            }
            Ok(Arc::new(SqliteRemoteStore::new(app_config.board_db_path())?))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  db_dir: {:?}", app_config.db_dir);
    info!("  media_path: {:?}", app_config.media_path);
    info!("  port: {}", app_config.port);

    let edit_secret = match &app_config.edit_password {
        Some(password) => Some(Arc::new(EditSecret::new(password)?)),
        None => {
            warn!("No edit password configured, edit mode is disabled");
            None
        }
    };

    let media = MediaLibrary::new(&app_config.media_path);
    let store = make_remote_store(&app_config)?;
    let board = Arc::new(BoardState::new(store, media.clone()));

    let outcome = board.load_board().await;
    info!(
        "Board loaded ({:?}) with {} sections",
        outcome,
        board.sections().len()
    );

    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        port: app_config.port,
        frontend_dir_path: app_config.frontend_dir_path.clone(),
        max_upload_bytes: app_config.max_upload_bytes,
        max_inline_audio_bytes: app_config.max_inline_audio_bytes,
        session_idle_timeout: Duration::from_secs(app_config.session_idle_timeout_mins * 60),
        panel: PanelConfig {
            hide_delay: Duration::from_millis(app_config.hide_delay_ms),
            default_show_url: app_config.show_url.clone(),
        },
        ..Default::default()
    };

    info!("Ready to serve at port {}!", app_config.port);

    let result = tokio::select! {
        result = run_server(server_config, board.clone(), media, edit_secret) => {
            info!("HTTP server stopped: {:?}", result);
            result
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, initiating graceful shutdown");
            Ok(())
        }
    };

    info!("Waiting for pending board writes...");
    board.flush().await;
    result
}
