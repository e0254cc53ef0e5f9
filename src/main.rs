//! obs-mcp: MCP server for AI-assisted OBS Studio control
//!
//! This tool lets AI assistants switch scenes, start and stop streams and
//! recordings, and arrange sources in OBS Studio through obs-websocket.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use obs_mcp::bridge::{CommandBridge, ConnectionManager};
use obs_mcp::config::{self, Config, LoggingConfig};
use obs_mcp::mcp::server::McpServer;
use obs_mcp::obs::WebSocketConnector;

/// MCP server for AI-assisted OBS Studio control.
///
/// Exposes scene, stream, recording and source tools backed by the
/// obs-websocket v5 protocol.
#[derive(Parser, Debug)]
#[command(name = "obs-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// obs-websocket host (overrides the config file)
    #[arg(long, env = "OBS_HOST")]
    host: Option<String>,

    /// obs-websocket port (overrides the config file)
    #[arg(long, env = "OBS_PORT")]
    port: Option<u16>,

    /// obs-websocket password (overrides the config file)
    #[arg(long, env = "OBS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    /// Applies command-line and environment overrides on top of the file.
    fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(host) = &self.host {
            cfg.obs.host.clone_from(host);
        }
        if let Some(port) = self.port {
            cfg.obs.port = port;
        }
        if let Some(password) = &self.password {
            cfg.obs.password = Some(password.clone());
        }
    }
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN,
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber.
///
/// stdout carries MCP messages, so logs go to stderr or to the configured file.
fn init_tracing(level: Level, logging: &LoggingConfig) -> std::io::Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(level.into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }

    Ok(())
}

/// Entry point for the obs-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let config_path = args.config.as_deref();
    let mut cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    args.apply_overrides(&mut cfg);
    if let Err(e) = cfg.validate() {
        eprintln!("Configuration error: {e}");
        return ExitCode::FAILURE;
    }

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    if let Err(e) = init_tracing(log_level, &cfg.logging) {
        eprintln!("Failed to open log file: {e}");
        return ExitCode::FAILURE;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting obs-mcp server"
    );
    info!(obs = ?cfg.obs, "OBS endpoint configured");

    let connections = ConnectionManager::new(WebSocketConnector, cfg.obs);
    let mut server = McpServer::new(CommandBridge::new(connections));

    info!("MCP server ready, waiting for client connection...");

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(server.run()) {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
