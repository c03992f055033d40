//! CHESSMAXER analysis server.
//!
//! Starts the engine pool, then serves the JSON API until Ctrl-C.

use std::path::PathBuf;

use anyhow::Context;
use chessmaxer_server::api::{self, AppState};
use chessmaxer_server::config::ServerConfig;
use chessmaxer_server::lifecycle;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;

/// JSON API over a UCI chess engine.
#[derive(Parser)]
#[command(name = "chessmaxer-server")]
#[command(about = "Serves chess move analysis from a UCI engine over HTTP")]
struct Args {
    /// Path to a TOML config file (default: chessmaxer.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Interface to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to bind
    #[arg(long)]
    port: Option<u16>,

    /// Engine executable, path or name on PATH
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Number of engine processes
    #[arg(long)]
    pool_size: Option<usize>,
}

impl Args {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(engine) = self.engine {
            config.engine.path = engine;
        }
        if let Some(pool_size) = self.pool_size {
            config.engine.pool_size = pool_size;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut config = ServerConfig::load(args.config.as_deref()).context("Failed to load config")?;
    args.apply(&mut config);

    tracing::info!("Engine: {}", config.engine.path.display());
    tracing::info!("Engine pool size: {}", config.engine.pool_size);

    let engine_config = config.engine.clone();
    let adapter = tokio::task::spawn_blocking(move || lifecycle::start(&engine_config))
        .await
        .context("Engine startup task failed")?;
    if !adapter.is_available() {
        tracing::warn!("Serving without an engine; analysis endpoints will answer 503");
    }

    let app = api::router(AppState::new(adapter));

    let listener = bind(&config).await?;
    let addr = listener.local_addr().context("Listener has no local address")?;
    tracing::info!("Server running on http://{}", addr);
    tracing::info!("Frontend should connect to: http://{}/api/move", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Bind the configured host, which may be a name such as `localhost`.
async fn bind(config: &ServerConfig) -> anyhow::Result<TcpListener> {
    TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind to {}:{}", config.host, config.port))
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl+c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = Args::parse_from([
            "chessmaxer-server",
            "--port",
            "8080",
            "--engine",
            "/opt/stockfish",
            "--pool-size",
            "2",
        ]);
        let mut config = ServerConfig::default();
        args.apply(&mut config);

        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.engine.path, PathBuf::from("/opt/stockfish"));
        assert_eq!(config.engine.pool_size, 2);
    }

    #[test]
    fn no_flags_keep_config() {
        let args = Args::parse_from(["chessmaxer-server"]);
        let mut config = ServerConfig::default();
        args.apply(&mut config);

        assert_eq!(config.port, 5000);
        assert_eq!(config.engine.path, PathBuf::from("stockfish"));
    }

    #[tokio::test]
    async fn binds_host_names() {
        let config = ServerConfig {
            host: "localhost".to_string(),
            port: 0,
            ..ServerConfig::default()
        };
        let listener = bind(&config).await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }
}
