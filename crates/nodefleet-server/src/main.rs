//! nodefleet control plane server
//!
//! HTTP/JSON API for managing sites, nodes, config versions and deployments,
//! plus the endpoint nodes check in through.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

use nodefleet_core::tracing_init::{LogFormat, init_tracing};
use nodefleet_server::api::{AppState, build_router};
use nodefleet_server::config::{DEFAULT_ADDR, ServerConfig};
use nodefleet_server::storage::Store;

#[derive(Parser, Debug)]
#[command(name = "nodefleet-server")]
#[command(version, about = "nodefleet control plane - site, node and deployment management")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "NODEFLEET_ADDR", default_value = DEFAULT_ADDR)]
    addr: SocketAddr,

    /// Path to SQLite database file [default: ~/.nodefleet/nodefleet.db].
    #[arg(long, env = "NODEFLEET_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Externally visible base URL used in payload links
    /// (e.g. "https://fleet.example.com"). Inferred from request headers
    /// when unset.
    #[arg(long, env = "NODEFLEET_PUBLIC_URL")]
    public_url: Option<String>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<ServerConfig> {
        let db_path = match self.db_path {
            Some(path) => path,
            None => ServerConfig::default_db_path()
                .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?,
        };
        Ok(ServerConfig {
            addr: self.addr,
            db_path,
            public_url: self.public_url,
            log_json: self.log_json,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config()?;

    init_tracing(
        "nodefleet_server=info,tower_http=info",
        LogFormat::from_json_flag(config.log_json),
    )?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.addr,
        "Starting nodefleet-server"
    );

    info!(path = %config.db_path.display(), "Opening store");
    let store = Store::open(&config.db_path).await?;

    let app = build_router(AppState::new(store.clone(), config.public_url.as_deref()));
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received shutdown signal"),
                Err(e) => {
                    warn!(error = %e, "Cannot listen for shutdown signal");
                    std::future::pending::<()>().await;
                }
            }
        })
        .await?;

    store.close().await;
    info!("nodefleet-server stopped");
    Ok(())
}
