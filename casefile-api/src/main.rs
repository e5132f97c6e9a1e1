//! Casefile HTTP server: agents and cases over JSON.

mod error;
mod extract;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use axum::Router;
use casefile::io::config::{DEFAULT_CONFIG_FILE, load_config};
use casefile::io::store::FileStore;
use casefile::service::Registry;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::state::AppState;

#[derive(Parser)]
#[command(name = "casefile-api")]
#[command(about = "HTTP API for the casefile agent and case registry")]
struct Args {
    /// Config file (store path and default bind address)
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Address to bind the server to (overrides the config)
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on (overrides the config)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("casefile_api=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args.config)?;
    let data_path = config.resolve_data_path(&args.config);
    let store = FileStore::open(&data_path, config.id_strategy)
        .with_context(|| format!("open store {}", data_path.display()))?;
    info!(
        store = %data_path.display(),
        id_strategy = ?config.id_strategy,
        "starting casefile-api"
    );

    let state = AppState::new(Registry::new(store));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::router())
        .layer(cors)
        .with_state(state);

    let bind = args.bind.unwrap_or(config.server.bind);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
