use anyhow::Result;
use axum::Router;
use clap::Parser;
use qsearch_core::{EngineConfig, SearchEngine};
use qsearch_server::{build_app, router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Index directory path (defaults to QSEARCH_INDEX_DIR or ./index)
    #[arg(long)]
    index: Option<String>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Load the fitted index before accepting connections
    #[arg(long, default_value_t = false)]
    eager: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let config = EngineConfig::from_env()?.overridden(args.index.map(Into::into), None)?;
    let app: Router = if args.eager {
        let engine = SearchEngine::open(&config)?;
        engine.warm_up()?;
        router(Arc::new(engine))
    } else {
        build_app(&config)?
    };

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
