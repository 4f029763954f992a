use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

mod cli;

use unigate_adapter_core::load_all;
use unigate_adapter_impl::default_factories;
use unigate_core::Gateway;
use unigate_router::gateway_router;

use crate::cli::Cli;

const FALLBACK_PORT: u16 = 5000;

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("unigate failed: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let adapters = load_all(default_factories());
    if adapters.is_empty() {
        warn!("no adapters loaded; every request will fail with model_not_found");
    }
    info!(
        adapters = adapters.len(),
        models = adapters.registry().len(),
        "adapters ready"
    );

    let gateway = Arc::new(Gateway::new(adapters));
    let app = gateway_router(gateway);

    let listener = bind_with_fallback(&cli.host, cli.port).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Bind the preferred address; if that port is taken, retreat to the fixed
/// alternate port on the same host. Failure of the fallback too is fatal.
async fn bind_with_fallback(
    host: &str,
    port: u16,
) -> Result<tokio::net::TcpListener, Box<dyn Error + Send + Sync>> {
    match tokio::net::TcpListener::bind(format!("{host}:{port}")).await {
        Ok(listener) => Ok(listener),
        Err(err) => {
            warn!(
                port,
                fallback = FALLBACK_PORT,
                error = %err,
                "preferred port unavailable, retrying on fallback"
            );
            Ok(tokio::net::TcpListener::bind(format!("{host}:{FALLBACK_PORT}")).await?)
        }
    }
}
