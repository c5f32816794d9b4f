use axum::serve;
use clap::Parser;
use color_eyre::Result;
use eyre::WrapErr as _;
use std::{
    net::SocketAddr,
    sync::Arc,
};
use system_monitor_collector::{
    create_router,
    MonitorStore,
};
use tokio::net::TcpListener;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Collects telemetry snapshots from agents and serves aggregates", long_about = None)]
struct Args {
    /// IP address and port to listen on.
    #[arg(long, env = "SYSTEM_MONITOR_LISTEN", default_value = "127.0.0.1:8080")]
    listen_address: SocketAddr,
}

fn init_logging() {
    color_eyre::install().expect("color_eyre init");

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(EnvFilter::from_default_env()))
        .with(tracing_error::ErrorLayer::default())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let store = Arc::new(MonitorStore::new());
    let app = create_router(store);

    let listener = TcpListener::bind(args.listen_address)
        .await
        .wrap_err_with(|| format!("cannot bind listening socket {}", args.listen_address))?;
    tracing::info!("listening on {}", args.listen_address);

    serve(listener, app.into_make_service()).await?;

    Ok(())
}
