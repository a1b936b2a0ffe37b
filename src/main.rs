use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tokio::signal;
use tracing::{info, warn};

use ruletrace::api::routes::{create_router, AppState};
use ruletrace::config::Config;
use ruletrace::directory::{Directory, DirectoryLoader, DirectoryResolver, DirectoryWatcher};
use ruletrace::observability::{init_tracing, MetricsRegistry};
use ruletrace::storage::{FileTraceStore, IdentityResolver};
use ruletrace::TranscriptProjector;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse configuration
    let config = Config::parse();

    // Initialize tracing
    init_tracing(&config.log_level, config.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting ruletrace transcript service"
    );

    let store = FileTraceStore::new(&config.trace_dir);
    if !store.dir().is_dir() {
        warn!(path = %store.dir().display(), "Transcript directory does not exist, every lookup will miss");
    }

    // Identity directory (optional)
    let mut directory_handle = None;
    let resolver: Arc<dyn IdentityResolver> = if let Some(ref path) = config.directory_path {
        let watcher = DirectoryWatcher::new(
            DirectoryLoader::new(path),
            config.directory_reload_interval(),
        );
        let (directory_rx, handle) = watcher.start();
        directory_handle = Some(handle);
        info!(path = %path.display(), "Identity directory enabled");
        Arc::new(DirectoryResolver::new(directory_rx))
    } else {
        info!("Identity directory disabled (no path configured), names will be placeholders");
        Arc::new(Directory::empty())
    };

    let metrics = Arc::new(MetricsRegistry::new());
    let projector = TranscriptProjector::new(Arc::new(store), resolver).with_metrics(metrics.clone());

    // Create application state
    let state = Arc::new(AppState {
        projector: Arc::new(projector),
        metrics,
        start_time: Instant::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        latency_budget_ms: config.latency_budget_ms,
    });

    // Create router
    let app = create_router(state);

    // Parse listen address
    let addr: SocketAddr = config.listen_addr.parse()?;

    info!(addr = %addr, "Starting HTTP server");

    // Create TCP listener
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run server with graceful shutdown
    if config.graceful_shutdown {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    } else {
        axum::serve(listener, app).await?;
    }

    // Cleanup
    info!("Shutting down...");
    if let Some(handle) = directory_handle {
        handle.abort();
    }

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal");
}
