use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use volt_flow::{ExecutorRegistry, GraphRepository};
use volt_http::{router, AppConfig, FlowService};
use volt_session::SessionStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "configuration is invalid");
            std::process::exit(1);
        }
    };

    // Executor sets are registered by the embedding application; the bare
    // server validates graphs against whatever is registered here.
    let registry = Arc::new(ExecutorRegistry::new());

    let graphs = match GraphRepository::load_dir(&config.flow.graph_dir, &registry) {
        Ok(graphs) => Arc::new(graphs),
        Err(e) => {
            // A single bad definition refuses startup rather than serving
            // a partial graph set.
            error!(error = %e, dir = %config.flow.graph_dir, "cannot load flow graphs");
            std::process::exit(1);
        }
    };

    let sessions = SessionStore::with_validity(config.session_validity());
    let service = Arc::new(FlowService::new(graphs, registry, sessions));
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .expect("cannot bind HTTP listener");
    info!(bind = %config.server.bind, "volt server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
