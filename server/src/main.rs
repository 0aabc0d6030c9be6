mod app;
mod catalog;
mod config;
mod routes;
mod state;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::catalog::CatalogStore;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let catalog_path = config::catalog_path();
    let catalog = match std::fs::read_to_string(&catalog_path) {
        Ok(json) => match CatalogStore::from_json(&json) {
            Ok(catalog) => {
                tracing::info!(%catalog_path, "Catalog seeded from file");
                catalog
            }
            Err(e) => {
                tracing::error!(error = %e, %catalog_path, "invalid catalog seed file");
                return;
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, %catalog_path, "catalog seed file unreadable, using embedded seed");
            match CatalogStore::embedded() {
                Ok(catalog) => catalog,
                Err(e) => {
                    tracing::error!(error = %e, "embedded catalog seed is invalid");
                    return;
                }
            }
        }
    };
    tracing::info!(
        categories = catalog.category_count(),
        datasets = catalog.dataset_count(),
        layers = catalog.layer_count(),
        "Catalog loaded"
    );

    let state = AppState::new(catalog);
    if let Some(upstream) = state.upstream_api.as_deref() {
        tracing::info!(%upstream, "Health checks will probe the upstream catalog API");
    }

    let app = app::build_app(state);

    let addr = format!("0.0.0.0:{}", config::server_port());
    tracing::info!("Boreal server listening on {addr}");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind TCP listener");
            return;
        }
    };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server failed");
    }

    tracing::info!("Server shut down gracefully");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
