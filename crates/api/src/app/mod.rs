//! HTTP application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `routes/`: HTTP routes + handlers
//! - `views.rs`: server-rendered HTML pages
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use anyhow::Context;
use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use stockroom_core::SystemClock;
use stockroom_infra::{
    AppConfig, CatalogRepository, CatalogService, InMemoryCatalogRepository,
    SqliteCatalogRepository, StoreKind,
};

use crate::middleware;

pub mod errors;
pub mod routes;
pub mod views;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(service: Arc<CatalogService>) -> Router {
    Router::new()
        .route("/", get(routes::products::list_products))
        .route("/health", get(routes::system::health))
        .route("/styles.css", get(routes::system::stylesheet))
        .nest("/products", routes::products::router())
        .layer(
            ServiceBuilder::new()
                .layer(Extension(service))
                .layer(axum::middleware::from_fn(middleware::log_requests)),
        )
}

/// Wire the catalog service over the configured store.
pub async fn build_service(config: &AppConfig) -> anyhow::Result<Arc<CatalogService>> {
    let repository: Arc<dyn CatalogRepository> = match config.store {
        StoreKind::Memory => {
            tracing::warn!("using in-memory store; data is lost on exit");
            Arc::new(InMemoryCatalogRepository::new())
        }
        StoreKind::Sqlite => {
            ensure_database_dir(&config.database_url)?;
            let repo = SqliteCatalogRepository::connect(&config.database_url)
                .await
                .with_context(|| format!("failed to open database {}", config.database_url))?;
            Arc::new(repo)
        }
    };

    Ok(Arc::new(CatalogService::new(repository, Arc::new(SystemClock))))
}

/// Create the parent directory of a file-backed SQLite URL.
fn ensure_database_dir(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create database directory {parent:?}"))?;
        }
    }
    Ok(())
}
