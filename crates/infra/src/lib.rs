//! Infrastructure layer: persistence, sale recording, use-case wiring, config.

pub mod config;
pub mod repository;
pub mod sales;
pub mod service;

pub use config::{AppConfig, ConfigError, StoreKind};
pub use repository::{
    CatalogRepository, InMemoryCatalogRepository, RepositoryError, RepositoryResult,
    SqliteCatalogRepository,
};
pub use sales::SaleRecorder;
pub use service::{CatalogService, ProductPage, sale_error_message};
