//! Catalog persistence boundary.
//!
//! Defines the repository contract the catalog logic loads and saves through,
//! plus an in-memory implementation (tests/dev) and a SQLite one (production).

pub mod in_memory;
pub mod sqlite;
pub mod r#trait;

pub use in_memory::InMemoryCatalogRepository;
pub use sqlite::SqliteCatalogRepository;
pub use r#trait::{CatalogRepository, RepositoryError, RepositoryResult};
