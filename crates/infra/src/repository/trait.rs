use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stockroom_catalog::{NewProduct, Product, Sale};
use stockroom_core::{DomainError, ExpectedVersion, ProductId};

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("product not found")]
    NotFound,

    #[error("concurrency conflict: {0}")]
    Conflict(String),

    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl From<RepositoryError> for DomainError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => DomainError::NotFound,
            RepositoryError::Conflict(msg) => DomainError::Conflict(msg),
            RepositoryError::Persistence(msg) => DomainError::Persistence(msg),
        }
    }
}

/// Store of products and their sale history.
///
/// ## Semantics
///
/// - Every call is independently consistent; no transaction spans two calls.
///   The one exception is [`commit_sale`](CatalogRepository::commit_sale), which
///   persists a stock decrement together with its sale record.
/// - Writes bump the product `version`. `update_product` honours
///   [`ExpectedVersion`] so a read-modify-write that lost a race fails with
///   `Conflict` instead of silently overwriting.
/// - Deleting a product deletes its sales.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// All products, ordered by id.
    async fn list_products(&self) -> RepositoryResult<Vec<Product>>;

    /// Fails with `NotFound` if absent.
    async fn get_product(&self, id: ProductId) -> RepositoryResult<Product>;

    /// Insert and assign an id. The stored product starts at version 1.
    async fn create_product(&self, product: NewProduct) -> RepositoryResult<Product>;

    /// Overwrite a stored product; returns it with its new version.
    async fn update_product(
        &self,
        product: Product,
        expected: ExpectedVersion,
    ) -> RepositoryResult<Product>;

    /// Remove a product and its sales. Absent ids are a no-op.
    async fn delete_product(&self, id: ProductId) -> RepositoryResult<()>;

    /// Sales of one product, most recent first.
    async fn list_sales(&self, product_id: ProductId) -> RepositoryResult<Vec<Sale>>;

    /// Append a sale record. The referenced product must exist.
    async fn append_sale(&self, sale: Sale) -> RepositoryResult<()>;

    /// Persist a sold-down product and its sale record as one unit.
    ///
    /// The default runs the two calls back to back; stores with transactions
    /// should override it.
    async fn commit_sale(
        &self,
        product: Product,
        expected: ExpectedVersion,
        sale: Sale,
    ) -> RepositoryResult<Product> {
        let updated = self.update_product(product, expected).await?;
        self.append_sale(sale).await?;
        Ok(updated)
    }
}

#[async_trait]
impl<S> CatalogRepository for Arc<S>
where
    S: CatalogRepository + ?Sized,
{
    async fn list_products(&self) -> RepositoryResult<Vec<Product>> {
        (**self).list_products().await
    }

    async fn get_product(&self, id: ProductId) -> RepositoryResult<Product> {
        (**self).get_product(id).await
    }

    async fn create_product(&self, product: NewProduct) -> RepositoryResult<Product> {
        (**self).create_product(product).await
    }

    async fn update_product(
        &self,
        product: Product,
        expected: ExpectedVersion,
    ) -> RepositoryResult<Product> {
        (**self).update_product(product, expected).await
    }

    async fn delete_product(&self, id: ProductId) -> RepositoryResult<()> {
        (**self).delete_product(id).await
    }

    async fn list_sales(&self, product_id: ProductId) -> RepositoryResult<Vec<Sale>> {
        (**self).list_sales(product_id).await
    }

    async fn append_sale(&self, sale: Sale) -> RepositoryResult<()> {
        (**self).append_sale(sale).await
    }

    async fn commit_sale(
        &self,
        product: Product,
        expected: ExpectedVersion,
        sale: Sale,
    ) -> RepositoryResult<Product> {
        (**self).commit_sale(product, expected, sale).await
    }
}
