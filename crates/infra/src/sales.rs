//! Sale recording: stamp a sale with the current time and hand it to the repository.
//!
//! Never reads or re-validates stock; callers apply `Product::sell` first.

use std::sync::Arc;

use stockroom_catalog::{Product, Sale};
use stockroom_core::{Clock, ExpectedVersion, ProductId};

use crate::repository::{CatalogRepository, RepositoryResult};

#[derive(Clone)]
pub struct SaleRecorder {
    repository: Arc<dyn CatalogRepository>,
    clock: Arc<dyn Clock>,
}

impl SaleRecorder {
    pub fn new(repository: Arc<dyn CatalogRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Build a sale record stamped with the current time.
    pub fn stamp(&self, product_id: ProductId, quantity: i64) -> Sale {
        Sale::new(product_id, quantity, self.clock.now())
    }

    /// Append a sale for stock that has already been persisted.
    pub async fn record(&self, product_id: ProductId, quantity: i64) -> RepositoryResult<Sale> {
        let sale = self.stamp(product_id, quantity);
        self.repository.append_sale(sale.clone()).await?;
        tracing::info!(%product_id, quantity, "sale recorded");
        Ok(sale)
    }

    /// Persist a sold-down product together with its sale record.
    pub async fn commit(
        &self,
        mut product: Product,
        expected: ExpectedVersion,
        quantity: i64,
    ) -> RepositoryResult<(Product, Sale)> {
        let sale = self.stamp(product.id_typed(), quantity);
        product.touch(sale.date);
        let updated = self
            .repository
            .commit_sale(product, expected, sale.clone())
            .await?;
        tracing::info!(product_id = %sale.product_id, quantity, "sale recorded");
        Ok((updated, sale))
    }
}
