//! Catalog use-cases: the entry points the HTTP layer calls.
//!
//! Each method is one request's worth of work: validate raw input, load, apply
//! the domain operation, persist. Dependencies are injected; there is no global
//! store handle.

use std::sync::Arc;

use stockroom_catalog::{NewProduct, Product, ProductForm, Sale, SaleForm};
use stockroom_core::{Clock, DomainError, DomainResult, Entity, ExpectedVersion, ProductId};

use crate::repository::CatalogRepository;
use crate::sales::SaleRecorder;

/// A product together with its sale history (newest first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductPage {
    pub product: Product,
    pub sales: Vec<Sale>,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Arc<dyn CatalogRepository>,
    clock: Arc<dyn Clock>,
    recorder: SaleRecorder,
}

impl CatalogService {
    pub fn new(repository: Arc<dyn CatalogRepository>, clock: Arc<dyn Clock>) -> Self {
        let recorder = SaleRecorder::new(repository.clone(), clock.clone());
        Self {
            repository,
            clock,
            recorder,
        }
    }

    pub fn repository(&self) -> &Arc<dyn CatalogRepository> {
        &self.repository
    }

    pub async fn list_products(&self) -> DomainResult<Vec<Product>> {
        Ok(self.repository.list_products().await?)
    }

    pub async fn get_product(&self, id: ProductId) -> DomainResult<Product> {
        Ok(self.repository.get_product(id).await?)
    }

    pub async fn product_page(&self, id: ProductId) -> DomainResult<ProductPage> {
        let product = self.repository.get_product(id).await?;
        let sales = self.repository.list_sales(id).await?;
        Ok(ProductPage { product, sales })
    }

    /// Validate the form and insert a new product.
    pub async fn create_product(&self, form: &ProductForm) -> DomainResult<Product> {
        let draft = form.validate()?;
        let created = self
            .repository
            .create_product(NewProduct {
                draft,
                created_at: self.clock.now(),
            })
            .await?;

        tracing::info!(product_id = %created.id_typed(), name = created.name(), "product created");
        Ok(created)
    }

    /// Validate the form and overwrite an existing product.
    ///
    /// The product is checked for existence before the form, so a missing id
    /// reports `NotFound` even when the form is also invalid.
    pub async fn edit_product(&self, id: ProductId, form: &ProductForm) -> DomainResult<Product> {
        let mut product = self.repository.get_product(id).await?;
        let draft = form.validate()?;

        let expected = ExpectedVersion::Exact(product.version());
        product.apply_edit(draft, self.clock.now());
        let updated = self.repository.update_product(product, expected).await?;

        tracing::info!(product_id = %id, version = updated.version(), "product updated");
        Ok(updated)
    }

    pub async fn delete_product(&self, id: ProductId) -> DomainResult<()> {
        self.repository.delete_product(id).await?;
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    /// Sell from stock: parse the raw quantity, decrement, persist with the sale record.
    ///
    /// Fails with `Validation` for malformed input, `InvalidQuantity` /
    /// `InsufficientStock` from the stock rule, `NotFound`, or `Conflict` when
    /// another write landed between load and save. Nothing is retried.
    pub async fn sell(&self, id: ProductId, form: &SaleForm) -> DomainResult<(Product, Sale)> {
        let mut product = self.repository.get_product(id).await?;
        let quantity = form.validate()?;

        let expected = ExpectedVersion::Exact(product.version());
        product.sell(quantity)?;

        let (updated, sale) = self.recorder.commit(product, expected, quantity).await?;
        Ok((updated, sale))
    }
}

/// Field-level message for a failed sale, when the failure is the user's to fix.
pub fn sale_error_message(err: &DomainError) -> Option<String> {
    match err {
        DomainError::Validation(errors) => errors
            .get(stockroom_catalog::validation::fields::QUANTITY)
            .map(str::to_string),
        DomainError::InvalidQuantity(_) => {
            Some(stockroom_catalog::validation::EXPECTED_POSITIVE_INTEGER.to_string())
        }
        DomainError::InsufficientStock { available, .. } => {
            Some(format!("not enough stock: {available} available"))
        }
        _ => None,
    }
}
