use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use stockroom_catalog::{NewProduct, Product, Sale};
use stockroom_core::{Entity, ExpectedVersion, ProductId};

use super::r#trait::{CatalogRepository, RepositoryError, RepositoryResult};

#[derive(Debug, Default)]
struct State {
    products: BTreeMap<ProductId, Product>,
    /// Append order is kept so same-instant sales still list newest first.
    sales: Vec<(u64, Sale)>,
    last_id: i64,
    last_seq: u64,
}

impl State {
    fn update(&mut self, product: Product, expected: ExpectedVersion) -> RepositoryResult<Product> {
        let id = product.id_typed();
        let stored = self.products.get(&id).ok_or(RepositoryError::NotFound)?;

        expected
            .check(stored.version())
            .map_err(|err| RepositoryError::Conflict(format!("product {id}: {err}")))?;

        let updated = Product::rehydrate(
            id,
            product.to_draft(),
            stored.created_at(),
            product.updated_at(),
            stored.version() + 1,
        );
        self.products.insert(id, updated.clone());
        Ok(updated)
    }

    fn append(&mut self, sale: Sale) -> RepositoryResult<()> {
        if !self.products.contains_key(&sale.product_id) {
            return Err(RepositoryError::Persistence(format!(
                "sale references missing product {}",
                sale.product_id
            )));
        }
        self.last_seq += 1;
        self.sales.push((self.last_seq, sale));
        Ok(())
    }
}

/// In-memory catalog store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryCatalogRepository {
    state: RwLock<State>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RepositoryResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| RepositoryError::Persistence("catalog lock poisoned".to_string()))
    }

    fn write(&self) -> RepositoryResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| RepositoryError::Persistence("catalog lock poisoned".to_string()))
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn list_products(&self) -> RepositoryResult<Vec<Product>> {
        Ok(self.read()?.products.values().cloned().collect())
    }

    async fn get_product(&self, id: ProductId) -> RepositoryResult<Product> {
        self.read()?
            .products
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn create_product(&self, product: NewProduct) -> RepositoryResult<Product> {
        let mut state = self.write()?;
        state.last_id += 1;
        let id = ProductId::new(state.last_id);
        let created = Product::from_new(id, product);
        state.products.insert(id, created.clone());
        Ok(created)
    }

    async fn update_product(
        &self,
        product: Product,
        expected: ExpectedVersion,
    ) -> RepositoryResult<Product> {
        self.write()?.update(product, expected)
    }

    async fn delete_product(&self, id: ProductId) -> RepositoryResult<()> {
        let mut state = self.write()?;
        state.products.remove(&id);
        state.sales.retain(|(_, s)| s.product_id != id);
        Ok(())
    }

    async fn list_sales(&self, product_id: ProductId) -> RepositoryResult<Vec<Sale>> {
        let state = self.read()?;
        let mut sales: Vec<&(u64, Sale)> = state
            .sales
            .iter()
            .filter(|(_, s)| s.product_id == product_id)
            .collect();
        sales.sort_by(|(seq_a, a), (seq_b, b)| b.date.cmp(&a.date).then(seq_b.cmp(seq_a)));
        Ok(sales.into_iter().map(|(_, s)| s.clone()).collect())
    }

    async fn append_sale(&self, sale: Sale) -> RepositoryResult<()> {
        self.write()?.append(sale)
    }

    async fn commit_sale(
        &self,
        product: Product,
        expected: ExpectedVersion,
        sale: Sale,
    ) -> RepositoryResult<Product> {
        let mut state = self.write()?;
        if !state.products.contains_key(&sale.product_id) {
            return Err(RepositoryError::NotFound);
        }
        let updated = state.update(product, expected)?;
        state.append(sale)?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use stockroom_catalog::ProductDraft;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn new_widget() -> NewProduct {
        NewProduct {
            draft: ProductDraft {
                name: "Widget".to_string(),
                quantity: 10,
                purchase_price: 5,
                sell_price: 9,
            },
            created_at: t0(),
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips_fields() {
        let repo = InMemoryCatalogRepository::new();
        let created = repo.create_product(new_widget()).await.unwrap();
        let loaded = repo.get_product(created.id_typed()).await.unwrap();

        assert_eq!(loaded.to_draft(), new_widget().draft);
        assert_eq!(loaded.version(), 1);
    }

    #[tokio::test]
    async fn ids_are_assigned_sequentially() {
        let repo = InMemoryCatalogRepository::new();
        let a = repo.create_product(new_widget()).await.unwrap();
        let b = repo.create_product(new_widget()).await.unwrap();
        assert_eq!(a.id_typed(), ProductId::new(1));
        assert_eq!(b.id_typed(), ProductId::new(2));
        assert_eq!(repo.list_products().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let repo = InMemoryCatalogRepository::new();
        assert_eq!(
            repo.get_product(ProductId::new(7)).await.unwrap_err(),
            RepositoryError::NotFound
        );
    }

    #[tokio::test]
    async fn stale_update_is_rejected_and_leaves_row_alone() {
        let repo = InMemoryCatalogRepository::new();
        let created = repo.create_product(new_widget()).await.unwrap();

        let mut first = created.clone();
        first.sell(2).unwrap();
        repo.update_product(first, ExpectedVersion::Exact(1)).await.unwrap();

        let mut stale = created;
        stale.sell(5).unwrap();
        let err = repo
            .update_product(stale, ExpectedVersion::Exact(1))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        let stored = repo.get_product(ProductId::new(1)).await.unwrap();
        assert_eq!(stored.quantity(), 8);
        assert_eq!(stored.version(), 2);
    }

    #[tokio::test]
    async fn sales_list_newest_first() {
        let repo = InMemoryCatalogRepository::new();
        let p = repo.create_product(new_widget()).await.unwrap();
        let id = p.id_typed();

        repo.append_sale(Sale::new(id, 1, t0())).await.unwrap();
        repo.append_sale(Sale::new(id, 2, t0() + Duration::minutes(5))).await.unwrap();
        repo.append_sale(Sale::new(id, 3, t0() + Duration::minutes(5))).await.unwrap();

        let quantities: Vec<i64> = repo
            .list_sales(id)
            .await
            .unwrap()
            .iter()
            .map(|s| s.quantity)
            .collect();
        assert_eq!(quantities, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn delete_removes_product_and_its_sales() {
        let repo = InMemoryCatalogRepository::new();
        let p = repo.create_product(new_widget()).await.unwrap();
        let id = p.id_typed();
        repo.append_sale(Sale::new(id, 1, t0())).await.unwrap();

        repo.delete_product(id).await.unwrap();
        repo.delete_product(id).await.unwrap();

        assert_eq!(repo.get_product(id).await.unwrap_err(), RepositoryError::NotFound);
        assert!(repo.list_sales(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sale_for_missing_product_is_a_persistence_error() {
        let repo = InMemoryCatalogRepository::new();
        let err = repo
            .append_sale(Sale::new(ProductId::new(3), 1, t0()))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Persistence(_)));
    }

    #[tokio::test]
    async fn failed_commit_sale_appends_nothing() {
        let repo = InMemoryCatalogRepository::new();
        let p = repo.create_product(new_widget()).await.unwrap();
        let id = p.id_typed();

        let mut sold = p.clone();
        sold.sell(1).unwrap();
        let err = repo
            .commit_sale(sold, ExpectedVersion::Exact(9), Sale::new(id, 1, t0()))
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert!(repo.list_sales(id).await.unwrap().is_empty());
        assert_eq!(repo.get_product(id).await.unwrap().quantity(), 10);
    }
}
