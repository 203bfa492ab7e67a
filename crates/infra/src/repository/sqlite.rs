//! SQLite-backed catalog repository.
//!
//! ## Schema
//!
//! ```text
//! products(id, name, quantity, purchase_price, sell_price, create_date, update_date, version)
//! sells(id, product_id -> products.id ON DELETE CASCADE, sell_date, quantity)
//! ```
//!
//! ## Error Mapping
//!
//! | SQLx Error | RepositoryError |
//! |------------|-----------------|
//! | RowNotFound | `NotFound` |
//! | Database (any code) | `Persistence` |
//! | PoolClosed / Io / other | `Persistence` |
//!
//! Version mismatches are detected from `UPDATE ... WHERE version = ?` matching
//! no row while the id still exists, and reported as `Conflict`.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use tracing::instrument;

use stockroom_catalog::{NewProduct, Product, ProductDraft, Sale};
use stockroom_core::{Entity, ExpectedVersion, ProductId};

use super::r#trait::{CatalogRepository, RepositoryError, RepositoryResult};

const PRODUCT_COLUMNS: &str =
    "id, name, quantity, purchase_price, sell_price, create_date, update_date, version";

#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    quantity: i64,
    purchase_price: i64,
    sell_price: i64,
    create_date: DateTime<Utc>,
    update_date: DateTime<Utc>,
    version: i64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product::rehydrate(
            ProductId::new(row.id),
            ProductDraft {
                name: row.name,
                quantity: row.quantity,
                purchase_price: row.purchase_price,
                sell_price: row.sell_price,
            },
            row.create_date,
            row.update_date,
            u64::try_from(row.version).unwrap_or_default(),
        )
    }
}

#[derive(Debug, FromRow)]
struct SaleRow {
    product_id: i64,
    sell_date: DateTime<Utc>,
    quantity: i64,
}

impl From<SaleRow> for Sale {
    fn from(row: SaleRow) -> Self {
        Sale::new(ProductId::new(row.product_id), row.quantity, row.sell_date)
    }
}

/// SQLite catalog store.
///
/// `SqlitePool` is `Send + Sync` and cheap to clone, so this type is too.
#[derive(Debug, Clone)]
pub struct SqliteCatalogRepository {
    pool: SqlitePool,
}

impl SqliteCatalogRepository {
    /// Wrap an existing pool. Call [`migrate`](Self::migrate) before use.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` and make sure the schema exists.
    pub async fn connect(database_url: &str) -> RepositoryResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| map_sqlx_error("connect", e))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        let repo = Self::new(pool);
        repo.migrate().await?;
        Ok(repo)
    }

    /// A private in-memory database (tests/dev).
    ///
    /// Pinned to one connection that never expires, since every SQLite
    /// `:memory:` connection is a separate database.
    pub async fn in_memory() -> RepositoryResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| map_sqlx_error("connect", e))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        let repo = Self::new(pool);
        repo.migrate().await?;
        Ok(repo)
    }

    /// Create tables if they do not exist yet (idempotent).
    pub async fn migrate(&self) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                name           TEXT    NOT NULL,
                quantity       INTEGER NOT NULL CHECK (quantity >= 0),
                purchase_price INTEGER NOT NULL,
                sell_price     INTEGER NOT NULL,
                create_date    TEXT    NOT NULL,
                update_date    TEXT    NOT NULL,
                version        INTEGER NOT NULL DEFAULT 1
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("migrate", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sells (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
                sell_date  TEXT    NOT NULL,
                quantity   INTEGER NOT NULL CHECK (quantity > 0)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("migrate", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS sells_product_date ON sells (product_id, sell_date)")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;

        Ok(())
    }

    async fn exists<'e, E>(executor: E, id: ProductId) -> RepositoryResult<bool>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM products WHERE id = ?")
            .bind(id.get())
            .fetch_optional(executor)
            .await
            .map_err(|e| map_sqlx_error("exists", e))?;
        Ok(found.is_some())
    }
}

/// `UPDATE ... RETURNING` honouring the expected version; `None` when no row matched.
async fn update_returning<'e, E>(
    executor: E,
    product: &Product,
    expected: ExpectedVersion,
) -> RepositoryResult<Option<Product>>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let expected_version: Option<i64> = match expected {
        ExpectedVersion::Any => None,
        ExpectedVersion::Exact(v) => Some(i64::try_from(v).unwrap_or(i64::MAX)),
    };

    let sql = format!(
        r#"
        UPDATE products
        SET name = ?, quantity = ?, purchase_price = ?, sell_price = ?,
            update_date = ?, version = version + 1
        WHERE id = ? AND (? IS NULL OR version = ?)
        RETURNING {PRODUCT_COLUMNS}
        "#
    );

    let row: Option<ProductRow> = sqlx::query_as(&sql)
        .bind(product.name())
        .bind(product.quantity())
        .bind(product.purchase_price())
        .bind(product.sell_price())
        .bind(product.updated_at())
        .bind(product.id_typed().get())
        .bind(expected_version)
        .bind(expected_version)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;

    Ok(row.map(Product::from))
}

fn conflict(product: &Product, expected: ExpectedVersion) -> RepositoryError {
    RepositoryError::Conflict(format!(
        "product {} changed since it was loaded (expected {expected:?})",
        product.id_typed()
    ))
}

#[async_trait]
impl CatalogRepository for SqliteCatalogRepository {
    #[instrument(skip_all, err)]
    async fn list_products(&self) -> RepositoryResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id ASC");
        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;

        tracing::debug!(count = rows.len(), "loaded products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    #[instrument(skip_all, fields(product_id = %id), err)]
    async fn get_product(&self, id: ProductId) -> RepositoryResult<Product> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?");
        let row: ProductRow = sqlx::query_as(&sql)
            .bind(id.get())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;
        Ok(row.into())
    }

    #[instrument(skip_all, fields(name = %product.draft.name), err)]
    async fn create_product(&self, product: NewProduct) -> RepositoryResult<Product> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO products (name, quantity, purchase_price, sell_price, create_date, update_date, version)
            VALUES (?, ?, ?, ?, ?, ?, 1)
            RETURNING id
            "#,
        )
        .bind(&product.draft.name)
        .bind(product.draft.quantity)
        .bind(product.draft.purchase_price)
        .bind(product.draft.sell_price)
        .bind(product.created_at)
        .bind(product.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_product", e))?;

        Ok(Product::from_new(ProductId::new(id), product))
    }

    #[instrument(skip_all, fields(product_id = %product.id_typed()), err)]
    async fn update_product(
        &self,
        product: Product,
        expected: ExpectedVersion,
    ) -> RepositoryResult<Product> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("update_product", e))?;

        let updated = match update_returning(&mut *tx, &product, expected).await? {
            Some(updated) => updated,
            None => {
                // Same transaction, so a concurrent delete cannot turn a conflict into NotFound.
                let exists = Self::exists(&mut *tx, product.id_typed()).await?;
                return Err(if exists {
                    conflict(&product, expected)
                } else {
                    RepositoryError::NotFound
                });
            }
        };

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("update_product", e))?;

        Ok(updated)
    }

    #[instrument(skip_all, fields(product_id = %id), err)]
    async fn delete_product(&self, id: ProductId) -> RepositoryResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;

        // Explicit in case the database was opened without foreign key enforcement.
        sqlx::query("DELETE FROM sells WHERE product_id = ?")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;

        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;

        tracing::debug!(rows = result.rows_affected(), "product deleted");
        Ok(())
    }

    #[instrument(skip_all, fields(product_id = %product_id), err)]
    async fn list_sales(&self, product_id: ProductId) -> RepositoryResult<Vec<Sale>> {
        let rows: Vec<SaleRow> = sqlx::query_as(
            r#"
            SELECT product_id, sell_date, quantity
            FROM sells
            WHERE product_id = ?
            ORDER BY sell_date DESC, id DESC
            "#,
        )
        .bind(product_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_sales", e))?;

        Ok(rows.into_iter().map(Sale::from).collect())
    }

    #[instrument(skip_all, fields(product_id = %sale.product_id, quantity = sale.quantity), err)]
    async fn append_sale(&self, sale: Sale) -> RepositoryResult<()> {
        insert_sale(&self.pool, &sale).await
    }

    #[instrument(skip_all, fields(product_id = %product.id_typed(), quantity = sale.quantity), err)]
    async fn commit_sale(
        &self,
        product: Product,
        expected: ExpectedVersion,
        sale: Sale,
    ) -> RepositoryResult<Product> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("commit_sale", e))?;

        let updated = match update_returning(&mut *tx, &product, expected).await? {
            Some(updated) => updated,
            None => {
                let exists = Self::exists(&mut *tx, product.id_typed()).await?;
                // Dropping the transaction rolls it back.
                return Err(if exists {
                    conflict(&product, expected)
                } else {
                    RepositoryError::NotFound
                });
            }
        };

        insert_sale(&mut *tx, &sale).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_sale", e))?;

        tracing::debug!(version = updated.version(), "sale committed");
        Ok(updated)
    }
}

async fn insert_sale<'e, E>(executor: E, sale: &Sale) -> RepositoryResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query("INSERT INTO sells (product_id, sell_date, quantity) VALUES (?, ?, ?)")
        .bind(sale.product_id.get())
        .bind(sale.date)
        .bind(sale.quantity)
        .execute(executor)
        .await
        .map_err(|e| map_sqlx_error("append_sale", e))?;
    Ok(())
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        sqlx::Error::Database(db_err) => RepositoryError::Persistence(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolClosed => {
            RepositoryError::Persistence(format!("connection pool closed in {}", operation))
        }
        other => RepositoryError::Persistence(format!("sqlx error in {}: {}", operation, other)),
    }
}
