use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, ProductId};

/// Validated product attributes, as produced by the product form.
///
/// Carries no identity; it becomes a [`Product`] once the repository assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub quantity: i64,
    pub purchase_price: i64,
    pub sell_price: i64,
}

/// A product about to be inserted (no id yet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub draft: ProductDraft,
    pub created_at: DateTime<Utc>,
}

/// Entity: Product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    quantity: i64,
    purchase_price: i64,
    sell_price: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Product {
    /// Build a freshly inserted product (version 1).
    pub fn from_new(id: ProductId, new: NewProduct) -> Self {
        Self::rehydrate(id, new.draft, new.created_at, new.created_at, 1)
    }

    /// Rebuild a product from stored state.
    pub fn rehydrate(
        id: ProductId,
        draft: ProductDraft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        version: u64,
    ) -> Self {
        Self {
            id,
            name: draft.name,
            quantity: draft.quantity,
            purchase_price: draft.purchase_price,
            sell_price: draft.sell_price,
            created_at,
            updated_at,
            version,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn purchase_price(&self) -> i64 {
        self.purchase_price
    }

    pub fn sell_price(&self) -> i64 {
        self.sell_price
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Per-unit margin (`sell_price - purchase_price`); may be negative.
    pub fn margin(&self) -> i64 {
        self.sell_price - self.purchase_price
    }

    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }

    /// The editable attributes as a draft (prefills the edit form).
    pub fn to_draft(&self) -> ProductDraft {
        ProductDraft {
            name: self.name.clone(),
            quantity: self.quantity,
            purchase_price: self.purchase_price,
            sell_price: self.sell_price,
        }
    }

    /// Take `quantity` units out of stock.
    ///
    /// Fails without touching state when `quantity` is not positive or exceeds
    /// the current stock. Persisting the result is the caller's job.
    pub fn sell(&mut self, quantity: i64) -> DomainResult<()> {
        if quantity <= 0 {
            return Err(DomainError::InvalidQuantity(quantity));
        }
        if quantity > self.quantity {
            return Err(DomainError::InsufficientStock {
                requested: quantity,
                available: self.quantity,
            });
        }

        self.quantity -= quantity;
        Ok(())
    }

    /// Overwrite the editable attributes.
    pub fn apply_edit(&mut self, draft: ProductDraft, now: DateTime<Utc>) {
        self.name = draft.name;
        self.quantity = draft.quantity;
        self.purchase_price = draft.purchase_price;
        self.sell_price = draft.sell_price;
        self.updated_at = now;
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
