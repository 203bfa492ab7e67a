use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::ProductId;

/// Sell event: `quantity` units of a product left stock at `date`.
///
/// Immutable once recorded. `product_id` is a plain foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub product_id: ProductId,
    pub quantity: i64,
    pub date: DateTime<Utc>,
}

impl Sale {
    pub fn new(product_id: ProductId, quantity: i64, date: DateTime<Utc>) -> Self {
        Self {
            product_id,
            quantity,
            date,
        }
    }

    /// Revenue for this sale at the given unit price.
    pub fn total(&self, unit_price: i64) -> i64 {
        self.quantity * unit_price
    }
}
