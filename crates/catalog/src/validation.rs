//! Form validation: raw text fields in, validated values or per-field messages out.
//!
//! Every field is checked independently and all messages are reported together,
//! so a form can show every invalid field at once.

use serde::{Deserialize, Serialize};

use stockroom_core::FieldErrors;

use crate::product::ProductDraft;

/// Form field names, shared by the validator and the HTML views.
pub mod fields {
    pub const NAME: &str = "name";
    pub const QUANTITY: &str = "quantity";
    pub const PURCHASE_PRICE: &str = "purchase_price";
    pub const SELL_PRICE: &str = "sell_price";
}

pub const NAME_REQUIRED: &str = "name is required";
pub const QUANTITY_REQUIRED: &str = "quantity is required";
pub const EXPECTED_POSITIVE_INTEGER: &str = "expected a positive integer";

/// Raw product form as submitted (create and edit share it).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    pub name: String,
    pub quantity: String,
    pub purchase_price: String,
    pub sell_price: String,
}

impl ProductForm {
    /// Prefill from validated values (edit page).
    pub fn from_draft(draft: &ProductDraft) -> Self {
        Self {
            name: draft.name.clone(),
            quantity: draft.quantity.to_string(),
            purchase_price: draft.purchase_price.to_string(),
            sell_price: draft.sell_price.to_string(),
        }
    }

    /// Validate every field; yields a draft only when all of them pass.
    pub fn validate(&self) -> Result<ProductDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.insert(fields::NAME, NAME_REQUIRED);
        }

        let quantity = collect(&mut errors, fields::QUANTITY, &self.quantity);
        let purchase_price = collect(&mut errors, fields::PURCHASE_PRICE, &self.purchase_price);
        let sell_price = collect(&mut errors, fields::SELL_PRICE, &self.sell_price);

        match (quantity, purchase_price, sell_price) {
            (Some(quantity), Some(purchase_price), Some(sell_price)) if errors.is_empty() => {
                Ok(ProductDraft {
                    name: name.to_string(),
                    quantity,
                    purchase_price,
                    sell_price,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Raw sell form as submitted from the product page.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaleForm {
    pub quantity: String,
}

impl SaleForm {
    pub fn validate(&self) -> Result<i64, FieldErrors> {
        parse_sale_quantity(&self.quantity)
            .map_err(|msg| FieldErrors::single(fields::QUANTITY, msg))
    }
}

fn collect(errors: &mut FieldErrors, field: &'static str, raw: &str) -> Option<i64> {
    match parse_positive_int(raw) {
        Ok(v) => Some(v),
        Err(msg) => {
            errors.insert(field, msg);
            None
        }
    }
}

/// Parse a strictly positive integer that fits the store's 32-bit columns.
///
/// Empty, non-numeric, zero, negative and out-of-range input all fail with
/// [`EXPECTED_POSITIVE_INTEGER`].
pub fn parse_positive_int(raw: &str) -> Result<i64, &'static str> {
    match raw.trim().parse::<i32>() {
        Ok(v) if v > 0 => Ok(i64::from(v)),
        _ => Err(EXPECTED_POSITIVE_INTEGER),
    }
}

/// Sell-form variant: an empty field gets its own message.
pub fn parse_sale_quantity(raw: &str) -> Result<i64, &'static str> {
    if raw.trim().is_empty() {
        return Err(QUANTITY_REQUIRED);
    }
    parse_positive_int(raw)
}
