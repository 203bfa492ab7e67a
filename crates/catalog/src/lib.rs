//! Catalog domain module.
//!
//! This crate contains business rules for products and their sales, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod product;
pub mod sale;
pub mod validation;

pub use product::{NewProduct, Product, ProductDraft};
pub use sale::Sale;
pub use validation::{ProductForm, SaleForm, parse_positive_int, parse_sale_quantity};
