pub mod adapters;
pub mod products;
pub mod types;
pub mod uploads;

pub use types::{CatalogParams, NewProduct, Product, ProductChanges, ProductPayload};
