//! Service layer for the feed generator.
//!
//! This module contains the business logic for:
//! - Catalog access (`CatalogSource`, `OpenBdClient`)
//! - Record normalization (`extract`)
//! - Shinsho classification (`ClassificationPolicy` and its implementations)

mod catalog;
mod classify;
pub mod extract;

pub use catalog::{CatalogSource, OpenBdClient};
pub use classify::{
    BookCodePolicy, Classification, ClassificationPolicy, CodeMatchPolicy, LabelPolicy, evaluate,
};
pub use extract::extract;
