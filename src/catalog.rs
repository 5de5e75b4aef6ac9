//! Catalog Index
//!
//! Boundary to the product catalog. Category and brand membership is resolved
//! through this interface at evaluation time rather than being flattened into
//! rule definitions, so catalog edits take effect immediately. Every consumer
//! in the engine treats a lookup error as "does not match" (fail-closed): a
//! broken catalog must never accidentally apply a discount.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::ids::IdSet;

/// Errors reported by a catalog backend.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The backing store could not answer the lookup.
    #[error("catalog backend failure: {0}")]
    Backend(String),
}

/// On-demand product membership lookups.
pub trait CatalogIndex {
    /// Return the identifiers of all products belonging to the given category.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the backing store cannot answer; callers
    /// must treat this as a failed match, never as a wildcard.
    fn products_in_category(&self, category_id: &str) -> Result<IdSet, CatalogError>;

    /// Return the brand identifier of the given product, if it has one.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the backing store cannot answer.
    fn brand_of(&self, product_id: &str) -> Result<Option<String>, CatalogError>;
}

/// A map-backed catalog index for embedding applications and tests.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    category_members: FxHashMap<String, IdSet>,
    brands: FxHashMap<String, String>,
}

impl InMemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a product as a member of a category.
    pub fn add_to_category(&mut self, category_id: &str, product_id: &str) {
        self.category_members
            .entry(category_id.to_string())
            .or_default()
            .insert(product_id);
    }

    /// Record the brand of a product.
    pub fn set_brand(&mut self, product_id: &str, brand_id: &str) {
        self.brands
            .insert(product_id.to_string(), brand_id.to_string());
    }
}

impl CatalogIndex for InMemoryCatalog {
    fn products_in_category(&self, category_id: &str) -> Result<IdSet, CatalogError> {
        Ok(self
            .category_members
            .get(category_id)
            .cloned()
            .unwrap_or_default())
    }

    fn brand_of(&self, product_id: &str) -> Result<Option<String>, CatalogError> {
        Ok(self.brands.get(product_id).cloned())
    }
}
