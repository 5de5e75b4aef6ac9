//! Rule Scopes
//!
//! Multi-dimensional targeting criteria for promotion rules. Each dimension
//! holds a set of identifiers; an empty set is a wildcard for that dimension.
//! A line matches a scope when every non-empty dimension matches (AND across
//! dimensions, OR within one).

use serde::{Deserialize, Serialize};

use crate::{
    catalog::CatalogIndex,
    checkout::{CartLine, TransactionContext},
    ids::IdSet,
};

/// Targeting criteria of a promotion rule.
///
/// Category membership is deliberately *not* flattened into a product list at
/// authoring time: it is resolved against the [`CatalogIndex`] on every
/// evaluation, so catalog edits take effect immediately. Any catalog lookup
/// failure makes the restricted dimension fail closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scope {
    /// Product identifiers the rule targets.
    pub products: IdSet,

    /// Category identifiers the rule targets, resolved via the catalog.
    pub categories: IdSet,

    /// Customer identifiers the rule targets.
    pub customers: IdSet,

    /// Brand identifiers the rule targets.
    pub brands: IdSet,

    /// Employee identifiers the rule targets.
    pub employees: IdSet,

    /// Custom-field values the rule targets.
    pub custom_field_values: IdSet,

    /// Sales channel identifiers the rule targets.
    pub channels: IdSet,
}

impl Scope {
    /// Create a fully unrestricted scope (every dimension a wildcard).
    #[must_use]
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Check whether every dimension is a wildcard.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.products.is_empty()
            && self.categories.is_empty()
            && self.customers.is_empty()
            && self.brands.is_empty()
            && self.employees.is_empty()
            && self.custom_field_values.is_empty()
            && self.channels.is_empty()
    }

    /// Check whether the scope matches the given cart line in its context.
    pub fn matches_line<C: CatalogIndex>(
        &self,
        ctx: &TransactionContext<'_>,
        line: &CartLine<'_>,
        catalog: &C,
    ) -> bool {
        if !self.products.is_empty() && !self.products.contains(line.product_id()) {
            return false;
        }

        if !self.categories.is_empty() && !self.matches_category(line.product_id(), catalog) {
            return false;
        }

        if !self.brands.is_empty() && !self.matches_brand(line, catalog) {
            return false;
        }

        if !self.customers.is_empty()
            && !ctx
                .customer_id()
                .is_some_and(|customer| self.customers.contains(customer))
        {
            return false;
        }

        if !self.employees.is_empty()
            && !ctx
                .employee_id()
                .is_some_and(|employee| self.employees.contains(employee))
        {
            return false;
        }

        if !self.custom_field_values.is_empty()
            && !self.custom_field_values.intersects(line.custom_field_values())
        {
            return false;
        }

        if !self.channels.is_empty() && !self.channels.contains(ctx.channel()) {
            return false;
        }

        true
    }

    fn matches_category<C: CatalogIndex>(&self, product_id: &str, catalog: &C) -> bool {
        self.categories.iter().any(|category_id| {
            match catalog.products_in_category(category_id) {
                Ok(members) => members.contains(product_id),
                Err(error) => {
                    tracing::debug!(
                        category = category_id,
                        product = product_id,
                        %error,
                        "category lookup failed; treating as no match"
                    );

                    false
                }
            }
        })
    }

    fn matches_brand<C: CatalogIndex>(&self, line: &CartLine<'_>, catalog: &C) -> bool {
        if let Some(brand_id) = line.brand_id() {
            return self.brands.contains(brand_id);
        }

        match catalog.brand_of(line.product_id()) {
            Ok(Some(brand_id)) => self.brands.contains(&brand_id),
            Ok(None) => false,
            Err(error) => {
                tracing::debug!(
                    product = line.product_id(),
                    %error,
                    "brand lookup failed; treating as no match"
                );

                false
            }
        }
    }
}
