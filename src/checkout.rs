//! Checkout Context
//!
//! The immutable snapshot of a transaction handed to the engine: cart lines,
//! the evaluating channel, the acting customer/employee, the evaluation
//! instant and the order shipping fee.

use jiff::Timestamp;
use rusty_money::{
    Money,
    iso::Currency,
};
use thiserror::Error;

use crate::ids::IdSet;

/// Errors related to transaction context construction.
#[derive(Debug, Error)]
pub enum ContextError {
    /// A line's currency differs from the transaction currency
    /// (index, line currency, transaction currency).
    #[error("Line {0} has currency {1}, but transaction has currency {2}")]
    CurrencyMismatch(usize, &'static str, &'static str),

    /// A line was submitted with a quantity of zero.
    #[error("Line {0} has a quantity of zero")]
    ZeroQuantity(usize),

    /// The shipping fee's currency differs from the transaction currency
    /// (fee currency, transaction currency).
    #[error("Shipping fee has currency {0}, but transaction has currency {1}")]
    ShippingCurrencyMismatch(&'static str, &'static str),
}

/// One line of the cart being evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine<'a> {
    product_id: String,
    quantity: u32,
    unit_price: Money<'a, Currency>,
    brand_id: Option<String>,
    custom_field_values: IdSet,
}

impl<'a> CartLine<'a> {
    /// Create a new cart line.
    #[must_use]
    pub fn new(product_id: &str, quantity: u32, unit_price: Money<'a, Currency>) -> Self {
        Self {
            product_id: product_id.to_string(),
            quantity,
            unit_price,
            brand_id: None,
            custom_field_values: IdSet::empty(),
        }
    }

    /// Attach the submitted brand identifier.
    #[must_use]
    pub fn with_brand(mut self, brand_id: &str) -> Self {
        self.brand_id = Some(brand_id.to_string());
        self
    }

    /// Attach submitted custom-field values.
    #[must_use]
    pub fn with_custom_field_values(mut self, values: IdSet) -> Self {
        self.custom_field_values = values;
        self
    }

    /// Return the product identifier of the line.
    #[must_use]
    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    /// Return the quantity of the line.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Return the unit price of the line.
    #[must_use]
    pub fn unit_price(&self) -> &Money<'a, Currency> {
        &self.unit_price
    }

    /// Return the submitted brand identifier, if any.
    #[must_use]
    pub fn brand_id(&self) -> Option<&str> {
        self.brand_id.as_deref()
    }

    /// Return the submitted custom-field values.
    #[must_use]
    pub fn custom_field_values(&self) -> &IdSet {
        &self.custom_field_values
    }
}

/// The immutable checkout snapshot an evaluation runs against.
#[derive(Debug, Clone)]
pub struct TransactionContext<'a> {
    customer_id: Option<String>,
    employee_id: Option<String>,
    channel: String,
    now: Timestamp,
    currency: &'static Currency,
    shipping_fee: Money<'a, Currency>,
    lines: Vec<CartLine<'a>>,
}

impl<'a> TransactionContext<'a> {
    /// Create an empty context for the given channel, instant and currency.
    #[must_use]
    pub fn new(channel: &str, now: Timestamp, currency: &'static Currency) -> Self {
        Self {
            customer_id: None,
            employee_id: None,
            channel: channel.to_string(),
            now,
            currency,
            shipping_fee: Money::from_minor(0, currency),
            lines: Vec::new(),
        }
    }

    /// Attach the acting customer.
    #[must_use]
    pub fn with_customer(mut self, customer_id: &str) -> Self {
        self.customer_id = Some(customer_id.to_string());
        self
    }

    /// Attach the acting employee.
    #[must_use]
    pub fn with_employee(mut self, employee_id: &str) -> Self {
        self.employee_id = Some(employee_id.to_string());
        self
    }

    /// Attach the order shipping fee.
    ///
    /// # Errors
    ///
    /// Returns a [`ContextError::ShippingCurrencyMismatch`] if the fee's
    /// currency differs from the transaction currency.
    pub fn with_shipping_fee(mut self, fee: Money<'a, Currency>) -> Result<Self, ContextError> {
        if fee.currency() != self.currency {
            return Err(ContextError::ShippingCurrencyMismatch(
                fee.currency().iso_alpha_code,
                self.currency.iso_alpha_code,
            ));
        }

        self.shipping_fee = fee;
        Ok(self)
    }

    /// Attach the cart lines.
    ///
    /// # Errors
    ///
    /// Returns a [`ContextError`] if a line's currency differs from the
    /// transaction currency or a line has a quantity of zero.
    pub fn with_lines(mut self, lines: Vec<CartLine<'a>>) -> Result<Self, ContextError> {
        lines.iter().enumerate().try_for_each(|(i, line)| {
            let line_currency = line.unit_price().currency();

            if line_currency != self.currency {
                return Err(ContextError::CurrencyMismatch(
                    i,
                    line_currency.iso_alpha_code,
                    self.currency.iso_alpha_code,
                ));
            }

            if line.quantity() == 0 {
                return Err(ContextError::ZeroQuantity(i));
            }

            Ok(())
        })?;

        self.lines = lines;
        Ok(self)
    }

    /// Return the acting customer identifier, if known.
    #[must_use]
    pub fn customer_id(&self) -> Option<&str> {
        self.customer_id.as_deref()
    }

    /// Return the acting employee identifier, if known.
    #[must_use]
    pub fn employee_id(&self) -> Option<&str> {
        self.employee_id.as_deref()
    }

    /// Return the sales channel identifier.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Return the evaluation instant.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Return the transaction currency.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Return the order shipping fee.
    #[must_use]
    pub fn shipping_fee(&self) -> &Money<'a, Currency> {
        &self.shipping_fee
    }

    /// Return the cart lines.
    #[must_use]
    pub fn lines(&self) -> &[CartLine<'a>] {
        &self.lines
    }
}
