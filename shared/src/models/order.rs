//! Upstream order model
//!
//! Read-only, request-scoped copies of upstream orders and refunds.
//! Money is `Decimal` here; it is only converted to `f64` at the store boundary.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lightweight list-query payload (pagination only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order line item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub quantity: i64,
    /// Unit price before any discount
    pub original_unit_price: Decimal,
    pub original_total: Decimal,
    pub discounted_total: Decimal,
    pub sku: Option<String>,
    /// Design reference from the `_design_id` / `design_id` custom attribute
    pub design_id: Option<String>,
}

impl LineItem {
    /// Gross contribution: `original_unit_price × quantity`
    pub fn gross(&self) -> Decimal {
        self.original_unit_price * Decimal::from(self.quantity)
    }

    pub fn has_design(&self) -> bool {
        self.design_id.as_deref().is_some_and(|d| !d.trim().is_empty())
    }
}

/// Refund event, attributed by its own `created_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub total_refunded: Decimal,
    /// Per refunded line item subtotal
    pub line_item_subtotals: Vec<Decimal>,
    /// Refund line-item connection reported more pages than were fetched
    #[serde(default)]
    pub line_items_truncated: bool,
    pub shipping_refund: Decimal,
    pub tax_refund: Decimal,
    pub return_fee: Decimal,
}

impl RefundRecord {
    /// Sum of refunded line-item subtotals
    pub fn returned_amount(&self) -> Decimal {
        self.line_item_subtotals.iter().copied().sum()
    }

    /// Zero total refunded while line items still carry value
    pub fn is_zero_total(&self) -> bool {
        self.total_refunded.is_zero() && !self.returned_amount().is_zero()
    }
}

/// Full order record (batch detail payload)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: String,
    /// Display name, e.g. `#1001`
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub line_items: Vec<LineItem>,
    /// Line-item connection reported more pages than were fetched
    #[serde(default)]
    pub line_items_truncated: bool,
    pub refunds: Vec<RefundRecord>,
    pub shipping_charge: Decimal,
    pub tax_total: Decimal,
    pub discount_total: Decimal,
}

impl OrderRecord {
    /// Σ `original_unit_price × quantity`
    pub fn gross_sales(&self) -> Decimal {
        self.line_items.iter().map(LineItem::gross).sum()
    }

    pub fn item_count(&self) -> i64 {
        self.line_items.iter().map(|li| li.quantity).sum()
    }

    /// Σ quantity of line items carrying a design id
    pub fn design_count(&self) -> i64 {
        self.line_items
            .iter()
            .filter(|li| li.has_design())
            .map(|li| li.quantity)
            .sum()
    }

    /// Either the order or any refund hit a nested connection limit
    pub fn is_possibly_truncated(&self) -> bool {
        self.line_items_truncated || self.refunds.iter().any(|r| r.line_items_truncated)
    }

    pub fn summary(&self) -> OrderSummary {
        OrderSummary {
            id: self.id.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
