//! `TaxBreakdown`: the engine's output, persisted verbatim on the order header.
//!
//! Field names are part of the stored format and must not change.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use reclaim_core::ValueObject;

/// Which path produced a breakdown. Informational; the shape is the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakdownSource {
    RuleTable,
    External,
    /// Customer exempt: full totals, zero tax.
    Exempt,
    /// No resolvable region: full totals, zero tax.
    Unresolved,
}

/// One named tax applied to a basis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxComponent {
    pub name: String,
    pub rate: Decimal,
    pub amount: Decimal,
}

impl ValueObject for TaxComponent {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineTax {
    /// Caller-supplied line reference (the order line id).
    pub line_ref: String,
    /// `max(0, quantity × unit price − discount)`, rounded.
    pub net_amount: Decimal,
    /// Amount the rates were applied to (zero when not taxable).
    pub basis: Decimal,
    pub components: Vec<TaxComponent>,
    pub tax_total: Decimal,
    pub total_with_tax: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingTax {
    pub amount: Decimal,
    pub basis: Decimal,
    pub components: Vec<TaxComponent>,
    pub tax_total: Decimal,
    pub total_with_tax: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxTotals {
    /// Tax amount per tax name ("GST", "QST", "Sales Tax", ...).
    pub tax_by_type: BTreeMap<String, Decimal>,
    pub total_tax: Decimal,
    /// Sum of line net amounts plus shipping.
    pub subtotal: Decimal,
    pub grand_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBreakdown {
    pub source: BreakdownSource,
    pub lines: Vec<LineTax>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping: Option<ShippingTax>,
    pub totals: TaxTotals,
}

impl TaxBreakdown {
    pub fn total_tax(&self) -> Decimal {
        self.totals.total_tax
    }

    pub fn grand_total(&self) -> Decimal {
        self.totals.grand_total
    }

    pub fn line(&self, line_ref: &str) -> Option<&LineTax> {
        self.lines.iter().find(|l| l.line_ref == line_ref)
    }

    /// Amount recorded for a tax name (zero when absent).
    pub fn tax_for(&self, name: &str) -> Decimal {
        self.totals
            .tax_by_type
            .get(name)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}
