use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use reclaim_core::{AggregateId, Entity, round_money};
use reclaim_inventory::SkuId;
use reclaim_tax::TaxCategory;

use crate::header::SalesOrderId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SalesOrderLineId(pub AggregateId);

impl SalesOrderLineId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SalesOrderLineId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Desired state of one line, as submitted on create or line replacement.
///
/// A `line_id` that already exists on the order updates that line; any other
/// id inserts a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDraft {
    pub line_id: SalesOrderLineId,
    pub sku_id: SkuId,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    #[serde(default)]
    pub tax_category: TaxCategory,
    pub quantity_ordered: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub unit_of_measure: String,
    /// Product tax code forwarded to the external tax service.
    #[serde(default)]
    pub external_tax_code: Option<String>,
}

/// A persisted order line with its SKU snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrderLine {
    pub line_id: SalesOrderLineId,
    pub order_id: SalesOrderId,
    pub line_no: u32,
    pub sku_id: SkuId,
    pub description: String,
    pub category: String,
    pub sub_category: String,
    pub tax_category: TaxCategory,
    pub quantity_ordered: Decimal,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub unit_of_measure: String,
    #[serde(default)]
    pub external_tax_code: Option<String>,
    /// Set only by approval.
    #[serde(default)]
    pub quantity_allocated: Option<Decimal>,
    #[serde(default)]
    pub quantity_backordered: Option<Decimal>,
}

impl SalesOrderLine {
    pub(crate) fn from_draft(order_id: SalesOrderId, line_no: u32, draft: &LineDraft) -> Self {
        Self {
            line_id: draft.line_id,
            order_id,
            line_no,
            sku_id: draft.sku_id.clone(),
            description: draft.description.clone(),
            category: draft.category.clone(),
            sub_category: draft.sub_category.clone(),
            tax_category: draft.tax_category.clone(),
            quantity_ordered: draft.quantity_ordered,
            unit_price: draft.unit_price,
            discount: draft.discount,
            unit_of_measure: draft.unit_of_measure.clone(),
            external_tax_code: draft.external_tax_code.clone(),
            quantity_allocated: None,
            quantity_backordered: None,
        }
    }

    /// Counts toward "at least one valid line" at submission.
    pub fn is_valid(&self) -> bool {
        self.quantity_ordered > Decimal::ZERO
            && self.unit_price >= Decimal::ZERO
            && self.discount >= Decimal::ZERO
    }

    pub fn net_amount(&self) -> Decimal {
        round_money((self.quantity_ordered * self.unit_price - self.discount).max(Decimal::ZERO))
    }

    pub fn is_allocated(&self) -> bool {
        self.quantity_allocated.is_some()
    }
}

impl Entity for SalesOrderLine {
    type Id = SalesOrderLineId;

    fn id(&self) -> &Self::Id {
        &self.line_id
    }
}

/// Allocation outcome persisted onto a line at approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAllocationRecord {
    pub line_id: SalesOrderLineId,
    pub quantity_allocated: Decimal,
    pub quantity_backordered: Decimal,
}
