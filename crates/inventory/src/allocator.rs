//! Allocation of order lines against current stock.
//!
//! Every function here is pure: callers may run it for a preview as often as
//! they like. Each line is evaluated against the full availability of its SKU;
//! two lines for the same SKU do not consume each other's stock.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use reclaim_core::TenantId;

use crate::lot::{InventoryLot, SkuId};

/// One order line's demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub line_ref: String,
    pub sku_id: SkuId,
    pub needed: Decimal,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationStatus {
    Available,
    Backordered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAllocation {
    pub line_ref: String,
    pub sku_id: SkuId,
    pub needed: Decimal,
    pub available: Decimal,
    pub allocatable: Decimal,
    pub backordered: Decimal,
    pub status: AllocationStatus,
}

/// On-hand quantity per SKU across the tenant's available lots, any location.
pub fn available_by_sku(tenant_id: TenantId, lots: &[InventoryLot]) -> BTreeMap<SkuId, Decimal> {
    let mut out = BTreeMap::new();
    for lot in lots.iter().filter(|l| l.tenant_id == tenant_id) {
        *out.entry(lot.sku_id.clone()).or_insert(Decimal::ZERO) += lot.available_quantity();
    }
    out
}

/// `allocatable = min(needed, available)`, `backordered = max(0, needed - available)`.
pub fn allocate(lines: &[AllocationRequest], available: &BTreeMap<SkuId, Decimal>) -> Vec<LineAllocation> {
    lines
        .iter()
        .map(|line| {
            let needed = line.needed.max(Decimal::ZERO);
            let on_hand = available
                .get(&line.sku_id)
                .copied()
                .unwrap_or(Decimal::ZERO)
                .max(Decimal::ZERO);
            let allocatable = needed.min(on_hand);
            let backordered = (needed - on_hand).max(Decimal::ZERO);
            let status = if backordered > Decimal::ZERO {
                AllocationStatus::Backordered
            } else {
                AllocationStatus::Available
            };

            LineAllocation {
                line_ref: line.line_ref.clone(),
                sku_id: line.sku_id.clone(),
                needed,
                available: on_hand,
                allocatable,
                backordered,
                status,
            }
        })
        .collect()
}

pub fn allocate_from_lots(
    tenant_id: TenantId,
    lines: &[AllocationRequest],
    lots: &[InventoryLot],
) -> Vec<LineAllocation> {
    allocate(lines, &available_by_sku(tenant_id, lots))
}
