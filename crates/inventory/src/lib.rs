//! Inventory availability and allocation (pure domain logic, no IO).
//!
//! Lots are read from storage by the infrastructure layer; this crate only
//! decides how much of each order line the current stock can cover.

pub mod allocator;
pub mod lot;

pub use allocator::{AllocationRequest, AllocationStatus, LineAllocation, allocate, allocate_from_lots, available_by_sku};
pub use lot::{InventoryLot, InventoryLotId, LotStatus, SkuId};
