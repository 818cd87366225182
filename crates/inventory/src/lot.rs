use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use reclaim_core::{AggregateId, DomainError, Entity, TenantId};

/// SKU reference as stored on order lines and inventory lots.
///
/// Deserialization goes through [`SkuId::new`], so blank codes never reach a line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SkuId(String);

impl SkuId {
    /// Trimmed, non-empty SKU code.
    pub fn new(code: impl AsRef<str>) -> Result<Self, DomainError> {
        let code = code.as_ref().trim();
        if code.is_empty() {
            return Err(DomainError::invalid_id("SkuId: empty"));
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SkuId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SkuId::new(value)
    }
}

impl From<SkuId> for String {
    fn from(value: SkuId) -> Self {
        value.0
    }
}

impl core::fmt::Display for SkuId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryLotId(pub AggregateId);

impl InventoryLotId {
    pub fn new() -> Self {
        Self(AggregateId::new())
    }
}

impl Default for InventoryLotId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for InventoryLotId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LotStatus {
    Available,
    Reserved,
    Quarantined,
    Consumed,
}

/// A quantity of one SKU at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLot {
    pub lot_id: InventoryLotId,
    pub tenant_id: TenantId,
    pub sku_id: SkuId,
    /// Free-text warehouse/bin location; allocation ignores it.
    #[serde(default)]
    pub location: String,
    pub on_hand: Decimal,
    pub status: LotStatus,
}

impl InventoryLot {
    /// Quantity this lot contributes to availability.
    pub fn available_quantity(&self) -> Decimal {
        match self.status {
            LotStatus::Available => self.on_hand.max(Decimal::ZERO),
            LotStatus::Reserved | LotStatus::Quarantined | LotStatus::Consumed => Decimal::ZERO,
        }
    }
}

impl Entity for InventoryLot {
    type Id = InventoryLotId;

    fn id(&self) -> &Self::Id {
        &self.lot_id
    }
}
