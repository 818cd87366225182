//! Typed repositories over the [`RecordStore`].
//!
//! The order aggregate is persisted as one header document plus one document
//! per line; every save is a single unit of work guarded by the header revision
//! the aggregate was loaded at.

use std::collections::BTreeSet;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use reclaim_core::{AggregateRoot, ExpectedVersion, TenantId};
use reclaim_inventory::{InventoryLot, SkuId};
use reclaim_sales::{OrderHeader, SalesOrder, SalesOrderId, SalesOrderLine, SalesOrderLineId};

use crate::store::{Collection, RecordQuery, RecordStore, StoreError, UnitOfWork};

fn decode<T: DeserializeOwned>(document: JsonValue) -> Result<T, StoreError> {
    Ok(serde_json::from_value(document)?)
}

fn encode<T: Serialize>(value: &T) -> Result<JsonValue, StoreError> {
    Ok(serde_json::to_value(value)?)
}

fn order_key(order_id: SalesOrderId) -> Uuid {
    *order_id.0.as_uuid()
}

/// Line ids come from the caller and are only unique within one order, so the
/// record key is derived from both.
fn line_key(order_id: SalesOrderId, line_id: SalesOrderLineId) -> Uuid {
    Uuid::new_v5(order_id.0.as_uuid(), line_id.0.as_uuid().as_bytes())
}

pub struct OrderRepository<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> OrderRepository<'a, S>
where
    S: RecordStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Header plus lines ordered by `line_no`, or `None` if the tenant has no such order.
    pub fn load(&self, tenant_id: TenantId, order_id: SalesOrderId) -> Result<Option<SalesOrder>, StoreError> {
        let Some(document) = self.store.get(tenant_id, Collection::SalesOrders, order_key(order_id))? else {
            return Ok(None);
        };
        let header: OrderHeader = decode(document)?;
        if header.tenant_id != tenant_id {
            return Err(StoreError::TenantIsolation(format!("order {order_id} belongs to another tenant")));
        }

        let query = RecordQuery::new(Collection::SalesOrderLines)
            .filter("order_id", order_id.to_string())
            .order_by("line_no");
        let lines = self
            .store
            .query(tenant_id, &query)?
            .into_iter()
            .map(decode::<SalesOrderLine>)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(SalesOrder::from_records(header, lines)))
    }

    /// Persist `after` in one commit, provided the stored header is still at
    /// `before`'s revision.
    ///
    /// Lines present in `before` but not in `after` are deleted; a deleted
    /// order removes the header and every line.
    pub fn save(&self, tenant_id: TenantId, before: &SalesOrder, after: &SalesOrder) -> Result<(), StoreError> {
        let order_id = after.id_typed();
        let order_key = order_key(order_id);
        let mut work = UnitOfWork::new().expect_revision(
            Collection::SalesOrders,
            order_key,
            ExpectedVersion::Exact(before.version()),
        );

        let previous: BTreeSet<Uuid> = before.lines().iter().map(|l| line_key(order_id, l.line_id)).collect();

        if after.is_deleted() {
            work.delete(Collection::SalesOrders, order_key);
            for line in previous {
                work.delete(Collection::SalesOrderLines, line);
            }
            return self.store.commit(tenant_id, work);
        }

        let header = after
            .header()
            .ok_or_else(|| StoreError::NotFound(format!("order {order_id}")))?;
        work.upsert(Collection::SalesOrders, order_key, encode(header)?);

        let mut kept = BTreeSet::new();
        for line in after.lines() {
            let key = line_key(order_id, line.line_id);
            kept.insert(key);
            work.upsert(Collection::SalesOrderLines, key, encode(line)?);
        }
        for line in previous.difference(&kept) {
            work.delete(Collection::SalesOrderLines, *line);
        }

        self.store.commit(tenant_id, work)
    }
}

pub struct InventoryRepository<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> InventoryRepository<'a, S>
where
    S: RecordStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Every lot (any status) of the given SKUs.
    pub fn lots_for(&self, tenant_id: TenantId, skus: &BTreeSet<SkuId>) -> Result<Vec<InventoryLot>, StoreError> {
        let mut lots = Vec::new();
        for sku in skus {
            let query = RecordQuery::new(Collection::InventoryLots).filter("sku_id", sku.as_str());
            for document in self.store.query(tenant_id, &query)? {
                lots.push(decode::<InventoryLot>(document)?);
            }
        }
        Ok(lots)
    }

    pub fn put(&self, tenant_id: TenantId, lots: &[InventoryLot]) -> Result<(), StoreError> {
        let mut work = UnitOfWork::new();
        for lot in lots {
            work.upsert(Collection::InventoryLots, *lot.lot_id.0.as_uuid(), encode(lot)?);
        }
        self.store.commit(tenant_id, work)
    }
}
