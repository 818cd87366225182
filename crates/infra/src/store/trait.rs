use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use reclaim_core::{ExpectedVersion, TenantId};

/// Named record collections the engine reads and writes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    SalesOrders,
    SalesOrderLines,
    InventoryLots,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::SalesOrders => "sales_orders",
            Collection::SalesOrderLines => "sales_order_lines",
            Collection::InventoryLots => "inventory_lots",
        }
    }
}

impl core::fmt::Display for Collection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-equality filter plus optional ordering over one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordQuery {
    pub collection: Collection,
    pub filters: Vec<(String, JsonValue)>,
    pub order_by: Option<String>,
}

impl RecordQuery {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: None,
        }
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    /// Whether a document satisfies every filter.
    pub fn matches(&self, document: &JsonValue) -> bool {
        self.filters
            .iter()
            .all(|(field, value)| document.get(field.as_str()) == Some(value))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Upsert {
        collection: Collection,
        id: Uuid,
        document: JsonValue,
    },
    Delete {
        collection: Collection,
        id: Uuid,
    },
}

/// The `revision` field a record must carry for the commit to proceed.
///
/// A missing record counts as revision 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Precondition {
    pub collection: Collection,
    pub id: Uuid,
    pub expected: ExpectedVersion,
}

/// All-or-nothing batch of writes within one tenant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitOfWork {
    pub precondition: Option<Precondition>,
    pub ops: Vec<WriteOp>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_revision(mut self, collection: Collection, id: Uuid, expected: ExpectedVersion) -> Self {
        self.precondition = Some(Precondition { collection, id, expected });
        self
    }

    pub fn upsert(&mut self, collection: Collection, id: Uuid, document: JsonValue) {
        self.ops.push(WriteOp::Upsert { collection, id, document });
    }

    pub fn delete(&mut self, collection: Collection, id: Uuid) {
        self.ops.push(WriteOp::Delete { collection, id });
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Persistence failure.
///
/// Storage, concurrency and isolation problems, as opposed to domain errors.
/// A failed commit has written nothing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("record serialization failed: {0}")]
    Serialization(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        StoreError::Serialization(value.to_string())
    }
}

/// Tenant-scoped document store.
///
/// - Every read and write is scoped to the tenant passed in; documents that
///   carry a `tenant_id` field must carry that tenant.
/// - `commit` checks the precondition and applies every op, or applies none.
pub trait RecordStore: Send + Sync {
    fn get(&self, tenant_id: TenantId, collection: Collection, id: Uuid) -> Result<Option<JsonValue>, StoreError>;

    fn query(&self, tenant_id: TenantId, query: &RecordQuery) -> Result<Vec<JsonValue>, StoreError>;

    fn commit(&self, tenant_id: TenantId, work: UnitOfWork) -> Result<(), StoreError>;
}

impl<S> RecordStore for std::sync::Arc<S>
where
    S: RecordStore + ?Sized,
{
    fn get(&self, tenant_id: TenantId, collection: Collection, id: Uuid) -> Result<Option<JsonValue>, StoreError> {
        (**self).get(tenant_id, collection, id)
    }

    fn query(&self, tenant_id: TenantId, query: &RecordQuery) -> Result<Vec<JsonValue>, StoreError> {
        (**self).query(tenant_id, query)
    }

    fn commit(&self, tenant_id: TenantId, work: UnitOfWork) -> Result<(), StoreError> {
        (**self).commit(tenant_id, work)
    }
}
