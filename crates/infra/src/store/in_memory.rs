use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, RwLock};

use serde_json::Value as JsonValue;
use uuid::Uuid;

use reclaim_core::TenantId;

use super::r#trait::{Collection, Precondition, RecordQuery, RecordStore, StoreError, UnitOfWork, WriteOp};

type Documents = BTreeMap<Uuid, JsonValue>;

/// In-memory document store.
///
/// Intended for tests and single-process deployments. A commit holds the write
/// lock for its whole duration, which is what makes it atomic.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    collections: RwLock<HashMap<(TenantId, Collection), Documents>>,
    fail_next_commit: Mutex<Option<String>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next commit fail with a backend error (after validation, before
    /// any write).
    pub fn fail_next_commit(&self, reason: impl Into<String>) {
        if let Ok(mut slot) = self.fail_next_commit.lock() {
            *slot = Some(reason.into());
        }
    }

    pub fn len(&self, tenant_id: TenantId, collection: Collection) -> usize {
        self.collections
            .read()
            .map(|c| c.get(&(tenant_id, collection)).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    fn revision_of(document: Option<&JsonValue>) -> u64 {
        document
            .and_then(|d| d.get("revision"))
            .and_then(JsonValue::as_u64)
            .unwrap_or(0)
    }

    fn check_precondition(
        collections: &HashMap<(TenantId, Collection), Documents>,
        tenant_id: TenantId,
        precondition: &Precondition,
    ) -> Result<(), StoreError> {
        let current = Self::revision_of(
            collections
                .get(&(tenant_id, precondition.collection))
                .and_then(|docs| docs.get(&precondition.id)),
        );
        if precondition.expected.matches(current) {
            Ok(())
        } else {
            Err(StoreError::Concurrency(format!(
                "{} {}: expected {:?}, found revision {current}",
                precondition.collection, precondition.id, precondition.expected
            )))
        }
    }

    fn check_tenant(tenant_id: TenantId, op: &WriteOp) -> Result<(), StoreError> {
        let WriteOp::Upsert { collection, id, document } = op else {
            return Ok(());
        };
        match document.get("tenant_id") {
            None => Ok(()),
            Some(value) if *value == JsonValue::String(tenant_id.to_string()) => Ok(()),
            Some(value) => Err(StoreError::TenantIsolation(format!(
                "{collection} {id} carries tenant_id {value} inside tenant {tenant_id}"
            ))),
        }
    }
}

/// Numbers compare numerically, everything else by its JSON text.
fn compare_field(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => {
            if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                x.cmp(&y)
            } else if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x.cmp(&y)
            } else {
                let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
        }
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl RecordStore for InMemoryRecordStore {
    fn get(&self, tenant_id: TenantId, collection: Collection, id: Uuid) -> Result<Option<JsonValue>, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        Ok(collections
            .get(&(tenant_id, collection))
            .and_then(|docs| docs.get(&id))
            .cloned())
    }

    fn query(&self, tenant_id: TenantId, query: &RecordQuery) -> Result<Vec<JsonValue>, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        let mut found: Vec<JsonValue> = collections
            .get(&(tenant_id, query.collection))
            .map(|docs| docs.values().filter(|d| query.matches(d)).cloned().collect())
            .unwrap_or_default();

        if let Some(field) = &query.order_by {
            found.sort_by(|a, b| compare_field(a.get(field.as_str()), b.get(field.as_str())));
        }
        Ok(found)
    }

    fn commit(&self, tenant_id: TenantId, work: UnitOfWork) -> Result<(), StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        // 1) Validate everything before touching state.
        if let Some(precondition) = &work.precondition {
            Self::check_precondition(&collections, tenant_id, precondition)?;
        }
        for op in &work.ops {
            Self::check_tenant(tenant_id, op)?;
        }
        let injected = self.fail_next_commit.lock().ok().and_then(|mut slot| slot.take());
        if let Some(reason) = injected {
            return Err(StoreError::Backend(reason));
        }

        // 2) Apply (infallible from here on).
        for op in work.ops {
            match op {
                WriteOp::Upsert { collection, id, document } => {
                    collections.entry((tenant_id, collection)).or_default().insert(id, document);
                }
                WriteOp::Delete { collection, id } => {
                    if let Some(docs) = collections.get_mut(&(tenant_id, collection)) {
                        docs.remove(&id);
                    }
                }
            }
        }
        Ok(())
    }
}
