//! Order operations orchestration.
//!
//! Every mutating operation follows the same pipeline:
//!
//! ```text
//! authorize → load → check expected revision → (collaborators) → handle/apply
//!   → atomic commit → publish events
//! ```
//!
//! The aggregate decides; this module performs the IO around it. Nothing is
//! published unless the commit succeeded, and a failed step leaves the stored
//! order exactly as it was.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use reclaim_auth::{Permission, Principal, Role, authorize};
use reclaim_core::{AggregateId, AggregateRoot, ExpectedVersion, PostalAddress, TenantId, UserId};
use reclaim_events::{EventBus, EventEnvelope};
use reclaim_inventory::{LineAllocation, SkuId, allocate_from_lots};
use reclaim_sales::{
    Approve, AttachTaxBreakdown, Cancel, Close, ConfirmManually, ConvertToDraft, CreateSalesOrder, DeleteOrder,
    HeaderDraft, LineDraft, MarkPartiallyInvoiced, OrderError, OrderGuard, RecordSignatureStatus, Release,
    ReplaceLines, RequestChanges, SalesOrder, SalesOrderCommand, SalesOrderEvent, SalesOrderId, SalesOrderStatus,
    SignatureRequest, SignatureStatus, SubmitForSignature, UpdateHeader,
};
use reclaim_tax::{ExternalTaxCalculator, TaxEngine};

use crate::error::OrderServiceError;
use crate::repository::{InventoryRepository, OrderRepository};
use crate::signature::{SignatureDispatch, SignatureService};
use crate::store::RecordStore;

pub const AGGREGATE_TYPE: &str = "sales.order";

/// Session data supplied by the upstream authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub role: Role,
}

impl SessionContext {
    pub fn new(tenant_id: TenantId, user_id: UserId, role: Role) -> Self {
        Self { tenant_id, user_id, role }
    }

    pub fn principal(&self) -> Principal {
        Principal::from_session(self.tenant_id, self.user_id, self.role.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub header: HeaderDraft,
    pub lines: Vec<LineDraft>,
}

/// Header and/or full line set; `None` leaves that part untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderUpdate {
    pub header: Option<HeaderDraft>,
    pub lines: Option<Vec<LineDraft>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signer {
    pub email: String,
    pub name: String,
}

/// Provider callback for a dispatched signature request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureCallback {
    pub order_id: SalesOrderId,
    pub request_id: String,
    pub status: SignatureStatus,
    pub document_ref: Option<String>,
}

pub struct OrderService<S, X, G, B> {
    store: S,
    tax: TaxEngine<X>,
    signatures: G,
    bus: B,
    ship_from: Option<PostalAddress>,
}

impl<S, X, G, B> OrderService<S, X, G, B>
where
    S: RecordStore,
    X: ExternalTaxCalculator,
    G: SignatureService,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(store: S, external_tax: X, signatures: G, bus: B) -> Self {
        Self {
            store,
            tax: TaxEngine::new(external_tax),
            signatures,
            bus,
            ship_from: None,
        }
    }

    /// Origin address forwarded to the external tax service.
    pub fn with_ship_from(mut self, ship_from: Option<PostalAddress>) -> Self {
        self.ship_from = ship_from;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn create(&self, session: &SessionContext, order: NewOrder) -> Result<SalesOrder, OrderServiceError> {
        self.authorize(session, &Permission::ORDERS_WRITE)?;
        let order_id = SalesOrderId::new(AggregateId::new());

        self.run(session.tenant_id, order_id, ExpectedVersion::Exact(0), "create", true, |_, at| {
            Ok(vec![SalesOrderCommand::CreateSalesOrder(CreateSalesOrder {
                tenant_id: session.tenant_id,
                order_id,
                header: order.header,
                lines: order.lines,
                created_by: session.user_id,
                occurred_at: at,
            })])
        })
    }

    pub fn get(&self, session: &SessionContext, order_id: SalesOrderId) -> Result<SalesOrder, OrderServiceError> {
        self.load(session.tenant_id, order_id)
    }

    pub fn update(
        &self,
        session: &SessionContext,
        order_id: SalesOrderId,
        expected: ExpectedVersion,
        update: OrderUpdate,
    ) -> Result<SalesOrder, OrderServiceError> {
        self.authorize(session, &Permission::ORDERS_WRITE)?;
        let tenant_id = session.tenant_id;

        self.run(tenant_id, order_id, expected, "update", false, |_, at| {
            let mut commands = Vec::new();
            if let Some(header) = update.header {
                commands.push(SalesOrderCommand::UpdateHeader(UpdateHeader {
                    tenant_id,
                    order_id,
                    header,
                    occurred_at: at,
                }));
            }
            if let Some(lines) = update.lines {
                commands.push(SalesOrderCommand::ReplaceLines(ReplaceLines {
                    tenant_id,
                    order_id,
                    lines,
                    occurred_at: at,
                }));
            }
            Ok(commands)
        })
    }

    /// Compute tax for the current inputs and store it with their digest.
    pub fn compute_tax(
        &self,
        session: &SessionContext,
        order_id: SalesOrderId,
        expected: ExpectedVersion,
    ) -> Result<SalesOrder, OrderServiceError> {
        self.authorize(session, &Permission::ORDERS_WRITE)?;
        let tenant_id = session.tenant_id;

        self.run(tenant_id, order_id, expected, "compute_tax", false, |order, at| {
            if let Some(status) = order.status().filter(|s| !s.accepts_tax_computation()) {
                return Err(OrderError::NotEditable(status).into());
            }
            let request = order.tax_request(self.ship_from.clone())?;
            let breakdown = self.tax.compute(&request)?;
            Ok(vec![SalesOrderCommand::AttachTaxBreakdown(AttachTaxBreakdown {
                tenant_id,
                order_id,
                breakdown,
                occurred_at: at,
            })])
        })
    }

    pub fn convert_to_draft(
        &self,
        session: &SessionContext,
        order_id: SalesOrderId,
        expected: ExpectedVersion,
    ) -> Result<SalesOrder, OrderServiceError> {
        self.authorize(session, &Permission::ORDERS_WRITE)?;
        let tenant_id = session.tenant_id;

        self.run(tenant_id, order_id, expected, "convert_to_draft", false, |_, at| {
            Ok(vec![SalesOrderCommand::ConvertToDraft(ConvertToDraft {
                tenant_id,
                order_id,
                occurred_at: at,
            })])
        })
    }

    /// Dispatch an e-signature request, then move to PENDING_CUSTOMER_SIGNATURE.
    ///
    /// Guards are checked before dispatch; a dispatch failure leaves the order
    /// untouched.
    pub fn submit_for_signature(
        &self,
        session: &SessionContext,
        order_id: SalesOrderId,
        expected: ExpectedVersion,
        signer: Signer,
    ) -> Result<SalesOrder, OrderServiceError> {
        self.authorize(session, &Permission::ORDERS_WRITE)?;
        let tenant_id = session.tenant_id;

        self.run(tenant_id, order_id, expected, "submit_for_signature", false, |order, at| {
            order.ensure_can_submit(SalesOrderStatus::PendingCustomerSignature)?;
            let signer_email = signer.email.trim().to_string();
            if signer_email.is_empty() {
                return Err(OrderError::from(OrderGuard::SignerEmailMissing).into());
            }
            let signer_name = signer.name.trim().to_string();

            let request_id = self
                .signatures
                .dispatch(&SignatureDispatch {
                    tenant_id,
                    order_id,
                    signer_email: signer_email.clone(),
                    signer_name: signer_name.clone(),
                })
                .inspect_err(|err| warn!(%tenant_id, %order_id, error = %err, "e-signature dispatch failed"))?;

            Ok(vec![SalesOrderCommand::SubmitForSignature(SubmitForSignature {
                tenant_id,
                order_id,
                request: SignatureRequest {
                    request_id,
                    signer_email,
                    signer_name,
                },
                occurred_at: at,
            })])
        })
    }

    /// Printed confirmation path: straight to PENDING_APPROVAL.
    pub fn confirm_manually(
        &self,
        session: &SessionContext,
        order_id: SalesOrderId,
        expected: ExpectedVersion,
    ) -> Result<SalesOrder, OrderServiceError> {
        self.authorize(session, &Permission::ORDERS_WRITE)?;
        let tenant_id = session.tenant_id;

        self.run(tenant_id, order_id, expected, "confirm_manually", false, |_, at| {
            Ok(vec![SalesOrderCommand::ConfirmManually(ConfirmManually {
                tenant_id,
                order_id,
                occurred_at: at,
            })])
        })
    }

    /// Apply a provider callback. Callbacks are not user actions, so there is no
    /// permission check and no revision expectation.
    pub fn record_signature_status(
        &self,
        tenant_id: TenantId,
        callback: SignatureCallback,
    ) -> Result<SalesOrder, OrderServiceError> {
        let order_id = callback.order_id;

        self.run(tenant_id, order_id, ExpectedVersion::Any, "record_signature_status", false, |_, at| {
            Ok(vec![SalesOrderCommand::RecordSignatureStatus(RecordSignatureStatus {
                tenant_id,
                order_id,
                request_id: callback.request_id,
                status: callback.status,
                document_ref: callback.document_ref,
                occurred_at: at,
            })])
        })
    }

    /// Approve and persist per-line allocation against current inventory, in
    /// one commit with the status change.
    pub fn approve(
        &self,
        session: &SessionContext,
        order_id: SalesOrderId,
        expected: ExpectedVersion,
    ) -> Result<SalesOrder, OrderServiceError> {
        self.authorize(session, &Permission::ORDERS_APPROVE)?;
        let tenant_id = session.tenant_id;

        self.run(tenant_id, order_id, expected, "approve", false, |order, at| {
            let allocations = self.allocate(tenant_id, order)?;
            Ok(vec![SalesOrderCommand::Approve(Approve {
                tenant_id,
                order_id,
                approved_by: session.user_id,
                allocations,
                occurred_at: at,
            })])
        })
    }

    pub fn request_changes(
        &self,
        session: &SessionContext,
        order_id: SalesOrderId,
        expected: ExpectedVersion,
        note: Option<String>,
    ) -> Result<SalesOrder, OrderServiceError> {
        self.authorize(session, &Permission::ORDERS_WRITE)?;
        let tenant_id = session.tenant_id;

        self.run(tenant_id, order_id, expected, "request_changes", false, |_, at| {
            Ok(vec![SalesOrderCommand::RequestChanges(RequestChanges {
                tenant_id,
                order_id,
                note,
                occurred_at: at,
            })])
        })
    }

    pub fn release(
        &self,
        session: &SessionContext,
        order_id: SalesOrderId,
        expected: ExpectedVersion,
    ) -> Result<SalesOrder, OrderServiceError> {
        self.authorize(session, &Permission::ORDERS_RELEASE)?;
        let tenant_id = session.tenant_id;

        self.run(tenant_id, order_id, expected, "release", false, |_, at| {
            Ok(vec![SalesOrderCommand::Release(Release {
                tenant_id,
                order_id,
                released_by: session.user_id,
                occurred_at: at,
            })])
        })
    }

    pub fn mark_partially_invoiced(
        &self,
        session: &SessionContext,
        order_id: SalesOrderId,
        expected: ExpectedVersion,
    ) -> Result<SalesOrder, OrderServiceError> {
        self.authorize(session, &Permission::ORDERS_WRITE)?;
        let tenant_id = session.tenant_id;

        self.run(tenant_id, order_id, expected, "mark_partially_invoiced", false, |_, at| {
            Ok(vec![SalesOrderCommand::MarkPartiallyInvoiced(MarkPartiallyInvoiced {
                tenant_id,
                order_id,
                occurred_at: at,
            })])
        })
    }

    pub fn close(
        &self,
        session: &SessionContext,
        order_id: SalesOrderId,
        expected: ExpectedVersion,
    ) -> Result<SalesOrder, OrderServiceError> {
        self.authorize(session, &Permission::ORDERS_WRITE)?;
        let tenant_id = session.tenant_id;

        self.run(tenant_id, order_id, expected, "close", false, |_, at| {
            Ok(vec![SalesOrderCommand::Close(Close {
                tenant_id,
                order_id,
                occurred_at: at,
            })])
        })
    }

    pub fn cancel(
        &self,
        session: &SessionContext,
        order_id: SalesOrderId,
        expected: ExpectedVersion,
        reason: String,
    ) -> Result<SalesOrder, OrderServiceError> {
        self.authorize(session, &Permission::ORDERS_WRITE)?;
        let tenant_id = session.tenant_id;

        self.run(tenant_id, order_id, expected, "cancel", false, |_, at| {
            Ok(vec![SalesOrderCommand::Cancel(Cancel {
                tenant_id,
                order_id,
                reason,
                cancelled_by: session.user_id,
                occurred_at: at,
            })])
        })
    }

    /// Hard delete of header and lines, only while the order is editable.
    pub fn delete(
        &self,
        session: &SessionContext,
        order_id: SalesOrderId,
        expected: ExpectedVersion,
    ) -> Result<(), OrderServiceError> {
        self.authorize(session, &Permission::ORDERS_WRITE)?;
        let tenant_id = session.tenant_id;

        self.run(tenant_id, order_id, expected, "delete", false, |_, at| {
            Ok(vec![SalesOrderCommand::DeleteOrder(DeleteOrder {
                tenant_id,
                order_id,
                occurred_at: at,
            })])
        })
        .map(|_| ())
    }

    /// Allocator output for the current lines and inventory. Persists nothing.
    pub fn preview_allocation(
        &self,
        session: &SessionContext,
        order_id: SalesOrderId,
    ) -> Result<Vec<LineAllocation>, OrderServiceError> {
        let order = self.load(session.tenant_id, order_id)?;
        self.allocate(session.tenant_id, &order)
    }

    fn authorize(&self, session: &SessionContext, permission: &Permission) -> Result<(), OrderServiceError> {
        authorize(&session.principal(), permission).map_err(|err| {
            warn!(tenant_id = %session.tenant_id, user_id = %session.user_id, role = %session.role, %permission, "operation forbidden");
            OrderServiceError::from(err)
        })
    }

    fn load(&self, tenant_id: TenantId, order_id: SalesOrderId) -> Result<SalesOrder, OrderServiceError> {
        OrderRepository::new(&self.store)
            .load(tenant_id, order_id)?
            .ok_or(OrderServiceError::NotFound(order_id))
    }

    fn allocate(&self, tenant_id: TenantId, order: &SalesOrder) -> Result<Vec<LineAllocation>, OrderServiceError> {
        let requests = order.allocation_requests();
        let skus: BTreeSet<SkuId> = requests.iter().map(|r| r.sku_id.clone()).collect();
        let lots = InventoryRepository::new(&self.store).lots_for(tenant_id, &skus)?;
        Ok(allocate_from_lots(tenant_id, &requests, &lots))
    }

    /// The shared mutation pipeline. `decide` sees the loaded order and returns
    /// the commands to run against it, in order.
    fn run<F>(
        &self,
        tenant_id: TenantId,
        order_id: SalesOrderId,
        expected: ExpectedVersion,
        operation: &'static str,
        allow_missing: bool,
        decide: F,
    ) -> Result<SalesOrder, OrderServiceError>
    where
        F: FnOnce(&SalesOrder, DateTime<Utc>) -> Result<Vec<SalesOrderCommand>, OrderServiceError>,
    {
        let result = self.run_inner(tenant_id, order_id, expected, operation, allow_missing, decide);
        if let Err(err) = &result {
            warn!(%tenant_id, %order_id, operation, code = err.code(), error = %err, "order operation rejected");
        }
        result
    }

    fn run_inner<F>(
        &self,
        tenant_id: TenantId,
        order_id: SalesOrderId,
        expected: ExpectedVersion,
        operation: &'static str,
        allow_missing: bool,
        decide: F,
    ) -> Result<SalesOrder, OrderServiceError>
    where
        F: FnOnce(&SalesOrder, DateTime<Utc>) -> Result<Vec<SalesOrderCommand>, OrderServiceError>,
    {
        let repository = OrderRepository::new(&self.store);

        // 1) Load (tenant-scoped).
        let before = match repository.load(tenant_id, order_id)? {
            Some(order) => order,
            None if allow_missing => SalesOrder::empty(order_id),
            None => return Err(OrderServiceError::NotFound(order_id)),
        };

        // 2) Client revision expectation.
        if !expected.matches(before.version()) {
            return Err(OrderServiceError::RevisionMismatch {
                expected: match expected {
                    ExpectedVersion::Exact(v) => v,
                    ExpectedVersion::Any => before.version(),
                },
                actual: before.version(),
            });
        }

        // 3) Decide and evolve.
        let at = Utc::now();
        let commands = decide(&before, at)?;
        let mut after = before.clone();
        let mut events = Vec::new();
        for command in &commands {
            events.extend(after.execute(command)?);
        }

        // 4) Commit header and lines together, guarded by the loaded revision.
        repository.save(tenant_id, &before, &after)?;

        // 5) Publish only what was committed.
        self.publish(tenant_id, order_id, before.version(), &events);

        info!(
            %tenant_id,
            %order_id,
            operation,
            from = ?before.status(),
            to = ?after.status(),
            revision = after.version(),
            "order updated"
        );
        Ok(after)
    }

    /// Delivery is at-least-once; a failure here is logged because the order
    /// is already committed.
    fn publish(&self, tenant_id: TenantId, order_id: SalesOrderId, base_revision: u64, events: &[SalesOrderEvent]) {
        for (offset, event) in events.iter().enumerate() {
            let revision = base_revision + offset as u64 + 1;
            let envelope = match EventEnvelope::from_typed(tenant_id, order_id.0, AGGREGATE_TYPE, revision, event) {
                Ok(envelope) => envelope,
                Err(err) => {
                    warn!(%tenant_id, %order_id, revision, error = %err, "failed to serialize order event");
                    continue;
                }
            };
            if let Err(err) = self.bus.publish(envelope) {
                warn!(%tenant_id, %order_id, revision, error = ?err, "failed to publish order event");
            }
        }
    }
}
