use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reclaim_core::{TenantId, UserId};
use reclaim_events::Event;
use reclaim_tax::TaxBreakdown;

use crate::header::{HeaderDraft, SalesOrderId, SignatureRequest, SignatureStatus};
use crate::line::{LineAllocationRecord, LineDraft, SalesOrderLineId};

/// Event: SalesOrderCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrderCreated {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub header: HeaderDraft,
    pub lines: Vec<LineDraft>,
    pub created_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: HeaderUpdated. `tax_invalidated` is set when a tax input changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderUpdated {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub header: HeaderDraft,
    pub tax_invalidated: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LinesReplaced. `lines` is the full new set in order; `removed` lists
/// lines that no longer exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinesReplaced {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub lines: Vec<LineDraft>,
    pub removed: Vec<SalesOrderLineId>,
    pub tax_invalidated: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TaxComputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxComputed {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub breakdown: TaxBreakdown,
    pub inputs_digest: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ConvertedToDraft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedToDraft {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SignatureRequested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRequested {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub request: SignatureRequest,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ConfirmationPrinted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationPrinted {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SignatureStatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureStatusChanged {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub request_id: String,
    pub status: SignatureStatus,
    pub document_ref: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SignatureReceived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureReceived {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub document_ref: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderApproved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderApproved {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub approved_by: UserId,
    pub allocations: Vec<LineAllocationRecord>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ChangesRequested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangesRequested {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderReleased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReleased {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub released_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderPartiallyInvoiced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPartiallyInvoiced {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderClosed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderClosed {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub reason: String,
    pub cancelled_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDeleted {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SalesOrderEvent {
    SalesOrderCreated(SalesOrderCreated),
    HeaderUpdated(HeaderUpdated),
    LinesReplaced(LinesReplaced),
    TaxComputed(TaxComputed),
    ConvertedToDraft(ConvertedToDraft),
    SignatureRequested(SignatureRequested),
    ConfirmationPrinted(ConfirmationPrinted),
    SignatureStatusChanged(SignatureStatusChanged),
    SignatureReceived(SignatureReceived),
    OrderApproved(OrderApproved),
    ChangesRequested(ChangesRequested),
    OrderReleased(OrderReleased),
    OrderPartiallyInvoiced(OrderPartiallyInvoiced),
    OrderClosed(OrderClosed),
    OrderCancelled(OrderCancelled),
    OrderDeleted(OrderDeleted),
}

impl Event for SalesOrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SalesOrderEvent::SalesOrderCreated(_) => "sales.order.created",
            SalesOrderEvent::HeaderUpdated(_) => "sales.order.header_updated",
            SalesOrderEvent::LinesReplaced(_) => "sales.order.lines_replaced",
            SalesOrderEvent::TaxComputed(_) => "sales.order.tax_computed",
            SalesOrderEvent::ConvertedToDraft(_) => "sales.order.converted_to_draft",
            SalesOrderEvent::SignatureRequested(_) => "sales.order.signature_requested",
            SalesOrderEvent::ConfirmationPrinted(_) => "sales.order.confirmation_printed",
            SalesOrderEvent::SignatureStatusChanged(_) => "sales.order.signature_status_changed",
            SalesOrderEvent::SignatureReceived(_) => "sales.order.signature_received",
            SalesOrderEvent::OrderApproved(_) => "sales.order.approved",
            SalesOrderEvent::ChangesRequested(_) => "sales.order.changes_requested",
            SalesOrderEvent::OrderReleased(_) => "sales.order.released",
            SalesOrderEvent::OrderPartiallyInvoiced(_) => "sales.order.partially_invoiced",
            SalesOrderEvent::OrderClosed(_) => "sales.order.closed",
            SalesOrderEvent::OrderCancelled(_) => "sales.order.cancelled",
            SalesOrderEvent::OrderDeleted(_) => "sales.order.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SalesOrderEvent::SalesOrderCreated(e) => e.occurred_at,
            SalesOrderEvent::HeaderUpdated(e) => e.occurred_at,
            SalesOrderEvent::LinesReplaced(e) => e.occurred_at,
            SalesOrderEvent::TaxComputed(e) => e.occurred_at,
            SalesOrderEvent::ConvertedToDraft(e) => e.occurred_at,
            SalesOrderEvent::SignatureRequested(e) => e.occurred_at,
            SalesOrderEvent::ConfirmationPrinted(e) => e.occurred_at,
            SalesOrderEvent::SignatureStatusChanged(e) => e.occurred_at,
            SalesOrderEvent::SignatureReceived(e) => e.occurred_at,
            SalesOrderEvent::OrderApproved(e) => e.occurred_at,
            SalesOrderEvent::ChangesRequested(e) => e.occurred_at,
            SalesOrderEvent::OrderReleased(e) => e.occurred_at,
            SalesOrderEvent::OrderPartiallyInvoiced(e) => e.occurred_at,
            SalesOrderEvent::OrderClosed(e) => e.occurred_at,
            SalesOrderEvent::OrderCancelled(e) => e.occurred_at,
            SalesOrderEvent::OrderDeleted(e) => e.occurred_at,
        }
    }
}
