use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reclaim_core::{TenantId, UserId};
use reclaim_inventory::LineAllocation;
use reclaim_tax::TaxBreakdown;

use crate::header::{HeaderDraft, SalesOrderId, SignatureRequest, SignatureStatus};
use crate::line::LineDraft;

/// Command: CreateSalesOrder. Header and lines are created together as a quotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSalesOrder {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub header: HeaderDraft,
    pub lines: Vec<LineDraft>,
    pub created_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateHeader (full replacement of the editable header fields).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateHeader {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub header: HeaderDraft,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReplaceLines (the complete desired line set).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceLines {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub lines: Vec<LineDraft>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AttachTaxBreakdown. The breakdown must come from the current inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachTaxBreakdown {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub breakdown: TaxBreakdown,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ConvertToDraft (QUOTATION → DRAFT).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertToDraft {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SubmitForSignature. Issued after the e-signature request was dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitForSignature {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub request: SignatureRequest,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ConfirmManually (printed confirmation instead of e-signature).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmManually {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordSignatureStatus (e-signature callback).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSignatureStatus {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub request_id: String,
    pub status: SignatureStatus,
    pub document_ref: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Approve. Carries the allocator output for the current lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approve {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub approved_by: UserId,
    pub allocations: Vec<LineAllocation>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RequestChanges (PENDING_APPROVAL → NEEDS_UPDATE).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestChanges {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub released_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkPartiallyInvoiced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkPartiallyInvoiced {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Close {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Cancel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancel {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub reason: String,
    pub cancelled_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteOrder (hard delete while editable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOrder {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SalesOrderCommand {
    CreateSalesOrder(CreateSalesOrder),
    UpdateHeader(UpdateHeader),
    ReplaceLines(ReplaceLines),
    AttachTaxBreakdown(AttachTaxBreakdown),
    ConvertToDraft(ConvertToDraft),
    SubmitForSignature(SubmitForSignature),
    ConfirmManually(ConfirmManually),
    RecordSignatureStatus(RecordSignatureStatus),
    Approve(Approve),
    RequestChanges(RequestChanges),
    Release(Release),
    MarkPartiallyInvoiced(MarkPartiallyInvoiced),
    Close(Close),
    Cancel(Cancel),
    DeleteOrder(DeleteOrder),
}

impl SalesOrderCommand {
    pub fn tenant_id(&self) -> TenantId {
        match self {
            SalesOrderCommand::CreateSalesOrder(c) => c.tenant_id,
            SalesOrderCommand::UpdateHeader(c) => c.tenant_id,
            SalesOrderCommand::ReplaceLines(c) => c.tenant_id,
            SalesOrderCommand::AttachTaxBreakdown(c) => c.tenant_id,
            SalesOrderCommand::ConvertToDraft(c) => c.tenant_id,
            SalesOrderCommand::SubmitForSignature(c) => c.tenant_id,
            SalesOrderCommand::ConfirmManually(c) => c.tenant_id,
            SalesOrderCommand::RecordSignatureStatus(c) => c.tenant_id,
            SalesOrderCommand::Approve(c) => c.tenant_id,
            SalesOrderCommand::RequestChanges(c) => c.tenant_id,
            SalesOrderCommand::Release(c) => c.tenant_id,
            SalesOrderCommand::MarkPartiallyInvoiced(c) => c.tenant_id,
            SalesOrderCommand::Close(c) => c.tenant_id,
            SalesOrderCommand::Cancel(c) => c.tenant_id,
            SalesOrderCommand::DeleteOrder(c) => c.tenant_id,
        }
    }

    pub fn order_id(&self) -> SalesOrderId {
        match self {
            SalesOrderCommand::CreateSalesOrder(c) => c.order_id,
            SalesOrderCommand::UpdateHeader(c) => c.order_id,
            SalesOrderCommand::ReplaceLines(c) => c.order_id,
            SalesOrderCommand::AttachTaxBreakdown(c) => c.order_id,
            SalesOrderCommand::ConvertToDraft(c) => c.order_id,
            SalesOrderCommand::SubmitForSignature(c) => c.order_id,
            SalesOrderCommand::ConfirmManually(c) => c.order_id,
            SalesOrderCommand::RecordSignatureStatus(c) => c.order_id,
            SalesOrderCommand::Approve(c) => c.order_id,
            SalesOrderCommand::RequestChanges(c) => c.order_id,
            SalesOrderCommand::Release(c) => c.order_id,
            SalesOrderCommand::MarkPartiallyInvoiced(c) => c.order_id,
            SalesOrderCommand::Close(c) => c.order_id,
            SalesOrderCommand::Cancel(c) => c.order_id,
            SalesOrderCommand::DeleteOrder(c) => c.order_id,
        }
    }
}
