use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use reclaim_core::id::CustomerId;
use reclaim_core::{AggregateId, PostalAddress, TenantId, UserId};
use reclaim_tax::TaxBreakdown;

use crate::status::SalesOrderStatus;

/// Sales order identifier (tenant-scoped via `tenant_id` on the header).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SalesOrderId(pub AggregateId);

impl SalesOrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SalesOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureStatus {
    Pending,
    Viewed,
    Signed,
    Declined,
    Expired,
}

/// What was sent to the e-signature collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRequest {
    /// Identifier returned by the collaborator; callbacks must quote it.
    pub request_id: String,
    pub signer_email: String,
    pub signer_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureState {
    pub request: SignatureRequest,
    pub status: SignatureStatus,
    #[serde(default)]
    pub document_ref: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-editable header fields (create and update).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderDraft {
    pub customer_id: CustomerId,
    #[serde(default)]
    pub bill_to: PostalAddress,
    #[serde(default)]
    pub ship_to: PostalAddress,
    #[serde(default)]
    pub shipping_amount: Decimal,
    pub currency: String,
    #[serde(default)]
    pub customer_tax_exempt: bool,
    #[serde(default)]
    pub exemption_type: Option<String>,
}

/// The persisted order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderHeader {
    pub order_id: SalesOrderId,
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub bill_to: PostalAddress,
    pub ship_to: PostalAddress,
    pub shipping_amount: Decimal,
    pub currency: String,
    pub customer_tax_exempt: bool,
    #[serde(default)]
    pub exemption_type: Option<String>,
    pub status: SalesOrderStatus,

    pub created_at: DateTime<Utc>,
    pub created_by: UserId,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub converted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub signature_requested_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub signature_received_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub confirmation_printed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub changes_requested_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub change_request_note: Option<String>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub approved_by: Option<UserId>,
    #[serde(default)]
    pub released_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub released_by: Option<UserId>,
    #[serde(default)]
    pub partially_invoiced_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancelled_by: Option<UserId>,
    #[serde(default)]
    pub cancellation_reason: Option<String>,

    #[serde(default)]
    pub signature: Option<SignatureState>,

    /// Null means "not computed for the current inputs".
    #[serde(default)]
    pub tax_breakdown: Option<TaxBreakdown>,
    /// Digest of the inputs `tax_breakdown` was computed from.
    #[serde(default)]
    pub tax_inputs_digest: Option<String>,
    #[serde(default)]
    pub tax_computed_at: Option<DateTime<Utc>>,

    /// Optimistic concurrency token, bumped on every applied event.
    pub revision: u64,
}

impl OrderHeader {
    pub(crate) fn from_draft(
        tenant_id: TenantId,
        order_id: SalesOrderId,
        draft: &HeaderDraft,
        created_by: UserId,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id,
            tenant_id,
            customer_id: draft.customer_id,
            bill_to: draft.bill_to.clone(),
            ship_to: draft.ship_to.clone(),
            shipping_amount: draft.shipping_amount,
            currency: draft.currency.trim().to_ascii_uppercase(),
            customer_tax_exempt: draft.customer_tax_exempt,
            exemption_type: draft.exemption_type.clone(),
            status: SalesOrderStatus::Quotation,
            created_at: at,
            created_by,
            updated_at: at,
            converted_at: None,
            signature_requested_at: None,
            signature_received_at: None,
            confirmation_printed_at: None,
            changes_requested_at: None,
            change_request_note: None,
            approved_at: None,
            approved_by: None,
            released_at: None,
            released_by: None,
            partially_invoiced_at: None,
            closed_at: None,
            cancelled_at: None,
            cancelled_by: None,
            cancellation_reason: None,
            signature: None,
            tax_breakdown: None,
            tax_inputs_digest: None,
            tax_computed_at: None,
            revision: 0,
        }
    }

    pub(crate) fn apply_draft(&mut self, draft: &HeaderDraft) {
        self.customer_id = draft.customer_id;
        self.bill_to = draft.bill_to.clone();
        self.ship_to = draft.ship_to.clone();
        self.shipping_amount = draft.shipping_amount;
        self.currency = draft.currency.trim().to_ascii_uppercase();
        self.customer_tax_exempt = draft.customer_tax_exempt;
        self.exemption_type = draft.exemption_type.clone();
    }

    pub(crate) fn invalidate_tax(&mut self) {
        self.tax_breakdown = None;
        self.tax_inputs_digest = None;
        self.tax_computed_at = None;
    }
}
