use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use reclaim_core::{AggregateId, AggregateRoot, ExpectedVersion};
use reclaim_infra::{NewOrder, OrderUpdate, SignatureCallback, Signer};
use reclaim_inventory::{LineAllocation, SkuId};
use reclaim_sales::{
    HeaderDraft, LineDraft, OrderHeader, SalesOrder, SalesOrderId, SalesOrderLine, SalesOrderLineId, SignatureStatus,
};
use reclaim_tax::TaxCategory;

// -------------------------
// Request DTOs
// -------------------------

/// One line as submitted by the client. A missing `line_id` adds a new line.
#[derive(Debug, Deserialize)]
pub struct LineRequest {
    #[serde(default)]
    pub line_id: Option<AggregateId>,
    pub sku_id: SkuId,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    #[serde(default)]
    pub tax_category: TaxCategory,
    pub quantity_ordered: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub unit_of_measure: String,
    #[serde(default)]
    pub external_tax_code: Option<String>,
}

impl LineRequest {
    pub fn into_draft(self) -> LineDraft {
        LineDraft {
            line_id: SalesOrderLineId::new(self.line_id.unwrap_or_else(AggregateId::new)),
            sku_id: self.sku_id,
            description: self.description,
            category: self.category,
            sub_category: self.sub_category,
            tax_category: self.tax_category,
            quantity_ordered: self.quantity_ordered,
            unit_price: self.unit_price,
            discount: self.discount,
            unit_of_measure: self.unit_of_measure,
            external_tax_code: self.external_tax_code,
        }
    }
}

fn drafts(lines: Vec<LineRequest>) -> Vec<LineDraft> {
    lines.into_iter().map(LineRequest::into_draft).collect()
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub header: HeaderDraft,
    #[serde(default)]
    pub lines: Vec<LineRequest>,
}

impl CreateOrderRequest {
    pub fn into_new_order(self) -> NewOrder {
        NewOrder {
            header: self.header,
            lines: drafts(self.lines),
        }
    }
}

/// `lines`, when present, replaces the full line set.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    #[serde(default)]
    pub expected_version: Option<u64>,
    #[serde(default)]
    pub header: Option<HeaderDraft>,
    #[serde(default)]
    pub lines: Option<Vec<LineRequest>>,
}

impl UpdateOrderRequest {
    pub fn into_parts(self) -> (ExpectedVersion, OrderUpdate) {
        let update = OrderUpdate {
            header: self.header,
            lines: self.lines.map(drafts),
        };
        (ExpectedVersion::from_option(self.expected_version), update)
    }
}

/// Body of the plain transition endpoints; an empty body means "any revision".
#[derive(Debug, Default, Deserialize)]
pub struct VersionedRequest {
    #[serde(default)]
    pub expected_version: Option<u64>,
}

impl VersionedRequest {
    pub fn expected(&self) -> ExpectedVersion {
        ExpectedVersion::from_option(self.expected_version)
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitForSignatureRequest {
    #[serde(default)]
    pub expected_version: Option<u64>,
    pub signer_email: String,
    #[serde(default)]
    pub signer_name: String,
}

impl SubmitForSignatureRequest {
    pub fn into_parts(self) -> (ExpectedVersion, Signer) {
        let signer = Signer {
            email: self.signer_email,
            name: self.signer_name,
        };
        (ExpectedVersion::from_option(self.expected_version), signer)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RequestChangesRequest {
    #[serde(default)]
    pub expected_version: Option<u64>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub expected_version: Option<u64>,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct SignatureCallbackRequest {
    pub order_id: SalesOrderId,
    pub request_id: String,
    pub status: SignatureStatus,
    #[serde(default)]
    pub document_ref: Option<String>,
}

impl From<SignatureCallbackRequest> for SignatureCallback {
    fn from(value: SignatureCallbackRequest) -> Self {
        SignatureCallback {
            order_id: value.order_id,
            request_id: value.request_id,
            status: value.status,
            document_ref: value.document_ref,
        }
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: SalesOrderId,
    /// Pass back as `expected_version` on the next write.
    pub revision: u64,
    pub header: Option<OrderHeader>,
    pub lines: Vec<SalesOrderLine>,
}

impl From<&SalesOrder> for OrderResponse {
    fn from(order: &SalesOrder) -> Self {
        OrderResponse {
            id: order.id_typed(),
            revision: order.version(),
            header: order.header().cloned(),
            lines: order.lines().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AllocationPreviewResponse {
    pub order_id: SalesOrderId,
    pub lines: Vec<LineAllocation>,
}
