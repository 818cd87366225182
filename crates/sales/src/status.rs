use serde::{Deserialize, Serialize};

/// Sales order status lifecycle.
///
/// The serialized names are persisted and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SalesOrderStatus {
    Quotation,
    Draft,
    PendingCustomerSignature,
    PendingApproval,
    NeedsUpdate,
    Approved,
    Released,
    PartiallyInvoiced,
    Closed,
    Cancelled,
}

impl SalesOrderStatus {
    pub const ALL: [SalesOrderStatus; 10] = [
        SalesOrderStatus::Quotation,
        SalesOrderStatus::Draft,
        SalesOrderStatus::PendingCustomerSignature,
        SalesOrderStatus::PendingApproval,
        SalesOrderStatus::NeedsUpdate,
        SalesOrderStatus::Approved,
        SalesOrderStatus::Released,
        SalesOrderStatus::PartiallyInvoiced,
        SalesOrderStatus::Closed,
        SalesOrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SalesOrderStatus::Quotation => "QUOTATION",
            SalesOrderStatus::Draft => "DRAFT",
            SalesOrderStatus::PendingCustomerSignature => "PENDING_CUSTOMER_SIGNATURE",
            SalesOrderStatus::PendingApproval => "PENDING_APPROVAL",
            SalesOrderStatus::NeedsUpdate => "NEEDS_UPDATE",
            SalesOrderStatus::Approved => "APPROVED",
            SalesOrderStatus::Released => "RELEASED",
            SalesOrderStatus::PartiallyInvoiced => "PARTIALLY_INVOICED",
            SalesOrderStatus::Closed => "CLOSED",
            SalesOrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Header and line replacement are permitted only here.
    pub fn is_editable(self) -> bool {
        matches!(
            self,
            SalesOrderStatus::Quotation | SalesOrderStatus::Draft | SalesOrderStatus::NeedsUpdate
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SalesOrderStatus::Closed | SalesOrderStatus::Cancelled)
    }

    /// Tax may be (re)computed until the order is approved.
    pub fn accepts_tax_computation(self) -> bool {
        self.is_editable()
            || matches!(
                self,
                SalesOrderStatus::PendingCustomerSignature | SalesOrderStatus::PendingApproval
            )
    }

    /// The lifecycle transition table.
    pub fn can_transition_to(self, to: SalesOrderStatus) -> bool {
        use SalesOrderStatus::*;

        if to == Cancelled {
            return !self.is_terminal();
        }
        matches!(
            (self, to),
            (Quotation, Draft)
                | (Draft | NeedsUpdate, PendingCustomerSignature)
                | (Draft | NeedsUpdate, PendingApproval)
                | (PendingCustomerSignature, PendingApproval)
                | (PendingApproval, Approved)
                | (PendingApproval, NeedsUpdate)
                | (Approved, Released)
                | (Released, PartiallyInvoiced)
                | (Released | PartiallyInvoiced, Closed)
        )
    }
}

impl core::fmt::Display for SalesOrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
