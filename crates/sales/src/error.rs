use thiserror::Error;

use reclaim_core::DomainError;

use crate::status::SalesOrderStatus;

/// A lifecycle guard that rejected a command.
///
/// `code()` is stable and meant for clients to pick a corrective message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderGuard {
    #[error("ship-to address is incomplete (missing: {})", .missing.join(", "))]
    ShipToIncomplete { missing: Vec<&'static str> },

    #[error("ship-to address is a PO box")]
    ShipToPoBox,

    #[error("order has no valid line items")]
    NoValidLines,

    #[error("tax has not been computed for the current order")]
    TaxBreakdownMissing,

    #[error("order changed since tax was computed")]
    TaxBreakdownStale,

    #[error("a cancellation reason is required")]
    CancellationReasonMissing,

    #[error("a signer email is required")]
    SignerEmailMissing,

    #[error("signature callback does not match the dispatched request")]
    SignatureRequestMismatch,

    #[error("allocation does not match the order lines: {0}")]
    AllocationMismatch(String),
}

impl OrderGuard {
    pub fn code(&self) -> &'static str {
        match self {
            OrderGuard::ShipToIncomplete { .. } => "ship_to_incomplete",
            OrderGuard::ShipToPoBox => "ship_to_po_box",
            OrderGuard::NoValidLines => "no_valid_lines",
            OrderGuard::TaxBreakdownMissing => "tax_breakdown_missing",
            OrderGuard::TaxBreakdownStale => "tax_breakdown_stale",
            OrderGuard::CancellationReasonMissing => "cancellation_reason_missing",
            OrderGuard::SignerEmailMissing => "signer_email_missing",
            OrderGuard::SignatureRequestMismatch => "signature_request_mismatch",
            OrderGuard::AllocationMismatch(_) => "allocation_mismatch",
        }
    }

    /// Null or outdated breakdown.
    pub fn is_staleness(&self) -> bool {
        matches!(self, OrderGuard::TaxBreakdownMissing | OrderGuard::TaxBreakdownStale)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error(transparent)]
    Guard(#[from] OrderGuard),

    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: SalesOrderStatus, to: SalesOrderStatus },

    #[error("order cannot be edited in status {0}")]
    NotEditable(SalesOrderStatus),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl OrderError {
    pub fn guard(&self) -> Option<&OrderGuard> {
        match self {
            OrderError::Guard(g) => Some(g),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_address_lists_fields() {
        let guard = OrderGuard::ShipToIncomplete {
            missing: vec!["city", "postal_code"],
        };
        assert_eq!(guard.to_string(), "ship-to address is incomplete (missing: city, postal_code)");
        assert_eq!(guard.code(), "ship_to_incomplete");
    }

    #[test]
    fn staleness_guards() {
        assert!(OrderGuard::TaxBreakdownMissing.is_staleness());
        assert!(OrderGuard::TaxBreakdownStale.is_staleness());
        assert!(!OrderGuard::ShipToPoBox.is_staleness());
    }
}
