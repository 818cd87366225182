use thiserror::Error;

use reclaim_auth::AuthzError;
use reclaim_core::DomainError;
use reclaim_sales::{OrderError, SalesOrderId};
use reclaim_tax::TaxError;

use crate::signature::SignatureError;
use crate::store::StoreError;

/// Error category reported to callers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// User-correctable input or failed guard.
    Validation,
    /// Tax breakdown missing or computed from different inputs.
    Stale,
    /// The order's status does not allow the operation.
    InvalidTransition,
    /// External tax or e-signature service failure.
    Collaborator,
    /// Storage failure; the order did not reach the target status.
    Persistence,
    /// Another writer got there first.
    Conflict,
    NotFound,
    Unauthorized,
}

#[derive(Debug, Error)]
pub enum OrderServiceError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Tax(#[from] TaxError),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Unauthorized(#[from] AuthzError),

    #[error("sales order {0} not found")]
    NotFound(SalesOrderId),

    #[error("order is at revision {actual}, request expected {expected}")]
    RevisionMismatch { expected: u64, actual: u64 },
}

impl From<DomainError> for OrderServiceError {
    fn from(value: DomainError) -> Self {
        OrderServiceError::Order(OrderError::Domain(value))
    }
}

impl OrderServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderServiceError::Order(err) => match err {
                OrderError::Guard(guard) if guard.is_staleness() => ErrorKind::Stale,
                OrderError::Guard(_) => ErrorKind::Validation,
                OrderError::InvalidTransition { .. } | OrderError::NotEditable(_) => ErrorKind::InvalidTransition,
                OrderError::Domain(domain) => match domain {
                    DomainError::Validation(_) | DomainError::InvalidId(_) | DomainError::InvariantViolation(_) => {
                        ErrorKind::Validation
                    }
                    DomainError::NotFound => ErrorKind::NotFound,
                    DomainError::Conflict(_) => ErrorKind::Conflict,
                    DomainError::Unauthorized => ErrorKind::Unauthorized,
                },
            },
            OrderServiceError::Tax(err) => match err {
                TaxError::PoBoxAddress | TaxError::Validation(_) => ErrorKind::Validation,
                TaxError::ExternalFallback { .. } | TaxError::External(_) => ErrorKind::Collaborator,
            },
            OrderServiceError::Signature(_) => ErrorKind::Collaborator,
            OrderServiceError::Store(err) => match err {
                StoreError::Concurrency(_) => ErrorKind::Conflict,
                StoreError::NotFound(_) => ErrorKind::NotFound,
                StoreError::TenantIsolation(_) => ErrorKind::Unauthorized,
                StoreError::Serialization(_) | StoreError::Backend(_) => ErrorKind::Persistence,
            },
            OrderServiceError::Unauthorized(_) => ErrorKind::Unauthorized,
            OrderServiceError::NotFound(_) => ErrorKind::NotFound,
            OrderServiceError::RevisionMismatch { .. } => ErrorKind::Conflict,
        }
    }

    /// Stable machine-readable code: which guard or collaborator failed.
    pub fn code(&self) -> &'static str {
        match self {
            OrderServiceError::Order(err) => match err {
                OrderError::Guard(guard) => guard.code(),
                OrderError::InvalidTransition { .. } => "invalid_transition",
                OrderError::NotEditable(_) => "not_editable",
                OrderError::Domain(domain) => match domain {
                    DomainError::Validation(_) => "validation_error",
                    DomainError::InvalidId(_) => "invalid_id",
                    DomainError::InvariantViolation(_) => "invariant_violation",
                    DomainError::NotFound => "not_found",
                    DomainError::Conflict(_) => "conflict",
                    DomainError::Unauthorized => "unauthorized",
                },
            },
            OrderServiceError::Tax(err) => match err {
                TaxError::PoBoxAddress => "ship_to_po_box",
                TaxError::Validation(_) => "tax_validation_error",
                TaxError::ExternalFallback { .. } => "external_tax_fallback",
                TaxError::External(_) => "external_tax_unavailable",
            },
            OrderServiceError::Signature(_) => "signature_dispatch_failed",
            OrderServiceError::Store(err) => match err {
                StoreError::Concurrency(_) => "conflict",
                StoreError::NotFound(_) => "not_found",
                StoreError::TenantIsolation(_) => "tenant_isolation",
                StoreError::Serialization(_) | StoreError::Backend(_) => "persistence_error",
            },
            OrderServiceError::Unauthorized(_) => "forbidden",
            OrderServiceError::NotFound(_) => "not_found",
            OrderServiceError::RevisionMismatch { .. } => "stale_revision",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reclaim_core::AggregateId;
    use reclaim_sales::{OrderGuard, SalesOrderStatus};

    #[test]
    fn staleness_guards_map_to_stale() {
        let err = OrderServiceError::from(OrderError::Guard(OrderGuard::TaxBreakdownMissing));
        assert_eq!(err.kind(), ErrorKind::Stale);
        assert_eq!(err.code(), "tax_breakdown_missing");

        let err = OrderServiceError::from(OrderError::Guard(OrderGuard::ShipToPoBox));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn collaborator_failures_are_not_validation() {
        let err = OrderServiceError::from(TaxError::ExternalFallback {
            reason: "no coverage".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::Collaborator);
        assert!(err.to_string().contains("no coverage"));

        let err = OrderServiceError::from(SignatureError::Dispatch("smtp down".to_string()));
        assert_eq!(err.kind(), ErrorKind::Collaborator);
    }

    #[test]
    fn storage_and_revision_errors() {
        assert_eq!(
            OrderServiceError::from(StoreError::Backend("io".to_string())).kind(),
            ErrorKind::Persistence
        );
        assert_eq!(
            OrderServiceError::from(StoreError::Concurrency("rev".to_string())).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            OrderServiceError::RevisionMismatch { expected: 1, actual: 2 }.kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            OrderServiceError::NotFound(SalesOrderId::new(AggregateId::new())).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn transitions_have_their_own_kind() {
        let err = OrderServiceError::from(OrderError::InvalidTransition {
            from: SalesOrderStatus::Closed,
            to: SalesOrderStatus::Cancelled,
        });
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(err.code(), "invalid_transition");
    }
}
