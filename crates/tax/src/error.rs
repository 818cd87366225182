use thiserror::Error;

use crate::external::ExternalTaxError;

/// Why a breakdown could not be produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaxError {
    /// Ship-to is a post-office box; tax is never computed for one.
    #[error("ship-to address is a PO box")]
    PoBoxAddress,

    /// Malformed input (negative amounts, duplicate line references, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The external calculator has no coverage for the destination.
    #[error("external tax service could not compute tax: {reason}")]
    ExternalFallback { reason: String },

    /// The external calculator failed outright.
    #[error(transparent)]
    External(#[from] ExternalTaxError),
}

impl TaxError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
