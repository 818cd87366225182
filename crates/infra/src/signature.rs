//! E-signature collaborator.
//!
//! Dispatch is synchronous from the engine's point of view: it either returns
//! the provider's request id or fails, in which case no transition happens.
//! Status changes arrive later through `OrderService::record_signature_status`.

use std::sync::Mutex;

use thiserror::Error;
use uuid::Uuid;

use reclaim_core::TenantId;
use reclaim_sales::SalesOrderId;

/// What the provider needs to send a confirmation for signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureDispatch {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub signer_email: String,
    pub signer_name: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("e-signature dispatch failed: {0}")]
    Dispatch(String),
}

pub trait SignatureService: Send + Sync {
    /// Send the request; returns the provider's request id.
    fn dispatch(&self, request: &SignatureDispatch) -> Result<String, SignatureError>;
}

impl<T> SignatureService for std::sync::Arc<T>
where
    T: SignatureService + ?Sized,
{
    fn dispatch(&self, request: &SignatureDispatch) -> Result<String, SignatureError> {
        (**self).dispatch(request)
    }
}

/// Provider stand-in that records dispatches instead of sending them.
///
/// Used by tests and by deployments without a configured provider.
#[derive(Debug, Default)]
pub struct RecordingSignatureService {
    sent: Mutex<Vec<(String, SignatureDispatch)>>,
    failure: Mutex<Option<String>>,
}

impl RecordingSignatureService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every dispatch with `reason` until cleared with `None`.
    pub fn set_failure(&self, reason: Option<String>) {
        if let Ok(mut slot) = self.failure.lock() {
            *slot = reason;
        }
    }

    /// Request ids and payloads dispatched so far.
    pub fn sent(&self) -> Vec<(String, SignatureDispatch)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl SignatureService for RecordingSignatureService {
    fn dispatch(&self, request: &SignatureDispatch) -> Result<String, SignatureError> {
        if let Some(reason) = self.failure.lock().ok().and_then(|f| f.clone()) {
            return Err(SignatureError::Dispatch(reason));
        }

        let request_id = format!("sig-{}", Uuid::now_v7());
        self.sent
            .lock()
            .map_err(|_| SignatureError::Dispatch("lock poisoned".to_string()))?
            .push((request_id.clone(), request.clone()));
        Ok(request_id)
    }
}
