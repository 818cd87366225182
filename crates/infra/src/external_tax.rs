use reclaim_tax::{ExternalTaxCalculator, ExternalTaxError, ExternalTaxRequest, ExternalTaxResponse};

/// External calculator for deployments without a tax service.
///
/// Domestic orders never reach it; delegated ones fail with a collaborator
/// error instead of silently computing zero tax.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredExternalTax;

impl ExternalTaxCalculator for UnconfiguredExternalTax {
    fn calculate(&self, request: &ExternalTaxRequest) -> Result<ExternalTaxResponse, ExternalTaxError> {
        Err(ExternalTaxError::Unavailable(format!(
            "no external tax service configured for {}",
            request.to_address.country
        )))
    }
}
