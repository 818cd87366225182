//! Contract with the external tax calculator (non-domestic jurisdictions).
//!
//! The calculator is opaque: the engine sends normalized addresses and line
//! items and gets back per-line amounts and one combined rate, or a fallback
//! notice when it has no coverage for the destination.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use reclaim_core::PostalAddress;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalAddress {
    pub country: String,
    pub state: String,
    pub city: String,
    pub postal_code: String,
    pub street: String,
}

impl From<&PostalAddress> for ExternalAddress {
    fn from(address: &PostalAddress) -> Self {
        Self {
            country: address.country_code(),
            state: address.region_code().unwrap_or_default(),
            city: address.city.trim().to_string(),
            postal_code: address.postal_code.trim().to_string(),
            street: address.street(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalLineItem {
    pub id: String,
    pub sku: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_tax_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalTaxRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_address: Option<ExternalAddress>,
    pub to_address: ExternalAddress,
    pub line_items: Vec<ExternalLineItem>,
    pub shipping: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exemption_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalLineTax {
    pub id: String,
    pub tax: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalTaxResult {
    pub per_line_tax: Vec<ExternalLineTax>,
    pub shipping_tax: Decimal,
    pub combined_rate: Decimal,
    pub has_nexus: bool,
    pub taxable_amount: Decimal,
    pub total_tax: Decimal,
}

impl ExternalTaxResult {
    pub fn tax_for_line(&self, id: &str) -> Option<Decimal> {
        self.per_line_tax.iter().find(|l| l.id == id).map(|l| l.tax)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExternalTaxResponse {
    /// No tax computed; `reason` is shown to the user as-is.
    Fallback { reason: String },
    Calculated(ExternalTaxResult),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExternalTaxError {
    #[error("external tax service unavailable: {0}")]
    Unavailable(String),

    #[error("external tax service returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// The remote calculator. Implementations may block; the engine calls it once
/// per computation and never retries.
pub trait ExternalTaxCalculator: Send + Sync {
    fn calculate(&self, request: &ExternalTaxRequest) -> Result<ExternalTaxResponse, ExternalTaxError>;
}

impl<C> ExternalTaxCalculator for Arc<C>
where
    C: ExternalTaxCalculator + ?Sized,
{
    fn calculate(&self, request: &ExternalTaxRequest) -> Result<ExternalTaxResponse, ExternalTaxError> {
        (**self).calculate(request)
    }
}

impl<C> ExternalTaxCalculator for &C
where
    C: ExternalTaxCalculator + ?Sized,
{
    fn calculate(&self, request: &ExternalTaxRequest) -> Result<ExternalTaxResponse, ExternalTaxError> {
        (**self).calculate(request)
    }
}
