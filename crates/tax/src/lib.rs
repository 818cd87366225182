//! Jurisdiction-aware sales tax for orders.
//!
//! - [`rules`]: the static Canadian rule table and the category taxability matrix.
//! - [`jurisdiction`]: resolves a destination into rule-based or delegated handling.
//! - [`engine`]: the pure `TaxEngine` producing a [`TaxBreakdown`].
//! - [`external`]: the collaborator contract for jurisdictions without local rules.

pub mod breakdown;
pub mod category;
pub mod engine;
pub mod error;
pub mod external;
pub mod jurisdiction;
pub mod rules;

pub use breakdown::{BreakdownSource, LineTax, ShippingTax, TaxBreakdown, TaxComponent, TaxTotals};
pub use category::TaxCategory;
pub use engine::{TaxEngine, TaxRequest, TaxableLine};
pub use error::TaxError;
pub use external::{
    ExternalAddress, ExternalLineItem, ExternalLineTax, ExternalTaxCalculator, ExternalTaxError,
    ExternalTaxRequest, ExternalTaxResponse, ExternalTaxResult,
};
pub use jurisdiction::Jurisdiction;
pub use rules::{TaxRate, canada_rates};
