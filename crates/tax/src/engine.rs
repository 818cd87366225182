//! The tax engine: order inputs in, `TaxBreakdown` out.
//!
//! Pure apart from the single call to the external calculator on the delegated
//! path. No state is kept between calls; identical requests produce identical
//! breakdowns (maps are ordered, amounts carry a fixed scale).

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use reclaim_core::{PostalAddress, round_money};

use crate::breakdown::{BreakdownSource, LineTax, ShippingTax, TaxBreakdown, TaxComponent, TaxTotals};
use crate::category::TaxCategory;
use crate::error::TaxError;
use crate::external::{
    ExternalAddress, ExternalLineItem, ExternalTaxCalculator, ExternalTaxRequest, ExternalTaxResponse,
    ExternalTaxResult,
};
use crate::jurisdiction::Jurisdiction;
use crate::rules::TaxRate;

/// Name of the single component used for externally computed tax.
pub const EXTERNAL_TAX_NAME: &str = "Sales Tax";

/// An order line as the tax engine sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxableLine {
    pub line_ref: String,
    pub sku: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub category: TaxCategory,
    #[serde(default)]
    pub external_tax_code: Option<String>,
}

impl TaxableLine {
    /// `max(0, quantity × unit price − discount)`, rounded to cents.
    pub fn net_amount(&self) -> Decimal {
        let gross = self.quantity * self.unit_price - self.discount;
        round_money(gross.max(Decimal::ZERO))
    }
}

/// Everything a tax computation depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRequest {
    pub ship_to: PostalAddress,
    /// Origin address, forwarded on the delegated path only.
    #[serde(default)]
    pub ship_from: Option<PostalAddress>,
    pub customer_exempt: bool,
    #[serde(default)]
    pub exemption_type: Option<String>,
    pub lines: Vec<TaxableLine>,
    pub shipping_amount: Decimal,
}

/// Computes breakdowns. `X` is the external calculator used for delegated
/// jurisdictions.
#[derive(Debug, Clone)]
pub struct TaxEngine<X> {
    external: X,
}

impl<X> TaxEngine<X>
where
    X: ExternalTaxCalculator,
{
    pub fn new(external: X) -> Self {
        Self { external }
    }

    pub fn compute(&self, request: &TaxRequest) -> Result<TaxBreakdown, TaxError> {
        validate(request)?;

        let jurisdiction = Jurisdiction::resolve(&request.ship_to.country, Some(&request.ship_to.region));
        debug!(?jurisdiction, lines = request.lines.len(), exempt = request.customer_exempt, "resolved tax jurisdiction");

        if request.customer_exempt {
            return Ok(zero_tax(request, BreakdownSource::Exempt));
        }

        match jurisdiction {
            Jurisdiction::Unresolved => Ok(zero_tax(request, BreakdownSource::Unresolved)),
            Jurisdiction::DomesticRuleBased { rates, .. } => Ok(rule_based(request, rates)),
            Jurisdiction::ExternalDelegated { .. } => self.delegated(request),
        }
    }

    fn delegated(&self, request: &TaxRequest) -> Result<TaxBreakdown, TaxError> {
        let external_request = ExternalTaxRequest {
            from_address: request.ship_from.as_ref().map(ExternalAddress::from),
            to_address: ExternalAddress::from(&request.ship_to),
            line_items: request
                .lines
                .iter()
                .map(|line| ExternalLineItem {
                    id: line.line_ref.clone(),
                    sku: line.sku.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    discount: line.discount,
                    external_tax_code: line.external_tax_code.clone(),
                })
                .collect(),
            shipping: round_money(request.shipping_amount),
            exemption_type: request.exemption_type.clone(),
        };

        match self.external.calculate(&external_request)? {
            ExternalTaxResponse::Fallback { reason } => {
                warn!(country = %external_request.to_address.country, state = %external_request.to_address.state, %reason, "external tax service returned fallback");
                Err(TaxError::ExternalFallback { reason })
            }
            ExternalTaxResponse::Calculated(result) => Ok(normalize_external(request, &result)),
        }
    }
}

/// Running per-name totals for the header.
#[derive(Debug, Default)]
struct TaxAccumulator {
    by_type: BTreeMap<String, Decimal>,
}

impl TaxAccumulator {
    fn add(&mut self, components: &[TaxComponent]) {
        for c in components {
            let slot = self.by_type.entry(c.name.clone()).or_insert(Decimal::ZERO);
            *slot = round_money(*slot + c.amount);
        }
    }

    fn finish(self, subtotal: Decimal) -> TaxTotals {
        let total_tax = round_money(self.by_type.values().copied().sum());
        TaxTotals {
            tax_by_type: self.by_type,
            total_tax,
            subtotal,
            grand_total: round_money(subtotal + total_tax),
        }
    }
}

fn validate(request: &TaxRequest) -> Result<(), TaxError> {
    if request.ship_to.is_po_box() {
        return Err(TaxError::PoBoxAddress);
    }
    if request.shipping_amount < Decimal::ZERO {
        return Err(TaxError::validation("shipping amount cannot be negative"));
    }

    let mut seen = std::collections::BTreeSet::new();
    for line in &request.lines {
        if !seen.insert(line.line_ref.as_str()) {
            return Err(TaxError::validation(format!("duplicate line reference '{}'", line.line_ref)));
        }
        if line.quantity < Decimal::ZERO || line.unit_price < Decimal::ZERO || line.discount < Decimal::ZERO {
            return Err(TaxError::validation(format!(
                "line '{}' has a negative quantity, price or discount",
                line.line_ref
            )));
        }
    }
    Ok(())
}

/// Each rate applied to the basis and rounded on its own. Summing the rounded
/// components can differ by a cent from rounding the combined rate once; that
/// order of operations is the stored behaviour.
fn apply_rates(basis: Decimal, rates: &[TaxRate]) -> Vec<TaxComponent> {
    rates
        .iter()
        .map(|r| TaxComponent {
            name: r.name.to_string(),
            rate: r.rate,
            amount: round_money(basis * r.rate),
        })
        .collect()
}

fn component_total(components: &[TaxComponent]) -> Decimal {
    round_money(components.iter().map(|c| c.amount).sum())
}

fn shipping_amount(request: &TaxRequest) -> Option<Decimal> {
    let amount = round_money(request.shipping_amount);
    (amount > Decimal::ZERO).then_some(amount)
}

fn subtotal(lines: &[LineTax], shipping: Option<&ShippingTax>) -> Decimal {
    let lines_net: Decimal = lines.iter().map(|l| l.net_amount).sum();
    round_money(lines_net + shipping.map(|s| s.amount).unwrap_or(Decimal::ZERO))
}

fn rule_based(request: &TaxRequest, rates: &[TaxRate]) -> TaxBreakdown {
    let mut acc = TaxAccumulator::default();

    let lines: Vec<LineTax> = request
        .lines
        .iter()
        .map(|line| {
            let net = line.net_amount();
            let basis = if line.category.is_taxable() { net } else { round_money(Decimal::ZERO) };
            let components = apply_rates(basis, rates);
            let tax_total = component_total(&components);
            acc.add(&components);
            LineTax {
                line_ref: line.line_ref.clone(),
                net_amount: net,
                basis,
                components,
                tax_total,
                total_with_tax: round_money(net + tax_total),
            }
        })
        .collect();

    let shipping = shipping_amount(request).map(|amount| {
        let basis = if TaxCategory::Shipping.is_taxable() { amount } else { round_money(Decimal::ZERO) };
        let components = apply_rates(basis, rates);
        let tax_total = component_total(&components);
        acc.add(&components);
        ShippingTax {
            amount,
            basis,
            components,
            tax_total,
            total_with_tax: round_money(amount + tax_total),
        }
    });

    let subtotal = subtotal(&lines, shipping.as_ref());
    TaxBreakdown {
        source: BreakdownSource::RuleTable,
        lines,
        shipping,
        totals: acc.finish(subtotal),
    }
}

fn normalize_external(request: &TaxRequest, result: &ExternalTaxResult) -> TaxBreakdown {
    let mut acc = TaxAccumulator::default();
    let rate = result.combined_rate;

    let component = |amount: Decimal| TaxComponent {
        name: EXTERNAL_TAX_NAME.to_string(),
        rate,
        amount,
    };

    let lines: Vec<LineTax> = request
        .lines
        .iter()
        .map(|line| {
            let net = line.net_amount();
            let tax = round_money(result.tax_for_line(&line.line_ref).unwrap_or(Decimal::ZERO));
            let basis = if tax.is_zero() { round_money(Decimal::ZERO) } else { net };
            let components = vec![component(tax)];
            acc.add(&components);
            LineTax {
                line_ref: line.line_ref.clone(),
                net_amount: net,
                basis,
                components,
                tax_total: tax,
                total_with_tax: round_money(net + tax),
            }
        })
        .collect();

    let shipping = shipping_amount(request).map(|amount| {
        let tax = round_money(result.shipping_tax);
        let basis = if tax.is_zero() { round_money(Decimal::ZERO) } else { amount };
        let components = vec![component(tax)];
        acc.add(&components);
        ShippingTax {
            amount,
            basis,
            components,
            tax_total: tax,
            total_with_tax: round_money(amount + tax),
        }
    });

    let subtotal = subtotal(&lines, shipping.as_ref());
    TaxBreakdown {
        source: BreakdownSource::External,
        lines,
        shipping,
        totals: acc.finish(subtotal),
    }
}

/// Exempt or unresolvable destination: full totals, zero tax everywhere.
fn zero_tax(request: &TaxRequest, source: BreakdownSource) -> TaxBreakdown {
    let zero = round_money(Decimal::ZERO);

    let lines: Vec<LineTax> = request
        .lines
        .iter()
        .map(|line| {
            let net = line.net_amount();
            LineTax {
                line_ref: line.line_ref.clone(),
                net_amount: net,
                basis: zero,
                components: Vec::new(),
                tax_total: zero,
                total_with_tax: net,
            }
        })
        .collect();

    let shipping = shipping_amount(request).map(|amount| ShippingTax {
        amount,
        basis: zero,
        components: Vec::new(),
        tax_total: zero,
        total_with_tax: amount,
    });

    let subtotal = subtotal(&lines, shipping.as_ref());
    TaxBreakdown {
        source,
        lines,
        shipping,
        totals: TaxAccumulator::default().finish(subtotal),
    }
}
