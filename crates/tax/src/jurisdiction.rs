//! Destination → tax handling resolution.

use crate::rules::{self, TaxRate};

/// How tax is determined for a destination.
///
/// Callers never branch on country strings; they resolve once and match on
/// this. Adding a rule-based country means extending [`Jurisdiction::resolve`]
/// and the rule table only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Jurisdiction {
    /// Rates come from the static rule table.
    DomesticRuleBased {
        country: &'static str,
        region: String,
        rates: &'static [TaxRate],
    },
    /// Rates come from the external calculator.
    ExternalDelegated { country: String, region: String },
    /// No country or region to resolve against; no tax can apply.
    Unresolved,
}

impl Jurisdiction {
    pub fn resolve(country: &str, region: Option<&str>) -> Self {
        let country = country.trim();
        let region = region.map(str::trim).filter(|r| !r.is_empty());

        let Some(region) = region else {
            return Jurisdiction::Unresolved;
        };
        if country.is_empty() {
            return Jurisdiction::Unresolved;
        }

        let region = region.to_ascii_uppercase();
        if rules::is_canada(country) {
            let rates = rules::canada_rates(&region);
            Jurisdiction::DomesticRuleBased {
                country: "CA",
                region,
                rates,
            }
        } else {
            Jurisdiction::ExternalDelegated {
                country: country.to_ascii_uppercase(),
                region,
            }
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Jurisdiction::Unresolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canadian_destinations_are_rule_based() {
        match Jurisdiction::resolve("ca", Some("qc")) {
            Jurisdiction::DomesticRuleBased { country, region, rates } => {
                assert_eq!(country, "CA");
                assert_eq!(region, "QC");
                assert_eq!(rates.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn other_countries_are_delegated() {
        assert_eq!(
            Jurisdiction::resolve("us", Some("ny")),
            Jurisdiction::ExternalDelegated {
                country: "US".to_string(),
                region: "NY".to_string()
            }
        );
    }

    #[test]
    fn blank_region_is_unresolved() {
        assert_eq!(Jurisdiction::resolve("CA", Some("  ")), Jurisdiction::Unresolved);
        assert_eq!(Jurisdiction::resolve("US", None), Jurisdiction::Unresolved);
        assert!(!Jurisdiction::resolve("", Some("ON")).is_resolved());
    }
}
