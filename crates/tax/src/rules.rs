//! Static tax rule table for rule-based (domestic) jurisdictions.
//!
//! Only Canada is rule-based. Every other country is delegated to the
//! external calculator, so no US rates live here.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// One named tax applied at a fixed rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxRate {
    pub name: &'static str,
    pub rate: Decimal,
}

const fn rate(name: &'static str, rate: Decimal) -> TaxRate {
    TaxRate { name, rate }
}

const GST: TaxRate = rate("GST", dec!(0.05));

const HST_13: &[TaxRate] = &[rate("HST", dec!(0.13))];
const HST_15: &[TaxRate] = &[rate("HST", dec!(0.15))];
const GST_ONLY: &[TaxRate] = &[GST];
const GST_QST: &[TaxRate] = &[GST, rate("QST", dec!(0.09975))];
const GST_PST_BC: &[TaxRate] = &[GST, rate("PST", dec!(0.07))];
const GST_PST_SK: &[TaxRate] = &[GST, rate("PST", dec!(0.06))];
const GST_PST_MB: &[TaxRate] = &[GST, rate("PST", dec!(0.07))];

/// Rates for a Canadian province/territory code (case-insensitive).
///
/// Unknown codes yield an empty set: the order is in Canada but no tax applies.
pub fn canada_rates(province: &str) -> &'static [TaxRate] {
    match province.trim().to_ascii_uppercase().as_str() {
        "ON" => HST_13,
        "NB" | "NS" | "PE" | "NL" => HST_15,
        "AB" | "NT" | "NU" | "YT" => GST_ONLY,
        "QC" => GST_QST,
        "BC" => GST_PST_BC,
        "SK" => GST_PST_SK,
        "MB" => GST_PST_MB,
        _ => &[],
    }
}

/// Whether a country code names Canada.
pub fn is_canada(country: &str) -> bool {
    matches!(
        country.trim().to_ascii_uppercase().as_str(),
        "CA" | "CAN" | "CANADA"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(rates: &[TaxRate]) -> Vec<(&'static str, Decimal)> {
        rates.iter().map(|r| (r.name, r.rate)).collect()
    }

    #[test]
    fn harmonized_provinces() {
        assert_eq!(names(canada_rates("ON")), vec![("HST", dec!(0.13))]);
        for p in ["NB", "NS", "PE", "NL"] {
            assert_eq!(names(canada_rates(p)), vec![("HST", dec!(0.15))], "{p}");
        }
    }

    #[test]
    fn gst_only_territories_and_alberta() {
        for p in ["AB", "NT", "NU", "YT"] {
            assert_eq!(names(canada_rates(p)), vec![("GST", dec!(0.05))], "{p}");
        }
    }

    #[test]
    fn quebec_and_pst_provinces() {
        assert_eq!(
            names(canada_rates("qc")),
            vec![("GST", dec!(0.05)), ("QST", dec!(0.09975))]
        );
        assert_eq!(names(canada_rates("BC")), vec![("GST", dec!(0.05)), ("PST", dec!(0.07))]);
        assert_eq!(names(canada_rates("SK")), vec![("GST", dec!(0.05)), ("PST", dec!(0.06))]);
        assert_eq!(names(canada_rates("MB")), vec![("GST", dec!(0.05)), ("PST", dec!(0.07))]);
    }

    #[test]
    fn unknown_province_has_no_taxes() {
        assert!(canada_rates("ZZ").is_empty());
        assert!(canada_rates("").is_empty());
    }

    #[test]
    fn canada_aliases() {
        assert!(is_canada("ca"));
        assert!(is_canada(" Canada "));
        assert!(!is_canada("US"));
    }
}
