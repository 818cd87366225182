//! Postal addresses (bill-to, ship-to, ship-from).

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// Matches "PO BOX", "P.O. Box", "POBOX", "Post Office Box" (any case, optional
/// punctuation), followed by a word boundary or a box number.
static PO_BOX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:p[\s.\-]*o[\s.\-]*box|post[\s.\-]*office[\s.\-]*box)(?:\b|\s*#?\s*\d)",
    )
    .expect("PO box pattern is valid")
});

/// A postal address with contact details.
///
/// Empty strings mean "not provided"; records coming back from storage may omit
/// any field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostalAddress {
    pub line1: String,
    pub line2: String,
    pub line3: String,
    pub city: String,
    /// Province (CA) or state (US) code.
    pub region: String,
    pub postal_code: String,
    /// ISO country code, e.g. `CA`, `US`.
    pub country: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub contact_email: String,
}

impl ValueObject for PostalAddress {}

impl PostalAddress {
    /// Whether any of the three street lines is a post-office box.
    pub fn is_po_box(&self) -> bool {
        self.street_lines().any(|line| PO_BOX.is_match(line))
    }

    /// Names of the fields required for shipping/tax that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.line1.trim().is_empty() {
            missing.push("line1");
        }
        if self.city.trim().is_empty() {
            missing.push("city");
        }
        if self.region.trim().is_empty() {
            missing.push("region");
        }
        if self.postal_code.trim().is_empty() {
            missing.push("postal_code");
        }
        if self.country.trim().is_empty() {
            missing.push("country");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Non-empty street lines joined with ", ".
    pub fn street(&self) -> String {
        self.street_lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Upper-cased, trimmed country code.
    pub fn country_code(&self) -> String {
        self.country.trim().to_ascii_uppercase()
    }

    /// Upper-cased, trimmed region code (`None` when blank).
    pub fn region_code(&self) -> Option<String> {
        let region = self.region.trim();
        if region.is_empty() {
            None
        } else {
            Some(region.to_ascii_uppercase())
        }
    }

    fn street_lines(&self) -> impl Iterator<Item = &str> {
        [self.line1.as_str(), self.line2.as_str(), self.line3.as_str()].into_iter()
    }
}
