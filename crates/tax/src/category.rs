use serde::{Deserialize, Serialize};

/// Tax category of an order line (snapshot of the SKU's tax category).
///
/// Stored as its snake_case code. Codes the engine does not know are kept
/// verbatim in [`TaxCategory::Other`] and treated as taxable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaxCategory {
    #[default]
    TangibleGoods,
    DigitalGoods,
    Shipping,
    Labor,
    Exempt,
    Other(String),
}

impl TaxCategory {
    pub fn as_str(&self) -> &str {
        match self {
            TaxCategory::TangibleGoods => "tangible_goods",
            TaxCategory::DigitalGoods => "digital_goods",
            TaxCategory::Shipping => "shipping",
            TaxCategory::Labor => "labor",
            TaxCategory::Exempt => "exempt",
            TaxCategory::Other(code) => code,
        }
    }

    /// Taxability matrix. Unknown categories are taxable so tax is never
    /// under-collected because of a missing mapping.
    pub fn is_taxable(&self) -> bool {
        match self {
            TaxCategory::TangibleGoods | TaxCategory::DigitalGoods | TaxCategory::Shipping => true,
            TaxCategory::Labor | TaxCategory::Exempt => false,
            TaxCategory::Other(_) => true,
        }
    }
}

impl From<&str> for TaxCategory {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "tangible_goods" => TaxCategory::TangibleGoods,
            "digital_goods" => TaxCategory::DigitalGoods,
            "shipping" => TaxCategory::Shipping,
            "labor" => TaxCategory::Labor,
            "exempt" => TaxCategory::Exempt,
            _ => TaxCategory::Other(value.to_string()),
        }
    }
}

impl From<String> for TaxCategory {
    fn from(value: String) -> Self {
        TaxCategory::from(value.as_str())
    }
}

impl From<TaxCategory> for String {
    fn from(value: TaxCategory) -> Self {
        value.as_str().to_string()
    }
}

impl core::fmt::Display for TaxCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
