//! Content hash of everything the tax computation reads.
//!
//! Stored next to the breakdown when tax is attached; lifecycle guards recompute
//! it from the current header and lines and treat any difference as stale.

use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::header::OrderHeader;
use crate::line::SalesOrderLine;

const UNIT_SEPARATOR: u8 = 0x1f;
const RECORD_SEPARATOR: u8 = 0x1e;

struct Canonical(Sha256);

impl Canonical {
    fn field(&mut self, label: &str, value: &str) {
        self.0.update(label.as_bytes());
        self.0.update([UNIT_SEPARATOR]);
        self.0.update(value.as_bytes());
        self.0.update([RECORD_SEPARATOR]);
    }

    /// `10`, `10.0` and `10.00` hash the same.
    fn amount(&mut self, label: &str, value: Decimal) {
        self.field(label, &value.normalize().to_string());
    }
}

/// Hex SHA-256 over the ship-to address, exemption, shipping and each line's
/// SKU, quantity, price, discount and tax category.
///
/// Contact details, bill-to and line descriptions are not tax inputs.
pub fn tax_inputs_digest(header: &OrderHeader, lines: &[SalesOrderLine]) -> String {
    let mut c = Canonical(Sha256::new());

    let ship_to = &header.ship_to;
    c.field("ship_to.line1", ship_to.line1.trim());
    c.field("ship_to.line2", ship_to.line2.trim());
    c.field("ship_to.line3", ship_to.line3.trim());
    c.field("ship_to.city", ship_to.city.trim());
    c.field("ship_to.region", &ship_to.region_code().unwrap_or_default());
    c.field("ship_to.postal_code", ship_to.postal_code.trim());
    c.field("ship_to.country", &ship_to.country_code());

    c.field("exempt", if header.customer_tax_exempt { "1" } else { "0" });
    c.field("exemption_type", header.exemption_type.as_deref().unwrap_or(""));
    c.amount("shipping", header.shipping_amount);

    for line in lines {
        c.field("line", &line.line_id.to_string());
        c.field("sku", line.sku_id.as_str());
        c.amount("quantity", line.quantity_ordered);
        c.amount("unit_price", line.unit_price);
        c.amount("discount", line.discount);
        c.field("tax_category", line.tax_category.as_str());
        c.field("external_tax_code", line.external_tax_code.as_deref().unwrap_or(""));
    }

    hex::encode(c.0.finalize())
}
