//! Coupon export to CSV and JSON.
//!
//! The CSV layout matches what [`crate::import::parse_csv`] reads, so an
//! exported file can be edited in a spreadsheet and imported again.

use csv::Writer;
use rust_decimal::Decimal;

use crate::coupon::Coupon;
use crate::vendor::LegacyCoupon;

/// Column headers of an exported CSV file.
pub const CSV_HEADERS: [&str; 10] = [
    "Code",
    "Coupon ID",
    "Coupon Name",
    "Discount",
    "Type",
    "Enabled",
    "Max Uses",
    "Current Uses",
    "Min Purchase",
    "Expires",
];

const NOT_APPLICABLE: &str = "N/A";
const UNLIMITED: &str = "Unlimited";

fn max_uses_cell(max_uses: Option<i64>) -> String {
    max_uses
        .filter(|&n| n > 0)
        .map_or_else(|| UNLIMITED.to_string(), |n| n.to_string())
}

fn decimal_cell(value: Option<Decimal>) -> String {
    value.map_or_else(|| NOT_APPLICABLE.to_string(), |d| d.normalize().to_string())
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String, csv::Error> {
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Render V2 legacy coupons as CSV. Coupons without a code are skipped.
///
/// # Errors
///
/// Returns an error if a record cannot be written.
pub fn legacy_coupons_to_csv(coupons: &[LegacyCoupon]) -> Result<String, csv::Error> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;

    for coupon in coupons.iter().filter(|c| !c.code.is_empty()) {
        writer.write_record([
            coupon.code.clone(),
            coupon.id.to_string(),
            coupon.name.clone().unwrap_or_default(),
            decimal_cell(coupon.amount),
            coupon.coupon_type.clone(),
            if coupon.enabled { "Yes" } else { "No" }.to_string(),
            max_uses_cell(coupon.max_uses),
            coupon.num_uses.unwrap_or(0).to_string(),
            coupon
                .min_purchase
                .map_or_else(|| NOT_APPLICABLE.to_string(), |d| format!("${}", d.normalize())),
            coupon
                .expires
                .clone()
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| NOT_APPLICABLE.to_string()),
        ])?;
    }

    finish(writer)
}

/// Render coupon descriptors as CSV.
///
/// Columns a descriptor does not carry are filled with placeholders.
///
/// # Errors
///
/// Returns an error if a record cannot be written.
pub fn coupons_to_csv(coupons: &[Coupon]) -> Result<String, csv::Error> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;

    for coupon in coupons {
        writer.write_record([
            coupon.code.clone(),
            coupon.old_coupon_id.map(|id| id.to_string()).unwrap_or_default(),
            coupon.name.clone().unwrap_or_default(),
            coupon.discount.normalize().to_string(),
            coupon.discount_type.to_string(),
            "Yes".to_string(),
            max_uses_cell(coupon.max_uses),
            "0".to_string(),
            NOT_APPLICABLE.to_string(),
            NOT_APPLICABLE.to_string(),
        ])?;
    }

    finish(writer)
}

/// Render coupon descriptors as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn coupons_to_json(coupons: &[Coupon]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(coupons)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::import::parse_csv;
    use crate::types::{DiscountType, LegacyCouponId};
    use serde_json::json;

    fn legacy(value: serde_json::Value) -> LegacyCoupon {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_legacy_csv_layout() {
        let csv = legacy_coupons_to_csv(&[
            legacy(json!({
                "id": 1,
                "name": "Sale, Big",
                "code": "SAVE10",
                "type": "percentage_discount",
                "amount": "10.0000",
                "min_purchase": "25.0000",
                "enabled": true,
                "max_uses": 0,
                "num_uses": 4
            })),
            legacy(json!({"id": 2, "code": ""})),
        ])
        .unwrap();

        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(CSV_HEADERS.join(",").as_str()));
        assert_eq!(
            lines.next(),
            Some("SAVE10,1,\"Sale, Big\",10,percentage_discount,Yes,Unlimited,4,$25,N/A")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_legacy_csv_reimports() {
        let csv = legacy_coupons_to_csv(&[legacy(json!({
            "id": 7,
            "name": "Flat",
            "code": "FLAT",
            "type": "fixed_discount",
            "amount": "7.5000",
            "enabled": false,
            "max_uses": 12
        }))])
        .unwrap();

        let coupons = parse_csv(&csv).unwrap();
        assert_eq!(coupons[0].code, "FLAT");
        assert_eq!(coupons[0].old_coupon_id, Some(LegacyCouponId::new(7)));
        assert_eq!(coupons[0].discount, Decimal::new(75, 1));
        assert_eq!(coupons[0].discount_type, DiscountType::Fixed);
        assert_eq!(coupons[0].max_uses, Some(12));
    }

    #[test]
    fn test_descriptor_json_shape() {
        let mut coupon = Coupon::new("JSON1");
        coupon.old_coupon_id = Some(LegacyCouponId::new(3));
        let rendered = coupons_to_json(&[coupon]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(
            value,
            json!([{
                "code": "JSON1",
                "discount": 10.0,
                "discountType": "percentage",
                "oldCouponId": 3,
                "max_uses": null
            }])
        );
    }

    #[test]
    fn test_descriptor_csv_reimports() {
        let mut coupon = Coupon::new("EACH");
        coupon.discount_type = DiscountType::PerItem;
        coupon.discount = Decimal::from(30);

        let coupons = parse_csv(&coupons_to_csv(&[coupon.clone()]).unwrap()).unwrap();
        assert_eq!(coupons, vec![coupon]);
    }
}
