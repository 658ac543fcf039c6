//! Coupon import from CSV and JSON files.
//!
//! Both formats are spreadsheet-friendly. CSV headers are matched loosely so
//! a file exported by this tool, or by the BigCommerce control panel, or
//! assembled by hand, all import the same way.

use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use serde_json::Value;
use thiserror::Error;

use crate::coupon::{parse_decimal, parse_max_uses, Coupon, CouponInput, DEFAULT_DISCOUNT};
use crate::types::{DiscountType, LegacyCouponId};

/// Errors that can occur while importing a coupon file.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV file must have a header row and at least one data row.")]
    NoDataRows,

    #[error("CSV file must have a \"Code\" column.")]
    MissingCodeColumn,

    #[error("No valid codes found in CSV file.")]
    NoValidCsvCodes,

    #[error("Invalid file format. Expected a JSON array of coupon codes.")]
    NotAnArray,

    #[error("No valid codes found in file.")]
    Empty,

    #[error("Unsupported file type: {0} (expected .csv or .json)")]
    UnsupportedFormat(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Column positions resolved from a CSV header row.
struct Columns {
    code: usize,
    id: Option<usize>,
    name: Option<usize>,
    discount: Option<usize>,
    kind: Option<usize>,
    max_uses: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, ImportError> {
        let lower: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let exact = |name: &str| lower.iter().position(|h| h == name);
        let containing = |needle: &str| lower.iter().position(|h| h.contains(needle));

        Ok(Self {
            code: exact("code").ok_or(ImportError::MissingCodeColumn)?,
            id: containing("coupon id").or_else(|| containing("id")),
            name: containing("name"),
            discount: exact("discount"),
            kind: exact("type"),
            max_uses: containing("max uses"),
        })
    }

    fn coupon(&self, record: &StringRecord) -> Option<Coupon> {
        let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).map(str::trim);

        let code = field(Some(self.code)).filter(|c| !c.is_empty())?;
        let mut coupon = Coupon::new(code);

        coupon.discount = field(self.discount)
            .and_then(parse_decimal)
            .filter(|d| !d.is_zero())
            .unwrap_or(DEFAULT_DISCOUNT);
        coupon.discount_type = field(self.kind).map_or_else(DiscountType::default, DiscountType::from_loose);
        coupon.old_coupon_id = field(self.id)
            .and_then(|s| s.parse::<i64>().ok())
            .map(LegacyCouponId::new);
        coupon.name = field(self.name)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        coupon.max_uses = field(self.max_uses).and_then(parse_max_uses);

        Some(coupon)
    }
}

/// Parse a CSV coupon list.
///
/// Rows with an empty code are skipped.
///
/// # Errors
///
/// Returns an error if there is no data row, no `Code` column, or no row
/// with a code.
pub fn parse_csv(content: &str) -> Result<Vec<Coupon>, ImportError> {
    let text = content.trim_start_matches('\u{FEFF}');
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let records = reader.records().collect::<Result<Vec<_>, _>>()?;
    if records.is_empty() {
        return Err(ImportError::NoDataRows);
    }

    let columns = Columns::resolve(&headers)?;
    let coupons: Vec<Coupon> = records.iter().filter_map(|r| columns.coupon(r)).collect();
    if coupons.is_empty() {
        return Err(ImportError::NoValidCsvCodes);
    }
    Ok(coupons)
}

/// Parse a JSON coupon list.
///
/// Items whose code is unusable are kept as [`CouponInput::Malformed`] so
/// the migration reports them per item.
///
/// # Errors
///
/// Returns an error if the content is not a JSON array, or is empty.
pub fn parse_json(content: &str) -> Result<Vec<CouponInput>, ImportError> {
    let Value::Array(items) = serde_json::from_str::<Value>(content)? else {
        return Err(ImportError::NotAnArray);
    };
    if items.is_empty() {
        return Err(ImportError::Empty);
    }
    Ok(items.into_iter().map(CouponInput::from_value).collect())
}

/// Parse a coupon file, choosing the format by extension.
///
/// # Errors
///
/// Returns an error for an unknown extension or an invalid file.
pub fn parse_file(path: &Path, content: &str) -> Result<Vec<CouponInput>, ImportError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => Ok(parse_csv(content)?.into_iter().map(CouponInput::Coupon).collect()),
        "json" => parse_json(content),
        _ => Err(ImportError::UnsupportedFormat(path.display().to_string())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_csv_quoted_name_with_comma() {
        let csv = "Code,Coupon ID,Coupon Name,Discount,Type\nSAVE10,1,\"Sale, Big\",10,percentage_discount";
        let coupons = parse_csv(csv).unwrap();

        assert_eq!(coupons.len(), 1);
        let coupon = &coupons[0];
        assert_eq!(coupon.code, "SAVE10");
        assert_eq!(coupon.old_coupon_id, Some(LegacyCouponId::new(1)));
        assert_eq!(coupon.name.as_deref(), Some("Sale, Big"));
        assert_eq!(coupon.discount, Decimal::from(10));
        assert_eq!(coupon.discount_type, DiscountType::Percentage);
    }

    #[test]
    fn test_csv_exported_file_reimports() {
        let csv = "\
Code,Coupon ID,Coupon Name,Discount,Type,Enabled,Max Uses,Current Uses,Min Purchase,Expires
FIVE,2,Five off,$5,fixed_discount,Yes,Unlimited,0,N/A,N/A
EACH,3,,25%,per_item_discount,No,40,3,$10,N/A
";
        let coupons = parse_csv(csv).unwrap();

        assert_eq!(coupons[0].discount, Decimal::from(5));
        assert_eq!(coupons[0].discount_type, DiscountType::Fixed);
        assert_eq!(coupons[0].max_uses, None);

        assert_eq!(coupons[1].discount, Decimal::from(25));
        assert_eq!(coupons[1].discount_type, DiscountType::PerItem);
        assert_eq!(coupons[1].name, None);
        assert_eq!(coupons[1].max_uses, Some(40));
    }

    #[test]
    fn test_csv_skips_empty_codes_and_defaults_discount() {
        let csv = "code,discount\n,5\nKEEP,0\nALSO,abc\n";
        let coupons = parse_csv(csv).unwrap();

        assert_eq!(coupons.len(), 2);
        assert!(coupons.iter().all(|c| c.discount == DEFAULT_DISCOUNT));
    }

    #[test]
    fn test_csv_errors() {
        assert!(matches!(parse_csv("Code,Discount\n"), Err(ImportError::NoDataRows)));
        assert!(matches!(
            parse_csv("Name,Discount\nx,5\n"),
            Err(ImportError::MissingCodeColumn)
        ));
        assert!(matches!(parse_csv("Code\n\"\"\n"), Err(ImportError::NoValidCsvCodes)));
    }

    #[test]
    fn test_json_import() {
        let items = parse_json(r#"[{"code":"A","discount":20}, "B", {"code": 5}]"#).unwrap();
        assert_eq!(items.len(), 3);
        assert!(matches!(&items[0], CouponInput::Coupon(c) if c.discount == Decimal::from(20)));
        assert!(matches!(&items[1], CouponInput::Coupon(c) if c.code == "B"));
        assert!(matches!(items[2], CouponInput::Malformed(_)));
    }

    #[test]
    fn test_json_errors() {
        assert!(matches!(parse_json(r#"{"code":"A"}"#), Err(ImportError::NotAnArray)));
        assert!(matches!(parse_json("[]"), Err(ImportError::Empty)));
        assert!(matches!(parse_json("not json"), Err(ImportError::Json(_))));
    }

    #[test]
    fn test_parse_file_dispatches_on_extension() {
        let items = parse_file(Path::new("coupons.CSV"), "Code\nX\n").unwrap();
        assert_eq!(items.len(), 1);

        assert!(matches!(
            parse_file(Path::new("coupons.txt"), ""),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }
}
