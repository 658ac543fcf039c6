//! Export commands.
//!
//! # Usage
//!
//! ```bash
//! # Back up legacy coupons (re-importable by `migrate`)
//! cm-cli export-legacy --format csv
//!
//! # Export V3 coupon promotions as migration input
//! cm-cli export-promotions --format json -o promotions.json
//!
//! # Only list coupon promotions
//! cm-cli export-promotions --list
//! ```

use std::path::PathBuf;

use clap::ValueEnum;

use coupon_migrator_core::Coupon;
use coupon_migrator_core::export::{coupons_to_csv, coupons_to_json, legacy_coupons_to_csv};

use crate::api::ApiClient;
use crate::error::CliError;

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Csv,
    Json,
}

impl Format {
    const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// Export every legacy coupon.
///
/// CSV keeps the legacy columns; JSON writes migration descriptors.
///
/// # Errors
///
/// Returns an error if the export or the write fails.
pub async fn legacy(
    client: &ApiClient,
    format: Format,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let coupons = client.export_legacy_coupons().await?;

    let content = match format {
        Format::Csv => legacy_coupons_to_csv(&coupons)?,
        Format::Json => {
            let descriptors: Vec<Coupon> = coupons.iter().filter_map(Coupon::from_legacy).collect();
            coupons_to_json(&descriptors)?
        }
    };

    let path = output.unwrap_or_else(|| default_output("coupon-export", format));
    std::fs::write(&path, content)?;
    tracing::info!(
        "Exported {} legacy coupons to {}",
        coupons.len(),
        path.display()
    );
    Ok(())
}

/// Export V3 coupon promotions as migration descriptors, one per code.
///
/// Re-migrating the file replaces each promotion with a fresh one.
///
/// # Errors
///
/// Returns an error if the export or the write fails.
pub async fn promotions(
    client: &ApiClient,
    format: Format,
    output: Option<PathBuf>,
    list_only: bool,
) -> Result<(), CliError> {
    if list_only {
        let listing = client.list_coupon_promotions().await?;
        tracing::info!(
            "{} coupon promotions of {} total",
            listing.total_coupon_promotions,
            listing.total_promotions
        );
        for row in &listing.promotions {
            tracing::info!("  {}  {:?}  {}", row.id, row.status, row.name);
        }
        return Ok(());
    }

    let export = client.export_promotions().await?;
    let descriptors: Vec<Coupon> = export
        .data
        .iter()
        .flat_map(Coupon::from_promotion_export)
        .collect();

    let content = match format {
        Format::Csv => coupons_to_csv(&descriptors)?,
        Format::Json => coupons_to_json(&descriptors)?,
    };

    let path = output.unwrap_or_else(|| default_output("promotion-export", format));
    std::fs::write(&path, content)?;
    tracing::info!(
        "Exported {} codes from {} promotions ({} total) to {}",
        export.total_coupons,
        export.data.len(),
        export.total_promotions,
        path.display()
    );
    Ok(())
}

/// `{prefix}-{YYYY-MM-DD}.{ext}` in the current directory.
fn default_output(prefix: &str, format: Format) -> PathBuf {
    let date = chrono::Utc::now().format("%Y-%m-%d");
    PathBuf::from(format!("{prefix}-{date}.{}", format.extension()))
}
