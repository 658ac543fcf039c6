//! Import a coupon file and migrate it batch by batch.
//!
//! # Usage
//!
//! ```bash
//! # Interactive: confirm, then offer to retry failures
//! cm-cli migrate coupon-export-2024-05-01.csv
//!
//! # Unattended, one automatic retry pass, JSON report
//! cm-cli migrate coupons.json --yes --retry --report report.json
//! ```
//!
//! Batches are sent one at a time. Ctrl+C stops after the batch in flight.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use coupon_migrator_core::progress::{MigrationProgress, duplicate_codes, select_for_retry};
use coupon_migrator_core::{BatchResult, CouponInput, import};

use crate::api::ApiClient;
use crate::error::CliError;
use crate::prompt::confirm;

/// Options of the `migrate` command.
#[derive(Debug, Clone)]
pub struct MigrateArgs {
    pub file: PathBuf,
    pub batch_size: usize,
    pub yes: bool,
    pub retry: bool,
    pub report: Option<PathBuf>,
}

/// Run a migration.
///
/// # Errors
///
/// Returns an error if the file cannot be imported, the user declines, or a
/// batch request fails as a whole.
pub async fn run(client: &ApiClient, args: MigrateArgs) -> Result<(), CliError> {
    let content = std::fs::read_to_string(&args.file)?;
    let items = import::parse_file(&args.file, &content)?;
    tracing::info!("Loaded {} coupons from {}", items.len(), args.file.display());

    let duplicates = duplicate_codes(&items);
    if !duplicates.is_empty() {
        tracing::warn!(
            "{} codes appear more than once; retries use the first occurrence: {}",
            duplicates.len(),
            duplicates.join(", ")
        );
    }

    if !args.yes
        && !confirm(&format!(
            "This will delete {} legacy coupon codes and create new standard promotions. Continue?",
            items.len()
        ))?
    {
        return Err(CliError::Aborted);
    }

    let interrupted = watch_interrupt();
    let mut progress = MigrationProgress::new(items.len());

    let outcome = send_all(client, &items, args.batch_size, &mut progress, &interrupted).await;
    summarize(&progress);
    if let Err(err) = outcome {
        write_report(args.report.as_ref(), &progress)?;
        return Err(err);
    }

    let mut auto_retried = false;
    loop {
        let selected = {
            let failed = progress.retryable_errors();
            if failed.is_empty() || interrupted.load(Ordering::SeqCst) {
                break;
            }
            let retry = if args.retry {
                !std::mem::replace(&mut auto_retried, true)
            } else {
                !args.yes && confirm(&format!("Retry {} failed coupons?", failed.len()))?
            };
            if !retry {
                break;
            }
            select_for_retry(&items, &failed)
        };

        let codes: Vec<String> = selected.iter().map(CouponInput::code).collect();
        tracing::info!("Retrying {} coupons", codes.len());
        let result = retry_all(client, &selected, args.batch_size).await;
        match result {
            Ok(result) => progress.apply_retry(&codes, result),
            Err(err) => {
                write_report(args.report.as_ref(), &progress)?;
                return Err(err);
            }
        }
        summarize(&progress);
    }

    write_report(args.report.as_ref(), &progress)
}

/// Set a flag on Ctrl+C instead of exiting, so the batch in flight completes.
fn watch_interrupt() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let handle = Arc::clone(&flag);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; stopping after the current batch");
            handle.store(true, Ordering::SeqCst);
        }
    });
    flag
}

async fn send_all(
    client: &ApiClient,
    items: &[CouponInput],
    batch_size: usize,
    progress: &mut MigrationProgress,
    interrupted: &AtomicBool,
) -> Result<(), CliError> {
    for (index, batch) in items.chunks(batch_size.max(1)).enumerate() {
        if interrupted.load(Ordering::SeqCst) {
            let snapshot = progress.snapshot();
            tracing::warn!(
                "{} coupons were not sent",
                snapshot.total.saturating_sub(snapshot.processed)
            );
            break;
        }

        progress.begin_batch(batch.first().map(CouponInput::code).unwrap_or_default());
        tracing::debug!(batch = index + 1, current = ?progress.snapshot().current_item, "Sending batch");

        let result = client.migrate_batch(batch).await?;
        progress.apply_batch(batch.len(), result);

        let s = progress.snapshot();
        tracing::info!(
            "[{:5.1}%] {}/{} processed: {} created, {} deleted, {} errors",
            s.percent,
            s.processed,
            s.total,
            s.created,
            s.deleted,
            s.errors
        );
    }
    Ok(())
}

async fn retry_all(
    client: &ApiClient,
    items: &[CouponInput],
    batch_size: usize,
) -> Result<BatchResult, CliError> {
    let mut result = BatchResult::default();
    for batch in items.chunks(batch_size.max(1)) {
        result.merge(client.migrate_batch(batch).await?);
    }
    Ok(result)
}

fn summarize(progress: &MigrationProgress) {
    let s = progress.snapshot();
    tracing::info!(
        "Migration: {} created, {} deleted, {} errors ({} retryable)",
        s.created,
        s.deleted,
        s.errors,
        progress.retryable_errors().len()
    );
    for error in progress.errors() {
        let note = if error.retryable { "" } else { " (not retryable)" };
        tracing::warn!("  {}: {}{note}", error.code, error.error);
    }
}

fn write_report(path: Option<&PathBuf>, progress: &MigrationProgress) -> Result<(), CliError> {
    let Some(path) = path else {
        return Ok(());
    };
    std::fs::write(path, serde_json::to_string_pretty(progress.results())?)?;
    tracing::info!("Report written to {}", path.display());
    Ok(())
}
