//! `import` command: load raw records, run the reconciler, print the report.

use std::path::{Path, PathBuf};

use anyhow::Context;
use e3sync_core::{AppConfig, CanonicalProduct, CreatedProduct, ImportReport, ImportResult};
use e3sync_import::{CancelSignal, ImportReconciler, ProductDestination};
use e3sync_shopify::{DestinationError, ShopifyAdminClient};
use e3sync_upstream::{Elektro3Client, UpstreamProduct};
use serde_json::Value;

#[derive(Debug)]
pub(crate) enum ImportSource {
    File(PathBuf),
    Codes(Vec<String>),
}

/// Accepts every record and invents an id; nothing leaves the process.
struct DryRunDestination;

impl ProductDestination for DryRunDestination {
    async fn create_product(
        &self,
        product: &CanonicalProduct,
    ) -> Result<CreatedProduct, DestinationError> {
        tracing::info!(
            code = %product.code,
            title = %product.title,
            price = %product.price,
            stock = product.stock_quantity,
            images = product.images.len(),
            "dry-run: would create product"
        );
        Ok(CreatedProduct {
            id: format!("dry-run/{}", product.code),
            title: product.title.clone(),
        })
    }
}

pub(crate) async fn run_import(
    config: &AppConfig,
    source: ImportSource,
    dry_run: bool,
    concurrency: usize,
) -> anyhow::Result<()> {
    let reconciler = ImportReconciler::with_concurrency(concurrency);
    let cancel = CancelSignal::new();
    cancel_on_ctrl_c(cancel.clone());

    let report = match source {
        ImportSource::File(path) => {
            let items = read_records(&path)?;
            if dry_run {
                reconciler
                    .import_batch_with_cancel(&items, &DryRunDestination, &cancel)
                    .await
            } else {
                let upstream = Elektro3Client::from_config(config)?;
                let destination = ShopifyAdminClient::from_config(config)?;
                reconciler
                    .run(&upstream, &items, &destination, &cancel)
                    .await?
            }
        }
        ImportSource::Codes(codes) => {
            let upstream = Elektro3Client::from_config(config)?;
            let items = fetch_records(&upstream, &codes).await?;
            if dry_run {
                reconciler
                    .run(&upstream, &items, &DryRunDestination, &cancel)
                    .await?
            } else {
                let destination = ShopifyAdminClient::from_config(config)?;
                reconciler
                    .run(&upstream, &items, &destination, &cancel)
                    .await?
            }
        }
    };

    print_report(&report);
    if report.failure > 0 {
        anyhow::bail!("{} of {} products failed to import", report.failure, report.total);
    }
    Ok(())
}

fn cancel_on_ctrl_c(signal: CancelSignal) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; finishing in-flight products and stopping");
            signal.cancel();
        }
    });
}

fn read_records(path: &Path) -> anyhow::Result<Vec<UpstreamProduct>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_records(&text).with_context(|| format!("invalid product file {}", path.display()))
}

/// Parses either a bare array of records or an object with a `products` array.
fn parse_records(text: &str) -> anyhow::Result<Vec<UpstreamProduct>> {
    let value: Value = serde_json::from_str(text)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("products") {
            Some(Value::Array(items)) => items,
            _ => anyhow::bail!("expected a JSON array or an object with a \"products\" array"),
        },
        _ => anyhow::bail!("expected a JSON array or an object with a \"products\" array"),
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).with_context(|| format!("record {index} is not an object"))
        })
        .collect()
}

async fn fetch_records(
    upstream: &Elektro3Client,
    codes: &[String],
) -> anyhow::Result<Vec<UpstreamProduct>> {
    let mut items = Vec::with_capacity(codes.len());
    for code in codes {
        let product = upstream
            .fetch_product_details(code)
            .await
            .with_context(|| format!("failed to fetch product {code}"))?;
        items.push(product);
    }
    Ok(items)
}

fn print_report(report: &ImportReport) {
    for result in &report.results {
        match result {
            ImportResult::Success {
                upstream_code,
                destination_id,
                title,
            } => println!("ok      {upstream_code:<14} {destination_id}  {title}"),
            ImportResult::Failure {
                upstream_code,
                error_message,
                ..
            } => println!("FAILED  {upstream_code:<14} {error_message}"),
        }
    }
    println!(
        "imported {}/{} ({} failed)",
        report.success, report.total, report.failure
    );
    if report.cancelled {
        println!("cancelled: {} products not attempted", report.skipped);
    }
    let retriable: Vec<&str> = report.retriable_codes().collect();
    if !retriable.is_empty() {
        println!("retry later: {}", retriable.join(" "));
    }
}
