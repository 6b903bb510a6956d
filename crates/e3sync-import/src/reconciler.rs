//! Per-item import loop with failure isolation.

use e3sync_core::{FailureKind, ImportReport, ImportResult, MAX_IMPORT_CONCURRENCY};
use e3sync_upstream::{normalize_product, UpstreamError, UpstreamProduct};
use futures::stream::{FuturesOrdered, StreamExt};

use crate::cancel::CancelSignal;
use crate::destination::{ProductDestination, TokenSource};
use crate::error::ImportError;

/// Turns a batch of raw upstream records into destination products.
///
/// Every record yields exactly one [`ImportResult`], in input order. A
/// failing record never stops the batch, and nothing is retried at this
/// level. Records sharing a code are imported independently.
#[derive(Debug, Clone, Copy)]
pub struct ImportReconciler {
    concurrency: usize,
}

impl Default for ImportReconciler {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

impl ImportReconciler {
    /// Sequential reconciler: one destination call at a time.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows up to `concurrency` destination calls in flight, clamped to
    /// `1..=MAX_IMPORT_CONCURRENCY`. Report order is unaffected.
    #[must_use]
    pub fn with_concurrency(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.clamp(1, MAX_IMPORT_CONCURRENCY),
        }
    }

    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub async fn import_batch<D: ProductDestination>(
        &self,
        items: &[UpstreamProduct],
        destination: &D,
    ) -> ImportReport {
        self.import_batch_with_cancel(items, destination, &CancelSignal::new())
            .await
    }

    /// Like [`ImportReconciler::import_batch`], but stops starting new items
    /// once `cancel` is set. The partial report counts the rest as skipped.
    pub async fn import_batch_with_cancel<D: ProductDestination>(
        &self,
        items: &[UpstreamProduct],
        destination: &D,
        cancel: &CancelSignal,
    ) -> ImportReport {
        tracing::info!(
            items = items.len(),
            concurrency = self.concurrency,
            "starting import batch"
        );

        let mut in_flight = FuturesOrdered::new();
        let mut outcomes: Vec<Option<ImportResult>> = Vec::with_capacity(items.len());
        for raw in items {
            if in_flight.len() >= self.concurrency {
                if let Some(outcome) = in_flight.next().await {
                    outcomes.push(outcome);
                }
            }
            in_flight.push_back(import_unless_cancelled(raw, destination, cancel));
        }
        while let Some(outcome) = in_flight.next().await {
            outcomes.push(outcome);
        }

        let skipped = outcomes.iter().filter(|o| o.is_none()).count();
        let results: Vec<ImportResult> = outcomes.into_iter().flatten().collect();

        let report = if skipped > 0 {
            ImportReport::cancelled(results, skipped)
        } else {
            ImportReport::from_results(results)
        };

        if report.cancelled {
            tracing::warn!(
                attempted = report.total,
                success = report.success,
                failure = report.failure,
                skipped = report.skipped,
                "import batch cancelled"
            );
        } else {
            tracing::info!(
                total = report.total,
                success = report.success,
                failure = report.failure,
                "import batch finished"
            );
        }
        report
    }

    /// Full import: obtains an upstream token first, then runs the batch.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Authentication`] when no token can be obtained;
    /// in that case no record is attempted.
    pub async fn run<U, D>(
        &self,
        upstream: &U,
        items: &[UpstreamProduct],
        destination: &D,
        cancel: &CancelSignal,
    ) -> Result<ImportReport, ImportError>
    where
        U: TokenSource,
        D: ProductDestination,
    {
        if let Err(e) = upstream.bearer_token().await {
            tracing::error!(error = %e, items = items.len(), "import aborted before first item");
            return Err(ImportError::Authentication(e));
        }
        Ok(self
            .import_batch_with_cancel(items, destination, cancel)
            .await)
    }
}

/// `None` when the batch was cancelled before this record started.
async fn import_unless_cancelled<D: ProductDestination>(
    raw: &UpstreamProduct,
    destination: &D,
    cancel: &CancelSignal,
) -> Option<ImportResult> {
    if cancel.is_cancelled() {
        return None;
    }
    Some(import_one(raw, destination).await)
}

async fn import_one<D: ProductDestination>(raw: &UpstreamProduct, destination: &D) -> ImportResult {
    let product = match normalize_product(raw) {
        Ok(product) => product,
        Err(e) => {
            let upstream_code = match &e {
                UpstreamError::Normalization { code, .. } => code.clone(),
                _ => e3sync_core::UNIDENTIFIED_CODE.to_owned(),
            };
            tracing::warn!(code = %upstream_code, error = %e, "skipping unidentifiable record");
            return ImportResult::Failure {
                upstream_code,
                error_message: e.to_string(),
                kind: FailureKind::Normalization,
            };
        }
    };

    match destination.create_product(&product).await {
        Ok(created) => ImportResult::Success {
            upstream_code: product.code,
            destination_id: created.id,
            title: created.title,
        },
        Err(e) => {
            let kind = if e.is_validation() {
                FailureKind::Validation
            } else {
                FailureKind::Transport
            };
            tracing::warn!(code = %product.code, kind = ?kind, error = %e, "product import failed");
            ImportResult::Failure {
                upstream_code: product.code,
                error_message: e.to_string(),
                kind,
            }
        }
    }
}
