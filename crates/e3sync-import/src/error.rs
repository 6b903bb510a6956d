use e3sync_upstream::UpstreamError;
use thiserror::Error;

/// Batch-fatal failures. Per-item problems never surface here; they are
/// recorded in the [`e3sync_core::ImportReport`].
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("upstream authentication failed; no products were imported: {0}")]
    Authentication(#[source] UpstreamError),
}
