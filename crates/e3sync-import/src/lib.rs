//! Batch import of distributor products into the destination store.

pub mod cancel;
pub mod destination;
pub mod error;
pub mod reconciler;

pub use cancel::CancelSignal;
pub use destination::{ProductDestination, TokenSource};
pub use error::ImportError;
pub use reconciler::ImportReconciler;
