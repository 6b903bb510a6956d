pub mod client;
pub mod error;
pub mod payload;
mod retry;
pub mod types;

pub use client::ShopifyAdminClient;
pub use error::{DestinationError, UserError};
pub use types::ShopMetadata;
