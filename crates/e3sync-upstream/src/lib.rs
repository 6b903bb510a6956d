pub mod client;
pub mod envelope;
pub mod error;
pub mod normalize;
pub mod types;

pub use client::Elektro3Client;
pub use error::{AuthAttempt, AuthAttempts, UpstreamError};
pub use normalize::normalize_product;
pub use types::{Category, ImageRef, ProductFilter, ProductPage, Scalar, UpstreamProduct};
