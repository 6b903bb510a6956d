//! Seams between the reconciler and the two remote APIs.

use e3sync_core::{CanonicalProduct, CreatedProduct};
use e3sync_shopify::{DestinationError, ShopifyAdminClient};
use e3sync_upstream::{Elektro3Client, UpstreamError};

/// Anything that can create a product from its canonical form.
#[allow(async_fn_in_trait)]
pub trait ProductDestination {
    async fn create_product(
        &self,
        product: &CanonicalProduct,
    ) -> Result<CreatedProduct, DestinationError>;
}

impl ProductDestination for ShopifyAdminClient {
    async fn create_product(
        &self,
        product: &CanonicalProduct,
    ) -> Result<CreatedProduct, DestinationError> {
        ShopifyAdminClient::create_product(self, product).await
    }
}

/// Supplies the upstream bearer token that gates a batch.
#[allow(async_fn_in_trait)]
pub trait TokenSource {
    async fn bearer_token(&self) -> Result<String, UpstreamError>;
}

impl TokenSource for Elektro3Client {
    async fn bearer_token(&self) -> Result<String, UpstreamError> {
        Elektro3Client::bearer_token(self).await
    }
}
