//! Request bodies for product creation in both Admin API modes.

use e3sync_core::CanonicalProduct;
use serde::Serialize;

pub(crate) const PRODUCT_CREATE_MUTATION: &str = r"
mutation productCreate($input: ProductInput!, $media: [CreateMediaInput!]) {
  productCreate(input: $input, media: $media) {
    product { id title }
    userErrors { field message }
  }
}";

pub(crate) const SHOP_QUERY: &str = r"
query shopMetadata {
  shop { name myshopifyDomain plan { displayName } }
}";

pub(crate) const PRIMARY_LOCATION_QUERY: &str = r"
query primaryLocation {
  locations(first: 1) { nodes { id } }
}";

// ---------------------------------------------------------------------------
// GraphQL
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput<'a> {
    pub title: &'a str,
    pub description_html: &'a str,
    pub vendor: &'a str,
    pub product_type: &'a str,
    pub tags: Vec<&'a str>,
    pub status: &'static str,
    pub variants: Vec<VariantInput<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInput<'a> {
    pub price: &'a str,
    pub sku: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub barcode: &'a str,
    pub weight: f64,
    pub weight_unit: &'static str,
    pub inventory_management: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inventory_quantities: Vec<InventoryQuantityInput<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryQuantityInput<'a> {
    pub available_quantity: i64,
    pub location_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInput<'a> {
    pub original_source: &'a str,
    pub media_content_type: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ProductCreateVariables<'a> {
    pub input: ProductInput<'a>,
    pub media: Vec<MediaInput<'a>>,
}

/// Variables for `productCreate`.
///
/// Stock is only sent when a location is known; without one Shopify rejects
/// `inventoryQuantities`.
#[must_use]
pub fn product_create_variables<'a>(
    product: &'a CanonicalProduct,
    location_id: Option<&'a str>,
) -> ProductCreateVariables<'a> {
    let inventory_quantities = location_id
        .map(|location_id| {
            vec![InventoryQuantityInput {
                available_quantity: product.stock_quantity,
                location_id,
            }]
        })
        .unwrap_or_default();

    ProductCreateVariables {
        input: ProductInput {
            title: &product.title,
            description_html: &product.description_html,
            vendor: &product.vendor,
            product_type: &product.product_type,
            tags: product.tag_list().collect(),
            status: "ACTIVE",
            variants: vec![VariantInput {
                price: &product.price,
                sku: &product.code,
                barcode: &product.barcode,
                weight: product.weight,
                weight_unit: product.weight_unit.graphql_name(),
                inventory_management: "SHOPIFY",
                inventory_quantities,
            }],
        },
        media: product
            .images
            .iter()
            .map(|image| MediaInput {
                original_source: &image.src,
                media_content_type: "IMAGE",
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// REST
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct RestProductBody<'a> {
    pub product: RestProductInput<'a>,
}

#[derive(Debug, Serialize)]
pub struct RestProductInput<'a> {
    pub title: &'a str,
    pub body_html: &'a str,
    pub vendor: &'a str,
    pub product_type: &'a str,
    pub tags: &'a str,
    pub status: &'static str,
    pub variants: Vec<RestVariantInput<'a>>,
    pub images: Vec<RestImageInput<'a>>,
}

#[derive(Debug, Serialize)]
pub struct RestVariantInput<'a> {
    pub price: &'a str,
    pub sku: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub barcode: &'a str,
    pub inventory_quantity: i64,
    pub inventory_management: &'static str,
    pub weight: f64,
    pub weight_unit: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RestImageInput<'a> {
    pub src: &'a str,
}

/// Body for `POST /admin/api/{version}/products.json`.
#[must_use]
pub fn rest_product_body(product: &CanonicalProduct) -> RestProductBody<'_> {
    RestProductBody {
        product: RestProductInput {
            title: &product.title,
            body_html: &product.description_html,
            vendor: &product.vendor,
            product_type: &product.product_type,
            tags: &product.tags,
            status: "active",
            variants: vec![RestVariantInput {
                price: &product.price,
                sku: &product.code,
                barcode: &product.barcode,
                inventory_quantity: product.stock_quantity,
                inventory_management: "shopify",
                weight: product.weight,
                weight_unit: product.weight_unit.rest_name(),
            }],
            images: product
                .images
                .iter()
                .map(|image| RestImageInput { src: &image.src })
                .collect(),
        },
    }
}
