//! Normalization from raw [`UpstreamProduct`] records to
//! [`e3sync_core::CanonicalProduct`].
//!
//! Every canonical attribute has a fixed, ordered alias list. The first alias
//! that is present and yields a usable value wins; later aliases are never
//! consulted once an earlier one matched. The ordering is part of the
//! contract: changing it changes which value lands in the store.

use e3sync_core::{
    CanonicalProduct, ProductImage, WeightUnit, DEFAULT_PRICE, DEFAULT_TITLE, DEFAULT_VENDOR,
    UNIDENTIFIED_CODE,
};

use crate::error::UpstreamError;
use crate::types::{Scalar, UpstreamProduct};

pub const CODE_ALIASES: &[&str] = &["codigo", "sku", "id", "code"];
pub const TITLE_ALIASES: &[&str] = &["nombre", "name", "title"];
pub const PRICE_ALIASES: &[&str] = &["precio", "price"];
pub const STOCK_ALIASES: &[&str] = &["stock", "inventory_quantity"];
pub const DESCRIPTION_ALIASES: &[&str] = &["descripcion", "description"];
pub const VENDOR_ALIASES: &[&str] = &["marca", "brand"];
pub const CATEGORY_ALIASES: &[&str] = &["categoria", "category"];
pub const SUBCATEGORY_ALIASES: &[&str] = &["subfamilia", "subcategory"];
pub const FAMILY_ALIASES: &[&str] = &["codigo_familia", "family_code"];
pub const WEIGHT_ALIASES: &[&str] = &["peso", "weight"];
pub const BARCODE_ALIASES: &[&str] = &["ean13", "barcode", "ean"];
pub const IMAGE_ALIASES: &[&str] = &["imagen", "image"];

/// Normalizes a raw [`UpstreamProduct`] into a [`CanonicalProduct`].
///
/// Pure and deterministic: the same input always yields an equal output.
///
/// # Errors
///
/// Returns [`UpstreamError::Normalization`] with code `"desconhecido"` if no
/// code alias carries a value.
pub fn normalize_product(raw: &UpstreamProduct) -> Result<CanonicalProduct, UpstreamError> {
    let Some(code) = resolve_code(raw) else {
        return Err(UpstreamError::Normalization {
            code: UNIDENTIFIED_CODE.to_owned(),
            reason: format!("record has none of the code fields {CODE_ALIASES:?}"),
        });
    };

    let category = first(raw, CATEGORY_ALIASES, Scalar::text);
    let subcategory = first(raw, SUBCATEGORY_ALIASES, Scalar::text);
    let family = first(raw, FAMILY_ALIASES, Scalar::text);

    let product_type = subcategory
        .clone()
        .or(category)
        .unwrap_or_default();

    let tags = [family, subcategory]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(",");

    Ok(CanonicalProduct {
        code,
        title: first(raw, TITLE_ALIASES, Scalar::text).unwrap_or_else(|| DEFAULT_TITLE.to_owned()),
        price: first(raw, PRICE_ALIASES, Scalar::decimal_text)
            .unwrap_or_else(|| DEFAULT_PRICE.to_owned()),
        stock_quantity: first(raw, STOCK_ALIASES, Scalar::as_i64).unwrap_or(0),
        description_html: first(raw, DESCRIPTION_ALIASES, Scalar::text).unwrap_or_default(),
        vendor: first(raw, VENDOR_ALIASES, Scalar::text)
            .unwrap_or_else(|| DEFAULT_VENDOR.to_owned()),
        product_type,
        tags,
        weight: first(raw, WEIGHT_ALIASES, Scalar::as_f64).unwrap_or(0.0),
        weight_unit: WeightUnit::Kg,
        barcode: first(raw, BARCODE_ALIASES, Scalar::text).unwrap_or_default(),
        images: collect_images(raw),
    })
}

/// First non-empty code alias, used both for normalization and for labelling
/// failures of records that never reach normalization.
pub(crate) fn resolve_code(raw: &UpstreamProduct) -> Option<String> {
    first(raw, CODE_ALIASES, Scalar::text)
}

fn first<T>(
    raw: &UpstreamProduct,
    aliases: &[&str],
    read: impl Fn(&Scalar) -> Option<T>,
) -> Option<T> {
    aliases
        .iter()
        .filter_map(|alias| raw.field(alias))
        .find_map(read)
}

/// Primary image (`imagen`, `image`, then the first entry of `images`),
/// followed by every `imagenes_adicionales` entry. Empty URLs are dropped.
fn collect_images(raw: &UpstreamProduct) -> Vec<ProductImage> {
    let primary = first(raw, IMAGE_ALIASES, Scalar::text).or_else(|| {
        raw.images
            .as_ref()
            .and_then(|list| list.as_slice().first())
            .and_then(|img| img.url())
            .map(str::to_owned)
    });

    let additional = raw
        .imagenes_adicionales
        .iter()
        .flat_map(|list| list.as_slice())
        .filter_map(|img| img.url())
        .map(str::to_owned);

    primary
        .into_iter()
        .chain(additional)
        .map(|src| ProductImage { src })
        .collect()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
