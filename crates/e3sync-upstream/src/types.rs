//! Raw shapes returned by the Elektro3 API.
//!
//! The distributor does not publish a schema and different endpoints spell
//! the same attribute differently (`precio` vs `price`, `codigo` vs `sku`).
//! [`UpstreamProduct`] therefore declares every known alias as an optional
//! loosely-typed [`Scalar`]; picking the winning alias is the normalizer's job.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A loosely-typed JSON scalar. Anything that is not text, a number or a
/// boolean lands in `Other` and is treated as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
    Other(Value),
}

impl Scalar {
    /// Trimmed, non-empty text. Numbers are rendered as-is.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        match self {
            Scalar::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_owned())
            }
            Scalar::Number(n) => Some(n.to_string()),
            Scalar::Bool(_) | Scalar::Other(_) => None,
        }
    }

    /// Decimal string for monetary values: `10` → `"10"`, `9.50` → `"9.5"`.
    /// Text is passed through trimmed.
    #[must_use]
    pub fn decimal_text(&self) -> Option<String> {
        match self {
            Scalar::Number(n) => {
                let raw = n.to_string();
                let parsed = Decimal::from_str_exact(&raw)
                    .or_else(|_| Decimal::from_scientific(&raw))
                    .or_else(|_| Decimal::from_str(&raw));
                Some(parsed.map_or(raw, |d| d.normalize().to_string()))
            }
            _ => self.text(),
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate_f64)),
            Scalar::Text(s) => {
                let trimmed = s.trim();
                trimmed.parse::<i64>().ok().or_else(|| {
                    trimmed
                        .replace(',', ".")
                        .parse::<f64>()
                        .ok()
                        .and_then(truncate_f64)
                })
            }
            Scalar::Bool(_) | Scalar::Other(_) => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => n.as_f64(),
            Scalar::Text(s) => s
                .trim()
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite()),
            Scalar::Bool(_) | Scalar::Other(_) => None,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn truncate_f64(value: f64) -> Option<i64> {
    (value.is_finite() && value.abs() < i64::MAX as f64).then(|| value.trunc() as i64)
}

/// An image reference: either a bare URL or an object carrying the URL
/// under `imagen` or `src`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    Url(String),
    Entry {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        imagen: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        src: Option<String>,
    },
    Other(Value),
}

impl ImageRef {
    /// The non-empty URL, preferring `imagen` over `src`.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        fn non_empty(s: &str) -> Option<&str> {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then_some(trimmed)
        }

        match self {
            ImageRef::Url(s) => non_empty(s),
            ImageRef::Entry { imagen, src } => imagen
                .as_deref()
                .and_then(non_empty)
                .or_else(|| src.as_deref().and_then(non_empty)),
            ImageRef::Other(_) => None,
        }
    }
}

/// `images` fields arrive either as a list or as a single entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageList {
    Many(Vec<ImageRef>),
    One(ImageRef),
}

impl ImageList {
    #[must_use]
    pub fn as_slice(&self) -> &[ImageRef] {
        match self {
            ImageList::Many(items) => items,
            ImageList::One(item) => std::slice::from_ref(item),
        }
    }
}

/// A product record as returned by any Elektro3 listing or detail endpoint.
///
/// Unknown fields are kept in `extra` so a record can be handed back to a
/// caller (and later re-submitted for import) without losing data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamProduct {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codigo: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precio: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_quantity: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marca: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categoria: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subfamilia: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codigo_familia: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_code: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peso: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ean13: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ean: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imagen: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<ImageList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imagenes_adicionales: Option<ImageList>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UpstreamProduct {
    /// Looks up a scalar alias by its wire name. Unknown names yield `None`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Scalar> {
        let slot = match name {
            "codigo" => &self.codigo,
            "sku" => &self.sku,
            "id" => &self.id,
            "code" => &self.code,
            "nombre" => &self.nombre,
            "name" => &self.name,
            "title" => &self.title,
            "precio" => &self.precio,
            "price" => &self.price,
            "stock" => &self.stock,
            "inventory_quantity" => &self.inventory_quantity,
            "descripcion" => &self.descripcion,
            "description" => &self.description,
            "marca" => &self.marca,
            "brand" => &self.brand,
            "categoria" => &self.categoria,
            "category" => &self.category,
            "subfamilia" => &self.subfamilia,
            "subcategory" => &self.subcategory,
            "codigo_familia" => &self.codigo_familia,
            "family_code" => &self.family_code,
            "peso" => &self.peso,
            "weight" => &self.weight,
            "ean13" => &self.ean13,
            "barcode" => &self.barcode,
            "ean" => &self.ean,
            "imagen" => &self.imagen,
            "image" => &self.image,
            _ => return None,
        };
        slot.as_ref()
    }

    /// The record's correlation code, if any code alias is present.
    #[must_use]
    pub fn code(&self) -> Option<String> {
        crate::normalize::resolve_code(self)
    }
}

/// Listing filter. Field names are translated to the distributor's
/// vocabulary by [`ProductFilter::to_upstream`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub query: Option<String>,
    pub in_stock: bool,
    pub code: Option<String>,
}

impl ProductFilter {
    #[must_use]
    pub fn by_code(code: &str) -> Self {
        Self {
            code: Some(code.to_owned()),
            ..Self::default()
        }
    }

    /// The filter object as the API expects it, or `None` if nothing is set.
    #[must_use]
    pub fn to_upstream(&self) -> Option<Map<String, Value>> {
        let non_empty = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| Value::String(v.to_owned()))
        };

        let mut map = Map::new();
        if let Some(category) = non_empty(&self.category) {
            map.insert("codigo_categoria".to_owned(), category);
        }
        if let Some(query) = non_empty(&self.query) {
            map.insert("search".to_owned(), query);
        }
        if self.in_stock {
            map.insert("stock_gt".to_owned(), Value::from(0));
        }
        if let Some(code) = non_empty(&self.code) {
            map.insert("codigo".to_owned(), code);
        }
        (!map.is_empty()).then_some(map)
    }
}

/// One page of a product listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPage {
    pub items: Vec<UpstreamProduct>,
    pub total_count: u64,
    pub total_pages: u64,
    pub current_page: u32,
}

/// A catalog category as returned by `get-categorias`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codigo: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Scalar>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Category {
    #[must_use]
    pub fn code(&self) -> Option<String> {
        first_text([&self.codigo, &self.id])
    }

    #[must_use]
    pub fn name(&self) -> Option<String> {
        first_text([&self.nombre, &self.name])
    }
}

fn first_text<const N: usize>(candidates: [&Option<Scalar>; N]) -> Option<String> {
    candidates
        .into_iter()
        .find_map(|c| c.as_ref().and_then(Scalar::text))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn scalar_decimal_text_normalizes_numbers() {
        let ten: Scalar = serde_json::from_value(json!(10)).unwrap();
        assert_eq!(ten.decimal_text().as_deref(), Some("10"));

        let nine_half: Scalar = serde_json::from_value(json!(9.5)).unwrap();
        assert_eq!(nine_half.decimal_text().as_deref(), Some("9.5"));

        let text: Scalar = serde_json::from_value(json!(" 12.90 ")).unwrap();
        assert_eq!(text.decimal_text().as_deref(), Some("12.90"));
    }

    #[test]
    fn scalar_as_i64_accepts_numeric_strings_and_floats() {
        let s: Scalar = serde_json::from_value(json!("42")).unwrap();
        assert_eq!(s.as_i64(), Some(42));
        let f: Scalar = serde_json::from_value(json!(3.9)).unwrap();
        assert_eq!(f.as_i64(), Some(3));
        let junk: Scalar = serde_json::from_value(json!("many")).unwrap();
        assert_eq!(junk.as_i64(), None);
    }

    #[test]
    fn scalar_as_f64_accepts_decimal_comma() {
        let s: Scalar = serde_json::from_value(json!("1,25")).unwrap();
        assert_eq!(s.as_f64(), Some(1.25));
    }

    #[test]
    fn upstream_product_tolerates_unexpected_types() {
        let raw: UpstreamProduct = serde_json::from_value(json!({
            "codigo": "A1",
            "precio": {"amount": 3},
            "images": "https://cdn.example.com/a.jpg",
            "stock": null,
            "fabricante": "ACME"
        }))
        .unwrap();
        assert!(matches!(raw.precio, Some(Scalar::Other(_))));
        assert!(raw.stock.is_none());
        assert_eq!(
            raw.images.as_ref().map(|l| l.as_slice()[0].url()),
            Some(Some("https://cdn.example.com/a.jpg"))
        );
        assert_eq!(raw.extra.get("fabricante"), Some(&json!("ACME")));
    }

    #[test]
    fn upstream_product_round_trips_unknown_fields() {
        let input = json!({"codigo": "A1", "precio": 9.5, "fabricante": "ACME"});
        let raw: UpstreamProduct = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(serde_json::to_value(&raw).unwrap(), input);
    }

    #[test]
    fn image_ref_prefers_imagen_over_src() {
        let entry: ImageRef =
            serde_json::from_value(json!({"imagen": "a.jpg", "src": "b.jpg"})).unwrap();
        assert_eq!(entry.url(), Some("a.jpg"));
        let entry: ImageRef = serde_json::from_value(json!({"imagen": "", "src": "b.jpg"})).unwrap();
        assert_eq!(entry.url(), Some("b.jpg"));
    }

    #[test]
    fn filter_to_upstream_uses_distributor_keys() {
        let filter = ProductFilter {
            category: Some("ILU".to_owned()),
            query: Some("bombilla".to_owned()),
            in_stock: true,
            code: None,
        };
        let map = filter.to_upstream().unwrap();
        assert_eq!(map.get("codigo_categoria"), Some(&json!("ILU")));
        assert_eq!(map.get("search"), Some(&json!("bombilla")));
        assert_eq!(map.get("stock_gt"), Some(&json!(0)));
        assert!(!map.contains_key("codigo"));
    }

    #[test]
    fn empty_filter_is_none() {
        assert!(ProductFilter::default().to_upstream().is_none());
        let blank = ProductFilter {
            query: Some("   ".to_owned()),
            ..ProductFilter::default()
        };
        assert!(blank.to_upstream().is_none());
    }

    #[test]
    fn category_code_and_name_fall_back_to_english_keys() {
        let cat: Category = serde_json::from_value(json!({"id": 7, "name": "Lighting"})).unwrap();
        assert_eq!(cat.code().as_deref(), Some("7"));
        assert_eq!(cat.name().as_deref(), Some("Lighting"));
    }
}
