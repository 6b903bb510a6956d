//! Locating the record array inside Elektro3 response bodies.
//!
//! The same endpoint has been observed to answer with a bare array, with the
//! array under `data` or `productos`, with a `"Sin datos"` message when the
//! filter matches nothing, or with the array under some other top-level key.
//! Each shape is handled by one extractor; extractors run in a fixed order
//! and the first one that recognizes the body decides the outcome.

use serde_json::Value;

use crate::error::UpstreamError;

/// Message the API returns instead of an empty list.
pub const NO_DATA_SENTINEL: &str = "Sin datos";

/// Keys that mark an object as product-like in the heuristic scan.
const PRODUCT_MARKER_KEYS: &[&str] = &["codigo", "nombre", "precio"];

/// What an extractor found.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    Items(Vec<Value>),
    /// The API explicitly said there is nothing to return.
    Empty,
}

impl Extracted {
    #[must_use]
    pub fn into_items(self) -> Vec<Value> {
        match self {
            Extracted::Items(items) => items,
            Extracted::Empty => Vec::new(),
        }
    }
}

/// `None` means "not my shape, try the next extractor".
pub type ExtractFn = fn(&Value) -> Option<Result<Extracted, UpstreamError>>;

pub struct Extractor {
    pub name: &'static str,
    pub extract: ExtractFn,
}

pub const PRODUCT_EXTRACTORS: &[Extractor] = &[
    Extractor {
        name: "bare array",
        extract: bare_array,
    },
    Extractor {
        name: "data",
        extract: data_array,
    },
    Extractor {
        name: "productos",
        extract: productos_array,
    },
    Extractor {
        name: "no-data sentinel",
        extract: no_data_sentinel,
    },
    Extractor {
        name: "error status",
        extract: error_status,
    },
    Extractor {
        name: "product-like array scan",
        extract: product_like_array,
    },
];

pub const CATEGORY_EXTRACTORS: &[Extractor] = &[
    Extractor {
        name: "bare array",
        extract: bare_array,
    },
    Extractor {
        name: "data",
        extract: data_array,
    },
    Extractor {
        name: "categorias",
        extract: categorias_array,
    },
    Extractor {
        name: "no-data sentinel",
        extract: no_data_sentinel,
    },
];

/// Runs `extractors` in order against `body`.
///
/// # Errors
///
/// - [`UpstreamError::Api`] if the body carries an error status.
/// - [`UpstreamError::Format`] if no extractor recognizes the body.
pub fn extract(
    body: &Value,
    extractors: &[Extractor],
    context: &str,
) -> Result<Extracted, UpstreamError> {
    for extractor in extractors {
        if let Some(outcome) = (extractor.extract)(body) {
            tracing::debug!(extractor = extractor.name, context, "response envelope matched");
            return outcome;
        }
    }

    Err(UpstreamError::Format {
        context: context.to_owned(),
        keys: top_level_keys(body),
    })
}

fn items(value: &Value) -> Option<Result<Extracted, UpstreamError>> {
    value
        .as_array()
        .map(|items| Ok(Extracted::Items(items.clone())))
}

fn bare_array(body: &Value) -> Option<Result<Extracted, UpstreamError>> {
    items(body)
}

fn data_array(body: &Value) -> Option<Result<Extracted, UpstreamError>> {
    body.get("data").and_then(items)
}

fn productos_array(body: &Value) -> Option<Result<Extracted, UpstreamError>> {
    body.get("productos").and_then(items)
}

fn categorias_array(body: &Value) -> Option<Result<Extracted, UpstreamError>> {
    body.get("categorias").and_then(items)
}

fn no_data_sentinel(body: &Value) -> Option<Result<Extracted, UpstreamError>> {
    (body.get("message").and_then(Value::as_str) == Some(NO_DATA_SENTINEL))
        .then_some(Ok(Extracted::Empty))
}

/// A non-zero `status` together with an `errors` member.
fn error_status(body: &Value) -> Option<Result<Extracted, UpstreamError>> {
    let status = body.get("status")?;
    let failed = match status {
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Bool(b) => *b,
        _ => false,
    };
    let errors = body.get("errors").filter(|e| !e.is_null())?;
    if !failed {
        return None;
    }

    let message = match errors {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Some(Err(UpstreamError::Api { message }))
}

/// First top-level array whose first element looks like a product.
fn product_like_array(body: &Value) -> Option<Result<Extracted, UpstreamError>> {
    body.as_object()?
        .values()
        .filter_map(Value::as_array)
        .find(|arr| {
            arr.first()
                .and_then(Value::as_object)
                .is_some_and(|first| {
                    PRODUCT_MARKER_KEYS
                        .iter()
                        .any(|k| first.get(*k).is_some_and(is_truthy))
                })
        })
        .map(|arr| Ok(Extracted::Items(arr.clone())))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() > 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn top_level_keys(body: &Value) -> String {
    match body.as_object() {
        Some(map) if !map.is_empty() => map.keys().cloned().collect::<Vec<_>>().join(", "),
        Some(_) => "none".to_owned(),
        None => format!("not an object ({})", json_type(body)),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Reads a count that may arrive as a number or a numeric string.
#[must_use]
pub fn read_count(body: &Value, key: &str) -> Option<u64> {
    match body.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|n| *n > 0)
}
