use serde::{Deserialize, Serialize};

use crate::error::UserError;

/// Store identity reported by the connection test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopMetadata {
    pub name: String,
    /// The `*.myshopify.com` domain.
    pub domain: String,
    /// Plan display name, e.g. `"Basic"` or `"Shopify Plus"`.
    pub plan: String,
}

// ---------------------------------------------------------------------------
// GraphQL wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlErrorEntry {
    pub message: String,
    #[serde(default)]
    pub extensions: Option<GraphQlErrorExtensions>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlErrorExtensions {
    pub code: Option<String>,
}

impl GraphQlErrorEntry {
    pub fn is_throttled(&self) -> bool {
        self.extensions
            .as_ref()
            .and_then(|e| e.code.as_deref())
            .is_some_and(|code| code == "THROTTLED")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProductCreateData {
    pub product_create: Option<ProductCreatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProductCreatePayload {
    pub product: Option<ProductNode>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductNode {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ShopData {
    pub shop: ShopNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ShopNode {
    pub name: String,
    pub myshopify_domain: String,
    pub plan: ShopPlanNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ShopPlanNode {
    pub display_name: String,
}

impl From<ShopNode> for ShopMetadata {
    fn from(node: ShopNode) -> Self {
        Self {
            name: node.name,
            domain: node.myshopify_domain,
            plan: node.plan.display_name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LocationsData {
    pub locations: LocationConnection,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LocationConnection {
    #[serde(default)]
    pub nodes: Vec<LocationNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LocationNode {
    pub id: String,
}

// ---------------------------------------------------------------------------
// REST wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct RestProductEnvelope {
    pub product: RestProduct,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RestProduct {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub admin_graphql_api_id: Option<String>,
}

impl RestProduct {
    /// Global id when the store reports one, so both modes yield the same
    /// identifier shape.
    pub fn destination_id(&self) -> String {
        self.admin_graphql_api_id
            .clone()
            .unwrap_or_else(|| format!("gid://shopify/Product/{}", self.id))
    }
}

/// Flattens a REST `errors` value into field-level errors.
///
/// Shopify returns either `{"errors": {"title": ["can't be blank"]}}` or a
/// bare `{"errors": "message"}`.
pub(crate) fn rest_user_errors(body: &serde_json::Value) -> Vec<UserError> {
    use serde_json::Value;

    match body.get("errors") {
        Some(Value::Object(map)) => map
            .iter()
            .flat_map(|(field, messages)| {
                let messages: Vec<String> = match messages {
                    Value::Array(items) => items
                        .iter()
                        .map(|m| m.as_str().map_or_else(|| m.to_string(), str::to_owned))
                        .collect(),
                    Value::String(s) => vec![s.clone()],
                    other => vec![other.to_string()],
                };
                messages.into_iter().map(move |message| UserError {
                    field: vec![field.clone()],
                    message,
                })
            })
            .collect(),
        Some(Value::String(message)) => vec![UserError {
            field: Vec::new(),
            message: message.clone(),
        }],
        Some(Value::Array(items)) => items
            .iter()
            .map(|m| UserError {
                field: Vec::new(),
                message: m.as_str().map_or_else(|| m.to_string(), str::to_owned),
            })
            .collect(),
        _ => Vec::new(),
    }
}
