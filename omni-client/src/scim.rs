//! SCIM 2.0 protocol envelopes (RFC 7644) used by the client.

use omni_core::{Attributes, PATCH_OP_SCHEMA, USER_ATTRIBUTE_SCHEMA};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Media type for SCIM requests and responses.
pub const SCIM_MEDIA_TYPE: &str = "application/scim+json";

/// Page size used when listing resources.
pub const PAGE_SIZE: usize = 100;

/// A page of a SCIM list query.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    /// Absent when the server does not report a total.
    #[serde(default)]
    pub total_results: Option<usize>,
    #[serde(default)]
    pub start_index: Option<usize>,
    #[serde(default)]
    pub items_per_page: Option<usize>,
    #[serde(rename = "Resources", default = "Vec::new")]
    pub resources: Vec<T>,
}

/// A SCIM PATCH request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchRequest {
    pub schemas: Vec<String>,
    #[serde(rename = "Operations")]
    pub operations: Vec<PatchOperation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchOperation {
    pub op: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub value: Value,
}

impl PatchRequest {
    /// Replace the whole custom-attribute extension with `attributes`.
    pub fn replace_attributes(attributes: &Attributes) -> Self {
        Self {
            schemas: vec![PATCH_OP_SCHEMA.to_string()],
            operations: vec![PatchOperation {
                op: "replace".to_string(),
                path: Some(USER_ATTRIBUTE_SCHEMA.to_string()),
                value: Value::Object(attributes.clone()),
            }],
        }
    }
}

/// `Users/{id}`-style resource path with `id` percent-encoded as one segment.
pub fn resource_path(collection: &str, id: &str) -> String {
    format!("{collection}/{}", urlencoding::encode(id))
}

/// Quote a value for use inside a SCIM filter expression.
pub fn filter_literal(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
