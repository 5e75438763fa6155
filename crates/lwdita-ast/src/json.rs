//! Plain nested projection of a tree.

use crate::attributes::Props;
use serde::{Deserialize, Serialize};

/// `{ nodeName, attributes?, children? }`
///
/// Text nodes project as `nodeName: "text"` with the literal content under
/// `attributes.content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonNode {
    pub node_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Props>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<JsonNode>>,
}

impl JsonNode {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            attributes: None,
            children: None,
        }
    }

    pub fn children(&self) -> &[JsonNode] {
        self.children.as_deref().unwrap_or_default()
    }

    pub fn to_value(&self) -> serde_json::Value {
        // Props and strings always serialize.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
