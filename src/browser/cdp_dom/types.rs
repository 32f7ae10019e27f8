use serde::{Deserialize, Serialize};

/// Computed style properties requested from `DOMSnapshot.captureSnapshot`.
/// Each layout node's `styles` entry lists string indices in this order.
pub const SNAPSHOT_STYLES: [&str; 3] = ["display", "visibility", "opacity"];

/// DOM node types as reported by CDP
pub mod node_type {
    pub const ELEMENT: i64 = 1;
    pub const TEXT: i64 = 3;
    pub const DOCUMENT: i64 = 9;
    pub const DOCUMENT_FRAGMENT: i64 = 11;
}

/// Raw CDP responses, kept as JSON so they can be stored and replayed
/// without a browser
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCdpTrees {
    /// `DOM.getDocument` root (full depth, shadow roots pierced)
    pub dom_root: serde_json::Value,
    /// `DOMSnapshot.captureSnapshot` result, when it could be taken
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
