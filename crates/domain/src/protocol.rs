//! Protocol activations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An activation record produced by the mobile panic-button pipeline.
///
/// Read-only from this API's perspective. Beyond the subject reference the
/// shape is owned by the producing pipeline, so extra fields (activation
/// metadata, AI transcript/audio references) pass through untyped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Protocol {
    pub usuario_id: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}
