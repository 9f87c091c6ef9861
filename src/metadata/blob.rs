use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of the packed metadata blob.
///
/// Entries are not individually addressable inside the PNG: the whole list is
/// serialized as a single JSON array and stored in one text chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetadataKeyValue {
    pub key: String,
    pub value: Value,
}

impl MetadataKeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Serialize entries as `[{"Key": .., "Value": ..}, ..]`.
pub fn encode(pairs: &[MetadataKeyValue]) -> serde_json::Result<String> {
    serde_json::to_string(pairs)
}

pub fn decode(blob: &str) -> serde_json::Result<Vec<MetadataKeyValue>> {
    serde_json::from_str(blob)
}
