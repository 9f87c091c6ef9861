//! PNG metadata persistence.
//!
//! - [`MetadataReader`] — extract the stored pairs from a file (sync or async)
//! - [`MetadataWriter`] — embed pairs into a new file, or atomically update an existing one
//!
//! All pairs of a file are packed into one JSON blob stored in a single `iTXt`
//! chunk placed right after `IHDR`.

mod blob;
mod chunk;
mod reader;
mod writer;

use serde_json::Value;

pub use blob::MetadataKeyValue;
pub(crate) use chunk::is_valid_keyword;
pub use reader::MetadataReader;
pub use writer::MetadataWriter;

/// A stored pair before it is mapped onto a typed key.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMetadata {
    pub key: String,
    pub value: Value,
}

impl RawMetadata {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The value as text: strings verbatim, anything else as compact JSON.
    pub fn write_value(&self) -> String {
        render(&self.value)
    }
}

impl From<MetadataKeyValue> for RawMetadata {
    fn from(kv: MetadataKeyValue) -> Self {
        Self {
            key: kv.key,
            value: kv.value,
        }
    }
}

impl From<RawMetadata> for MetadataKeyValue {
    fn from(raw: RawMetadata) -> Self {
        Self {
            key: raw.key,
            value: raw.value,
        }
    }
}

pub(crate) fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
