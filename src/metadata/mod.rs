//! Module metadata: the JSON document carried in a container's first block.
//!
//! Only `module.name` and `module.assets` are interpreted; the rest of the
//! document is kept verbatim for structure export.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Metadata is not valid JSON: {0}")]
    Syntax(serde_json::Error),
    #[error("Metadata has an unexpected shape: {0}")]
    Shape(serde_json::Error),
}

/// One entry of `module.assets`.
///
/// On disk this is a positional array `[id, <unused>, type]`; the second
/// element is kept untouched in `reserved`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetDescriptor {
    pub id:            String,
    pub reserved:      Value,
    /// MIME-like hint such as `"image/png"`.  Non-string values are dropped.
    pub declared_type: Option<String>,
}

impl<'de> Deserialize<'de> for AssetDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Vec::<Value>::deserialize(deserializer)?.into_iter();

        let id = match fields.next() {
            Some(Value::String(id)) => id,
            Some(other) => {
                return Err(serde::de::Error::custom(format!(
                    "asset id must be a string, found {other}"
                )))
            }
            None => return Err(serde::de::Error::custom("asset descriptor is empty")),
        };
        let reserved = fields.next().unwrap_or(Value::Null);
        let declared_type = match fields.next() {
            Some(Value::String(t)) => Some(t),
            _ => None,
        };

        Ok(AssetDescriptor { id, reserved, declared_type })
    }
}

#[derive(Deserialize)]
struct DocumentRaw {
    module: ModuleRaw,
}

#[derive(Deserialize)]
struct ModuleRaw {
    name: String,
    // `null` and a missing key both mean "no assets".
    #[serde(default)]
    assets: Option<Vec<AssetDescriptor>>,
}

/// The decompressed metadata block of a module container.
#[derive(Debug, Clone)]
pub struct ModuleMetadata {
    pub name:     String,
    /// Order pairs positionally with the container's asset frames.
    pub assets:   Vec<AssetDescriptor>,
    /// The whole parsed document, including fields this crate does not model.
    pub document: Value,
}

impl ModuleMetadata {
    /// Parse decompressed metadata bytes.
    ///
    /// Invalid UTF-8 sequences are replaced with U+FFFD and a leading BOM is
    /// ignored before the text is handed to the JSON parser.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MetadataError> {
        let text = String::from_utf8_lossy(bytes);
        let text = text.strip_prefix('\u{FEFF}').unwrap_or(&text);

        let document: Value = serde_json::from_str(text).map_err(MetadataError::Syntax)?;
        let raw = DocumentRaw::deserialize(&document).map_err(MetadataError::Shape)?;

        Ok(ModuleMetadata {
            name:   raw.module.name,
            assets: raw.module.assets.unwrap_or_default(),
            document,
        })
    }

    /// The full document, pretty-printed with two-space indentation.  Object
    /// keys keep their source order.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.document)
    }
}
