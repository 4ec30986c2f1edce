//! Payload codec for product attribute maps.
//!
//! A product's attribute set is open-ended — new locale-qualified fields
//! appear over time — so attributes are not mapped to individual columns.
//! The whole map is carried instead as one opaque text blob: serde_json
//! bytes wrapped in standard padded base64, safe for a plain string column
//! and for text-oriented transport.
//!
//! The blob carries no version tag; consumers tolerate decode failure
//! rather than migrating formats.
//!
//! # Examples
//!
//! ```rust
//! use std::collections::HashMap;
//! use offline_product_core::product_details::{decode, encode};
//!
//! let mut details = HashMap::new();
//! details.insert("lang".to_string(), "en".to_string());
//! details.insert("product_name_en".to_string(), "Apple".to_string());
//!
//! let blob = encode(&details);
//! assert_eq!(decode(&blob).unwrap(), details);
//! ```

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::warn;

/// Flat attribute map holding every product field, including
/// locale-qualified variants such as `product_name_en`.
pub type AttributeMap = HashMap<String, String>;

/// Why a blob could not be decoded back into an [`AttributeMap`].
#[derive(Debug)]
pub enum DetailsError {
    /// The blob is not valid base64.
    Transport(String),
    /// The inner bytes are not a serialized string-to-string map.
    Malformed(String),
}

impl Display for DetailsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DetailsError::Transport(msg) => write!(f, "Invalid transport encoding: {}", msg),
            DetailsError::Malformed(msg) => write!(f, "Malformed details payload: {}", msg),
        }
    }
}

impl std::error::Error for DetailsError {}

/// Encodes an attribute map into its opaque blob form.
///
/// Serializing a string-to-string map cannot fail, so no error is surfaced;
/// the guard below keeps a serialization fault from ever reaching a caller
/// as a panic, degrading to an empty blob instead.
pub fn encode(details: &AttributeMap) -> String {
    let bytes = match serde_json::to_vec(details) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Could not serialize attribute map: {e}");
            Vec::new()
        }
    };
    BASE64.encode(bytes)
}

/// Decodes a blob back into an attribute map.
///
/// Transport corruption (bad base64) and a malformed inner payload are
/// reported as distinct [`DetailsError`] variants so callers can tell a
/// damaged column value from format drift.
pub fn decode(blob: &str) -> Result<AttributeMap, DetailsError> {
    let bytes = BASE64
        .decode(blob)
        .map_err(|e| DetailsError::Transport(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| DetailsError::Malformed(e.to_string()))
}

/// Lenient decode used by the record accessors.
///
/// An absent blob is the normal empty state, not an error. A corrupt blob
/// is logged and degraded to an empty map so readers never fail on bad
/// data.
pub fn decode_or_empty(blob: Option<&str>) -> AttributeMap {
    let Some(blob) = blob else {
        return AttributeMap::new();
    };
    match decode(blob) {
        Ok(details) => details,
        Err(e) => {
            warn!("Could not decode product details, returning empty map: {e}");
            AttributeMap::new()
        }
    }
}
