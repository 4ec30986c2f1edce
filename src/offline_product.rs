//! Offline product record and its language-aware accessors.
//!
//! This module defines [`OfflineProduct`], the record a user builds up while
//! editing a product without connectivity. Besides its identity fields the
//! record holds a single opaque payload blob; typed accessors decode that
//! blob on demand and apply locale fallback to surface the fields the
//! application actually displays.

use serde::{Deserialize, Serialize};

use crate::api_fields;
use crate::product_details::{self, AttributeMap, DetailsError};

/// A product captured on-device before it reaches the remote catalog.
///
/// The record is a passive value object: it has no behavior beyond encoding
/// and decoding its own payload. Persistence is handled by
/// [`ProductStore`](crate::product_store::ProductStore), which keys records
/// by their unique barcode, and the upload flag is flipped by the
/// synchronization layer once the remote catalog has confirmed the data.
///
/// # Structure
///
/// - **id**: numeric identity, assigned by the store on first save
/// - **barcode**: unique real-world product key, set at creation
/// - **is_data_uploaded**: `false` until the record has been synchronized
/// - **product_details**: opaque encoded attribute blob, decoded on demand
///
/// # Examples
///
/// ```rust
/// use std::collections::HashMap;
/// use offline_product_core::offline_product::OfflineProduct;
///
/// let mut details = HashMap::new();
/// details.insert("lang".to_string(), "fr".to_string());
/// details.insert("product_name_fr".to_string(), "Pomme".to_string());
/// details.insert("product_name_en".to_string(), "Apple".to_string());
///
/// let product = OfflineProduct::with_details("3017620422003", &details);
/// assert_eq!(product.language().as_deref(), Some("fr"));
/// assert_eq!(product.name().as_deref(), Some("Pomme"));
/// assert!(!product.is_data_uploaded);
/// ```
///
/// # Serialization
///
/// The record derives [`Serialize`] and [`Deserialize`]; the store persists
/// it as JSON and the FFI layer ships the same JSON to the host
/// application. The payload blob stays opaque either way.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OfflineProduct {
    /// Numeric identity assigned by the store on first save.
    pub id: Option<i64>,

    /// Unique real-world product key. Set once at creation; nothing in the
    /// type prevents mutation, but the store treats it as the record key.
    pub barcode: String,

    /// `false` until the synchronization layer confirms the upload.
    pub is_data_uploaded: bool,

    /// Opaque encoded attribute blob. Use
    /// [`details_map`](Self::details_map) and
    /// [`set_details_map`](Self::set_details_map) instead of touching this
    /// directly.
    pub product_details: String,
}

/// Returns the first candidate that is neither absent nor empty.
///
/// This is the single fallback primitive behind every locale-aware
/// accessor: an empty string counts as missing.
pub fn first_not_empty<'a, I>(values: I) -> Option<&'a str>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    values.into_iter().flatten().find(|value| !value.is_empty())
}

/// Language used to resolve locale-qualified keys: the `lang` attribute
/// when present and non-empty, the default language otherwise.
fn effective_language(map: &AttributeMap) -> &str {
    first_not_empty([map.get(api_fields::LANG).map(String::as_str)])
        .unwrap_or(api_fields::DEFAULT_LANGUAGE)
}

impl OfflineProduct {
    /// Creates a record with an empty payload.
    pub fn new(barcode: impl Into<String>) -> Self {
        Self {
            id: None,
            barcode: barcode.into(),
            is_data_uploaded: false,
            product_details: product_details::encode(&AttributeMap::new()),
        }
    }

    /// Creates a record carrying the given attributes.
    pub fn with_details(barcode: impl Into<String>, details: &AttributeMap) -> Self {
        let mut product = Self::new(barcode);
        product.set_details_map(details);
        product
    }

    /// Decodes the current payload, degrading to an empty map on bad data.
    ///
    /// Every accessor below goes through this call, so readers pay one
    /// decode per accessor invocation. Payloads are small; no cache is kept.
    pub fn details_map(&self) -> AttributeMap {
        product_details::decode_or_empty(Some(&self.product_details))
    }

    /// Strict variant of [`details_map`](Self::details_map) for callers
    /// that need to distinguish a corrupt payload from an empty one.
    pub fn try_details_map(&self) -> Result<AttributeMap, DetailsError> {
        product_details::decode(&self.product_details)
    }

    /// Replaces the entire payload with the given attributes.
    ///
    /// Previous contents are discarded; there is no partial merge.
    pub fn set_details_map(&mut self, details: &AttributeMap) {
        self.product_details = product_details::encode(details);
    }

    /// Raw value of the `lang` attribute, if any.
    pub fn language(&self) -> Option<String> {
        self.details_map().get(api_fields::LANG).cloned()
    }

    /// Display name in the product's language, falling back to English.
    pub fn name(&self) -> Option<String> {
        let map = self.details_map();
        let language = effective_language(&map);
        first_not_empty([
            map.get(&api_fields::lc_product_name_key(language))
                .map(String::as_str),
            map.get(&api_fields::lc_product_name_key(api_fields::DEFAULT_LANGUAGE))
                .map(String::as_str),
        ])
        .map(str::to_string)
    }

    /// Ingredients text in the product's language, falling back to English.
    pub fn ingredients(&self) -> Option<String> {
        let map = self.details_map();
        let language = effective_language(&map);
        first_not_empty([
            map.get(&api_fields::lc_ingredients_key(language))
                .map(String::as_str),
            map.get(&api_fields::lc_ingredients_key(api_fields::DEFAULT_LANGUAGE))
                .map(String::as_str),
        ])
        .map(str::to_string)
    }

    /// File name of the front photo, if one was captured.
    pub fn image_front(&self) -> Option<String> {
        self.details_map().get(api_fields::IMAGE_FRONT).cloned()
    }

    /// File name of the ingredients photo, if one was captured.
    pub fn image_ingredients(&self) -> Option<String> {
        self.details_map().get(api_fields::IMAGE_INGREDIENTS).cloned()
    }

    /// File name of the nutrition facts photo, if one was captured.
    pub fn image_nutrition(&self) -> Option<String> {
        self.details_map().get(api_fields::IMAGE_NUTRITION).cloned()
    }

    /// Front photo as a `file://` reference for the file-access layer, or
    /// `None` when no front photo is set.
    pub fn image_front_local_url(&self) -> Option<String> {
        self.image_front()
            .filter(|image| !image.is_empty())
            .map(|image| format!("{}{image}", api_fields::LOCAL_FILE_SCHEME))
    }
}
