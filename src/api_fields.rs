//! Attribute key registry for product payloads.
//!
//! Product attributes travel as a flat string-to-string map whose keys
//! follow the remote catalog's naming convention: fixed keys for control
//! fields and images, locale-qualified keys (`product_name_fr`,
//! `ingredients_text_en`) for translated text. This module is the single
//! place those names are defined and derived.

use std::fmt::{Display, Formatter};

/// Key holding the product's primary language code.
pub const LANG: &str = "lang";

/// Language used when a product does not declare one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Key holding the front photo file name.
pub const IMAGE_FRONT: &str = "image_front";

/// Key holding the ingredients photo file name.
pub const IMAGE_INGREDIENTS: &str = "image_ingredients";

/// Key holding the nutrition facts photo file name.
pub const IMAGE_NUTRITION: &str = "image_nutrition";

/// Scheme prefix that lets file-access collaborators resolve an image
/// reference as a local path.
pub const LOCAL_FILE_SCHEME: &str = "file://";

/// Locale-qualified key for the product display name.
///
/// ```rust
/// use offline_product_core::api_fields::lc_product_name_key;
///
/// assert_eq!(lc_product_name_key("fr"), "product_name_fr");
/// ```
pub fn lc_product_name_key(language: &str) -> String {
    format!("product_name_{language}")
}

/// Locale-qualified key for the ingredients text.
pub fn lc_ingredients_key(language: &str) -> String {
    format!("ingredients_text_{language}")
}

/// Kind of product image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductImageField {
    Front,
    Ingredients,
    Nutrition,
    Packaging,
    Other,
}

impl Display for ProductImageField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProductImageField::Front => "front",
            ProductImageField::Ingredients => "ingredients",
            ProductImageField::Nutrition => "nutrition",
            ProductImageField::Packaging => "packaging",
            ProductImageField::Other => "other",
        };
        f.write_str(name)
    }
}

/// Image key as the remote catalog names uploaded images: `{field}_{language}`.
pub fn image_string_key(field: ProductImageField, language: &str) -> String {
    format!("{field}_{language}")
}

/// Plausibility check applied to barcodes before they become store keys.
///
/// Accepts digit-only codes of UPC-E, EAN-8, UPC-A or EAN-13 length.
pub fn is_barcode_valid(barcode: &str) -> bool {
    matches!(barcode.len(), 7 | 8 | 12 | 13) && barcode.bytes().all(|b| b.is_ascii_digit())
}
