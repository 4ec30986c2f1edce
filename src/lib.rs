//! # Offline Product Core
//!
//! A local storage library for product records captured while a device is
//! offline, designed for FFI (Foreign Function Interface) integration with
//! mobile applications. Built on LMDB (Lightning Memory-Mapped Database)
//! and keyed by product barcode.
//!
//! ## Features
//!
//! - **LMDB-based storage**: battle-tested database engine, one environment
//!   per store, records keyed by unique barcode
//! - **Schema-less payloads**: the evolving attribute set (locale-qualified
//!   names, ingredients, image references) travels as one opaque encoded
//!   blob — no migration when new fields appear
//! - **Locale-aware accessors**: display name and ingredients resolve
//!   through a first-non-empty language fallback
//! - **FFI-optimized**: C-compatible surface with JSON envelopes for
//!   cross-language integration
//! - **Safe error handling**: faults come back as responses, never panics
//!
//! ## Quick Start
//!
//! ```no_run
//! use offline_product_core::{create_store, save_product, get_product};
//! use std::ffi::CString;
//!
//! // Create a store instance
//! let store_name = CString::new("my_products").unwrap();
//! let store = create_store(store_name.as_ptr());
//!
//! // Save a product edited offline
//! let json = CString::new(
//!     r#"{"barcode":"3017620422003","attributes":{"lang":"fr","product_name_fr":"Pomme"}}"#,
//! )
//! .unwrap();
//! let result = save_product(store, json.as_ptr());
//! ```
//!
//! ## FFI Functions
//!
//! This library exposes C-compatible functions for cross-language
//! integration:
//!
//! - [`create_store`] - Initialize a store instance
//! - [`save_product`] - Insert or replace a record (alias: `post_product`)
//! - [`get_product`] - Retrieve a record by barcode
//! - [`get_all_products`] - Retrieve all records
//! - [`get_pending_products`] - Retrieve records not yet uploaded
//! - [`update_product`] - Replace an existing record (alias: `put_product`)
//! - [`mark_product_uploaded`] - Flag a record as synchronized
//! - [`delete_product`] - Delete a record by barcode
//! - [`clear_all_products`] - Clear all store contents
//! - [`reset_store`] - Reset the store to a clean state
//! - [`close_store`] - Explicit environment cleanup

pub mod api_fields;
pub mod app_response;
pub mod offline_product;
pub mod product_details;
pub mod product_store;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use log::{info, warn};
use serde::Deserialize;

use crate::api_fields::is_barcode_valid;
use crate::app_response::AppResponse;
use crate::offline_product::OfflineProduct;
use crate::product_details::AttributeMap;
use crate::product_store::ProductStore;

/// JSON payload accepted by [`save_product`] and [`update_product`].
#[derive(Debug, Deserialize)]
struct ProductInput {
    barcode: String,
    #[serde(default)]
    attributes: AttributeMap,
}

/// Creates a new product store with the specified name.
///
/// This function initializes an LMDB environment for storing offline
/// product records. The store is created as a directory with an `.lmdb`
/// extension.
///
/// # Parameters
///
/// * `name` - A null-terminated C string containing the store name
///
/// # Returns
///
/// Returns a pointer to the [`ProductStore`] instance on success, or a null
/// pointer on failure. The caller is responsible for managing the returned
/// pointer's lifetime.
///
/// # Safety
///
/// This function is unsafe because it:
/// - Dereferences a raw pointer without validation
/// - Returns a raw pointer that must be properly managed
/// - Requires the input string to be valid UTF-8
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use offline_product_core::create_store;
///
/// let name = CString::new("offline_products").unwrap();
/// let store = create_store(name.as_ptr());
///
/// if !store.is_null() {
///     // Store created successfully
/// }
/// ```
///
/// # Errors
///
/// Returns null pointer if:
/// - Input name pointer is null
/// - Input string contains invalid UTF-8
/// - Store initialization fails
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_store(name: *const c_char) -> *mut ProductStore {
    if name.is_null() {
        warn!("Null name pointer passed to create_store");
        return std::ptr::null_mut();
    }

    let name_str = match unsafe { CStr::from_ptr(name).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in name parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    match ProductStore::init(name_str) {
        Ok(store) => {
            info!("✅ Product store initialized successfully");
            Box::into_raw(Box::new(store))
        }
        Err(e) => {
            warn!("❌ Failed to initialize product store: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Inserts or replaces a product record in the store.
///
/// This function deserializes the provided JSON into a barcode plus an
/// attribute map, encodes the attributes into the record's opaque payload,
/// and persists the record keyed by its barcode. An existing record with
/// the same barcode is replaced wholesale.
///
/// # Parameters
///
/// * `store` - Pointer to the store instance
/// * `json_ptr` - Null-terminated C string containing JSON data
///
/// # Returns
///
/// Returns a JSON-formatted C string containing the stored record (with
/// its assigned id) on success, or an error response. The returned string
/// must be freed by the caller.
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers.
/// Both parameters must be valid pointers to their respective types.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use offline_product_core::{create_store, save_product};
///
/// let store_name = CString::new("products").unwrap();
/// let store = create_store(store_name.as_ptr());
///
/// let json = CString::new(
///     r#"{"barcode":"3017620422003","attributes":{"lang":"en","product_name_en":"Apple"}}"#,
/// )
/// .unwrap();
/// let result = save_product(store, json.as_ptr());
/// ```
///
/// # JSON Format
///
/// Expected JSON structure:
///
/// ```json
/// {
///   "barcode": "3017620422003",
///   "attributes": { "lang": "en", "product_name_en": "Apple" }
/// }
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn save_product(store: *mut ProductStore, json_ptr: *const c_char) -> *const c_char {
    let store = match unsafe { store.as_ref() } {
        Some(s) => s,
        None => {
            let error = AppResponse::BadRequest("Null store pointer".to_string());
            return response_to_c_string(&error);
        }
    };

    let json_str = match c_ptr_to_string(json_ptr, "JSON") {
        Ok(json) => json,
        Err(error_ptr) => return error_ptr,
    };

    let input: ProductInput = match serde_json::from_str(&json_str) {
        Ok(input) => input,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid JSON: {e}"));
            return response_to_c_string(&error);
        }
    };

    if !is_barcode_valid(&input.barcode) {
        let error = AppResponse::ValidationError(format!("Invalid barcode: {}", input.barcode));
        return response_to_c_string(&error);
    }

    let product = OfflineProduct::with_details(input.barcode, &input.attributes);

    match store.save(product) {
        Ok(stored) => product_to_response(&stored),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Inserts or replaces a product record (HTTP-style naming).
///
/// Alias for [`save_product`]. Provided to align with endpoint semantics.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn post_product(store: *mut ProductStore, json_ptr: *const c_char) -> *const c_char {
    save_product(store, json_ptr)
}

/// Retrieves a product record by its barcode.
///
/// # Parameters
///
/// * `store` - Pointer to the store instance
/// * `barcode` - Null-terminated C string containing the barcode
///
/// # Returns
///
/// Returns a JSON-formatted C string containing the record if found, or an
/// error response if not found or on failure.
///
/// # Safety
///
/// Both parameters must be valid pointers. The barcode string must be
/// valid UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_product(store: *mut ProductStore, barcode: *const c_char) -> *const c_char {
    let store = match unsafe { store.as_ref() } {
        Some(s) => s,
        None => {
            let error = AppResponse::BadRequest("Null store pointer passed to get_product".to_string());
            return response_to_c_string(&error);
        }
    };

    let barcode_str = match c_ptr_to_string(barcode, "barcode") {
        Ok(barcode) => barcode,
        Err(error_ptr) => return error_ptr,
    };

    match store.get_by_barcode(&barcode_str) {
        Ok(Some(product)) => product_to_response(&product),
        Ok(None) => {
            let error = AppResponse::NotFound(format!("No product found with barcode: {barcode_str}"));
            response_to_c_string(&error)
        }
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Retrieves all product records from the store.
///
/// # Parameters
///
/// * `store` - Pointer to the store instance
///
/// # Returns
///
/// Returns a JSON-formatted C string containing an array of all records,
/// or an error response on failure.
///
/// # Safety
///
/// The store parameter must be a valid pointer to a [`ProductStore`]
/// instance.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_all_products(store: *mut ProductStore) -> *const c_char {
    let store = match unsafe { store.as_ref() } {
        Some(s) => s,
        None => {
            let error = AppResponse::BadRequest("Null store pointer passed to get_all_products".to_string());
            return response_to_c_string(&error);
        }
    };

    match store.get_all() {
        Ok(products) => products_to_response(&products),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Retrieves the records that have not yet been uploaded to the remote
/// catalog.
///
/// This is the queue the synchronization layer drains: every record whose
/// upload flag is still `false`.
///
/// # Safety
///
/// The store parameter must be a valid pointer to a [`ProductStore`]
/// instance.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_pending_products(store: *mut ProductStore) -> *const c_char {
    let store = match unsafe { store.as_ref() } {
        Some(s) => s,
        None => {
            let error =
                AppResponse::BadRequest("Null store pointer passed to get_pending_products".to_string());
            return response_to_c_string(&error);
        }
    };

    match store.pending_uploads() {
        Ok(products) => products_to_response(&products),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Replaces an existing product record.
///
/// The record is identified by the barcode in the provided JSON. If no
/// record with that barcode exists, the operation returns an error. The
/// previous payload is discarded entirely; there is no partial merge.
///
/// # Parameters
///
/// * `store` - Pointer to the store instance
/// * `json_ptr` - Null-terminated C string, same JSON shape as
///   [`save_product`]
///
/// # Returns
///
/// Returns a JSON-formatted C string containing the updated record on
/// success, or an error response if the record doesn't exist or on failure.
///
/// # Safety
///
/// Both parameters must be valid pointers.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn update_product(store: *mut ProductStore, json_ptr: *const c_char) -> *const c_char {
    let store = match unsafe { store.as_ref() } {
        Some(s) => s,
        None => {
            let error = AppResponse::BadRequest("Null store pointer passed to update_product".to_string());
            return response_to_c_string(&error);
        }
    };

    let json_str = match c_ptr_to_string(json_ptr, "JSON") {
        Ok(json) => json,
        Err(error_ptr) => return error_ptr,
    };

    let input: ProductInput = match serde_json::from_str(&json_str) {
        Ok(input) => input,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid JSON: {e}"));
            return response_to_c_string(&error);
        }
    };

    let product = OfflineProduct::with_details(input.barcode, &input.attributes);

    match store.update(product) {
        Ok(Some(updated)) => product_to_response(&updated),
        Ok(None) => {
            let error = AppResponse::NotFound("Product not found for update".to_string());
            response_to_c_string(&error)
        }
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Replaces an existing product record (HTTP-style naming).
///
/// Alias for [`update_product`]. Provided to align with endpoint semantics.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn put_product(store: *mut ProductStore, json_ptr: *const c_char) -> *const c_char {
    update_product(store, json_ptr)
}

/// Flags a record as uploaded to the remote catalog.
///
/// Called by the synchronization layer once the upload has been confirmed.
/// Returns the updated record, or a not-found response for an unknown
/// barcode.
///
/// # Safety
///
/// Both parameters must be valid pointers.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn mark_product_uploaded(
    store: *mut ProductStore,
    barcode: *const c_char,
) -> *const c_char {
    let store = match unsafe { store.as_ref() } {
        Some(s) => s,
        None => {
            let error =
                AppResponse::BadRequest("Null store pointer passed to mark_product_uploaded".to_string());
            return response_to_c_string(&error);
        }
    };

    let barcode_str = match c_ptr_to_string(barcode, "barcode") {
        Ok(barcode) => barcode,
        Err(error_ptr) => return error_ptr,
    };

    match store.mark_uploaded(&barcode_str) {
        Ok(Some(product)) => product_to_response(&product),
        Ok(None) => {
            let error = AppResponse::NotFound(format!("No product found with barcode: {barcode_str}"));
            response_to_c_string(&error)
        }
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Deletes a product record by its barcode.
///
/// Deleting after a confirmed upload is the responsibility of the caller;
/// this function only removes the record.
///
/// # Parameters
///
/// * `store` - Pointer to the store instance
/// * `barcode` - Null-terminated C string containing the barcode to delete
///
/// # Returns
///
/// Returns a JSON-formatted C string indicating success, or a not-found
/// response when no record matches.
///
/// # Safety
///
/// Both parameters must be valid pointers.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_product(store: *mut ProductStore, barcode: *const c_char) -> *const c_char {
    if store.is_null() {
        let error = AppResponse::BadRequest("Null store pointer passed to delete_product".to_string());
        return response_to_c_string(&error);
    }

    let barcode_str = match c_ptr_to_string(barcode, "barcode") {
        Ok(barcode) => barcode,
        Err(error_ptr) => return error_ptr,
    };

    let store = unsafe { &*store };

    match store.delete_by_barcode(&barcode_str) {
        Ok(true) => {
            let success = AppResponse::success("Product deleted successfully");
            response_to_c_string(&success)
        }
        Ok(false) => {
            let not_found = AppResponse::NotFound(format!("No product found with barcode: {barcode_str}"));
            response_to_c_string(&not_found)
        }
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Clears all product records from the store.
///
/// This operation removes all records while keeping the store operational.
///
/// # Safety
///
/// The store parameter must be a valid pointer.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn clear_all_products(store: *mut ProductStore) -> *const c_char {
    if store.is_null() {
        let error = AppResponse::BadRequest("Null store pointer passed to clear_all_products".to_string());
        return response_to_c_string(&error);
    }

    let store = unsafe { &*store };

    match store.clear_all() {
        Ok(count) => {
            let success = AppResponse::success(format!("{count} product records cleared"));
            response_to_c_string(&success)
        }
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Resets the store to a clean state with a new name.
///
/// This operation:
/// 1. Closes the current environment
/// 2. Removes the existing store directory
/// 3. Creates a new store with the specified name
///
/// # Safety
///
/// Both parameters must be valid pointers.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn reset_store(store: *mut ProductStore, name_ptr: *const c_char) -> *const c_char {
    if store.is_null() {
        let error = AppResponse::BadRequest("Null store pointer passed to reset_store".to_string());
        return response_to_c_string(&error);
    }

    let name = match c_ptr_to_string(name_ptr, "name") {
        Ok(name) => name,
        Err(error_ptr) => return error_ptr,
    };

    let store = unsafe { &mut *store };

    match store.reset(&name) {
        Ok(()) => {
            let success = AppResponse::success(format!("Store '{name}' was reset successfully"));
            response_to_c_string(&success)
        }
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Explicitly closes the store's environment.
///
/// This provides explicit connection management for host runtimes that
/// need resources released before a restart. After closing, further
/// operations on this store fail with a bad-request response.
///
/// # Safety
///
/// The store parameter must be a valid pointer.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_store(store: *mut ProductStore) -> *const c_char {
    if store.is_null() {
        let error = AppResponse::BadRequest("Null store pointer passed to close_store".to_string());
        return response_to_c_string(&error);
    }

    let store = unsafe { &mut *store };

    match store.close() {
        Ok(()) => {
            let success = AppResponse::success("Store closed successfully");
            response_to_c_string(&success)
        }
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Serializes a stored record into an Ok response.
fn product_to_response(product: &OfflineProduct) -> *const c_char {
    match serde_json::to_string(product) {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Failed to serialize product: {e}"));
            response_to_c_string(&error)
        }
    }
}

/// Serializes a record list into an Ok response.
fn products_to_response(products: &[OfflineProduct]) -> *const c_char {
    match serde_json::to_string(products) {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Failed to serialize products: {e}"));
            response_to_c_string(&error)
        }
    }
}

/// Converts an [`AppResponse`] to a C-compatible string.
///
/// Serializes the response to JSON and hands ownership of the resulting
/// null-terminated string to the FFI caller.
///
/// # Safety
///
/// Returns a null pointer if serialization or C string creation fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer to a Rust String.
///
/// Handles null pointers and invalid UTF-8, returning a ready-to-return
/// error response pointer on failure.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}
