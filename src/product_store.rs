//! LMDB-backed store for offline product records.
//!
//! One store is one LMDB environment living in a `<name>.lmdb` directory,
//! with two named databases: `products`, keyed by barcode, and `meta`,
//! holding the id counter. Records are stored as the JSON form of
//! [`OfflineProduct`]; the payload blob inside stays opaque to this layer.

use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

use lmdb::{Cursor, Database, DatabaseFlags, Environment, Transaction, WriteFlags};
use log::{info, warn};

use crate::offline_product::OfflineProduct;

const PRODUCTS_DB: &str = "products";
const META_DB: &str = "meta";
const NEXT_ID_KEY: &str = "next_product_id";

/// 50 MiB map size; offline records are small and the environment grows
/// the file lazily.
const MAP_SIZE: usize = 50 * 1024 * 1024;

/// Errors surfaced by [`ProductStore`] operations.
#[derive(Debug)]
pub enum StoreError {
    Database(String),
    Serialization(String),
    Io(String),
    Closed,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(msg) => write!(f, "Database error: {}", msg),
            StoreError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            StoreError::Io(msg) => write!(f, "IO error: {}", msg),
            StoreError::Closed => write!(f, "Store is closed"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<lmdb::Error> for StoreError {
    fn from(err: lmdb::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

struct StoreInner {
    env: Environment,
    products: Database,
    meta: Database,
}

fn store_dir(name: &str) -> String {
    format!("{name}.lmdb")
}

fn open_inner(name: &str) -> Result<StoreInner, StoreError> {
    let dir = store_dir(name);
    fs::create_dir_all(&dir)?;
    let env = Environment::new()
        .set_max_dbs(2)
        .set_map_size(MAP_SIZE)
        .open(Path::new(&dir))?;
    let products = env.create_db(Some(PRODUCTS_DB), DatabaseFlags::empty())?;
    let meta = env.create_db(Some(META_DB), DatabaseFlags::empty())?;
    Ok(StoreInner {
        env,
        products,
        meta,
    })
}

/// Barcode-keyed store for [`OfflineProduct`] records.
///
/// Reads run in LMDB read transactions and are safe from multiple threads;
/// writes go through LMDB's single-writer transaction, which serializes
/// concurrent mutators. After [`close`](Self::close) every operation fails
/// with [`StoreError::Closed`] instead of touching a dead environment.
pub struct ProductStore {
    inner: Option<StoreInner>,
    name: String,
}

impl ProductStore {
    /// Creates or opens the store named `name` (directory `<name>.lmdb`).
    pub fn init(name: impl Into<String>) -> Result<Self, StoreError> {
        let name = name.into();
        let inner = open_inner(&name)?;
        info!("Product store opened at {}", store_dir(&name));
        Ok(Self {
            inner: Some(inner),
            name,
        })
    }

    fn inner(&self) -> Result<&StoreInner, StoreError> {
        self.inner.as_ref().ok_or(StoreError::Closed)
    }

    /// Saves a record, inserting or replacing by barcode.
    ///
    /// A record without an id receives the next counter value on first
    /// save; re-saving an existing barcode keeps the id already on disk.
    pub fn save(&self, mut product: OfflineProduct) -> Result<OfflineProduct, StoreError> {
        let inner = self.inner()?;
        let mut txn = inner.env.begin_rw_txn()?;
        if product.id.is_none() {
            product.id = match txn.get(inner.products, &product.barcode) {
                Ok(bytes) => serde_json::from_slice::<OfflineProduct>(bytes)?.id,
                Err(lmdb::Error::NotFound) => None,
                Err(e) => return Err(e.into()),
            };
        }
        if product.id.is_none() {
            let next = next_id(&txn, inner)?;
            product.id = Some(next);
            txn.put(
                inner.meta,
                &NEXT_ID_KEY,
                &(next + 1).to_string(),
                WriteFlags::empty(),
            )?;
        }
        let json = serde_json::to_vec(&product)?;
        txn.put(inner.products, &product.barcode, &json, WriteFlags::empty())?;
        txn.commit()?;
        Ok(product)
    }

    /// Looks up a record by its barcode.
    pub fn get_by_barcode(&self, barcode: &str) -> Result<Option<OfflineProduct>, StoreError> {
        let inner = self.inner()?;
        let txn = inner.env.begin_ro_txn()?;
        let product = match txn.get(inner.products, &barcode) {
            Ok(bytes) => Some(serde_json::from_slice(bytes)?),
            Err(lmdb::Error::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        Ok(product)
    }

    /// Returns every stored record.
    ///
    /// A record whose stored JSON no longer parses is logged and skipped;
    /// one damaged entry must not take the whole scan down with it.
    pub fn get_all(&self) -> Result<Vec<OfflineProduct>, StoreError> {
        let inner = self.inner()?;
        let txn = inner.env.begin_ro_txn()?;
        let mut cursor = txn.open_ro_cursor(inner.products)?;
        let mut products = Vec::new();
        for (key, value) in cursor.iter() {
            match serde_json::from_slice::<OfflineProduct>(value) {
                Ok(product) => products.push(product),
                Err(e) => warn!(
                    "Skipping corrupt record for barcode {}: {e}",
                    String::from_utf8_lossy(key)
                ),
            }
        }
        Ok(products)
    }

    /// Records that have not yet been uploaded to the remote catalog.
    ///
    /// This is the set the synchronization layer drains.
    pub fn pending_uploads(&self) -> Result<Vec<OfflineProduct>, StoreError> {
        let products = self.get_all()?;
        Ok(products
            .into_iter()
            .filter(|product| !product.is_data_uploaded)
            .collect())
    }

    /// Flags a record as uploaded. Returns the updated record, or `None`
    /// when the barcode is unknown.
    pub fn mark_uploaded(&self, barcode: &str) -> Result<Option<OfflineProduct>, StoreError> {
        let inner = self.inner()?;
        let mut txn = inner.env.begin_rw_txn()?;
        let mut product: OfflineProduct = match txn.get(inner.products, &barcode) {
            Ok(bytes) => serde_json::from_slice(bytes)?,
            Err(lmdb::Error::NotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        product.is_data_uploaded = true;
        let json = serde_json::to_vec(&product)?;
        txn.put(inner.products, &barcode, &json, WriteFlags::empty())?;
        txn.commit()?;
        Ok(Some(product))
    }

    /// Replaces an existing record. Returns `None` when no record with the
    /// given barcode exists.
    pub fn update(&self, mut product: OfflineProduct) -> Result<Option<OfflineProduct>, StoreError> {
        let inner = self.inner()?;
        let mut txn = inner.env.begin_rw_txn()?;
        let existing_id = match txn.get(inner.products, &product.barcode) {
            Ok(bytes) => serde_json::from_slice::<OfflineProduct>(bytes)?.id,
            Err(lmdb::Error::NotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if product.id.is_none() {
            product.id = existing_id;
        }
        let json = serde_json::to_vec(&product)?;
        txn.put(inner.products, &product.barcode, &json, WriteFlags::empty())?;
        txn.commit()?;
        Ok(Some(product))
    }

    /// Deletes a record by barcode. Returns whether a record was removed.
    pub fn delete_by_barcode(&self, barcode: &str) -> Result<bool, StoreError> {
        let inner = self.inner()?;
        let mut txn = inner.env.begin_rw_txn()?;
        match txn.del(inner.products, &barcode, None) {
            Ok(()) => {
                txn.commit()?;
                Ok(true)
            }
            Err(lmdb::Error::NotFound) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes every product record, returning how many were dropped.
    ///
    /// The id counter survives, so ids stay unique for the life of the
    /// store directory.
    pub fn clear_all(&self) -> Result<usize, StoreError> {
        let inner = self.inner()?;
        let mut txn = inner.env.begin_rw_txn()?;
        let count = txn.open_ro_cursor(inner.products)?.iter().count();
        txn.clear_db(inner.products)?;
        txn.commit()?;
        info!("Cleared {count} product records");
        Ok(count)
    }

    /// Closes the current store, wipes both the old and the target
    /// directory, and reopens fresh under `name`.
    pub fn reset(&mut self, name: impl Into<String>) -> Result<(), StoreError> {
        let name = name.into();
        // Release the environment before touching its files on disk.
        self.inner = None;
        let old_dir = store_dir(&self.name);
        if Path::new(&old_dir).exists() {
            fs::remove_dir_all(&old_dir)?;
        }
        let new_dir = store_dir(&name);
        if Path::new(&new_dir).exists() {
            fs::remove_dir_all(&new_dir)?;
        }
        self.inner = Some(open_inner(&name)?);
        self.name = name;
        info!("Product store reset to {new_dir}");
        Ok(())
    }

    /// Flushes and releases the environment.
    ///
    /// LMDB closes the environment when it is dropped; this makes the
    /// hand-off explicit so a host runtime can tear the store down before
    /// a restart. Later calls on this handle fail with
    /// [`StoreError::Closed`].
    pub fn close(&mut self) -> Result<(), StoreError> {
        if let Some(inner) = self.inner.take() {
            inner.env.sync(true)?;
            info!("Product store {} closed", self.name);
        }
        Ok(())
    }
}

fn next_id<T: Transaction>(txn: &T, inner: &StoreInner) -> Result<i64, StoreError> {
    match txn.get(inner.meta, &NEXT_ID_KEY) {
        Ok(bytes) => std::str::from_utf8(bytes)
            .ok()
            .and_then(|text| text.parse::<i64>().ok())
            .ok_or_else(|| StoreError::Database("Corrupt id counter".to_string())),
        Err(lmdb::Error::NotFound) => Ok(1),
        Err(e) => Err(e.into()),
    }
}
