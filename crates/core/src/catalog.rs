//! Reading and writing the persisted catalog document.

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

use crate::{
    cache::{Expiry, ReadThroughCache},
    storage::{ObjectStore, StorageError},
    types::CatalogEntry,
};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Could not fetch {object}: {source}")]
    Storage {
        object: String,
        #[source]
        source: StorageError,
    },

    #[error("Catalog is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Catalog must be a JSON array of objects")]
    NotAnArray,

    #[error("Catalog row {index} is not a JSON object")]
    RowNotObject { index: usize },
}

/// Serialize entries the way the builder persists them: an indented JSON array.
pub fn serialize_catalog(entries: &[CatalogEntry]) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec_pretty(entries)
}

/// Parse a persisted catalog.
///
/// The document must be an array of objects. Inside a row every field is
/// optional: text fields default to `""`, `tags` that is not a list becomes
/// `[]`, and `char_count` that is not a non-negative integer becomes `0`.
pub fn parse_catalog(bytes: &[u8]) -> Result<Vec<CatalogEntry>, CatalogError> {
    let Value::Array(rows) = serde_json::from_slice::<Value>(bytes)? else {
        return Err(CatalogError::NotAnArray);
    };

    rows.iter()
        .enumerate()
        .map(|(index, row)| match row {
            Value::Object(fields) => Ok(entry_from_fields(fields)),
            _ => Err(CatalogError::RowNotObject { index }),
        })
        .collect()
}

fn entry_from_fields(fields: &Map<String, Value>) -> CatalogEntry {
    CatalogEntry {
        source_json_path: text_field(fields, "source_json_path"),
        video_uri: text_field(fields, "video_uri"),
        summary: text_field(fields, "summary"),
        tags: match fields.get("tags") {
            Some(Value::Array(items)) => items.iter().map(text_value).collect(),
            _ => Vec::new(),
        },
        char_count: fields
            .get("char_count")
            .and_then(Value::as_u64)
            .unwrap_or(0),
    }
}

fn text_field(fields: &Map<String, Value>, name: &str) -> String {
    fields.get(name).map(text_value).unwrap_or_default()
}

fn text_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Identifies one persisted catalog: a container plus an object name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogKey {
    pub container: String,
    pub object: String,
}

/// Loads a catalog through a process-lifetime cache.
///
/// The catalog is fetched on first use and then served from memory until the
/// process exits ([`Expiry::Never`]); a rerun of the builder is only picked up
/// after a restart or an explicit [`CatalogSource::reload`].
pub struct CatalogSource {
    store: Arc<dyn ObjectStore>,
    key: CatalogKey,
    cache: ReadThroughCache<CatalogKey, Arc<Vec<CatalogEntry>>>,
}

impl CatalogSource {
    pub fn new(store: Arc<dyn ObjectStore>, object: impl Into<String>) -> Self {
        let key = CatalogKey {
            container: store.container().to_string(),
            object: object.into(),
        };
        Self {
            store,
            key,
            cache: ReadThroughCache::new(Expiry::Never),
        }
    }

    pub fn key(&self) -> &CatalogKey {
        &self.key
    }

    pub async fn load(&self) -> Result<Arc<Vec<CatalogEntry>>, CatalogError> {
        self.cache
            .get_or_try_load(&self.key, || async {
                let bytes = self
                    .store
                    .download(&self.key.object)
                    .await
                    .map_err(|source| CatalogError::Storage {
                        object: self.key.object.clone(),
                        source,
                    })?;
                let entries = parse_catalog(&bytes)?;
                info!(
                    "Loaded {} catalog entries from {}/{}",
                    entries.len(),
                    self.key.container,
                    self.key.object
                );
                Ok(Arc::new(entries))
            })
            .await
    }

    /// Drop the cached copy so the next [`CatalogSource::load`] refetches it.
    pub async fn reload(&self) -> Result<Arc<Vec<CatalogEntry>>, CatalogError> {
        self.cache.invalidate(&self.key).await;
        self.load().await
    }
}
