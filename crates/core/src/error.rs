use thiserror::Error;

use crate::{
    catalog::CatalogError, enrich::EnrichError, provider::ProviderError, storage::StorageError,
};

#[derive(Error, Debug)]
pub enum ClipdexError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Enrichment failed: {0}")]
    Enrichment(#[from] EnrichError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Catalog could not be loaded: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Processing of {object} aborted: {reason}")]
    ItemFailed { object: String, reason: String },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClipdexError>;
