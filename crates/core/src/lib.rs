//! Core library for clipdex.
//!
//! The catalog builder turns speech-transcription documents stored in a
//! bucket into a catalog of summarized, tagged entries; the view engine
//! searches, filters and paginates that catalog and resolves playback links.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod format;
pub mod pipeline;
pub mod provider;
pub mod storage;
pub mod types;
pub mod view;

pub use cache::{Expiry, ReadThroughCache};
pub use catalog::{CatalogError, CatalogKey, CatalogSource, parse_catalog, serialize_catalog};
pub use config::{DEFAULT_BUCKET, DEFAULT_CATALOG_OBJECT, StoreConfig, StoreKind};
pub use enrich::{ChatCompletionsClient, EnrichError, Enricher, TextGenerator};
pub use error::{ClipdexError, Result};
pub use extract::{extract_transcript, media_uri};
pub use format::{
    format_build_summary, format_duration, format_outcome, format_page_readable, format_tags,
};
pub use pipeline::{
    BuildConfig, BuildProgress, BuildReport, CatalogBuilder, FailurePolicy, ItemOutcome,
    NoProgress, SkipStage,
};
pub use provider::{Provider, ProviderConfig, ProviderError};
pub use storage::{LocalStore, MemoryStore, ObjectStore, StorageError};
pub use types::{CatalogEntry, Enrichment, SourceDocument};
pub use view::{
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MediaLink, MediaResolver, PageView, ViewState, render_page,
};
