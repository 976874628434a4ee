//! Store selection shared by the builder and the viewers.

use std::{path::PathBuf, str::FromStr, sync::Arc};

use tracing::info;

use crate::{
    error::{ClipdexError, Result},
    storage::{GcsConfig, GcsStore, LocalStore, ObjectStore, get_default_local_root},
};

pub const DEFAULT_BUCKET: &str = "toktiks";
pub const DEFAULT_CATALOG_OBJECT: &str = "categorized_videos.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreKind {
    #[default]
    Gcs,
    Local,
}

impl FromStr for StoreKind {
    type Err = ClipdexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gcs" => Ok(StoreKind::Gcs),
            "local" => Ok(StoreKind::Local),
            other => Err(ClipdexError::Config {
                reason: format!("unknown store {other:?} (expected gcs or local)"),
            }),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    /// Bucket name for GCS. Ignored by the local store, whose container is
    /// the last component of its root.
    pub bucket: String,
    pub project_id: Option<String>,
    pub signer_email: Option<String>,
    /// Root directory of the local store, `<data dir>/clipdex` when unset.
    pub local_root: Option<PathBuf>,
    pub public_base_url: Option<String>,
}

impl StoreConfig {
    pub async fn open(&self) -> Result<Arc<dyn ObjectStore>> {
        match self.kind {
            StoreKind::Gcs => {
                if self.bucket.trim().is_empty() {
                    return Err(ClipdexError::Config {
                        reason: "bucket name must not be empty".to_string(),
                    });
                }
                let config = GcsConfig {
                    bucket: self.bucket.clone(),
                    project_id: non_empty(&self.project_id),
                    signer_email: non_empty(&self.signer_email),
                };
                Ok(Arc::new(GcsStore::connect(config).await?))
            }
            StoreKind::Local => {
                let root = self
                    .local_root
                    .clone()
                    .unwrap_or_else(get_default_local_root);
                info!("Using local store at {}", root.display());
                let mut store = LocalStore::new(root);
                if let Some(base) = non_empty(&self.public_base_url) {
                    store = store.with_public_base_url(base);
                }
                Ok(Arc::new(store))
            }
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_kind_parses_case_insensitively() {
        assert_eq!("GCS".parse::<StoreKind>().unwrap(), StoreKind::Gcs);
        assert_eq!("local".parse::<StoreKind>().unwrap(), StoreKind::Local);
        assert!(matches!("s3".parse::<StoreKind>(), Err(ClipdexError::Config { .. })));
    }

    #[tokio::test]
    async fn local_store_container_is_root_name() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("toktiks");
        let config = StoreConfig {
            kind: StoreKind::Local,
            local_root: Some(root),
            ..Default::default()
        };
        assert_eq!(config.open().await.unwrap().container(), "toktiks");
    }

    #[tokio::test]
    async fn gcs_store_requires_a_bucket() {
        let config = StoreConfig {
            kind: StoreKind::Gcs,
            bucket: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.open().await, Err(ClipdexError::Config { .. })));
    }
}
