//! Google Cloud Storage through the `google-cloud-storage` client.
//!
//! Credentials come from the usual application-default chain
//! (`GOOGLE_APPLICATION_CREDENTIALS`, then the metadata server). Playback URLs
//! are V4 signed URLs; without a private key the client signs through the IAM
//! Credentials `signBlob` API as the service account.

use std::time::Duration;

use async_trait::async_trait;
use google_cloud_storage::{
    client::{Client, ClientConfig},
    http::{
        self,
        objects::{
            download::Range,
            get::GetObjectRequest,
            list::ListObjectsRequest,
            upload::{Media, UploadObjectRequest, UploadType},
        },
    },
    sign::{SignedURLMethod, SignedURLOptions},
};
use tracing::{debug, info};

use crate::storage::{ObjectStore, StorageError};

/// Longest validity GCS accepts for a V4 signed URL.
pub const MAX_SIGNED_URL_VALIDITY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Clone, Default)]
pub struct GcsConfig {
    pub bucket: String,
    /// Project used by the client when the credentials do not name one.
    pub project_id: Option<String>,
    /// Service account that signs URLs; defaults to the credentials' account.
    pub signer_email: Option<String>,
}

pub struct GcsStore {
    client: Client,
    bucket: String,
    signer_email: Option<String>,
}

impl GcsStore {
    /// Connect with application-default credentials.
    pub async fn connect(config: GcsConfig) -> Result<Self, StorageError> {
        let mut client_config = ClientConfig::default()
            .with_auth()
            .await
            .map_err(|e| StorageError::Auth {
                reason: e.to_string(),
            })?;
        if client_config.project_id.is_none() {
            client_config.project_id = config.project_id.clone();
        }
        info!("Connected to GCS bucket {}", config.bucket);
        Ok(Self::with_client_config(config, client_config))
    }

    /// Use an explicit client configuration, e.g. a different endpoint.
    pub fn with_client_config(config: GcsConfig, client_config: ClientConfig) -> Self {
        Self {
            client: Client::new(client_config),
            bucket: config.bucket,
            signer_email: config.signer_email,
        }
    }
}

fn storage_error(object: &str, err: http::Error) -> StorageError {
    match err {
        http::Error::Response(response) if response.code == 404 => StorageError::NotFound {
            object: object.to_string(),
        },
        http::Error::Response(response) => StorageError::Http {
            object: object.to_string(),
            status: response.code,
            body: response.message,
        },
        other => StorageError::Backend {
            object: object.to_string(),
            reason: other.to_string(),
        },
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    fn container(&self) -> &str {
        &self.bucket
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let request = ListObjectsRequest {
                bucket: self.bucket.clone(),
                prefix: Some(prefix.to_string()),
                page_token: page_token.take(),
                ..Default::default()
            };
            let page = self
                .client
                .list_objects(&request)
                .await
                .map_err(|e| storage_error(prefix, e))?;
            names.extend(page.items.unwrap_or_default().into_iter().map(|o| o.name));

            match page.next_page_token {
                Some(token) if !token.is_empty() => {
                    debug!("Fetching next listing page for {}", prefix);
                    page_token = Some(token);
                }
                _ => break,
            }
        }

        Ok(names)
    }

    async fn download(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let request = GetObjectRequest {
            bucket: self.bucket.clone(),
            object: name.to_string(),
            ..Default::default()
        };
        self.client
            .download_object(&request, &Range::default())
            .await
            .map_err(|e| storage_error(name, e))
    }

    async fn upload(
        &self,
        name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let request = UploadObjectRequest {
            bucket: self.bucket.clone(),
            ..Default::default()
        };
        let mut media = Media::new(name.to_string());
        media.content_type = content_type.to_string().into();
        self.client
            .upload_object(&request, data, &UploadType::Simple(media))
            .await
            .map_err(|e| storage_error(name, e))?;
        Ok(())
    }

    async fn signed_url(&self, name: &str, validity: Duration) -> Result<String, StorageError> {
        if validity.is_zero() || validity > MAX_SIGNED_URL_VALIDITY {
            return Err(StorageError::Signing {
                object: name.to_string(),
                reason: format!("validity of {}s is outside 1s..=7d", validity.as_secs()),
            });
        }

        let options = SignedURLOptions {
            method: SignedURLMethod::GET,
            expires: validity,
            ..Default::default()
        };
        self.client
            .signed_url(&self.bucket, name, self.signer_email.clone(), None, options)
            .await
            .map_err(|e| StorageError::Signing {
                object: name.to_string(),
                reason: e.to_string(),
            })
    }
}
