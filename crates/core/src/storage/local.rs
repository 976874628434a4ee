use std::{
    io,
    path::{Component, Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use tokio::fs;

use crate::storage::{ObjectStore, StorageError};

/// Directory-backed store: object names are `/`-separated paths under `root`.
pub struct LocalStore {
    container: String,
    root: PathBuf,
    public_base_url: Option<String>,
}

/// Default root for the local store
pub fn get_default_local_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("clipdex")
}

impl LocalStore {
    /// The container name is the last component of `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let container = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "local".to_string());
        Self {
            container,
            root,
            public_base_url: None,
        }
    }

    /// Serve "signed" URLs from a static file server instead of `file://`.
    pub fn with_public_base_url(mut self, base: impl Into<String>) -> Self {
        self.public_base_url = Some(base.into().trim_end_matches('/').to_string());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if name.is_empty() || escapes {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid object name: {name:?}"),
            )));
        }
        Ok(self.root.join(relative))
    }

    fn not_found_or_io(name: &str, err: io::Error) -> StorageError {
        if err.kind() == io::ErrorKind::NotFound {
            StorageError::NotFound {
                object: name.to_string(),
            }
        } else {
            StorageError::Io(err)
        }
    }
}

/// Percent-encode each `/`-separated segment of an object name, keeping the slashes.
pub fn encode_object_path(name: &str) -> String {
    name.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl ObjectStore for LocalStore {
    fn container(&self) -> &str {
        &self.container
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        if !fs::try_exists(&self.root).await? {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(relative) = path.strip_prefix(&self.root) else {
                    continue;
                };
                let name = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if name.starts_with(prefix) {
                    names.push(name);
                }
            }
        }

        names.sort();
        Ok(names)
    }

    async fn download(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(name)?;
        fs::read(&path)
            .await
            .map_err(|e| Self::not_found_or_io(name, e))
    }

    async fn upload(
        &self,
        name: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        let path = self.resolve(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, data).await?;
        Ok(())
    }

    async fn signed_url(&self, name: &str, _validity: Duration) -> Result<String, StorageError> {
        let path = self.resolve(name)?;
        if let Some(base) = &self.public_base_url {
            return Ok(format!("{base}/{}", encode_object_path(name)));
        }
        if !fs::try_exists(&path).await? {
            return Err(StorageError::NotFound {
                object: name.to_string(),
            });
        }
        let absolute = fs::canonicalize(&path).await?;
        Ok(format!("file://{}", absolute.display()))
    }
}
