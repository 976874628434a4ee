use std::{collections::HashSet, sync::Mutex, time::Duration};

use async_trait::async_trait;

use crate::storage::{ObjectStore, StorageError};

#[derive(Default)]
struct MemoryInner {
    objects: Vec<(String, Vec<u8>)>,
    failing_downloads: HashSet<String>,
    failing_signatures: HashSet<String>,
}

/// In-process store keeping objects in insertion order.
///
/// Downloads and URL signing can be made to fail per object, which is how
/// tests exercise the skip and degrade paths.
pub struct MemoryStore {
    container: String,
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            inner: Mutex::new(MemoryInner::default()),
        }
    }

    pub fn with_object(self, name: &str, data: impl Into<Vec<u8>>) -> Self {
        self.put(name, data);
        self
    }

    pub fn put(&self, name: &str, data: impl Into<Vec<u8>>) {
        let mut inner = self.inner.lock().expect("MemoryStore poisoned");
        let data = data.into();
        match inner.objects.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = data,
            None => inner.objects.push((name.to_string(), data)),
        }
    }

    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        let inner = self.inner.lock().expect("MemoryStore poisoned");
        inner
            .objects
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.clone())
    }

    pub fn fail_download(&self, name: &str) {
        let mut inner = self.inner.lock().expect("MemoryStore poisoned");
        inner.failing_downloads.insert(name.to_string());
    }

    pub fn fail_signing(&self, name: &str) {
        let mut inner = self.inner.lock().expect("MemoryStore poisoned");
        inner.failing_signatures.insert(name.to_string());
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn container(&self) -> &str {
        &self.container
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let inner = self.inner.lock().expect("MemoryStore poisoned");
        Ok(inner
            .objects
            .iter()
            .map(|(name, _)| name)
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn download(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let inner = self.inner.lock().expect("MemoryStore poisoned");
        if inner.failing_downloads.contains(name) {
            return Err(StorageError::Http {
                object: name.to_string(),
                status: 500,
                body: "injected download failure".to_string(),
            });
        }
        inner
            .objects
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.clone())
            .ok_or_else(|| StorageError::NotFound {
                object: name.to_string(),
            })
    }

    async fn upload(
        &self,
        name: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        self.put(name, data);
        Ok(())
    }

    async fn signed_url(&self, name: &str, validity: Duration) -> Result<String, StorageError> {
        let inner = self.inner.lock().expect("MemoryStore poisoned");
        if inner.failing_signatures.contains(name) {
            return Err(StorageError::Signing {
                object: name.to_string(),
                reason: "injected signing failure".to_string(),
            });
        }
        Ok(format!(
            "memory://{}/{}?expires={}",
            self.container,
            name,
            validity.as_secs()
        ))
    }
}
