use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use formfill_spec::ensure_image_prefix;

use crate::error::StoreError;
use crate::ids::IdGenerator;

/// Durable key-value store for image payloads.
///
/// `save` mints a fresh id and persists the payload under it; `load` signals
/// absence with `Ok(None)`. Payloads come back with a `data:image` prefix,
/// added on read when the stored value lacks one. No update or delete is
/// exposed; orphaned payloads are never collected.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn save(&self, payload: &str) -> Result<String, StoreError>;
    async fn load(&self, id: &str) -> Result<Option<String>, StoreError>;
}

/// Filesystem-backed image store: one file per id under the store directory.
pub struct FsImageStore {
    root: PathBuf,
    ids: Arc<dyn IdGenerator>,
}

impl FsImageStore {
    /// Opens the store, creating its directory if needed.
    pub async fn open(root: impl Into<PathBuf>, ids: Arc<dyn IdGenerator>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|err| StoreError::io(&root, err))?;
        Ok(Self { root, ids })
    }

    fn entry_path(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn save(&self, payload: &str) -> Result<String, StoreError> {
        let id = self.ids.generate();
        let path = self.entry_path(&id);
        fs::write(&path, payload)
            .await
            .map_err(|err| StoreError::io(&path, err))?;
        debug!(id = %id, bytes = payload.len(), "image payload persisted");
        Ok(id)
    }

    async fn load(&self, id: &str) -> Result<Option<String>, StoreError> {
        let path = self.entry_path(id);
        match fs::read_to_string(&path).await {
            Ok(payload) => Ok(Some(ensure_image_prefix(&payload).into_owned())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::io(&path, err)),
        }
    }
}

/// In-memory image store for tests.
#[derive(Default)]
pub struct MemoryImageStore {
    entries: Mutex<HashMap<String, String>>,
    ids: Option<Arc<dyn IdGenerator>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ids: Some(ids),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("image store lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn save(&self, payload: &str) -> Result<String, StoreError> {
        let id = match &self.ids {
            Some(ids) => ids.generate(),
            None => crate::ids::UuidIds.generate(),
        };
        self.entries
            .lock()
            .expect("image store lock")
            .insert(id.clone(), payload.to_string());
        Ok(id)
    }

    async fn load(&self, id: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().expect("image store lock");
        Ok(entries
            .get(id)
            .map(|payload| ensure_image_prefix(payload).into_owned()))
    }
}
