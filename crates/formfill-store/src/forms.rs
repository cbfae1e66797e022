use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs;
use tracing::warn;

use formfill_spec::SavedForm;

use crate::error::StoreError;

/// File name holding the serialized submission list.
pub const FORMS_FILE_NAME: &str = "saved_forms.json";

/// Durable, observably append-only list of past submissions.
///
/// `list` returns records oldest first; unreadable or unparseable storage is
/// treated as empty with a logged warning rather than an error. `append`
/// rewrites the whole sequence; concurrent writers are not coordinated and
/// the last writer wins.
#[async_trait]
pub trait SavedFormRepository: Send + Sync {
    async fn list(&self) -> Vec<SavedForm>;
    async fn append(&self, form: &SavedForm) -> Result<(), StoreError>;
}

/// Repository persisting the submission list as a single JSON array file.
pub struct FsFormRepository {
    path: PathBuf,
}

impl FsFormRepository {
    /// Opens the repository inside `dir`, creating the directory if needed.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .await
            .map_err(|err| StoreError::io(dir, err))?;
        Ok(Self {
            path: dir.join(FORMS_FILE_NAME),
        })
    }

    async fn read_all(&self) -> Vec<SavedForm> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "saved forms unreadable, treating as empty");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(forms) => forms,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "saved forms corrupt, treating as empty");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl SavedFormRepository for FsFormRepository {
    async fn list(&self) -> Vec<SavedForm> {
        self.read_all().await
    }

    async fn append(&self, form: &SavedForm) -> Result<(), StoreError> {
        let mut forms = self.read_all().await;
        forms.push(form.clone());
        let serialized = serde_json::to_string(&forms)?;
        fs::write(&self.path, serialized)
            .await
            .map_err(|err| StoreError::io(&self.path, err))
    }
}

/// In-memory repository for tests.
#[derive(Default)]
pub struct MemoryFormRepository {
    forms: Mutex<Vec<SavedForm>>,
}

impl MemoryFormRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SavedFormRepository for MemoryFormRepository {
    async fn list(&self) -> Vec<SavedForm> {
        self.forms.lock().expect("forms lock").clone()
    }

    async fn append(&self, form: &SavedForm) -> Result<(), StoreError> {
        self.forms.lock().expect("forms lock").push(form.clone());
        Ok(())
    }
}
