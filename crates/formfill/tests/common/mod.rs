#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use formfill::engine::FormServices;
use formfill::export::{DocumentExporter, ExportError, ExportRequest};
use formfill_store::{MemoryFormRepository, MemoryImageStore, SequentialIds};

/// Exporter that records every request instead of producing a document.
#[derive(Default)]
pub struct RecordingExporter {
    requests: Mutex<Vec<ExportRequest>>,
}

impl RecordingExporter {
    pub fn count(&self) -> usize {
        self.requests.lock().expect("exporter lock").len()
    }

    pub fn last(&self) -> Option<ExportRequest> {
        self.requests.lock().expect("exporter lock").last().cloned()
    }
}

impl DocumentExporter for RecordingExporter {
    fn export(&self, request: &ExportRequest) -> Result<PathBuf, ExportError> {
        self.requests
            .lock()
            .expect("exporter lock")
            .push(request.clone());
        Ok(PathBuf::from("form_responses.pdf"))
    }
}

/// In-memory services with deterministic ids plus handles for assertions.
pub struct Harness {
    pub images: Arc<MemoryImageStore>,
    pub forms: Arc<MemoryFormRepository>,
    pub exporter: Arc<RecordingExporter>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            images: Arc::new(MemoryImageStore::with_ids(Arc::new(SequentialIds::new(
                "img",
            )))),
            forms: Arc::new(MemoryFormRepository::new()),
            exporter: Arc::new(RecordingExporter::default()),
        }
    }

    pub fn services(&self) -> FormServices {
        FormServices {
            images: self.images.clone(),
            forms: self.forms.clone(),
            exporter: self.exporter.clone(),
            ids: Arc::new(SequentialIds::new("form")),
        }
    }
}
