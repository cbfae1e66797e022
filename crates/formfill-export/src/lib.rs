#![allow(missing_docs)]

//! Renders a submission's question/answer pairs into a paginated PDF.
//!
//! Split into a pure layout stage (pagination over fixed-height blocks) and
//! a self-contained PDF writer, so pagination is testable without touching
//! the produced bytes.

pub mod image;
pub mod layout;
pub mod pdf;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use formfill_spec::{CleanAnswer, QuestionList};

pub use layout::{
    Block, BlockKind, LaidOutDocument, MARGIN_MM, PAGE_HEIGHT_MM, PAGE_WIDTH_MM, Page,
    layout_document,
};

/// Fixed name of the produced artifact.
pub const EXPORT_FILE_NAME: &str = "form_responses.pdf";

/// Everything the exporter needs from a completed submission: the question
/// set, the cleaned answers, and the persisted image payloads keyed by
/// question index.
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    pub questions: QuestionList,
    pub answers: BTreeMap<usize, CleanAnswer>,
    pub images: BTreeMap<usize, String>,
}

/// Failure writing the export artifact.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Produces the finished PDF bytes for a submission.
pub fn render_pdf(request: &ExportRequest) -> Vec<u8> {
    let document = layout_document(&request.questions, &request.answers, &request.images);
    pdf::write_document(&document)
}

/// Writes `form_responses.pdf` into a fixed output directory.
pub struct PdfExporter {
    output_dir: PathBuf,
}

impl PdfExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(EXPORT_FILE_NAME)
    }

    pub fn export(&self, request: &ExportRequest) -> Result<PathBuf, ExportError> {
        let bytes = render_pdf(request);
        write_bytes(&self.output_dir, &bytes)
    }
}

fn write_bytes(dir: &Path, bytes: &[u8]) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir).map_err(|err| ExportError::Io {
        path: dir.to_path_buf(),
        source: err,
    })?;
    let path = dir.join(EXPORT_FILE_NAME);
    std::fs::write(&path, bytes).map_err(|err| ExportError::Io {
        path: path.clone(),
        source: err,
    })?;
    Ok(path)
}
