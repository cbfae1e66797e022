use std::path::PathBuf;

pub use formfill_export::{EXPORT_FILE_NAME, ExportError, ExportRequest, PdfExporter};

/// Seam between the form engine and the document exporter.
///
/// The engine invokes this fire-and-forget from a detached task; an
/// implementation's failure never reaches the submit flow.
pub trait DocumentExporter: Send + Sync {
    fn export(&self, request: &ExportRequest) -> Result<PathBuf, ExportError>;
}

impl DocumentExporter for PdfExporter {
    fn export(&self, request: &ExportRequest) -> Result<PathBuf, ExportError> {
        PdfExporter::export(self, request)
    }
}
