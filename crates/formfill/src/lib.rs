#![allow(missing_docs)]

pub mod engine;
pub mod export;
pub mod importer;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "cli")]
pub mod cmd;

pub use engine::{FormEngine, FormServices, SubmitOutcome};
pub use export::{DocumentExporter, ExportRequest, PdfExporter};
pub use importer::{
    DEFAULT_QUESTIONS_URL, HttpSource, ImportError, ImportFailure, ImportOutcome, ImportReport,
    QuestionImporter, QuestionSource,
};
