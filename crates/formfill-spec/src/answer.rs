use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A file handle captured by the form before submission.
///
/// Exists only transiently in engine state; on submit the bytes are encoded
/// to a data-URI, persisted to the image store, and the handle is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePayload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Live answer state for one question.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerValue {
    Text(String),
    Many(Vec<String>),
    File(FilePayload),
}

impl AnswerValue {
    /// Emptiness as seen by required-field validation: blank or
    /// whitespace-only text, or an empty selection. Absent answers are
    /// represented by a missing map entry, not by a variant.
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Text(text) => text.trim().is_empty(),
            AnswerValue::Many(items) => items.is_empty(),
            AnswerValue::File(_) => false,
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(text: &str) -> Self {
        AnswerValue::Text(text.to_string())
    }
}

/// A persisted answer: file handles are excluded from this set and replaced
/// by image-store ids in the submission's image map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CleanAnswer {
    Text(String),
    Many(Vec<String>),
}

impl CleanAnswer {
    /// Renders the answer the way the exporter prints it: multi-valued
    /// answers join with a comma.
    pub fn display_text(&self) -> String {
        match self {
            CleanAnswer::Text(text) => text.clone(),
            CleanAnswer::Many(items) => items.join(", "),
        }
    }
}

impl From<CleanAnswer> for AnswerValue {
    fn from(clean: CleanAnswer) -> Self {
        match clean {
            CleanAnswer::Text(text) => AnswerValue::Text(text),
            CleanAnswer::Many(items) => AnswerValue::Many(items),
        }
    }
}
