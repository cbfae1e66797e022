use serde_json::Value;
use thiserror::Error;

use crate::question::{Question, QuestionList};

/// Failure raised while validating an untrusted question source.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("question source must be a JSON array")]
    NotAnArray,
    #[error("question {index}: {reason}")]
    InvalidQuestion { index: usize, reason: String },
}

/// Validates a parsed JSON value against the question shapes.
///
/// Every element must match exactly one variant: the `answerType` tag selects
/// the required field set and each field is checked by exact type. Any
/// mismatch rejects the whole list; there is no partial acceptance. Unknown
/// extra fields on an element are tolerated and stripped.
pub fn parse_question_list(value: &Value) -> Result<QuestionList, SchemaError> {
    let items = value.as_array().ok_or(SchemaError::NotAnArray)?;

    let mut questions = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let question: Question = serde_json::from_value(item.clone()).map_err(|err| {
            SchemaError::InvalidQuestion {
                index,
                reason: err.to_string(),
            }
        })?;
        questions.push(question);
    }
    Ok(questions)
}
