use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single question definition, discriminated by its `answerType` tag.
///
/// The variant fixes the input modality for the lifetime of the question;
/// choice-style variants carry their ordered option labels inline. The
/// `DatePicker` and `TimePicker` variants are accepted by the schema but not
/// rendered by the current engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "answerType")]
pub enum Question {
    TextBox {
        question: String,
        required: bool,
    },
    MultipleChoice {
        question: String,
        required: bool,
        answers: Vec<String>,
    },
    Checkbox {
        question: String,
        required: bool,
        answers: Vec<String>,
    },
    Dropdown {
        question: String,
        required: bool,
        answers: Vec<String>,
    },
    FileUpload {
        question: String,
        required: bool,
    },
    DatePicker {
        question: String,
        required: bool,
    },
    TimePicker {
        question: String,
        required: bool,
    },
}

/// Ordered question set. The 0-based position is the stable identity used to
/// correlate answers, errors, and stored images; reordering invalidates all
/// recorded correlations.
pub type QuestionList = Vec<Question>;

impl Question {
    /// Prompt text shown to the respondent.
    pub fn prompt(&self) -> &str {
        match self {
            Question::TextBox { question, .. }
            | Question::MultipleChoice { question, .. }
            | Question::Checkbox { question, .. }
            | Question::Dropdown { question, .. }
            | Question::FileUpload { question, .. }
            | Question::DatePicker { question, .. }
            | Question::TimePicker { question, .. } => question,
        }
    }

    pub fn required(&self) -> bool {
        match self {
            Question::TextBox { required, .. }
            | Question::MultipleChoice { required, .. }
            | Question::Checkbox { required, .. }
            | Question::Dropdown { required, .. }
            | Question::FileUpload { required, .. }
            | Question::DatePicker { required, .. }
            | Question::TimePicker { required, .. } => *required,
        }
    }

    /// Option labels for choice-style variants, in declaration order.
    pub fn options(&self) -> Option<&[String]> {
        match self {
            Question::MultipleChoice { answers, .. }
            | Question::Checkbox { answers, .. }
            | Question::Dropdown { answers, .. } => Some(answers),
            _ => None,
        }
    }

    /// Whether the answer is a file handle rather than text or selections.
    pub fn takes_file(&self) -> bool {
        matches!(self, Question::FileUpload { .. })
    }

    /// The discriminant tag as it appears in source JSON.
    pub fn answer_type(&self) -> &'static str {
        match self {
            Question::TextBox { .. } => "TextBox",
            Question::MultipleChoice { .. } => "MultipleChoice",
            Question::Checkbox { .. } => "Checkbox",
            Question::Dropdown { .. } => "Dropdown",
            Question::FileUpload { .. } => "FileUpload",
            Question::DatePicker { .. } => "DatePicker",
            Question::TimePicker { .. } => "TimePicker",
        }
    }
}
