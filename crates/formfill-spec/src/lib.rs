#![allow(missing_docs)]

pub mod answer;
pub mod form;
pub mod payload;
pub mod question;
pub mod schema;

pub use answer::{AnswerValue, CleanAnswer, FilePayload};
pub use form::SavedForm;
pub use payload::{IMAGE_URI_PREFIX, decode_image, encode_image, ensure_image_prefix};
pub use question::{Question, QuestionList};
pub use schema::{SchemaError, parse_question_list};
