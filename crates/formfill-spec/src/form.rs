use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::answer::CleanAnswer;
use crate::question::QuestionList;

/// One durable record of a completed submission.
///
/// Immutable after creation. `image_map` entries reference image-store ids
/// without owning them; a payload removed from the store independently
/// degrades to an unset answer when the form is restored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SavedForm {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    #[schemars(with = "String")]
    pub created_at: OffsetDateTime,
    pub questions: QuestionList,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub answers: BTreeMap<usize, CleanAnswer>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub image_map: BTreeMap<usize, String>,
}
