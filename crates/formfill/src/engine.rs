use std::collections::BTreeMap;
use std::sync::Arc;

use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use formfill_spec::{
    AnswerValue, CleanAnswer, IMAGE_URI_PREFIX, QuestionList, SavedForm, encode_image,
};
use formfill_store::{IdGenerator, ImageStore, SavedFormRepository};

use crate::export::{DocumentExporter, ExportRequest};

/// Inline message recorded for every missing required answer.
pub const REQUIRED_MESSAGE: &str = "This field is required";

/// Services the engine drives; injected so tests can substitute in-memory
/// stores, a recording exporter, and deterministic ids.
#[derive(Clone)]
pub struct FormServices {
    pub images: Arc<dyn ImageStore>,
    pub forms: Arc<dyn SavedFormRepository>,
    pub exporter: Arc<dyn DocumentExporter>,
    pub ids: Arc<dyn IdGenerator>,
}

/// Result of a submit attempt.
pub enum SubmitOutcome {
    /// Validation failed: the error map is populated and `first_error` is the
    /// lowest offending index for the caller to bring into view. Nothing was
    /// persisted and no export was triggered.
    Invalid { first_error: usize },
    /// The submission was persisted. `answers` is the cleaned answer map
    /// (file values excluded), and `export` is the detached export task;
    /// its failures are logged and never join back into this result.
    Saved {
        form: SavedForm,
        answers: BTreeMap<usize, CleanAnswer>,
        export: JoinHandle<()>,
    },
}

/// Holds per-question answer state for one question set and orchestrates
/// validation, image persistence, submission records, and document export.
pub struct FormEngine {
    questions: QuestionList,
    values: BTreeMap<usize, AnswerValue>,
    image_map: BTreeMap<usize, String>,
    errors: BTreeMap<usize, String>,
    saving: bool,
    services: FormServices,
}

impl FormEngine {
    pub fn new(questions: QuestionList, services: FormServices) -> Self {
        Self {
            questions,
            values: BTreeMap::new(),
            image_map: BTreeMap::new(),
            errors: BTreeMap::new(),
            saving: false,
            services,
        }
    }

    /// Seeds the engine from a prior submission so it can be re-displayed.
    /// Call [`FormEngine::restore_images`] afterwards to pull the stored
    /// image payloads back into the answer state.
    pub fn from_saved(form: &SavedForm, services: FormServices) -> Self {
        let values = form
            .answers
            .iter()
            .map(|(&index, answer)| (index, AnswerValue::from(answer.clone())))
            .collect();
        Self {
            questions: form.questions.clone(),
            values,
            image_map: form.image_map.clone(),
            errors: BTreeMap::new(),
            saving: false,
            services,
        }
    }

    /// Discards all current values, images, and errors and re-seeds from new
    /// initial data. Used whenever the question set changes identity so
    /// stale answers cannot bleed across unrelated forms.
    pub fn reset(
        &mut self,
        questions: QuestionList,
        initial_values: BTreeMap<usize, AnswerValue>,
        initial_image_map: BTreeMap<usize, String>,
    ) {
        self.questions = questions;
        self.values = initial_values;
        self.image_map = initial_image_map;
        self.errors.clear();
        self.saving = false;
    }

    /// Fetches every mapped image payload from the store and substitutes it
    /// into the live answer state, so previously uploaded images re-display
    /// without a re-upload. A missing payload leaves that index unset.
    pub async fn restore_images(&mut self) {
        let entries: Vec<(usize, String)> = self
            .image_map
            .iter()
            .map(|(&index, id)| (index, id.clone()))
            .collect();
        for (index, id) in entries {
            match self.services.images.load(&id).await {
                Ok(Some(payload)) => {
                    self.values.insert(index, AnswerValue::Text(payload));
                }
                Ok(None) => {
                    debug!(index, id = %id, "stored image missing, leaving answer unset");
                }
                Err(err) => {
                    warn!(index, id = %id, error = %err, "image restore failed");
                }
            }
        }
    }

    pub fn questions(&self) -> &QuestionList {
        &self.questions
    }

    pub fn value(&self, index: usize) -> Option<&AnswerValue> {
        self.values.get(&index)
    }

    pub fn image_map(&self) -> &BTreeMap<usize, String> {
        &self.image_map
    }

    pub fn errors(&self) -> &BTreeMap<usize, String> {
        &self.errors
    }

    pub fn saving(&self) -> bool {
        self.saving
    }

    /// Unconditionally overwrites the answer at `index`. No validation
    /// happens on entry.
    pub fn set_answer(&mut self, index: usize, value: AnswerValue) {
        self.values.insert(index, value);
    }

    pub fn clear_answer(&mut self, index: usize) {
        self.values.remove(&index);
    }

    /// Rebuilds the error map: every required question whose answer is
    /// absent, blank, or an empty selection gets an entry. Returns the
    /// lowest erroring index.
    pub fn validate(&mut self) -> Option<usize> {
        let mut errors = BTreeMap::new();
        for (index, question) in self.questions.iter().enumerate() {
            if !question.required() {
                continue;
            }
            let empty = self.values.get(&index).is_none_or(AnswerValue::is_empty);
            if empty {
                errors.insert(index, REQUIRED_MESSAGE.to_string());
            }
        }
        let first = errors.keys().next().copied();
        self.errors = errors;
        first
    }

    /// Validates and, on success, persists file answers to the image store,
    /// appends a [`SavedForm`] to the repository, and spawns the document
    /// export as a detached task. Image persistence completes before the
    /// append; the append completes before the export is spawned. Store
    /// failures are logged and never abort the rest of the submission.
    pub async fn submit(&mut self) -> SubmitOutcome {
        self.saving = true;

        if let Some(first_error) = self.validate() {
            self.saving = false;
            return SubmitOutcome::Invalid { first_error };
        }

        let mut image_map = self.image_map.clone();
        let mut answers = BTreeMap::new();
        for (&index, value) in &self.values {
            match value {
                AnswerValue::Text(text) => {
                    answers.insert(index, CleanAnswer::Text(text.clone()));
                }
                AnswerValue::Many(items) => {
                    answers.insert(index, CleanAnswer::Many(items.clone()));
                }
                AnswerValue::File(file) => {
                    let payload = encode_image(&file.mime, &file.bytes);
                    match self.services.images.save(&payload).await {
                        Ok(id) => {
                            image_map.insert(index, id);
                        }
                        Err(err) => {
                            error!(index, error = %err, "image persistence failed, dropping answer");
                        }
                    }
                }
            }
        }
        self.image_map = image_map.clone();

        let form = SavedForm {
            id: self.services.ids.generate(),
            created_at: OffsetDateTime::now_utc(),
            questions: self.questions.clone(),
            answers: answers.clone(),
            image_map,
        };

        if let Err(err) = self.services.forms.append(&form).await {
            error!(error = %err, "appending the submission failed");
        }

        let request = ExportRequest {
            questions: self.questions.clone(),
            answers: answers.clone(),
            images: self.export_images().await,
        };
        let exporter = Arc::clone(&self.services.exporter);
        let export = tokio::task::spawn_blocking(move || {
            if let Err(err) = exporter.export(&request) {
                warn!(error = %err, "document export failed");
            }
        });

        self.saving = false;
        SubmitOutcome::Saved {
            form,
            answers,
            export,
        }
    }

    /// Collects the image payloads the exporter should embed, keyed by
    /// question index: the payload behind each mapped store id, falling back
    /// to a data-URI already sitting in the answer state (a restored image).
    async fn export_images(&self) -> BTreeMap<usize, String> {
        let mut images = BTreeMap::new();
        for (&index, id) in &self.image_map {
            match self.services.images.load(id).await {
                Ok(Some(payload)) => {
                    images.insert(index, payload);
                }
                Ok(None) | Err(_) => {
                    if let Some(AnswerValue::Text(text)) = self.values.get(&index)
                        && text.starts_with(IMAGE_URI_PREFIX)
                    {
                        images.insert(index, text.clone());
                    }
                }
            }
        }
        images
    }
}
