use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use formfill_spec::{QuestionList, SchemaError, parse_question_list};

/// Fixed endpoint the importer always loads first.
pub const DEFAULT_QUESTIONS_URL: &str = "http://localhost:8080/default.json";

/// Why a single question source could not be applied.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("fetch failed ({0})")]
    Transport(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// A per-source failure, naming the source it came from.
#[derive(Debug)]
pub struct ImportFailure {
    pub url: String,
    pub error: ImportError,
}

impl std::fmt::Display for ImportFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to load questions from {}: {}", self.url, self.error)
    }
}

/// What a completed import run produced: the last successfully loaded list
/// (if any source succeeded) plus every per-source failure.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub questions: Option<QuestionList>,
    pub failures: Vec<ImportFailure>,
}

/// Distinguishes a finished run from one torn down mid-flight; a cancelled
/// run hands nothing to the caller, even when a fetch had already landed.
#[derive(Debug)]
pub enum ImportOutcome {
    Completed(ImportReport),
    Cancelled,
}

/// Fetch seam so tests can substitute canned sources for the network.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Value, ImportError>;
}

/// Production source: HTTP(S) via `reqwest`, plus local files for `file://`
/// URLs and bare paths.
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuestionSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<Value, ImportError> {
        match Url::parse(url) {
            Ok(parsed) if parsed.scheme() == "file" => {
                let path = parsed
                    .to_file_path()
                    .map_err(|_| ImportError::Transport(format!("invalid file url {url}")))?;
                read_json_file(&path).await
            }
            Ok(parsed) => {
                let response = self
                    .client
                    .get(parsed)
                    .send()
                    .await
                    .map_err(|err| ImportError::Transport(err.to_string()))?;
                if !response.status().is_success() {
                    return Err(ImportError::Transport(
                        response.status().as_u16().to_string(),
                    ));
                }
                response
                    .json()
                    .await
                    .map_err(|err| ImportError::Transport(err.to_string()))
            }
            // Not a URL: treat it as a local path.
            Err(_) => read_json_file(std::path::Path::new(url)).await,
        }
    }
}

async fn read_json_file(path: &std::path::Path) -> Result<Value, ImportError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| ImportError::Transport(err.to_string()))?;
    serde_json::from_str(&raw).map_err(|err| ImportError::Transport(err.to_string()))
}

/// Two-phase question loader: the fixed default endpoint first, then an
/// optional override whose success supersedes the default. Each phase is
/// awaited fully before the next begins; a failing phase is reported and
/// never retried, and does not abort the other phase.
pub struct QuestionImporter {
    source: Arc<dyn QuestionSource>,
    default_url: String,
    override_url: Option<String>,
}

impl QuestionImporter {
    pub fn new(
        source: Arc<dyn QuestionSource>,
        default_url: impl Into<String>,
        override_url: Option<String>,
    ) -> Self {
        Self {
            source,
            default_url: default_url.into(),
            override_url,
        }
    }

    pub async fn run(&self, cancel: &CancellationToken) -> ImportOutcome {
        let mut report = ImportReport::default();

        let urls = [Some(&self.default_url), self.override_url.as_ref()];
        for url in urls.into_iter().flatten() {
            if cancel.is_cancelled() {
                return ImportOutcome::Cancelled;
            }
            let loaded = tokio::select! {
                _ = cancel.cancelled() => return ImportOutcome::Cancelled,
                loaded = self.load_source(url) => loaded,
            };
            // The fetch may have raced cancellation; a late result is
            // discarded rather than applied.
            if cancel.is_cancelled() {
                return ImportOutcome::Cancelled;
            }
            match loaded {
                Ok(questions) => {
                    debug!(url = %url, count = questions.len(), "question source applied");
                    report.questions = Some(questions);
                }
                Err(error) => report.failures.push(ImportFailure {
                    url: url.clone(),
                    error,
                }),
            }
        }

        ImportOutcome::Completed(report)
    }

    async fn load_source(&self, url: &str) -> Result<QuestionList, ImportError> {
        let value = self.source.fetch(url).await?;
        Ok(parse_question_list(&value)?)
    }
}
