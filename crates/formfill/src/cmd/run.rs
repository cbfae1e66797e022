use std::collections::BTreeMap;
use std::io::{self, BufRead as _, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use formfill_spec::{AnswerValue, FilePayload, IMAGE_URI_PREFIX, Question};
use formfill_store::{FsFormRepository, FsImageStore, IdGenerator, UuidIds};

use crate::engine::{FormEngine, FormServices, SubmitOutcome};
use crate::export::{EXPORT_FILE_NAME, PdfExporter};
use crate::importer::{DEFAULT_QUESTIONS_URL, HttpSource, ImportOutcome, QuestionImporter};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Override question source, like the hosting page's `questions` query
    /// parameter. Loaded after the default source; its success supersedes it.
    #[arg(long = "questions", value_name = "URL")]
    pub questions: Option<String>,
    #[arg(
        long = "default-url",
        value_name = "URL",
        env = "FORMFILL_DEFAULT_URL",
        default_value = DEFAULT_QUESTIONS_URL
    )]
    pub default_url: String,
    #[arg(long = "data-dir", value_name = "PATH", env = "FORMFILL_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
    #[arg(
        long = "output-dir",
        value_name = "PATH",
        env = "FORMFILL_OUTPUT_DIR",
        default_value = "."
    )]
    pub output_dir: PathBuf,
    /// Reload a previous submission instead of importing question sources.
    #[arg(long = "load", value_name = "FORM_ID", conflicts_with = "questions")]
    pub load: Option<String>,
    /// Non-interactive answers: a JSON object mapping question index to a
    /// string (or a path, for file-upload questions) or an array of strings.
    #[arg(long = "answers", value_name = "answers.json")]
    pub answers: Option<PathBuf>,
}

pub async fn run(args: RunArgs) -> Result<()> {
    let data_dir = super::resolve_data_dir(args.data_dir.clone())?;
    let services = open_services(&data_dir, &args.output_dir).await?;

    let mut engine = match &args.load {
        Some(form_id) => {
            let forms = services.forms.list().await;
            let form = forms
                .iter()
                .find(|form| &form.id == form_id)
                .with_context(|| format!("no saved form with id {form_id}"))?;
            let mut engine = FormEngine::from_saved(form, services.clone());
            engine.restore_images().await;
            engine
        }
        None => {
            let importer = QuestionImporter::new(
                Arc::new(HttpSource::new()),
                &args.default_url,
                args.questions.clone(),
            );
            let report = match importer.run(&CancellationToken::new()).await {
                ImportOutcome::Completed(report) => report,
                ImportOutcome::Cancelled => bail!("question import was cancelled"),
            };
            for failure in &report.failures {
                eprintln!("error: {failure}");
            }
            let questions = report
                .questions
                .context("no question source could be loaded")?;
            FormEngine::new(questions, services.clone())
        }
    };

    match &args.answers {
        Some(path) => apply_answers_file(&mut engine, path)?,
        None => {
            // A required reserved-variant question can never be answered at
            // the prompt, so the submit-retry loop below would never finish.
            if let Some(index) = first_unsatisfiable(&engine) {
                bail!(
                    "question {} is required but its type is not rendered yet; \
                     supply an answer for it with --answers",
                    index + 1
                );
            }
            for index in 0..engine.questions().len() {
                prompt_one(&mut engine, index)?;
            }
        }
    }

    loop {
        match engine.submit().await {
            SubmitOutcome::Invalid { first_error } => {
                let missing: Vec<usize> = engine.errors().keys().copied().collect();
                for &index in &missing {
                    println!("question {}: {}", index + 1, engine.errors()[&index]);
                }
                if args.answers.is_some() {
                    bail!("{} required answers are missing", missing.len());
                }
                if let Some(index) = first_unsatisfiable(&engine) {
                    bail!(
                        "question {} is required but its type is not rendered yet",
                        index + 1
                    );
                }
                println!("Going back to question {}.", first_error + 1);
                for index in missing {
                    prompt_one(&mut engine, index)?;
                }
            }
            SubmitOutcome::Saved {
                form,
                answers,
                export,
            } => {
                if let Err(err) = export.await {
                    debug!(error = %err, "export task aborted");
                }
                println!("Saved submission {}.", form.id);
                for (index, answer) in &answers {
                    let prompt = engine
                        .questions()
                        .get(*index)
                        .map(Question::prompt)
                        .unwrap_or("?");
                    println!("  {}: {}", prompt, answer.display_text());
                }
                println!(
                    "Wrote {}.",
                    args.output_dir.join(EXPORT_FILE_NAME).display()
                );
                return Ok(());
            }
        }
    }
}

async fn open_services(data_dir: &Path, output_dir: &Path) -> Result<FormServices> {
    let ids: Arc<dyn IdGenerator> = Arc::new(UuidIds);
    let images = FsImageStore::open(data_dir.join("images"), Arc::clone(&ids)).await?;
    let forms = FsFormRepository::open(data_dir).await?;
    Ok(FormServices {
        images: Arc::new(images),
        forms: Arc::new(forms),
        exporter: Arc::new(PdfExporter::new(output_dir)),
        ids,
    })
}

/// Lowest required question the prompt loop can never satisfy: a reserved
/// date/time variant with no answer already in place (a reloaded submission
/// may carry one).
fn first_unsatisfiable(engine: &FormEngine) -> Option<usize> {
    engine.questions().iter().enumerate().find_map(|(index, question)| {
        let reserved = matches!(
            question,
            Question::DatePicker { .. } | Question::TimePicker { .. }
        );
        let unanswered = engine.value(index).is_none_or(AnswerValue::is_empty);
        (reserved && question.required() && unanswered).then_some(index)
    })
}

fn prompt_one(engine: &mut FormEngine, index: usize) -> Result<()> {
    let Some(question) = engine.questions().get(index).cloned() else {
        return Ok(());
    };
    let marker = if question.required() { " *" } else { "" };
    println!();
    println!("{}. {}{}", index + 1, question.prompt(), marker);

    match &question {
        Question::TextBox { .. } => {
            let input = read_line("> ")?;
            if input.is_empty() {
                engine.clear_answer(index);
            } else {
                engine.set_answer(index, AnswerValue::Text(input));
            }
        }
        Question::MultipleChoice { answers, .. } | Question::Dropdown { answers, .. } => {
            print_options(answers);
            let input = read_line("pick one> ")?;
            if input.is_empty() {
                engine.clear_answer(index);
            } else if let Some(choice) = parse_choice(&input, answers) {
                engine.set_answer(index, AnswerValue::Text(choice));
            } else {
                println!("Unrecognized choice, leaving unanswered.");
                engine.clear_answer(index);
            }
        }
        Question::Checkbox { answers, .. } => {
            print_options(answers);
            let input = read_line("pick any (comma separated)> ")?;
            let picked: Vec<String> = input
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .filter_map(|part| parse_choice(part, answers))
                .collect();
            if picked.is_empty() {
                engine.clear_answer(index);
            } else {
                engine.set_answer(index, AnswerValue::Many(picked));
            }
        }
        Question::FileUpload { .. } => {
            let has_restored = matches!(
                engine.value(index),
                Some(AnswerValue::Text(text)) if text.starts_with(IMAGE_URI_PREFIX)
            );
            let prompt = if has_restored {
                "image path (enter keeps the current image)> "
            } else {
                "image path> "
            };
            let input = read_line(prompt)?;
            if input.is_empty() {
                if !has_restored {
                    engine.clear_answer(index);
                }
            } else if let Err(err) = set_file_answer(engine, index, Path::new(&input)) {
                println!("{err:#}; leaving unanswered.");
                engine.clear_answer(index);
            }
        }
        Question::DatePicker { .. } | Question::TimePicker { .. } => {
            println!("(this question type is not rendered yet)");
        }
    }
    Ok(())
}

fn print_options(options: &[String]) {
    for (n, option) in options.iter().enumerate() {
        println!("  {}) {}", n + 1, option);
    }
}

/// Accepts a 1-based option number or an exact label.
fn parse_choice(input: &str, options: &[String]) -> Option<String> {
    let input = input.trim();
    if let Ok(n) = input.parse::<usize>() {
        return options.get(n.checked_sub(1)?).cloned();
    }
    options.iter().find(|option| option.as_str() == input).cloned()
}

fn set_file_answer(engine: &mut FormEngine, index: usize, path: &Path) -> Result<()> {
    let mime = image_mime(path)
        .with_context(|| format!("{} is not a supported image file", path.display()))?;
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read image {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string();
    engine.set_answer(
        index,
        AnswerValue::File(FilePayload {
            file_name,
            mime: mime.to_string(),
            bytes,
        }),
    );
    Ok(())
}

fn image_mime(path: &Path) -> Option<&'static str> {
    match path
        .extension()
        .and_then(|ext| ext.to_str())?
        .to_ascii_lowercase()
        .as_str()
    {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn apply_answers_file(engine: &mut FormEngine, path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answers {}", path.display()))?;
    let doc: BTreeMap<usize, serde_json::Value> = serde_json::from_str(&raw).with_context(|| {
        format!(
            "answers {} must be a JSON object keyed by question index",
            path.display()
        )
    })?;

    for (index, value) in doc {
        match value {
            serde_json::Value::String(text) => {
                let takes_file = engine
                    .questions()
                    .get(index)
                    .is_some_and(Question::takes_file);
                if takes_file {
                    set_file_answer(engine, index, Path::new(&text))?;
                } else {
                    engine.set_answer(index, AnswerValue::Text(text));
                }
            }
            serde_json::Value::Array(items) => {
                let items: Vec<String> = items
                    .into_iter()
                    .filter_map(|item| item.as_str().map(ToOwned::to_owned))
                    .collect();
                engine.set_answer(index, AnswerValue::Many(items));
            }
            other => bail!("unsupported answer value for question {index}: {other}"),
        }
    }
    Ok(())
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        bail!("input closed before the form was finished");
    }
    Ok(line.trim().to_string())
}
