use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use time::format_description::well_known::Rfc3339;

use formfill_store::{FsFormRepository, SavedFormRepository};

#[derive(Args, Debug)]
pub struct FormsArgs {
    #[arg(long = "data-dir", value_name = "PATH", env = "FORMFILL_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

pub async fn run(args: FormsArgs) -> Result<()> {
    let data_dir = super::resolve_data_dir(args.data_dir)?;
    let repository = FsFormRepository::open(&data_dir).await?;

    let forms = repository.list().await;
    if forms.is_empty() {
        println!("No saved forms.");
        return Ok(());
    }
    for form in forms {
        let created = form
            .created_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| form.created_at.to_string());
        println!(
            "{}  {}  ({} questions)",
            form.id,
            created,
            form.questions.len()
        );
    }
    Ok(())
}
