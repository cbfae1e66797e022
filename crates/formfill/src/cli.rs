use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::{self, forms::FormsArgs, run::RunArgs};

#[derive(Parser, Debug)]
#[command(
    name = "formfill",
    about = "Fill out a questionnaire, keep every submission, export a PDF",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a question set, collect answers, persist and export the submission
    Run(RunArgs),
    /// List previously saved submissions
    Forms(FormsArgs),
}

pub async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => cmd::run::run(args).await,
        Commands::Forms(args) => cmd::forms::run(args).await,
    }
}
