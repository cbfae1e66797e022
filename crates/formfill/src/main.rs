use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    formfill::cli::main().await
}
