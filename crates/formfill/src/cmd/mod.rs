pub mod forms;
pub mod run;

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;

/// Data directory holding the saved-form file and the image store.
pub(crate) fn resolve_data_dir(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    let dirs = ProjectDirs::from("", "", "formfill")
        .context("no home directory available to place the data dir")?;
    Ok(dirs.data_dir().to_path_buf())
}
