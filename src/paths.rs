use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Returns the results file: `<output>/results.csv`
pub fn results_path(output: &Path) -> PathBuf {
    output.join("results.csv")
}

/// Returns the debug image directory: `<output>/debug/`
pub fn debug_dir(output: &Path) -> PathBuf {
    output.join("debug")
}

/// Creates the output directory and clears debug images of a previous run.
pub fn prepare_output(output: &Path) -> Result<()> {
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {}", output.display()))?;

    let debug = debug_dir(output);
    if debug.exists() {
        fs::remove_dir_all(&debug)
            .with_context(|| format!("Failed to clear {}", debug.display()))?;
    }
    Ok(())
}
