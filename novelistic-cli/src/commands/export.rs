//! Export command implementation

use anyhow::{Context, Result};
use novelistic_core::{export_novel, ExportOptions, JsonFileStore, NovelId};
use std::path::{Path, PathBuf};

/// Export a stored novel to an EPUB file
pub async fn export(
    store: &JsonFileStore,
    novel_id: NovelId,
    output: Option<&Path>,
    language: String,
) -> Result<()> {
    let options = ExportOptions {
        language,
        ..ExportOptions::default()
    };
    let epub = export_novel(store, novel_id, &options)
        .await
        .with_context(|| format!("Failed to export novel {}", novel_id))?;

    let output_file = output_path(output, &epub.file_name);
    if let Some(parent) = output_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&output_file, &epub.data)
        .await
        .with_context(|| format!("Failed to write {}", output_file.display()))?;

    for issue in &epub.issues {
        tracing::warn!("Image skipped in {}", issue);
    }
    println!("Wrote {}", output_file.display());

    Ok(())
}

/// A directory (or nothing) gets the suggested file name appended
fn output_path(output: Option<&Path>, file_name: &str) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(file_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(file_name),
    }
}
