//! Import command implementation

use anyhow::{Context, Result};
use novelistic_core::{upload_novel_file, JsonFileStore};
use serde::Serialize;
use std::path::Path;

/// Import summary output
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportSummary {
    novel_id: Option<u64>,
    title: String,
    author: Option<String>,
    episodes: usize,
    issues: Vec<String>,
}

/// Import an EPUB file into the library
pub async fn import(store: &JsonFileStore, input: &Path, title: Option<&str>, json: bool) -> Result<()> {
    let imported = upload_novel_file(store, input, title)
        .await
        .with_context(|| format!("Failed to import {}", input.display()))?;

    let summary = ImportSummary {
        novel_id: imported.novel.id.map(|id| id.0),
        title: imported.novel.title.clone(),
        author: imported.novel.author().map(str::to_string),
        episodes: imported.episodes.len(),
        issues: imported.issues.iter().map(ToString::to_string).collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    match summary.novel_id {
        Some(id) => println!("Imported novel {}: {}", id, summary.title),
        None => println!("Imported: {}", summary.title),
    }
    if let Some(author) = &summary.author {
        println!("  Author:   {}", author);
    }
    println!("  Episodes: {}", summary.episodes);
    for issue in &summary.issues {
        println!("  Warning:  {}", issue);
    }

    Ok(())
}
