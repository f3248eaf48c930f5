//! Info command implementation

use anyhow::{Context, Result};
use novelistic_core::{validate_file_name, EpubDecoder};
use serde::Serialize;
use std::path::Path;

/// Book info output
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BookInfo {
    title: Option<String>,
    author: String,
    chapters: Vec<String>,
    missing_chapters: Vec<String>,
    issues: Vec<String>,
}

/// Display information about an EPUB without storing it
pub fn info(input: &Path, json: bool) -> Result<()> {
    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .context("Could not determine input file name")?;
    validate_file_name(&file_name)?;

    let data = std::fs::read(input)
        .with_context(|| format!("Failed to open input file: {}", input.display()))?;
    let book = EpubDecoder::new()
        .decode(&data)
        .with_context(|| format!("Failed to decode {}", input.display()))?;

    let info = BookInfo {
        title: book.title,
        author: book.author,
        chapters: book.chapters.into_iter().map(|c| c.title).collect(),
        missing_chapters: book.missing_chapters,
        issues: book.issues.iter().map(ToString::to_string).collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        if let Some(title) = &info.title {
            println!("Title:    {}", title);
        }
        println!("Author:   {}", info.author);
        println!("Chapters: {}", info.chapters.len());
        for (i, chapter) in info.chapters.iter().enumerate() {
            println!("  {:>3}. {}", i + 1, chapter);
        }
        for missing in &info.missing_chapters {
            println!("Missing:  {}", missing);
        }
        for issue in &info.issues {
            println!("Warning:  {}", issue);
        }
    }

    Ok(())
}
