//! List command implementation

use anyhow::{Context, Result};
use novelistic_core::{JsonFileStore, NovelStore};
use serde::Serialize;

/// One row of the novel listing
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NovelRow {
    id: Option<u64>,
    title: String,
    author: Option<String>,
    episodes: usize,
}

/// List stored novels with their episode counts
pub async fn list(store: &JsonFileStore, json: bool) -> Result<()> {
    let novels = store.list_novels().await.context("Failed to read the library")?;

    let mut rows = Vec::with_capacity(novels.len());
    for novel in novels {
        let episodes = match novel.id {
            Some(id) => store.list_episodes(id).await?.len(),
            None => 0,
        };
        rows.push(NovelRow {
            id: novel.id.map(|id| id.0),
            author: novel.author().map(str::to_string),
            title: novel.title,
            episodes,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No novels in {}", store.path().display());
        return Ok(());
    }
    for row in &rows {
        let id = row.id.map(|id| id.to_string()).unwrap_or_default();
        match &row.author {
            Some(author) => println!("{:>4}  {} by {} ({} episodes)", id, row.title, author, row.episodes),
            None => println!("{:>4}  {} ({} episodes)", id, row.title, row.episodes),
        }
    }

    Ok(())
}
