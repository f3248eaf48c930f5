//! Batch export command implementation

use anyhow::{bail, Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use novelistic_core::{generate_epub, Episode, JsonFileStore, Novel, NovelStore};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Export every stored novel into `output_dir`
pub async fn batch(store: &JsonFileStore, output_dir: &Path, jobs: usize) -> Result<()> {
    // Ensure output directory exists
    fs::create_dir_all(output_dir)?;

    let novels = store.list_novels().await.context("Failed to read the library")?;
    if novels.is_empty() {
        println!("No novels in {}", store.path().display());
        return Ok(());
    }

    // Storage is async; load everything before handing off to the thread pool
    let mut work = Vec::with_capacity(novels.len());
    for novel in novels {
        let Some(id) = novel.id else { continue };
        let episodes = store.list_episodes(id).await?;
        work.push((novel, episodes));
    }
    let targets = output_files(&work, output_dir);

    println!("Found {} novels to export", work.len());

    // Set up progress tracking
    let multi_progress = MultiProgress::new();
    let overall_pb = multi_progress.add(ProgressBar::new(work.len() as u64));
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")?
            .progress_chars("##-"),
    );

    let success_count = AtomicUsize::new(0);
    let error_count = AtomicUsize::new(0);

    // Configure thread pool
    rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build_global()
        .ok(); // Ignore if already configured

    // Encode in parallel
    work.par_iter()
        .zip(targets.par_iter())
        .for_each(|((novel, episodes), target)| {
            match process_novel(novel, episodes, target) {
                Ok(()) => {
                    success_count.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    error_count.fetch_add(1, Ordering::Relaxed);
                    tracing::error!("Failed to export {:?}: {:#}", novel.title, e);
                }
            }

            overall_pb.inc(1);
        });

    overall_pb.finish();

    let success = success_count.load(Ordering::Relaxed);
    let errors = error_count.load(Ordering::Relaxed);

    println!("\nBatch export complete:");
    println!("  Success: {}", success);
    println!("  Errors:  {}", errors);

    if errors > 0 {
        bail!("Batch export completed with {} errors", errors);
    }

    Ok(())
}

/// One output file per novel; clashing file names get the novel id appended
fn output_files(work: &[(Novel, Vec<Episode>)], output_dir: &Path) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    work.iter()
        .map(|(novel, _)| {
            let file_name = novelistic_core::suggested_file_name(&novel.title);
            let file_name = if seen.insert(file_name.clone()) {
                file_name
            } else {
                let stem = file_name.trim_end_matches(".epub");
                let id = novel.id.map(|id| id.to_string()).unwrap_or_default();
                format!("{}-{}.epub", stem, id)
            };
            output_dir.join(file_name)
        })
        .collect()
}

fn process_novel(novel: &Novel, episodes: &[Episode], output_file: &Path) -> Result<()> {
    let epub = generate_epub(novel, episodes)?;
    for issue in &epub.issues {
        tracing::warn!("{}: image skipped in {}", novel.title, issue);
    }

    fs::write(output_file, &epub.data)
        .with_context(|| format!("Failed to write {}", output_file.display()))?;

    tracing::info!("Exported {:?} -> {:?}", novel.title, output_file);

    Ok(())
}
