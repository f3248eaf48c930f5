//! Import and export between EPUB files and a [`NovelStore`]

use crate::decoder::EpubDecoder;
use crate::encoder::{generate_epub, generate_epub_with, EpubFile, ExportOptions};
use crate::error::{Result, ValidationError};
use crate::storage::NovelStore;
use crate::types::{Episode, ImageIssue, Novel, NovelId};
use std::path::{Path, PathBuf};

/// A novel stored from an EPUB
#[derive(Debug, Clone)]
pub struct ImportedNovel {
    /// The stored novel, with its id set
    pub novel: Novel,

    /// The stored episodes in spine order, with ids set
    pub episodes: Vec<Episode>,

    /// Images that could not be resolved
    pub issues: Vec<ImageIssue>,
}

/// An archive written to disk
#[derive(Debug, Clone)]
pub struct SavedEpub {
    pub path: PathBuf,
    pub issues: Vec<ImageIssue>,
}

/// Reject file names that do not end in `.epub` (any case)
pub fn validate_file_name(file_name: &str) -> Result<()> {
    let is_epub = Path::new(file_name)
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("epub"));
    if is_epub {
        Ok(())
    } else {
        Err(ValidationError::InvalidFileType(file_name.to_string()).into())
    }
}

/// Title used when the caller supplies none: the file name without extension
fn default_title(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().trim().to_string())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| file_name.to_string())
}

/// Import an EPUB into `store`.
///
/// The archive is decoded completely before anything is stored. The novel
/// is saved first and its episodes after it, one at a time in spine order.
/// If an episode cannot be saved the novel is deleted again and the storage
/// error is returned.
pub async fn upload_novel<S>(
    store: &S,
    file_name: &str,
    data: &[u8],
    title: Option<&str>,
) -> Result<ImportedNovel>
where
    S: NovelStore + ?Sized,
{
    validate_file_name(file_name)?;
    let book = EpubDecoder::new().decode(data)?;

    let title = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_title(file_name));
    let mut novel = Novel::new(title).with_author(book.author);
    let novel_id = store.save_novel(&novel).await?;
    novel.id = Some(novel_id);

    let mut episodes = Vec::with_capacity(book.chapters.len());
    for chapter in book.chapters {
        let mut episode = Episode::new(novel_id, chapter.title, chapter.content, chapter.order);
        match store.save_episode(&episode).await {
            Ok(id) => episode.id = Some(id),
            Err(error) => {
                tracing::warn!(
                    "Saving episode {} of {} failed, removing the novel",
                    chapter.order,
                    file_name
                );
                if let Err(cleanup) = store.delete_novel(novel_id).await {
                    tracing::warn!("Could not remove novel {}: {}", novel_id, cleanup);
                }
                return Err(error.into());
            }
        }
        episodes.push(episode);
    }

    tracing::info!(
        "Imported \"{}\" as novel {} with {} episode(s)",
        novel.title,
        novel_id,
        episodes.len()
    );
    Ok(ImportedNovel {
        novel,
        episodes,
        issues: book.issues,
    })
}

/// Import an EPUB file from disk, see [`upload_novel`]
pub async fn upload_novel_file<S>(
    store: &S,
    path: impl AsRef<Path>,
    title: Option<&str>,
) -> Result<ImportedNovel>
where
    S: NovelStore + ?Sized,
{
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    validate_file_name(&file_name)?;

    let data = tokio::fs::read(path).await?;
    upload_novel(store, &file_name, &data, title).await
}

/// Export a stored novel with its episodes
pub async fn export_novel<S>(store: &S, novel_id: NovelId, options: &ExportOptions) -> Result<EpubFile>
where
    S: NovelStore + ?Sized,
{
    let novel = store.get_novel(novel_id).await?;
    let episodes = store.list_episodes(novel_id).await?;
    generate_epub_with(&novel, &episodes, options)
}

/// Export a novel into `dir` under its suggested file name
pub async fn download_novel(novel: &Novel, episodes: &[Episode], dir: impl AsRef<Path>) -> Result<SavedEpub> {
    let epub = generate_epub(novel, episodes)?;
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir).await?;

    let path = dir.join(&epub.file_name);
    tokio::fs::write(&path, &epub.data).await?;
    tracing::info!("Saved {}", path.display());

    Ok(SavedEpub {
        path,
        issues: epub.issues,
    })
}
