//! Import tests for novelistic-core
//!
//! These tests import hand-built archives that do not come from our own
//! exporter, and check how import interacts with storage.
//!
//! ## Test Strategy
//!
//! 1. **Validation**: bad file names are rejected before any storage call
//! 2. **Fatal structure errors**: nothing is stored for a broken package
//! 3. **Foreign layouts**: other directory layouts, cover and nav pages
//! 4. **Images**: unresolved references are kept and reported
//! 5. **Rollback**: a failed episode save removes the novel again

use async_trait::async_trait;
use novelistic_core::{
    upload_novel, EpisodeId, Episode, FormatError, ImageError, MemoryStore, Novel, NovelId,
    NovelStore, NovelisticError, StorageError, StorageResult, ValidationError,
};
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

// =============================================================================
// Helpers
// =============================================================================

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-data";

fn container(package_path: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="{package_path}" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#
    )
}

fn package(manifest: &str, spine: &str, guide: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="id">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="id">foreign-1</dc:identifier>
    <dc:title>Foreign Book</dc:title>
    <dc:creator>Jo Writer</dc:creator>
  </metadata>
  <manifest>
{manifest}
  </manifest>
  {spine}
  {guide}
</package>"#
    )
}

fn chapter(title: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>{title}</title></head><body>{body}</body></html>"#
    )
}

/// Build an archive from `(path, content)` pairs, mimetype first
fn build_epub(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();
    for (path, content) in entries {
        zip.start_file(*path, SimpleFileOptions::default()).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// A two-chapter book laid out like a typical OEBPS export
fn simple_epub() -> Vec<u8> {
    let opf = package(
        r#"    <item id="c1" href="text/one.xhtml" media-type="application/xhtml+xml"/>
    <item id="c2" href="text/two.xhtml" media-type="application/xhtml+xml"/>"#,
        r#"<spine><itemref idref="c1"/><itemref idref="c2"/></spine>"#,
        "",
    );
    build_epub(&[
        ("META-INF/container.xml", container("OEBPS/content.opf").as_bytes()),
        ("OEBPS/content.opf", opf.as_bytes()),
        ("OEBPS/text/one.xhtml", chapter("One", "<p>first</p>").as_bytes()),
        ("OEBPS/text/two.xhtml", chapter("Two", "<p>second</p>").as_bytes()),
    ])
}

/// Counts every call it forwards to a [`MemoryStore`] and can fail episode
/// saves after a number of successes
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    calls: AtomicUsize,
    fail_episode_after: Option<usize>,
    episodes_saved: AtomicUsize,
}

impl CountingStore {
    fn failing_after(episodes: usize) -> Self {
        Self {
            fail_episode_after: Some(episodes),
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl NovelStore for CountingStore {
    async fn save_novel(&self, novel: &Novel) -> StorageResult<NovelId> {
        self.count();
        self.inner.save_novel(novel).await
    }

    async fn save_episode(&self, episode: &Episode) -> StorageResult<EpisodeId> {
        self.count();
        let saved = self.episodes_saved.fetch_add(1, Ordering::SeqCst);
        if self.fail_episode_after.is_some_and(|limit| saved >= limit) {
            return Err(StorageError::BackendError("disk full".to_string()));
        }
        self.inner.save_episode(episode).await
    }

    async fn get_novel(&self, id: NovelId) -> StorageResult<Novel> {
        self.count();
        self.inner.get_novel(id).await
    }

    async fn list_novels(&self) -> StorageResult<Vec<Novel>> {
        self.count();
        self.inner.list_novels().await
    }

    async fn get_episode(&self, id: EpisodeId) -> StorageResult<Episode> {
        self.count();
        self.inner.get_episode(id).await
    }

    async fn list_episodes(&self, novel_id: NovelId) -> StorageResult<Vec<Episode>> {
        self.count();
        self.inner.list_episodes(novel_id).await
    }

    async fn delete_episode(&self, id: EpisodeId) -> StorageResult<()> {
        self.count();
        self.inner.delete_episode(id).await
    }

    async fn delete_novel(&self, id: NovelId) -> StorageResult<()> {
        self.count();
        self.inner.delete_novel(id).await
    }
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_wrong_extension_touches_no_storage() {
    let store = CountingStore::default();
    let result = upload_novel(&store, "notes.txt", &simple_epub(), None).await;

    assert!(matches!(
        result,
        Err(NovelisticError::Validation(ValidationError::InvalidFileType(_)))
    ));
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_simple_import() {
    let store = MemoryStore::new();
    let imported = upload_novel(&store, "foreign.EPUB", &simple_epub(), None)
        .await
        .unwrap();

    assert_eq!(imported.novel.title, "foreign");
    assert_eq!(imported.novel.author(), Some("Jo Writer"));
    let episodes = store.list_episodes(imported.novel.id.unwrap()).await.unwrap();
    let summary: Vec<_> = episodes
        .iter()
        .map(|e| (e.title.as_str(), e.content.as_str(), e.order))
        .collect();
    assert_eq!(summary, [("One", "<p>first</p>", 0), ("Two", "<p>second</p>", 1)]);
}

#[tokio::test]
async fn test_explicit_title_wins() {
    let store = MemoryStore::new();
    let imported = upload_novel(&store, "file.epub", &simple_epub(), Some("  Chosen  "))
        .await
        .unwrap();
    assert_eq!(imported.novel.title, "Chosen");
}

// =============================================================================
// Fatal Structure Errors
// =============================================================================

#[tokio::test]
async fn test_not_a_zip_is_fatal() {
    let store = CountingStore::default();
    let result = upload_novel(&store, "broken.epub", b"definitely not a zip", None).await;

    assert!(matches!(
        result,
        Err(NovelisticError::Format(FormatError::InvalidArchive(_)))
    ));
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_missing_container_is_fatal() {
    let store = CountingStore::default();
    let data = build_epub(&[("OEBPS/content.opf", "<package/>".as_bytes())]);
    let result = upload_novel(&store, "book.epub", &data, None).await;

    assert!(matches!(
        result,
        Err(NovelisticError::Format(FormatError::MissingContainer))
    ));
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_missing_spine_is_fatal() {
    let store = CountingStore::default();
    let opf = package(
        r#"    <item id="c1" href="one.xhtml" media-type="application/xhtml+xml"/>"#,
        "",
        "",
    );
    let data = build_epub(&[
        ("META-INF/container.xml", container("content.opf").as_bytes()),
        ("content.opf", opf.as_bytes()),
        ("one.xhtml", chapter("One", "<p>x</p>").as_bytes()),
    ]);
    let result = upload_novel(&store, "book.epub", &data, None).await;

    assert!(matches!(
        result,
        Err(NovelisticError::Format(FormatError::MissingSpine))
    ));
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_unknown_spine_item_is_fatal() {
    let store = CountingStore::default();
    let opf = package(
        r#"    <item id="c1" href="one.xhtml" media-type="application/xhtml+xml"/>"#,
        r#"<spine><itemref idref="c1"/><itemref idref="ghost"/></spine>"#,
        "",
    );
    let data = build_epub(&[
        ("META-INF/container.xml", container("content.opf").as_bytes()),
        ("content.opf", opf.as_bytes()),
        ("one.xhtml", chapter("One", "<p>x</p>").as_bytes()),
    ]);
    let result = upload_novel(&store, "book.epub", &data, None).await;

    match result {
        Err(NovelisticError::Format(FormatError::UnknownSpineItem(idref))) => assert_eq!(idref, "ghost"),
        other => panic!("expected UnknownSpineItem, got {:?}", other.map(|i| i.novel)),
    }
    assert_eq!(store.calls(), 0);
}

// =============================================================================
// Foreign Layouts
// =============================================================================

#[tokio::test]
async fn test_package_at_root_with_cover_and_nav() {
    let opf = package(
        r#"    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="cover" href="cover.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch" href="chapter.xhtml" media-type="application/xhtml+xml"/>
    <item id="aside" href="aside.xhtml" media-type="application/xhtml+xml"/>
    <item id="pic" href="images/x.png" media-type="image/png"/>"#,
        r#"<spine><itemref idref="cover"/><itemref idref="nav"/><itemref idref="ch"/><itemref idref="aside" linear="no"/></spine>"#,
        "",
    );
    let data = build_epub(&[
        ("META-INF/container.xml", container("content.opf").as_bytes()),
        ("content.opf", opf.as_bytes()),
        ("nav.xhtml", chapter("Contents", "<nav><ol></ol></nav>").as_bytes()),
        ("cover.xhtml", chapter("Cover", "<img src=\"images/x.png\"/>").as_bytes()),
        (
            "chapter.xhtml",
            chapter("The Only Chapter", "<p>Look <img src=\"images/x.png\" alt=\"x\"/></p>").as_bytes(),
        ),
        ("aside.xhtml", chapter("Aside", "<p>skipped</p>").as_bytes()),
        ("images/x.png", PNG),
    ]);

    let store = MemoryStore::new();
    let imported = upload_novel(&store, "root.epub", &data, None).await.unwrap();

    assert_eq!(imported.episodes.len(), 1);
    let episode = &imported.episodes[0];
    assert_eq!(episode.title, "The Only Chapter");
    assert!(episode.content.starts_with("<p>Look <img alt=\"x\" src=\"data:image/png;base64,"));
    assert!(imported.issues.is_empty());
}

#[tokio::test]
async fn test_guide_cover_is_skipped() {
    let opf = package(
        r#"    <item id="title-page" href="Text/title.xhtml" media-type="application/xhtml+xml"/>
    <item id="c1" href="Text/c1.xhtml" media-type="application/xhtml+xml"/>"#,
        r#"<spine><itemref idref="title-page"/><itemref idref="c1"/></spine>"#,
        r#"<guide><reference type="cover" title="Cover" href="Text/title.xhtml"/></guide>"#,
    );
    let data = build_epub(&[
        ("META-INF/container.xml", container("OPS/book.opf").as_bytes()),
        ("OPS/book.opf", opf.as_bytes()),
        ("OPS/Text/title.xhtml", chapter("Cover", "<p>cover</p>").as_bytes()),
        ("OPS/Text/c1.xhtml", chapter("Real", "<p>story</p>").as_bytes()),
    ]);

    let store = MemoryStore::new();
    let imported = upload_novel(&store, "guide.epub", &data, None).await.unwrap();
    let titles: Vec<_> = imported.episodes.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["Real"]);
}

#[tokio::test]
async fn test_html_and_untyped_chapters_are_imported() {
    let opf = package(
        r#"    <item id="c1" href="c1.html" media-type="text/html"/>
    <item id="c2" href="c2.xhtml"/>
    <item id="css" href="style.css" media-type="text/css"/>"#,
        r#"<spine><itemref idref="c1"/><itemref idref="c2"/><itemref idref="css"/></spine>"#,
        "",
    );
    let data = build_epub(&[
        ("META-INF/container.xml", container("content.opf").as_bytes()),
        ("content.opf", opf.as_bytes()),
        ("c1.html", chapter("Plain HTML", "<p>one</p>").as_bytes()),
        ("c2.xhtml", chapter("Untyped", "<p>two</p>").as_bytes()),
        ("style.css", "p { margin: 0; }".as_bytes()),
    ]);

    let store = MemoryStore::new();
    let imported = upload_novel(&store, "loose.epub", &data, None).await.unwrap();
    let summary: Vec<_> = imported
        .episodes
        .iter()
        .map(|e| (e.title.as_str(), e.content.as_str(), e.order))
        .collect();
    assert_eq!(
        summary,
        [("Plain HTML", "<p>one</p>", 0), ("Untyped", "<p>two</p>", 1)]
    );
}

#[tokio::test]
async fn test_missing_chapter_file_is_skipped() {
    let opf = package(
        r#"    <item id="c1" href="one.xhtml" media-type="application/xhtml+xml"/>
    <item id="c2" href="gone.xhtml" media-type="application/xhtml+xml"/>
    <item id="c3" href="three.xhtml" media-type="application/xhtml+xml"/>"#,
        r#"<spine><itemref idref="c1"/><itemref idref="c2"/><itemref idref="c3"/></spine>"#,
        "",
    );
    let data = build_epub(&[
        ("META-INF/container.xml", container("content.opf").as_bytes()),
        ("content.opf", opf.as_bytes()),
        ("one.xhtml", chapter("One", "<p>1</p>").as_bytes()),
        ("three.xhtml", chapter("Three", "<p>3</p>").as_bytes()),
    ]);

    let store = MemoryStore::new();
    let imported = upload_novel(&store, "holes.epub", &data, None).await.unwrap();
    let summary: Vec<_> = imported
        .episodes
        .iter()
        .map(|e| (e.title.as_str(), e.order))
        .collect();
    assert_eq!(summary, [("One", 0), ("Three", 1)]);
}

// =============================================================================
// Images
// =============================================================================

#[tokio::test]
async fn test_missing_image_is_reported_not_fatal() {
    let opf = package(
        r#"    <item id="c1" href="text/one.xhtml" media-type="application/xhtml+xml"/>
    <item id="lost" href="images/lost.png" media-type="image/png"/>"#,
        r#"<spine><itemref idref="c1"/></spine>"#,
        "",
    );
    let data = build_epub(&[
        ("META-INF/container.xml", container("OEBPS/content.opf").as_bytes()),
        ("OEBPS/content.opf", opf.as_bytes()),
        (
            "OEBPS/text/one.xhtml",
            chapter("One", "<p><img src=\"../images/lost.png\" alt=\"lost\"/></p>").as_bytes(),
        ),
    ]);

    let store = MemoryStore::new();
    let imported = upload_novel(&store, "lost.epub", &data, None).await.unwrap();

    assert_eq!(imported.episodes.len(), 1);
    assert!(imported.episodes[0].content.contains("src=\"../images/lost.png\""));
    assert_eq!(imported.issues.len(), 1);
    assert_eq!(imported.issues[0].chapter, 1);
    assert_eq!(imported.issues[0].reference, "../images/lost.png");
    assert!(matches!(imported.issues[0].error, ImageError::Missing(_)));
}

#[tokio::test]
async fn test_remote_images_are_left_alone() {
    let opf = package(
        r#"    <item id="c1" href="one.xhtml" media-type="application/xhtml+xml"/>"#,
        r#"<spine><itemref idref="c1"/></spine>"#,
        "",
    );
    let data = build_epub(&[
        ("META-INF/container.xml", container("content.opf").as_bytes()),
        ("content.opf", opf.as_bytes()),
        (
            "one.xhtml",
            chapter("One", "<p><img src=\"https://example.com/a.png\" alt=\"\"/></p>").as_bytes(),
        ),
    ]);

    let store = MemoryStore::new();
    let imported = upload_novel(&store, "remote.epub", &data, None).await.unwrap();
    assert!(imported.episodes[0]
        .content
        .contains("src=\"https://example.com/a.png\""));
    assert!(imported.issues.is_empty());
}

// =============================================================================
// Rollback
// =============================================================================

#[tokio::test]
async fn test_failed_episode_save_rolls_back() {
    let store = CountingStore::failing_after(1);
    let result = upload_novel(&store, "book.epub", &simple_epub(), None).await;

    assert!(matches!(
        result,
        Err(NovelisticError::Persistence(StorageError::BackendError(_)))
    ));
    assert!(store.inner.list_novels().await.unwrap().is_empty());
    assert!(store
        .inner
        .list_episodes(NovelId(1))
        .await
        .unwrap()
        .is_empty());
}
