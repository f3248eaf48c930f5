use super::package::resolve_path;
use super::read_entry;
use crate::error::ImageError;
use crate::html::ImageResolver;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// Resolves chapter image references against the entries of an EPUB.
///
/// A reference is tried relative to the chapter document first and then
/// relative to the package root with leading `../` removed, which covers
/// both `../images/x.png` and `images/x.png` style references.
pub(crate) struct ArchiveImageResolver<'z, R> {
    archive: &'z mut ZipArchive<R>,
    chapter_dir: &'z str,
    root_dir: &'z str,
}

impl<'z, R: Read + Seek> ArchiveImageResolver<'z, R> {
    pub(crate) fn new(archive: &'z mut ZipArchive<R>, chapter_dir: &'z str, root_dir: &'z str) -> Self {
        Self {
            archive,
            chapter_dir,
            root_dir,
        }
    }

    fn candidates(&self, src: &str) -> Vec<String> {
        let mut candidates = vec![resolve_path(self.chapter_dir, src)];
        let from_root = resolve_path(self.root_dir, src.trim_start_matches("../"));
        if !candidates.contains(&from_root) {
            candidates.push(from_root);
        }
        candidates
    }
}

impl<'z, R: Read + Seek> ImageResolver for ArchiveImageResolver<'z, R> {
    fn resolve(&mut self, src: &str) -> Result<Vec<u8>, ImageError> {
        for path in self.candidates(src.trim()) {
            match read_entry(self.archive, &path) {
                Ok(Some(data)) => return Ok(data),
                Ok(None) => {}
                Err(e) => {
                    return Err(ImageError::Unreadable {
                        path,
                        reason: e.to_string(),
                    })
                }
            }
        }
        Err(ImageError::Missing(src.to_string()))
    }
}
