//! Import of EPUB archives
//!
//! [`EpubDecoder`] turns an archive into chapter titles and HTML with images
//! inlined as data URIs. [`check_archive`] verifies archive structure
//! without decoding content.

mod check;
mod epub;
mod package;
mod resolver;

pub use check::{check_archive, CheckIssue, CheckReport};
pub use epub::{EpubDecoder, ImportedBook, ImportedChapter};
pub use package::{ManifestItem, PackageDocument, SpineItem};

use std::io::{Read, Seek};
use zip::result::ZipError;
use zip::ZipArchive;

/// Upper bound on the buffer reserved up front for one entry
const MAX_PREALLOCATION: u64 = 1 << 24;

/// Read a whole archive entry, `None` if there is no such entry
pub(crate) fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<Option<Vec<u8>>, ZipError> {
    let mut file = match archive.by_name(path) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e),
    };
    let mut data = Vec::with_capacity(initial_capacity(file.size()));
    file.read_to_end(&mut data)?;
    Ok(Some(data))
}

/// Buffer to reserve for an entry whose header declares `size` bytes. The
/// declared size is only a hint and a crafted header may claim anything.
fn initial_capacity(size: u64) -> usize {
    size.min(MAX_PREALLOCATION) as usize
}

/// Read an archive entry as text, dropping a UTF-8 byte order mark
pub(crate) fn read_text_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<Option<String>, ZipError> {
    Ok(read_entry(archive, path)?.map(|data| {
        let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&data);
        String::from_utf8_lossy(data).into_owned()
    }))
}
