//! Structural verification of EPUB archives

use super::package::{parent_dir, parse_container, parse_package, resolve_path, CONTAINER_PATH};
use super::read_text_entry;
use crate::encoder::EPUB_MIME_TYPE;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::io::{Cursor, Read};
use zip::{CompressionMethod, ZipArchive};

/// A structural problem found by [`check_archive`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CheckIssue {
    InvalidArchive { reason: String },
    MimetypeNotFirst,
    MimetypeCompressed,
    MimetypeContent { found: String },
    MissingContainer,
    InvalidContainer { reason: String },
    MissingPackage { path: String },
    InvalidPackage { reason: String },
    /// A manifest item whose file is not in the archive
    MissingFile { id: String, path: String },
    /// A file under the package root that the manifest does not declare
    UndeclaredFile { path: String },
    UnknownSpineItem { idref: String },
}

impl fmt::Display for CheckIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArchive { reason } => write!(f, "not a zip archive: {}", reason),
            Self::MimetypeNotFirst => write!(f, "mimetype is not the first entry"),
            Self::MimetypeCompressed => write!(f, "mimetype is compressed"),
            Self::MimetypeContent { found } => write!(f, "mimetype contains {:?}", found),
            Self::MissingContainer => write!(f, "missing {}", CONTAINER_PATH),
            Self::InvalidContainer { reason } => write!(f, "invalid container: {}", reason),
            Self::MissingPackage { path } => write!(f, "missing package document {}", path),
            Self::InvalidPackage { reason } => write!(f, "invalid package document: {}", reason),
            Self::MissingFile { id, path } => write!(f, "manifest item {} missing: {}", id, path),
            Self::UndeclaredFile { path } => write!(f, "file not in manifest: {}", path),
            Self::UnknownSpineItem { idref } => write!(f, "spine references unknown item {}", idref),
        }
    }
}

/// Result of [`check_archive`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    /// Package document path, once found
    pub package_path: Option<String>,
    pub manifest_items: usize,
    pub spine_items: usize,
    pub issues: Vec<CheckIssue>,
}

impl CheckReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    fn fail(mut self, issue: CheckIssue) -> Self {
        self.issues.push(issue);
        self
    }
}

/// Verify the container structure of an EPUB.
///
/// Checks the `mimetype` entry, the container descriptor and the package
/// document, and cross-checks manifest, spine and archive entries. Never
/// fails; every problem is reported as a [`CheckIssue`].
pub fn check_archive(data: &[u8]) -> CheckReport {
    let report = CheckReport::default();
    let mut archive = match ZipArchive::new(Cursor::new(data)) {
        Ok(archive) => archive,
        Err(e) => return report.fail(CheckIssue::InvalidArchive { reason: e.to_string() }),
    };

    let mut report = check_mimetype(&mut archive, report);

    let container = match read_text_entry(&mut archive, CONTAINER_PATH) {
        Ok(Some(container)) => container,
        Ok(None) => return report.fail(CheckIssue::MissingContainer),
        Err(e) => return report.fail(CheckIssue::InvalidArchive { reason: e.to_string() }),
    };
    let package_path = match parse_container(&container) {
        Ok(path) => path,
        Err(e) => return report.fail(CheckIssue::InvalidContainer { reason: e.to_string() }),
    };
    report.package_path = Some(package_path.clone());

    let package_xml = match read_text_entry(&mut archive, &package_path) {
        Ok(Some(xml)) => xml,
        Ok(None) => return report.fail(CheckIssue::MissingPackage { path: package_path }),
        Err(e) => return report.fail(CheckIssue::InvalidArchive { reason: e.to_string() }),
    };
    let package = match parse_package(&package_xml, &package_path) {
        Ok(package) => package,
        Err(e) => return report.fail(CheckIssue::InvalidPackage { reason: e.to_string() }),
    };
    report.manifest_items = package.manifest.len();
    report.spine_items = package.spine.len();

    let entries: HashSet<&str> = archive.file_names().collect();
    let root_dir = parent_dir(&package_path);

    let mut items: Vec<_> = package.manifest.values().collect();
    items.sort_by(|a, b| a.id.cmp(&b.id));
    let mut declared = HashSet::with_capacity(items.len());
    for item in items {
        let path = resolve_path(root_dir, &item.href);
        if !entries.contains(path.as_str()) {
            report.issues.push(CheckIssue::MissingFile {
                id: item.id.clone(),
                path: path.clone(),
            });
        }
        declared.insert(path);
    }

    let mut undeclared: Vec<&str> = entries
        .iter()
        .copied()
        .filter(|name| !name.ends_with('/'))
        .filter(|name| *name != "mimetype" && !name.starts_with("META-INF/"))
        .filter(|name| *name != package_path)
        .filter(|name| root_dir.is_empty() || name.starts_with(&format!("{}/", root_dir)))
        .filter(|name| !declared.contains(*name))
        .collect();
    undeclared.sort_unstable();
    report.issues.extend(
        undeclared
            .into_iter()
            .map(|path| CheckIssue::UndeclaredFile { path: path.to_string() }),
    );

    for itemref in &package.spine {
        if !package.manifest.contains_key(&itemref.idref) {
            report.issues.push(CheckIssue::UnknownSpineItem {
                idref: itemref.idref.clone(),
            });
        }
    }

    report
}

fn check_mimetype(archive: &mut ZipArchive<Cursor<&[u8]>>, mut report: CheckReport) -> CheckReport {
    let first_is_mimetype = archive
        .by_index(0)
        .map(|file| file.name() == "mimetype")
        .unwrap_or(false);
    if !first_is_mimetype {
        report.issues.push(CheckIssue::MimetypeNotFirst);
    }

    let Ok(mut file) = archive.by_name("mimetype") else {
        return report;
    };
    if file.compression() != CompressionMethod::Stored {
        report.issues.push(CheckIssue::MimetypeCompressed);
    }
    let mut content = String::new();
    if file.read_to_string(&mut content).is_err() || content != EPUB_MIME_TYPE {
        report.issues.push(CheckIssue::MimetypeContent { found: content });
    }
    report
}
