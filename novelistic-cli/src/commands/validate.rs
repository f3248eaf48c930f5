//! Validate command implementation

use anyhow::{bail, Context, Result};
use novelistic_core::check_archive;
use std::path::Path;

/// Check the container structure of an EPUB file
pub fn validate(input: &Path, json: bool) -> Result<()> {
    let data = std::fs::read(input)
        .with_context(|| format!("Failed to open input file: {}", input.display()))?;
    let report = check_archive(&data);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.is_valid() {
        println!("Valid EPUB file");
        if let Some(path) = &report.package_path {
            println!("  Package:  {}", path);
        }
        println!("  Manifest: {} items", report.manifest_items);
        println!("  Spine:    {} items", report.spine_items);
    } else {
        eprintln!("Invalid EPUB file: {} issue(s)", report.issues.len());
        for issue in &report.issues {
            eprintln!("  - {}", issue);
        }
    }

    if !report.is_valid() {
        bail!("Validation failed for {}", input.display());
    }
    Ok(())
}
