//! Validate command implementation

use anyhow::{bail, Context, Result};
use pagewright_core::encoder::{CONTENT_DIR, MIMETYPE_PATH};
use pagewright_core::{inspect_archive, ArchiveReport};
use std::path::Path;

const META_INF_PREFIX: &str = "META-INF/";

/// Validate the container structure of an EPUB file
pub fn validate(input: &str, strict: bool) -> Result<()> {
    let input_path = Path::new(input);
    if !input_path.is_file() {
        bail!("Input file not found: {}", input);
    }

    let report = inspect_archive(input_path)
        .with_context(|| format!("Failed to read archive: {}", input))?;

    let mut problems = report.problems();
    if strict {
        problems.extend(layout_problems(&report));
    }

    if problems.is_empty() {
        println!("Valid EPUB file");
        println!("  Entries: {}", report.entries.len());
        Ok(())
    } else {
        for problem in &problems {
            eprintln!("  - {}", problem);
        }
        bail!("Validation failed for {} ({} problems)", input, problems.len());
    }
}

/// Entries outside `mimetype`, `META-INF/` and the content directory
fn layout_problems(report: &ArchiveReport) -> Vec<String> {
    let content_prefix = format!("{}/", CONTENT_DIR);
    report
        .entries
        .iter()
        .filter(|e| {
            e.name != MIMETYPE_PATH
                && !e.name.starts_with(META_INF_PREFIX)
                && !e.name.starts_with(&content_prefix)
        })
        .map(|e| format!("unexpected entry {}", e.name))
        .collect()
}
