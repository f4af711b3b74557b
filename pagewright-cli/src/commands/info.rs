//! Info command implementation

use super::load_options;
use anyhow::{bail, Context, Result};
use pagewright_core::pipeline::PageSummary;
use pagewright_core::{analyze_document, ContentRole, DocumentAnalysis, PdfiumSource};
use serde::Serialize;
use std::path::Path;

/// Document info output
#[derive(Serialize)]
struct DocumentInfo {
    file: String,
    pages: usize,
    readable_pages: usize,
    detected_title: Option<String>,
    titles: usize,
    headings: usize,
    paragraphs: usize,
    footers: usize,
    page_details: Vec<PageSummary>,
}

impl DocumentInfo {
    fn new(file: &str, analysis: DocumentAnalysis) -> Self {
        let count = |role: ContentRole| {
            analysis
                .pages
                .iter()
                .flat_map(|p| p.blocks.iter())
                .filter(|b| b.role == role)
                .count()
        };

        Self {
            file: file.to_string(),
            pages: analysis.page_count,
            readable_pages: analysis.readable_pages(),
            detected_title: analysis.detected_title().map(str::to_string),
            titles: count(ContentRole::Title),
            headings: count(ContentRole::Heading),
            paragraphs: count(ContentRole::Paragraph),
            footers: count(ContentRole::Footer),
            page_details: analysis.pages,
        }
    }
}

/// Display how the pages of a PDF classify
pub fn info(input: &str, json: bool, config: Option<&str>) -> Result<()> {
    let input_path = Path::new(input);
    if !input_path.is_file() {
        bail!("Input file not found: {}", input);
    }

    let options = load_options(config)?;
    let source = PdfiumSource::bind().context("Failed to load the pdfium library")?;
    let analysis = analyze_document(&source, input_path, &options.classifier)
        .with_context(|| format!("Failed to analyze {}", input))?;

    let info = DocumentInfo::new(input, analysis);

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("File:        {}", info.file);
        println!("Pages:       {} ({} readable)", info.pages, info.readable_pages);
        if let Some(title) = &info.detected_title {
            println!("Title:       {}", title);
        }
        println!("Titles:      {}", info.titles);
        println!("Headings:    {}", info.headings);
        println!("Paragraphs:  {}", info.paragraphs);
        println!("Footers:     {}", info.footers);
    }

    Ok(())
}
