//! Batch conversion command implementation

use super::OptionArgs;
use anyhow::{bail, Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use pagewright_core::decoder::is_pdf_path;
use pagewright_core::{ConversionOptions, ConversionPipeline, PdfiumSource};
use rayon::prelude::*;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

thread_local! {
    // One pdfium binding per worker thread, created on first use
    static SOURCE: RefCell<Option<PdfiumSource>> = const { RefCell::new(None) };
}

/// Convert every PDF in a directory
pub fn batch(input_dir: &str, output_dir: &str, jobs: usize, args: &OptionArgs) -> Result<()> {
    let input_path = Path::new(input_dir);
    let output_path = Path::new(output_dir);

    let options = args.resolve()?;

    let mut files: Vec<PathBuf> = fs::read_dir(input_path)
        .with_context(|| format!("Failed to read input directory: {}", input_dir))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_pdf_path(p))
        .collect();
    files.sort();

    if files.is_empty() {
        println!("No PDF files found in {}", input_dir);
        return Ok(());
    }

    // Ensure output directory exists
    fs::create_dir_all(output_path)?;

    println!("Found {} files to convert", files.len());

    // Set up progress tracking
    let multi_progress = MultiProgress::new();
    let overall_pb = multi_progress.add(ProgressBar::new(files.len() as u64));
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("##-"),
    );

    let success_count = AtomicUsize::new(0);
    let error_count = AtomicUsize::new(0);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("Failed to start worker pool")?;

    // Process files in parallel
    pool.install(|| {
        files.par_iter().for_each(|file_path| {
            match process_file(file_path, output_path, &options) {
                Ok(output) => {
                    success_count.fetch_add(1, Ordering::Relaxed);
                    tracing::info!("Converted {:?} -> {:?}", file_path, output);
                }
                Err(e) => {
                    error_count.fetch_add(1, Ordering::Relaxed);
                    tracing::error!("Failed to convert {:?}: {:#}", file_path, e);
                }
            }

            overall_pb.inc(1);
        });
    });

    overall_pb.finish();

    let success = success_count.load(Ordering::Relaxed);
    let errors = error_count.load(Ordering::Relaxed);

    println!("\nBatch conversion complete:");
    println!("  Success: {}", success);
    println!("  Errors:  {}", errors);

    if errors > 0 {
        bail!("Batch conversion completed with {} errors", errors);
    }

    Ok(())
}

/// Output path for an input PDF inside the output directory
fn output_file(input_path: &Path, output_dir: &Path) -> Result<PathBuf> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .context("Could not determine output filename from input")?;
    Ok(output_dir.join(format!("{}.epub", stem)))
}

fn process_file(
    input_path: &Path,
    output_dir: &Path,
    options: &ConversionOptions,
) -> Result<PathBuf> {
    let output = output_file(input_path, output_dir)?;

    SOURCE.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_none() {
            let source = PdfiumSource::bind().context("Failed to load the pdfium library")?;
            *slot = Some(source.with_image_width(options.image_width));
        }
        let source = slot.as_ref().context("pdfium source unavailable")?;

        let result = ConversionPipeline::new(source)
            .with_options(options.clone())
            .run(input_path, &output);
        result.map_err(anyhow::Error::from)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_file() {
        let out = output_file(Path::new("/in/Annual Report.pdf"), Path::new("/out")).unwrap();
        assert_eq!(out, PathBuf::from("/out/Annual Report.epub"));
    }
}
