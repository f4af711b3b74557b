//! Convert command implementation

use super::OptionArgs;
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use pagewright_core::decoder::is_pdf_path;
use pagewright_core::{CancelFlag, ChannelProgress, ConversionPipeline, PdfiumSource};
use std::path::{Path, PathBuf};

/// Arguments of `pagewright convert`
pub struct ConvertArgs {
    pub input: String,
    pub output: Option<String>,
    pub options: OptionArgs,
}

/// Output path used when none is given
pub fn default_output(input: &Path) -> PathBuf {
    input.with_extension("epub")
}

/// Convert a PDF into an EPUB
///
/// The pipeline runs on a blocking worker. Progress comes back over a channel
/// and drives the progress bar from this task; Ctrl-C requests cancellation,
/// which the pipeline honours at the next page boundary.
pub async fn convert(args: ConvertArgs) -> Result<()> {
    let input = PathBuf::from(&args.input);
    if !input.is_file() {
        bail!("Input file not found: {}", args.input);
    }
    if !is_pdf_path(&input) {
        bail!("Input must be a .pdf file: {}", args.input);
    }

    let options = args.options.resolve()?;
    let output = args
        .output
        .map(PathBuf::from)
        .unwrap_or_else(|| default_output(&input));

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}% {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("##-"),
    );
    pb.set_message(format!("Converting {}", input.display()));

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<f32>();
    let progress_bar = pb.clone();
    let progress_task = tokio::spawn(async move {
        while let Some(fraction) = rx.recv().await {
            progress_bar.set_position((fraction * 100.0).round() as u64);
        }
    });

    let cancel = CancelFlag::new();
    let interrupt = cancel.clone();
    let interrupt_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current page");
            interrupt.cancel();
        }
    });

    let job_input = input.clone();
    let job_output = output.clone();
    let result = tokio::task::spawn_blocking(move || -> pagewright_core::Result<PathBuf> {
        let source = PdfiumSource::bind()?.with_image_width(options.image_width);
        let result = ConversionPipeline::new(&source)
            .with_options(options)
            .with_progress(ChannelProgress::new(tx))
            .with_cancel_flag(cancel)
            .run(&job_input, &job_output);
        result
    })
    .await
    .context("Conversion task failed to complete")?;

    interrupt_task.abort();
    // The sender is gone once the worker returns, so this drains and ends
    progress_task.await.ok();

    match result {
        Ok(path) => {
            pb.finish_with_message(format!("Converted {} -> {}", input.display(), path.display()));
            Ok(())
        }
        Err(e) => {
            pb.abandon_with_message("Conversion failed");
            Err(e).with_context(|| format!("Failed to convert {}", input.display()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output() {
        assert_eq!(
            default_output(Path::new("/books/report.pdf")),
            PathBuf::from("/books/report.epub")
        );
        assert_eq!(default_output(Path::new("a.b.pdf")), PathBuf::from("a.b.epub"));
    }
}
