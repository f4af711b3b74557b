//! The per-document conversion pipeline
//!
//! One run owns one working tree and one EPUB model. Pages are processed in
//! order; a page that cannot be read is skipped and an image that cannot be
//! written is dropped, but anything else stops the run. The working tree is
//! removed however the run ends.

use crate::config::{ClassifierThresholds, ConversionOptions};
use crate::decoder::{PdfSource, SourceDocument};
use crate::encoder::{content_path, page_image, ArchivePacker, EpubDocument, PageRenderer};
use crate::error::{ConversionError, Result};
use crate::layout::{page_blocks, ContentClassifier};
use crate::storage::WorkingTree;
use crate::types::{ContentBlock, ImageAsset, PageArtifact};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Share of the progress range spent on pages; packaging takes the rest
const PAGE_PROGRESS_SHARE: f32 = 0.8;

/// Where a pipeline run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Loading,
    Scaffolding,
    ProcessingPages(usize),
    Packaging,
    Done,
    Failed,
}

/// Receives fractional progress in `[0, 1]`
pub trait ProgressSink {
    fn report(&self, fraction: f32);
}

impl<F: Fn(f32)> ProgressSink for F {
    fn report(&self, fraction: f32) {
        self(fraction)
    }
}

/// Discards progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _fraction: f32) {}
}

/// Forwards progress over a channel so another task can consume it
#[derive(Debug, Clone)]
pub struct ChannelProgress(UnboundedSender<f32>);

impl ChannelProgress {
    pub fn new(sender: UnboundedSender<f32>) -> Self {
        Self(sender)
    }
}

impl ProgressSink for ChannelProgress {
    fn report(&self, fraction: f32) {
        // A closed receiver only means nobody is watching anymore
        let _ = self.0.send(fraction);
    }
}

/// Shared cancellation request, checked at every page boundary
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Converts one PDF into one EPUB
pub struct ConversionPipeline<'s> {
    source: &'s dyn PdfSource,
    options: ConversionOptions,
    classifier: ContentClassifier,
    progress: Box<dyn ProgressSink + 's>,
    cancel: CancelFlag,
    work_dir: Option<PathBuf>,
    state: PipelineState,
    last_progress: f32,
}

impl<'s> ConversionPipeline<'s> {
    pub fn new(source: &'s dyn PdfSource) -> Self {
        let options = ConversionOptions::default();
        Self {
            source,
            classifier: ContentClassifier::new(&options.classifier),
            options,
            progress: Box::new(NoProgress),
            cancel: CancelFlag::new(),
            work_dir: None,
            state: PipelineState::Idle,
            last_progress: 0.0,
        }
    }

    pub fn with_options(mut self, options: ConversionOptions) -> Self {
        self.classifier = ContentClassifier::new(&options.classifier);
        self.options = options;
        self
    }

    pub fn with_progress(mut self, progress: impl ProgressSink + 's) -> Self {
        self.progress = Box::new(progress);
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Create working trees under `dir` instead of the system temp directory
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Convert `input` into an EPUB at `output`
    pub fn run(&mut self, input: &Path, output: &Path) -> Result<PathBuf> {
        self.last_progress = 0.0;

        match self.options.validate().and_then(|_| self.execute(input, output)) {
            Ok(path) => {
                self.transition(PipelineState::Done);
                tracing::info!("Converted {} -> {}", input.display(), path.display());
                Ok(path)
            }
            Err(e) => {
                self.transition(PipelineState::Failed);
                tracing::error!("Conversion of {} failed: {}", input.display(), e);
                Err(e)
            }
        }
    }

    fn execute(&mut self, input: &Path, output: &Path) -> Result<PathBuf> {
        self.transition(PipelineState::Loading);
        let source = self.source;
        let document = source
            .open(input)
            .map_err(|e| ConversionError::DocumentLoadFailed(e.to_string()))?;
        let page_count = document.page_count();
        tracing::debug!("Loaded {} ({} pages)", input.display(), page_count);

        self.transition(PipelineState::Scaffolding);
        let tree = match &self.work_dir {
            Some(dir) => WorkingTree::create_in(dir)?,
            None => WorkingTree::create()?,
        };
        let mut model = EpubDocument::initialize(self.options.metadata_for(input));
        for (path, data) in model.scaffold_files() {
            tree.write(&path, &data)?;
        }

        // The tree is dropped, and removed, on every early return below
        self.process_pages(document.as_ref(), page_count, &tree, &mut model)?;

        self.transition(PipelineState::Packaging);
        let package = model.serialize()?;
        for (path, text) in package.files() {
            tree.write(&path, text.as_bytes())?;
        }
        let written = ArchivePacker::new().pack(tree.root(), output)?;
        // The archive is already in place; a leftover temp dir is not a failure
        if let Err(e) = tree.close() {
            tracing::warn!("Failed to remove working tree: {}", e);
        }
        self.report(1.0);

        Ok(written)
    }

    fn process_pages(
        &mut self,
        document: &dyn SourceDocument,
        page_count: usize,
        tree: &WorkingTree,
        model: &mut EpubDocument,
    ) -> Result<()> {
        let renderer = PageRenderer::new(self.options.language.clone());

        for index in 0..page_count {
            if self.cancel.is_cancelled() {
                tracing::warn!("Cancelled before page {}", index + 1);
                return Err(ConversionError::Cancelled);
            }
            self.transition(PipelineState::ProcessingPages(index));

            match self.build_page(document, index) {
                Ok(artifact) => {
                    let artifact = self.write_images(artifact, tree);
                    let rendered = renderer.render(&artifact);
                    tree.write(&content_path(&rendered.file_name), rendered.xhtml.as_bytes())?;
                    model.register_page(index, &rendered.file_name, &rendered.image_names);
                }
                Err(e) if e.is_recoverable() => {
                    tracing::warn!("Skipping page: {}", e);
                }
                Err(e) => return Err(e),
            }

            self.report((index + 1) as f32 / page_count as f32 * PAGE_PROGRESS_SHARE);
        }

        Ok(())
    }

    /// Extract, classify, and rasterize one page
    fn build_page(&self, document: &dyn SourceDocument, index: usize) -> Result<PageArtifact> {
        let page = document
            .page(index)
            .ok_or_else(|| ConversionError::PageUnreadable {
                page: index + 1,
                reason: "page could not be opened".to_string(),
            })?;
        let runs = page
            .text_runs()
            .map_err(|e| ConversionError::PageUnreadable {
                page: index + 1,
                reason: e.to_string(),
            })?;
        let blocks = page_blocks(&self.classifier, &runs, page.height());

        let mut images = Vec::new();
        if self.options.render_images {
            let encoded = page
                .render_bitmap()
                .map_err(|e| ConversionError::ImageWriteFailed {
                    file_name: ImageAsset::for_page(index, 0, Vec::new()).file_name,
                    reason: e.to_string(),
                })
                .and_then(|bitmap| page_image(index, 0, &bitmap));
            match encoded {
                Ok(image) => images.push(image),
                Err(e) if e.is_recoverable() => tracing::warn!("Dropping image: {}", e),
                Err(e) => return Err(e),
            }
        }

        Ok(PageArtifact::new(index, blocks).with_images(images))
    }

    /// Move image bytes into the tree, keeping only the ones that landed
    fn write_images(&self, mut artifact: PageArtifact, tree: &WorkingTree) -> PageArtifact {
        artifact.images.retain(|image| {
            match tree.write(&content_path(&image.file_name), &image.bytes) {
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!("Dropping image {}: {}", image.file_name, e);
                    false
                }
            }
        });
        artifact
    }

    fn transition(&mut self, state: PipelineState) {
        tracing::debug!("Pipeline {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Forward progress, clamped to `[0, 1]` and never decreasing
    fn report(&mut self, fraction: f32) {
        let value = fraction.clamp(0.0, 1.0).max(self.last_progress);
        self.last_progress = value;
        self.progress.report(value);
    }
}

/// Convert with default progress and cancellation handling
pub fn convert(
    source: &dyn PdfSource,
    input: &Path,
    output: &Path,
    options: ConversionOptions,
) -> Result<PathBuf> {
    ConversionPipeline::new(source)
        .with_options(options)
        .run(input, output)
}

/// Classification result for one page
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PageSummary {
    /// 1-based page number
    pub page: usize,
    pub readable: bool,
    pub blocks: Vec<ContentBlock>,
}

/// Classification result for a whole document
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DocumentAnalysis {
    pub page_count: usize,
    pub pages: Vec<PageSummary>,
}

impl DocumentAnalysis {
    pub fn readable_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.readable).count()
    }

    /// Text of the first title block, if any page has one
    pub fn detected_title(&self) -> Option<&str> {
        self.pages
            .iter()
            .flat_map(|p| p.blocks.iter())
            .find(|b| b.role == crate::types::ContentRole::Title)
            .map(|b| b.text.as_str())
    }
}

/// Classify and merge every page without writing anything
pub fn analyze_document(
    source: &dyn PdfSource,
    input: &Path,
    thresholds: &ClassifierThresholds,
) -> Result<DocumentAnalysis> {
    let document = source
        .open(input)
        .map_err(|e| ConversionError::DocumentLoadFailed(e.to_string()))?;
    let classifier = ContentClassifier::new(thresholds);
    let page_count = document.page_count();

    let pages = (0..page_count)
        .map(|index| {
            let blocks = document.page(index).and_then(|page| {
                page.text_runs()
                    .ok()
                    .map(|runs| page_blocks(&classifier, &runs, page.height()))
            });
            PageSummary {
                page: index + 1,
                readable: blocks.is_some(),
                blocks: blocks.unwrap_or_default(),
            }
        })
        .collect();

    Ok(DocumentAnalysis { page_count, pages })
}
