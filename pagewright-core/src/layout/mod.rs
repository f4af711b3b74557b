//! Turning raw text runs into typed content blocks

mod classifier;
mod merger;

pub use classifier::{ContentClassifier, Predicate, Rule};
pub use merger::{merge_blocks, BlockMerger};

use crate::types::{ContentBlock, TextRun};

/// Classify and merge the runs of one page
pub fn page_blocks(
    classifier: &ContentClassifier,
    runs: &[TextRun],
    page_height: f32,
) -> Vec<ContentBlock> {
    merge_blocks(classifier.classify_page(runs, page_height))
}
