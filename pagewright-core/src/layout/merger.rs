//! Paragraph merging

use crate::types::{ClassifiedRun, ContentBlock, ContentRole};

/// Reduce classified runs into content blocks.
///
/// Consecutive paragraph runs are joined into one block. Only the last footer
/// run of a page survives, and it is always emitted as the final block.
pub fn merge_blocks<I>(runs: I) -> Vec<ContentBlock>
where
    I: IntoIterator<Item = ClassifiedRun>,
{
    let mut merger = BlockMerger::new();
    for run in runs {
        merger.push(run);
    }
    merger.finish()
}

/// Streaming accumulator behind [`merge_blocks`]
#[derive(Debug, Default)]
pub struct BlockMerger {
    blocks: Vec<ContentBlock>,
    paragraph: String,
    footer: Option<String>,
}

impl BlockMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next run in page order
    pub fn push(&mut self, run: ClassifiedRun) {
        match run.role {
            ContentRole::Paragraph => {
                if !self.paragraph.is_empty() && !self.paragraph.ends_with(char::is_whitespace) {
                    self.paragraph.push(' ');
                }
                self.paragraph.push_str(&run.text);
            }
            ContentRole::Footer => {
                self.flush_paragraph();
                self.footer = Some(run.text);
            }
            role => {
                self.flush_paragraph();
                self.blocks.push(ContentBlock::new(role, run.text));
            }
        }
    }

    /// Flush pending state and return the page's blocks
    pub fn finish(mut self) -> Vec<ContentBlock> {
        self.flush_paragraph();
        if let Some(footer) = self.footer.take() {
            self.blocks.push(ContentBlock::new(ContentRole::Footer, footer));
        }
        self.blocks
    }

    fn flush_paragraph(&mut self) {
        if !self.paragraph.is_empty() {
            let text = std::mem::take(&mut self.paragraph);
            self.blocks.push(ContentBlock::paragraph(text));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(text: &str) -> ClassifiedRun {
        ClassifiedRun::new(ContentRole::Paragraph, text)
    }

    #[test]
    fn test_paragraphs_join_with_single_space() {
        let blocks = merge_blocks(vec![p("Hello"), p("world")]);
        assert_eq!(blocks, vec![ContentBlock::paragraph("Hello world")]);

        let blocks = merge_blocks(vec![p("Hello "), p("world")]);
        assert_eq!(blocks, vec![ContentBlock::paragraph("Hello world")]);
    }

    #[test]
    fn test_non_paragraph_flushes() {
        let blocks = merge_blocks(vec![
            p("one"),
            ClassifiedRun::new(ContentRole::Heading, "Section"),
            p("two"),
            p("three"),
        ]);
        assert_eq!(
            blocks,
            vec![
                ContentBlock::paragraph("one"),
                ContentBlock::new(ContentRole::Heading, "Section"),
                ContentBlock::paragraph("two three"),
            ]
        );
    }

    #[test]
    fn test_last_footer_wins_and_goes_last() {
        let blocks = merge_blocks(vec![
            ClassifiedRun::new(ContentRole::Footer, "page 1"),
            ClassifiedRun::new(ContentRole::Title, "Title"),
            p("body"),
            ClassifiedRun::new(ContentRole::Footer, "page 1 of 9"),
            p("more"),
        ]);
        assert_eq!(
            blocks,
            vec![
                ContentBlock::new(ContentRole::Title, "Title"),
                ContentBlock::paragraph("body"),
                ContentBlock::paragraph("more"),
                ContentBlock::new(ContentRole::Footer, "page 1 of 9"),
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_blocks(Vec::new()).is_empty());
    }
}
