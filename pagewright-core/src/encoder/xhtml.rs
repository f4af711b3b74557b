//! Page document rendering

use super::STYLESHEET_FILE;
use crate::types::{ContentBlock, ContentRole, PageArtifact};

/// Paragraph emitted when a page has no blocks at all
pub const NO_TEXT_FALLBACK: &str = "No text content found on this page.";

/// A rendered page document
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    /// File name of the page document
    pub file_name: String,

    /// Complete XHTML document
    pub xhtml: String,

    /// Image file names referenced by the document, in order
    pub image_names: Vec<String>,
}

/// Renders page artifacts into XHTML 1.1 documents
#[derive(Debug, Clone)]
pub struct PageRenderer {
    language: String,
}

impl PageRenderer {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    /// Render one page
    pub fn render(&self, page: &PageArtifact) -> RenderedPage {
        let number = page.number();
        let mut body = String::new();

        let (footers, blocks): (Vec<&ContentBlock>, Vec<&ContentBlock>) = page
            .blocks
            .iter()
            .partition(|block| block.role == ContentRole::Footer);

        if page.blocks.is_empty() {
            body.push_str(&format!("<p>{}</p>\n", NO_TEXT_FALLBACK));
        }

        for block in blocks {
            body.push_str(&self.block_to_xhtml(block));
        }

        let mut image_names = Vec::with_capacity(page.images.len());
        for (i, image) in page.images.iter().enumerate() {
            body.push_str(&format!(
                "<div class=\"page-image\"><img src=\"{}\" alt=\"Image {} of page {}\"/></div>\n",
                escape_xml(&image.file_name),
                i + 1,
                number
            ));
            image_names.push(image.file_name.clone());
        }

        // The merger guarantees at most one footer; it always closes the page
        for footer in footers {
            body.push_str(&self.block_to_xhtml(footer));
        }

        RenderedPage {
            file_name: page.document_name(),
            xhtml: self.wrap_document(&format!("Page {}", number), &body),
            image_names,
        }
    }

    /// Convert a single block to XHTML
    fn block_to_xhtml(&self, block: &ContentBlock) -> String {
        let text = escape_xml(&block.text);
        match block.role {
            ContentRole::Title => format!("<h1 class=\"title\">{}</h1>\n", text),
            ContentRole::Author => format!("<h2 class=\"author\">{}</h2>\n", text),
            ContentRole::Heading => format!("<h3>{}</h3>\n", text),
            ContentRole::Paragraph => format!("<p>{}</p>\n", text),
            ContentRole::Footer => format!("<footer>{}</footer>\n", text),
        }
    }

    fn wrap_document(&self, title: &str, body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">
<html xmlns="http://www.w3.org/1999/xhtml" xml:lang="{}">
<head>
<meta http-equiv="Content-Type" content="application/xhtml+xml; charset=utf-8"/>
<title>{}</title>
<link rel="stylesheet" type="text/css" href="{}"/>
</head>
<body>
{}</body>
</html>
"#,
            escape_xml(&self.language),
            escape_xml(title),
            STYLESHEET_FILE,
            body
        )
    }
}

impl Default for PageRenderer {
    fn default() -> Self {
        Self::new("en")
    }
}

/// Escape the five XML-significant characters
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageAsset;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("A & B <C>"), "A &amp; B &lt;C&gt;");
        assert_eq!(escape_xml(r#"say "hi" it's"#), "say &quot;hi&quot; it&#x27;s");
    }

    #[test]
    fn test_role_elements() {
        let renderer = PageRenderer::default();
        let page = PageArtifact::new(
            0,
            vec![
                ContentBlock::new(ContentRole::Title, "T"),
                ContentBlock::new(ContentRole::Author, "A"),
                ContentBlock::new(ContentRole::Heading, "H"),
                ContentBlock::paragraph("P"),
                ContentBlock::new(ContentRole::Footer, "F"),
            ],
        );
        let rendered = renderer.render(&page);
        let xhtml = &rendered.xhtml;

        assert!(xhtml.contains("<h1 class=\"title\">T</h1>"));
        assert!(xhtml.contains("<h2 class=\"author\">A</h2>"));
        assert!(xhtml.contains("<h3>H</h3>"));
        assert!(xhtml.contains("<p>P</p>"));
        assert!(xhtml.contains("<footer>F</footer>"));
        assert!(!xhtml.contains(NO_TEXT_FALLBACK));
        assert_eq!(rendered.file_name, "page1.xhtml");
    }

    #[test]
    fn test_footer_after_images() {
        let renderer = PageRenderer::default();
        let page = PageArtifact::new(
            1,
            vec![
                ContentBlock::paragraph("Body"),
                ContentBlock::new(ContentRole::Footer, "2"),
            ],
        )
        .with_images(vec![ImageAsset::for_page(1, 0, vec![0])]);

        let rendered = renderer.render(&page);
        let img = rendered.xhtml.find("<img").unwrap();
        let footer = rendered.xhtml.find("<footer>").unwrap();
        assert!(img < footer);
        assert!(rendered
            .xhtml
            .contains(r#"<img src="page2_image1.png" alt="Image 1 of page 2"/>"#));
        assert_eq!(rendered.image_names, vec!["page2_image1.png"]);
    }

    #[test]
    fn test_empty_page_fallback() {
        let renderer = PageRenderer::default();
        let rendered = renderer.render(&PageArtifact::new(4, Vec::new()));
        assert!(rendered
            .xhtml
            .contains(&format!("<p>{}</p>", NO_TEXT_FALLBACK)));
        assert!(rendered.image_names.is_empty());
        assert_eq!(rendered.file_name, "page5.xhtml");
    }

    #[test]
    fn test_escapes_once() {
        let renderer = PageRenderer::default();
        let page = PageArtifact::new(0, vec![ContentBlock::paragraph("A & B <C>")]);
        let first = renderer.render(&page);
        let second = renderer.render(&page);
        assert_eq!(first, second);
        assert!(first.xhtml.contains("<p>A &amp; B &lt;C&gt;</p>"));
        assert!(!first.xhtml.contains("&amp;amp;"));
    }

    #[test]
    fn test_document_shell() {
        let rendered = PageRenderer::new("fr").render(&PageArtifact::new(0, Vec::new()));
        assert!(rendered
            .xhtml
            .starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(rendered
            .xhtml
            .contains(r#"xmlns="http://www.w3.org/1999/xhtml" xml:lang="fr""#));
        assert!(rendered.xhtml.contains(r#"href="styles.css""#));
        assert!(rendered.xhtml.contains("<title>Page 1</title>"));
    }
}
