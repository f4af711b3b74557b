//! Encoders for page documents, the EPUB package, and the final archive

mod archive;
mod epub;
mod png;
mod xhtml;

pub use archive::{inspect_archive, ArchivePacker, ArchiveReport, EntryInfo};
pub use epub::{EpubDocument, ManifestEntry, NavPoint, SerializedPackage};
pub use png::{encode_png, page_image};
pub use xhtml::{escape_xml, PageRenderer, RenderedPage, NO_TEXT_FALLBACK};

/// Archive path of the mimetype marker
pub const MIMETYPE_PATH: &str = "mimetype";

/// Contents of the mimetype marker, without a trailing newline
pub const EPUB_MIMETYPE: &str = "application/epub+zip";

/// Archive path of the container descriptor
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Directory holding the package, navigation, and content documents
pub const CONTENT_DIR: &str = "OEBPS";

/// Package document path, relative to the archive root
pub const PACKAGE_PATH: &str = "OEBPS/content.opf";

/// Navigation document file name inside [`CONTENT_DIR`]
pub const NCX_FILE: &str = "toc.ncx";

/// Stylesheet file name inside [`CONTENT_DIR`]
pub const STYLESHEET_FILE: &str = "styles.css";

/// Stylesheet linked from every page document
pub const STYLESHEET: &str = r#"body {
    margin: 1em;
    font-family: serif;
    line-height: 1.4;
}

h1.title {
    text-align: center;
    font-size: 1.8em;
    margin: 0.5em 0;
}

h2.author {
    text-align: center;
    font-size: 1.2em;
    font-style: italic;
    margin: 0.25em 0 1em;
}

h3 {
    font-size: 1.1em;
    margin: 1em 0 0.5em;
}

p {
    text-indent: 1em;
    margin: 0 0 0.5em;
}

div.page-image {
    text-align: center;
    margin: 1em 0;
}

div.page-image img {
    max-width: 100%;
}

footer {
    display: block;
    font-size: 0.8em;
    text-align: center;
    color: #666666;
    margin-top: 1em;
}
"#;

/// Path of a content file inside the archive
pub fn content_path(file_name: &str) -> String {
    format!("{}/{}", CONTENT_DIR, file_name)
}

/// Media type for a content file, by extension
pub fn media_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "xhtml" | "html" => "application/xhtml+xml",
        "css" => "text/css",
        "ncx" => "application/x-dtbncx+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
