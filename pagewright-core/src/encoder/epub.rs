//! In-memory EPUB 2 package model
//!
//! Pages are registered one at a time as the pipeline produces them. The
//! model keeps them keyed by page index, so registration is a structural
//! merge: a repeated index is ignored and other pages are never touched.
//! The package (OPF) and navigation (NCX) documents are generated once, from
//! the finished model, by [`EpubDocument::serialize`].

use super::{
    content_path, media_type_for, CONTAINER_PATH, EPUB_MIMETYPE, MIMETYPE_PATH, NCX_FILE,
    PACKAGE_PATH, STYLESHEET, STYLESHEET_FILE,
};
use crate::error::{ConversionError, Result};
use crate::types::{page_document_id, EpubMetadata};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::{BTreeMap, HashSet};
use std::io::Cursor;

// XML Namespaces
const NS_OPF: &str = "http://www.idpf.org/2007/opf";
const NS_DC: &str = "http://purl.org/dc/elements/1.1/";
const NS_NCX: &str = "http://www.daisy.org/z3986/2005/ncx/";

/// Manifest id of the navigation document, referenced by the spine's `toc`
const NCX_ID: &str = "ncx";

/// Manifest id of the shared stylesheet
const STYLESHEET_ID: &str = "css";

/// Element id carrying the book identifier
const UID_ELEMENT_ID: &str = "BookId";

/// Fixed container descriptor pointing at the package document
pub const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

/// A file registered in the package manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub id: String,
    pub href: String,
    pub media_type: String,
}

impl ManifestEntry {
    pub fn new(id: impl Into<String>, href: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            href: href.into(),
            media_type: media_type.into(),
        }
    }

    /// Entry for a content file, with the id derived from its name
    fn for_file(file_name: &str) -> Self {
        Self::new(manifest_id(file_name), file_name, media_type_for(file_name))
    }
}

/// A navigation map entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavPoint {
    pub id: String,
    pub play_order: usize,
    pub label: String,
    pub content_href: String,
}

/// Text of the three generated package files
#[derive(Debug, Clone, PartialEq)]
pub struct SerializedPackage {
    /// `META-INF/container.xml`
    pub container: String,

    /// `OEBPS/content.opf`
    pub package: String,

    /// `OEBPS/toc.ncx`
    pub navigation: String,
}

impl SerializedPackage {
    /// Archive paths paired with their contents
    pub fn files(&self) -> [(String, &str); 3] {
        [
            (CONTAINER_PATH.to_string(), self.container.as_str()),
            (PACKAGE_PATH.to_string(), self.package.as_str()),
            (content_path(NCX_FILE), self.navigation.as_str()),
        ]
    }
}

#[derive(Debug, Clone)]
struct RegisteredPage {
    document: ManifestEntry,
    images: Vec<ManifestEntry>,
}

/// The EPUB package being assembled
#[derive(Debug, Clone)]
pub struct EpubDocument {
    metadata: EpubMetadata,
    scaffold: Vec<ManifestEntry>,
    pages: BTreeMap<usize, RegisteredPage>,
}

impl EpubDocument {
    /// Create the fixed scaffold: navigation and stylesheet entries, with an
    /// empty spine and navigation map
    pub fn initialize(metadata: EpubMetadata) -> Self {
        let scaffold = vec![
            ManifestEntry::new(NCX_ID, NCX_FILE, media_type_for(NCX_FILE)),
            ManifestEntry::new(STYLESHEET_ID, STYLESHEET_FILE, media_type_for(STYLESHEET_FILE)),
        ];

        Self {
            metadata,
            scaffold,
            pages: BTreeMap::new(),
        }
    }

    pub fn metadata(&self) -> &EpubMetadata {
        &self.metadata
    }

    /// Files that exist before any page is processed, as archive paths
    pub fn scaffold_files(&self) -> Vec<(String, Vec<u8>)> {
        vec![
            (MIMETYPE_PATH.to_string(), EPUB_MIMETYPE.as_bytes().to_vec()),
            (CONTAINER_PATH.to_string(), CONTAINER_XML.as_bytes().to_vec()),
            (content_path(STYLESHEET_FILE), STYLESHEET.as_bytes().to_vec()),
        ]
    }

    /// Register a page document and its images.
    ///
    /// Returns `false` when the page index was already registered, in which
    /// case nothing changes.
    pub fn register_page(
        &mut self,
        page_index: usize,
        page_file_name: &str,
        image_names: &[String],
    ) -> bool {
        if self.pages.contains_key(&page_index) {
            tracing::debug!("Page {} already registered, skipping", page_index + 1);
            return false;
        }

        let document = ManifestEntry::new(
            page_document_id(page_index),
            page_file_name,
            media_type_for(page_file_name),
        );

        let mut seen = HashSet::new();
        let images = image_names
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .map(|name| ManifestEntry::for_file(name))
            .collect();

        self.pages
            .insert(page_index, RegisteredPage { document, images });
        true
    }

    /// Whether a page index has been registered
    pub fn is_registered(&self, page_index: usize) -> bool {
        self.pages.contains_key(&page_index)
    }

    /// Number of registered pages
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Manifest entries in creation order
    pub fn manifest(&self) -> Vec<ManifestEntry> {
        let mut entries = self.scaffold.clone();
        for page in self.pages.values() {
            entries.push(page.document.clone());
            entries.extend(page.images.iter().cloned());
        }
        entries
    }

    /// Spine item references in reading order
    pub fn spine(&self) -> Vec<String> {
        self.pages
            .values()
            .map(|page| page.document.id.clone())
            .collect()
    }

    /// Navigation points in play order
    pub fn nav_points(&self) -> Vec<NavPoint> {
        self.pages
            .iter()
            .enumerate()
            .map(|(position, (index, page))| NavPoint {
                id: format!("navPoint-{}", position + 1),
                play_order: position + 1,
                label: format!("Page {}", index + 1),
                content_href: page.document.href.clone(),
            })
            .collect()
    }

    /// Check manifest, spine, and navigation consistency
    pub fn validate(&self) -> Result<()> {
        if self.pages.is_empty() {
            return Err(ConversionError::EmptyDocument);
        }

        let manifest = self.manifest();
        let mut ids = HashSet::new();
        for entry in &manifest {
            if !ids.insert(entry.id.as_str()) {
                return Err(ConversionError::InvariantViolation(format!(
                    "duplicate manifest id '{}'",
                    entry.id
                )));
            }
            if entry.id == MIMETYPE_PATH || entry.href == MIMETYPE_PATH {
                return Err(ConversionError::InvariantViolation(
                    "mimetype must not appear in the manifest".to_string(),
                ));
            }
        }

        let spine = self.spine();
        if spine.len() != self.pages.len() {
            return Err(ConversionError::InvariantViolation(format!(
                "spine has {} entries for {} pages",
                spine.len(),
                self.pages.len()
            )));
        }
        if let Some(missing) = spine.iter().find(|id| !ids.contains(id.as_str())) {
            return Err(ConversionError::InvariantViolation(format!(
                "spine references unknown manifest id '{}'",
                missing
            )));
        }

        for (expected, point) in (1..).zip(self.nav_points()) {
            if point.play_order != expected {
                return Err(ConversionError::InvariantViolation(format!(
                    "navigation play order {} where {} was expected",
                    point.play_order, expected
                )));
            }
        }

        Ok(())
    }

    /// Validate the model and generate the container, package, and
    /// navigation documents
    pub fn serialize(&self) -> Result<SerializedPackage> {
        self.validate()?;
        Ok(SerializedPackage {
            container: CONTAINER_XML.to_string(),
            package: into_string(self.render_package()?)?,
            navigation: into_string(self.render_navigation()?)?,
        })
    }

    /// Render the OPF package document
    fn render_package(&self) -> std::result::Result<Vec<u8>, quick_xml::Error> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut package = BytesStart::new("package");
        package.push_attribute(("xmlns", NS_OPF));
        package.push_attribute(("unique-identifier", UID_ELEMENT_ID));
        package.push_attribute(("version", "2.0"));
        writer.write_event(Event::Start(package))?;

        // Metadata
        let mut metadata = BytesStart::new("metadata");
        metadata.push_attribute(("xmlns:dc", NS_DC));
        metadata.push_attribute(("xmlns:opf", NS_OPF));
        writer.write_event(Event::Start(metadata))?;

        write_text_element(&mut writer, BytesStart::new("dc:title"), &self.metadata.title)?;

        let mut creator = BytesStart::new("dc:creator");
        creator.push_attribute(("opf:role", "aut"));
        write_text_element(&mut writer, creator, &self.metadata.author)?;

        write_text_element(
            &mut writer,
            BytesStart::new("dc:language"),
            &self.metadata.language,
        )?;

        let mut identifier = BytesStart::new("dc:identifier");
        identifier.push_attribute(("id", UID_ELEMENT_ID));
        identifier.push_attribute(("opf:scheme", "UUID"));
        write_text_element(&mut writer, identifier, &self.metadata.urn())?;

        write_text_element(
            &mut writer,
            BytesStart::new("dc:date"),
            &self.metadata.date.format("%Y-%m-%d").to_string(),
        )?;

        writer.write_event(Event::End(BytesEnd::new("metadata")))?;

        // Manifest
        writer.write_event(Event::Start(BytesStart::new("manifest")))?;
        for entry in self.manifest() {
            let mut item = BytesStart::new("item");
            item.push_attribute(("id", entry.id.as_str()));
            item.push_attribute(("href", entry.href.as_str()));
            item.push_attribute(("media-type", entry.media_type.as_str()));
            writer.write_event(Event::Empty(item))?;
        }
        writer.write_event(Event::End(BytesEnd::new("manifest")))?;

        // Spine
        let mut spine = BytesStart::new("spine");
        spine.push_attribute(("toc", NCX_ID));
        writer.write_event(Event::Start(spine))?;
        for idref in self.spine() {
            let mut itemref = BytesStart::new("itemref");
            itemref.push_attribute(("idref", idref.as_str()));
            writer.write_event(Event::Empty(itemref))?;
        }
        writer.write_event(Event::End(BytesEnd::new("spine")))?;

        writer.write_event(Event::End(BytesEnd::new("package")))?;
        Ok(writer.into_inner().into_inner())
    }

    /// Render the NCX navigation document
    fn render_navigation(&self) -> std::result::Result<Vec<u8>, quick_xml::Error> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut ncx = BytesStart::new("ncx");
        ncx.push_attribute(("xmlns", NS_NCX));
        ncx.push_attribute(("version", "2005-1"));
        writer.write_event(Event::Start(ncx))?;

        // Head
        writer.write_event(Event::Start(BytesStart::new("head")))?;
        let urn = self.metadata.urn();
        for (name, content) in [
            ("dtb:uid", urn.as_str()),
            ("dtb:depth", "1"),
            ("dtb:totalPageCount", "0"),
            ("dtb:maxPageNumber", "0"),
        ] {
            let mut meta = BytesStart::new("meta");
            meta.push_attribute(("name", name));
            meta.push_attribute(("content", content));
            writer.write_event(Event::Empty(meta))?;
        }
        writer.write_event(Event::End(BytesEnd::new("head")))?;

        write_labelled(&mut writer, "docTitle", &self.metadata.title)?;
        write_labelled(&mut writer, "docAuthor", &self.metadata.author)?;

        // Navigation map
        writer.write_event(Event::Start(BytesStart::new("navMap")))?;
        for point in self.nav_points() {
            let play_order = point.play_order.to_string();
            let mut nav_point = BytesStart::new("navPoint");
            nav_point.push_attribute(("id", point.id.as_str()));
            nav_point.push_attribute(("playOrder", play_order.as_str()));
            writer.write_event(Event::Start(nav_point))?;

            write_labelled(&mut writer, "navLabel", &point.label)?;

            let mut content = BytesStart::new("content");
            content.push_attribute(("src", point.content_href.as_str()));
            writer.write_event(Event::Empty(content))?;

            writer.write_event(Event::End(BytesEnd::new("navPoint")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("navMap")))?;

        writer.write_event(Event::End(BytesEnd::new("ncx")))?;
        Ok(writer.into_inner().into_inner())
    }
}

/// Manifest id for a file name; `.` is not a valid id character
pub fn manifest_id(file_name: &str) -> String {
    file_name.replace('.', "_")
}

/// Write `<start>content</name>`
fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    start: BytesStart<'_>,
    content: &str,
) -> std::result::Result<(), quick_xml::Error> {
    let end = BytesEnd::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(content)))?;
    writer.write_event(Event::End(end))?;
    Ok(())
}

/// Write `<name><text>content</text></name>`
fn write_labelled<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    content: &str,
) -> std::result::Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    write_text_element(writer, BytesStart::new("text"), content)?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn into_string(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|e| ConversionError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn metadata() -> EpubMetadata {
        EpubMetadata::new("A & B", "Jane Doe", "en")
            .with_identifier(Uuid::parse_str("12345678-1234-1234-1234-123456789abc").unwrap())
            .with_date(chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
    }

    fn images(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_initialize_scaffold() {
        let doc = EpubDocument::initialize(metadata());
        let ids: Vec<_> = doc.manifest().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["ncx", "css"]);
        assert!(doc.spine().is_empty());
        assert!(doc.nav_points().is_empty());

        let files = doc.scaffold_files();
        assert_eq!(files[0].0, "mimetype");
        assert_eq!(files[0].1, b"application/epub+zip");
    }

    #[test]
    fn test_register_page() {
        let mut doc = EpubDocument::initialize(metadata());
        assert!(doc.register_page(0, "page1.xhtml", &images(&["page1_image1.png"])));

        let manifest = doc.manifest();
        assert_eq!(
            manifest[2],
            ManifestEntry::new("page1", "page1.xhtml", "application/xhtml+xml")
        );
        assert_eq!(
            manifest[3],
            ManifestEntry::new("page1_image1_png", "page1_image1.png", "image/png")
        );
        assert_eq!(doc.spine(), vec!["page1"]);

        let nav = doc.nav_points();
        assert_eq!(nav.len(), 1);
        assert_eq!(nav[0].play_order, 1);
        assert_eq!(nav[0].label, "Page 1");
        assert_eq!(nav[0].content_href, "page1.xhtml");
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut once = EpubDocument::initialize(metadata());
        once.register_page(0, "page1.xhtml", &images(&["page1_image1.png"]));

        let mut twice = EpubDocument::initialize(metadata());
        assert!(twice.register_page(0, "page1.xhtml", &images(&["page1_image1.png"])));
        assert!(!twice.register_page(0, "page1.xhtml", &images(&["page1_image1.png"])));

        assert_eq!(once.manifest(), twice.manifest());
        assert_eq!(once.spine(), twice.spine());
        assert_eq!(once.nav_points(), twice.nav_points());
    }

    #[test]
    fn test_registration_keeps_other_pages() {
        let mut doc = EpubDocument::initialize(metadata());
        doc.register_page(1, "page2.xhtml", &[]);
        doc.register_page(0, "page1.xhtml", &[]);
        doc.register_page(2, "page3.xhtml", &[]);
        doc.register_page(1, "other.xhtml", &[]);

        assert_eq!(doc.spine(), vec!["page1", "page2", "page3"]);
        let hrefs: Vec<_> = doc.nav_points().into_iter().map(|p| p.content_href).collect();
        assert_eq!(hrefs, vec!["page1.xhtml", "page2.xhtml", "page3.xhtml"]);
    }

    #[test]
    fn test_skipped_page_keeps_play_order_contiguous() {
        let mut doc = EpubDocument::initialize(metadata());
        doc.register_page(0, "page1.xhtml", &[]);
        doc.register_page(2, "page3.xhtml", &[]);

        let nav = doc.nav_points();
        assert_eq!(nav[1].play_order, 2);
        assert_eq!(nav[1].label, "Page 3");
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_duplicate_image_names_collapse() {
        let mut doc = EpubDocument::initialize(metadata());
        doc.register_page(0, "page1.xhtml", &images(&["a.png", "a.png"]));
        assert_eq!(doc.manifest().len(), 4);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty() {
        let doc = EpubDocument::initialize(metadata());
        assert!(matches!(doc.validate(), Err(ConversionError::EmptyDocument)));
    }

    #[test]
    fn test_validate_rejects_colliding_ids() {
        let mut doc = EpubDocument::initialize(metadata());
        // An image named like the stylesheet id collides with the scaffold
        doc.register_page(0, "page1.xhtml", &images(&["css"]));
        assert!(matches!(
            doc.validate(),
            Err(ConversionError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_mimetype_in_manifest() {
        let mut doc = EpubDocument::initialize(metadata());
        doc.register_page(0, "page1.xhtml", &images(&["mimetype"]));
        assert!(matches!(
            doc.validate(),
            Err(ConversionError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_serialize_package() {
        let mut doc = EpubDocument::initialize(metadata());
        doc.register_page(0, "page1.xhtml", &images(&["page1_image1.png"]));
        doc.register_page(1, "page2.xhtml", &[]);

        let package = doc.serialize().unwrap();
        let opf = &package.package;
        assert!(opf.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(opf.contains(r#"unique-identifier="BookId""#));
        assert!(opf.contains("<dc:title>A &amp; B</dc:title>"));
        assert!(opf.contains(r#"<dc:creator opf:role="aut">Jane Doe</dc:creator>"#));
        assert!(opf.contains("<dc:language>en</dc:language>"));
        assert!(opf.contains("urn:uuid:12345678-1234-1234-1234-123456789abc</dc:identifier>"));
        assert!(opf.contains("<dc:date>2024-05-01</dc:date>"));
        assert!(opf.contains(
            r#"<item id="page1_image1_png" href="page1_image1.png" media-type="image/png"/>"#
        ));
        assert!(opf.contains(r#"<spine toc="ncx">"#));

        let first = opf.find(r#"<itemref idref="page1"/>"#).unwrap();
        let second = opf.find(r#"<itemref idref="page2"/>"#).unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_serialize_navigation() {
        let mut doc = EpubDocument::initialize(metadata());
        doc.register_page(0, "page1.xhtml", &[]);
        doc.register_page(1, "page2.xhtml", &[]);

        let ncx = doc.serialize().unwrap().navigation;
        assert!(ncx.contains(
            r#"<meta name="dtb:uid" content="urn:uuid:12345678-1234-1234-1234-123456789abc"/>"#
        ));
        assert!(ncx.contains("<text>A &amp; B</text>"));
        assert!(ncx.contains("<text>Jane Doe</text>"));
        assert!(ncx.contains(r#"<navPoint id="navPoint-2" playOrder="2">"#));
        assert!(ncx.contains(r#"<content src="page2.xhtml"/>"#));
    }

    #[test]
    fn test_serialized_files() {
        let mut doc = EpubDocument::initialize(metadata());
        doc.register_page(0, "page1.xhtml", &[]);
        let package = doc.serialize().unwrap();
        let paths: Vec<_> = package.files().iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(
            paths,
            vec!["META-INF/container.xml", "OEBPS/content.opf", "OEBPS/toc.ncx"]
        );
        assert!(package.container.contains(r#"full-path="OEBPS/content.opf""#));
    }
}
