//! EPUB archive packing and inspection

use super::{EPUB_MIMETYPE, MIMETYPE_PATH};
use crate::error::{ConversionError, Result};
use crate::storage::collect_files;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Packs a working tree into an EPUB archive
#[derive(Debug, Clone, Default)]
pub struct ArchivePacker {
    compression_level: Option<i64>,
}

impl ArchivePacker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deflate level for everything except the mimetype marker
    pub fn with_compression_level(mut self, level: i64) -> Self {
        self.compression_level = Some(level);
        self
    }

    /// Pack every file under `root` into `output`.
    ///
    /// `mimetype` is written first and stored; all other files follow in
    /// lexicographic path order, deflated. The archive is assembled in a
    /// temporary file next to `output` and moved into place only once
    /// complete, so a failure never leaves a partial file behind.
    pub fn pack(&self, root: &Path, output: &Path) -> Result<PathBuf> {
        let mimetype = root.join(MIMETYPE_PATH);
        if !mimetype.is_file() {
            return Err(ConversionError::ArchiveCreationFailed(format!(
                "working tree has no {} file",
                MIMETYPE_PATH
            )));
        }

        let parent = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut staging = tempfile::Builder::new()
            .prefix(".pagewright-")
            .suffix(".epub.part")
            .tempfile_in(&parent)
            .map_err(|e| {
                ConversionError::ArchiveCreationFailed(format!(
                    "cannot create temporary archive in {}: {}",
                    parent.display(),
                    e
                ))
            })?;

        let files = collect_files(root).map_err(|e| {
            ConversionError::ArchiveCreationFailed(format!(
                "cannot list {}: {}",
                root.display(),
                e
            ))
        })?;
        let count = self.write_entries(root, &files, staging.as_file_mut())?;

        if output.exists() {
            fs::remove_file(output).map_err(|e| {
                ConversionError::ArchiveCreationFailed(format!(
                    "cannot replace {}: {}",
                    output.display(),
                    e
                ))
            })?;
        }
        staging
            .persist(output)
            .map_err(|e| ConversionError::ArchiveCreationFailed(e.error.to_string()))?;

        tracing::info!("Packed {} entries into {}", count, output.display());
        Ok(output.to_path_buf())
    }

    fn write_entries(&self, root: &Path, files: &[String], file: &mut File) -> Result<usize> {
        let mut zip = ZipWriter::new(file);

        let stored = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .last_modified_time(zip::DateTime::default());
        let deflated = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(self.compression_level)
            .last_modified_time(zip::DateTime::default());

        add_entry(&mut zip, root, MIMETYPE_PATH, stored)?;

        let mut count = 1;
        for name in files.iter().filter(|name| name.as_str() != MIMETYPE_PATH) {
            add_entry(&mut zip, root, name, deflated)?;
            count += 1;
        }

        zip.finish().map_err(zip_error)?;
        Ok(count)
    }
}

/// Copy one file of the tree into the archive under its relative name
fn add_entry<W: Write + std::io::Seek>(
    zip: &mut ZipWriter<W>,
    root: &Path,
    name: &str,
    options: SimpleFileOptions,
) -> Result<()> {
    let data = fs::read(root.join(name)).map_err(|e| entry_error(name, e))?;
    zip.start_file(name, options)
        .map_err(|e| entry_error(name, e))?;
    zip.write_all(&data).map_err(|e| entry_error(name, e))?;
    Ok(())
}

fn entry_error(name: &str, e: impl std::fmt::Display) -> ConversionError {
    ConversionError::ArchiveCreationFailed(format!("cannot add entry {}: {}", name, e))
}

/// One entry of an inspected archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    pub stored: bool,
}

/// Structural summary of an EPUB archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    pub entries: Vec<EntryInfo>,
    pub mimetype: Option<String>,
}

impl ArchiveReport {
    /// The first entry is `mimetype`, stored, with the EPUB media type
    pub fn mimetype_first_and_stored(&self) -> bool {
        matches!(self.entries.first(), Some(e) if e.name == MIMETYPE_PATH && e.stored)
            && self.mimetype.as_deref() == Some(EPUB_MIMETYPE)
    }

    /// Every entry after the first is compressed
    pub fn others_compressed(&self) -> bool {
        self.entries.iter().skip(1).all(|e| !e.stored)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Problems found, empty when the archive is well formed
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !self.mimetype_first_and_stored() {
            problems.push(format!(
                "first entry must be an uncompressed '{}' containing '{}'",
                MIMETYPE_PATH, EPUB_MIMETYPE
            ));
        }
        if !self.others_compressed() {
            problems.push("entries after mimetype must be compressed".to_string());
        }
        for required in [super::CONTAINER_PATH, super::PACKAGE_PATH] {
            if !self.contains(required) {
                problems.push(format!("missing {}", required));
            }
        }
        problems
    }
}

/// Read the entry list of an archive on disk
pub fn inspect_archive(path: &Path) -> Result<ArchiveReport> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file).map_err(zip_error)?;

    let mut entries = Vec::with_capacity(archive.len());
    let mut mimetype = None;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(zip_error)?;
        let name = entry.name().to_string();
        if i == 0 && name == MIMETYPE_PATH {
            let mut content = String::new();
            entry.read_to_string(&mut content)?;
            mimetype = Some(content);
        }
        entries.push(EntryInfo {
            stored: entry.compression() == CompressionMethod::Stored,
            name,
        });
    }

    Ok(ArchiveReport { entries, mimetype })
}

fn zip_error(e: zip::result::ZipError) -> ConversionError {
    ConversionError::ArchiveCreationFailed(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::WorkingTree;

    fn sample_tree() -> WorkingTree {
        let tree = WorkingTree::create().unwrap();
        tree.write("OEBPS/page1.xhtml", b"<html/>").unwrap();
        tree.write("mimetype", EPUB_MIMETYPE.as_bytes()).unwrap();
        tree.write("META-INF/container.xml", b"<container/>").unwrap();
        tree.write("OEBPS/content.opf", b"<package/>").unwrap();
        tree
    }

    #[test]
    fn test_pack_layout() {
        let tree = sample_tree();
        let out = tempfile::tempdir().unwrap();
        let output = out.path().join("book.epub");

        let written = ArchivePacker::new().pack(tree.root(), &output).unwrap();
        assert_eq!(written, output);

        let report = inspect_archive(&output).unwrap();
        let names: Vec<_> = report.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "mimetype",
                "META-INF/container.xml",
                "OEBPS/content.opf",
                "OEBPS/page1.xhtml"
            ]
        );
        assert!(report.mimetype_first_and_stored());
        assert!(report.others_compressed());
        assert!(report.problems().is_empty());
    }

    #[test]
    fn test_pack_is_deterministic() {
        let tree = sample_tree();
        let out = tempfile::tempdir().unwrap();
        let a = out.path().join("a.epub");
        let b = out.path().join("b.epub");
        ArchivePacker::new().pack(tree.root(), &a).unwrap();
        ArchivePacker::new().pack(tree.root(), &b).unwrap();
        assert_eq!(fs::read(a).unwrap(), fs::read(b).unwrap());
    }

    #[test]
    fn test_pack_replaces_existing() {
        let tree = sample_tree();
        let out = tempfile::tempdir().unwrap();
        let output = out.path().join("book.epub");
        fs::write(&output, b"stale").unwrap();

        ArchivePacker::new().pack(tree.root(), &output).unwrap();
        assert!(inspect_archive(&output).unwrap().mimetype_first_and_stored());
    }

    #[test]
    fn test_missing_mimetype() {
        let tree = WorkingTree::create().unwrap();
        tree.write("OEBPS/page1.xhtml", b"<html/>").unwrap();
        let out = tempfile::tempdir().unwrap();
        let output = out.path().join("book.epub");

        let err = ArchivePacker::new().pack(tree.root(), &output).unwrap_err();
        assert!(matches!(err, ConversionError::ArchiveCreationFailed(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_no_leftover_staging_file() {
        let tree = sample_tree();
        let out = tempfile::tempdir().unwrap();
        ArchivePacker::new()
            .pack(tree.root(), &out.path().join("book.epub"))
            .unwrap();
        let names: Vec<_> = fs::read_dir(out.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["book.epub"]);
    }

    #[test]
    fn test_missing_destination_directory() {
        let tree = sample_tree();
        let out = tempfile::tempdir().unwrap();
        let output = out.path().join("no-such-dir").join("book.epub");

        let err = ArchivePacker::new().pack(tree.root(), &output).unwrap_err();
        assert!(matches!(err, ConversionError::ArchiveCreationFailed(_)));
        assert!(!output.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_entry() {
        let tree = sample_tree();
        std::os::unix::fs::symlink(
            tree.root().join("OEBPS/gone.png"),
            tree.root().join("OEBPS/broken.png"),
        )
        .unwrap();
        let out = tempfile::tempdir().unwrap();
        let output = out.path().join("book.epub");

        let err = ArchivePacker::new().pack(tree.root(), &output).unwrap_err();
        match err {
            ConversionError::ArchiveCreationFailed(message) => {
                assert!(message.contains("OEBPS/broken.png"), "{}", message)
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!output.exists());
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_inspect_not_a_zip() {
        let out = tempfile::tempdir().unwrap();
        let path = out.path().join("bogus.epub");
        fs::write(&path, b"not a zip").unwrap();
        assert!(inspect_archive(&path).is_err());
    }
}
