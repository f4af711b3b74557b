//! Working tree: the temporary on-disk EPUB layout before packaging

use crate::error::{ConversionError, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tempfile::TempDir;

/// Temporary directory holding the uncompressed EPUB layout
///
/// The directory is removed when the tree is dropped, whether the
/// conversion succeeded or not.
pub struct WorkingTree {
    dir: TempDir,
}

impl WorkingTree {
    /// Create a fresh tree in the system temp directory
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("pagewright-").tempdir()?;
        tracing::debug!("Created working tree at {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Create a fresh tree under `parent`
    pub fn create_in(parent: impl AsRef<Path>) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("pagewright-")
            .tempdir_in(parent)?;
        Ok(Self { dir })
    }

    /// Root directory of the tree
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `data` at a relative, forward-slash path, creating parents
    pub fn write(&self, path: &str, data: &[u8]) -> Result<PathBuf> {
        let full_path = self.full_path(path)?;
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full_path, data)?;
        Ok(full_path)
    }

    /// Whether a relative path exists in the tree
    pub fn exists(&self, path: &str) -> bool {
        self.full_path(path).map(|p| p.exists()).unwrap_or(false)
    }

    /// All files in the tree, as sorted forward-slash relative paths
    pub fn files(&self) -> Result<Vec<String>> {
        collect_files(self.root())
    }

    /// Remove the tree now, reporting any failure
    pub fn close(self) -> Result<()> {
        let root = self.root().to_path_buf();
        self.dir.close()?;
        tracing::debug!("Removed working tree at {}", root.display());
        Ok(())
    }

    /// Resolve a relative path, rejecting anything that escapes the root
    fn full_path(&self, path: &str) -> Result<PathBuf> {
        let mut normalized = PathBuf::new();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(c) => normalized.push(c),
                Component::CurDir => {}
                Component::ParentDir | Component::Prefix(_) | Component::RootDir => {
                    return Err(ConversionError::Io(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("path escapes working tree: {}", path),
                    )));
                }
            }
        }

        if normalized.as_os_str().is_empty() {
            return Err(ConversionError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "empty working tree path",
            )));
        }

        Ok(self.root().join(normalized))
    }
}

/// List every file under `root` as a forward-slash relative path, sorted
pub fn collect_files(root: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    walk(root, root, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(root: &Path, dir: &Path, files: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            walk(root, &path, files)?;
        } else if let Ok(relative) = path.strip_prefix(root) {
            files.push(to_archive_path(relative));
        }
    }
    Ok(())
}

/// Join path components with `/` regardless of the host separator
pub fn to_archive_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
