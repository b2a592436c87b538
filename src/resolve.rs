//! Source path validation and archive naming.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Extension given to every archive.
pub const ARCHIVE_SUFFIX: &str = ".zip";

/// Name used when the source has no usable base name (e.g. `/`).
const FALLBACK_STEM: &str = "archive";

/// Where an archive for a given source goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSpec {
    /// Absolute path of the file or directory being archived.
    ///
    /// The parent directory is canonical; the final component is kept as
    /// given, so a symlink is archived under its own name.
    pub source: PathBuf,
    /// Archive file name, always ending in [`ARCHIVE_SUFFIX`].
    pub file_name: String,
    /// Full path of the archive, in the source's parent directory.
    pub path: PathBuf,
}

impl ArchiveSpec {
    /// Resolve `source` and derive the archive name and location.
    ///
    /// With `name_override`, only its base name is used and the suffix is
    /// appended unless already present. Without it, the source's base name
    /// minus its extension is used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `source` does not exist.
    pub fn resolve(source: &Path, name_override: Option<&str>) -> Result<Self> {
        let not_found = |e| Error::NotFound {
            path: source.to_path_buf(),
            source: e,
        };

        let absolute = std::path::absolute(source).map_err(not_found)?;
        fs::metadata(&absolute).map_err(not_found)?;

        // Only the parent is canonicalized so a symlinked source keeps its name
        let source = match (absolute.parent(), absolute.file_name()) {
            (Some(parent), Some(name)) => parent.canonicalize().map_err(not_found)?.join(name),
            _ => absolute.canonicalize().map_err(not_found)?,
        };

        let file_name = match name_override {
            Some(name) => with_suffix(
                Path::new(name)
                    .file_name()
                    .map(OsStr::to_string_lossy)
                    .as_deref()
                    .unwrap_or(FALLBACK_STEM),
            ),
            None => with_suffix(
                source
                    .file_stem()
                    .map(OsStr::to_string_lossy)
                    .as_deref()
                    .unwrap_or(FALLBACK_STEM),
            ),
        };

        let parent = source.parent().unwrap_or(&source);
        let path = parent.join(&file_name);

        debug!(source = %source.display(), archive = %path.display(), "resolved archive spec");

        Ok(Self {
            source,
            file_name,
            path,
        })
    }

    /// Directory that receives the archive and the link file.
    pub fn output_dir(&self) -> &Path {
        self.path.parent().unwrap_or(&self.path)
    }
}

/// Append [`ARCHIVE_SUFFIX`] unless `name` already ends with it (any case).
pub fn with_suffix(name: &str) -> String {
    if name.to_ascii_lowercase().ends_with(ARCHIVE_SUFFIX) {
        name.to_string()
    } else {
        format!("{name}{ARCHIVE_SUFFIX}")
    }
}
