use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// File that receives the download link, next to the archive.
pub const LINK_FILE_NAME: &str = "bashupload_link.txt";

/// Write `url` as the sole content of the link file in `dir`.
///
/// Existing content is replaced. Returns the link file path.
pub fn write_link(dir: &Path, url: &str) -> Result<PathBuf> {
    let path = dir.join(LINK_FILE_NAME);
    fs::write(&path, url).map_err(|e| Error::Write {
        path: path.clone(),
        source: e,
    })?;
    debug!(path = %path.display(), "saved download link");
    Ok(path)
}

/// Format a byte size into a human-readable string.
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
