//! Builds the archive for a resolved source and checks it before upload.

use std::fs::{self, File, Metadata};
use std::io::{self, BufWriter};
use std::path::{Component, Path};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{Datelike, Local, Timelike};
use tracing::debug;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::io::{LocalFileReader, ReadAt};

use super::extractor::ZipExtractor;

/// What ended up on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Number of entries, directories included.
    pub entries: usize,
    /// Archive size in bytes.
    pub size: u64,
}

/// Compress `source` into a fresh ZIP archive at `target`.
///
/// Any existing file at `target` is removed first. A directory source is
/// stored recursively with entry names relative to the directory itself; a
/// file source becomes a single entry named after the file. The finished
/// archive is read back and its entry count confirmed.
///
/// # Errors
///
/// Returns [`Error::Archive`] if `target` is the source itself, if any file
/// cannot be read or written, or if the archive fails its self-check.
pub async fn create_archive(source: &Path, target: &Path) -> Result<ArchiveSummary> {
    if source == target {
        return Err(Error::archive(
            target,
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "archive would overwrite its own source",
            ),
        ));
    }

    match fs::remove_file(target) {
        Ok(()) => debug!(path = %target.display(), "removed previous archive"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(Error::archive(target, e)),
    }

    let entries = write_archive(source, target).map_err(|e| Error::archive(target, e))?;
    let size = verify_archive(target, entries)
        .await
        .map_err(|e| Error::archive(target, io::Error::other(e)))?;

    debug!(archive = %target.display(), entries, size, "archive verified");

    Ok(ArchiveSummary { entries, size })
}

fn write_archive(source: &Path, target: &Path) -> io::Result<usize> {
    let file = File::create(target)?;
    let mut zipw = ZipWriter::new(BufWriter::new(file));
    let mut entries = 0;

    let metadata = fs::metadata(source)?;
    if metadata.is_dir() {
        // min_depth(1) leaves the source directory itself out of the entry names
        for entry in WalkDir::new(source)
            .follow_links(true)
            .min_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            let relative = entry
                .path()
                .strip_prefix(source)
                .map_err(io::Error::other)?;
            let name = entry_name(relative);
            let metadata = entry.metadata()?;

            if metadata.is_dir() {
                debug!(entry = %name, "adding directory");
                zipw.add_directory(name, entry_options(&metadata))
                    .map_err(io::Error::other)?;
            } else {
                debug!(entry = %name, bytes = metadata.len(), "adding file");
                zipw.start_file(name, entry_options(&metadata))
                    .map_err(io::Error::other)?;
                let mut input = File::open(entry.path())?;
                io::copy(&mut input, &mut zipw)?;
            }
            entries += 1;
        }
    } else {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "source has no file name"))?;
        debug!(entry = %name, bytes = metadata.len(), "adding file");
        zipw.start_file(name, entry_options(&metadata))
            .map_err(io::Error::other)?;
        let mut input = File::open(source)?;
        io::copy(&mut input, &mut zipw)?;
        entries += 1;
    }

    let file = zipw
        .finish()
        .map_err(io::Error::other)?
        .into_inner()
        .map_err(|e| e.into_error())?;
    file.sync_all()?;

    Ok(entries)
}

/// DEFLATE, the entry's modification time and, on Unix, its permissions.
fn entry_options(metadata: &Metadata) -> FileOptions {
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(last_modified(metadata.modified().ok()))
        .large_file(metadata.len() >= u32::MAX as u64);

    match unix_mode(metadata) {
        Some(mode) => options.unix_permissions(mode),
        None => options,
    }
}

/// Local-time DOS timestamp; anything the format cannot hold becomes
/// 1980-01-01 00:00:00.
fn last_modified(time: Option<SystemTime>) -> zip::DateTime {
    time.and_then(|time| {
        let local: chrono::DateTime<Local> = time.into();
        let year = u16::try_from(local.year()).ok()?;
        zip::DateTime::from_date_and_time(
            year,
            local.month() as u8,
            local.day() as u8,
            local.hour() as u8,
            local.minute() as u8,
            local.second() as u8,
        )
        .ok()
    })
    .unwrap_or_default()
}

/// Re-read the archive's Central Directory, returning the archive size.
async fn verify_archive(target: &Path, expected_entries: usize) -> anyhow::Result<u64> {
    let reader = Arc::new(LocalFileReader::new(target)?);
    let size = reader.size();
    let extractor = ZipExtractor::new(reader);

    let listed = extractor.list_files().await?.len();
    if listed != expected_entries {
        anyhow::bail!(
            "Archive lists {} entries but {} were written",
            listed,
            expected_entries
        );
    }

    Ok(size)
}

/// ZIP entry name for a relative path: `/` separated, no leading slash.
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(unix)]
fn unix_mode(metadata: &Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode())
}

#[cfg(not(unix))]
fn unix_mode(_metadata: &Metadata) -> Option<u32> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    #[test]
    fn timestamps_before_1980_clamp_to_dos_epoch() {
        let stamp = last_modified(Some(UNIX_EPOCH + Duration::from_secs(60)));
        assert_eq!((stamp.year(), stamp.month(), stamp.day()), (1980, 1, 1));
        assert_eq!((stamp.hour(), stamp.minute(), stamp.second()), (0, 0, 0));
    }

    #[test]
    fn timestamp_uses_local_time() {
        let now = SystemTime::now();
        let local: chrono::DateTime<Local> = now.into();
        let stamp = last_modified(Some(now));

        assert_eq!(
            (stamp.year(), stamp.month(), stamp.day()),
            (local.year() as u16, local.month() as u8, local.day() as u8)
        );
        assert_eq!(
            (stamp.hour(), stamp.minute(), stamp.second()),
            (local.hour() as u8, local.minute() as u8, local.second() as u8)
        );
    }

    #[test]
    fn entry_names_use_forward_slashes() {
        let path = Path::new("a").join("b").join("c.txt");
        assert_eq!(entry_name(&path), "a/b/c.txt");
    }

    #[tokio::test]
    async fn replaces_existing_archive() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let source = dir.path().join("report.txt");
        let target = dir.path().join("report.zip");
        fs::write(&source, "quarterly numbers")?;
        fs::write(&target, "stale bytes that are not a zip")?;

        let summary = create_archive(&source, &target).await?;
        assert_eq!(summary.entries, 1);
        assert_eq!(summary.size, fs::metadata(&target)?.len());
        Ok(())
    }

    #[tokio::test]
    async fn refuses_to_overwrite_source() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let source = dir.path().join("bundle.zip");
        fs::write(&source, "original")?;

        let err = create_archive(&source, &source).await.unwrap_err();
        assert!(matches!(err, Error::Archive { .. }));
        assert_eq!(fs::read_to_string(&source)?, "original");
        Ok(())
    }

    #[tokio::test]
    async fn empty_directory_gives_empty_archive() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let source = dir.path().join("empty");
        fs::create_dir(&source)?;
        let target = dir.path().join("empty.zip");

        let summary = create_archive(&source, &target).await?;
        assert_eq!(summary.entries, 0);
        Ok(())
    }
}
