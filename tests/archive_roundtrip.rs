use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use bashup::create_archive;
use bashup::io::LocalFileReader;
use bashup::zip::{CompressionMethod, ZipExtractor};
use tempfile::TempDir;

/// Map of relative path to file contents (`None` for directories).
type Tree = BTreeMap<String, Option<Vec<u8>>>;

fn snapshot(root: &Path) -> Result<Tree> {
    let mut tree = Tree::new();
    for entry in walkdir::WalkDir::new(root).min_depth(1) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(root)?
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        if entry.file_type().is_dir() {
            tree.insert(relative, None);
        } else {
            tree.insert(relative, Some(fs::read(entry.path())?));
        }
    }
    Ok(tree)
}

async fn extract_all(archive: &Path, dest: &Path) -> Result<()> {
    let extractor = ZipExtractor::new(Arc::new(LocalFileReader::new(archive)?));
    for entry in extractor.list_files().await? {
        let out = dest.join(&entry.file_name);
        if entry.is_directory {
            fs::create_dir_all(&out)?;
        } else {
            if let Some(parent) = out.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&out, extractor.extract_to_memory(&entry).await?)?;
        }
    }
    Ok(())
}

#[tokio::test]
async fn nested_directory_round_trips() -> Result<()> {
    let work = TempDir::new()?;
    let source = work.path().join("project");
    fs::create_dir_all(source.join("src/bin"))?;
    fs::create_dir_all(source.join("assets/empty"))?;
    fs::write(source.join("README.md"), "# project\n")?;
    fs::write(source.join("src/lib.rs"), "pub fn answer() -> u32 { 42 }\n")?;
    fs::write(source.join("src/bin/tool.rs"), "fn main() {}\n")?;
    let blob: Vec<u8> = (0..=255u8).cycle().take(200_000).collect();
    fs::write(source.join("assets/blob.bin"), blob)?;
    fs::write(source.join("assets/zero.txt"), "")?;

    let archive = work.path().join("project.zip");
    let summary = create_archive(&source, &archive).await?;
    assert_eq!(summary.entries, snapshot(&source)?.len());

    let restored = work.path().join("restored");
    fs::create_dir(&restored)?;
    extract_all(&archive, &restored).await?;

    assert_eq!(snapshot(&restored)?, snapshot(&source)?);
    Ok(())
}

#[tokio::test]
async fn entries_are_relative_to_the_source_directory() -> Result<()> {
    let work = TempDir::new()?;
    let source = work.path().join("docs");
    fs::create_dir_all(source.join("guide"))?;
    fs::write(source.join("guide/intro.txt"), "hello")?;

    let archive = work.path().join("docs.zip");
    create_archive(&source, &archive).await?;

    let extractor = ZipExtractor::new(Arc::new(LocalFileReader::new(&archive)?));
    let names: Vec<_> = extractor
        .list_files()
        .await?
        .into_iter()
        .map(|e| e.file_name)
        .collect();
    assert_eq!(names, vec!["guide/".to_string(), "guide/intro.txt".to_string()]);
    Ok(())
}

#[tokio::test]
async fn single_file_becomes_one_deflated_entry() -> Result<()> {
    let work = TempDir::new()?;
    let source = work.path().join("notes.txt");
    let content = "line\n".repeat(1000);
    fs::write(&source, &content)?;

    let archive = work.path().join("notes.zip");
    create_archive(&source, &archive).await?;

    let extractor = ZipExtractor::new(Arc::new(LocalFileReader::new(&archive)?));
    let entries = extractor.list_files().await?;
    assert_eq!(entries.len(), 1);

    let entry = &entries[0];
    assert_eq!(entry.file_name, "notes.txt");
    assert_eq!(entry.compression_method, CompressionMethod::Deflate);
    assert!(entry.compressed_size < entry.uncompressed_size);
    assert_eq!(extractor.extract_to_memory(entry).await?, content.as_bytes());
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn unix_permissions_are_recorded() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let work = TempDir::new()?;
    let source = work.path().join("run.sh");
    fs::write(&source, "#!/bin/sh\necho hi\n")?;
    fs::set_permissions(&source, fs::Permissions::from_mode(0o755))?;

    let archive = work.path().join("run.zip");
    create_archive(&source, &archive).await?;

    let extractor = ZipExtractor::new(Arc::new(LocalFileReader::new(&archive)?));
    let entries = extractor.list_files().await?;
    assert_eq!(entries[0].unix_mode().map(|m| m & 0o777), Some(0o755));
    Ok(())
}
