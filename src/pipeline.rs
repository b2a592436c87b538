//! The archive → upload → link pipeline behind the `bashup` binary.

use std::path::{Path, PathBuf};

use reqwest::Url;
use tracing::info;

use crate::cli::Cli;
use crate::error::Result;
use crate::link::LinkPattern;
use crate::output::{format_size, write_link};
use crate::resolve::ArchiveSpec;
use crate::upload::Uploader;
use crate::zip::create_archive;

/// Everything a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub archive_path: PathBuf,
    pub archive_size: u64,
    pub link_path: PathBuf,
    pub url: String,
}

/// Run the pipeline for parsed command-line arguments.
pub async fn run(cli: &Cli) -> Result<Outcome> {
    share(Path::new(&cli.path), cli.name.as_deref(), &cli.endpoint).await
}

/// Archive `source`, upload it to `endpoint` and save the download link.
///
/// Steps run strictly in order and the first failure ends the run. The
/// source is validated before anything touches the disk or the network.
pub async fn share(source: &Path, name: Option<&str>, endpoint: &Url) -> Result<Outcome> {
    let spec = ArchiveSpec::resolve(source, name)?;
    let pattern = LinkPattern::for_endpoint(endpoint)?;
    let uploader = Uploader::new(endpoint.clone())?;

    let summary = create_archive(&spec.source, &spec.path).await?;
    info!(
        "Archived {} into {} ({})",
        spec.source.display(),
        spec.file_name,
        format_size(summary.size)
    );

    let body = uploader.upload(&spec.path).await?;
    let url = pattern.extract(&body)?;
    let link_path = write_link(spec.output_dir(), &url)?;

    Ok(Outcome {
        archive_path: spec.path,
        archive_size: summary.size,
        link_path,
        url,
    })
}
