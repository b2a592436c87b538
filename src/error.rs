//! Error types for the archive-and-upload pipeline.
//!
//! Every step of a run fails with exactly one of these variants and the run
//! stops there. Each variant keeps the context a user needs to act on the
//! failure: the path involved, the URL that was contacted, or the raw
//! response body that could not be understood.

use std::io;
use std::path::PathBuf;

use reqwest::{StatusCode, Url};
use thiserror::Error;

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by a bashup run.
#[derive(Debug, Error)]
pub enum Error {
    /// The source path does not exist or cannot be resolved.
    #[error("source path not found: {}", path.display())]
    NotFound {
        /// Path as given on the command line.
        path: PathBuf,
        /// Underlying resolution error.
        source: io::Error,
    },

    /// The archive could not be created or failed its self-check.
    #[error("failed to create archive {}", path.display())]
    Archive {
        /// Target archive path.
        path: PathBuf,
        /// Underlying failure.
        source: io::Error,
    },

    /// The PUT request could not be completed.
    #[error("upload to {url} failed")]
    Upload {
        /// Upload target.
        url: Url,
        /// Underlying transport error.
        source: reqwest::Error,
    },

    /// The host answered the PUT with a non-success status.
    #[error("upload to {url} was rejected with status {status}")]
    UploadStatus {
        /// Upload target.
        url: Url,
        /// Status returned by the host.
        status: StatusCode,
        /// Response body, kept for diagnosis.
        body: String,
    },

    /// No download link was found in the upload response.
    #[error("no download link found in upload response:\n{body}")]
    Parse {
        /// Raw response body.
        body: String,
    },

    /// The link file could not be written.
    #[error("failed to write {}", path.display())]
    Write {
        /// Link file path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },

    /// The configured endpoint cannot be turned into a link pattern.
    #[error("invalid endpoint {endpoint}")]
    Config {
        /// Endpoint as configured.
        endpoint: Url,
        /// Pattern compilation error.
        source: regex::Error,
    },
}

impl Error {
    pub(crate) fn archive(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Archive {
            path: path.into(),
            source,
        }
    }
}
