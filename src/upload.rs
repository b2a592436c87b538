//! Single-shot HTTP PUT of an archive to the hosting endpoint.

use std::path::Path;

use reqwest::{Client, Url};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Hosting endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://bashupload.com/";

/// Uploads archives to an anonymous file host.
pub struct Uploader {
    client: Client,
    endpoint: Url,
}

impl Uploader {
    /// Create an uploader for `endpoint` with the client's default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upload`] if the HTTP client cannot be built.
    pub fn new(endpoint: Url) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Upload {
                url: endpoint.clone(),
                source: e,
            })?;

        Ok(Self { client, endpoint })
    }

    /// URL the archive named `file_name` is PUT to.
    ///
    /// The name becomes one percent-encoded path segment under the endpoint.
    pub fn target_url(&self, file_name: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(file_name);
        }
        url
    }

    /// Send the archive at `archive` in one PUT and return the response body.
    ///
    /// No retries: a transport failure is [`Error::Upload`] and a non-success
    /// status is [`Error::UploadStatus`].
    pub async fn upload(&self, archive: &Path) -> Result<String> {
        let file_name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let url = self.target_url(&file_name);

        let body = tokio::fs::read(archive)
            .await
            .map_err(|e| Error::archive(archive, e))?;

        info!(url = %url, bytes = body.len(), "uploading archive");

        let upload_err = |source| Error::Upload {
            url: url.clone(),
            source,
        };

        let resp = self
            .client
            .put(url.clone())
            .body(body)
            .send()
            .await
            .map_err(upload_err)?;

        let status = resp.status();
        let text = resp.text().await.map_err(upload_err)?;
        debug!(%status, body = %text, "upload response");

        if !status.is_success() {
            return Err(Error::UploadStatus {
                url,
                status,
                body: text,
            });
        }

        Ok(text)
    }
}
