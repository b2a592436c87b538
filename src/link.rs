//! Finds the download link in the host's plaintext upload response.
//!
//! The host answers with a short human-oriented report that contains a line
//! such as `wget https://bashupload.com/<token>/<name>`. The link is the
//! first run of non-whitespace characters that starts with the endpoint.

use regex::Regex;
use reqwest::Url;

use crate::error::{Error, Result};

/// Matches download links served under one endpoint.
#[derive(Debug, Clone)]
pub struct LinkPattern {
    regex: Regex,
}

impl LinkPattern {
    /// Pattern for links under `endpoint`: its URL prefix, then one or more
    /// non-whitespace characters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the pattern cannot be compiled.
    pub fn for_endpoint(endpoint: &Url) -> Result<Self> {
        let prefix = format!("{}/", endpoint.as_str().trim_end_matches('/'));
        let regex = Regex::new(&format!(r"{}\S+", regex::escape(&prefix))).map_err(|e| {
            Error::Config {
                endpoint: endpoint.clone(),
                source: e,
            }
        })?;

        Ok(Self { regex })
    }

    /// Extract the first link from `body`, scanning line by line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] carrying the whole body when no line matches.
    pub fn extract(&self, body: &str) -> Result<String> {
        body.lines()
            .map(str::trim)
            .find_map(|line| self.regex.find(line))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| Error::Parse {
                body: body.to_string(),
            })
    }
}
