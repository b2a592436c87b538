//! # bashup
//!
//! Zip a file or directory and share it through an anonymous file host.
//!
//! A run is a straight line of five steps, each of which either succeeds or
//! ends the run with one [`Error`]:
//!
//! 1. [`ArchiveSpec::resolve`] checks the source exists and names the archive
//! 2. [`create_archive`] writes a ZIP next to the source and verifies it
//! 3. [`Uploader::upload`] sends the archive in a single HTTP PUT
//! 4. [`LinkPattern::extract`] pulls the download link out of the response
//! 5. [`write_link`] saves the link to `bashupload_link.txt`
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use bashup::{share, upload::DEFAULT_ENDPOINT};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let endpoint = DEFAULT_ENDPOINT.parse()?;
//!     let outcome = share(Path::new("./photos"), None, &endpoint).await?;
//!     println!("{}", outcome.url);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod link;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod resolve;
pub mod upload;
pub mod zip;

pub use cli::Cli;
pub use crate::zip::{ZipExtractor, create_archive};
pub use error::{Error, Result};
pub use link::LinkPattern;
pub use output::{LINK_FILE_NAME, write_link};
pub use pipeline::{Outcome, run, share};
pub use resolve::ArchiveSpec;
pub use upload::Uploader;
