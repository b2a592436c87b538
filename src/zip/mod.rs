//! ZIP archive writing and reading.
//!
//! Archives are produced by [`create_archive`], which walks the source,
//! streams every file through the `zip` crate's writer and then reads the
//! finished archive back with [`ZipExtractor`] to confirm it is well formed.
//!
//! The reader handles DEFLATE and STORED entries on a single disk, including
//! the ZIP64 records written for more than 65 535 entries or data past 4 GiB.
//! Encryption is not supported.

mod archiver;
mod extractor;
mod parser;
mod structures;

pub use archiver::{ArchiveSummary, create_archive};
pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;
