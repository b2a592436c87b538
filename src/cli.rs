use clap::Parser;
use reqwest::Url;

use crate::upload::DEFAULT_ENDPOINT;

#[derive(Parser, Debug)]
#[command(name = "bashup")]
#[command(version)]
#[command(about = "Zip a file or directory and share it through bashupload.com", long_about = None)]
#[command(after_help = "Examples:\n  \
  bashup ./photos                 upload photos.zip, link saved to bashupload_link.txt\n  \
  bashup report.pdf q3-report     upload q3-report.zip\n  \
  bashup -q notes.txt | pbcopy    print only the link")]
pub struct Cli {
    /// File or directory to archive
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Archive name (".zip" is appended if missing)
    #[arg(value_name = "NAME")]
    pub name: Option<String>,

    /// Upload endpoint
    #[arg(long, value_name = "URL", env = "BASHUPLOAD_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: Url,

    /// More log output (-vv for trace)
    #[arg(short = 'v', action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Less log output (-qq => errors only)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    /// Log level implied by `-v` / `-q`, used when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        match (self.verbose, self.quiet) {
            (0, 0) => "info",
            (0, 1) => "warn",
            (0, _) => "error",
            (1, _) => "debug",
            _ => "trace",
        }
    }
}
