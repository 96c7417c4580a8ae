use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "remote-archive-ls")]
#[command(version)]
#[command(about = "List the entries of a remote tar or zip archive using HTTP Range requests", long_about = None)]
#[command(after_help = "Examples:\n  \
  remote-archive-ls https://example.com/archive.zip     list files from remote ZIP\n  \
  remote-archive-ls -d https://example.com/backup.tar   list a TAR, logging every request")]
pub struct Cli {
    /// HTTP URL of an archive ending in .tar or .zip
    #[arg(value_name = "URL")]
    pub url: String,

    /// Enable verbose output
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// HTTP request timeout in seconds
    #[arg(short = 't', long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,
}

impl Cli {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
