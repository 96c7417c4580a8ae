//! Main entry point for the remote-archive-ls CLI application.
//!
//! Prints the name of every entry in a remote tar or zip archive, fetching
//! only the parts of the archive needed to find them.

use anyhow::{Result, bail};
use clap::Parser;

use remote_archive_ls::io::default_client;
use remote_archive_ls::logging::init_logging;
use remote_archive_ls::{ArchiveKind, Cli, RemoteRangeReader, TracingLogger, list_entries};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let Some(kind) = ArchiveKind::from_url(&cli.url) else {
        bail!("Unknown file type. URL does not end in .tar or .zip");
    };

    let mut reader = RemoteRangeReader::new(cli.url.clone())
        .with_client(Box::new(default_client(cli.timeout())?))
        .with_logger(Box::new(TracingLogger::verbose(cli.debug)));

    list_entries(&mut reader, kind, |name| println!("{name}")).await?;

    tracing::debug!(
        "Total bytes transferred: {} in {} requests",
        format_size(reader.transferred_bytes()),
        reader.request_count()
    );

    Ok(())
}

/// Format a byte size into a human-readable string.
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
