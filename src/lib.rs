//! # remote-archive-ls
//!
//! List tar and zip archives served over HTTP without downloading them.
//!
//! [`RemoteRangeReader`] presents a remote resource as a seekable file. Each
//! read becomes an HTTP Range request of at least [`MIN_FETCH_SIZE`] bytes,
//! and the most recent response is kept so that the small, clustered reads
//! of archive parsers rarely go back to the network.
//!
//! ## Example
//!
//! ```no_run
//! use remote_archive_ls::{ArchiveKind, RemoteRangeReader, TracingLogger, list_entries};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut reader = RemoteRangeReader::new("https://example.com/archive.zip")
//!         .with_logger(Box::new(TracingLogger::verbose(false)));
//!
//!     list_entries(&mut reader, ArchiveKind::Zip, |name| println!("{name}")).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod io;
pub mod lister;
pub mod logging;
pub mod tar;
pub mod zip;

#[cfg(test)]
mod testing;

pub use cli::Cli;
pub use io::{
    Error, HttpClient, HttpResponse, Logger, MIN_FETCH_SIZE, ReadAt, ReadSeek, RemoteRangeReader,
    TracingLogger,
};
pub use lister::{ArchiveKind, list_entries};
pub use tar::{TarEntry, TarWalker};
pub use zip::{ZipFileEntry, ZipParser};
