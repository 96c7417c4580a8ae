//! Random access over remote resources.
//!
//! [`RemoteRangeReader`] turns arbitrary reads into HTTP Range requests and
//! keeps the most recent fetch around so that nearby reads are served
//! without another round trip. Archive walkers only see the [`ReadAt`] and
//! [`ReadSeek`] capabilities defined here.

mod client;
mod error;
mod logger;
mod remote;

pub use client::{HttpClient, HttpResponse, default_client};
pub use error::{Error, Result};
pub use logger::{Logger, TracingLogger};
pub use remote::{MIN_FETCH_SIZE, RemoteRangeReader};

use async_trait::async_trait;
use std::io::SeekFrom;

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send {
    /// Read into `buf` starting at `offset`, returning how many bytes were
    /// available. `Ok(0)` for a non-empty buffer means there is nothing there.
    async fn read_at(&mut self, buf: &mut [u8], offset: i64) -> Result<usize>;

    /// Get the total size of the data source
    async fn size(&mut self) -> Result<u64>;
}

/// Trait for cursor based reading from a data source
#[async_trait]
pub trait ReadSeek: Send {
    /// Read at the current cursor and advance it by the bytes returned.
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Move the cursor, returning its new position.
    fn seek(&mut self, pos: SeekFrom) -> Result<i64>;
}
