use async_trait::async_trait;
use reqwest::header::{HeaderValue, RANGE};
use reqwest::{Method, Request, StatusCode, Url, Version};
use std::fmt;
use std::io::SeekFrom;
use std::time::Duration;

use super::client::{HttpClient, default_client};
use super::error::{Error, Result};
use super::logger::Logger;
use super::{ReadAt, ReadSeek};

/// Smallest number of bytes fetched on a cache miss.
///
/// Archive parsers issue many small reads close to each other; one larger
/// fetch answers most of them without another round trip.
pub const MIN_FETCH_SIZE: usize = 1024 * 1024;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Seekable reader over a remote resource, backed by HTTP Range requests.
///
/// Only the most recent fetch is kept. A read that fits entirely inside it
/// is answered from memory; anything else replaces it with a new fetch of at
/// least [`MIN_FETCH_SIZE`] bytes starting at the requested offset.
///
/// The client and logger may be configured before the first read. Without a
/// client, a [`reqwest::Client`] with a 30 second timeout is built on first
/// use.
pub struct RemoteRangeReader {
    url: String,
    parsed: Option<Url>,
    client: Option<Box<dyn HttpClient>>,
    logger: Option<Box<dyn Logger>>,
    cursor: i64,
    cache: Option<Vec<u8>>,
    cache_start: i64,
    requests: u64,
    transferred: u64,
}

impl RemoteRangeReader {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            parsed: None,
            client: None,
            logger: None,
            cursor: 0,
            cache: None,
            cache_start: 0,
            requests: 0,
            transferred: 0,
        }
    }

    pub fn with_client(mut self, client: Box<dyn HttpClient>) -> Self {
        self.set_client(client);
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn Logger>) -> Self {
        self.set_logger(logger);
        self
    }

    pub fn set_client(&mut self, client: Box<dyn HttpClient>) {
        self.client = Some(client);
    }

    pub fn set_logger(&mut self, logger: Box<dyn Logger>) {
        self.logger = Some(logger);
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current cursor used by [`read`](Self::read).
    pub fn position(&self) -> i64 {
        self.cursor
    }

    /// Number of range requests issued so far.
    pub fn request_count(&self) -> u64 {
        self.requests
    }

    /// Total body bytes received from range requests.
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred
    }

    /// Read `buf.len()` bytes starting at `offset`, without moving the cursor.
    ///
    /// Returns fewer bytes than requested only when the resource has fewer
    /// available. A negative offset or an unexpected response status is
    /// reported as [`Error::Eof`].
    pub async fn read_at(&mut self, buf: &mut [u8], offset: i64) -> Result<usize> {
        self.debug(format_args!("ReadAt len {} off {}", buf.len(), offset));

        if offset < 0 {
            return Err(Error::Eof);
        }

        if let Some(n) = self.read_cached(buf, offset) {
            return Ok(n);
        }

        let wanted = buf.len().max(MIN_FETCH_SIZE);
        let range = format_range(offset, wanted as i64);

        // The old contents are gone whatever the outcome of this fetch.
        self.cache = None;

        let mut request = self.request(Method::GET)?;
        request
            .headers_mut()
            .insert(RANGE, HeaderValue::from_str(&range)?);

        self.info(format_args!("Start HTTP GET with Range: {}", range));

        self.requests += 1;
        let response = self.client()?.execute(request).await?;

        self.info(format_args!("Response status: {}", response.status.as_u16()));

        if response.status != StatusCode::OK && response.status != StatusCode::PARTIAL_CONTENT {
            return Err(Error::Eof);
        }

        self.transferred += response.body.len() as u64;
        let cache = self.cache.insert(response.body.to_vec());
        self.cache_start = offset;

        let loaded = cache.len();
        let n = loaded.min(buf.len());
        buf[..n].copy_from_slice(&cache[..n]);

        self.debug(format_args!("loaded {} bytes into cache", loaded));

        Ok(n)
    }

    /// Read at the cursor, advancing it by the number of bytes returned.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.debug(format_args!("got read len {}", buf.len()));

        let n = self.read_at(buf, self.cursor).await?;
        self.cursor = self.cursor.saturating_add(n as i64);
        Ok(n)
    }

    /// Move the cursor. Positions relative to the end are not supported; use
    /// [`size`](Self::size) and seek to an absolute offset instead.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<i64> {
        self.debug(format_args!("got seek {:?}", pos));

        self.cursor = match pos {
            SeekFrom::Start(offset) => i64::try_from(offset).map_err(|_| Error::InvalidSeek)?,
            SeekFrom::Current(delta) => self.cursor.checked_add(delta).ok_or(Error::InvalidSeek)?,
            SeekFrom::End(_) => return Err(Error::SeekFromEndUnsupported),
        };

        Ok(self.cursor)
    }

    /// Total size of the resource, from the `Content-Length` of a HEAD request.
    pub async fn size(&mut self) -> Result<u64> {
        let request = self.request(Method::HEAD)?;
        let response = self.client()?.execute(request).await?;

        let size = response.content_length().ok_or(Error::NoContentLength)?;

        self.debug(format_args!("url: {}, size {}", self.url, size));
        Ok(size)
    }

    /// Serve the read from the last fetch if it covers the whole span.
    fn read_cached(&self, buf: &mut [u8], offset: i64) -> Option<usize> {
        let Some(cache) = self.cache.as_ref() else {
            self.debug(format_args!("cache miss: cache empty"));
            return None;
        };
        let cache_end = self.cache_start.saturating_add(cache.len() as i64);
        let Some(end) = offset.checked_add(buf.len() as i64) else {
            self.debug(format_args!("cache miss: range at {} overflows", offset));
            return None;
        };

        if offset >= self.cache_start && end <= cache_end {
            let start = (offset - self.cache_start) as usize;
            buf.copy_from_slice(&cache[start..start + buf.len()]);
            self.debug(format_args!(
                "cache hit: range ({}-{}) is within cache ({}-{})",
                offset, end, self.cache_start, cache_end
            ));
            return Some(buf.len());
        }

        self.debug(format_args!(
            "cache miss: range ({}-{}) is NOT within cache ({}-{})",
            offset, end, self.cache_start, cache_end
        ));
        None
    }

    fn request(&mut self, method: Method) -> Result<Request> {
        let url = match self.parsed.clone() {
            Some(url) => url,
            None => {
                let url = Url::parse(&self.url).map_err(|source| Error::InvalidUrl {
                    url: self.url.clone(),
                    source,
                })?;
                self.parsed = Some(url.clone());
                url
            }
        };
        let mut request = Request::new(method, url);
        *request.version_mut() = Version::HTTP_11;
        Ok(request)
    }

    fn client(&mut self) -> Result<&dyn HttpClient> {
        let client: Box<dyn HttpClient> = match self.client.take() {
            Some(client) => client,
            None => Box::new(default_client(DEFAULT_TIMEOUT).map_err(Error::Client)?),
        };
        Ok(&**self.client.insert(client))
    }

    fn info(&self, args: fmt::Arguments<'_>) {
        if let Some(logger) = &self.logger {
            logger.info(args);
        }
    }

    fn debug(&self, args: fmt::Arguments<'_>) {
        if let Some(logger) = &self.logger {
            logger.debug(args);
        }
    }
}

impl fmt::Debug for RemoteRangeReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteRangeReader")
            .field("url", &self.url)
            .field("cursor", &self.cursor)
            .field("cache_start", &self.cache_start)
            .field("cache_len", &self.cache.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ReadAt for RemoteRangeReader {
    async fn read_at(&mut self, buf: &mut [u8], offset: i64) -> Result<usize> {
        RemoteRangeReader::read_at(self, buf, offset).await
    }

    async fn size(&mut self) -> Result<u64> {
        RemoteRangeReader::size(self).await
    }
}

#[async_trait]
impl ReadSeek for RemoteRangeReader {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        RemoteRangeReader::read(self, buf).await
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<i64> {
        RemoteRangeReader::seek(self, pos)
    }
}

/// Inclusive `Range` header value for `len` bytes starting at `from`.
fn format_range(from: i64, len: i64) -> String {
    let to = if len == 0 { from } else { from.saturating_add(len - 1) };
    format!("bytes={}-{}", from, to)
}
