//! In-memory HTTP server stand-in shared by the unit tests.

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_LENGTH, HeaderMap, HeaderValue, RANGE};
use reqwest::{Method, Request, StatusCode};
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::io::{HttpClient, HttpResponse, Logger, RemoteRangeReader};

/// What the mock saw for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seen {
    pub method: Method,
    pub range: Option<String>,
}

/// Serves `body` the way a range-capable server would.
#[derive(Clone)]
pub struct MockClient {
    body: Bytes,
    status: Option<StatusCode>,
    content_length: bool,
    fail: bool,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl MockClient {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            status: None,
            content_length: true,
            fail: false,
            seen: Arc::default(),
        }
    }

    /// Answer every GET with `status` instead of 206.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Leave `Content-Length` out of HEAD responses.
    pub fn without_content_length(mut self) -> Self {
        self.content_length = false;
        self
    }

    /// Fail every exchange as if the network were down.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn gets(&self) -> Vec<String> {
        self.seen()
            .into_iter()
            .filter(|s| s.method == Method::GET)
            .filter_map(|s| s.range)
            .collect()
    }

    /// A reader over this mock, sharing its request log.
    pub fn reader(&self) -> RemoteRangeReader {
        RemoteRangeReader::new("https://example.com/archive").with_client(Box::new(self.clone()))
    }

    fn slice(&self, range: &str) -> Result<Bytes> {
        let spec = range
            .strip_prefix("bytes=")
            .ok_or_else(|| anyhow!("unexpected range {range}"))?;
        let (start, end) = spec
            .split_once('-')
            .ok_or_else(|| anyhow!("unexpected range {range}"))?;
        let start: usize = start.parse()?;
        let end: usize = end.parse()?;
        if end < start {
            bail!("inverted range {range}");
        }

        let len = self.body.len();
        let start = start.min(len);
        let end = (end + 1).min(len);
        Ok(self.body.slice(start..end))
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn execute(&self, request: Request) -> Result<HttpResponse> {
        let range = request
            .headers()
            .get(RANGE)
            .map(|v| v.to_str().map(str::to_owned))
            .transpose()?;
        self.seen.lock().unwrap().push(Seen {
            method: request.method().clone(),
            range: range.clone(),
        });

        if self.fail {
            bail!("connection refused");
        }

        let mut headers = HeaderMap::new();
        if *request.method() == Method::HEAD {
            if self.content_length {
                headers.insert(CONTENT_LENGTH, HeaderValue::from(self.body.len()));
            }
            return Ok(HttpResponse {
                status: StatusCode::OK,
                headers,
                body: Bytes::new(),
            });
        }

        let body = match range {
            Some(range) => self.slice(&range)?,
            None => self.body.clone(),
        };
        headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));

        Ok(HttpResponse {
            status: self.status.unwrap_or(StatusCode::PARTIAL_CONTENT),
            headers,
            body,
        })
    }
}

/// Logger that remembers everything it was told.
#[derive(Clone, Default)]
pub struct RecordingLogger {
    pub lines: Arc<Mutex<Vec<String>>>,
}

impl Logger for RecordingLogger {
    fn info(&self, args: fmt::Arguments<'_>) {
        self.lines.lock().unwrap().push(format!("[INFO] {args}"));
    }

    fn debug(&self, args: fmt::Arguments<'_>) {
        self.lines.lock().unwrap().push(format!("[DEBUG] {args}"));
    }
}

/// A STORED archive holding `files`, followed by `comment`.
pub fn build_zip(files: &[(&str, &[u8])], comment: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut central = Vec::new();

    for (name, data) in files {
        let offset = out.len() as u32;

        out.extend_from_slice(b"PK\x03\x04");
        out.extend_from_slice(&[20, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        out.extend_from_slice(&0u32.to_le_bytes()); // crc32
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(data);

        central.extend_from_slice(crate::zip::CDFH_SIGNATURE);
        central.extend_from_slice(&[20, 0, 20, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        central.extend_from_slice(&0u32.to_le_bytes());
        central.extend_from_slice(&(data.len() as u32).to_le_bytes());
        central.extend_from_slice(&(data.len() as u32).to_le_bytes());
        central.extend_from_slice(&(name.len() as u16).to_le_bytes());
        central.extend_from_slice(&[0; 12]); // extra, comment, disk, attrs
        central.extend_from_slice(&offset.to_le_bytes());
        central.extend_from_slice(name.as_bytes());
    }

    let cd_offset = out.len() as u32;
    out.extend_from_slice(&central);

    out.extend_from_slice(crate::zip::EndOfCentralDirectory::SIGNATURE);
    out.extend_from_slice(&[0, 0, 0, 0]);
    out.extend_from_slice(&(files.len() as u16).to_le_bytes());
    out.extend_from_slice(&(files.len() as u16).to_le_bytes());
    out.extend_from_slice(&(central.len() as u32).to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());
    out.extend_from_slice(&(comment.len() as u16).to_le_bytes());
    out.extend_from_slice(comment);
    out
}

/// A ustar header block with a valid checksum.
pub fn tar_header(name: &str, size: u64, typeflag: u8) -> [u8; 512] {
    let mut block = [0u8; 512];
    block[..name.len()].copy_from_slice(name.as_bytes());
    block[100..108].copy_from_slice(b"0000644\0");
    block[108..116].copy_from_slice(b"0001750\0");
    block[116..124].copy_from_slice(b"0001750\0");
    block[124..136].copy_from_slice(format!("{size:011o}\0").as_bytes());
    block[136..148].copy_from_slice(b"14712345670\0");
    block[156] = typeflag;
    block[257..263].copy_from_slice(b"ustar\0");
    block[263..265].copy_from_slice(b"00");
    seal_tar_header(&mut block);
    block
}

/// Recompute the checksum after editing a header.
pub fn seal_tar_header(block: &mut [u8; 512]) {
    block[148..156].copy_from_slice(b"        ");
    let sum: u32 = block.iter().map(|&b| b as u32).sum();
    block[148..156].copy_from_slice(format!("{sum:06o}\0 ").as_bytes());
}

/// A tar archive of `(name, typeflag, data)` records with its end marker.
pub fn build_tar(records: &[(&str, u8, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    for (name, typeflag, data) in records {
        out.extend_from_slice(&tar_header(name, data.len() as u64, *typeflag));
        out.extend_from_slice(data);
        out.resize(out.len().div_ceil(512) * 512, 0);
    }
    out.extend_from_slice(&[0u8; 1024]);
    out
}
