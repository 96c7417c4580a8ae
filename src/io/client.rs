use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_LENGTH, HeaderMap};
use reqwest::{Client, Request, StatusCode};
use std::time::Duration;

/// A fully received HTTP response.
///
/// The body is drained by the client before it is handed back, so the
/// connection is released no matter what the caller does with the status.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    /// Value of the `Content-Length` header, if present and non-negative.
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse().ok())
    }
}

/// Capability for performing a single HTTP exchange.
///
/// Implemented for [`reqwest::Client`]; tests substitute their own.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, request: Request) -> Result<HttpResponse>;
}

#[async_trait]
impl HttpClient for Client {
    async fn execute(&self, request: Request) -> Result<HttpResponse> {
        let resp = Client::execute(self, request).await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Build the client used when none was configured.
pub fn default_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder().timeout(timeout).build()
}
