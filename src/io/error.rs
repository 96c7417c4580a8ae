use thiserror::Error;

/// Errors returned by [`RemoteRangeReader`](super::RemoteRangeReader).
#[derive(Debug, Error)]
pub enum Error {
    /// No bytes are available at the requested position.
    #[error("end of data")]
    Eof,
    #[error("seek relative to end is not implemented")]
    SeekFromEndUnsupported,
    #[error("invalid seek position")]
    InvalidSeek,
    #[error("no content length for size()")]
    NoContentLength,
    #[error("invalid url {url:?}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid range header")]
    InvalidRange(#[from] reqwest::header::InvalidHeaderValue),
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),
    /// Failure reported by the [`HttpClient`](super::HttpClient), untouched.
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl Error {
    pub fn is_eof(&self) -> bool {
        matches!(self, Error::Eof)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
