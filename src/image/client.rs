//! HTTP client abstraction for image fetching.

use std::future::Future;

use thiserror::Error;
use tracing::{trace, warn};

/// Errors that can occur while fetching an image.
///
/// Every variant is recoverable: the cache layer turns any of these into a
/// `None` resolution rather than propagating them to the marker pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The server connection could not be established.
    #[error("connection failed: {0}")]
    Transport(String),
    /// The server responded with a non-success status code.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// A fetched image body plus the content type the server declared, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResponse {
    /// Raw image bytes.
    pub bytes: Vec<u8>,
    /// Value of the `Content-Type` header, if present.
    pub content_type: Option<String>,
}

/// Trait for fetching image bytes by URL.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock transports in tests.
pub trait ImageFetcher: Send + Sync {
    /// Fetches the image at `url`.
    ///
    /// # Returns
    ///
    /// The response body and declared content type, or a [`FetchError`]
    /// covering connection failure, an error status, or a body read failure.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<ImageResponse, FetchError>> + Send;
}

/// Default User-Agent string for image requests.
const DEFAULT_USER_AGENT: &str = concat!("markerkit/", env!("CARGO_PKG_VERSION"));

/// Real image fetcher backed by reqwest.
#[derive(Clone)]
pub struct ReqwestImageFetcher {
    client: reqwest::Client,
}

impl ReqwestImageFetcher {
    /// Creates a new fetcher with default configuration.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(30)
    }

    /// Creates a new fetcher with a custom request timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl ImageFetcher for ReqwestImageFetcher {
    async fn fetch(&self, url: &str) -> Result<ImageResponse, FetchError> {
        trace!(url = url, "image request starting");

        let response = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(url = url, error = %e, "could not initialize server connection while loading image");
                return Err(FetchError::Transport(e.to_string()));
            }
        };

        if !response.status().is_success() {
            warn!(
                url = url,
                status = response.status().as_u16(),
                "could not load image, server responded with error status"
            );
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        match response.bytes().await {
            Ok(bytes) => {
                trace!(url = url, bytes = bytes.len(), "image body read");
                Ok(ImageResponse {
                    bytes: bytes.to_vec(),
                    content_type,
                })
            }
            Err(e) => {
                warn!(url = url, error = %e, "failed to read image response body");
                Err(FetchError::Body(e.to_string()))
            }
        }
    }
}
