use bytes::Bytes;
use thiserror::Error;

/// All different error types this crate uses.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// Received a good non success Http response
    #[error("Expected a 2xx Success but got: {status}")]
    NoHttpSuccessResponse {
        /// Status code of the response.
        status: reqwest::StatusCode,
    },
    /// Failed to get a response.
    #[error("Request failed: {error}")]
    HttpRequestFailure {
        /// The reqwest error.
        #[from]
        error: reqwest::Error,
    },
    /// Failed to read a document.
    #[error("Failed to read document")]
    ReadDocumentError {
        /// The content that resulted in the error.
        body: Bytes,
    },
    /// The response was served but consists of a CAPTCHA or consent
    /// interstitial instead of content.
    #[error("Content blocked for {url}")]
    BlockedContent {
        /// The url that served the interstitial.
        url: String,
    },
    /// A browser backend was requested that is not compiled in or not
    /// reachable.
    #[error("Browser backend {backend} is not available")]
    BackendUnavailable {
        /// Name of the missing backend.
        backend: &'static str,
    },
}
