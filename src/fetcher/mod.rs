mod config;
pub mod http_fetcher;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

pub use config::FetchConfig;
pub use http_fetcher::HttpFetcher;

/// A page retrieved with a 2xx status.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    /// URL after following redirects
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Why a page could not be fetched.
///
/// The `Display` output is what gets recorded as a failed task's message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Too many redirects (limit {0})")]
    TooManyRedirects(usize),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("HTTP {code} {reason}")]
    Status { code: u16, reason: String },

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Request failed: {0}")]
    Request(String),
}

#[async_trait]
pub trait Fetcher {
    /// Fetch `url`, following redirects up to the configured cap.
    ///
    /// Non-2xx responses are errors.
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// Parse a stored task URL, defaulting to `http://` when no scheme is given.
pub fn normalize_url(raw: &str) -> Result<Url, FetchError> {
    let raw = raw.trim();
    let lower = raw.to_ascii_lowercase();
    let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    };

    Url::parse(&candidate).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_scheme() {
        let url = normalize_url("192.168.1.1/path?q=1").unwrap();
        assert_eq!(url.as_str(), "http://192.168.1.1/path?q=1");
    }

    #[test]
    fn test_normalize_keeps_https() {
        let url = normalize_url("HTTPS://Example.com/a").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert!(matches!(
            normalize_url("http://"),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_error_messages_are_distinct() {
        let timeout = FetchError::Timeout(10).to_string();
        let status = FetchError::Status {
            code: 404,
            reason: "Not Found".into(),
        }
        .to_string();
        assert_eq!(status, "HTTP 404 Not Found");
        assert_ne!(timeout, status);
        assert!(!timeout.is_empty());
    }
}
