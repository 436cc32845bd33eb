use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outbound HTTP settings for page fetching
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds, covering connect and body (default: 10)
    pub timeout_secs: u64,

    /// Maximum redirect hops before giving up (default: 5)
    pub max_redirects: usize,

    /// User agent string to send
    pub user_agent: String,

    /// Bytes of body kept per page; the rest is not downloaded (default: 2 MiB)
    pub max_body_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_redirects: 5,
            user_agent: concat!("pagemeta/", env!("CARGO_PKG_VERSION")).to_string(),
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

impl FetchConfig {
    /// Get the request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
