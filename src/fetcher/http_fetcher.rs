use std::error::Error as StdError;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect, Client, Response};

use crate::app::Result;
use crate::fetcher::{normalize_url, FetchConfig, FetchError, FetchedPage, Fetcher};

pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .redirect(redirect::Policy::limited(config.max_redirects))
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client, config })
    }

    /// Read at most `max_body_bytes` of the body. Metadata lives in the
    /// document head, so a truncated page still extracts.
    async fn read_capped(
        &self,
        mut response: Response,
    ) -> std::result::Result<Vec<u8>, FetchError> {
        let limit = self.config.max_body_bytes;
        let mut body = Vec::new();

        while let Some(chunk) = response.chunk().await.map_err(|e| self.classify(e))? {
            let room = limit - body.len();
            if chunk.len() > room {
                body.extend_from_slice(&chunk[..room]);
                tracing::debug!("Body of {} truncated at {} bytes", response.url(), limit);
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.config.timeout_secs)
        } else if err.is_redirect() {
            FetchError::TooManyRedirects(self.config.max_redirects)
        } else if err.is_connect() {
            FetchError::Connect(root_cause(&err))
        } else if err.is_body() || err.is_decode() {
            FetchError::Body(root_cause(&err))
        } else {
            FetchError::Request(root_cause(&err))
        }
    }
}

/// Innermost error message; reqwest wraps DNS and socket errors several
/// layers deep.
fn root_cause(err: &(dyn StdError + 'static)) -> String {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<FetchedPage, FetchError> {
        let url = normalize_url(url)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = self.read_capped(response).await?;

        tracing::debug!("Fetched {} ({} bytes)", final_url, body.len());

        Ok(FetchedPage {
            status: status.as_u16(),
            final_url,
            content_type,
            body,
        })
    }
}
