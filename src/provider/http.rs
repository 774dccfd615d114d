//! Blocking HTTP client shared by all remote providers.

use super::ProviderError;
use crate::config::HttpConfig;
use log::{debug, trace};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use std::thread;
use std::time::Duration;

/// Base delay between retries, multiplied by the attempt number
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// HTTP client with a request timeout and bounded retry.
///
/// Transport errors and 5xx responses are retried up to `retries` extra
/// times; 4xx responses fail immediately.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retries: u32,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|source| ProviderError::Http { url: String::new(), source })?;

        Ok(Self { client, retries: config.retries })
    }

    /// GET a URL and return the body bytes.
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.get_once(url) {
                Ok(bytes) => return Ok(bytes),
                Err(err) if attempt < self.retries && is_retryable(&err) => {
                    attempt += 1;
                    debug!("retrying {} ({}/{}): {}", url, attempt, self.retries, err);
                    thread::sleep(RETRY_BACKOFF * attempt);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// GET a URL and decode the body as UTF-8 text.
    pub fn get_text(&self, url: &str) -> Result<String, ProviderError> {
        let bytes = self.get_bytes(url)?;
        String::from_utf8(bytes)
            .map_err(|e| ProviderError::Format(format!("{} returned non UTF-8 text: {}", url, e)))
    }

    /// GET a URL and deserialize the JSON body.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProviderError> {
        let bytes = self.get_bytes(url)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// GET a URL, treating any failure as a miss.
    pub fn try_get_bytes(&self, url: &str) -> Option<Vec<u8>> {
        match self.get_bytes(url) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                trace!("miss: {}", err);
                None
            }
        }
    }

    fn get_once(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let http_err = |source| ProviderError::Http { url: url.to_string(), source };

        let response = self.client.get(url).send().map_err(http_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status { url: url.to_string(), status: status.as_u16() });
        }

        let body = response.bytes().map_err(http_err)?;
        Ok(body.to_vec())
    }
}

fn is_retryable(err: &ProviderError) -> bool {
    match err {
        ProviderError::Http { .. } => true,
        ProviderError::Status { status, .. } => *status >= 500,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_from_default_config() {
        let client = HttpClient::new(&HttpConfig::default()).expect("client should build");
        assert_eq!(client.retries, HttpConfig::default().retries);
    }

    #[test]
    fn test_retryable_statuses() {
        let server = ProviderError::Status { url: "u".into(), status: 503 };
        let missing = ProviderError::Status { url: "u".into(), status: 404 };
        assert!(is_retryable(&server));
        assert!(!is_retryable(&missing));
        assert!(!is_retryable(&ProviderError::Format("bad".into())));
    }
}
