//! Blocking HTTP access behind a small trait so the collector can run
//! against a scripted client in tests.

use std::time::Duration;

use crate::error::{CollectorError, Result};

/// Status and body of a completed request. Non-success statuses are
/// returned here, not as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// 5xx and 429 are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        self.status >= 500 || self.status == 429
    }
}

pub trait HttpClient {
    /// Issue a GET. Transport failures (DNS, connect, timeout, broken body)
    /// are returned as [`CollectorError::Network`].
    fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// Production client backed by `reqwest::blocking`.
pub struct ReqwestClient {
    inner: reqwest::blocking::Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let inner = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.to_string())
            .build()?;
        Ok(Self { inner })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        let network_error = |e: reqwest::Error| CollectorError::Network {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.inner.get(url).send().map_err(network_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(network_error)?;

        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(HttpResponse::new(200, "ok").is_success());
        assert!(HttpResponse::new(404, "").is_not_found());
        assert!(!HttpResponse::new(404, "").is_retryable());
        assert!(HttpResponse::new(503, "").is_retryable());
        assert!(HttpResponse::new(429, "").is_retryable());
        assert!(!HttpResponse::new(403, "").is_retryable());
    }

    #[test]
    fn test_reqwest_client_builds() {
        assert!(ReqwestClient::new(Duration::from_secs(5), "irish-weather-test").is_ok());
    }
}
