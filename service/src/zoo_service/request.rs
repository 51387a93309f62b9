//! Retry-with-timeout wrapper for outbound zoo service requests.
//!
//! Every attempt is bounded by a fixed timeout. Timed-out attempts are
//! retried immediately until `max_attempts` is reached; any other transport
//! failure (connection refused, DNS, TLS, ...) ends the call at once.
//! Both outcomes surface as [`ZooServiceError::NoResponse`].

use std::time::Duration;

use reqwest::{Method, StatusCode};

use super::error::ZooServiceError;
use super::types::ErrorBody;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default number of attempts before giving up on a timing-out remote.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// HTTP methods the zoo service is queried with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Head,
}

impl RequestMethod {
    fn as_reqwest(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Head => Method::HEAD,
        }
    }
}

/// A fully read response from the remote service.
///
/// The body is buffered inside the attempt so that a stalled body counts
/// against the same timeout as the headers.
#[derive(Debug, Clone)]
pub struct RemoteResponse {
    pub status: StatusCode,
    pub url: String,
    pub body: Vec<u8>,
}

/// Sends GET/HEAD requests with a per-attempt timeout and bounded retries.
#[derive(Debug, Clone)]
pub struct RequestClient {
    client: reqwest::Client,
    timeout: Duration,
    max_attempts: u32,
}

impl Default for RequestClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_MAX_ATTEMPTS)
    }
}

impl RequestClient {
    /// Create a client with the given per-attempt timeout and attempt budget.
    ///
    /// An attempt budget of zero is treated as one.
    #[must_use]
    pub fn new(timeout: Duration, max_attempts: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
            max_attempts: max_attempts.max(1),
        }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Send `method` to `address`, retrying on timeout.
    ///
    /// Any HTTP status is a successful call here; interpreting non-2xx
    /// responses is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns [`ZooServiceError::NoResponse`] when every attempt timed out,
    /// or immediately on a non-timeout transport failure.
    pub async fn send(
        &self,
        address: &str,
        method: RequestMethod,
    ) -> Result<RemoteResponse, ZooServiceError> {
        for attempt in 1..=self.max_attempts {
            tracing::debug!(address, ?method, attempt, "sending zoo service request");

            match self.attempt(address, method).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_timeout() => {
                    tracing::warn!(
                        address,
                        attempt,
                        max_attempts = self.max_attempts,
                        "zoo service request timed out"
                    );
                }
                Err(err) => {
                    tracing::error!(address, error = %err, "zoo service unreachable");
                    return Err(ZooServiceError::NoResponse(ErrorBody::no_response(
                        err.to_string(),
                    )));
                }
            }
        }

        tracing::error!(
            address,
            max_attempts = self.max_attempts,
            "zoo service request attempts exhausted"
        );
        Err(ZooServiceError::NoResponse(ErrorBody::no_response(format!(
            "at address: {address}, attempts: {}, timeout after: {} seconds",
            self.max_attempts,
            format_seconds(self.timeout)
        ))))
    }

    async fn attempt(
        &self,
        address: &str,
        method: RequestMethod,
    ) -> Result<RemoteResponse, reqwest::Error> {
        let response = self
            .client
            .request(method.as_reqwest(), address)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        let url = response.url().to_string();
        let body = response.bytes().await?.to_vec();

        Ok(RemoteResponse { status, url, body })
    }
}

/// Render a duration the way it appears in the timeout payload ("2", "0.25").
fn format_seconds(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        duration.as_secs().to_string()
    } else {
        duration.as_secs_f64().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let client = RequestClient::default();
        assert_eq!(client.timeout(), Duration::from_secs(2));
        assert_eq!(client.max_attempts(), 3);
    }

    #[test]
    fn zero_attempts_is_one() {
        let client = RequestClient::new(DEFAULT_TIMEOUT, 0);
        assert_eq!(client.max_attempts(), 1);
    }

    #[test]
    fn seconds_formatting() {
        assert_eq!(format_seconds(Duration::from_secs(2)), "2");
        assert_eq!(format_seconds(Duration::from_millis(250)), "0.25");
        assert_eq!(format_seconds(Duration::from_millis(1500)), "1.5");
    }
}
