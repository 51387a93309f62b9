//! Domain-shaped operations against the remote zoo service.
//!
//! [`HttpZooService`] builds on [`RequestClient`] and adds no resilience of
//! its own: it only shapes addresses and translates non-2xx responses into
//! [`ZooServiceError::BadResponse`]. `NoResponse` from the request client is
//! passed through unchanged.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};

use super::error::ZooServiceError;
use super::request::{RemoteResponse, RequestClient, RequestMethod};
use super::types::{ErrorBody, MonkeyRef};

/// Trait for zoo service operations.
///
/// Use [`HttpZooService`] for real HTTP calls, or
/// [`mock::MockZooService`] in tests.
#[async_trait]
pub trait ZooServiceApi: Send + Sync {
    /// Fetch every zoo.
    async fn get_all_zoos(&self) -> Result<Value, ZooServiceError>;

    /// Fetch every monkey.
    async fn get_all_monkeys(&self) -> Result<Value, ZooServiceError>;

    /// Fetch one zoo. `None` yields `{}` without a remote call.
    async fn get_zoo(&self, zoo_id: Option<i64>) -> Result<Value, ZooServiceError>;

    /// Fetch one monkey. `None` yields `{}` without a remote call.
    async fn get_monkey(&self, monkey_id: Option<i64>) -> Result<Value, ZooServiceError>;

    /// Whether the zoo exists (HEAD request; non-2xx is `false`).
    async fn has_zoo(&self, zoo_id: i64) -> Result<bool, ZooServiceError>;

    /// Whether the monkey exists (HEAD request; non-2xx is `false`).
    async fn has_monkey(&self, monkey_id: i64) -> Result<bool, ZooServiceError>;

    /// Whether the monkey's `zoo_id` equals `zoo_id`.
    ///
    /// Fails with `BadResponse` if the monkey does not exist.
    async fn is_monkey_in_zoo(
        &self,
        monkey_id: i64,
        zoo_id: i64,
    ) -> Result<bool, ZooServiceError>;
}

/// HTTP implementation of [`ZooServiceApi`].
pub struct HttpZooService {
    requests: RequestClient,
    zoo_addr: String,
    monkey_addr: String,
}

impl HttpZooService {
    /// Create a gateway for the service at `base_url` with default retry settings.
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self::with_requests(base_url, RequestClient::default())
    }

    /// Create a gateway with a custom request client (timeouts, attempts).
    pub fn with_requests(base_url: impl AsRef<str>, requests: RequestClient) -> Self {
        let base = base_url.as_ref().trim_end_matches('/');
        Self {
            requests,
            zoo_addr: format!("{base}/zoos/"),
            monkey_addr: format!("{base}/monkeys/"),
        }
    }

    #[must_use]
    pub fn zoo_addr(&self) -> &str {
        &self.zoo_addr
    }

    #[must_use]
    pub fn monkey_addr(&self) -> &str {
        &self.monkey_addr
    }

    #[must_use]
    pub const fn requests(&self) -> &RequestClient {
        &self.requests
    }

    async fn get_json(&self, address: &str) -> Result<Value, ZooServiceError> {
        let response = self.requests.send(address, RequestMethod::Get).await?;
        check_response(&response)?;
        decode_body(&response)
    }

    async fn exists(&self, address: &str) -> Result<bool, ZooServiceError> {
        let response = self.requests.send(address, RequestMethod::Head).await?;
        Ok(response.status.is_success())
    }
}

#[async_trait]
impl ZooServiceApi for HttpZooService {
    async fn get_all_zoos(&self) -> Result<Value, ZooServiceError> {
        self.get_json(&self.zoo_addr).await
    }

    async fn get_all_monkeys(&self) -> Result<Value, ZooServiceError> {
        self.get_json(&self.monkey_addr).await
    }

    async fn get_zoo(&self, zoo_id: Option<i64>) -> Result<Value, ZooServiceError> {
        match zoo_id {
            None => Ok(json!({})),
            Some(id) => self.get_json(&format!("{}{id}", self.zoo_addr)).await,
        }
    }

    async fn get_monkey(&self, monkey_id: Option<i64>) -> Result<Value, ZooServiceError> {
        match monkey_id {
            None => Ok(json!({})),
            Some(id) => self.get_json(&format!("{}{id}", self.monkey_addr)).await,
        }
    }

    async fn has_zoo(&self, zoo_id: i64) -> Result<bool, ZooServiceError> {
        self.exists(&format!("{}{zoo_id}", self.zoo_addr)).await
    }

    async fn has_monkey(&self, monkey_id: i64) -> Result<bool, ZooServiceError> {
        self.exists(&format!("{}{monkey_id}", self.monkey_addr)).await
    }

    async fn is_monkey_in_zoo(
        &self,
        monkey_id: i64,
        zoo_id: i64,
    ) -> Result<bool, ZooServiceError> {
        let monkey = self.get_monkey(Some(monkey_id)).await?;
        let monkey: MonkeyRef = serde_json::from_value(monkey).map_err(|err| {
            ZooServiceError::BadResponse(
                ErrorBody::new(
                    StatusCode::BAD_GATEWAY.as_u16(),
                    "bad gateway",
                    "BadResponse",
                    format!("unexpected monkey representation: {err}"),
                )
                .to_value(),
            )
        })?;
        Ok(monkey.zoo_id == Some(zoo_id))
    }
}

/// Translate a non-2xx response into `BadResponse`.
///
/// A JSON error body is carried verbatim; anything else is replaced by a
/// locally built payload naming the status and url.
fn check_response(response: &RemoteResponse) -> Result<(), ZooServiceError> {
    if response.status.is_success() {
        return Ok(());
    }

    tracing::debug!(
        status = response.status.as_u16(),
        url = %response.url,
        "zoo service returned an error response"
    );

    let body = serde_json::from_slice::<Value>(&response.body).unwrap_or_else(|_| {
        ErrorBody::new(
            response.status.as_u16(),
            response
                .status
                .canonical_reason()
                .unwrap_or("unknown")
                .to_lowercase(),
            "BadResponse",
            format!(
                "response code: {} for url: {}",
                response.status.as_u16(),
                response.url
            ),
        )
        .to_value()
    });
    Err(ZooServiceError::BadResponse(body))
}

fn decode_body(response: &RemoteResponse) -> Result<Value, ZooServiceError> {
    serde_json::from_slice(&response.body).map_err(|err| {
        ZooServiceError::BadResponse(
            ErrorBody::new(
                StatusCode::BAD_GATEWAY.as_u16(),
                "bad gateway",
                "BadResponse",
                format!("invalid JSON from {}: {err}", response.url),
            )
            .to_value(),
        )
    })
}

#[cfg(any(test, feature = "test-utils"))]
#[allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
pub mod mock {
    //! In-memory zoo service for unit tests.

    use super::{async_trait, json, ErrorBody, Value, ZooServiceApi, ZooServiceError};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Mock implementation of [`ZooServiceApi`] backed by fixture data.
    ///
    /// Unknown ids answer like the real service (`BadResponse` with a 404
    /// `BadId` body). Call [`MockZooService::set_unavailable`] to make every
    /// remote operation fail with `NoResponse`, and inspect
    /// [`MockZooService::calls`] to verify which remote operations ran.
    pub struct MockZooService {
        zoos: BTreeMap<i64, Value>,
        monkeys: BTreeMap<i64, Value>,
        unavailable: Mutex<bool>,
        calls: Mutex<Vec<String>>,
    }

    impl MockZooService {
        /// Empty service: no zoos, no monkeys.
        pub fn new() -> Self {
            Self {
                zoos: BTreeMap::new(),
                monkeys: BTreeMap::new(),
                unavailable: Mutex::new(false),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Two zoos; monkeys 1 and 2 live in zoo 1, monkeys 3 and 4 in zoo 2.
        pub fn with_fixtures() -> Self {
            Self::new().with_zoo(1, &[1, 2]).with_zoo(2, &[3, 4])
        }

        /// Add a zoo and its monkeys.
        pub fn with_zoo(mut self, zoo_id: i64, monkey_ids: &[i64]) -> Self {
            let mut monkeys = Vec::with_capacity(monkey_ids.len());
            for &id in monkey_ids {
                let monkey = json!({"id": id, "zoo_id": zoo_id});
                self.monkeys.insert(id, monkey.clone());
                monkeys.push(monkey);
            }
            self.zoos.insert(zoo_id, json!({"id": zoo_id, "monkeys": monkeys}));
            self
        }

        /// Add a monkey that belongs to no zoo.
        pub fn with_homeless_monkey(mut self, monkey_id: i64) -> Self {
            self.monkeys
                .insert(monkey_id, json!({"id": monkey_id, "zoo_id": null}));
            self
        }

        pub fn set_unavailable(&self, unavailable: bool) {
            *self.unavailable.lock().unwrap() = unavailable;
        }

        /// Remote operations performed so far, e.g. `"has_zoo(1)"`.
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) -> Result<(), ZooServiceError> {
            self.calls.lock().unwrap().push(call.clone());
            if *self.unavailable.lock().unwrap() {
                return Err(ZooServiceError::NoResponse(ErrorBody::no_response(
                    format!("mock zoo service unavailable: {call}"),
                )));
            }
            Ok(())
        }

        fn not_found(id: i64) -> ZooServiceError {
            ZooServiceError::BadResponse(
                ErrorBody::new(404, "not found", "BadId", format!("id: {id}")).to_value(),
            )
        }
    }

    impl Default for MockZooService {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ZooServiceApi for MockZooService {
        async fn get_all_zoos(&self) -> Result<Value, ZooServiceError> {
            self.record("get_all_zoos".to_string())?;
            Ok(Value::Array(self.zoos.values().cloned().collect()))
        }

        async fn get_all_monkeys(&self) -> Result<Value, ZooServiceError> {
            self.record("get_all_monkeys".to_string())?;
            Ok(Value::Array(self.monkeys.values().cloned().collect()))
        }

        async fn get_zoo(&self, zoo_id: Option<i64>) -> Result<Value, ZooServiceError> {
            let Some(id) = zoo_id else {
                return Ok(json!({}));
            };
            self.record(format!("get_zoo({id})"))?;
            self.zoos.get(&id).cloned().ok_or_else(|| Self::not_found(id))
        }

        async fn get_monkey(&self, monkey_id: Option<i64>) -> Result<Value, ZooServiceError> {
            let Some(id) = monkey_id else {
                return Ok(json!({}));
            };
            self.record(format!("get_monkey({id})"))?;
            self.monkeys
                .get(&id)
                .cloned()
                .ok_or_else(|| Self::not_found(id))
        }

        async fn has_zoo(&self, zoo_id: i64) -> Result<bool, ZooServiceError> {
            self.record(format!("has_zoo({zoo_id})"))?;
            Ok(self.zoos.contains_key(&zoo_id))
        }

        async fn has_monkey(&self, monkey_id: i64) -> Result<bool, ZooServiceError> {
            self.record(format!("has_monkey({monkey_id})"))?;
            Ok(self.monkeys.contains_key(&monkey_id))
        }

        async fn is_monkey_in_zoo(
            &self,
            monkey_id: i64,
            zoo_id: i64,
        ) -> Result<bool, ZooServiceError> {
            self.record(format!("is_monkey_in_zoo({monkey_id}, {zoo_id})"))?;
            let monkey = self
                .monkeys
                .get(&monkey_id)
                .ok_or_else(|| Self::not_found(monkey_id))?;
            Ok(monkey["zoo_id"].as_i64() == Some(zoo_id))
        }
    }
}
