//! Zoo service client module.
//!
//! Provides the outbound HTTP layer for the remote zoo service that owns
//! zoos and monkeys.
//!
//! # Architecture
//!
//! - [`RequestClient`] - GET/HEAD with a per-attempt timeout, retried on
//!   timeout, failing fast on connection errors
//! - [`ZooServiceApi`] - Trait defining the domain operations
//! - [`HttpZooService`] - Real implementation on top of `RequestClient`
//! - [`mock::MockZooService`] - Fixture-backed mock (behind `test-utils` feature)
//!
//! # Testing Patterns
//!
//! ## Unit Tests (Mock Implementation)
//!
//! ```ignore
//! use zookeeper_api::zoo_service::mock::MockZooService;
//!
//! let zoo_service = MockZooService::with_fixtures();
//! assert!(zoo_service.has_zoo(1).await?);
//! ```
//!
//! ## Integration Tests (HTTP Stubbing)
//!
//! Point [`HttpZooService`] at a `wiremock` server; delayed responses
//! exercise the timeout path and `expect(n)` verifies the attempt count.

mod client;
mod error;
mod request;
mod types;

pub use client::{HttpZooService, ZooServiceApi};
pub use error::ZooServiceError;
pub use request::{
    RemoteResponse, RequestClient, RequestMethod, DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT,
};
pub use types::{ErrorBody, MonkeyRef};

#[cfg(any(test, feature = "test-utils"))]
pub use client::mock;
