//! Test app builder that mirrors main.rs wiring with injectable deps/mocks.
//!
//! ```ignore
//! use crate::common::app_builder::TestAppBuilder;
//!
//! let app = TestAppBuilder::with_mocks().build();
//! // app.oneshot(...)
//! ```

use std::sync::Arc;

use axum::Router;
use zookeeper_api::{
    config::{CorsConfig, SecurityHeadersConfig},
    http::build_app,
    keepers::{mock::InMemoryKeeperRepo, DependencyPolicy, KeeperRepo, KeeperService},
    zoo_service::{mock::MockZooService, ZooServiceApi},
};

/// Builder for test applications using the production [`build_app`].
pub struct TestAppBuilder {
    repo: Arc<dyn KeeperRepo>,
    zoo_service: Arc<dyn ZooServiceApi>,
    policy: DependencyPolicy,
    cors: CorsConfig,
    security_headers: SecurityHeadersConfig,
}

impl TestAppBuilder {
    /// In-memory store and the fixture zoo service mock.
    pub fn with_mocks() -> Self {
        Self {
            repo: Arc::new(InMemoryKeeperRepo::new()),
            zoo_service: Arc::new(MockZooService::with_fixtures()),
            policy: DependencyPolicy::FailClosed,
            cors: CorsConfig::default(),
            security_headers: SecurityHeadersConfig::default(),
        }
    }

    #[must_use]
    pub fn with_zoo_service(mut self, zoo_service: Arc<dyn ZooServiceApi>) -> Self {
        self.zoo_service = zoo_service;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: DependencyPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_cors(mut self, origins: &[&str]) -> Self {
        self.cors = CorsConfig {
            allowed_origins: origins.iter().map(|o| (*o).to_string()).collect(),
        };
        self
    }

    #[must_use]
    pub fn without_security_headers(mut self) -> Self {
        self.security_headers.enabled = false;
        self
    }

    pub fn build(self) -> Router {
        let service = KeeperService::new(self.repo, self.zoo_service, self.policy);
        build_app(Arc::new(service), &self.cors, &self.security_headers)
    }
}
