//! wiremock stand-in for the remote zoo service.
//!
//! [`ZooServiceStub::with_fixtures`] serves two zoos: monkeys 1 and 2 live
//! in zoo 1, monkeys 3 and 4 in zoo 2. Unknown ids answer 404 with the zoo
//! service's `BadId` error body.
//!
//! # Patterns
//!
//! - **Timeout simulation**: `ResponseTemplate::new(200).set_delay(..)` longer
//!   than the client timeout
//! - **Attempt counting**: `.expect(n)` on a mock, verified when the server drops

use std::time::Duration;

use serde_json::{json, Value};
use zookeeper_api::zoo_service::{HttpZooService, RequestClient};

pub use wiremock::matchers::{method, path, path_regex};
pub use wiremock::MockServer;
pub use wiremock::{Mock, ResponseTemplate};

/// A running mock zoo service.
pub struct ZooServiceStub {
    pub server: MockServer,
}

fn monkey(id: i64, zoo_id: i64) -> Value {
    json!({"id": id, "zoo_id": zoo_id})
}

fn zoo(id: i64, monkeys: &[i64]) -> Value {
    json!({
        "id": id,
        "monkeys": monkeys.iter().map(|m| monkey(*m, id)).collect::<Vec<_>>(),
    })
}

/// The error body the zoo service answers for unknown ids.
pub fn bad_id(id: &str) -> Value {
    json!({"error": 404, "title": "not found", "error_type": "BadId", "text": format!("id: {id}")})
}

impl ZooServiceStub {
    /// A server with no routes mounted.
    pub async fn empty() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// A server answering the fixture zoos and monkeys for GET and HEAD.
    pub async fn with_fixtures() -> Self {
        let stub = Self::empty().await;
        let zoos = [zoo(1, &[1, 2]), zoo(2, &[3, 4])];
        let monkeys = [monkey(1, 1), monkey(2, 1), monkey(3, 2), monkey(4, 2)];

        stub.mount_json("/zoos/", json!(zoos)).await;
        stub.mount_json("/monkeys/", json!(monkeys)).await;
        for z in &zoos {
            stub.mount_json(&format!("/zoos/{}", z["id"]), z.clone()).await;
        }
        for m in &monkeys {
            stub.mount_json(&format!("/monkeys/{}", m["id"]), m.clone())
                .await;
        }

        // Lowest priority: anything else under /zoos/ or /monkeys/ is unknown.
        Mock::given(path_regex(r"^/(zoos|monkeys)/\d+$"))
            .respond_with(ResponseTemplate::new(404).set_body_json(bad_id("unknown")))
            .with_priority(u8::MAX)
            .mount(&stub.server)
            .await;

        stub
    }

    /// Serve `body` on `route` for both GET and HEAD.
    pub async fn mount_json(&self, route: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
        Mock::given(method("HEAD"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.server)
            .await;
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// A gateway pointed at this stub with a short timeout.
    pub fn gateway(&self, timeout: Duration, max_attempts: u32) -> HttpZooService {
        HttpZooService::with_requests(self.uri(), RequestClient::new(timeout, max_attempts))
    }
}
