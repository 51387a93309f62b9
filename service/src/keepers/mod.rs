//! Zoo keeper records.
//!
//! Keepers are stored locally and reference zoos and monkeys owned by the
//! zoo service.
//!
//! - [`model`] - keeper records and their references
//! - [`payload`] - key-set checks and typed parsing of write payloads
//! - [`validator`] - reference checks against the zoo service
//! - [`repo`] - persistence ([`PgKeeperRepo`], in-memory mock for tests)
//! - [`service`] - [`KeeperService`], enrichment and CRUD orchestration
//! - [`http`] - axum routes

pub mod error;
pub mod http;
pub mod model;
pub mod payload;
pub mod repo;
pub mod service;
pub mod validator;

pub use error::KeeperError;
pub use model::{Keeper, NewKeeper, References};
pub use payload::{KeeperPatch, PayloadError};
pub use repo::{KeeperRepo, KeeperRepoError, PgKeeperRepo};
pub use service::KeeperService;
pub use validator::{DependencyPolicy, ReferenceValidator, ReferenceViolation, ValidationError};

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    pub use super::repo::mock::InMemoryKeeperRepo;
}
