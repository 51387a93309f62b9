//! Referential checks of keeper references against the zoo service.
//!
//! Rules:
//! - a zoo reference must name an existing zoo
//! - a favorite monkey must exist and live in the keeper's zoo
//! - a dream monkey must exist and live in a different zoo than the keeper's
//! - a monkey reference without a zoo reference is never valid
//!
//! Absent references are always valid.

use std::fmt;
use std::sync::Arc;

use super::model::References;
use crate::zoo_service::{ZooServiceApi, ZooServiceError};

/// What to do when the zoo service cannot answer during validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DependencyPolicy {
    /// Remote failures reject the write.
    #[default]
    FailClosed,
    /// Remote failures are logged and the reference is accepted.
    FailOpen,
}

impl DependencyPolicy {
    #[must_use]
    pub const fn from_fail_open(fail_open: bool) -> Self {
        if fail_open {
            Self::FailOpen
        } else {
            Self::FailClosed
        }
    }
}

/// A reference that does not match the zoo service's current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceViolation {
    Zoo {
        zoo_id: i64,
    },
    FavoriteMonkey {
        monkey_id: i64,
        zoo_id: Option<i64>,
    },
    DreamMonkey {
        monkey_id: i64,
        zoo_id: Option<i64>,
    },
}

impl ReferenceViolation {
    /// Name of the offending payload field.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Zoo { .. } => "zoo_id",
            Self::FavoriteMonkey { .. } => "favorite_monkey_id",
            Self::DreamMonkey { .. } => "dream_monkey_id",
        }
    }
}

impl fmt::Display for ReferenceViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let zoo = |zoo_id: Option<i64>| {
            zoo_id.map_or_else(|| "None".to_string(), |id| id.to_string())
        };
        match self {
            Self::Zoo { zoo_id } => write!(f, "zoo: \"{zoo_id}\" does not exist"),
            Self::FavoriteMonkey { monkey_id, zoo_id } => write!(
                f,
                "monkey: \"{monkey_id}\" does not exist or is not in zoo: \"{}\"",
                zoo(*zoo_id)
            ),
            Self::DreamMonkey { monkey_id, zoo_id } => write!(
                f,
                "monkey: \"{monkey_id}\" does not exist or IS in zoo: \"{}\"",
                zoo(*zoo_id)
            ),
        }
    }
}

impl std::error::Error for ReferenceViolation {}

/// Validation outcome other than success.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error(transparent)]
    Violation(#[from] ReferenceViolation),

    /// The zoo service could not be consulted (fail-closed only).
    #[error(transparent)]
    Unavailable(#[from] ZooServiceError),
}

/// Checks keeper references against the zoo service.
#[derive(Clone)]
pub struct ReferenceValidator {
    zoo_service: Arc<dyn ZooServiceApi>,
    policy: DependencyPolicy,
}

impl ReferenceValidator {
    pub fn new(zoo_service: Arc<dyn ZooServiceApi>, policy: DependencyPolicy) -> Self {
        Self {
            zoo_service,
            policy,
        }
    }

    /// Whether `zoo_id` is acceptable. `None` always is.
    ///
    /// # Errors
    ///
    /// Propagates zoo service failures.
    pub async fn is_zoo_ok(&self, zoo_id: Option<i64>) -> Result<bool, ZooServiceError> {
        match zoo_id {
            None => Ok(true),
            Some(id) => self.zoo_service.has_zoo(id).await,
        }
    }

    /// Whether `monkey_id` exists and lives in `zoo_id`.
    ///
    /// # Errors
    ///
    /// Propagates zoo service failures.
    pub async fn is_favorite_monkey_ok(
        &self,
        monkey_id: Option<i64>,
        zoo_id: Option<i64>,
    ) -> Result<bool, ZooServiceError> {
        let Some(monkey_id) = monkey_id else {
            return Ok(true);
        };
        let Some(zoo_id) = zoo_id else {
            return Ok(false);
        };
        if !self.zoo_service.has_monkey(monkey_id).await? {
            return Ok(false);
        }
        self.zoo_service.is_monkey_in_zoo(monkey_id, zoo_id).await
    }

    /// Whether `monkey_id` exists and lives outside `zoo_id`.
    ///
    /// # Errors
    ///
    /// Propagates zoo service failures.
    pub async fn is_dream_monkey_ok(
        &self,
        monkey_id: Option<i64>,
        zoo_id: Option<i64>,
    ) -> Result<bool, ZooServiceError> {
        let Some(monkey_id) = monkey_id else {
            return Ok(true);
        };
        let Some(zoo_id) = zoo_id else {
            return Ok(false);
        };
        if !self.zoo_service.has_monkey(monkey_id).await? {
            return Ok(false);
        }
        Ok(!self.zoo_service.is_monkey_in_zoo(monkey_id, zoo_id).await?)
    }

    /// Check zoo, then favorite monkey, then dream monkey, stopping at the
    /// first violation.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Violation`] naming the offending reference,
    /// or [`ValidationError::Unavailable`] when the zoo service fails and the
    /// policy is fail-closed.
    pub async fn check(&self, refs: &References) -> Result<(), ValidationError> {
        let zoo_ok = self.is_zoo_ok(refs.zoo_id).await;
        if !self.tolerate("zoo_id", zoo_ok)? {
            // Only reachable with a concrete id: None is always ok.
            return Err(ReferenceViolation::Zoo {
                zoo_id: refs.zoo_id.unwrap_or_default(),
            }
            .into());
        }

        if let Some(monkey_id) = refs.favorite_monkey_id {
            let ok = self
                .is_favorite_monkey_ok(Some(monkey_id), refs.zoo_id)
                .await;
            if !self.tolerate("favorite_monkey_id", ok)? {
                return Err(ReferenceViolation::FavoriteMonkey {
                    monkey_id,
                    zoo_id: refs.zoo_id,
                }
                .into());
            }
        }

        if let Some(monkey_id) = refs.dream_monkey_id {
            let ok = self.is_dream_monkey_ok(Some(monkey_id), refs.zoo_id).await;
            if !self.tolerate("dream_monkey_id", ok)? {
                return Err(ReferenceViolation::DreamMonkey {
                    monkey_id,
                    zoo_id: refs.zoo_id,
                }
                .into());
            }
        }

        Ok(())
    }

    /// Apply the dependency policy to a single check result.
    fn tolerate(
        &self,
        field: &'static str,
        result: Result<bool, ZooServiceError>,
    ) -> Result<bool, ValidationError> {
        match (result, self.policy) {
            (Ok(ok), _) => Ok(ok),
            (Err(err), DependencyPolicy::FailOpen) => {
                tracing::warn!(
                    field,
                    error = %err,
                    "zoo service unavailable during validation, accepting reference"
                );
                Ok(true)
            }
            (Err(err), DependencyPolicy::FailClosed) => Err(ValidationError::Unavailable(err)),
        }
    }
}
