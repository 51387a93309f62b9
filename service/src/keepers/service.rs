//! Service layer for keeper operations
//!
//! [`KeeperService`] composes the keeper store with the zoo service: reads
//! are enriched with live zoo/monkey snapshots, writes are parsed, checked
//! against the zoo service and then persisted.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::error::KeeperError;
use super::model::{Keeper, NewKeeper};
use super::payload::KeeperPatch;
use super::repo::KeeperRepo;
use super::validator::{DependencyPolicy, ReferenceValidator};
use crate::zoo_service::{ZooServiceApi, ZooServiceError};

/// Orchestrates keeper persistence and zoo service lookups.
pub struct KeeperService {
    repo: Arc<dyn KeeperRepo>,
    zoo_service: Arc<dyn ZooServiceApi>,
    validator: ReferenceValidator,
}

impl KeeperService {
    pub fn new(
        repo: Arc<dyn KeeperRepo>,
        zoo_service: Arc<dyn ZooServiceApi>,
        policy: DependencyPolicy,
    ) -> Self {
        let validator = ReferenceValidator::new(zoo_service.clone(), policy);
        Self {
            repo,
            zoo_service,
            validator,
        }
    }

    /// Proxy the zoo list.
    ///
    /// # Errors
    ///
    /// Returns [`KeeperError::ZooService`] when the zoo service fails.
    pub async fn get_all_zoos(&self) -> Result<Value, KeeperError> {
        Ok(self.zoo_service.get_all_zoos().await?)
    }

    /// Proxy the monkey list.
    ///
    /// # Errors
    ///
    /// Returns [`KeeperError::ZooService`] when the zoo service fails.
    pub async fn get_all_monkeys(&self) -> Result<Value, KeeperError> {
        Ok(self.zoo_service.get_all_monkeys().await?)
    }

    /// All keepers ordered by id, each enriched.
    ///
    /// # Errors
    ///
    /// Returns [`KeeperError::Internal`] on store failure.
    pub async fn get_all_keepers(&self) -> Result<Value, KeeperError> {
        let keepers = self
            .repo
            .list()
            .await
            .map_err(|e| KeeperError::from_repo(e, None, ""))?;

        let mut views = Vec::with_capacity(keepers.len());
        for keeper in &keepers {
            views.push(self.enrich_keeper(keeper).await);
        }
        Ok(Value::Array(views))
    }

    /// One keeper, enriched.
    ///
    /// # Errors
    ///
    /// Returns [`KeeperError::BadId`] if no keeper has this id.
    pub async fn get_keeper(&self, id: i64) -> Result<Value, KeeperError> {
        let keeper = self.find(id).await?;
        Ok(self.enrich_keeper(&keeper).await)
    }

    /// The keeper's columns plus `zoo`, `dream_monkey` and `favorite_monkey`
    /// snapshots. A failed lookup embeds the error payload in place of the
    /// snapshot; enrichment never fails the whole view.
    pub async fn enrich_keeper(&self, keeper: &Keeper) -> Value {
        let mut view = keeper.columns();

        let zoo = self.zoo_service.get_zoo(keeper.zoo_id).await;
        view.insert("zoo".to_string(), embed(keeper.id, "zoo", zoo));

        let dream = self.zoo_service.get_monkey(keeper.dream_monkey_id).await;
        view.insert("dream_monkey".to_string(), embed(keeper.id, "dream_monkey", dream));

        let favorite = self.zoo_service.get_monkey(keeper.favorite_monkey_id).await;
        view.insert(
            "favorite_monkey".to_string(),
            embed(keeper.id, "favorite_monkey", favorite),
        );

        Value::Object(view)
    }

    /// Create a keeper from a write payload and return its enriched view.
    ///
    /// # Errors
    ///
    /// - [`KeeperError::BadData`] for a bad key set or unparseable value
    /// - [`KeeperError::InvalidReference`] for an inconsistent reference
    /// - [`KeeperError::ZooService`] if validation could not reach the zoo service
    /// - [`KeeperError::DuplicateName`] if the name is taken
    pub async fn post_keeper(&self, payload: &Map<String, Value>) -> Result<Value, KeeperError> {
        let new_keeper = NewKeeper::try_from(payload)?;
        self.validator.check(&new_keeper.references()).await?;

        let keeper = self
            .repo
            .create(&new_keeper)
            .await
            .map_err(|e| KeeperError::from_repo(e, None, &new_keeper.name))?;

        tracing::info!(keeper_id = keeper.id, name = %keeper.name, "zoo keeper created");
        self.get_keeper(keeper.id).await
    }

    /// Apply a partial update and return the enriched view.
    ///
    /// The key set is checked before the keeper is looked up, and references
    /// are re-validated over the resulting full state.
    ///
    /// # Errors
    ///
    /// As [`Self::post_keeper`], plus [`KeeperError::BadId`] if absent.
    pub async fn put_keeper(
        &self,
        id: i64,
        payload: &Map<String, Value>,
    ) -> Result<Value, KeeperError> {
        let patch = KeeperPatch::try_from(payload)?;
        let current = self.find(id).await?;
        let updated = patch.apply(&current);

        self.validator.check(&updated.references()).await?;

        self.repo
            .update(&updated)
            .await
            .map_err(|e| KeeperError::from_repo(e, Some(id), &updated.name))?;

        tracing::info!(keeper_id = id, "zoo keeper updated");
        self.get_keeper(id).await
    }

    /// Delete a keeper and return the remaining keepers.
    ///
    /// # Errors
    ///
    /// Returns [`KeeperError::BadId`] if absent.
    pub async fn delete_keeper(&self, id: i64) -> Result<Value, KeeperError> {
        self.repo
            .delete(id)
            .await
            .map_err(|e| KeeperError::from_repo(e, Some(id), ""))?;

        tracing::info!(keeper_id = id, "zoo keeper deleted");
        self.get_all_keepers().await
    }

    async fn find(&self, id: i64) -> Result<Keeper, KeeperError> {
        self.repo
            .get(id)
            .await
            .map_err(|e| KeeperError::from_repo(e, Some(id), ""))
    }
}

fn embed(keeper_id: i64, field: &'static str, lookup: Result<Value, ZooServiceError>) -> Value {
    lookup.unwrap_or_else(|err| {
        tracing::warn!(keeper_id, field, error = %err, "enrichment lookup failed");
        err.payload()
    })
}
