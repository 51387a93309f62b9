//! Keeper repository for database operations

use async_trait::async_trait;
use sqlx::PgPool;

use super::model::{Keeper, NewKeeper};

/// Unique constraint on `zoo_keepers.name`.
const NAME_CONSTRAINT: &str = "zoo_keepers_name_key";

/// Error types for keeper persistence
#[derive(Debug, thiserror::Error)]
pub enum KeeperRepoError {
    #[error("zoo keeper not found")]
    NotFound,
    #[error("zoo keeper name already taken")]
    DuplicateName,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence operations for keepers.
///
/// Every operation commits on its own; there is no batching.
#[async_trait]
pub trait KeeperRepo: Send + Sync {
    /// All keepers ordered by id.
    async fn list(&self) -> Result<Vec<Keeper>, KeeperRepoError>;

    async fn get(&self, id: i64) -> Result<Keeper, KeeperRepoError>;

    /// Insert and return the stored keeper with its assigned id.
    async fn create(&self, keeper: &NewKeeper) -> Result<Keeper, KeeperRepoError>;

    /// Overwrite every column of an existing keeper.
    async fn update(&self, keeper: &Keeper) -> Result<Keeper, KeeperRepoError>;

    async fn delete(&self, id: i64) -> Result<(), KeeperRepoError>;
}

/// `PostgreSQL` implementation of [`KeeperRepo`]
pub struct PgKeeperRepo {
    pool: PgPool,
}

impl PgKeeperRepo {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeeperRepo for PgKeeperRepo {
    async fn list(&self) -> Result<Vec<Keeper>, KeeperRepoError> {
        list_keepers(&self.pool).await
    }

    async fn get(&self, id: i64) -> Result<Keeper, KeeperRepoError> {
        get_keeper(&self.pool, id).await
    }

    async fn create(&self, keeper: &NewKeeper) -> Result<Keeper, KeeperRepoError> {
        create_keeper(&self.pool, keeper).await
    }

    async fn update(&self, keeper: &Keeper) -> Result<Keeper, KeeperRepoError> {
        update_keeper(&self.pool, keeper).await
    }

    async fn delete(&self, id: i64) -> Result<(), KeeperRepoError> {
        delete_keeper(&self.pool, id).await
    }
}

fn map_write_error(e: sqlx::Error) -> KeeperRepoError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.constraint() == Some(NAME_CONSTRAINT) {
            return KeeperRepoError::DuplicateName;
        }
    }
    KeeperRepoError::Database(e)
}

/// List all keepers ordered by id.
///
/// Works with any sqlx executor (pool, connection, or transaction).
///
/// # Errors
///
/// Returns `KeeperRepoError::Database` on query failure.
pub async fn list_keepers<'e, E>(executor: E) -> Result<Vec<Keeper>, KeeperRepoError>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    let keepers = sqlx::query_as::<_, Keeper>(
        r"
        SELECT id, name, age, zoo_id, favorite_monkey_id, dream_monkey_id
        FROM zoo_keepers
        ORDER BY id
        ",
    )
    .fetch_all(executor)
    .await?;

    Ok(keepers)
}

/// Fetch a keeper by id.
///
/// # Errors
///
/// Returns `KeeperRepoError::NotFound` if no keeper has this id.
pub async fn get_keeper<'e, E>(executor: E, id: i64) -> Result<Keeper, KeeperRepoError>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    sqlx::query_as::<_, Keeper>(
        r"
        SELECT id, name, age, zoo_id, favorite_monkey_id, dream_monkey_id
        FROM zoo_keepers
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(KeeperRepoError::NotFound)
}

/// Insert a keeper.
///
/// # Errors
///
/// Returns `KeeperRepoError::DuplicateName` if the name is taken.
pub async fn create_keeper<'e, E>(executor: E, keeper: &NewKeeper) -> Result<Keeper, KeeperRepoError>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    sqlx::query_as::<_, Keeper>(
        r"
        INSERT INTO zoo_keepers (name, age, zoo_id, favorite_monkey_id, dream_monkey_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, name, age, zoo_id, favorite_monkey_id, dream_monkey_id
        ",
    )
    .bind(&keeper.name)
    .bind(keeper.age)
    .bind(keeper.zoo_id)
    .bind(keeper.favorite_monkey_id)
    .bind(keeper.dream_monkey_id)
    .fetch_one(executor)
    .await
    .map_err(map_write_error)
}

/// Overwrite a keeper's columns.
///
/// # Errors
///
/// Returns `KeeperRepoError::NotFound` if the keeper vanished and
/// `KeeperRepoError::DuplicateName` if the new name is taken.
pub async fn update_keeper<'e, E>(executor: E, keeper: &Keeper) -> Result<Keeper, KeeperRepoError>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    sqlx::query_as::<_, Keeper>(
        r"
        UPDATE zoo_keepers
        SET name = $2, age = $3, zoo_id = $4, favorite_monkey_id = $5, dream_monkey_id = $6
        WHERE id = $1
        RETURNING id, name, age, zoo_id, favorite_monkey_id, dream_monkey_id
        ",
    )
    .bind(keeper.id)
    .bind(&keeper.name)
    .bind(keeper.age)
    .bind(keeper.zoo_id)
    .bind(keeper.favorite_monkey_id)
    .bind(keeper.dream_monkey_id)
    .fetch_optional(executor)
    .await
    .map_err(map_write_error)?
    .ok_or(KeeperRepoError::NotFound)
}

/// Delete a keeper by id.
///
/// # Errors
///
/// Returns `KeeperRepoError::NotFound` if no row was deleted.
pub async fn delete_keeper<'e, E>(executor: E, id: i64) -> Result<(), KeeperRepoError>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    let result = sqlx::query("DELETE FROM zoo_keepers WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(KeeperRepoError::NotFound);
    }

    Ok(())
}

#[cfg(any(test, feature = "test-utils"))]
#[allow(clippy::unwrap_used, clippy::missing_panics_doc)]
pub mod mock {
    //! In-memory keeper store for testing

    use super::{async_trait, Keeper, KeeperRepo, KeeperRepoError, NewKeeper};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// In-memory [`KeeperRepo`] with the same uniqueness rules as the table.
    pub struct InMemoryKeeperRepo {
        keepers: Mutex<BTreeMap<i64, Keeper>>,
        next_id: Mutex<i64>,
        unavailable: Mutex<bool>,
    }

    impl InMemoryKeeperRepo {
        #[must_use]
        pub const fn new() -> Self {
            Self {
                keepers: Mutex::new(BTreeMap::new()),
                next_id: Mutex::new(1),
                unavailable: Mutex::new(false),
            }
        }

        /// Make every operation fail with a database error.
        pub fn set_unavailable(&self, unavailable: bool) {
            *self.unavailable.lock().unwrap() = unavailable;
        }

        fn check_available(&self) -> Result<(), KeeperRepoError> {
            if *self.unavailable.lock().unwrap() {
                return Err(KeeperRepoError::Database(sqlx::Error::PoolTimedOut));
            }
            Ok(())
        }

        fn name_taken(keepers: &BTreeMap<i64, Keeper>, name: &str, except: Option<i64>) -> bool {
            keepers
                .values()
                .any(|k| k.name == name && Some(k.id) != except)
        }
    }

    impl Default for InMemoryKeeperRepo {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl KeeperRepo for InMemoryKeeperRepo {
        async fn list(&self) -> Result<Vec<Keeper>, KeeperRepoError> {
            self.check_available()?;
            Ok(self.keepers.lock().unwrap().values().cloned().collect())
        }

        async fn get(&self, id: i64) -> Result<Keeper, KeeperRepoError> {
            self.check_available()?;
            self.keepers
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or(KeeperRepoError::NotFound)
        }

        async fn create(&self, keeper: &NewKeeper) -> Result<Keeper, KeeperRepoError> {
            self.check_available()?;
            let mut keepers = self.keepers.lock().unwrap();
            if Self::name_taken(&keepers, &keeper.name, None) {
                return Err(KeeperRepoError::DuplicateName);
            }

            let mut next_id = self.next_id.lock().unwrap();
            let stored = Keeper {
                id: *next_id,
                name: keeper.name.clone(),
                age: keeper.age,
                zoo_id: keeper.zoo_id,
                favorite_monkey_id: keeper.favorite_monkey_id,
                dream_monkey_id: keeper.dream_monkey_id,
            };
            *next_id += 1;
            keepers.insert(stored.id, stored.clone());
            Ok(stored)
        }

        async fn update(&self, keeper: &Keeper) -> Result<Keeper, KeeperRepoError> {
            self.check_available()?;
            let mut keepers = self.keepers.lock().unwrap();
            if !keepers.contains_key(&keeper.id) {
                return Err(KeeperRepoError::NotFound);
            }
            if Self::name_taken(&keepers, &keeper.name, Some(keeper.id)) {
                return Err(KeeperRepoError::DuplicateName);
            }
            keepers.insert(keeper.id, keeper.clone());
            Ok(keeper.clone())
        }

        async fn delete(&self, id: i64) -> Result<(), KeeperRepoError> {
            self.check_available()?;
            self.keepers
                .lock()
                .unwrap()
                .remove(&id)
                .map(|_| ())
                .ok_or(KeeperRepoError::NotFound)
        }
    }
}
