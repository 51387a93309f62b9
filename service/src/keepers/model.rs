//! Keeper records and their remote references.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::payload::{AGE, DREAM_MONKEY_ID, FAVORITE_MONKEY_ID, NAME, ZOO_ID};

/// Maximum length of a keeper name (matches the `VARCHAR(20)` column).
pub const MAX_NAME_LEN: usize = 20;

/// A stored zoo keeper.
///
/// The three reference ids point at entities owned by the zoo service. They
/// are lookup-only: nothing here owns or mutates the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Keeper {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub zoo_id: Option<i64>,
    pub favorite_monkey_id: Option<i64>,
    pub dream_monkey_id: Option<i64>,
}

impl Keeper {
    /// The stored columns as a JSON object, the base of every keeper view.
    #[must_use]
    pub fn columns(&self) -> Map<String, Value> {
        Map::from_iter([
            ("id".to_string(), Value::from(self.id)),
            (NAME.to_string(), Value::from(self.name.as_str())),
            (AGE.to_string(), Value::from(self.age)),
            (ZOO_ID.to_string(), Value::from(self.zoo_id)),
            (FAVORITE_MONKEY_ID.to_string(), Value::from(self.favorite_monkey_id)),
            (DREAM_MONKEY_ID.to_string(), Value::from(self.dream_monkey_id)),
        ])
    }

    #[must_use]
    pub const fn references(&self) -> References {
        References {
            zoo_id: self.zoo_id,
            favorite_monkey_id: self.favorite_monkey_id,
            dream_monkey_id: self.dream_monkey_id,
        }
    }
}

/// A keeper that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewKeeper {
    pub name: String,
    pub age: i32,
    pub zoo_id: Option<i64>,
    pub favorite_monkey_id: Option<i64>,
    pub dream_monkey_id: Option<i64>,
}

impl NewKeeper {
    #[must_use]
    pub const fn references(&self) -> References {
        References {
            zoo_id: self.zoo_id,
            favorite_monkey_id: self.favorite_monkey_id,
            dream_monkey_id: self.dream_monkey_id,
        }
    }
}

/// The remote references of a keeper, as checked by the validator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct References {
    pub zoo_id: Option<i64>,
    pub favorite_monkey_id: Option<i64>,
    pub dream_monkey_id: Option<i64>,
}
