//! Parsing of inbound keeper write payloads.
//!
//! A payload is a JSON object. Its key set is checked first (POST needs at
//! least `name` and `age`; both POST and PUT accept only the five keeper
//! fields), then every present field goes through its own typed parser.
//! Any failure is a [`PayloadError`], which the HTTP layer reports as
//! `BadData`.

use serde_json::{Map, Value};

use super::model::{Keeper, NewKeeper, MAX_NAME_LEN};

pub const NAME: &str = "name";
pub const AGE: &str = "age";
pub const ZOO_ID: &str = "zoo_id";
pub const FAVORITE_MONKEY_ID: &str = "favorite_monkey_id";
pub const DREAM_MONKEY_ID: &str = "dream_monkey_id";

/// Keys a create payload must contain.
pub const REQUIRED_KEYS: [&str; 2] = [NAME, AGE];

/// Keys any write payload may contain.
pub const ALLOWED_KEYS: [&str; 5] = [NAME, AGE, ZOO_ID, FAVORITE_MONKEY_ID, DREAM_MONKEY_ID];

/// Structured error for payload validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("unexpected keys: {}; allowed keys: {}", .0.join(", "), ALLOWED_KEYS.join(", "))]
    UnexpectedKeys(Vec<String>),

    #[error("missing required keys: {}", .0.join(", "))]
    MissingKeys(Vec<&'static str>),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl PayloadError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Check that `payload` only contains keeper fields.
///
/// # Errors
///
/// Returns [`PayloadError::UnexpectedKeys`] listing every unknown key.
pub fn check_allowed_keys(payload: &Map<String, Value>) -> Result<(), PayloadError> {
    let mut unexpected: Vec<String> = payload
        .keys()
        .filter(|key| !ALLOWED_KEYS.contains(&key.as_str()))
        .cloned()
        .collect();

    if unexpected.is_empty() {
        return Ok(());
    }
    unexpected.sort();
    Err(PayloadError::UnexpectedKeys(unexpected))
}

/// Check that `payload` contains every required key and nothing else.
///
/// # Errors
///
/// Returns [`PayloadError::UnexpectedKeys`] or [`PayloadError::MissingKeys`].
pub fn check_create_keys(payload: &Map<String, Value>) -> Result<(), PayloadError> {
    check_allowed_keys(payload)?;

    let missing: Vec<&'static str> = REQUIRED_KEYS
        .into_iter()
        .filter(|key| !payload.contains_key(*key))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PayloadError::MissingKeys(missing))
    }
}

/// Parse a keeper name: a JSON string, trimmed, 1 to 20 characters.
///
/// # Errors
///
/// Returns [`PayloadError::InvalidValue`] for anything else.
pub fn parse_name(value: &Value) -> Result<String, PayloadError> {
    let Value::String(raw) = value else {
        return Err(PayloadError::invalid(NAME, "expected a string"));
    };

    let name = raw.trim();
    if name.is_empty() {
        return Err(PayloadError::invalid(NAME, "cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(PayloadError::invalid(
            NAME,
            format!("must be at most {MAX_NAME_LEN} characters"),
        ));
    }
    Ok(name.to_string())
}

/// Parse an age: a JSON integer or a string holding one.
///
/// # Errors
///
/// Returns [`PayloadError::InvalidValue`] for null, non-numeric strings,
/// fractional numbers and values outside the `i32` range.
pub fn parse_age(value: &Value) -> Result<i32, PayloadError> {
    let age = match value {
        Value::Number(number) => number
            .as_i64()
            .ok_or_else(|| PayloadError::invalid(AGE, "expected an integer"))?,
        Value::String(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| PayloadError::invalid(AGE, format!("\"{raw}\" is not an integer")))?,
        Value::Null => return Err(PayloadError::invalid(AGE, "is required")),
        _ => return Err(PayloadError::invalid(AGE, "expected an integer")),
    };

    i32::try_from(age).map_err(|_| PayloadError::invalid(AGE, "out of range"))
}

/// Parse a remote reference id.
///
/// Accepts a JSON integer, `null`, the strings `"none"`/`"null"` (any case,
/// meaning no reference) and strings holding an integer.
///
/// # Errors
///
/// Returns [`PayloadError::InvalidValue`] naming `field` for anything else.
pub fn parse_reference(field: &'static str, value: &Value) -> Result<Option<i64>, PayloadError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => number
            .as_i64()
            .map(Some)
            .ok_or_else(|| PayloadError::invalid(field, "expected an integer id")),
        Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.eq_ignore_ascii_case("none") || trimmed.eq_ignore_ascii_case("null") {
                return Ok(None);
            }
            trimmed.parse::<i64>().map(Some).map_err(|_| {
                PayloadError::invalid(field, format!("\"{raw}\" is not an integer id"))
            })
        }
        _ => Err(PayloadError::invalid(field, "expected an integer id or null")),
    }
}

fn optional_reference(
    payload: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<Option<i64>>, PayloadError> {
    payload
        .get(field)
        .map(|value| parse_reference(field, value))
        .transpose()
}

impl TryFrom<&Map<String, Value>> for NewKeeper {
    type Error = PayloadError;

    fn try_from(payload: &Map<String, Value>) -> Result<Self, Self::Error> {
        check_create_keys(payload)?;

        // Presence was checked above; a missing key reads as null and fails.
        let name = parse_name(payload.get(NAME).unwrap_or(&Value::Null))?;
        let age = parse_age(payload.get(AGE).unwrap_or(&Value::Null))?;

        Ok(Self {
            name,
            age,
            zoo_id: optional_reference(payload, ZOO_ID)?.flatten(),
            favorite_monkey_id: optional_reference(payload, FAVORITE_MONKEY_ID)?.flatten(),
            dream_monkey_id: optional_reference(payload, DREAM_MONKEY_ID)?.flatten(),
        })
    }
}

/// A partial keeper update. `None` leaves a field untouched; for the
/// reference fields `Some(None)` clears the reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeeperPatch {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub zoo_id: Option<Option<i64>>,
    pub favorite_monkey_id: Option<Option<i64>>,
    pub dream_monkey_id: Option<Option<i64>>,
}

impl KeeperPatch {
    /// Apply the patch on top of `keeper`, returning the resulting state.
    #[must_use]
    pub fn apply(&self, keeper: &Keeper) -> Keeper {
        Keeper {
            id: keeper.id,
            name: self.name.clone().unwrap_or_else(|| keeper.name.clone()),
            age: self.age.unwrap_or(keeper.age),
            zoo_id: self.zoo_id.unwrap_or(keeper.zoo_id),
            favorite_monkey_id: self.favorite_monkey_id.unwrap_or(keeper.favorite_monkey_id),
            dream_monkey_id: self.dream_monkey_id.unwrap_or(keeper.dream_monkey_id),
        }
    }
}

impl TryFrom<&Map<String, Value>> for KeeperPatch {
    type Error = PayloadError;

    fn try_from(payload: &Map<String, Value>) -> Result<Self, Self::Error> {
        check_allowed_keys(payload)?;

        Ok(Self {
            name: payload.get(NAME).map(parse_name).transpose()?,
            age: payload.get(AGE).map(parse_age).transpose()?,
            zoo_id: optional_reference(payload, ZOO_ID)?,
            favorite_monkey_id: optional_reference(payload, FAVORITE_MONKEY_ID)?,
            dream_monkey_id: optional_reference(payload, DREAM_MONKEY_ID)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn create_requires_name_and_age() {
        let err = NewKeeper::try_from(&object(json!({"name": "d"}))).unwrap_err();
        assert_eq!(err, PayloadError::MissingKeys(vec![AGE]));
    }

    #[test]
    fn create_rejects_unknown_keys_even_when_complete() {
        let payload = object(json!({
            "oops": 1, "name": "d", "age": 10, "zoo_id": 1,
            "favorite_monkey_id": 1, "dream_monkey_id": 3
        }));
        let err = NewKeeper::try_from(&payload).unwrap_err();
        assert_eq!(err, PayloadError::UnexpectedKeys(vec!["oops".to_string()]));
    }

    #[test]
    fn create_minimum_fields() {
        let keeper = NewKeeper::try_from(&object(json!({"name": "e", "age": 50}))).unwrap();
        assert_eq!(keeper.name, "e");
        assert_eq!(keeper.age, 50);
        assert_eq!(keeper.zoo_id, None);
        assert_eq!(keeper.favorite_monkey_id, None);
        assert_eq!(keeper.dream_monkey_id, None);
    }

    #[test]
    fn create_converts_string_values() {
        let payload = object(json!({
            "name": "e", "age": "50", "zoo_id": "1",
            "favorite_monkey_id": "None", "dream_monkey_id": "NULL"
        }));
        let keeper = NewKeeper::try_from(&payload).unwrap();
        assert_eq!(keeper.age, 50);
        assert_eq!(keeper.zoo_id, Some(1));
        assert_eq!(keeper.favorite_monkey_id, None);
        assert_eq!(keeper.dream_monkey_id, None);
    }

    #[test]
    fn error_message_names_offending_keys() {
        let err = check_create_keys(&object(json!({"oops": 1}))).unwrap_err();
        assert!(err.to_string().contains("oops"));
        assert!(err.to_string().contains("allowed keys"));
    }

    #[test]
    fn name_parsing() {
        assert_eq!(parse_name(&json!("  bob ")).unwrap(), "bob");
        assert!(parse_name(&json!("")).is_err());
        assert!(parse_name(&json!("   ")).is_err());
        assert!(parse_name(&json!(12)).is_err());
        assert!(parse_name(&Value::Null).is_err());
        assert!(parse_name(&json!("a".repeat(20))).is_ok());
        assert!(parse_name(&json!("a".repeat(21))).is_err());
    }

    #[test]
    fn age_parsing() {
        let cases = [
            (json!(40), Some(40)),
            (json!("40"), Some(40)),
            (json!(" 7 "), Some(7)),
            (json!(4.5), None),
            (json!("forty"), None),
            (json!("none"), None),
            (Value::Null, None),
            (json!(true), None),
            (json!(i64::from(i32::MAX) + 1), None),
        ];
        for (value, expected) in cases {
            assert_eq!(parse_age(&value).ok(), expected, "value: {value}");
        }
    }

    #[test]
    fn reference_parsing() {
        let cases = [
            (json!(3), Ok(Some(3))),
            (json!("3"), Ok(Some(3))),
            (Value::Null, Ok(None)),
            (json!("none"), Ok(None)),
            (json!("Null"), Ok(None)),
            (json!("monkey"), Err(())),
            (json!(1.5), Err(())),
            (json!(false), Err(())),
            (json!([1]), Err(())),
            (json!({"id": 1}), Err(())),
        ];
        for (value, expected) in cases {
            let parsed = parse_reference(ZOO_ID, &value).map_err(|_| ());
            assert_eq!(parsed, expected, "value: {value}");
        }
    }

    #[test]
    fn reference_error_names_field() {
        let err = parse_reference(DREAM_MONKEY_ID, &json!("x")).unwrap_err();
        assert!(err.to_string().contains(DREAM_MONKEY_ID));
    }

    #[test]
    fn patch_allows_empty_payload() {
        let patch = KeeperPatch::try_from(&Map::new()).unwrap();
        assert_eq!(patch, KeeperPatch::default());
    }

    #[test]
    fn patch_rejects_unknown_keys() {
        let payload = object(json!({"oops": 1, "name": "d", "age": 10}));
        assert!(matches!(
            KeeperPatch::try_from(&payload),
            Err(PayloadError::UnexpectedKeys(_))
        ));
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let keeper = Keeper {
            id: 4,
            name: "d".to_string(),
            age: 40,
            zoo_id: None,
            favorite_monkey_id: None,
            dream_monkey_id: Some(3),
        };
        let patch =
            KeeperPatch::try_from(&object(json!({"zoo_id": 1, "name": "new"}))).unwrap();
        let updated = patch.apply(&keeper);
        assert_eq!(updated.id, 4);
        assert_eq!(updated.name, "new");
        assert_eq!(updated.age, 40);
        assert_eq!(updated.zoo_id, Some(1));
        assert_eq!(updated.dream_monkey_id, Some(3));
    }

    #[test]
    fn patch_can_clear_reference() {
        let keeper = Keeper {
            id: 1,
            name: "a".to_string(),
            age: 10,
            zoo_id: Some(1),
            favorite_monkey_id: Some(1),
            dream_monkey_id: None,
        };
        let patch = KeeperPatch::try_from(&object(json!({"favorite_monkey_id": null}))).unwrap();
        assert_eq!(patch.apply(&keeper).favorite_monkey_id, None);
        assert_eq!(patch.apply(&keeper).zoo_id, Some(1));
    }

    fn key_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(NAME.to_string()),
            Just(AGE.to_string()),
            Just(ZOO_ID.to_string()),
            Just(FAVORITE_MONKEY_ID.to_string()),
            Just(DREAM_MONKEY_ID.to_string()),
            "[a-z_]{1,12}",
        ]
    }

    proptest! {
        #[test]
        fn create_key_check_matches_set_rules(keys in prop::collection::btree_set(key_strategy(), 0..8)) {
            let payload: Map<String, Value> =
                keys.iter().map(|k| (k.clone(), json!(1))).collect();

            let subset = keys.iter().all(|k| ALLOWED_KEYS.contains(&k.as_str()));
            let superset = REQUIRED_KEYS.iter().all(|k| keys.contains(*k));

            prop_assert_eq!(check_create_keys(&payload).is_ok(), subset && superset);
            prop_assert_eq!(check_allowed_keys(&payload).is_ok(), subset);
        }
    }
}
