//! Versioned-payload contract shared by every document type.
//!
//! A document type is a plain serde struct at the *current* schema version.
//! Older shapes never exist as application values; they only appear as raw
//! JSON pulled out of storage, and `Migratable::migrate` normalizes them in
//! one pass through a chain of pure `v -> v+1` transforms.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::types::{DocStoreError, Result};

/// Payload key carrying the schema revision number.
pub const VERSION_KEY: &str = "version";
/// Payload key echoing the row's type name.
pub const TYPE_NAME_KEY: &str = "typeName";
/// Payload keys the storage engine derives its access flags from.
pub const PUBLIC_READ_KEY: &str = "publicRead";
pub const PUBLIC_UPDATE_KEY: &str = "publicUpdate";

/// A document type: name, current schema revision, and the access flags
/// derived from its payload.
pub trait Entity: Serialize {
    const TYPE_NAME: &'static str;
    const CURRENT_VERSION: u32;

    fn public_read(&self) -> bool {
        false
    }

    fn public_update(&self) -> bool {
        false
    }
}

/// Normalization of an arbitrary raw payload to the current schema.
///
/// Implementations dispatch on the detected version with an exhaustive
/// `match`, so bumping `CURRENT_VERSION` without writing the new transform
/// fails to compile rather than failing at runtime.
pub trait Migratable: Entity + DeserializeOwned {
    fn migrate(raw: Value) -> Result<Self>;
}

/// Read the schema version out of a raw payload.
///
/// Absence of a `version` field means version 1: data written before
/// versioning was introduced stays migratable. Anything that is not a
/// positive integer, or is newer than `current`, is `UnknownVersion` and is
/// never guessed at or truncated.
pub fn detect_version(raw: &Value, current: u32) -> Result<u32> {
    let field = match raw.get(VERSION_KEY) {
        None | Some(Value::Null) => return Ok(1),
        Some(v) => v,
    };
    let version = field
        .as_i64()
        .ok_or_else(|| DocStoreError::UnknownVersion(-1))?;
    if version < 1 {
        return Err(DocStoreError::UnknownVersion(version));
    }
    if version > i64::from(current) {
        return Err(DocStoreError::UnknownVersion(version));
    }
    Ok(version as u32)
}

/// Deserialize a payload into one historical version's shape.
///
/// Strips the envelope keys (`version`, `typeName`) and rejects any other
/// deviation from the shape's field set as `SchemaViolation`. The envelope
/// type name, when present, must match `type_name`.
pub fn decode_shape<T: DeserializeOwned>(raw: Value, type_name: &str) -> Result<T> {
    let mut obj = match raw {
        Value::Object(obj) => obj,
        other => {
            return Err(DocStoreError::SchemaViolation(format!(
                "expected object payload for {}, got {}",
                type_name,
                type_of(&other)
            )))
        }
    };
    obj.remove(VERSION_KEY);
    if let Some(name) = obj.remove(TYPE_NAME_KEY) {
        if name.as_str() != Some(type_name) {
            return Err(DocStoreError::SchemaViolation(format!(
                "payload typeName {} does not match {}",
                name, type_name
            )));
        }
    }
    serde_json::from_value(Value::Object(obj))
        .map_err(|e| DocStoreError::SchemaViolation(e.to_string()))
}

/// Deserialize a payload that must already be at the current version.
/// A current-version payload with an unexpected shape is a violation,
/// never silently passed through.
pub fn validate_current<E: Migratable>(raw: Value) -> Result<E> {
    decode_shape(raw, E::TYPE_NAME)
}

/// Serialize an entity and stamp the envelope keys.
///
/// Stamping always wins: whatever version a caller managed to carry in
/// memory, the persisted payload declares `CURRENT_VERSION`.
pub fn stamp<E: Entity>(entity: &E) -> Result<Value> {
    let value = serde_json::to_value(entity)
        .map_err(|e| DocStoreError::SchemaViolation(e.to_string()))?;
    let mut obj = match value {
        Value::Object(obj) => obj,
        _ => {
            return Err(DocStoreError::SchemaViolation(format!(
                "entity {} did not serialize to an object",
                E::TYPE_NAME
            )))
        }
    };
    obj.insert(VERSION_KEY.into(), Value::from(E::CURRENT_VERSION));
    obj.insert(TYPE_NAME_KEY.into(), Value::from(E::TYPE_NAME));
    Ok(Value::Object(obj))
}

/// Access flags are a pure function of the payload, recomputed on every
/// write; they are never stored independently of it.
pub fn access_flags(payload: &Value) -> (bool, bool) {
    let flag = |key: &str| {
        payload
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    };
    (flag(PUBLIC_READ_KEY), flag(PUBLIC_UPDATE_KEY))
}

fn type_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
