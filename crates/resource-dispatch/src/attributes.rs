//! # Attribute Flattening
//!
//! The one place untyped request data enters the pipeline. A nested payload of
//! the form
//!
//! ```json
//! {
//!   "data": {
//!     "type": "post",
//!     "attributes": { "title": "Hello", "published-at": "2024-05-01" },
//!     "relationships": {
//!       "author": { "data": { "type": "author", "id": "7" } },
//!       "tags":   { "data": [ { "type": "tag", "id": "1" }, { "type": "tag", "id": "2" } ] }
//!     }
//!   }
//! }
//! ```
//!
//! flattens to `{ "author_id": "7", "tag_ids": ["1", "2"], "title": "Hello",
//! "published_at": "2024-05-01", "type": "post" }`. The key normalization is
//! fixed so every resource behaves the same.
//!
//! To-many names are singularized with plain English suffix rules
//! (`categories` → `category_ids`, `addresses` → `address_ids`,
//! `tags` → `tag_ids`). Irregular plurals such as `people` keep their name
//! (`people_ids`); a `sanitize` override can rename those keys.

use crate::error::ParamError;
use crate::params::normalize_key;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Flat field-name → value mapping produced per create/update request.
pub type FlatAttributes = IndexMap<String, Value>;

pub fn flatten(payload: &Value) -> Result<FlatAttributes, ParamError> {
    let data = payload
        .get("data")
        .and_then(Value::as_object)
        .ok_or(ParamError::MissingData)?;

    let mut flat = FlatAttributes::new();

    if let Some(relationships) = data.get("relationships").and_then(Value::as_object) {
        for (name, relationship) in relationships {
            flatten_relationship(&mut flat, name, relationship)?;
        }
    }

    match data.get("attributes") {
        None | Some(Value::Null) => {}
        Some(Value::Object(attributes)) => {
            for (key, value) in attributes {
                flat.insert(normalize_key(key), value.clone());
            }
        }
        Some(_) => return Err(ParamError::MalformedAttributes),
    }

    if let Some(kind) = data.get("type") {
        flat.entry("type".to_string()).or_insert_with(|| kind.clone());
    }

    Ok(flat)
}

fn flatten_relationship(
    flat: &mut FlatAttributes,
    name: &str,
    relationship: &Value,
) -> Result<(), ParamError> {
    let malformed = || ParamError::MalformedRelationship(name.to_string());
    let linkage = relationship.get("data").ok_or_else(malformed)?;
    let name = normalize_key(name);

    match linkage {
        Value::Null => {
            flat.insert(format!("{name}_id"), Value::Null);
        }
        Value::Object(identifier) => {
            flat.insert(format!("{name}_id"), identifier_of(identifier).ok_or_else(malformed)?);
        }
        Value::Array(identifiers) => {
            let ids = identifiers
                .iter()
                .map(|item| item.as_object().and_then(identifier_of))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(malformed)?;
            flat.insert(format!("{}_ids", singular(&name)), Value::Array(ids));
        }
        _ => return Err(malformed()),
    }
    Ok(())
}

fn identifier_of(identifier: &Map<String, Value>) -> Option<Value> {
    identifier.get("id").filter(|id| !id.is_null()).cloned()
}

fn singular(name: &str) -> String {
    if let Some(stem) = name.strip_suffix("ies") {
        return format!("{stem}y");
    }
    for suffix in ["sses", "shes", "ches", "xes", "zes"] {
        if name.ends_with(suffix) {
            return name[..name.len() - 2].to_string();
        }
    }
    match name.strip_suffix('s') {
        Some(stem) if !stem.ends_with('s') => stem.to_string(),
        _ => name.to_string(),
    }
}

/// Keeps only the allowed keys. Meant for `sanitize` overrides.
pub fn permit(attributes: FlatAttributes, allowed: &[&str]) -> FlatAttributes {
    attributes
        .into_iter()
        .filter(|(key, _)| allowed.contains(&key.as_str()))
        .collect()
}
