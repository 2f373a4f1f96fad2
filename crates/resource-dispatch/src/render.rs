//! # Documents & the JSON:API Serializer
//!
//! Default renderers describe *what* to send as a [`Document`] and leave the
//! encoding to a [`Serializer`]. [`JsonApiSerializer`] produces the standard
//! success/error document shape:
//!
//! ```text
//! { "data": { "type": "posts", "id": "1", "attributes": { "published-at": .. } } }
//! { "data": [ .. ], "meta": { "page": { "number": 1, "size": 10, "total": 25, "total-pages": 3 } } }
//! { "errors": [ { "status": "422", "title": "Invalid Attribute",
//!                 "detail": "title can't be blank",
//!                 "source": { "pointer": "/data/attributes/title" } } ] }
//! ```

use crate::capability::Serializer;
use crate::error::CollaboratorError;
use crate::outcome::{FieldErrors, PageMeta};
use crate::response::Status;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// What a renderer wants encoded.
#[derive(Debug)]
pub enum Document<'a, E> {
    Record(&'a E),
    Records {
        records: &'a [E],
        meta: Option<&'a PageMeta>,
    },
    Errors(Vec<ErrorObject>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorObject {
    pub status: Status,
    pub title: String,
    pub detail: Option<String>,
    pub pointer: Option<String>,
}

impl ErrorObject {
    pub fn new(status: Status, title: impl Into<String>) -> Self {
        Self {
            status,
            title: title.into(),
            detail: None,
            pointer: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// One error per message, each pointing at its attribute.
    pub fn from_field_errors(errors: &FieldErrors) -> Vec<Self> {
        errors
            .iter()
            .map(|(field, message)| Self {
                status: Status::UNPROCESSABLE_ENTITY,
                title: "Invalid Attribute".to_string(),
                detail: Some(format!("{} {}", field.replace('_', " "), message)),
                pointer: Some(format!("/data/attributes/{}", wire_key(field))),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOptions {
    pub type_name: String,
    pub primary_key: String,
}

/// Internal `published_at` back to wire `published-at`.
pub fn wire_key(key: &str) -> String {
    key.replace('_', "-")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonApiSerializer;

impl JsonApiSerializer {
    fn resource_object<E: Serialize>(
        entity: &E,
        options: &SerializeOptions,
    ) -> Result<Value, CollaboratorError> {
        let fields = match serde_json::to_value(entity)? {
            Value::Object(fields) => fields,
            other => {
                return Err(CollaboratorError::Rejected(format!(
                    "{} does not serialize to an object: {other}",
                    options.type_name
                )))
            }
        };

        let mut id = Value::Null;
        let mut attributes = Map::new();
        for (key, value) in fields {
            if key == options.primary_key {
                id = match value {
                    Value::String(s) => Value::String(s),
                    Value::Null => Value::Null,
                    other => Value::String(other.to_string()),
                };
            } else {
                attributes.insert(wire_key(&key), value);
            }
        }

        Ok(json!({
            "type": options.type_name,
            "id": id,
            "attributes": attributes,
        }))
    }
}

impl<E: Serialize + 'static> Serializer<E> for JsonApiSerializer {
    fn serialize(
        &self,
        document: Document<'_, E>,
        options: &SerializeOptions,
    ) -> Result<Vec<u8>, CollaboratorError> {
        let value = match document {
            Document::Record(entity) => json!({ "data": Self::resource_object(entity, options)? }),
            Document::Records { records, meta } => {
                let data = records
                    .iter()
                    .map(|entity| Self::resource_object(entity, options))
                    .collect::<Result<Vec<_>, _>>()?;
                let mut document = json!({ "data": data });
                if let Some(meta) = meta {
                    document["meta"] = json!({
                        "page": {
                            "number": meta.number,
                            "size": meta.size,
                            "total": meta.total,
                            "total-pages": meta.total_pages,
                        }
                    });
                }
                document
            }
            Document::Errors(errors) => {
                let errors: Vec<Value> = errors
                    .into_iter()
                    .map(|error| {
                        let mut object = json!({
                            "status": error.status.to_string(),
                            "title": error.title,
                        });
                        if let Some(detail) = error.detail {
                            object["detail"] = Value::String(detail);
                        }
                        if let Some(pointer) = error.pointer {
                            object["source"] = json!({ "pointer": pointer });
                        }
                        object
                    })
                    .collect();
                json!({ "errors": errors })
            }
        };
        Ok(serde_json::to_vec(&value)?)
    }
}
