//! # Memory Store Client
//!
//! [`MemoryStore`] is the cloneable handle to a [`StoreActor`](super::StoreActor).
//! It implements [`QuerySource`] and [`Persistence`], so it can back a
//! [`ResourceDescriptor`](crate::ResourceDescriptor) directly.

use super::error::StoreError;
use super::message::StoreRequest;
use super::query::MemoryQuery;
use super::record::Record;
use crate::action::Action;
use crate::attributes::FlatAttributes;
use crate::capability::{Persistence, QuerySource};
use crate::error::CollaboratorError;
use crate::outcome::{FieldErrors, MutationResult};
use crate::params::SortDirection;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

pub struct MemoryStore<R: Record> {
    sender: mpsc::Sender<StoreRequest<R>>,
}

impl<R: Record> Clone for MemoryStore<R> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<R: Record> std::fmt::Debug for MemoryStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

impl<R: Record> MemoryStore<R> {
    pub fn new(sender: mpsc::Sender<StoreRequest<R>>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, StoreError>>) -> StoreRequest<R>,
    ) -> Result<T, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| StoreError::ActorClosed)?;
        response.await.map_err(|_| StoreError::ActorDropped)?
    }

    pub async fn all(&self, query: MemoryQuery) -> Result<Vec<R>, StoreError> {
        self.request(|respond_to| StoreRequest::Execute { query, respond_to })
            .await
    }

    pub async fn total(&self, query: MemoryQuery) -> Result<u64, StoreError> {
        self.request(|respond_to| StoreRequest::Count { query, respond_to })
            .await
    }

    pub async fn save(&self, record: R) -> Result<R, StoreError> {
        self.request(|respond_to| StoreRequest::Insert { record, respond_to })
            .await
    }

    pub async fn replace(&self, record: R) -> Result<R, StoreError> {
        self.request(|respond_to| StoreRequest::Update { record, respond_to })
            .await
    }

    pub async fn remove(&self, id: u64) -> Result<MutationResult<R>, StoreError> {
        self.request(|respond_to| StoreRequest::Delete { id, respond_to })
            .await
    }

    /// Inserts each record in order, returning them with their assigned ids.
    pub async fn seed(&self, records: impl IntoIterator<Item = R>) -> Result<Vec<R>, StoreError> {
        let mut saved = Vec::new();
        for record in records {
            saved.push(self.save(record).await?);
        }
        Ok(saved)
    }
}

#[async_trait]
impl<R: Record> QuerySource for MemoryStore<R> {
    type Query = MemoryQuery;
    type Entity = R;

    fn base_query(&self) -> MemoryQuery {
        MemoryQuery::new()
    }

    fn narrow_by_equality(&self, query: MemoryQuery, field: &str, value: &Value) -> MemoryQuery {
        query.where_eq(field, value.clone())
    }

    fn order_by(&self, query: MemoryQuery, field: &str, direction: SortDirection) -> MemoryQuery {
        query.order_by(field, direction)
    }

    fn slice(&self, query: MemoryQuery, offset: u64, limit: u64) -> MemoryQuery {
        query.window(offset, limit)
    }

    async fn execute(&self, query: MemoryQuery) -> Result<Vec<R>, CollaboratorError> {
        Ok(self.all(query).await?)
    }

    async fn count(&self, query: MemoryQuery) -> Result<u64, CollaboratorError> {
        Ok(self.total(query.unwindowed()).await?)
    }
}

#[async_trait]
impl<R: Record> Persistence for MemoryStore<R> {
    type Entity = R;

    fn build(&self) -> R {
        R::default()
    }

    /// Merges `attrs` into the serialized record and reads it back. Attributes
    /// that do not fit their field are reported individually; the primary key
    /// and `type` are never assigned. The merged record then runs
    /// [`Record::validate`].
    fn validate(&self, entity: R, attrs: &FlatAttributes, action: Action) -> MutationResult<R> {
        let base = match serde_json::to_value(&entity) {
            Ok(Value::Object(fields)) => fields,
            _ => return MutationResult::Invalid(FieldErrors::single("base", "cannot be edited")),
        };

        let mut merged = base.clone();
        let mut errors = FieldErrors::new();
        for (key, value) in attrs {
            if key == self.primary_key() || key == "type" {
                continue;
            }
            match fit_attribute::<R>(&base, key, value) {
                Some(fitted) => {
                    merged.insert(key.clone(), fitted);
                }
                None => errors.add(key.clone(), "is invalid"),
            }
        }
        if !errors.is_empty() {
            debug!(?action, fields = errors.len(), "Attributes rejected");
            return MutationResult::Invalid(errors);
        }

        let record: R = match serde_json::from_value(Value::Object(merged)) {
            Ok(record) => record,
            Err(e) => return MutationResult::Invalid(FieldErrors::single("base", e.to_string())),
        };
        match record.validate(action) {
            Ok(()) => MutationResult::Valid(record),
            Err(errors) => MutationResult::Invalid(errors),
        }
    }

    async fn insert(&self, entity: R) -> Result<R, CollaboratorError> {
        Ok(self.save(entity).await?)
    }

    async fn update(&self, entity: R) -> Result<R, CollaboratorError> {
        Ok(self.replace(entity).await?)
    }

    async fn delete(&self, entity: R) -> Result<MutationResult<R>, CollaboratorError> {
        let id = entity.id().ok_or(StoreError::Unsaved)?;
        Ok(self.remove(id).await?)
    }
}

/// Finds a form of `value` that `R` accepts for `key`. Identifiers arrive as
/// strings, so numeric strings are retried as numbers.
fn fit_attribute<R: Record>(base: &Map<String, Value>, key: &str, value: &Value) -> Option<Value> {
    let accepts = |candidate: &Value| {
        let mut probe = base.clone();
        probe.insert(key.to_string(), candidate.clone());
        serde_json::from_value::<R>(Value::Object(probe)).is_ok()
    };

    if accepts(value) {
        return Some(value.clone());
    }
    let coerced = numeric(value)?;
    accepts(&coerced).then_some(coerced)
}

fn numeric(value: &Value) -> Option<Value> {
    match value {
        Value::String(text) => text.parse::<u64>().ok().map(Value::from),
        Value::Array(items) => items.iter().map(numeric).collect::<Option<Vec<_>>>().map(Value::Array),
        _ => None,
    }
}
