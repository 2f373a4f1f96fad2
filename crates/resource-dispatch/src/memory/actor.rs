//! # Store Actor
//!
//! The server half of the in-memory store. It owns every row of one record
//! type and processes [`StoreRequest`]s one at a time, so the rows need no lock.

use super::client::MemoryStore;
use super::error::StoreError;
use super::message::StoreRequest;
use super::query::MemoryQuery;
use super::record::Record;
use crate::outcome::MutationResult;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A stored record next to its serialized form, which queries match against.
struct Row<R> {
    record: R,
    fields: Value,
}

impl<R: Record> Row<R> {
    fn encode(record: R) -> Result<Self, StoreError> {
        let fields = serde_json::to_value(&record)?;
        Ok(Self { record, fields })
    }
}

/// Owns the rows for `R`, keyed (and therefore ordered) by id.
///
/// # Usage Pattern
/// 1. `StoreActor::new()` returns the actor and a [`MemoryStore`] handle.
/// 2. Build whatever the record's `Context` needs (often other stores).
/// 3. Spawn `actor.run(context)`.
///
/// ```rust,ignore
/// let (actor, posts) = StoreActor::<Post>::new(32);
/// tokio::spawn(actor.run(()));
/// ```
pub struct StoreActor<R: Record> {
    receiver: mpsc::Receiver<StoreRequest<R>>,
    rows: BTreeMap<u64, Row<R>>,
    next_id: u64,
}

impl<R: Record> StoreActor<R> {
    /// `buffer_size` is the channel capacity; callers wait when it is full.
    pub fn new(buffer_size: usize) -> (Self, MemoryStore<R>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            rows: BTreeMap::new(),
            next_id: 1,
        };
        (actor, MemoryStore::new(sender))
    }

    /// Processes requests until every [`MemoryStore`] handle is dropped.
    pub async fn run(mut self, context: R::Context) {
        let record_type = std::any::type_name::<R>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(record_type, "Store started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Execute { query, respond_to } => {
                    let records = self.select(&query);
                    debug!(record_type, ?query, found = records.len(), "Execute");
                    let _ = respond_to.send(Ok(records));
                }
                StoreRequest::Count { query, respond_to } => {
                    let total = self
                        .rows
                        .values()
                        .filter(|row| query.matches(&row.fields))
                        .count() as u64;
                    debug!(record_type, ?query, total, "Count");
                    let _ = respond_to.send(Ok(total));
                }
                StoreRequest::Insert { record, respond_to } => {
                    let result = self.insert(record);
                    match &result {
                        Ok(saved) => {
                            info!(record_type, id = ?saved.id(), size = self.rows.len(), "Inserted")
                        }
                        Err(e) => warn!(record_type, error = %e, "Insert failed"),
                    }
                    let _ = respond_to.send(result);
                }
                StoreRequest::Update { record, respond_to } => {
                    let result = self.update(record);
                    match &result {
                        Ok(saved) => info!(record_type, id = ?saved.id(), "Updated"),
                        Err(e) => warn!(record_type, error = %e, "Update failed"),
                    }
                    let _ = respond_to.send(result);
                }
                StoreRequest::Delete { id, respond_to } => {
                    debug!(record_type, id, "Delete");
                    let Some(row) = self.rows.get(&id) else {
                        warn!(record_type, id, "Not found");
                        let _ = respond_to.send(Err(StoreError::NotFound(id)));
                        continue;
                    };
                    if let Err(errors) = row.record.on_delete(&context).await {
                        warn!(record_type, id, fields = errors.len(), "on_delete refused");
                        let _ = respond_to.send(Ok(MutationResult::Invalid(errors)));
                        continue;
                    }
                    let result = self
                        .rows
                        .remove(&id)
                        .map(|row| MutationResult::Valid(row.record))
                        .ok_or(StoreError::NotFound(id));
                    info!(record_type, id, size = self.rows.len(), "Deleted");
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(record_type, size = self.rows.len(), "Shutdown");
    }

    fn select(&self, query: &MemoryQuery) -> Vec<R> {
        let rows: Vec<&Row<R>> = self.rows.values().collect();
        let fields: Vec<&Value> = rows.iter().map(|row| &row.fields).collect();
        query
            .select(&fields)
            .into_iter()
            .map(|i| rows[i].record.clone())
            .collect()
    }

    /// Keeps an explicit id when it is free, otherwise assigns the next one.
    fn insert(&mut self, mut record: R) -> Result<R, StoreError> {
        let id = match record.id() {
            Some(id) if !self.rows.contains_key(&id) => id,
            _ => self.next_id,
        };
        self.next_id = self.next_id.max(id + 1);
        record.assign_id(id);

        let row = Row::encode(record)?;
        let saved = row.record.clone();
        self.rows.insert(id, row);
        Ok(saved)
    }

    fn update(&mut self, record: R) -> Result<R, StoreError> {
        let id = record.id().ok_or(StoreError::Unsaved)?;
        if !self.rows.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        let row = Row::encode(record)?;
        let saved = row.record.clone();
        self.rows.insert(id, row);
        Ok(saved)
    }
}
