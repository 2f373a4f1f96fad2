//! # Collaborator Capabilities
//!
//! The dispatcher does not know how records are stored, queried or encoded. It
//! talks to three capabilities, each a trait the host implements (or takes from
//! [`memory`](crate::memory)):
//!
//! - [`QuerySource`] – build, narrow, order, window and execute queries.
//! - [`Persistence`] – validate a mutation and insert/update/delete a record.
//! - [`Serializer`] – encode a [`Document`](crate::render::Document) into bytes.
//!
//! Calls into these are awaited in pipeline order. Whatever blocking or I/O they
//! do stays inside them.

use crate::action::Action;
use crate::attributes::FlatAttributes;
use crate::error::CollaboratorError;
use crate::outcome::MutationResult;
use crate::params::SortDirection;
use crate::render::{Document, SerializeOptions};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

#[async_trait]
pub trait QuerySource: Send + Sync + 'static {
    /// An unexecuted, composable query.
    type Query: Clone + Debug + Send + Sync;

    type Entity: Clone + Debug + Send + Sync + 'static;

    /// Name of the primary identifier field.
    fn primary_key(&self) -> &str {
        "id"
    }

    /// The unrefined query over every record of the resource.
    fn base_query(&self) -> Self::Query;

    fn narrow_by_equality(&self, query: Self::Query, field: &str, value: &Value) -> Self::Query;

    fn order_by(&self, query: Self::Query, field: &str, direction: SortDirection) -> Self::Query;

    fn slice(&self, query: Self::Query, offset: u64, limit: u64) -> Self::Query;

    async fn execute(&self, query: Self::Query) -> Result<Vec<Self::Entity>, CollaboratorError>;

    async fn count(&self, query: Self::Query) -> Result<u64, CollaboratorError>;

    async fn fetch_one(&self, query: Self::Query) -> Result<Option<Self::Entity>, CollaboratorError> {
        let query = self.slice(query, 0, 1);
        Ok(self.execute(query).await?.into_iter().next())
    }
}

#[async_trait]
pub trait Persistence: Send + Sync + 'static {
    type Entity: Clone + Debug + Send + Sync + 'static;

    /// A fresh, unsaved entity for create.
    fn build(&self) -> Self::Entity;

    /// Applies `attrs` to `entity` and checks the result.
    fn validate(
        &self,
        entity: Self::Entity,
        attrs: &FlatAttributes,
        action: Action,
    ) -> MutationResult<Self::Entity>;

    async fn insert(&self, entity: Self::Entity) -> Result<Self::Entity, CollaboratorError>;

    async fn update(&self, entity: Self::Entity) -> Result<Self::Entity, CollaboratorError>;

    /// Removes the record. Constraint rejections come back as `Invalid`.
    async fn delete(
        &self,
        entity: Self::Entity,
    ) -> Result<MutationResult<Self::Entity>, CollaboratorError>;
}

/// A data source that can both answer queries and persist mutations for the
/// same entity type.
pub trait Repository:
    QuerySource + Persistence<Entity = <Self as QuerySource>::Entity>
{
}

impl<T> Repository for T where T: QuerySource + Persistence<Entity = <T as QuerySource>::Entity> {}

/// Encodes documents into the wire format.
pub trait Serializer<E>: Send + Sync + 'static {
    fn content_type(&self) -> &str {
        "application/vnd.api+json"
    }

    fn serialize(
        &self,
        document: Document<'_, E>,
        options: &SerializeOptions,
    ) -> Result<Vec<u8>, CollaboratorError>;
}
