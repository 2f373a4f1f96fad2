//! # Resource Descriptor
//!
//! Identifies the entity type a dispatcher serves and the collaborators it
//! reaches for: the repository (query source + persistence) and the serializer.
//! Built once, shared read-only by every request.

use crate::capability::{QuerySource, Repository, Serializer};
use crate::error::CollaboratorError;
use crate::render::{Document, JsonApiSerializer, SerializeOptions};
use crate::response::{Response, Status};
use serde::Serialize;
use std::sync::Arc;

pub type EntityOf<R> = <R as QuerySource>::Entity;
pub type QueryOf<R> = <R as QuerySource>::Query;

pub struct ResourceDescriptor<R: Repository> {
    repo: Arc<R>,
    serializer: Arc<dyn Serializer<EntityOf<R>>>,
    options: SerializeOptions,
}

impl<R: Repository> ResourceDescriptor<R>
where
    EntityOf<R>: Serialize,
{
    /// Descriptor with the default JSON:API serializer.
    pub fn new(type_name: impl Into<String>, repo: R) -> Self {
        Self::with_serializer(type_name, Arc::new(repo), Arc::new(JsonApiSerializer))
    }
}

impl<R: Repository> ResourceDescriptor<R> {
    pub fn with_serializer(
        type_name: impl Into<String>,
        repo: Arc<R>,
        serializer: Arc<dyn Serializer<EntityOf<R>>>,
    ) -> Self {
        let options = SerializeOptions {
            type_name: type_name.into(),
            primary_key: repo.primary_key().to_string(),
        };
        Self {
            repo,
            serializer,
            options,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.options.type_name
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn serializer(&self) -> &dyn Serializer<EntityOf<R>> {
        self.serializer.as_ref()
    }

    pub fn options(&self) -> &SerializeOptions {
        &self.options
    }

    /// Serializes `document` into a response with the serializer's content type.
    pub fn respond(
        &self,
        status: Status,
        document: Document<'_, EntityOf<R>>,
    ) -> Result<Response, CollaboratorError> {
        let body = self.serializer.serialize(document, &self.options)?;
        Ok(Response::new(status)
            .with_header("content-type", self.serializer.content_type())
            .with_body(body))
    }
}

impl<R: Repository> Clone for ResourceDescriptor<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            serializer: Arc::clone(&self.serializer),
            options: self.options.clone(),
        }
    }
}
