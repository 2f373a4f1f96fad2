//! # Posts
//!
//! - Archived posts are invisible: the base query excludes them, which also
//!   scopes show/update/delete.
//! - `filter[tag]=x` matches posts tagged `x`.
//! - Only the author (the request's caller) may update or delete a post.
//! - Deleting archives instead of removing.

use crate::model::Post;
use async_trait::async_trait;
use resource_dispatch::memory::{MemoryQuery, MemoryStore};
use resource_dispatch::{
    defaults, permit, Action, ActionOutcome, Document, ErrorObject, FilterSpec, FlatAttributes,
    Mutation, Persistence, RequestContext, ResourceController, ResourceDescriptor, Status,
    StepResult,
};
use serde_json::Value;
use tracing::{debug, info};

type Posts = ResourceDescriptor<MemoryStore<Post>>;

pub struct PostController;

impl PostController {
    fn is_author(ctx: &RequestContext, post: &Post) -> bool {
        match (ctx.caller(), post.author_id) {
            (Some(caller), Some(author)) => caller == author.to_string(),
            _ => false,
        }
    }

    fn forbidden(resource: &Posts) -> StepResult<Post> {
        let error = ErrorObject::new(Status::FORBIDDEN, "Forbidden")
            .with_detail("only the author may change this post");
        let response = resource.respond(Status::FORBIDDEN, Document::Errors(vec![error]))?;
        Ok(ActionOutcome::Terminal(response))
    }
}

#[async_trait]
impl ResourceController for PostController {
    type Repo = MemoryStore<Post>;

    async fn resolve_base_query(
        &self,
        resource: &Posts,
        ctx: &RequestContext,
        action: Action,
    ) -> StepResult<MemoryQuery> {
        let outcome = defaults::resolve_base_query(resource, ctx, action).await?;
        Ok(outcome.map(|query| query.where_eq("archived", false)))
    }

    async fn apply_filter(
        &self,
        resource: &Posts,
        ctx: &RequestContext,
        query: MemoryQuery,
        filter: &FilterSpec,
    ) -> StepResult<MemoryQuery> {
        match filter.field.as_str() {
            "tag" => Ok(ActionOutcome::Continue(
                query.where_contains("tags", filter.value.clone()),
            )),
            // Archived posts stay hidden whatever the filter says.
            "archived" => Ok(ActionOutcome::Continue(query)),
            _ => defaults::apply_filter(resource, ctx, query, filter).await,
        }
    }

    async fn sanitize(
        &self,
        _resource: &Posts,
        ctx: &RequestContext,
        action: Action,
        attributes: FlatAttributes,
    ) -> StepResult<FlatAttributes> {
        let mut permitted = permit(attributes, &["title", "body", "tags", "author_id"]);
        match (action, ctx.caller()) {
            (Action::Create, Some(caller)) => {
                permitted.insert("author_id".to_string(), Value::String(caller.to_string()));
            }
            (Action::Update, _) => {
                permitted.shift_remove("author_id");
            }
            _ => {}
        }
        debug!(?action, fields = permitted.len(), "Sanitized post attributes");
        Ok(ActionOutcome::Continue(permitted))
    }

    async fn mutate(
        &self,
        resource: &Posts,
        ctx: &RequestContext,
        mutation: Mutation<Post>,
    ) -> StepResult<Post> {
        match mutation {
            Mutation::Update { ref record, .. } | Mutation::Delete { ref record }
                if !Self::is_author(ctx, record) =>
            {
                info!(post_id = ?record.id, caller = ?ctx.caller(), "Refused change by non-author");
                Self::forbidden(resource)
            }
            Mutation::Delete { mut record } => {
                record.archived = true;
                let archived = resource.repo().update(record).await?;
                info!(post_id = ?archived.id, "Archived");
                Ok(ActionOutcome::valid(archived))
            }
            other => defaults::mutate(resource, ctx, other).await,
        }
    }
}
