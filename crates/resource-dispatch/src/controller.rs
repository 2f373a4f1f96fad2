//! # ResourceController Trait
//!
//! The override table. Every step of every action is a **provided method** of
//! [`ResourceController`]; the body of each one is the built-in default from
//! [`defaults`](crate::defaults). Implementing a method replaces that step for
//! the controller, leaving every other step alone.
//!
//! # Architecture Note
//! Because the table is a trait, it is resolved by the compiler: there is exactly
//! one implementation per step, chosen when the controller type is written, and
//! nothing is looked up per request.
//!
//! # Calling Through to the Default
//! An override that only wants to adjust the default calls the matching free
//! function explicitly:
//!
//! ```rust,ignore
//! async fn resolve_base_query(
//!     &self,
//!     resource: &ResourceDescriptor<Self::Repo>,
//!     ctx: &RequestContext,
//!     action: Action,
//! ) -> StepResult<MemoryQuery> {
//!     let outcome = defaults::resolve_base_query(resource, ctx, action).await?;
//!     Ok(outcome.map(|query| query.where_eq("archived", false)))
//! }
//! ```
//!
//! # Per-Action Keying
//! Steps shared between actions receive the current [`Action`], so an override
//! can behave differently for, say, `show` and `delete`.

use crate::action::Action;
use crate::attributes::FlatAttributes;
use crate::capability::Repository;
use crate::context::RequestContext;
use crate::defaults;
use crate::error::DispatchError;
use crate::outcome::{ActionOutcome, FieldErrors, IndexQuery, Page};
use crate::params::{FilterSpec, PaginationSpec, SortSpec};
use crate::resource::{EntityOf, QueryOf, ResourceDescriptor};
use crate::response::Response;
use async_trait::async_trait;

/// Return type of every non-rendering step.
pub type StepResult<T> = Result<ActionOutcome<T>, DispatchError>;

/// Input to the mutate step.
#[derive(Debug, Clone)]
pub enum Mutation<E> {
    Create { attributes: FlatAttributes },
    Update { record: E, attributes: FlatAttributes },
    Delete { record: E },
}

impl<E> Mutation<E> {
    pub fn action(&self) -> Action {
        match self {
            Mutation::Create { .. } => Action::Create,
            Mutation::Update { .. } => Action::Update,
            Mutation::Delete { .. } => Action::Delete,
        }
    }

    pub fn attributes(&self) -> Option<&FlatAttributes> {
        match self {
            Mutation::Create { attributes } | Mutation::Update { attributes, .. } => Some(attributes),
            Mutation::Delete { .. } => None,
        }
    }
}

#[async_trait]
pub trait ResourceController: Send + Sync + 'static {
    /// Where records come from and go to.
    type Repo: Repository;

    // --- Query Pipeline ---

    async fn resolve_base_query(
        &self,
        resource: &ResourceDescriptor<Self::Repo>,
        ctx: &RequestContext,
        action: Action,
    ) -> StepResult<QueryOf<Self::Repo>> {
        defaults::resolve_base_query(resource, ctx, action).await
    }

    /// Runs once per index request, before filters. Return
    /// [`IndexQuery::Paginated`] to skip filter/sort/pagination entirely.
    async fn handle_index_query(
        &self,
        resource: &ResourceDescriptor<Self::Repo>,
        ctx: &RequestContext,
        query: QueryOf<Self::Repo>,
    ) -> StepResult<IndexQuery<QueryOf<Self::Repo>, EntityOf<Self::Repo>>> {
        defaults::handle_index_query(resource, ctx, query).await
    }

    /// Called once per `filter[field]` parameter, in parameter order.
    async fn apply_filter(
        &self,
        resource: &ResourceDescriptor<Self::Repo>,
        ctx: &RequestContext,
        query: QueryOf<Self::Repo>,
        filter: &FilterSpec,
    ) -> StepResult<QueryOf<Self::Repo>> {
        defaults::apply_filter(resource, ctx, query, filter).await
    }

    /// Called once per sort field, left to right.
    async fn apply_sort(
        &self,
        resource: &ResourceDescriptor<Self::Repo>,
        ctx: &RequestContext,
        query: QueryOf<Self::Repo>,
        sort: &SortSpec,
    ) -> StepResult<QueryOf<Self::Repo>> {
        defaults::apply_sort(resource, ctx, query, sort).await
    }

    async fn apply_pagination(
        &self,
        resource: &ResourceDescriptor<Self::Repo>,
        ctx: &RequestContext,
        query: QueryOf<Self::Repo>,
        page: Option<PaginationSpec>,
    ) -> StepResult<Page<EntityOf<Self::Repo>>> {
        defaults::apply_pagination(resource, ctx, query, page).await
    }

    // --- Record Resolution ---

    /// Narrows the (possibly overridden) base query to one record.
    async fn resolve_record(
        &self,
        resource: &ResourceDescriptor<Self::Repo>,
        ctx: &RequestContext,
        action: Action,
        id: &str,
    ) -> StepResult<EntityOf<Self::Repo>> {
        defaults::resolve_record(self, resource, ctx, action, id).await
    }

    // --- Mutation Pipeline ---

    /// Identity by default: every submitted attribute is kept. Override this for
    /// any field that must not be externally settable.
    async fn sanitize(
        &self,
        resource: &ResourceDescriptor<Self::Repo>,
        ctx: &RequestContext,
        action: Action,
        attributes: FlatAttributes,
    ) -> StepResult<FlatAttributes> {
        defaults::sanitize(resource, ctx, action, attributes).await
    }

    /// Validates (create/update) or removes (delete). Never persists.
    async fn mutate(
        &self,
        resource: &ResourceDescriptor<Self::Repo>,
        ctx: &RequestContext,
        mutation: Mutation<EntityOf<Self::Repo>>,
    ) -> StepResult<EntityOf<Self::Repo>> {
        defaults::mutate(resource, ctx, mutation).await
    }

    async fn persist(
        &self,
        resource: &ResourceDescriptor<Self::Repo>,
        ctx: &RequestContext,
        action: Action,
        record: EntityOf<Self::Repo>,
    ) -> StepResult<EntityOf<Self::Repo>> {
        defaults::persist(resource, ctx, action, record).await
    }

    // --- Renderers ---

    async fn render_index(
        &self,
        resource: &ResourceDescriptor<Self::Repo>,
        ctx: &RequestContext,
        page: Page<EntityOf<Self::Repo>>,
    ) -> Result<Response, DispatchError> {
        defaults::render_index(resource, ctx, page).await
    }

    async fn render_show(
        &self,
        resource: &ResourceDescriptor<Self::Repo>,
        ctx: &RequestContext,
        record: EntityOf<Self::Repo>,
    ) -> Result<Response, DispatchError> {
        defaults::render_show(resource, ctx, record).await
    }

    async fn render_not_found(
        &self,
        resource: &ResourceDescriptor<Self::Repo>,
        ctx: &RequestContext,
        action: Action,
    ) -> Result<Response, DispatchError> {
        defaults::render_not_found(resource, ctx, action).await
    }

    async fn render_create(
        &self,
        resource: &ResourceDescriptor<Self::Repo>,
        ctx: &RequestContext,
        record: EntityOf<Self::Repo>,
    ) -> Result<Response, DispatchError> {
        defaults::render_create(resource, ctx, record).await
    }

    async fn render_invalid_create(
        &self,
        resource: &ResourceDescriptor<Self::Repo>,
        ctx: &RequestContext,
        errors: FieldErrors,
    ) -> Result<Response, DispatchError> {
        defaults::render_invalid(resource, ctx, errors).await
    }

    async fn render_update(
        &self,
        resource: &ResourceDescriptor<Self::Repo>,
        ctx: &RequestContext,
        record: EntityOf<Self::Repo>,
    ) -> Result<Response, DispatchError> {
        defaults::render_update(resource, ctx, record).await
    }

    async fn render_invalid_update(
        &self,
        resource: &ResourceDescriptor<Self::Repo>,
        ctx: &RequestContext,
        errors: FieldErrors,
    ) -> Result<Response, DispatchError> {
        defaults::render_invalid(resource, ctx, errors).await
    }

    async fn render_delete(
        &self,
        resource: &ResourceDescriptor<Self::Repo>,
        ctx: &RequestContext,
        record: EntityOf<Self::Repo>,
    ) -> Result<Response, DispatchError> {
        defaults::render_delete(resource, ctx, record).await
    }

    async fn render_invalid_delete(
        &self,
        resource: &ResourceDescriptor<Self::Repo>,
        ctx: &RequestContext,
        errors: FieldErrors,
    ) -> Result<Response, DispatchError> {
        defaults::render_invalid(resource, ctx, errors).await
    }
}
