//! # Built-in Step Implementations
//!
//! Plain functions, one per step. The provided methods of
//! [`ResourceController`] delegate here, and overrides call them directly when
//! they want the default behaviour plus something extra.

use crate::action::Action;
use crate::attributes::FlatAttributes;
use crate::capability::{Persistence, QuerySource, Repository};
use crate::context::RequestContext;
use crate::controller::{Mutation, ResourceController, StepResult};
use crate::error::DispatchError;
use crate::outcome::{ActionOutcome, FieldErrors, IndexQuery, MutationResult, Page, PageMeta};
use crate::params::{FilterSpec, PaginationSpec, SortSpec};
use crate::render::{Document, ErrorObject};
use crate::resource::{EntityOf, QueryOf, ResourceDescriptor};
use crate::response::{Response, Status};
use serde_json::Value;
use tracing::debug;

pub async fn resolve_base_query<R: Repository>(
    resource: &ResourceDescriptor<R>,
    _ctx: &RequestContext,
    _action: Action,
) -> StepResult<QueryOf<R>> {
    Ok(ActionOutcome::Continue(resource.repo().base_query()))
}

pub async fn handle_index_query<R: Repository>(
    _resource: &ResourceDescriptor<R>,
    _ctx: &RequestContext,
    query: QueryOf<R>,
) -> StepResult<IndexQuery<QueryOf<R>, EntityOf<R>>> {
    Ok(ActionOutcome::Continue(IndexQuery::Refine(query)))
}

/// Equality on the named field. Fields that need anything else (ranges,
/// membership, joins) need an `apply_filter` override.
pub async fn apply_filter<R: Repository>(
    resource: &ResourceDescriptor<R>,
    _ctx: &RequestContext,
    query: QueryOf<R>,
    filter: &FilterSpec,
) -> StepResult<QueryOf<R>> {
    let value = Value::String(filter.value.clone());
    Ok(ActionOutcome::Continue(
        resource.repo().narrow_by_equality(query, &filter.field, &value),
    ))
}

pub async fn apply_sort<R: Repository>(
    resource: &ResourceDescriptor<R>,
    _ctx: &RequestContext,
    query: QueryOf<R>,
    sort: &SortSpec,
) -> StepResult<QueryOf<R>> {
    Ok(ActionOutcome::Continue(
        resource.repo().order_by(query, &sort.field, sort.direction),
    ))
}

/// Without a page: executes the whole query. With one: counts the unsliced
/// query, then fetches the requested window.
pub async fn apply_pagination<R: Repository>(
    resource: &ResourceDescriptor<R>,
    _ctx: &RequestContext,
    query: QueryOf<R>,
    page: Option<PaginationSpec>,
) -> StepResult<Page<EntityOf<R>>> {
    let repo = resource.repo();
    let Some(spec) = page else {
        let records = repo.execute(query).await?;
        return Ok(ActionOutcome::Continue(Page::unpaginated(records)));
    };

    let total = repo.count(query.clone()).await?;
    let window = repo.slice(query, spec.offset(), spec.size);
    let records = repo.execute(window).await?;
    debug!(number = spec.number, size = spec.size, total, "Paginated");
    Ok(ActionOutcome::Continue(Page {
        records,
        meta: Some(PageMeta::new(spec.number, spec.size, total)),
    }))
}

/// Goes through the controller's own `resolve_base_query`, so base-query
/// overrides (ownership, soft deletes) also scope show/update/delete.
pub async fn resolve_record<C>(
    controller: &C,
    resource: &ResourceDescriptor<C::Repo>,
    ctx: &RequestContext,
    action: Action,
    id: &str,
) -> StepResult<EntityOf<C::Repo>>
where
    C: ResourceController + ?Sized,
{
    let query = match controller.resolve_base_query(resource, ctx, action).await? {
        ActionOutcome::Continue(query) | ActionOutcome::Mutation(MutationResult::Valid(query)) => {
            query
        }
        ActionOutcome::Terminal(response) => return Ok(ActionOutcome::Terminal(response)),
        ActionOutcome::NotFound => return Ok(ActionOutcome::NotFound),
        ActionOutcome::Mutation(MutationResult::Invalid(errors)) => {
            return Ok(ActionOutcome::invalid(errors))
        }
    };

    let repo = resource.repo();
    let query = repo.narrow_by_equality(query, repo.primary_key(), &Value::String(id.to_string()));
    Ok(match repo.fetch_one(query).await? {
        Some(record) => ActionOutcome::Continue(record),
        None => ActionOutcome::NotFound,
    })
}

pub async fn sanitize<R: Repository>(
    _resource: &ResourceDescriptor<R>,
    _ctx: &RequestContext,
    _action: Action,
    attributes: FlatAttributes,
) -> StepResult<FlatAttributes> {
    Ok(ActionOutcome::Continue(attributes))
}

pub async fn mutate<R: Repository>(
    resource: &ResourceDescriptor<R>,
    _ctx: &RequestContext,
    mutation: Mutation<EntityOf<R>>,
) -> StepResult<EntityOf<R>> {
    let repo = resource.repo();
    let result = match mutation {
        Mutation::Create { attributes } => {
            let fresh = repo.build();
            repo.validate(fresh, &attributes, Action::Create)
        }
        Mutation::Update { record, attributes } => {
            repo.validate(record, &attributes, Action::Update)
        }
        Mutation::Delete { record } => repo.delete(record).await?,
    };
    Ok(ActionOutcome::Mutation(result))
}

pub async fn persist<R: Repository>(
    resource: &ResourceDescriptor<R>,
    _ctx: &RequestContext,
    action: Action,
    record: EntityOf<R>,
) -> StepResult<EntityOf<R>> {
    let repo = resource.repo();
    let saved = match action {
        Action::Create => repo.insert(record).await?,
        Action::Update => repo.update(record).await?,
        _ => record,
    };
    Ok(ActionOutcome::Continue(saved))
}

pub async fn render_index<R: Repository>(
    resource: &ResourceDescriptor<R>,
    _ctx: &RequestContext,
    page: Page<EntityOf<R>>,
) -> Result<Response, DispatchError> {
    let document = Document::Records {
        records: &page.records,
        meta: page.meta.as_ref(),
    };
    Ok(resource.respond(Status::OK, document)?)
}

pub async fn render_show<R: Repository>(
    resource: &ResourceDescriptor<R>,
    _ctx: &RequestContext,
    record: EntityOf<R>,
) -> Result<Response, DispatchError> {
    Ok(resource.respond(Status::OK, Document::Record(&record))?)
}

pub async fn render_not_found<R: Repository>(
    resource: &ResourceDescriptor<R>,
    _ctx: &RequestContext,
    _action: Action,
) -> Result<Response, DispatchError> {
    let error = ErrorObject::new(Status::NOT_FOUND, "Not Found")
        .with_detail(format!("{} not found", resource.type_name()));
    Ok(resource.respond(Status::NOT_FOUND, Document::Errors(vec![error]))?)
}

pub async fn render_create<R: Repository>(
    resource: &ResourceDescriptor<R>,
    _ctx: &RequestContext,
    record: EntityOf<R>,
) -> Result<Response, DispatchError> {
    Ok(resource.respond(Status::CREATED, Document::Record(&record))?)
}

pub async fn render_update<R: Repository>(
    resource: &ResourceDescriptor<R>,
    _ctx: &RequestContext,
    record: EntityOf<R>,
) -> Result<Response, DispatchError> {
    Ok(resource.respond(Status::OK, Document::Record(&record))?)
}

pub async fn render_delete<R: Repository>(
    _resource: &ResourceDescriptor<R>,
    _ctx: &RequestContext,
    _record: EntityOf<R>,
) -> Result<Response, DispatchError> {
    Ok(Response::no_content())
}

/// Shared by the create, update and delete invalid renderers.
pub async fn render_invalid<R: Repository>(
    resource: &ResourceDescriptor<R>,
    _ctx: &RequestContext,
    errors: FieldErrors,
) -> Result<Response, DispatchError> {
    let document = Document::Errors(ErrorObject::from_field_errors(&errors));
    Ok(resource.respond(Status::UNPROCESSABLE_ENTITY, document)?)
}
