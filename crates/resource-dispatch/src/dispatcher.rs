//! # Action Dispatcher
//!
//! The state machine. For each action it runs the fixed sequence of steps,
//! calling whichever implementation the controller provides for each one, and
//! classifies every returned [`ActionOutcome`] before deciding what runs next.
//!
//! ```text
//! index  : base query → index hook ─┬─ Refine    → filter* → sort* → paginate → render_index
//!                                   └─ Paginated ───────────────────────────→ render_index
//! show   : resolve record ─┬─ found     → render_show
//!                          └─ not found → render_not_found
//! create : flatten → sanitize → mutate ─┬─ valid   → persist → render_create
//!                                       └─ invalid → render_invalid_create
//! update : resolve record → flatten → sanitize → mutate → persist → render_update
//! delete : resolve record → mutate ─┬─ valid   → render_delete
//!                                   └─ invalid → render_invalid_delete
//! ```
//!
//! A `Terminal` outcome from any step is the response; nothing after it runs,
//! renderers included. A cancelled [`RequestContext`] stops the sequence before
//! the next step.

use crate::action::{Action, Step};
use crate::attributes::{flatten, FlatAttributes};
use crate::config::DispatchConfig;
use crate::context::RequestContext;
use crate::controller::{Mutation, ResourceController};
use crate::error::{DispatchError, ParamError};
use crate::outcome::{ActionOutcome, FieldErrors, IndexQuery, MutationResult};
use crate::params::{Params, QuerySpec};
use crate::resource::ResourceDescriptor;
use crate::response::Response;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

/// How a dispatch ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    Response(Response),
    /// The action is excluded for this resource; the router keeps control.
    Passthrough,
    /// The request was cancelled before the pipeline finished.
    Cancelled,
}

impl Dispatched {
    pub fn into_response(self) -> Option<Response> {
        match self {
            Dispatched::Response(response) => Some(response),
            _ => None,
        }
    }
}

/// Ways a step can leave the pipeline early.
enum Exit {
    Respond(Response),
    NotFound,
    Invalid(FieldErrors),
}

enum Flow<T> {
    Next(T),
    Exit(Exit),
}

fn classify<T>(outcome: ActionOutcome<T>) -> Flow<T> {
    match outcome {
        ActionOutcome::Continue(value) | ActionOutcome::Mutation(MutationResult::Valid(value)) => {
            Flow::Next(value)
        }
        ActionOutcome::Terminal(response) => Flow::Exit(Exit::Respond(response)),
        ActionOutcome::NotFound => Flow::Exit(Exit::NotFound),
        ActionOutcome::Mutation(MutationResult::Invalid(errors)) => {
            Flow::Exit(Exit::Invalid(errors))
        }
    }
}

/// Runs one step: checks cancellation, awaits the call, and either yields the
/// continuation value or returns the settled exit from the enclosing action.
macro_rules! step {
    ($self:ident, $ctx:ident, $action:expr, $step:expr, $call:expr) => {{
        if $ctx.is_cancelled() {
            warn!(step = %$step, "Cancelled");
            return Ok(Dispatched::Cancelled);
        }
        debug!(step = %$step, "Step");
        match classify($call.await?) {
            Flow::Next(value) => value,
            Flow::Exit(exit) => return $self.settle($ctx, $action, $step, exit).await,
        }
    }};
}

/// Single entry point for one resource.
///
/// The controller, descriptor and config are fixed at construction and shared
/// read-only across concurrent dispatches; wrap the dispatcher in an `Arc` to
/// share it between tasks.
pub struct Dispatcher<C: ResourceController> {
    controller: Arc<C>,
    resource: ResourceDescriptor<C::Repo>,
    config: DispatchConfig,
}

impl<C: ResourceController> Dispatcher<C> {
    pub fn new(controller: C, resource: ResourceDescriptor<C::Repo>, config: DispatchConfig) -> Self {
        Self {
            controller: Arc::new(controller),
            resource,
            config,
        }
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn resource(&self) -> &ResourceDescriptor<C::Repo> {
        &self.resource
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Whether the router should send `action` here at all.
    pub fn handles(&self, action: Action) -> bool {
        self.config.handles(action)
    }

    pub async fn dispatch(
        &self,
        action: Action,
        ctx: &RequestContext,
        params: &Params,
    ) -> Result<Dispatched, DispatchError> {
        if !self.handles(action) {
            debug!(resource = self.resource.type_name(), %action, "Excluded action, passing through");
            return Ok(Dispatched::Passthrough);
        }

        let span = info_span!("dispatch", resource = self.resource.type_name(), %action);
        let result = async {
            match action {
                Action::Index => self.index(ctx, params).await,
                Action::Show => self.show(ctx, params).await,
                Action::Create => self.create(ctx, params).await,
                Action::Update => self.update(ctx, params).await,
                Action::Delete => self.delete(ctx, params).await,
            }
        }
        .instrument(span.clone())
        .await;

        span.in_scope(|| match &result {
            Ok(Dispatched::Response(response)) => info!(status = %response.status, "Dispatched"),
            Ok(other) => info!(outcome = ?other, "Dispatched"),
            Err(e) => warn!(error = %e, "Dispatch failed"),
        });
        result
    }

    async fn index(&self, ctx: &RequestContext, params: &Params) -> Result<Dispatched, DispatchError> {
        let requested = QuerySpec::parse(params)?;
        let action = Action::Index;
        let c = &self.controller;
        let res = &self.resource;

        let query = step!(self, ctx, action, Step::ResolveBaseQuery, c.resolve_base_query(res, ctx, action));
        let page = match step!(self, ctx, action, Step::IndexQueryHook, c.handle_index_query(res, ctx, query)) {
            IndexQuery::Paginated(page) => {
                debug!(records = page.records.len(), "Index hook returned a custom result");
                page
            }
            IndexQuery::Refine(mut query) => {
                for filter in &requested.filters {
                    debug!(field = %filter.field, value = %filter.value, "Filter");
                    query = step!(self, ctx, action, Step::ApplyFilter, c.apply_filter(res, ctx, query, filter));
                }
                for sort in &requested.sorts {
                    debug!(field = %sort.field, direction = %sort.direction, "Sort");
                    query = step!(self, ctx, action, Step::ApplySort, c.apply_sort(res, ctx, query, sort));
                }
                let page = self.config.pagination.resolve(requested.page);
                step!(self, ctx, action, Step::ApplyPagination, c.apply_pagination(res, ctx, query, page))
            }
        };

        self.render(ctx, c.render_index(res, ctx, page)).await
    }

    async fn show(&self, ctx: &RequestContext, params: &Params) -> Result<Dispatched, DispatchError> {
        let action = Action::Show;
        let id = params.id().ok_or(ParamError::MissingIdentifier(action))?;
        let c = &self.controller;
        let res = &self.resource;

        let record = step!(self, ctx, action, Step::ResolveRecord, c.resolve_record(res, ctx, action, id));
        self.render(ctx, c.render_show(res, ctx, record)).await
    }

    async fn create(&self, ctx: &RequestContext, params: &Params) -> Result<Dispatched, DispatchError> {
        let action = Action::Create;
        let c = &self.controller;
        let res = &self.resource;

        let Some(attributes) = self.flatten(ctx, params)? else {
            return Ok(Dispatched::Cancelled);
        };
        let attributes = step!(self, ctx, action, Step::Sanitize, c.sanitize(res, ctx, action, attributes));
        let record = step!(self, ctx, action, Step::Mutate, c.mutate(res, ctx, Mutation::Create { attributes }));
        let record = step!(self, ctx, action, Step::Persist, c.persist(res, ctx, action, record));
        self.render(ctx, c.render_create(res, ctx, record)).await
    }

    async fn update(&self, ctx: &RequestContext, params: &Params) -> Result<Dispatched, DispatchError> {
        let action = Action::Update;
        let id = params.id().ok_or(ParamError::MissingIdentifier(action))?;
        let c = &self.controller;
        let res = &self.resource;

        let record = step!(self, ctx, action, Step::ResolveRecord, c.resolve_record(res, ctx, action, id));
        let Some(attributes) = self.flatten(ctx, params)? else {
            return Ok(Dispatched::Cancelled);
        };
        let attributes = step!(self, ctx, action, Step::Sanitize, c.sanitize(res, ctx, action, attributes));
        let mutation = Mutation::Update { record, attributes };
        let record = step!(self, ctx, action, Step::Mutate, c.mutate(res, ctx, mutation));
        let record = step!(self, ctx, action, Step::Persist, c.persist(res, ctx, action, record));
        self.render(ctx, c.render_update(res, ctx, record)).await
    }

    async fn delete(&self, ctx: &RequestContext, params: &Params) -> Result<Dispatched, DispatchError> {
        let action = Action::Delete;
        let id = params.id().ok_or(ParamError::MissingIdentifier(action))?;
        let c = &self.controller;
        let res = &self.resource;

        let record = step!(self, ctx, action, Step::ResolveRecord, c.resolve_record(res, ctx, action, id));
        let record = step!(self, ctx, action, Step::Mutate, c.mutate(res, ctx, Mutation::Delete { record }));
        self.render(ctx, c.render_delete(res, ctx, record)).await
    }

    /// The fixed flatten step. `None` means the request was cancelled first.
    fn flatten(
        &self,
        ctx: &RequestContext,
        params: &Params,
    ) -> Result<Option<FlatAttributes>, DispatchError> {
        if ctx.is_cancelled() {
            warn!(step = %Step::FlattenAttributes, "Cancelled");
            return Ok(None);
        }
        debug!(step = %Step::FlattenAttributes, "Step");
        let body = params.body().ok_or(ParamError::MissingData)?;
        Ok(Some(flatten(body)?))
    }

    async fn render(
        &self,
        ctx: &RequestContext,
        render: impl Future<Output = Result<Response, DispatchError>>,
    ) -> Result<Dispatched, DispatchError> {
        if ctx.is_cancelled() {
            warn!(step = %Step::Render, "Cancelled");
            return Ok(Dispatched::Cancelled);
        }
        debug!(step = %Step::Render, "Step");
        Ok(Dispatched::Response(render.await?))
    }

    /// Turns an early exit into the final result for `action`.
    async fn settle(
        &self,
        ctx: &RequestContext,
        action: Action,
        step: Step,
        exit: Exit,
    ) -> Result<Dispatched, DispatchError> {
        let c = &self.controller;
        let res = &self.resource;
        match exit {
            Exit::Respond(response) => {
                info!(%step, status = %response.status, "Terminal response from step");
                Ok(Dispatched::Response(response))
            }
            Exit::NotFound => {
                warn!(%step, "Not found");
                self.render(ctx, c.render_not_found(res, ctx, action)).await
            }
            Exit::Invalid(errors) => {
                warn!(%step, fields = errors.len(), "Invalid");
                match action {
                    Action::Create => self.render(ctx, c.render_invalid_create(res, ctx, errors)).await,
                    Action::Update => self.render(ctx, c.render_invalid_update(res, ctx, errors)).await,
                    Action::Delete => self.render(ctx, c.render_invalid_delete(res, ctx, errors)).await,
                    Action::Index | Action::Show => Err(DispatchError::UnexpectedOutcome { action, step }),
                }
            }
        }
    }
}
