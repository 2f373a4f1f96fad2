use async_trait::async_trait;
use resource_dispatch::mock::{MockCall, MockQuery, MockRepo};
use resource_dispatch::{
    defaults, Action, ActionOutcome, CollaboratorError, DispatchConfig, DispatchError, Dispatched,
    Dispatcher, FieldErrors, FilterSpec, IndexQuery, MutationResult, Page, ParamError, Params,
    QuerySource, RequestContext, ResourceController, ResourceDescriptor, Response, SortDirection, Status,
    StepResult,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Post {
    id: Option<u64>,
    title: String,
    status: String,
}

impl Post {
    fn new(id: u64, title: &str) -> Self {
        Self {
            id: Some(id),
            title: title.to_string(),
            status: "draft".to_string(),
        }
    }
}

/// No overrides at all.
struct Plain;

impl ResourceController for Plain {
    type Repo = MockRepo<Post>;
}

fn dispatcher<C: ResourceController<Repo = MockRepo<Post>>>(
    controller: C,
    mock: &MockRepo<Post>,
) -> Dispatcher<C> {
    Dispatcher::new(
        controller,
        ResourceDescriptor::new("posts", mock.clone()),
        DispatchConfig::new(),
    )
}

fn response(result: Result<Dispatched, DispatchError>) -> Response {
    match result.expect("dispatch failed") {
        Dispatched::Response(response) => response,
        other => panic!("expected a response, got {other:?}"),
    }
}

fn executed_queries(mock: &MockRepo<Post>) -> Vec<MockQuery> {
    mock.calls()
        .into_iter()
        .filter_map(|call| match call {
            MockCall::Execute(query) => Some(query),
            _ => None,
        })
        .collect()
}

fn create_body() -> Value {
    json!({
        "data": {
            "type": "posts",
            "attributes": { "title": "Hello", "published-at": "2024-05-01" }
        }
    })
}

#[tokio::test]
async fn index_without_overrides_returns_the_full_set() {
    let mock = MockRepo::new();
    mock.expect_execute()
        .return_ok(vec![Post::new(1, "a"), Post::new(2, "b")]);

    let d = dispatcher(Plain, &mock);
    let res = response(d.dispatch(Action::Index, &RequestContext::new(), &Params::new()).await);

    assert_eq!(res.status, Status::OK);
    assert_eq!(res.header("Content-Type"), Some("application/vnd.api+json"));
    let body = res.json().unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][0]["id"], "1");
    assert!(body.get("meta").is_none());
    assert_eq!(executed_queries(&mock), vec![MockQuery::default()]);
    mock.verify();
}

#[tokio::test]
async fn filters_are_applied_in_parameter_order() {
    let mock = MockRepo::new();
    mock.expect_execute().return_ok(vec![]);

    let params = Params::from_query("filter[author-id]=7&filter[status]=draft");
    let d = dispatcher(Plain, &mock);
    response(d.dispatch(Action::Index, &RequestContext::new(), &params).await);

    let queries = executed_queries(&mock);
    assert_eq!(
        queries[0].filters(),
        vec![("author_id", &json!("7")), ("status", &json!("draft"))]
    );
}

#[tokio::test]
async fn sort_parameters_keep_order_and_direction() {
    let mock = MockRepo::new();
    mock.expect_execute().return_ok(vec![]);

    let params = Params::from_query("sort=-title,created-at");
    let d = dispatcher(Plain, &mock);
    response(d.dispatch(Action::Index, &RequestContext::new(), &params).await);

    assert_eq!(
        executed_queries(&mock)[0].sorts(),
        vec![
            ("title", SortDirection::Descending),
            ("created_at", SortDirection::Ascending)
        ]
    );
}

#[tokio::test]
async fn pagination_counts_then_fetches_the_window() {
    let mock = MockRepo::new();
    mock.expect_count().return_ok(25);
    mock.expect_execute()
        .return_ok((11..=20).map(|i| Post::new(i, "p")).collect());

    let params = Params::from_query("page[number]=2&page[size]=10");
    let d = dispatcher(Plain, &mock);
    let res = response(d.dispatch(Action::Index, &RequestContext::new(), &params).await);

    let calls = mock.calls();
    let MockCall::Count(counted) = &calls[0] else {
        panic!("expected count first, got {:?}", calls[0]);
    };
    assert_eq!(counted.window(), None);
    assert_eq!(executed_queries(&mock)[0].window(), Some((10, 10)));

    let body = res.json().unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 10);
    assert_eq!(
        body["meta"]["page"],
        json!({ "number": 2, "size": 10, "total": 25, "total-pages": 3 })
    );
    mock.verify();
}

#[tokio::test]
async fn partial_pagination_is_a_bad_request() {
    let mock = MockRepo::new();
    let d = dispatcher(Plain, &mock);

    let params = Params::from_query("page[number]=2");
    let err = d
        .dispatch(Action::Index, &RequestContext::new(), &params)
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Params(ParamError::IncompletePage)));
    assert_eq!(err.status(), Status::BAD_REQUEST);
    assert!(mock.calls().is_empty());
}

/// Refuses to filter on `secret` with a 403.
struct GuardedFilter;

#[async_trait]
impl ResourceController for GuardedFilter {
    type Repo = MockRepo<Post>;

    async fn apply_filter(
        &self,
        resource: &ResourceDescriptor<MockRepo<Post>>,
        ctx: &RequestContext,
        query: MockQuery,
        filter: &FilterSpec,
    ) -> StepResult<MockQuery> {
        if filter.field == "secret" {
            return Ok(ActionOutcome::Terminal(Response::new(Status::FORBIDDEN)));
        }
        defaults::apply_filter(resource, ctx, query, filter).await
    }
}

#[tokio::test]
async fn terminal_outcome_short_circuits_the_pipeline() {
    let mock = MockRepo::new();
    let d = dispatcher(GuardedFilter, &mock);

    let params = Params::from_query("filter[status]=draft&filter[secret]=x&sort=title");
    let res = response(d.dispatch(Action::Index, &RequestContext::new(), &params).await);

    assert_eq!(res, Response::new(Status::FORBIDDEN));
    assert!(mock.calls().is_empty(), "nothing may run after a terminal step");
}

/// Answers index requests itself.
struct CustomIndex;

#[async_trait]
impl ResourceController for CustomIndex {
    type Repo = MockRepo<Post>;

    async fn handle_index_query(
        &self,
        _resource: &ResourceDescriptor<MockRepo<Post>>,
        _ctx: &RequestContext,
        _query: MockQuery,
    ) -> StepResult<IndexQuery<MockQuery, Post>> {
        let page = Page::unpaginated(vec![Post::new(42, "featured")]);
        Ok(ActionOutcome::Continue(IndexQuery::Paginated(page)))
    }
}

#[tokio::test]
async fn index_hook_can_bypass_refinement() {
    let mock = MockRepo::new();
    let d = dispatcher(CustomIndex, &mock);

    let params = Params::from_query("filter[status]=draft&page[number]=1&page[size]=5");
    let res = response(d.dispatch(Action::Index, &RequestContext::new(), &params).await);

    assert_eq!(res.status, Status::OK);
    assert_eq!(res.json().unwrap()["data"][0]["id"], "42");
    assert!(mock.calls().is_empty());
}

/// Hides archived records from every action.
struct SoftDeleted;

#[async_trait]
impl ResourceController for SoftDeleted {
    type Repo = MockRepo<Post>;

    async fn resolve_base_query(
        &self,
        resource: &ResourceDescriptor<MockRepo<Post>>,
        ctx: &RequestContext,
        action: Action,
    ) -> StepResult<MockQuery> {
        let repo = resource.repo();
        let outcome = defaults::resolve_base_query(resource, ctx, action).await?;
        Ok(outcome.map(|query| repo.narrow_by_equality(query, "archived", &json!(false))))
    }
}

#[tokio::test]
async fn base_query_override_scopes_record_resolution() {
    let mock = MockRepo::new();
    mock.expect_execute().return_ok(vec![Post::new(1, "a")]);

    let d = dispatcher(SoftDeleted, &mock);
    let params = Params::new().with_id("1");
    let res = response(d.dispatch(Action::Show, &RequestContext::new(), &params).await);

    assert_eq!(res.status, Status::OK);
    assert_eq!(res.json().unwrap()["data"]["attributes"]["title"], "a");
    let query = &executed_queries(&mock)[0];
    assert_eq!(
        query.filters(),
        vec![("archived", &json!(false)), ("id", &json!("1"))]
    );
    assert_eq!(query.window(), Some((0, 1)));
}

#[tokio::test]
async fn show_of_missing_record_renders_not_found() {
    let mock = MockRepo::new();
    mock.expect_execute().return_ok(vec![]);

    let d = dispatcher(Plain, &mock);
    let res = response(
        d.dispatch(Action::Show, &RequestContext::new(), &Params::new().with_id("9"))
            .await,
    );

    assert_eq!(res.status, Status::NOT_FOUND);
    assert_eq!(res.json().unwrap()["errors"][0]["status"], "404");
}

#[tokio::test]
async fn not_found_skips_mutation_for_update_and_delete() {
    for action in [Action::Update, Action::Delete] {
        let mock = MockRepo::new();
        mock.expect_execute().return_ok(vec![]);

        let d = dispatcher(Plain, &mock);
        let params = Params::new().with_id("9").with_body(create_body());
        let res = response(d.dispatch(action, &RequestContext::new(), &params).await);

        assert_eq!(res.status, Status::NOT_FOUND, "{action}");
        assert_eq!(mock.calls().len(), 1, "{action}: only the lookup may run");
        mock.verify();
    }
}

#[tokio::test]
async fn sanitize_defaults_to_identity() {
    let mock = MockRepo::new();
    mock.expect_insert().return_ok(Post::new(5, "Hello"));

    let d = dispatcher(Plain, &mock);
    let params = Params::new().with_body(create_body());
    let res = response(d.dispatch(Action::Create, &RequestContext::new(), &params).await);

    assert_eq!(res.status, Status::CREATED);
    let MockCall::Validate { action, attributes } = &mock.calls()[0] else {
        panic!("expected validation first");
    };
    assert_eq!(*action, Action::Create);
    let keys: Vec<&str> = attributes.keys().map(String::as_str).collect();
    assert_eq!(keys, ["title", "published_at", "type"]);
    assert_eq!(attributes["published_at"], "2024-05-01");
    mock.verify();
}

#[tokio::test]
async fn create_without_data_is_a_bad_request() {
    let mock = MockRepo::new();
    let d = dispatcher(Plain, &mock);

    let params = Params::new().with_body(json!({ "title": "flat" }));
    let err = d
        .dispatch(Action::Create, &RequestContext::new(), &params)
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Params(ParamError::MissingData)));
}

/// Captures the errors its invalid renderer receives.
#[derive(Default)]
struct RecordingInvalid {
    seen: Arc<Mutex<Option<FieldErrors>>>,
}

#[async_trait]
impl ResourceController for RecordingInvalid {
    type Repo = MockRepo<Post>;

    async fn render_invalid_create(
        &self,
        resource: &ResourceDescriptor<MockRepo<Post>>,
        ctx: &RequestContext,
        errors: FieldErrors,
    ) -> Result<Response, DispatchError> {
        *self.seen.lock().unwrap() = Some(errors.clone());
        defaults::render_invalid(resource, ctx, errors).await
    }

    async fn render_invalid_update(
        &self,
        resource: &ResourceDescriptor<MockRepo<Post>>,
        ctx: &RequestContext,
        errors: FieldErrors,
    ) -> Result<Response, DispatchError> {
        *self.seen.lock().unwrap() = Some(errors.clone());
        defaults::render_invalid(resource, ctx, errors).await
    }
}

#[tokio::test]
async fn invalid_mutation_skips_persist_and_reaches_the_renderer() {
    let mock = MockRepo::new();
    let errors = FieldErrors::single("title", "can't be blank");
    mock.expect_validate().return_invalid(errors.clone());

    let controller = RecordingInvalid::default();
    let seen = Arc::clone(&controller.seen);
    let d = dispatcher(controller, &mock);
    let params = Params::new().with_body(create_body());
    let res = response(d.dispatch(Action::Create, &RequestContext::new(), &params).await);

    assert_eq!(res.status, Status::UNPROCESSABLE_ENTITY);
    assert_eq!(seen.lock().unwrap().as_ref(), Some(&errors));
    assert!(!mock
        .calls()
        .iter()
        .any(|call| matches!(call, MockCall::Insert(_))));

    let body = res.json().unwrap();
    assert_eq!(
        body["errors"][0],
        json!({
            "status": "422",
            "title": "Invalid Attribute",
            "detail": "title can't be blank",
            "source": { "pointer": "/data/attributes/title" }
        })
    );
    mock.verify();
}

#[tokio::test]
async fn invalid_update_skips_persist_and_reaches_the_renderer() {
    let mock = MockRepo::new();
    mock.expect_execute().return_ok(vec![Post::new(3, "old")]);
    let errors = FieldErrors::single("title", "is too short");
    mock.expect_validate().return_invalid(errors.clone());

    let controller = RecordingInvalid::default();
    let seen = Arc::clone(&controller.seen);
    let d = dispatcher(controller, &mock);
    let params = Params::new().with_id("3").with_body(json!({
        "data": { "type": "posts", "id": "3", "attributes": { "title": "x" } }
    }));
    let res = response(d.dispatch(Action::Update, &RequestContext::new(), &params).await);

    assert_eq!(res.status, Status::UNPROCESSABLE_ENTITY);
    assert_eq!(seen.lock().unwrap().as_ref(), Some(&errors));
    assert!(!mock
        .calls()
        .iter()
        .any(|call| matches!(call, MockCall::Update(_))));
    assert_eq!(
        res.json().unwrap()["errors"][0]["detail"],
        "title is too short"
    );
    mock.verify();
}

#[tokio::test]
async fn update_validates_the_resolved_record_then_saves() {
    let mock = MockRepo::new();
    mock.expect_execute().return_ok(vec![Post::new(3, "old")]);
    mock.expect_update().return_ok(Post::new(3, "new"));

    let d = dispatcher(Plain, &mock);
    let params = Params::new().with_id("3").with_body(json!({
        "data": { "type": "posts", "id": "3", "attributes": { "title": "new" } }
    }));
    let res = response(d.dispatch(Action::Update, &RequestContext::new(), &params).await);

    assert_eq!(res.status, Status::OK);
    assert_eq!(res.json().unwrap()["data"]["attributes"]["title"], "new");
    assert!(matches!(
        mock.calls()[1],
        MockCall::Validate { action: Action::Update, .. }
    ));
    assert_eq!(mock.calls()[2], MockCall::Update(Post::new(3, "old")));
    mock.verify();
}

#[tokio::test]
async fn delete_renders_no_content() {
    let mock = MockRepo::new();
    let post = Post::new(3, "gone");
    mock.expect_execute().return_ok(vec![post.clone()]);
    mock.expect_delete().return_ok(MutationResult::Valid(post.clone()));

    let d = dispatcher(Plain, &mock);
    let res = response(
        d.dispatch(Action::Delete, &RequestContext::new(), &Params::new().with_id("3"))
            .await,
    );

    assert_eq!(res.status, Status::NO_CONTENT);
    assert!(res.body.is_empty());
    assert_eq!(mock.calls()[1], MockCall::Delete(post));
    mock.verify();
}

#[tokio::test]
async fn rejected_delete_renders_field_errors() {
    let mock = MockRepo::new();
    let post = Post::new(3, "kept");
    mock.expect_execute().return_ok(vec![post]);
    mock.expect_delete().return_ok(MutationResult::Invalid(FieldErrors::single(
        "base",
        "has dependent comments",
    )));

    let d = dispatcher(Plain, &mock);
    let res = response(
        d.dispatch(Action::Delete, &RequestContext::new(), &Params::new().with_id("3"))
            .await,
    );

    assert_eq!(res.status, Status::UNPROCESSABLE_ENTITY);
    assert_eq!(
        res.json().unwrap()["errors"][0]["detail"],
        "base has dependent comments"
    );
}

#[tokio::test]
async fn excluded_action_passes_through_untouched() {
    let mock = MockRepo::new();
    let d = Dispatcher::new(
        Plain,
        ResourceDescriptor::new("posts", mock.clone()),
        DispatchConfig::new().exclude(Action::Delete),
    );

    assert!(!d.handles(Action::Delete));
    let result = d
        .dispatch(Action::Delete, &RequestContext::new(), &Params::new().with_id("1"))
        .await
        .unwrap();

    assert_eq!(result, Dispatched::Passthrough);
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn cancelled_request_stops_before_the_next_step() {
    let mock = MockRepo::new();
    let ctx = RequestContext::new();
    ctx.cancellation().cancel();

    let d = dispatcher(Plain, &mock);
    let result = d.dispatch(Action::Index, &ctx, &Params::new()).await.unwrap();

    assert_eq!(result, Dispatched::Cancelled);
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn collaborator_failures_propagate() {
    let mock = MockRepo::new();
    mock.expect_execute()
        .return_err(CollaboratorError::Unavailable("database down".into()));

    let d = dispatcher(Plain, &mock);
    let err = d
        .dispatch(Action::Index, &RequestContext::new(), &Params::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DispatchError::Collaborator(CollaboratorError::Unavailable(_))
    ));
    assert_eq!(err.status(), Status::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn record_actions_require_an_identifier() {
    let mock = MockRepo::new();
    let d = dispatcher(Plain, &mock);

    let err = d
        .dispatch(Action::Show, &RequestContext::new(), &Params::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DispatchError::Params(ParamError::MissingIdentifier(Action::Show))
    ));
}
