use async_trait::async_trait;
use resource_dispatch::memory::{MemoryQuery, MemoryStore, Record, StoreActor};
use resource_dispatch::{
    Action, DispatchConfig, Dispatched, Dispatcher, FieldErrors, Params, RequestContext,
    ResourceController, ResourceDescriptor, Response, Status,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Article {
    id: Option<u64>,
    title: String,
    #[serde(default)]
    rating: u32,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    author_id: Option<u64>,
}

impl Article {
    fn new(title: &str, rating: u32) -> Self {
        Self {
            title: title.to_string(),
            rating,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Record for Article {
    type Context = ();

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    fn validate(&self, _action: Action) -> Result<(), FieldErrors> {
        if self.title.trim().is_empty() {
            return Err(FieldErrors::single("title", "can't be blank"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Writer {
    id: Option<u64>,
    name: String,
}

#[async_trait]
impl Record for Writer {
    /// Articles are checked before a writer is removed.
    type Context = MemoryStore<Article>;

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    async fn on_delete(&self, articles: &MemoryStore<Article>) -> Result<(), FieldErrors> {
        let query = MemoryQuery::new().where_eq("author_id", self.id);
        match articles.total(query).await {
            Ok(0) => Ok(()),
            Ok(_) => Err(FieldErrors::single("base", "still has articles")),
            Err(e) => Err(FieldErrors::single("base", e.to_string())),
        }
    }
}

struct Articles;

impl ResourceController for Articles {
    type Repo = MemoryStore<Article>;
}

struct Writers;

impl ResourceController for Writers {
    type Repo = MemoryStore<Writer>;
}

fn article_store() -> MemoryStore<Article> {
    let (actor, store) = StoreActor::<Article>::new(16);
    tokio::spawn(actor.run(()));
    store
}

fn articles(store: &MemoryStore<Article>) -> Dispatcher<Articles> {
    Dispatcher::new(
        Articles,
        ResourceDescriptor::new("articles", store.clone()),
        DispatchConfig::new(),
    )
}

async fn call<C: ResourceController>(d: &Dispatcher<C>, action: Action, params: Params) -> Response {
    match d.dispatch(action, &RequestContext::new(), &params).await {
        Ok(Dispatched::Response(response)) => response,
        other => panic!("unexpected dispatch result: {other:?}"),
    }
}

fn body(attributes: Value) -> Value {
    json!({ "data": { "type": "articles", "attributes": attributes } })
}

#[tokio::test]
async fn create_then_show_round_trips_through_the_actor() {
    let store = article_store();
    let d = articles(&store);

    let created = call(
        &d,
        Action::Create,
        Params::new().with_body(body(json!({ "title": "Actors", "rating": 4 }))),
    )
    .await;
    assert_eq!(created.status, Status::CREATED);
    let data = &created.json().unwrap()["data"];
    assert_eq!(data["id"], "1");
    assert_eq!(data["type"], "articles");

    let shown = call(&d, Action::Show, Params::new().with_id("1")).await;
    assert_eq!(shown.status, Status::OK);
    assert_eq!(shown.json().unwrap()["data"]["attributes"]["title"], "Actors");
}

#[tokio::test]
async fn record_validation_blocks_the_insert() {
    let store = article_store();
    let d = articles(&store);

    let res = call(
        &d,
        Action::Create,
        Params::new().with_body(body(json!({ "title": "  " }))),
    )
    .await;

    assert_eq!(res.status, Status::UNPROCESSABLE_ENTITY);
    assert_eq!(
        res.json().unwrap()["errors"][0]["source"]["pointer"],
        "/data/attributes/title"
    );
    assert_eq!(store.total(MemoryQuery::new()).await.unwrap(), 0);
}

#[tokio::test]
async fn ill_typed_attributes_are_reported_per_field() {
    let store = article_store();
    let d = articles(&store);

    let res = call(
        &d,
        Action::Create,
        Params::new().with_body(body(json!({ "title": "ok", "rating": "lots" }))),
    )
    .await;

    assert_eq!(res.status, Status::UNPROCESSABLE_ENTITY);
    let errors = &res.json().unwrap()["errors"];
    assert_eq!(errors.as_array().unwrap().len(), 1);
    assert_eq!(errors[0]["detail"], "rating is invalid");
}

#[tokio::test]
async fn relationship_identifiers_are_coerced_to_numbers() {
    let store = article_store();
    let d = articles(&store);

    let payload = json!({
        "data": {
            "type": "articles",
            "attributes": { "title": "Linked" },
            "relationships": { "author": { "data": { "type": "writers", "id": "7" } } }
        }
    });
    let res = call(&d, Action::Create, Params::new().with_body(payload)).await;

    assert_eq!(res.status, Status::CREATED);
    let saved = store.all(MemoryQuery::new()).await.unwrap();
    assert_eq!(saved[0].author_id, Some(7));
}

#[tokio::test]
async fn index_filters_sorts_and_paginates() {
    let store = article_store();
    let seeded = (1..=25).map(|i| Article::new(&format!("a{i:02}"), i % 3));
    store.seed(seeded).await.unwrap();
    let d = articles(&store);

    let filtered = call(
        &d,
        Action::Index,
        Params::from_query("filter[rating]=0&sort=-title&page[number]=1&page[size]=3"),
    )
    .await;
    let doc = filtered.json().unwrap();
    let titles: Vec<&str> = doc["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["attributes"]["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["a24", "a21", "a18"]);
    assert_eq!(doc["meta"]["page"]["total"], 8);
    assert_eq!(doc["meta"]["page"]["total-pages"], 3);

    let last = call(
        &d,
        Action::Index,
        Params::from_query("page[number]=3&page[size]=10"),
    )
    .await;
    let doc = last.json().unwrap();
    assert_eq!(doc["data"].as_array().unwrap().len(), 5);
    assert_eq!(doc["meta"]["page"]["total"], 25);
}

#[tokio::test]
async fn update_merges_attributes_into_the_stored_record() {
    let store = article_store();
    store.seed([Article::new("draft", 1)]).await.unwrap();
    let d = articles(&store);

    let res = call(
        &d,
        Action::Update,
        Params::new()
            .with_id("1")
            .with_body(body(json!({ "rating": 5 }))),
    )
    .await;

    assert_eq!(res.status, Status::OK);
    let stored = store.all(MemoryQuery::new()).await.unwrap();
    assert_eq!(stored[0].title, "draft");
    assert_eq!(stored[0].rating, 5);
}

#[tokio::test]
async fn delete_hook_can_refuse_with_field_errors() {
    let articles = article_store();
    let (actor, writers) = StoreActor::<Writer>::new(16);
    tokio::spawn(actor.run(articles.clone()));

    let ada = Writer {
        name: "Ada".into(),
        ..Writer::default()
    };
    let grace = Writer {
        name: "Grace".into(),
        ..Writer::default()
    };
    writers.seed([ada, grace]).await.unwrap();
    articles
        .seed([Article {
            author_id: Some(1),
            ..Article::new("notes", 5)
        }])
        .await
        .unwrap();

    let d = Dispatcher::new(
        Writers,
        ResourceDescriptor::new("writers", writers.clone()),
        DispatchConfig::new(),
    );

    let refused = call(&d, Action::Delete, Params::new().with_id("1")).await;
    assert_eq!(refused.status, Status::UNPROCESSABLE_ENTITY);
    assert_eq!(
        refused.json().unwrap()["errors"][0]["detail"],
        "base still has articles"
    );

    let removed = call(&d, Action::Delete, Params::new().with_id("2")).await;
    assert_eq!(removed.status, Status::NO_CONTENT);
    assert_eq!(writers.total(MemoryQuery::new()).await.unwrap(), 1);
}

#[tokio::test]
async fn closed_store_surfaces_as_a_collaborator_error() {
    let (actor, store) = StoreActor::<Article>::new(1);
    drop(actor);
    let d = articles(&store);

    let err = d
        .dispatch(Action::Index, &RequestContext::new(), &Params::new())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Status::INTERNAL_SERVER_ERROR);
}
