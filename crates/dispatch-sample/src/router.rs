//! # Router
//!
//! Maps `METHOD /resource[/id]` onto a resource dispatcher and an action, and
//! turns whatever the dispatcher returns into a [`Response`]. Actions a
//! resource excludes are answered here with 405 and never reach its dispatcher.

use crate::controllers::{AuthorController, PostController};
use resource_dispatch::{
    Action, Dispatched, Dispatcher, Params, RequestContext, ResourceController, Response, Status,
};
use serde_json::{json, Value};
use std::str::FromStr;
use tracing::{debug, warn};

const METHOD_NOT_ALLOWED: Status = Status(405);
const SERVICE_UNAVAILABLE: Status = Status(503);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PATCH" | "PUT" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(format!("unsupported method: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceName {
    Posts,
    Authors,
}

impl FromStr for ResourceName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "posts" => Ok(ResourceName::Posts),
            "authors" => Ok(ResourceName::Authors),
            other => Err(format!("unknown resource: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub resource: ResourceName,
    pub action: Action,
    pub id: Option<String>,
}

/// `None` when nothing matches.
pub fn route(method: Method, path: &str) -> Option<Route> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let (resource, id) = match segments.as_slice() {
        [resource] => (resource.parse().ok()?, None),
        [resource, id] => (resource.parse().ok()?, Some(id.to_string())),
        _ => return None,
    };
    let action = match (method, &id) {
        (Method::Get, None) => Action::Index,
        (Method::Post, None) => Action::Create,
        (Method::Get, Some(_)) => Action::Show,
        (Method::Patch, Some(_)) => Action::Update,
        (Method::Delete, Some(_)) => Action::Delete,
        _ => return None,
    };
    Some(Route {
        resource,
        action,
        id,
    })
}

/// One incoming request, already decoded by the transport.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: String,
    pub body: Option<Value>,
    pub context: RequestContext,
}

impl Request {
    /// `target` may carry a query string: `/posts?sort=-title`.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        Self {
            method,
            path: path.to_string(),
            query: query.to_string(),
            body: None,
            context: RequestContext::new(),
        }
    }

    pub fn get(target: &str) -> Self {
        Self::new(Method::Get, target)
    }

    pub fn post(target: &str, body: Value) -> Self {
        Self::new(Method::Post, target).with_body(body)
    }

    pub fn patch(target: &str, body: Value) -> Self {
        Self::new(Method::Patch, target).with_body(body)
    }

    pub fn delete(target: &str) -> Self {
        Self::new(Method::Delete, target)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn as_caller(mut self, caller: impl Into<String>) -> Self {
        self.context = self.context.with_caller(caller);
        self
    }
}

pub struct Router {
    posts: Dispatcher<PostController>,
    authors: Dispatcher<AuthorController>,
}

impl Router {
    pub fn new(posts: Dispatcher<PostController>, authors: Dispatcher<AuthorController>) -> Self {
        Self { posts, authors }
    }

    pub async fn handle(&self, request: Request) -> Response {
        let Some(route) = route(request.method, &request.path) else {
            debug!(method = ?request.method, path = %request.path, "No route");
            return error_response(Status::NOT_FOUND, "Not Found", "no such route");
        };
        match route.resource {
            ResourceName::Posts => forward(&self.posts, route, request).await,
            ResourceName::Authors => forward(&self.authors, route, request).await,
        }
    }
}

async fn forward<C: ResourceController>(
    dispatcher: &Dispatcher<C>,
    route: Route,
    request: Request,
) -> Response {
    if !dispatcher.handles(route.action) {
        return not_allowed(route.action);
    }

    let mut params = Params::from_query(&request.query);
    if let Some(id) = route.id {
        params = params.with_id(id);
    }
    if let Some(body) = request.body {
        params = params.with_body(body);
    }

    match dispatcher.dispatch(route.action, &request.context, &params).await {
        Ok(Dispatched::Response(response)) => response,
        Ok(Dispatched::Passthrough) => not_allowed(route.action),
        Ok(Dispatched::Cancelled) => {
            error_response(SERVICE_UNAVAILABLE, "Cancelled", "request was cancelled")
        }
        Err(e) => {
            warn!(error = %e, "Request failed");
            let title = if e.status() == Status::BAD_REQUEST {
                "Bad Request"
            } else {
                "Internal Server Error"
            };
            error_response(e.status(), title, &e.to_string())
        }
    }
}

fn not_allowed(action: Action) -> Response {
    error_response(
        METHOD_NOT_ALLOWED,
        "Method Not Allowed",
        &format!("{action} is not available for this resource"),
    )
}

fn error_response(status: Status, title: &str, detail: &str) -> Response {
    let document = json!({
        "errors": [{ "status": status.to_string(), "title": title, "detail": detail }]
    });
    Response::new(status)
        .with_header("content-type", "application/vnd.api+json")
        .with_body(document.to_string())
}
