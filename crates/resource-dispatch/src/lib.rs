//! # Resource Dispatch
//!
//! A framework for serving JSON:API-style resources. A host declares a resource
//! (its entity type and collaborators), and the framework answers the five
//! standard actions (`index`, `show`, `create`, `update`, `delete`) by running a
//! fixed pipeline of steps. Any step can be replaced per resource; every other
//! step keeps its built-in behaviour.
//!
//! ## Architecture Overview
//!
//! 1. **Controller** ([`ResourceController`]) - the override table. Every step is
//!    a provided async method; implement the ones you want to change.
//! 2. **Dispatcher** ([`Dispatcher`]) - the state machine. Runs the steps for an
//!    action in order and reacts to each step's [`ActionOutcome`].
//! 3. **Collaborators** ([`capability`]) - where records live and how documents
//!    are encoded. [`memory`] provides an actor-backed implementation; [`mock`]
//!    provides a test double.
//!
//! ## Outcomes
//!
//! Every step returns an [`ActionOutcome`]:
//!
//! | Outcome | Effect |
//! |---------|--------|
//! | `Continue(v)` | `v` is the input of the next step |
//! | `Terminal(response)` | Stop; `response` is the final result, no renderer runs |
//! | `NotFound` | Stop; the resource's `render_not_found` runs |
//! | `Mutation(Valid(v))` | Continue with `v` |
//! | `Mutation(Invalid(errors))` | Stop; the action's invalid renderer gets `errors` |
//!
//! ## Minimal Resource
//!
//! ```rust,ignore
//! use resource_dispatch::memory::{Record, StoreActor};
//! use resource_dispatch::{
//!     Action, DispatchConfig, Dispatcher, Params, RequestContext, ResourceController,
//!     ResourceDescriptor,
//! };
//!
//! struct Posts;
//!
//! impl ResourceController for Posts {
//!     type Repo = MemoryStore<Post>;
//! }
//!
//! let (actor, store) = StoreActor::<Post>::new(32);
//! tokio::spawn(actor.run(()));
//!
//! let dispatcher = Dispatcher::new(
//!     Posts,
//!     ResourceDescriptor::new("posts", store),
//!     DispatchConfig::new(),
//! );
//! let result = dispatcher
//!     .dispatch(Action::Index, &RequestContext::new(), &Params::from_query("sort=-title"))
//!     .await?;
//! ```
//!
//! With no methods implemented, the resource gets the default pipelines:
//! equality filters, field sorting, page-number pagination, and JSON:API
//! documents with 200/201/204/404/422 statuses.

pub mod action;
pub mod attributes;
pub mod capability;
pub mod config;
pub mod context;
pub mod controller;
pub mod defaults;
pub mod dispatcher;
pub mod error;
pub mod memory;
pub mod mock;
pub mod outcome;
pub mod params;
pub mod render;
pub mod resource;
pub mod response;
pub mod tracing;

pub use action::{Action, Step};
pub use attributes::{flatten, permit, FlatAttributes};
pub use capability::{Persistence, QuerySource, Repository, Serializer};
pub use config::{DispatchConfig, PaginationConfig};
pub use context::RequestContext;
pub use controller::{Mutation, ResourceController, StepResult};
pub use dispatcher::{Dispatched, Dispatcher};
pub use error::{CollaboratorError, DispatchError, ParamError};
pub use outcome::{ActionOutcome, FieldErrors, IndexQuery, MutationResult, Page, PageMeta};
pub use params::{FilterSpec, PaginationSpec, Params, QuerySpec, SortDirection, SortSpec};
pub use render::{Document, ErrorObject, JsonApiSerializer, SerializeOptions};
pub use resource::{EntityOf, QueryOf, ResourceDescriptor};
pub use response::{Response, Status};
