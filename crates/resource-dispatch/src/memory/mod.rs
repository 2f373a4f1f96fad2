//! # In-Memory Store
//!
//! An actor-backed [`Repository`](crate::capability::Repository) for hosts that
//! have no database, and for tests. One [`StoreActor`] owns the rows of one
//! record type; [`MemoryStore`] handles talk to it over a channel.
//!
//! ```rust,ignore
//! let (actor, posts) = StoreActor::<Post>::new(32);
//! tokio::spawn(actor.run(()));
//! let resource = ResourceDescriptor::new("posts", posts);
//! ```

mod actor;
mod client;
mod error;
mod message;
mod query;
mod record;

pub use actor::StoreActor;
pub use client::MemoryStore;
pub use error::StoreError;
pub use message::{Reply, StoreRequest};
pub use query::{Condition, MemoryQuery};
pub use record::Record;
