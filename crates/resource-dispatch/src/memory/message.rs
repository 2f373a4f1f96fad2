//! # Store Messages
//!
//! Requests sent from a [`MemoryStore`](super::MemoryStore) to its
//! [`StoreActor`](super::StoreActor). Each carries a oneshot sender for the reply.

use super::error::StoreError;
use super::query::MemoryQuery;
use super::record::Record;
use crate::outcome::MutationResult;
use tokio::sync::oneshot;

/// The one-shot reply channel used by the store actor.
pub type Reply<T> = oneshot::Sender<Result<T, StoreError>>;

/// Operations the store actor understands.
///
/// Reads take a [`MemoryQuery`] rather than an id, so filter, sort and window
/// are all evaluated inside the actor against a consistent snapshot.
#[derive(Debug)]
pub enum StoreRequest<R: Record> {
    Execute {
        query: MemoryQuery,
        respond_to: Reply<Vec<R>>,
    },
    Count {
        query: MemoryQuery,
        respond_to: Reply<u64>,
    },
    Insert {
        record: R,
        respond_to: Reply<R>,
    },
    Update {
        record: R,
        respond_to: Reply<R>,
    },
    Delete {
        id: u64,
        respond_to: Reply<MutationResult<R>>,
    },
}
