//! # Record Trait
//!
//! The contract a type implements to be stored by a [`StoreActor`](super::StoreActor).
//!
//! # Provided Methods (Hooks)
//! - [`Record::validate`] runs on every create/update before the store accepts it.
//! - [`Record::on_delete`] runs inside the actor right before removal and can veto it.
//!
//! Both default to accepting everything.

use crate::action::Action;
use crate::outcome::FieldErrors;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// A row type managed by the in-memory store.
///
/// Records travel through serde: attributes are merged into the serialized form
/// and read back, and queries match against the serialized fields. The primary
/// key is the `id` field.
///
/// # Async & Context
/// `on_delete` receives the `Context` passed to `StoreActor::run`. Dependencies
/// (usually other stores, for referential checks) are bound when the actor
/// starts, not when it is constructed, so stores can point at each other.
#[async_trait]
pub trait Record:
    Clone + Debug + Default + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Dependencies injected into the actor. Use `()` if none are needed.
    type Context: Send + Sync + 'static;

    /// `None` until the store assigns one on insert.
    fn id(&self) -> Option<u64>;

    fn assign_id(&mut self, id: u64);

    /// Checks the record after attributes were applied.
    fn validate(&self, _action: Action) -> Result<(), FieldErrors> {
        Ok(())
    }

    /// Called immediately before the record is removed. Returning errors keeps it.
    async fn on_delete(&self, _ctx: &Self::Context) -> Result<(), FieldErrors> {
        Ok(())
    }
}
