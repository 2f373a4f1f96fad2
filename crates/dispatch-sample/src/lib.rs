//! # Blog Sample
//!
//! A two-resource blog (authors and posts) served through `resource-dispatch`
//! on top of its in-memory stores.
//!
//! - **[model]**: [`Author`](model::Author) and [`Post`](model::Post) records.
//! - **[controllers]**: Step overrides per resource.
//! - **[router]**: Method/path routing and error responses.
//! - **[lifecycle]**: Starting and stopping the store actors.
//! - **[settings]**: Layered configuration.

pub mod controllers;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod router;
pub mod settings;
