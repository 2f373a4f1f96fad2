//! # Blog Lifecycle
//!
//! Starts the store actors, wires them together and builds the router.
//!
//! Stores are created first and bound to their dependencies when they start:
//! the author store receives the post store as its `Context` so it can refuse
//! to delete authors who still have posts.
//!
//! Shutdown drops every store handle (the router's included), which closes the
//! channels, then waits for each actor to finish. The dependency graph is
//! acyclic, so the post actor stops once the author actor has released its
//! handle.

pub mod blog_system;

pub use blog_system::BlogSystem;
