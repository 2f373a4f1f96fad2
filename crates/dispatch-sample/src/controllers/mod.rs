//! Per-resource step overrides.
//!
//! Each controller implements only the steps it changes; everything else runs
//! the built-in pipeline.

pub mod authors;
pub mod posts;

pub use authors::AuthorController;
pub use posts::PostController;
