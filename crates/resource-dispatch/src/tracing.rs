//! # Logging
//!
//! Everything in this crate logs through `tracing`. Each dispatch opens an
//! `info` span named `dispatch` carrying `resource` and `action`, so step logs
//! nest under the request that produced them:
//!
//! ```text
//! INFO dispatch{resource="posts" action=index}: Dispatched status=200
//! ```
//!
//! | Level | What |
//! |-------|------|
//! | `info`  | Dispatch results, terminal responses, store lifecycle and writes |
//! | `debug` | Every step as it starts, filter/sort arguments, store reads |
//! | `warn`  | Not found, invalid mutations, cancellation, failed dispatches |
//!
//! Filter with `RUST_LOG`, e.g. `RUST_LOG=resource_dispatch=debug`.

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
///
/// Call once, at startup. Panics if a global subscriber is already set.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
