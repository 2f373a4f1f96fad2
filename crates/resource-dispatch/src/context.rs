//! # Request Context
//!
//! Read-only request metadata passed by reference through every step. The
//! dispatcher never mutates it. Hosts build one per request; nothing in it is
//! shared with other in-flight dispatches except the cancellation token's
//! parent, if the host chose to derive it from one.

use serde_json::Value;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    caller: Option<String>,
    assigns: HashMap<String, Value>,
    cancellation: CancellationToken,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity of the authenticated caller, set by middleware upstream.
    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        self.caller = Some(caller.into());
        self
    }

    pub fn with_assign(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assigns.insert(key.into(), value.into());
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn caller(&self) -> Option<&str> {
        self.caller.as_deref()
    }

    pub fn assign(&self, key: &str) -> Option<&Value> {
        self.assigns.get(key)
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
