//! Per-dispatcher configuration, decided once at construction time.

use crate::action::Action;
use crate::params::PaginationSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Actions this resource does not serve. The router should never route them here.
    pub excluded: BTreeSet<Action>,
    pub pagination: PaginationConfig,
}

impl DispatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude(mut self, action: Action) -> Self {
        self.excluded.insert(action);
        self
    }

    /// Restricts the resource to `actions`; everything else is excluded.
    pub fn only(mut self, actions: &[Action]) -> Self {
        self.excluded = Action::ALL
            .into_iter()
            .filter(|action| !actions.contains(action))
            .collect();
        self
    }

    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn handles(&self, action: Action) -> bool {
        !self.excluded.contains(&action)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size used when the request names no page. `None` returns the full set.
    pub default_size: Option<u64>,
    /// Upper bound on requested page sizes. `None` leaves them unbounded.
    pub max_size: Option<u64>,
}

impl PaginationConfig {
    /// Applies the default and the cap to what the request asked for.
    pub fn resolve(&self, requested: Option<PaginationSpec>) -> Option<PaginationSpec> {
        let spec = match requested {
            Some(spec) => spec,
            None => PaginationSpec {
                number: 1,
                size: self.default_size?,
            },
        };
        let size = match self.max_size {
            Some(max) => spec.size.min(max.max(1)),
            None => spec.size,
        };
        Some(PaginationSpec { size, ..spec })
    }
}
