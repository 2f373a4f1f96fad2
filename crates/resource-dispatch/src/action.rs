//! # Actions & Steps
//!
//! The five conventional resource actions and the named steps each one runs.
//! Both enums are small `Copy` values used as span fields, config keys and
//! error context.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// A conventional create/read/update/delete operation on a resource.
///
/// The sequence of steps each action runs is fixed:
///
/// - **Index**: resolve base query → index hook → filters → sorts → pagination → render
/// - **Show**: resolve record → render (or not-found)
/// - **Create**: flatten → sanitize → mutate → persist → render (or invalid)
/// - **Update**: resolve record → flatten → sanitize → mutate → persist → render
/// - **Delete**: resolve record → mutate → render
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Index,
    Show,
    Create,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Index,
        Action::Show,
        Action::Create,
        Action::Update,
        Action::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Index => "index",
            Action::Show => "show",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    /// Whether the action addresses a single record by identifier.
    pub fn targets_record(&self) -> bool {
        matches!(self, Action::Show | Action::Update | Action::Delete)
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "index" => Ok(Action::Index),
            "show" => Ok(Action::Show),
            "create" => Ok(Action::Create),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            other => Err(format!("unknown action: {other}")),
        }
    }
}

/// One named unit of an action pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    ResolveBaseQuery,
    IndexQueryHook,
    ApplyFilter,
    ApplySort,
    ApplyPagination,
    ResolveRecord,
    FlattenAttributes,
    Sanitize,
    Mutate,
    Persist,
    Render,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::ResolveBaseQuery => "resolve_base_query",
            Step::IndexQueryHook => "handle_index_query",
            Step::ApplyFilter => "apply_filter",
            Step::ApplySort => "apply_sort",
            Step::ApplyPagination => "apply_pagination",
            Step::ResolveRecord => "resolve_record",
            Step::FlattenAttributes => "flatten",
            Step::Sanitize => "sanitize",
            Step::Mutate => "mutate",
            Step::Persist => "persist",
            Step::Render => "render",
        }
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
