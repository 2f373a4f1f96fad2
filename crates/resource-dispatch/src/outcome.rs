//! # Step Outcomes
//!
//! Every step returns an [`ActionOutcome`]. The dispatcher classifies it at the
//! step boundary instead of inspecting the shape of whatever came back:
//!
//! | Outcome | Effect |
//! |---------|--------|
//! | `Continue(v)` / `Mutation(Valid(v))` | `v` feeds the next step |
//! | `Terminal(response)` | returned as-is; no later step runs |
//! | `NotFound` | `render_not_found` |
//! | `Mutation(Invalid(errors))` | the action's invalid renderer |

use crate::response::Response;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug)]
pub enum ActionOutcome<T> {
    Continue(T),
    Terminal(Response),
    NotFound,
    Mutation(MutationResult<T>),
}

impl<T> ActionOutcome<T> {
    pub fn valid(value: T) -> Self {
        ActionOutcome::Mutation(MutationResult::Valid(value))
    }

    pub fn invalid(errors: FieldErrors) -> Self {
        ActionOutcome::Mutation(MutationResult::Invalid(errors))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ActionOutcome::Terminal(_))
    }

    /// Transforms the carried value, leaving every other variant alone.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ActionOutcome<U> {
        match self {
            ActionOutcome::Continue(value) => ActionOutcome::Continue(f(value)),
            ActionOutcome::Terminal(response) => ActionOutcome::Terminal(response),
            ActionOutcome::NotFound => ActionOutcome::NotFound,
            ActionOutcome::Mutation(MutationResult::Valid(value)) => ActionOutcome::valid(f(value)),
            ActionOutcome::Mutation(MutationResult::Invalid(errors)) => {
                ActionOutcome::invalid(errors)
            }
        }
    }
}

impl<T> From<MutationResult<T>> for ActionOutcome<T> {
    fn from(result: MutationResult<T>) -> Self {
        ActionOutcome::Mutation(result)
    }
}

/// Result of running an entity through the persistence validation contract.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationResult<T> {
    Valid(T),
    Invalid(FieldErrors),
}

impl<T> MutationResult<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, MutationResult::Valid(_))
    }
}

/// Per-field validation messages, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(IndexMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(field, messages)| messages.iter().map(move |m| (field.as_str(), m.as_str())))
    }

    /// `Ok(())` when empty, so validation hooks can end with `errors.into_result()`.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// What the index hook hands back.
#[derive(Debug)]
pub enum IndexQuery<Q, E> {
    /// Keep refining: filters, sorts and pagination still apply.
    Refine(Q),
    /// Fully custom result; goes straight to `render_index`.
    Paginated(Page<E>),
}

/// Records for one index response, with page metadata when paginated.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<E> {
    pub records: Vec<E>,
    pub meta: Option<PageMeta>,
}

impl<E> Page<E> {
    pub fn unpaginated(records: Vec<E>) -> Self {
        Self {
            records,
            meta: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub number: u64,
    pub size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl PageMeta {
    pub fn new(number: u64, size: u64, total: u64) -> Self {
        Self {
            number,
            size,
            total,
            total_pages: total.div_ceil(size.max(1)),
        }
    }
}
