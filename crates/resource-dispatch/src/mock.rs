//! # Mock Repository
//!
//! [`MockRepo<E>`] implements [`QuerySource`] and [`Persistence`] without any
//! storage. Reads and writes are answered from a queue of expectations, every
//! call is recorded, and queries are plain [`MockQuery`] op logs, so a test can
//! assert exactly what a pipeline asked for.
//!
//! | | MockRepo | MemoryStore |
//! |---|---|---|
//! | **State** | None (expectations) | Real rows in an actor |
//! | **Query semantics** | Recorded, never evaluated | Evaluated |
//! | **Error injection** | `return_err` | Hard |
//! | **Use case** | Step order and short-circuit tests | End-to-end behaviour |
//!
//! ```rust,ignore
//! let mock = MockRepo::<Post>::new();
//! mock.expect_count().return_ok(25);
//! mock.expect_execute().return_ok(posts);
//!
//! let resource = ResourceDescriptor::new("posts", mock.clone());
//! // dispatch...
//! mock.verify();
//! ```
//!
//! Validation is the exception to the queue order: when the next expectation is
//! not a validation, `validate` accepts the entity unchanged.

use crate::action::Action;
use crate::attributes::FlatAttributes;
use crate::capability::{Persistence, QuerySource};
use crate::error::CollaboratorError;
use crate::outcome::{FieldErrors, MutationResult};
use crate::params::SortDirection;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOp {
    Eq { field: String, value: Value },
    Order { field: String, direction: SortDirection },
    Slice { offset: u64, limit: u64 },
}

/// A query that only remembers how it was built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockQuery {
    pub ops: Vec<QueryOp>,
}

impl MockQuery {
    /// Equality narrowings in application order.
    pub fn filters(&self) -> Vec<(&str, &Value)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                QueryOp::Eq { field, value } => Some((field.as_str(), value)),
                _ => None,
            })
            .collect()
    }

    pub fn sorts(&self) -> Vec<(&str, SortDirection)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                QueryOp::Order { field, direction } => Some((field.as_str(), *direction)),
                _ => None,
            })
            .collect()
    }

    pub fn window(&self) -> Option<(u64, u64)> {
        self.ops.iter().rev().find_map(|op| match op {
            QueryOp::Slice { offset, limit } => Some((*offset, *limit)),
            _ => None,
        })
    }

    fn with(mut self, op: QueryOp) -> Self {
        self.ops.push(op);
        self
    }
}

/// A call the mock received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall<E> {
    Execute(MockQuery),
    Count(MockQuery),
    Validate {
        action: Action,
        attributes: FlatAttributes,
    },
    Insert(E),
    Update(E),
    Delete(E),
}

enum Expectation<E> {
    Execute(Result<Vec<E>, CollaboratorError>),
    Count(Result<u64, CollaboratorError>),
    Validate(Option<FieldErrors>),
    Insert(Result<E, CollaboratorError>),
    Update(Result<E, CollaboratorError>),
    Delete(Result<MutationResult<E>, CollaboratorError>),
}

impl<E> Expectation<E> {
    fn name(&self) -> &'static str {
        match self {
            Expectation::Execute(_) => "execute",
            Expectation::Count(_) => "count",
            Expectation::Validate(_) => "validate",
            Expectation::Insert(_) => "insert",
            Expectation::Update(_) => "update",
            Expectation::Delete(_) => "delete",
        }
    }
}

type Queue<E> = Arc<Mutex<VecDeque<Expectation<E>>>>;

/// A repository double driven by expectations.
///
/// Clones share the same queue and call log, so keep one clone in the test and
/// hand the other to the resource descriptor.
pub struct MockRepo<E> {
    expectations: Queue<E>,
    calls: Arc<Mutex<Vec<MockCall<E>>>>,
}

impl<E> Clone for MockRepo<E> {
    fn clone(&self) -> Self {
        Self {
            expectations: Arc::clone(&self.expectations),
            calls: Arc::clone(&self.calls),
        }
    }
}

impl<E> Default for MockRepo<E> {
    fn default() -> Self {
        Self {
            expectations: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<E: Clone> MockRepo<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_execute(&self) -> ExpectationBuilder<E, Vec<E>> {
        self.builder(Expectation::Execute)
    }

    pub fn expect_count(&self) -> ExpectationBuilder<E, u64> {
        self.builder(Expectation::Count)
    }

    pub fn expect_insert(&self) -> ExpectationBuilder<E, E> {
        self.builder(Expectation::Insert)
    }

    pub fn expect_update(&self) -> ExpectationBuilder<E, E> {
        self.builder(Expectation::Update)
    }

    pub fn expect_delete(&self) -> ExpectationBuilder<E, MutationResult<E>> {
        self.builder(Expectation::Delete)
    }

    pub fn expect_validate(&self) -> ValidationBuilder<E> {
        ValidationBuilder {
            expectations: Arc::clone(&self.expectations),
        }
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<MockCall<E>> {
        self.calls.lock().clone()
    }

    /// Panics if any expectation was not consumed.
    pub fn verify(&self) {
        let exps = self.expectations.lock();
        if !exps.is_empty() {
            let pending: Vec<_> = exps.iter().map(Expectation::name).collect();
            panic!("Not all expectations were met. Remaining: {pending:?}");
        }
    }

    fn builder<T>(
        &self,
        wrap: fn(Result<T, CollaboratorError>) -> Expectation<E>,
    ) -> ExpectationBuilder<E, T> {
        ExpectationBuilder {
            expectations: Arc::clone(&self.expectations),
            wrap,
        }
    }

    fn record(&self, call: MockCall<E>) {
        self.calls.lock().push(call);
    }

    fn next(&self, call: &'static str) -> Expectation<E> {
        match self.expectations.lock().pop_front() {
            Some(expectation) => expectation,
            None => panic!("Unexpected {call}: no expectations left"),
        }
    }
}

pub struct ExpectationBuilder<E, T> {
    expectations: Queue<E>,
    wrap: fn(Result<T, CollaboratorError>) -> Expectation<E>,
}

impl<E, T> ExpectationBuilder<E, T> {
    pub fn return_ok(self, value: T) {
        self.expectations.lock().push_back((self.wrap)(Ok(value)));
    }

    pub fn return_err(self, error: CollaboratorError) {
        self.expectations.lock().push_back((self.wrap)(Err(error)));
    }
}

pub struct ValidationBuilder<E> {
    expectations: Queue<E>,
}

impl<E> ValidationBuilder<E> {
    pub fn return_valid(self) {
        self.expectations.lock().push_back(Expectation::Validate(None));
    }

    pub fn return_invalid(self, errors: FieldErrors) {
        self.expectations
            .lock()
            .push_back(Expectation::Validate(Some(errors)));
    }
}

#[async_trait]
impl<E> QuerySource for MockRepo<E>
where
    E: Clone + Debug + Send + Sync + 'static,
{
    type Query = MockQuery;
    type Entity = E;

    fn base_query(&self) -> MockQuery {
        MockQuery::default()
    }

    fn narrow_by_equality(&self, query: MockQuery, field: &str, value: &Value) -> MockQuery {
        query.with(QueryOp::Eq {
            field: field.to_string(),
            value: value.clone(),
        })
    }

    fn order_by(&self, query: MockQuery, field: &str, direction: SortDirection) -> MockQuery {
        query.with(QueryOp::Order {
            field: field.to_string(),
            direction,
        })
    }

    fn slice(&self, query: MockQuery, offset: u64, limit: u64) -> MockQuery {
        query.with(QueryOp::Slice { offset, limit })
    }

    async fn execute(&self, query: MockQuery) -> Result<Vec<E>, CollaboratorError> {
        self.record(MockCall::Execute(query));
        match self.next("execute") {
            Expectation::Execute(response) => response,
            other => panic!("Unexpected execute, expected {}", other.name()),
        }
    }

    async fn count(&self, query: MockQuery) -> Result<u64, CollaboratorError> {
        self.record(MockCall::Count(query));
        match self.next("count") {
            Expectation::Count(response) => response,
            other => panic!("Unexpected count, expected {}", other.name()),
        }
    }
}

#[async_trait]
impl<E> Persistence for MockRepo<E>
where
    E: Clone + Debug + Default + Send + Sync + 'static,
{
    type Entity = E;

    fn build(&self) -> E {
        E::default()
    }

    fn validate(&self, entity: E, attrs: &FlatAttributes, action: Action) -> MutationResult<E> {
        self.record(MockCall::Validate {
            action,
            attributes: attrs.clone(),
        });
        let mut exps = self.expectations.lock();
        if !matches!(exps.front(), Some(Expectation::Validate(_))) {
            return MutationResult::Valid(entity);
        }
        match exps.pop_front() {
            Some(Expectation::Validate(Some(errors))) => MutationResult::Invalid(errors),
            _ => MutationResult::Valid(entity),
        }
    }

    async fn insert(&self, entity: E) -> Result<E, CollaboratorError> {
        self.record(MockCall::Insert(entity));
        match self.next("insert") {
            Expectation::Insert(response) => response,
            other => panic!("Unexpected insert, expected {}", other.name()),
        }
    }

    async fn update(&self, entity: E) -> Result<E, CollaboratorError> {
        self.record(MockCall::Update(entity));
        match self.next("update") {
            Expectation::Update(response) => response,
            other => panic!("Unexpected update, expected {}", other.name()),
        }
    }

    async fn delete(&self, entity: E) -> Result<MutationResult<E>, CollaboratorError> {
        self.record(MockCall::Delete(entity));
        match self.next("delete") {
            Expectation::Delete(response) => response,
            other => panic!("Unexpected delete, expected {}", other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answers_from_the_queue_in_order() {
        let mock = MockRepo::<String>::new();
        mock.expect_count().return_ok(3);
        mock.expect_execute().return_ok(vec!["a".to_string()]);

        let query = mock.order_by(mock.base_query(), "title", SortDirection::Descending);
        assert_eq!(mock.count(query.clone()).await.unwrap(), 3);
        assert_eq!(mock.execute(query).await.unwrap(), ["a"]);

        mock.verify();
        assert!(matches!(mock.calls()[0], MockCall::Count(_)));
    }

    #[tokio::test]
    async fn injected_errors_surface() {
        let mock = MockRepo::<String>::new();
        mock.expect_execute()
            .return_err(CollaboratorError::Unavailable("db down".into()));

        let result = mock.execute(MockQuery::default()).await;
        assert!(matches!(result, Err(CollaboratorError::Unavailable(_))));
    }

    #[test]
    fn validate_accepts_unless_told_otherwise() {
        let mock = MockRepo::<String>::new();
        let attrs = FlatAttributes::new();
        assert!(mock.validate("x".into(), &attrs, Action::Create).is_valid());

        mock.expect_validate()
            .return_invalid(FieldErrors::single("title", "can't be blank"));
        assert!(!mock.validate("x".into(), &attrs, Action::Create).is_valid());
        mock.verify();
    }

    #[test]
    #[should_panic(expected = "Not all expectations were met")]
    fn verify_flags_leftovers() {
        let mock = MockRepo::<String>::new();
        mock.expect_count().return_ok(1);
        mock.verify();
    }
}
