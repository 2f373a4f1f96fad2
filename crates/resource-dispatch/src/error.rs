//! # Dispatch Errors
//!
//! Errors that escape the dispatcher. Absent records and failed validation are
//! *not* errors: they are outcomes handled locally by the matching renderer.
//! What remains is malformed input, collaborator failures and outcomes that make
//! no sense for the action that produced them.

use crate::action::{Action, Step};
use crate::response::Status;

/// Malformed request parameters or payload.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ParamError {
    #[error("page[number] and page[size] must be given together")]
    IncompletePage,
    #[error("invalid value for page[{key}]: {value:?}")]
    InvalidPage { key: &'static str, value: String },
    #[error("request body has no data object")]
    MissingData,
    #[error("data.attributes must be an object")]
    MalformedAttributes,
    #[error("malformed relationship {0:?}")]
    MalformedRelationship(String),
    #[error("{0} requires a record identifier")]
    MissingIdentifier(Action),
}

/// A Query, Persistence or Serialization capability failed.
///
/// The dispatcher never catches or retries these; they propagate to the hosting
/// transport's generic failure handling.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("collaborator rejected the request: {0}")]
    Rejected(String),
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("collaborator error: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Errors returned from [`Dispatcher::dispatch`](crate::Dispatcher::dispatch).
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("bad request: {0}")]
    Params(#[from] ParamError),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error("{step} produced an outcome {action} cannot handle")]
    UnexpectedOutcome { action: Action, step: Step },
}

impl DispatchError {
    /// Suggested status for the hosting transport.
    pub fn status(&self) -> Status {
        match self {
            DispatchError::Params(_) => Status::BAD_REQUEST,
            DispatchError::Collaborator(_) | DispatchError::UnexpectedOutcome { .. } => {
                Status::INTERNAL_SERVER_ERROR
            }
        }
    }
}
