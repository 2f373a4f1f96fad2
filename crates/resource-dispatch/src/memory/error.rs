use crate::error::CollaboratorError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store actor closed")]
    ActorClosed,
    #[error("store actor dropped the reply")]
    ActorDropped,
    #[error("record {0} not found")]
    NotFound(u64),
    #[error("record has no id")]
    Unsaved,
    #[error("record could not be encoded: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl From<StoreError> for CollaboratorError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::ActorClosed | StoreError::ActorDropped => {
                CollaboratorError::Unavailable(error.to_string())
            }
            StoreError::NotFound(_) | StoreError::Unsaved => {
                CollaboratorError::Rejected(error.to_string())
            }
            StoreError::Encoding(e) => CollaboratorError::Serialization(e),
        }
    }
}
