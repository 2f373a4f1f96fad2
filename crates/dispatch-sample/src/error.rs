use resource_dispatch::DispatchError;

#[derive(Debug, thiserror::Error)]
pub enum BlogError {
    #[error("configuration error: {0}")]
    Settings(#[from] config::ConfigError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("store task failed: {0}")]
    Shutdown(#[from] tokio::task::JoinError),
}
