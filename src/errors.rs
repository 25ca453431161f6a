use thiserror::Error;

/// Ошибки управления жизненным циклом пула
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum PoolError {
    #[error("thread count must be positive")]
    InvalidThreadCount,
    #[error("failed to spawn worker thread: {0}")]
    SpawnFailed(String),
    #[error("pool is shut down")]
    ShutDown,
}

/// Описание сбоя задачи. Никогда не возвращается отправителю, только логируется воркером.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TaskError {
    #[error("panicked: {0}")]
    Panic(String),
    #[error("{0}")]
    Failed(String),
}

pub type TaskResult = Result<(), TaskError>;
