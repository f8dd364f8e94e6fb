//! Domain errors.

use thiserror::Error;

/// Control lock state transitions that were refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlLockError {
    /// Another connection already holds the lock
    #[error("Control lock is already held by '{0}'")]
    Held(String),

    /// The lock is not held by the connection trying to release it
    #[error("Control lock is not held by '{0}'")]
    NotHolder(String),
}

/// Repository errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    ControlLock(#[from] ControlLockError),

    /// Identifier was blank after trimming
    #[error("Blank identifier for {0}")]
    BlankIdentifier(&'static str),

    /// Backing store could not be reached
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
