//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{ControlLockError, RepositoryError};

/// 権限解決のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveAuthorityError {
    /// スナップショットの材料を読み出せなかった
    #[error("Failed to assemble authority snapshot: {0}")]
    Repository(#[from] RepositoryError),
}

/// 権限変更のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManageRightsError {
    /// 他の接続がコントロールロックを保持している
    #[error("Control lock is already held by '{0}'")]
    LockHeld(String),

    /// コントロールロックの保持者ではない
    #[error("Connection '{0}' does not hold the control lock")]
    NotLockHolder(String),

    /// 識別子が空
    #[error("Blank identifier for {0}")]
    BlankIdentifier(&'static str),

    /// 永続化層のエラー
    #[error("Repository error: {0}")]
    Repository(String),
}

impl From<RepositoryError> for ManageRightsError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::ControlLock(ControlLockError::Held(holder)) => Self::LockHeld(holder),
            RepositoryError::ControlLock(ControlLockError::NotHolder(id)) => Self::NotLockHolder(id),
            RepositoryError::BlankIdentifier(what) => Self::BlankIdentifier(what),
            other => Self::Repository(other.to_string()),
        }
    }
}
