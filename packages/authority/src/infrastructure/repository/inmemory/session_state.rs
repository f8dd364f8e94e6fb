//! InMemory Session State Repository 実装
//!
//! ドメイン層が定義する SessionStateRepository trait の具体的な実装。

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ControlLock, RepositoryError, SessionState, SessionStateRepository};

/// インメモリ Session State Repository 実装
pub struct InMemorySessionStateRepository {
    /// SessionState ドメインモデル
    state: Arc<Mutex<SessionState>>,
}

impl InMemorySessionStateRepository {
    /// 新しい InMemorySessionStateRepository を作成
    pub fn new(state: Arc<Mutex<SessionState>>) -> Self {
        Self { state }
    }
}

impl Default for InMemorySessionStateRepository {
    fn default() -> Self {
        Self::new(Arc::new(Mutex::new(SessionState::new())))
    }
}

fn require_non_blank(value: &str, what: &'static str) -> Result<String, RepositoryError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(RepositoryError::BlankIdentifier(what));
    }
    Ok(value.to_string())
}

#[async_trait]
impl SessionStateRepository for InMemorySessionStateRepository {
    async fn session_state(&self) -> Result<SessionState, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.clone())
    }

    async fn set_presenter(
        &self,
        user_key: Option<String>,
        client_ids: BTreeSet<String>,
        at: i64,
    ) -> Result<(), RepositoryError> {
        let user_key = user_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        let mut state = self.state.lock().await;
        state.set_presenter(user_key, client_ids, at);
        Ok(())
    }

    async fn grant_user_rights(&self, user_key: String, at: i64) -> Result<(), RepositoryError> {
        let user_key = require_non_blank(&user_key, "user key")?;
        let mut state = self.state.lock().await;
        state.grant_user_rights(user_key, at);
        Ok(())
    }

    async fn grant_client_rights(
        &self,
        connection_id: String,
        at: i64,
    ) -> Result<(), RepositoryError> {
        let connection_id = require_non_blank(&connection_id, "connection id")?;
        let mut state = self.state.lock().await;
        state.grant_client_rights(connection_id, at);
        Ok(())
    }

    async fn revoke_user_rights(&self, user_key: &str) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        Ok(state.revoke_user_rights(user_key.trim()))
    }

    async fn revoke_client_rights(&self, connection_id: &str) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        Ok(state.revoke_client_rights(connection_id.trim()))
    }

    async fn acquire_lock(&self, lock: ControlLock) -> Result<(), RepositoryError> {
        let controller_id = require_non_blank(&lock.controller_id, "controller id")?;
        let lock = ControlLock {
            controller_id,
            ..lock
        };
        let mut state = self.state.lock().await;
        state.acquire_lock(lock)?;
        Ok(())
    }

    async fn release_lock(&self, controller_id: &str) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.release_lock(controller_id.trim())?;
        Ok(())
    }
}
