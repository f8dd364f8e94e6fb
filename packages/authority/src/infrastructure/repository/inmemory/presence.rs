//! InMemory Presence Repository 実装
//!
//! ドメイン層が定義する PresenceRepository trait の具体的な実装。
//! Roster エンティティをそのままインメモリストアとして使用します。

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Connection, PresenceRepository, RepositoryError, Roster};

/// インメモリ Presence Repository 実装
pub struct InMemoryPresenceRepository {
    /// Roster ドメインモデル
    roster: Arc<Mutex<Roster>>,
}

impl InMemoryPresenceRepository {
    /// 新しい InMemoryPresenceRepository を作成
    pub fn new(roster: Arc<Mutex<Roster>>) -> Self {
        Self { roster }
    }
}

impl Default for InMemoryPresenceRepository {
    fn default() -> Self {
        Self::new(Arc::new(Mutex::new(Roster::new())))
    }
}

#[async_trait]
impl PresenceRepository for InMemoryPresenceRepository {
    async fn connected_clients(&self) -> Result<Vec<Connection>, RepositoryError> {
        let roster = self.roster.lock().await;
        Ok(roster.connections.clone())
    }

    async fn recent_broadcasts(&self) -> Result<BTreeMap<String, i64>, RepositoryError> {
        let roster = self.roster.lock().await;
        Ok(roster.last_broadcast_by_user_key.clone())
    }

    async fn add_connection(&self, mut connection: Connection) -> Result<(), RepositoryError> {
        let connection_id = connection.connection_id.trim();
        if connection_id.is_empty() {
            return Err(RepositoryError::BlankIdentifier("connection id"));
        }
        connection.connection_id = connection_id.to_string();
        let mut roster = self.roster.lock().await;
        roster.add_connection(connection);
        Ok(())
    }

    async fn remove_connection(&self, connection_id: &str) -> Result<(), RepositoryError> {
        let mut roster = self.roster.lock().await;
        roster.remove_connection(connection_id.trim());
        Ok(())
    }

    async fn record_broadcast(&self, user_key: &str, ts: i64) -> Result<(), RepositoryError> {
        let user_key = user_key.trim();
        if user_key.is_empty() {
            return Err(RepositoryError::BlankIdentifier("user key"));
        }
        let mut roster = self.roster.lock().await;
        roster.record_broadcast(user_key, ts);
        Ok(())
    }
}
