//! Repository trait 定義
//!
//! スナップショットの材料を提供する外部コラボレーターへのインターフェース。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;

use super::{Connection, ControlLock, RepositoryError, SessionState};

/// Presence Repository trait
///
/// リアルタイム通信層が把握している接続一覧と、直近のブロードキャスト時刻へのインターフェース。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PresenceRepository: Send + Sync {
    /// 接続中のクライアント一覧を取得
    async fn connected_clients(&self) -> Result<Vec<Connection>, RepositoryError>;

    /// ユーザーキーごとの最終ブロードキャスト時刻を取得
    async fn recent_broadcasts(&self) -> Result<BTreeMap<String, i64>, RepositoryError>;

    /// 接続を追加（同じ接続 ID は置き換え）
    async fn add_connection(&self, connection: Connection) -> Result<(), RepositoryError>;

    /// 接続を削除
    async fn remove_connection(&self, connection_id: &str) -> Result<(), RepositoryError>;

    /// ブロードキャストを記録
    async fn record_broadcast(&self, user_key: &str, ts: i64) -> Result<(), RepositoryError>;
}

/// Session State Repository trait
///
/// 発表者・コントローラー権限・コントロールロックの永続化層へのインターフェース。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStateRepository: Send + Sync {
    /// セッション状態を取得
    async fn session_state(&self) -> Result<SessionState, RepositoryError>;

    /// 発表者を設定（`None` で解除）
    async fn set_presenter(
        &self,
        user_key: Option<String>,
        client_ids: BTreeSet<String>,
        at: i64,
    ) -> Result<(), RepositoryError>;

    /// ユーザーにコントローラー権限を付与
    async fn grant_user_rights(&self, user_key: String, at: i64) -> Result<(), RepositoryError>;

    /// 接続にコントローラー権限を付与
    async fn grant_client_rights(
        &self,
        connection_id: String,
        at: i64,
    ) -> Result<(), RepositoryError>;

    /// ユーザーのコントローラー権限を取り消し（取り消した場合 true）
    async fn revoke_user_rights(&self, user_key: &str) -> Result<bool, RepositoryError>;

    /// 接続のコントローラー権限を取り消し（取り消した場合 true）
    async fn revoke_client_rights(&self, connection_id: &str) -> Result<bool, RepositoryError>;

    /// コントロールロックを取得
    async fn acquire_lock(&self, lock: ControlLock) -> Result<(), RepositoryError>;

    /// コントロールロックを解放
    async fn release_lock(&self, controller_id: &str) -> Result<(), RepositoryError>;
}
