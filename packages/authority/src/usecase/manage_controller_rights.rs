//! UseCase: 発表者・コントローラー権限・コントロールロックの変更
//!
//! 付与時刻は全て注入された Clock から取る。リゾルバはこの時刻で候補を順位付けする。

use std::collections::BTreeSet;
use std::sync::Arc;

use podium_shared::time::Clock;

use crate::domain::{ControlLock, SessionStateRepository};

use super::error::ManageRightsError;

/// 権限変更のユースケース
pub struct ManageControllerRightsUseCase {
    /// SessionStateRepository（発表者・権限・ロックの永続化）
    session_repository: Arc<dyn SessionStateRepository>,
    /// Clock（付与時刻の取得）
    clock: Arc<dyn Clock>,
}

impl ManageControllerRightsUseCase {
    /// 新しい ManageControllerRightsUseCase を作成
    pub fn new(session_repository: Arc<dyn SessionStateRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            session_repository,
            clock,
        }
    }

    /// 発表者を設定（`None` で解除）し、設定時刻を返す
    pub async fn set_presenter(
        &self,
        user_key: Option<String>,
        client_ids: BTreeSet<String>,
    ) -> Result<i64, ManageRightsError> {
        let at = self.clock.now_millis();
        self.session_repository
            .set_presenter(user_key.clone(), client_ids, at)
            .await?;
        tracing::info!(presenter = ?user_key, at, "presenter updated");
        Ok(at)
    }

    /// ユーザーにコントローラー権限を付与し、付与時刻を返す
    pub async fn grant_to_user(&self, user_key: &str) -> Result<i64, ManageRightsError> {
        let at = self.clock.now_millis();
        self.session_repository
            .grant_user_rights(user_key.to_string(), at)
            .await?;
        tracing::info!(user_key, at, "controller rights granted to user");
        Ok(at)
    }

    /// 接続にコントローラー権限を付与し、付与時刻を返す
    pub async fn grant_to_client(&self, connection_id: &str) -> Result<i64, ManageRightsError> {
        let at = self.clock.now_millis();
        self.session_repository
            .grant_client_rights(connection_id.to_string(), at)
            .await?;
        tracing::info!(connection_id, at, "controller rights granted to connection");
        Ok(at)
    }

    /// ユーザーの権限を取り消す（取り消した場合 true）
    pub async fn revoke_user(&self, user_key: &str) -> Result<bool, ManageRightsError> {
        let revoked = self.session_repository.revoke_user_rights(user_key).await?;
        if revoked {
            tracing::info!(user_key, "controller rights revoked from user");
        }
        Ok(revoked)
    }

    /// 接続の権限を取り消す（取り消した場合 true）
    pub async fn revoke_client(&self, connection_id: &str) -> Result<bool, ManageRightsError> {
        let revoked = self
            .session_repository
            .revoke_client_rights(connection_id)
            .await?;
        if revoked {
            tracing::info!(connection_id, "controller rights revoked from connection");
        }
        Ok(revoked)
    }

    /// コントロールロックを取得し、取得時刻を返す
    ///
    /// # Returns
    ///
    /// * `Ok(i64)` - 取得成功（保持者による再取得は時刻を更新する）
    /// * `Err(ManageRightsError::LockHeld)` - 他の接続が保持している
    pub async fn acquire_lock(
        &self,
        controller_id: &str,
        controller_name: Option<String>,
    ) -> Result<i64, ManageRightsError> {
        let at = self.clock.now_millis();
        let result = self
            .session_repository
            .acquire_lock(ControlLock {
                controller_id: controller_id.to_string(),
                controller_name,
                ts: Some(at),
            })
            .await;
        if let Err(e) = &result {
            tracing::warn!(controller_id, "control lock refused: {}", e);
        }
        result?;
        Ok(at)
    }

    /// コントロールロックを解放
    pub async fn release_lock(&self, controller_id: &str) -> Result<(), ManageRightsError> {
        self.session_repository.release_lock(controller_id).await?;
        tracing::info!(controller_id, "control lock released");
        Ok(())
    }
}
