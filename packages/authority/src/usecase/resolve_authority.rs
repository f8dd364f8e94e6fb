//! UseCase: 発表者権限の解決
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ResolveAuthorityUseCase::execute() メソッド
//! - リポジトリから読み出した状態がスナップショットに正しく写されること
//!
//! ### なぜこのテストが必要か
//! - リゾルバは与えられたスナップショットしか見ないため、組み立ての誤りは検出できない
//! - 現在時刻は 1 回だけ読み、同じ値を全ての比較に使う必要がある
//!
//! ### どのような状況を想定しているか
//! - 正常系：発表者・許可リスト・ブロードキャストを含む状態の解決
//! - 異常系：リポジトリの読み出し失敗

use std::collections::BTreeSet;
use std::sync::Arc;

use podium_shared::time::Clock;

use crate::domain::{
    AuthoritySnapshot, PresenceRepository, ResolutionResult, SessionStateRepository,
    evaluate_switching_authorities,
};

use super::error::ResolveAuthorityError;

/// 呼び出し元（自分自身）の情報
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveAuthorityRequest {
    pub self_user_key: String,
    pub self_client_id: Option<String>,
    pub self_display_name: Option<String>,
    pub self_can_write: bool,
    /// 無視する接続（自分の別タブや既知のゴースト接続）
    pub excluded_client_ids: BTreeSet<String>,
    pub broadcast_signal_window_ms: Option<i64>,
}

/// 発表者権限解決のユースケース
pub struct ResolveAuthorityUseCase {
    /// PresenceRepository（接続一覧とブロードキャスト履歴）
    presence_repository: Arc<dyn PresenceRepository>,
    /// SessionStateRepository（発表者・権限・ロックの永続化）
    session_repository: Arc<dyn SessionStateRepository>,
    /// Clock（現在時刻の取得）
    clock: Arc<dyn Clock>,
}

impl ResolveAuthorityUseCase {
    /// 新しい ResolveAuthorityUseCase を作成
    pub fn new(
        presence_repository: Arc<dyn PresenceRepository>,
        session_repository: Arc<dyn SessionStateRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            presence_repository,
            session_repository,
            clock,
        }
    }

    /// スナップショットを組み立てる
    ///
    /// 現在時刻はここで 1 回だけ読み、`now_ts` に固定する。
    pub async fn snapshot(
        &self,
        request: ResolveAuthorityRequest,
    ) -> Result<AuthoritySnapshot, ResolveAuthorityError> {
        let now = self.clock.now_millis();
        let connected_clients = self.presence_repository.connected_clients().await?;
        let recent_broadcasts = self.presence_repository.recent_broadcasts().await?;
        let state = self.session_repository.session_state().await?;

        Ok(AuthoritySnapshot {
            connected_clients,
            excluded_client_ids: request.excluded_client_ids,
            active_presenter_user_key: state.active_presenter_user_key,
            active_presenter_client_ids: state.active_presenter_client_ids,
            controller_rights_user_allowlist: state.controller_rights_user_allowlist,
            controller_rights_client_allowlist: state.controller_rights_client_allowlist,
            rights_granted_at_by_user_key: state.rights_granted_at_by_user_key,
            recent_broadcast_ts_by_user_key: recent_broadcasts,
            last_presenter_set_ts: state.last_presenter_set_ts,
            last_controller_rights_ts: state.last_controller_rights_ts,
            control_lock: state.control_lock,
            self_can_write: request.self_can_write,
            self_user_key: request.self_user_key,
            self_client_id: request.self_client_id,
            self_display_name: request.self_display_name,
            now_ts: Some(now),
            broadcast_signal_window_ms: request.broadcast_signal_window_ms,
        })
    }

    /// 発表者権限の解決を実行
    ///
    /// # Returns
    ///
    /// * `Ok(ResolutionResult)` - 解決結果（曖昧な場合も `Ok`）
    /// * `Err(ResolveAuthorityError)` - スナップショットを組み立てられなかった
    pub async fn execute(
        &self,
        request: ResolveAuthorityRequest,
    ) -> Result<ResolutionResult, ResolveAuthorityError> {
        let snapshot = self.snapshot(request).await?;
        let result = evaluate_switching_authorities(&snapshot);

        match (&result.canonical_candidate, result.unresolved_reason) {
            (Some(canonical), _) => tracing::info!(
                user_key = %canonical.user_key,
                grant_ts = canonical.grant_ts,
                "canonical presenter resolved"
            ),
            (None, Some(reason)) => tracing::warn!(
                candidates = ?result.active_user_keys,
                "presenter authority unresolved: {}",
                reason
            ),
            (None, None) => tracing::debug!(
                candidates = result.active_candidates.len(),
                "no presenter conflict"
            ),
        }

        Ok(result)
    }
}
