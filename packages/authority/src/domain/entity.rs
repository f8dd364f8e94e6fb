//! Mutable session entities that the repositories store.
//!
//! The resolver never sees these directly; use cases copy them into an
//! [`AuthoritySnapshot`](super::AuthoritySnapshot) at one point in time.

use std::collections::{BTreeMap, BTreeSet};

use super::error::ControlLockError;
use super::identity::{canonical_user_key, connection_identity};
use super::value_object::{Connection, ControlLock};

/// Live presence roster plus the last broadcast seen from each identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    pub connections: Vec<Connection>,
    pub last_broadcast_by_user_key: BTreeMap<String, i64>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection, replacing an existing one with the same id.
    pub fn add_connection(&mut self, connection: Connection) {
        match self
            .connections
            .iter()
            .position(|c| c.connection_id == connection.connection_id)
        {
            Some(position) => self.connections[position] = connection,
            None => self.connections.push(connection),
        }
    }

    /// Remove a connection. Returns `false` if it was not connected.
    ///
    /// When the identity's last connection leaves, its broadcast entry goes too.
    pub fn remove_connection(&mut self, connection_id: &str) -> bool {
        let Some(position) = self
            .connections
            .iter()
            .position(|c| c.connection_id == connection_id)
        else {
            return false;
        };
        let departed = connection_identity(&self.connections.remove(position)).key();

        if !self
            .connections
            .iter()
            .any(|c| connection_identity(c).key() == departed)
        {
            self.last_broadcast_by_user_key.remove(&departed);
        }
        true
    }

    /// Record broadcast activity, keeping the latest timestamp per identity.
    pub fn record_broadcast(&mut self, user_key: &str, ts: i64) {
        let entry = self
            .last_broadcast_by_user_key
            .entry(canonical_user_key(user_key))
            .or_insert(ts);
        *entry = (*entry).max(ts);
    }
}

/// Persisted authority state of one collaborative session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub active_presenter_user_key: Option<String>,
    pub active_presenter_client_ids: BTreeSet<String>,
    pub controller_rights_user_allowlist: BTreeSet<String>,
    pub controller_rights_client_allowlist: BTreeSet<String>,
    pub rights_granted_at_by_user_key: BTreeMap<String, i64>,
    pub last_presenter_set_ts: Option<i64>,
    pub last_controller_rights_ts: Option<i64>,
    pub control_lock: Option<ControlLock>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand the presenter role to `user_key` (or clear it with `None`).
    pub fn set_presenter(
        &mut self,
        user_key: Option<String>,
        client_ids: BTreeSet<String>,
        at: i64,
    ) {
        if let Some(key) = &user_key {
            self.rights_granted_at_by_user_key.insert(key.clone(), at);
        }
        self.active_presenter_user_key = user_key;
        self.active_presenter_client_ids = client_ids;
        self.last_presenter_set_ts = Some(at);
    }

    pub fn grant_user_rights(&mut self, user_key: String, at: i64) {
        self.rights_granted_at_by_user_key.insert(user_key.clone(), at);
        self.controller_rights_user_allowlist.insert(user_key);
        self.last_controller_rights_ts = Some(at);
    }

    pub fn grant_client_rights(&mut self, connection_id: String, at: i64) {
        self.controller_rights_client_allowlist.insert(connection_id);
        self.last_controller_rights_ts = Some(at);
    }

    /// Revoke user-level rights. The grant time survives while the user is still presenter.
    pub fn revoke_user_rights(&mut self, user_key: &str) -> bool {
        let removed = self.controller_rights_user_allowlist.remove(user_key);
        if removed && self.active_presenter_user_key.as_deref() != Some(user_key) {
            self.rights_granted_at_by_user_key.remove(user_key);
        }
        removed
    }

    pub fn revoke_client_rights(&mut self, connection_id: &str) -> bool {
        self.controller_rights_client_allowlist.remove(connection_id)
    }

    /// Take the control lock. Re-acquiring by the current holder refreshes it.
    pub fn acquire_lock(&mut self, lock: ControlLock) -> Result<(), ControlLockError> {
        if let Some(current) = &self.control_lock
            && current.controller_id != lock.controller_id
        {
            return Err(ControlLockError::Held(current.controller_id.clone()));
        }
        self.control_lock = Some(lock);
        Ok(())
    }

    /// Release the control lock held by `controller_id`. Releasing a free lock is a no-op.
    pub fn release_lock(&mut self, controller_id: &str) -> Result<(), ControlLockError> {
        if let Some(current) = &self.control_lock
            && current.controller_id != controller_id
        {
            return Err(ControlLockError::NotHolder(controller_id.to_string()));
        }
        self.control_lock = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock(controller_id: &str, ts: i64) -> ControlLock {
        ControlLock {
            controller_id: controller_id.to_string(),
            controller_name: None,
            ts: Some(ts),
        }
    }

    #[test]
    fn test_roster_add_connection_replaces_same_id() {
        // テスト項目: 同じ接続 ID の追加は既存の接続を置き換える
        // given (前提条件):
        let mut roster = Roster::new();
        roster.add_connection(Connection::new("tab-1"));

        // when (操作):
        roster.add_connection(Connection::new("tab-1").with_display_name("Alice"));

        // then (期待する結果):
        assert_eq!(roster.connections.len(), 1);
        assert_eq!(roster.connections[0].display_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_roster_remove_connection() {
        // テスト項目: 接続を削除でき、存在しない接続の削除は false を返す
        // given (前提条件):
        let mut roster = Roster::new();
        roster.add_connection(Connection::new("tab-1"));

        // when (操作):
        let removed = roster.remove_connection("tab-1");
        let removed_again = roster.remove_connection("tab-1");

        // then (期待する結果):
        assert!(removed);
        assert!(!removed_again);
        assert!(roster.connections.is_empty());
    }

    #[test]
    fn test_roster_forgets_broadcast_when_last_connection_leaves() {
        // テスト項目: 同一人物の最後の接続が切れた時点でブロードキャスト記録が消える
        // given (前提条件):
        let mut roster = Roster::new();
        roster.add_connection(Connection::new("tab-1").with_display_name("Alice"));
        roster.add_connection(Connection::new("tab-2").with_display_name("alice"));
        roster.add_connection(Connection::new("tab-3").with_user_id("b"));
        roster.record_broadcast("name:Alice", 700);
        roster.record_broadcast("uid:b", 800);

        // when (操作):
        roster.remove_connection("tab-1");
        let after_first_tab = roster.last_broadcast_by_user_key.clone();
        roster.remove_connection("tab-2");

        // then (期待する結果):
        assert_eq!(after_first_tab.get("name:alice"), Some(&700));
        assert_eq!(
            roster.last_broadcast_by_user_key,
            BTreeMap::from([("uid:b".to_string(), 800)])
        );
    }

    #[test]
    fn test_roster_record_broadcast_keeps_latest() {
        // テスト項目: ブロードキャスト時刻は最新の値が保持される
        // given (前提条件):
        let mut roster = Roster::new();
        roster.record_broadcast("uid:a", 500);

        // when (操作):
        roster.record_broadcast("uid:a", 300);
        roster.record_broadcast("uid:a", 900);

        // then (期待する結果):
        assert_eq!(roster.last_broadcast_by_user_key.get("uid:a"), Some(&900));
    }

    #[test]
    fn test_set_presenter_stamps_grant_time() {
        // テスト項目: 発表者の設定で付与時刻と発表者設定時刻が記録される
        // given (前提条件):
        let mut state = SessionState::new();

        // when (操作):
        state.set_presenter(
            Some("uid:p".to_string()),
            BTreeSet::from(["tab-1".to_string()]),
            1000,
        );

        // then (期待する結果):
        assert_eq!(state.active_presenter_user_key.as_deref(), Some("uid:p"));
        assert_eq!(state.rights_granted_at_by_user_key.get("uid:p"), Some(&1000));
        assert_eq!(state.last_presenter_set_ts, Some(1000));
        assert!(state.active_presenter_client_ids.contains("tab-1"));
    }

    #[test]
    fn test_revoke_user_rights_keeps_presenter_grant() {
        // テスト項目: 発表者の権限を取り消しても発表者としての付与時刻は残る
        // given (前提条件):
        let mut state = SessionState::new();
        state.set_presenter(Some("uid:p".to_string()), BTreeSet::new(), 1000);
        state.grant_user_rights("uid:p".to_string(), 2000);
        state.grant_user_rights("uid:q".to_string(), 3000);

        // when (操作):
        let revoked_p = state.revoke_user_rights("uid:p");
        let revoked_q = state.revoke_user_rights("uid:q");

        // then (期待する結果):
        assert!(revoked_p);
        assert!(revoked_q);
        assert_eq!(state.rights_granted_at_by_user_key.get("uid:p"), Some(&2000));
        assert_eq!(state.rights_granted_at_by_user_key.get("uid:q"), None);
        assert!(state.controller_rights_user_allowlist.is_empty());
    }

    #[test]
    fn test_acquire_lock_held_by_other_fails() {
        // テスト項目: 他の接続がロックを保持している場合は取得できない
        // given (前提条件):
        let mut state = SessionState::new();
        state.acquire_lock(lock("conn-1", 100)).unwrap();

        // when (操作):
        let result = state.acquire_lock(lock("conn-2", 200));

        // then (期待する結果):
        assert_eq!(result, Err(ControlLockError::Held("conn-1".to_string())));
        assert_eq!(state.control_lock, Some(lock("conn-1", 100)));
    }

    #[test]
    fn test_acquire_lock_by_holder_refreshes() {
        // テスト項目: 保持者による再取得はロックを更新する
        // given (前提条件):
        let mut state = SessionState::new();
        state.acquire_lock(lock("conn-1", 100)).unwrap();

        // when (操作):
        let result = state.acquire_lock(lock("conn-1", 200));

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(state.control_lock, Some(lock("conn-1", 200)));
    }

    #[test]
    fn test_release_lock_only_by_holder() {
        // テスト項目: ロックは保持者だけが解放できる
        // given (前提条件):
        let mut state = SessionState::new();
        state.acquire_lock(lock("conn-1", 100)).unwrap();

        // when (操作):
        let by_other = state.release_lock("conn-2");
        let by_holder = state.release_lock("conn-1");

        // then (期待する結果):
        assert_eq!(by_other, Err(ControlLockError::NotHolder("conn-2".to_string())));
        assert!(by_holder.is_ok());
        assert_eq!(state.control_lock, None);
    }
}
