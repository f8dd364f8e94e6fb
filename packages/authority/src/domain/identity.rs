//! Identity resolution over the live connection roster.
//!
//! Maps a connection to the person behind it and a person back to all of their
//! connections. Every function here is pure: the same roster and exclusion list
//! always produce the same answer.

use std::collections::BTreeSet;

use super::value_object::{BROADCAST_SENTINEL_CONNECTION_ID, Connection, Identity};

/// Clean up a raw display name.
///
/// Trims, collapses whitespace runs to a single space and drops control
/// characters. Returns an empty string when nothing usable is left.
pub fn normalize_display_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| word.chars().filter(|c| !c.is_control()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derive a person's identity from an account id and a display name.
///
/// Name-based identities are lowercased so that "Alice" and "alice" merge.
pub fn user_identity(user_id: Option<&str>, name: &str) -> Option<Identity> {
    if let Some(id) = user_id.map(str::trim).filter(|id| !id.is_empty()) {
        return Some(Identity::ByUserId(id.to_string()));
    }
    let normalized = normalize_display_name(name);
    if normalized.is_empty() {
        return None;
    }
    Some(Identity::ByName(normalized.to_lowercase()))
}

/// String form of [`user_identity`].
pub fn user_key_for(user_id: Option<&str>, name: &str) -> Option<String> {
    user_identity(user_id, name).map(|identity| identity.key())
}

/// Bring an identity key from outside the roster into the form the roster produces.
///
/// Name keys are normalized and lowercased like [`user_identity`] does, so
/// "name:Alice " and "name:alice" land on the same person. Other keys are only
/// trimmed.
pub fn canonical_user_key(user_key: &str) -> String {
    let user_key = user_key.trim();
    match Identity::parse(user_key) {
        Some(Identity::ByName(name)) => {
            let normalized = normalize_display_name(&name);
            if normalized.is_empty() {
                user_key.to_string()
            } else {
                Identity::ByName(normalized.to_lowercase()).key()
            }
        }
        Some(Identity::ByUserId(id)) => Identity::ByUserId(id.trim().to_string()).key(),
        Some(Identity::ByConnection(id)) => Identity::ByConnection(id.trim().to_string()).key(),
        None => user_key.to_string(),
    }
}

/// Identity of a connection, falling back to the connection itself when it carries no identity data.
pub fn connection_identity(connection: &Connection) -> Identity {
    user_identity(
        connection.user_id.as_deref(),
        connection.display_name.as_deref().unwrap_or_default(),
    )
    .unwrap_or_else(|| Identity::ByConnection(connection.connection_id.clone()))
}

/// The person behind one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUser {
    pub user_key: String,
    pub name: String,
    pub connection_id: String,
    pub user_id: Option<String>,
}

/// Everything the roster knows about one identity key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub name: String,
    pub connection_ids: Vec<String>,
}

/// Lookups over a roster with the excluded connections already removed.
#[derive(Debug)]
pub struct IdentityResolver<'a> {
    roster: Vec<&'a Connection>,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(connected_clients: &'a [Connection], excluded_client_ids: &BTreeSet<String>) -> Self {
        let roster = connected_clients
            .iter()
            .filter(|c| !excluded_client_ids.contains(c.connection_id.trim()))
            .collect();
        Self { roster }
    }

    /// Resolve the user behind `connection_id`.
    ///
    /// Returns `None` for a blank id or one that is not on the roster.
    pub fn resolve_user_for_connection(&self, connection_id: &str) -> Option<ResolvedUser> {
        let connection_id = connection_id.trim();
        if connection_id.is_empty() {
            return None;
        }
        let connection = self
            .roster
            .iter()
            .find(|c| c.connection_id == connection_id)?;
        Some(Self::describe(connection))
    }

    /// Find every live connection whose identity key equals `user_key`.
    ///
    /// The broadcast sentinel id is never reported. When nothing matches, the
    /// name is derived from the key itself.
    pub fn resolve_identity_for_user_key(&self, user_key: &str) -> ResolvedIdentity {
        let user_key = canonical_user_key(user_key);
        let matches: Vec<ResolvedUser> = self
            .roster
            .iter()
            .filter(|c| c.connection_id != BROADCAST_SENTINEL_CONNECTION_ID)
            .map(|c| Self::describe(c))
            .filter(|user| user.user_key == user_key)
            .collect();

        let name = matches
            .first()
            .map(|user| user.name.clone())
            .unwrap_or_else(|| Identity::display_fallback(&user_key));

        ResolvedIdentity {
            name,
            connection_ids: matches.into_iter().map(|user| user.connection_id).collect(),
        }
    }

    fn describe(connection: &Connection) -> ResolvedUser {
        let name = normalize_display_name(connection.display_name.as_deref().unwrap_or_default());
        ResolvedUser {
            user_key: connection_identity(connection).key(),
            name: if name.is_empty() {
                connection.connection_id.clone()
            } else {
                name
            },
            connection_id: connection.connection_id.clone(),
            user_id: connection
                .user_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<Connection> {
        vec![
            Connection::new("tab-1")
                .with_display_name("  Ms.   Tanaka ")
                .with_user_id("t1"),
            Connection::new("tab-2").with_display_name("Ms. Tanaka").with_user_id("t1"),
            Connection::new("guest-1").with_display_name("Bob"),
            Connection::new("guest-2").with_display_name("bob"),
            Connection::new("anon-1").with_admin(true),
            Connection::new(BROADCAST_SENTINEL_CONNECTION_ID).with_user_id("t1"),
        ]
    }

    #[test]
    fn test_normalize_display_name_collapses_whitespace() {
        // テスト項目: 表示名の前後空白が除去され、連続空白が 1 つにまとめられる
        // given (前提条件):
        let raw = "  Ms.\t  Tanaka \n";

        // when (操作):
        let result = normalize_display_name(raw);

        // then (期待する結果):
        assert_eq!(result, "Ms. Tanaka");
    }

    #[test]
    fn test_normalize_display_name_returns_empty_for_unusable_input() {
        // テスト項目: 空白や制御文字だけの表示名は空文字列になる
        // given (前提条件):
        let raw = " \u{0007} \u{0000} ";

        // when (操作):
        let result = normalize_display_name(raw);

        // then (期待する結果):
        assert_eq!(result, "");
    }

    #[test]
    fn test_user_key_prefers_user_id_over_name() {
        // テスト項目: ユーザー ID があれば名前より優先される
        // given (前提条件):
        let user_id = Some("abc");

        // when (操作):
        let key = user_key_for(user_id, "Alice");

        // then (期待する結果):
        assert_eq!(key.as_deref(), Some("uid:abc"));
    }

    #[test]
    fn test_user_key_falls_back_to_lowercased_name() {
        // テスト項目: ユーザー ID が空なら正規化・小文字化した名前のキーになる
        // given (前提条件):
        let user_id = Some("   ");

        // when (操作):
        let key = user_key_for(user_id, " Alice  Smith ");

        // then (期待する結果):
        assert_eq!(key.as_deref(), Some("name:alice smith"));
    }

    #[test]
    fn test_user_key_is_none_without_identity_data() {
        // テスト項目: ID も名前も無い場合はキーを作らない
        // given (前提条件):
        let user_id = None;

        // when (操作):
        let key = user_key_for(user_id, "   ");

        // then (期待する結果):
        assert_eq!(key, None);
    }

    #[test]
    fn test_resolve_user_for_connection_with_user_id() {
        // テスト項目: 接続 ID から安定したユーザーキーと表示名が得られる
        // given (前提条件):
        let clients = roster();
        let resolver = IdentityResolver::new(&clients, &BTreeSet::new());

        // when (操作):
        let user = resolver.resolve_user_for_connection("tab-1").unwrap();

        // then (期待する結果):
        assert_eq!(user.user_key, "uid:t1");
        assert_eq!(user.name, "Ms. Tanaka");
        assert_eq!(user.connection_id, "tab-1");
        assert_eq!(user.user_id.as_deref(), Some("t1"));
    }

    #[test]
    fn test_resolve_user_for_anonymous_connection_uses_connection_key() {
        // テスト項目: 識別情報の無い接続は client: キーになり、名前は接続 ID になる
        // given (前提条件):
        let clients = roster();
        let resolver = IdentityResolver::new(&clients, &BTreeSet::new());

        // when (操作):
        let user = resolver.resolve_user_for_connection("anon-1").unwrap();

        // then (期待する結果):
        assert_eq!(user.user_key, "client:anon-1");
        assert_eq!(user.name, "anon-1");
        assert_eq!(user.user_id, None);
    }

    #[test]
    fn test_resolve_user_for_blank_or_unknown_connection() {
        // テスト項目: 空の接続 ID や存在しない接続 ID は None になる
        // given (前提条件):
        let clients = roster();
        let resolver = IdentityResolver::new(&clients, &BTreeSet::new());

        // when (操作):
        let blank = resolver.resolve_user_for_connection("  ");
        let unknown = resolver.resolve_user_for_connection("tab-99");

        // then (期待する結果):
        assert_eq!(blank, None);
        assert_eq!(unknown, None);
    }

    #[test]
    fn test_excluded_connections_are_invisible() {
        // テスト項目: 除外リストの接続は解決対象にならない
        // given (前提条件):
        let clients = roster();
        let excluded = BTreeSet::from(["tab-2".to_string()]);
        let resolver = IdentityResolver::new(&clients, &excluded);

        // when (操作):
        let user = resolver.resolve_user_for_connection("tab-2");
        let identity = resolver.resolve_identity_for_user_key("uid:t1");

        // then (期待する結果):
        assert_eq!(user, None);
        assert_eq!(identity.connection_ids, vec!["tab-1".to_string()]);
    }

    #[test]
    fn test_resolve_identity_collects_all_tabs_and_skips_sentinel() {
        // テスト項目: 同一人物の全接続が集められ、ブロードキャスト用の "all" は含まれない
        // given (前提条件):
        let clients = roster();
        let resolver = IdentityResolver::new(&clients, &BTreeSet::new());

        // when (操作):
        let identity = resolver.resolve_identity_for_user_key("uid:t1");

        // then (期待する結果):
        assert_eq!(identity.name, "Ms. Tanaka");
        assert_eq!(
            identity.connection_ids,
            vec!["tab-1".to_string(), "tab-2".to_string()]
        );
    }

    #[test]
    fn test_resolve_identity_merges_name_case_variants() {
        // テスト項目: 大文字小文字だけが違う名前の接続は同一人物として扱われる
        // given (前提条件):
        let clients = roster();
        let resolver = IdentityResolver::new(&clients, &BTreeSet::new());

        // when (操作):
        let identity = resolver.resolve_identity_for_user_key("name:bob");

        // then (期待する結果):
        assert_eq!(identity.name, "Bob");
        assert_eq!(
            identity.connection_ids,
            vec!["guest-1".to_string(), "guest-2".to_string()]
        );
    }

    #[test]
    fn test_resolve_identity_without_connection_uses_key_fallback() {
        // テスト項目: 接続の無いキーはプレフィックスを除いた名前を返す
        // given (前提条件):
        let clients = roster();
        let resolver = IdentityResolver::new(&clients, &BTreeSet::new());

        // when (操作):
        let identity = resolver.resolve_identity_for_user_key("uid:ghost");

        // then (期待する結果):
        assert_eq!(identity.name, "ghost");
        assert!(identity.connection_ids.is_empty());
    }

    #[test]
    fn test_canonical_user_key_lowercases_name_keys_only() {
        // テスト項目: name キーは正規化・小文字化され、uid / client キーは前後空白のみ除去される
        // given (前提条件):
        let keys = [" name:  Ms.   Tanaka ", "uid: T1 ", "client:Tab-1", " plain "];

        // when (操作):
        let result: Vec<String> = keys.iter().map(|key| canonical_user_key(key)).collect();

        // then (期待する結果):
        assert_eq!(result, vec!["name:ms. tanaka", "uid:T1", "client:Tab-1", "plain"]);
    }

    #[test]
    fn test_resolve_identity_matches_mixed_case_name_key() {
        // テスト項目: 大文字を含む name キーでも名前由来の接続が見つかる
        // given (前提条件):
        let clients = roster();
        let resolver = IdentityResolver::new(&clients, &BTreeSet::new());

        // when (操作):
        let identity = resolver.resolve_identity_for_user_key("name:BOB");

        // then (期待する結果):
        assert_eq!(identity.name, "Bob");
        assert_eq!(
            identity.connection_ids,
            vec!["guest-1".to_string(), "guest-2".to_string()]
        );
    }
}
