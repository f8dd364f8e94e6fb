//! Value objects shared across the authority domain.

use std::fmt;

/// Sentinel connection id used by broadcasts that target nobody in particular.
pub const BROADCAST_SENTINEL_CONNECTION_ID: &str = "all";

const USER_ID_PREFIX: &str = "uid:";
const NAME_PREFIX: &str = "name:";
const CONNECTION_PREFIX: &str = "client:";

/// A person's identity across connections.
///
/// The variant order is also the preference order: a stable account id beats a
/// normalized display name, which beats a bare connection id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    ByUserId(String),
    ByName(String),
    ByConnection(String),
}

impl Identity {
    /// String key used as the identity's map key and on the wire (`uid:`, `name:`, `client:`).
    pub fn key(&self) -> String {
        match self {
            Identity::ByUserId(id) => format!("{USER_ID_PREFIX}{id}"),
            Identity::ByName(name) => format!("{NAME_PREFIX}{name}"),
            Identity::ByConnection(id) => format!("{CONNECTION_PREFIX}{id}"),
        }
    }

    /// Parse a prefixed key back into an identity. Unprefixed keys yield `None`.
    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim();
        if let Some(rest) = key.strip_prefix(USER_ID_PREFIX) {
            Some(Identity::ByUserId(rest.to_string()))
        } else if let Some(rest) = key.strip_prefix(NAME_PREFIX) {
            Some(Identity::ByName(rest.to_string()))
        } else {
            key.strip_prefix(CONNECTION_PREFIX)
                .map(|rest| Identity::ByConnection(rest.to_string()))
        }
    }

    /// Human-readable fallback derived from a key when no live connection carries a name.
    pub fn display_fallback(key: &str) -> String {
        match Identity::parse(key) {
            Some(Identity::ByUserId(v) | Identity::ByName(v) | Identity::ByConnection(v)) => {
                v.trim().to_string()
            }
            None => key.trim().to_string(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// One live transport-level connection as reported by the presence roster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connection {
    pub connection_id: String,
    pub display_name: Option<String>,
    pub user_id: Option<String>,
    pub is_admin: bool,
}

impl Connection {
    /// Create an anonymous connection with just an id.
    pub fn new(connection_id: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            ..Self::default()
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }
}

/// A pessimistic single-owner claim on write access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlLock {
    pub controller_id: String,
    pub controller_name: Option<String>,
    pub ts: Option<i64>,
}
