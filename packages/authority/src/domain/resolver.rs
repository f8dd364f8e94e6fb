//! Presenter authority resolution.
//!
//! Turns one snapshot of authority signals (presenter state, controller-rights
//! allowlists, the control lock, recent broadcasts and the caller's own write
//! permission) into the set of identities that currently look like editors,
//! plus a single canonical editor when the grant timestamps single one out.
//!
//! The computation is pure. It reads no clock when `now_ts` is supplied, keeps
//! no state between calls and never fails: ambiguity is reported as data through
//! [`UnresolvedReason`].

use std::collections::{BTreeMap, BTreeSet};

use podium_shared::time::{Clock, SystemClock};
use thiserror::Error;

use super::candidate::{AuthorityCandidate, CandidateSet, Evidence, EvidenceReason};
use super::identity::{IdentityResolver, canonical_user_key, normalize_display_name};
use super::value_object::{Connection, ControlLock, Identity};

/// Freshness window applied when the snapshot does not name one.
pub const DEFAULT_BROADCAST_SIGNAL_WINDOW_MS: i64 = 12_000;
/// Smallest window a snapshot may request.
pub const MIN_BROADCAST_SIGNAL_WINDOW_MS: i64 = 2_000;

/// Everything the resolver needs, captured by the caller at one point in time.
///
/// Timestamps are epoch milliseconds. Non-positive timestamps count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthoritySnapshot {
    pub connected_clients: Vec<Connection>,
    pub excluded_client_ids: BTreeSet<String>,
    pub active_presenter_user_key: Option<String>,
    pub active_presenter_client_ids: BTreeSet<String>,
    pub controller_rights_user_allowlist: BTreeSet<String>,
    pub controller_rights_client_allowlist: BTreeSet<String>,
    pub rights_granted_at_by_user_key: BTreeMap<String, i64>,
    pub recent_broadcast_ts_by_user_key: BTreeMap<String, i64>,
    pub last_presenter_set_ts: Option<i64>,
    pub last_controller_rights_ts: Option<i64>,
    pub control_lock: Option<ControlLock>,
    pub self_can_write: bool,
    pub self_user_key: String,
    pub self_client_id: Option<String>,
    pub self_display_name: Option<String>,
    pub now_ts: Option<i64>,
    pub broadcast_signal_window_ms: Option<i64>,
}

/// Why no canonical editor could be chosen among several candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UnresolvedReason {
    #[error("No grant timestamps were available for conflicting editors.")]
    NoGrantTimestamps,
    #[error("Conflicting editors share the same grant timestamp.")]
    TiedGrantTimestamps,
}

/// Outcome of one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionResult {
    /// All candidates, in discovery order.
    pub active_candidates: Vec<AuthorityCandidate>,
    pub active_user_keys: Vec<String>,
    /// Only set when two or more candidates were disambiguated by grant time.
    pub canonical_candidate: Option<AuthorityCandidate>,
    pub unresolved_reason: Option<UnresolvedReason>,
    pub stale_broadcast_user_keys: Vec<String>,
}

impl ResolutionResult {
    /// Human-readable explanation, empty when nothing is ambiguous.
    pub fn unresolved_reason_message(&self) -> String {
        self.unresolved_reason
            .map(|reason| reason.to_string())
            .unwrap_or_default()
    }

    /// The only candidate when exactly one exists.
    ///
    /// `canonical_candidate` stays `None` in that case, so callers that treat a
    /// lone candidate as the authority read it from here.
    pub fn sole_candidate(&self) -> Option<&AuthorityCandidate> {
        match self.active_candidates.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}

/// Effective broadcast freshness window for a requested value.
pub fn effective_broadcast_window(requested_ms: Option<i64>) -> i64 {
    requested_ms
        .unwrap_or(DEFAULT_BROADCAST_SIGNAL_WINDOW_MS)
        .max(MIN_BROADCAST_SIGNAL_WINDOW_MS)
}

/// Resolve presenter authority, reading the system clock only if `now_ts` is unset.
pub fn evaluate_switching_authorities(snapshot: &AuthoritySnapshot) -> ResolutionResult {
    evaluate_switching_authorities_with_clock(snapshot, &SystemClock)
}

/// Resolve presenter authority with an injected clock for the `now_ts` default.
pub fn evaluate_switching_authorities_with_clock(
    snapshot: &AuthoritySnapshot,
    clock: &dyn Clock,
) -> ResolutionResult {
    let now = snapshot.now_ts.unwrap_or_else(|| clock.now_millis());
    let window = effective_broadcast_window(snapshot.broadcast_signal_window_ms);
    let identities =
        IdentityResolver::new(&snapshot.connected_clients, &snapshot.excluded_client_ids);
    let rights_granted_at = canonical_timestamps(&snapshot.rights_granted_at_by_user_key);
    let grant_for = |user_key: &str| rights_granted_at.get(&canonical_user_key(user_key)).copied();

    let mut candidates = CandidateSet::new();

    // Presenter state, tracked by identity and by connection.
    let presenter_key = snapshot
        .active_presenter_user_key
        .as_deref()
        .map(canonical_user_key)
        .filter(|key| !key.is_empty());
    let presenter_key = presenter_key.as_deref();
    let presenter_set_ts = snapshot.last_presenter_set_ts.and_then(positive);
    let mut presenter_name = None;
    if let Some(key) = presenter_key {
        let identity = identities.resolve_identity_for_user_key(key);
        let grant_ts = grant_for(key).or(presenter_set_ts).unwrap_or(0);
        if identity.connection_ids.is_empty() {
            candidates.add(
                Evidence::new(key, &identity.name, EvidenceReason::Presenter).granted_at(grant_ts),
            );
        }
        for connection_id in &identity.connection_ids {
            candidates.add(
                Evidence::new(key, &identity.name, EvidenceReason::Presenter)
                    .connection(connection_id)
                    .granted_at(grant_ts),
            );
        }
        presenter_name = Some(identity.name);
    }
    for connection_id in blank_free(&snapshot.active_presenter_client_ids) {
        let (user_key, name) = match identities.resolve_user_for_connection(connection_id) {
            Some(user) => (user.user_key, user.name),
            None => match presenter_key {
                Some(key) => (key.to_string(), presenter_name.clone().unwrap_or_default()),
                None => (
                    Identity::ByConnection(connection_id.to_string()).key(),
                    connection_id.to_string(),
                ),
            },
        };
        let grant_ts = grant_for(&user_key).or(presenter_set_ts).unwrap_or(0);
        candidates.add(
            Evidence::new(&user_key, &name, EvidenceReason::PresenterClient)
                .connection(connection_id)
                .granted_at(grant_ts),
        );
    }

    // Controller-rights allowlists.
    let rights_ts = snapshot.last_controller_rights_ts.and_then(positive);
    for user_key in &canonical_keys(&snapshot.controller_rights_user_allowlist) {
        let user_key = user_key.as_str();
        let identity = identities.resolve_identity_for_user_key(user_key);
        let grant_ts = grant_for(user_key).or(rights_ts).unwrap_or(0);
        candidates.add(
            Evidence::new(user_key, &identity.name, EvidenceReason::ControllerRightsUser)
                .granted_at(grant_ts),
        );
        for connection_id in &identity.connection_ids {
            candidates.add(
                Evidence::new(
                    user_key,
                    &identity.name,
                    EvidenceReason::ControllerRightsUserClient,
                )
                .connection(connection_id)
                .granted_at(grant_ts),
            );
        }
    }
    for connection_id in blank_free(&snapshot.controller_rights_client_allowlist) {
        let (user_key, name) = match identities.resolve_user_for_connection(connection_id) {
            Some(user) => (user.user_key, user.name),
            None => (
                Identity::ByConnection(connection_id.to_string()).key(),
                connection_id.to_string(),
            ),
        };
        let grant_ts = grant_for(&user_key).or(rights_ts).unwrap_or(0);
        candidates.add(
            Evidence::new(&user_key, &name, EvidenceReason::ControllerRightsClient)
                .connection(connection_id)
                .granted_at(grant_ts),
        );
    }

    // Control lock.
    if let Some(lock) = &snapshot.control_lock {
        let controller_id = lock.controller_id.trim();
        if !controller_id.is_empty() {
            let (user_key, name) = match identities.resolve_user_for_connection(controller_id) {
                Some(user) => (user.user_key, user.name),
                None => {
                    let name = lock
                        .controller_name
                        .as_deref()
                        .map(normalize_display_name)
                        .filter(|name| !name.is_empty())
                        .unwrap_or_else(|| controller_id.to_string());
                    (Identity::ByConnection(controller_id.to_string()).key(), name)
                }
            };
            let grant_ts = lock.ts.and_then(positive).unwrap_or(now);
            candidates.add(
                Evidence::new(&user_key, &name, EvidenceReason::ControlLock)
                    .connection(controller_id)
                    .granted_at(grant_ts),
            );
        }
    }

    // Recent broadcast activity.
    let mut stale_broadcast_user_keys = Vec::new();
    let recent_broadcasts = canonical_timestamps(&snapshot.recent_broadcast_ts_by_user_key);
    for (user_key, &activity_ts) in &recent_broadcasts {
        let user_key = user_key.as_str();
        let age_ms = now.saturating_sub(activity_ts);
        if age_ms > window {
            tracing::debug!(user_key, age_ms, window, "ignoring stale broadcast signal");
            stale_broadcast_user_keys.push(user_key.to_string());
            continue;
        }
        let identity = identities.resolve_identity_for_user_key(user_key);
        let grant_ts = grant_for(user_key).unwrap_or(0);
        candidates.add(
            Evidence::new(user_key, &identity.name, EvidenceReason::RecentBroadcast)
                .granted_at(grant_ts)
                .broadcast_at(activity_ts),
        );
        for connection_id in &identity.connection_ids {
            candidates.add(
                Evidence::new(
                    user_key,
                    &identity.name,
                    EvidenceReason::RecentBroadcastClient,
                )
                .connection(connection_id)
                .granted_at(grant_ts)
                .broadcast_at(activity_ts),
            );
        }
    }

    // The caller itself, when it believes it can write.
    if snapshot.self_can_write {
        let self_client_id = snapshot
            .self_client_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        let self_key = match canonical_user_key(&snapshot.self_user_key) {
            key if key.is_empty() => {
                self_client_id.map(|id| Identity::ByConnection(id.to_string()).key())
            }
            key => Some(key),
        };
        if let Some(self_key) = self_key {
            let name = snapshot
                .self_display_name
                .as_deref()
                .map(normalize_display_name)
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| identities.resolve_identity_for_user_key(&self_key).name);
            let grant_ts = grant_for(&self_key).unwrap_or(now);
            let mut evidence = Evidence::new(&self_key, &name, EvidenceReason::SelfWriteRights)
                .granted_at(grant_ts);
            if let Some(connection_id) = self_client_id {
                evidence = evidence.connection(connection_id);
            }
            candidates.add(evidence);
        }
    }

    let active_candidates = candidates.into_vec();
    let active_user_keys = active_candidates
        .iter()
        .map(|candidate| candidate.user_key.clone())
        .collect();
    let (canonical_candidate, unresolved_reason) = select_canonical(&active_candidates);
    if let Some(reason) = unresolved_reason {
        tracing::debug!(
            candidates = active_candidates.len(),
            %reason,
            "presenter authority is unresolved"
        );
    }

    ResolutionResult {
        active_candidates,
        active_user_keys,
        canonical_candidate,
        unresolved_reason,
        stale_broadcast_user_keys,
    }
}

/// Pick the candidate with the unique latest grant among two or more.
fn select_canonical(
    candidates: &[AuthorityCandidate],
) -> (Option<AuthorityCandidate>, Option<UnresolvedReason>) {
    if candidates.len() < 2 {
        return (None, None);
    }

    let mut granted: Vec<&AuthorityCandidate> =
        candidates.iter().filter(|c| c.grant_ts > 0).collect();
    granted.sort_by(|a, b| b.grant_ts.cmp(&a.grant_ts));

    match granted.as_slice() {
        [] => (None, Some(UnresolvedReason::NoGrantTimestamps)),
        [first, second, ..] if first.grant_ts == second.grant_ts => {
            (None, Some(UnresolvedReason::TiedGrantTimestamps))
        }
        [first, ..] => (Some((*first).clone()), None),
    }
}

fn positive(ts: i64) -> Option<i64> {
    (ts > 0).then_some(ts)
}

/// Identity keys in canonical form, blanks dropped and duplicates merged.
fn canonical_keys(keys: &BTreeSet<String>) -> BTreeSet<String> {
    keys.iter()
        .map(|key| canonical_user_key(key))
        .filter(|key| !key.is_empty())
        .collect()
}

/// Positive timestamps keyed by canonical identity key. Keys that collapse onto
/// the same identity keep the most recent timestamp.
fn canonical_timestamps(timestamps: &BTreeMap<String, i64>) -> BTreeMap<String, i64> {
    let mut merged = BTreeMap::new();
    for (key, &ts) in timestamps {
        let key = canonical_user_key(key);
        let Some(ts) = positive(ts) else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        merged
            .entry(key)
            .and_modify(|current: &mut i64| *current = (*current).max(ts))
            .or_insert(ts);
    }
    merged
}

fn blank_free(values: &BTreeSet<String>) -> impl Iterator<Item = &str> {
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}
