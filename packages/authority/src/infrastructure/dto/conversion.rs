//! Conversion logic between DTOs and domain types.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{
    AuthorityCandidate, AuthoritySnapshot, Connection, ControlLock, ResolutionResult,
};
use crate::infrastructure::dto::{
    CandidateDto, ConnectionDto, ControlLockDto, ResolutionDto, SnapshotDto,
};

/// Finite, positive milliseconds; anything else counts as absent.
fn coerce_millis(value: Option<f64>) -> Option<i64> {
    value
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v.trunc() as i64)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn id_set(values: Option<Vec<String>>) -> BTreeSet<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| non_blank(Some(v)))
        .collect()
}

fn timestamp_map(values: Option<BTreeMap<String, Option<f64>>>) -> BTreeMap<String, i64> {
    values
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, ts)| Some((non_blank(Some(key))?, coerce_millis(ts)?)))
        .collect()
}

// ========================================
// DTO → Domain
// ========================================

impl ConnectionDto {
    /// Domain connection, or `None` when the connection id is blank.
    pub fn into_domain(self) -> Option<Connection> {
        Some(Connection {
            connection_id: non_blank(self.connection_id)?,
            display_name: self.display_name,
            user_id: self.user_id,
            is_admin: self.is_admin.unwrap_or(false),
        })
    }
}

impl ControlLockDto {
    /// Domain lock, or `None` when no controller is named.
    pub fn into_domain(self) -> Option<ControlLock> {
        Some(ControlLock {
            controller_id: non_blank(self.controller_id)?,
            controller_name: non_blank(self.controller_name),
            ts: coerce_millis(self.ts),
        })
    }
}

impl From<SnapshotDto> for AuthoritySnapshot {
    fn from(dto: SnapshotDto) -> Self {
        Self {
            connected_clients: dto
                .connected_clients
                .unwrap_or_default()
                .into_iter()
                .filter_map(ConnectionDto::into_domain)
                .collect(),
            excluded_client_ids: id_set(dto.excluded_client_ids),
            active_presenter_user_key: non_blank(dto.active_presenter_user_key),
            active_presenter_client_ids: id_set(dto.active_presenter_client_ids),
            controller_rights_user_allowlist: id_set(dto.controller_rights_user_allowlist),
            controller_rights_client_allowlist: id_set(dto.controller_rights_client_allowlist),
            rights_granted_at_by_user_key: timestamp_map(dto.rights_granted_at_by_user_key),
            recent_broadcast_ts_by_user_key: timestamp_map(dto.recent_broadcast_ts_by_user_key),
            last_presenter_set_ts: coerce_millis(dto.last_presenter_set_ts),
            last_controller_rights_ts: coerce_millis(dto.last_controller_rights_ts),
            control_lock: dto.control_lock.and_then(ControlLockDto::into_domain),
            self_can_write: dto.self_can_write.unwrap_or(false),
            self_user_key: non_blank(dto.self_user_key).unwrap_or_default(),
            self_client_id: non_blank(dto.self_client_id),
            self_display_name: non_blank(dto.self_display_name),
            now_ts: coerce_millis(dto.now_ts),
            broadcast_signal_window_ms: dto
                .broadcast_signal_window_ms
                .filter(|v| v.is_finite())
                .map(|v| v.trunc() as i64),
        }
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<AuthorityCandidate> for CandidateDto {
    fn from(model: AuthorityCandidate) -> Self {
        Self {
            user_key: model.user_key,
            name: model.name,
            client_ids: model.client_ids.into_iter().collect(),
            grant_ts: model.grant_ts,
            last_broadcast_ts: model.last_broadcast_ts,
            reasons: model
                .reasons
                .iter()
                .map(|reason| reason.as_str().to_string())
                .collect(),
        }
    }
}

impl From<ResolutionResult> for ResolutionDto {
    fn from(model: ResolutionResult) -> Self {
        let unresolved_reason = model.unresolved_reason_message();
        Self {
            active_candidates: model
                .active_candidates
                .into_iter()
                .map(CandidateDto::from)
                .collect(),
            active_user_keys: model.active_user_keys,
            canonical_candidate: model.canonical_candidate.map(CandidateDto::from),
            unresolved_reason,
            stale_broadcast_user_keys: model.stale_broadcast_user_keys,
        }
    }
}
