//! Resolution DTO.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDto {
    pub user_key: String,
    pub name: String,
    pub client_ids: Vec<String>,
    pub grant_ts: i64,
    pub last_broadcast_ts: i64,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionDto {
    pub active_candidates: Vec<CandidateDto>,
    pub active_user_keys: Vec<String>,
    pub canonical_candidate: Option<CandidateDto>,
    /// Empty string when resolved.
    pub unresolved_reason: String,
    pub stale_broadcast_user_keys: Vec<String>,
}
