//! Snapshot DTO.
//!
//! Every field is optional and numbers arrive as JSON floats. Fields of the
//! wrong JSON type read as absent (see [`lenient`](super::lenient)); conversion
//! into the domain snapshot is where missing or unusable values get normalized.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::lenient;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionDto {
    #[serde(deserialize_with = "lenient::text")]
    pub connection_id: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub display_name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub user_id: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub is_admin: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControlLockDto {
    #[serde(deserialize_with = "lenient::text")]
    pub controller_id: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub controller_name: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub ts: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotDto {
    #[serde(deserialize_with = "lenient::entries")]
    pub connected_clients: Option<Vec<ConnectionDto>>,
    #[serde(deserialize_with = "lenient::text_list")]
    pub excluded_client_ids: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient::text")]
    pub active_presenter_user_key: Option<String>,
    #[serde(deserialize_with = "lenient::text_list")]
    pub active_presenter_client_ids: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient::text_list")]
    pub controller_rights_user_allowlist: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient::text_list")]
    pub controller_rights_client_allowlist: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient::timestamp_map")]
    pub rights_granted_at_by_user_key: Option<BTreeMap<String, Option<f64>>>,
    #[serde(deserialize_with = "lenient::timestamp_map")]
    pub recent_broadcast_ts_by_user_key: Option<BTreeMap<String, Option<f64>>>,
    #[serde(deserialize_with = "lenient::number")]
    pub last_presenter_set_ts: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub last_controller_rights_ts: Option<f64>,
    #[serde(deserialize_with = "lenient::entry")]
    pub control_lock: Option<ControlLockDto>,
    #[serde(deserialize_with = "lenient::flag")]
    pub self_can_write: Option<bool>,
    #[serde(deserialize_with = "lenient::text")]
    pub self_user_key: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub self_client_id: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub self_display_name: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub now_ts: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub broadcast_signal_window_ms: Option<f64>,
}
