//! Authority candidates and the per-call accumulator that merges evidence for them.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Rule that contributed evidence for a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EvidenceReason {
    Presenter,
    PresenterClient,
    ControllerRightsUser,
    ControllerRightsUserClient,
    ControllerRightsClient,
    ControlLock,
    RecentBroadcast,
    RecentBroadcastClient,
    SelfWriteRights,
}

impl EvidenceReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceReason::Presenter => "presenter",
            EvidenceReason::PresenterClient => "presenter-client",
            EvidenceReason::ControllerRightsUser => "controller-rights-user",
            EvidenceReason::ControllerRightsUserClient => "controller-rights-user-client",
            EvidenceReason::ControllerRightsClient => "controller-rights-client",
            EvidenceReason::ControlLock => "control-lock",
            EvidenceReason::RecentBroadcast => "recent-broadcast",
            EvidenceReason::RecentBroadcastClient => "recent-broadcast-client",
            EvidenceReason::SelfWriteRights => "self-write-rights",
        }
    }
}

impl fmt::Display for EvidenceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulated evidence that one identity currently holds write authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityCandidate {
    pub user_key: String,
    pub name: String,
    pub client_ids: BTreeSet<String>,
    /// Latest explicit grant in epoch milliseconds, 0 if none.
    pub grant_ts: i64,
    /// Latest live broadcast in epoch milliseconds, 0 if none.
    pub last_broadcast_ts: i64,
    pub reasons: BTreeSet<EvidenceReason>,
}

impl AuthorityCandidate {
    pub fn has_reason(&self, reason: EvidenceReason) -> bool {
        self.reasons.contains(&reason)
    }
}

/// One piece of evidence to merge into the candidate set.
#[derive(Debug, Clone)]
pub struct Evidence<'a> {
    pub user_key: &'a str,
    pub connection_id: Option<&'a str>,
    pub name: &'a str,
    pub grant_ts: i64,
    pub broadcast_ts: i64,
    pub reason: EvidenceReason,
}

impl<'a> Evidence<'a> {
    pub fn new(user_key: &'a str, name: &'a str, reason: EvidenceReason) -> Self {
        Self {
            user_key,
            connection_id: None,
            name,
            grant_ts: 0,
            broadcast_ts: 0,
            reason,
        }
    }

    pub fn connection(mut self, connection_id: &'a str) -> Self {
        self.connection_id = Some(connection_id);
        self
    }

    pub fn granted_at(mut self, grant_ts: i64) -> Self {
        self.grant_ts = grant_ts;
        self
    }

    pub fn broadcast_at(mut self, broadcast_ts: i64) -> Self {
        self.broadcast_ts = broadcast_ts;
        self
    }
}

/// Candidates keyed by user key, kept in discovery order.
#[derive(Debug, Default)]
pub struct CandidateSet {
    candidates: Vec<AuthorityCandidate>,
    index: HashMap<String, usize>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `evidence` into the candidate for its user key.
    ///
    /// Timestamps only ever rise, connection ids and reasons are unioned and the
    /// name is kept from the first evidence that had one. Blank keys are ignored.
    pub fn add(&mut self, evidence: Evidence<'_>) {
        let user_key = evidence.user_key.trim();
        if user_key.is_empty() {
            return;
        }

        let existing = self.index.get(user_key).copied();
        let position = match existing {
            Some(position) => position,
            None => {
                self.candidates.push(AuthorityCandidate {
                    user_key: user_key.to_string(),
                    name: String::new(),
                    client_ids: BTreeSet::new(),
                    grant_ts: 0,
                    last_broadcast_ts: 0,
                    reasons: BTreeSet::new(),
                });
                self.index
                    .insert(user_key.to_string(), self.candidates.len() - 1);
                self.candidates.len() - 1
            }
        };

        let candidate = &mut self.candidates[position];
        if let Some(connection_id) = evidence.connection_id.map(str::trim)
            && !connection_id.is_empty()
        {
            candidate.client_ids.insert(connection_id.to_string());
        }
        if candidate.name.is_empty() {
            candidate.name = evidence.name.trim().to_string();
        }
        candidate.grant_ts = candidate.grant_ts.max(evidence.grant_ts);
        candidate.last_broadcast_ts = candidate.last_broadcast_ts.max(evidence.broadcast_ts);
        candidate.reasons.insert(evidence.reason);
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn into_vec(self) -> Vec<AuthorityCandidate> {
        self.candidates
    }
}
