//! Domain layer: identities, authority candidates and the presenter authority resolver.
//!
//! Everything here except the repository traits is synchronous and free of I/O.

pub mod candidate;
pub mod entity;
pub mod error;
pub mod identity;
pub mod repository;
pub mod resolver;
pub mod value_object;

pub use candidate::{AuthorityCandidate, CandidateSet, Evidence, EvidenceReason};
pub use entity::{Roster, SessionState};
pub use error::{ControlLockError, RepositoryError};
pub use identity::{
    IdentityResolver, ResolvedIdentity, ResolvedUser, connection_identity,
    normalize_display_name, user_identity, user_key_for,
};
pub use repository::{PresenceRepository, SessionStateRepository};
pub use resolver::{
    AuthoritySnapshot, DEFAULT_BROADCAST_SIGNAL_WINDOW_MS, MIN_BROADCAST_SIGNAL_WINDOW_MS,
    ResolutionResult, UnresolvedReason, effective_broadcast_window,
    evaluate_switching_authorities, evaluate_switching_authorities_with_clock,
};
pub use value_object::{BROADCAST_SENTINEL_CONNECTION_ID, Connection, ControlLock, Identity};

#[cfg(test)]
pub use repository::{MockPresenceRepository, MockSessionStateRepository};
