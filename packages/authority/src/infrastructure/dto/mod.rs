//! Data Transfer Objects (DTOs) for the JSON boundary.
//!
//! - `snapshot`: the resolver input as produced by callers
//! - `lenient`: field deserializers that read mistyped values as absent
//! - `resolution`: the resolver output

pub mod conversion;
pub mod lenient;
pub mod resolution;
pub mod snapshot;

pub use resolution::{CandidateDto, ResolutionDto};
pub use snapshot::{ConnectionDto, ControlLockDto, SnapshotDto};
