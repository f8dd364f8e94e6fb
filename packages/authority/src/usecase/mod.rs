//! UseCase layer: assembles consistent snapshots and applies authority changes.

mod error;
mod manage_controller_rights;
mod resolve_authority;

pub use error::{ManageRightsError, ResolveAuthorityError};
pub use manage_controller_rights::ManageControllerRightsUseCase;
pub use resolve_authority::{ResolveAuthorityRequest, ResolveAuthorityUseCase};
