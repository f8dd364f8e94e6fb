//! Presenter authority resolution for collaborative canvas sessions.
//!
//! Given a snapshot of who is connected, who was made presenter, who holds
//! controller rights, who holds the control lock and who has been drawing
//! lately, decide which identities currently act as editors and, when the
//! grant timestamps allow it, which single one is canonical.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
