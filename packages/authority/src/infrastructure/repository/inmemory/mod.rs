//! InMemory repository implementations backed by `tokio::sync::Mutex`.

mod presence;
mod session_state;

pub use presence::InMemoryPresenceRepository;
pub use session_state::InMemorySessionStateRepository;
