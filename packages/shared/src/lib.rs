//! Helpers shared by every Podium package: logging setup and the clock abstraction.

pub mod logger;
pub mod time;
