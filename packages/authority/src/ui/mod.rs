//! Command-line front end for the resolver.

mod cli;

pub use cli::{CliError, ResolveOptions, resolve_json, run_resolve};
