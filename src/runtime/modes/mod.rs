//! Mode routing
//!
//! - Server mode (HTTP server + expiry reconciler)
//! - CLI mode (one-shot maintenance commands)

pub mod cli;
pub mod server;

pub use cli::{run_config_generate, run_sweep, run_token};
pub use server::run_server;
