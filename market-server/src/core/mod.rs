//! Core server components: configuration, shared state, server lifecycle

mod config;
mod error;
mod server;
mod state;

pub use config::Config;
pub use error::{Result, ServerError};
pub use server::Server;
pub use state::ServerState;
