//! Application layer - orchestration, shared state, and the admin server.

#[cfg(feature = "polymarket")]
mod orchestrator;
pub mod server;
mod state;

#[cfg(feature = "polymarket")]
pub use orchestrator::App;
pub use server::ServerState;
pub use state::AppState;
