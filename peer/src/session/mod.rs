mod client;
mod host;
mod session_config;
mod session_state;
mod sync_orchestrator;

pub use session_config::{SessionConfig, ViolationPolicy};
pub use session_state::SessionState;
pub use sync_orchestrator::SyncOrchestrator;
