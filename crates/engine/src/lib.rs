//! Engine crate – prompt intelligence, the dry-run simulation runner and the
//! prompt vault.
//!
//! Everything here is UI-agnostic. Storage and outbound HTTP sit behind
//! capability traits so the CLI, scenarios and tests can swap them.

pub mod coach;
pub mod commands;
pub mod context;
pub mod platform;
pub mod prompt;
pub mod scenario;
pub mod simulate;
pub mod toast;
pub mod traits;
pub mod types;
pub mod vault;
pub mod workbench;

// Re-exports for convenience
pub use commands::CommandRegistry;
pub use context::AppContext;
pub use simulate::{Outcome, RunnerConfig, SimulateError, SimulateOptions, SimulationRunner, Stub};
pub use types::{CommandResult, ErrorCode, ErrorInfo, Mode, Status};
