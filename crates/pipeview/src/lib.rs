//! Command-line front end for pipeview: file loading, the external
//! disassembler process, and log setup.

/// Event log and schema loading.
pub mod loader;
/// Subscriber setup for `tracing` output.
pub mod logger;
/// Disassembler backed by an external command.
pub mod spike;

pub use loader::{load_log, load_schema, LoadError};
pub use logger::setup_logger;
pub use spike::{default_command, SpikeDasm};
