//! Utility modules for scanfleet
//!
//! - Structured logging setup
//! - Command template rendering and raw-output text helpers

pub mod logging;
pub mod text;

pub use logging::{init_default, init_from_env, init_logging, LoggingConfig};
pub use text::render_command;
