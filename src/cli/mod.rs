pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, Commands, ConfigArgs, HealthArgs, ParseArgs, ScanArgs, ScannersArgs};
pub use output::{HealthStatus, OutputFormat, OutputFormatter};
