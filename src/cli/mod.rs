pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{AssembleArgs, BuildArgs, CliArgs, Commands, ConfigArgs, InstallArgs, ResolveArgs};
pub use output::{OutputFormat, OutputFormatter};
