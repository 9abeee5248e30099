use pipbox::cli::commands::{CliArgs, Commands};
use pipbox::cli::handlers::{
    handle_assemble, handle_build, handle_config, handle_install, handle_resolve,
};
use pipbox::util::logging::{self, parse_level, LoggingConfig};
use pipbox::VERSION;

use clap::Parser;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("pipbox v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Resolve(resolve_args) => handle_resolve(resolve_args),
        Commands::Install(install_args) => handle_install(install_args).await,
        Commands::Assemble(assemble_args) => handle_assemble(assemble_args, args.quiet),
        Commands::Build(build_args) => handle_build(build_args, args.quiet).await,
        Commands::Config(config_args) => handle_config(config_args),
    };

    std::process::exit(exit_code);
}

/// Flags win over `PIPBOX_LOG_LEVEL`; `PIPBOX_LOG_JSON` still applies
fn init_logging_from_args(args: &CliArgs) {
    let from_env = logging::config_from_env();

    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        from_env.level
    };

    logging::init_logging(LoggingConfig { level, ..from_env });
}
