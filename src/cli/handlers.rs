//! Command handlers. Each returns the process exit code.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use super::commands::{AssembleArgs, BuildArgs, ConfigArgs, InstallArgs, ResolveArgs};
use super::output::{OutputFormat, OutputFormatter};
use crate::assemble::RuntimeAssembler;
use crate::config::PipboxConfig;
use crate::fs::{FileSystem, RealFileSystem};
use crate::installer::{PackageInstaller, ProcessRunner};
use crate::pipeline::{BuildContext, PipelineOrchestrator};
use crate::progress::LoggingHandler;
use crate::resolver::{DependencyResolver, DevFlag, METADATA_FILE};
use crate::validation::Validator;

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;

fn load_config() -> Option<PipboxConfig> {
    match PipboxConfig::from_env() {
        Ok(config) => Some(config),
        Err(e) => {
            error!("Configuration error: {}", e);
            None
        }
    }
}

fn validated(config: PipboxConfig) -> Option<PipboxConfig> {
    match config.validate() {
        Ok(()) => Some(config),
        Err(e) => {
            error!("Configuration error: {}", e);
            eprintln!("\nPlease check your PIPBOX_* environment variables and command-line arguments.");
            None
        }
    }
}

fn project_dir(arg: &Option<PathBuf>) -> PathBuf {
    arg.clone().unwrap_or_else(|| PathBuf::from("."))
}

fn emit(output: &str, target: Option<&Path>, quiet: bool) -> i32 {
    match target {
        Some(path) => match std::fs::write(path, output) {
            Ok(()) => {
                info!("Output written to: {}", path.display());
                if !quiet {
                    eprintln!("Output written to: {}", path.display());
                }
                EXIT_SUCCESS
            }
            Err(e) => {
                error!("Failed to write output to {}: {}", path.display(), e);
                EXIT_FAILURE
            }
        },
        None => {
            if output.ends_with('\n') {
                print!("{}", output);
            } else {
                println!("{}", output);
            }
            EXIT_SUCCESS
        }
    }
}

pub fn handle_resolve(args: &ResolveArgs) -> i32 {
    let Some(config) = load_config() else {
        return EXIT_FAILURE;
    };
    let dev = args
        .dev
        .as_deref()
        .map(DevFlag::parse)
        .unwrap_or_else(|| config.dev_flag());
    debug!(dev = %dev, "Resolving {}", args.pyproject.display());

    let fs = Arc::new(RealFileSystem::new());
    let manifest = match DependencyResolver::new(fs.clone()).resolve(&args.pyproject, dev) {
        Ok(manifest) => manifest,
        Err(e) => {
            error!("Resolution failed: {}", e);
            return EXIT_FAILURE;
        }
    };

    match &args.output {
        Some(path) => match manifest.write_to(fs.as_ref(), path) {
            Ok(()) => {
                info!("Manifest written to: {}", path.display());
                EXIT_SUCCESS
            }
            Err(e) => {
                error!("Failed to write manifest: {:#}", e);
                EXIT_FAILURE
            }
        },
        None => {
            print!("{}", manifest.render());
            EXIT_SUCCESS
        }
    }
}

pub async fn handle_install(args: &InstallArgs) -> i32 {
    let Some(mut config) = load_config() else {
        return EXIT_FAILURE;
    };
    if let Some(env_dir) = &args.env_dir {
        config.env_dir = env_dir.clone();
    }
    if let Some(installer) = args.installer {
        config.installer = installer.into();
    }
    if let Some(python) = &args.python {
        config.python = python.clone();
    }
    let Some(config) = validated(config) else {
        return EXIT_FAILURE;
    };

    let installer = PackageInstaller::new(
        Arc::new(RealFileSystem::new()),
        Arc::new(ProcessRunner),
        config.installer,
        config.python.clone(),
        Duration::from_secs(config.install_timeout_secs),
    );

    match installer.install(&args.manifest, &config.env_dir).await {
        Ok(environment) => {
            info!(
                requirements = environment.requirements,
                installer = %environment.installer,
                "Installed into {}",
                environment.env_dir.display()
            );
            EXIT_SUCCESS
        }
        Err(e) => {
            error!("Installation failed: {}", e);
            EXIT_FAILURE
        }
    }
}

pub fn handle_assemble(args: &AssembleArgs, quiet: bool) -> i32 {
    let Some(mut config) = load_config() else {
        return EXIT_FAILURE;
    };
    if let Some(dev) = &args.dev {
        config.dev = dev.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(entrypoint) = &args.entrypoint {
        config.entrypoint = entrypoint.clone();
    }
    let Some(config) = validated(config) else {
        return EXIT_FAILURE;
    };

    let project_dir = project_dir(&args.project_dir);
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem::new());

    let metadata = match DependencyResolver::new(fs.clone()).load(&project_dir.join(METADATA_FILE)) {
        Ok(metadata) => metadata,
        Err(e) => {
            error!("Resolution failed: {}", e);
            return EXIT_FAILURE;
        }
    };
    let manifest = DependencyResolver::manifest_for(&metadata, config.dev_flag());

    let build = match RuntimeAssembler::new(fs, config).assemble(&project_dir, &metadata, &manifest)
    {
        Ok(build) => build,
        Err(e) => {
            error!("Assembly failed: {}", e);
            return EXIT_FAILURE;
        }
    };

    if let Err(e) = Validator::new().validate(&build) {
        error!("Validation failed: {}", e);
        return EXIT_FAILURE;
    }

    let format: OutputFormat = args.format.into();
    let output = match OutputFormatter::new(format).format(&build) {
        Ok(out) => out,
        Err(e) => {
            error!("Failed to format output: {:#}", e);
            return EXIT_FAILURE;
        }
    };

    emit(&output, args.output.as_deref(), quiet)
}

pub async fn handle_build(args: &BuildArgs, quiet: bool) -> i32 {
    let Some(mut config) = load_config() else {
        return EXIT_FAILURE;
    };
    if let Some(dev) = &args.dev {
        config.dev = dev.clone();
    }
    if let Some(env_dir) = &args.env_dir {
        config.env_dir = env_dir.clone();
    }
    let Some(config) = validated(config) else {
        return EXIT_FAILURE;
    };

    let mut context = BuildContext::new(
        project_dir(&args.project_dir),
        config,
        Arc::new(RealFileSystem::new()),
        Arc::new(ProcessRunner),
    )
    .with_skip_install(args.skip_install);
    if let Some(work_dir) = &args.work_dir {
        context = context.with_work_dir(work_dir.clone());
    }

    let orchestrator = PipelineOrchestrator::new(Some(Arc::new(LoggingHandler)));
    let build = match orchestrator.execute(&mut context).await {
        Ok(build) => build,
        Err(e) => {
            error!("Build failed: {:#}", e);
            return EXIT_FAILURE;
        }
    };

    let format: OutputFormat = args.format.into();
    let output = match OutputFormatter::new(format).format(&build) {
        Ok(out) => out,
        Err(e) => {
            error!("Failed to format output: {:#}", e);
            return EXIT_FAILURE;
        }
    };

    emit(&output, args.output.as_deref(), quiet)
}

pub fn handle_config(args: &ConfigArgs) -> i32 {
    let Some(config) = load_config() else {
        return EXIT_FAILURE;
    };

    let format: OutputFormat = args.format.into();
    match OutputFormatter::new(format).format_config(&config) {
        Ok(output) => emit(&output, None, false),
        Err(e) => {
            error!("Failed to format configuration: {:#}", e);
            EXIT_FAILURE
        }
    }
}
