//! pipbox - three-stage container builds for pyproject-based Python services
//!
//! A build runs in three isolated stages:
//!
//! 1. **Resolver**: reads `pyproject.toml` and emits a requirements
//!    [`Manifest`], optionally including the `dev` dependency group.
//! 2. **Installer**: materializes an isolated environment from the manifest
//!    with `pip` or `uv`.
//! 3. **Runtime**: a minimal image carrying only the populated environment
//!    and the service's entrypoint scripts, running as a non-root account.
//!
//! ```no_run
//! use pipbox::{BuildContext, PipboxConfig, PipelineOrchestrator};
//! use pipbox::fs::RealFileSystem;
//! use pipbox::installer::ProcessRunner;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut context = BuildContext::new(
//!     "/srv/notes",
//!     PipboxConfig::from_env()?,
//!     Arc::new(RealFileSystem::new()),
//!     Arc::new(ProcessRunner),
//! );
//! let build = PipelineOrchestrator::new(None).execute(&mut context).await?;
//! println!("{}", pipbox::output::dockerfile::render(&build));
//! # Ok(())
//! # }
//! ```

pub mod assemble;
pub mod cli;
pub mod config;
pub mod error;
pub mod fs;
pub mod installer;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod resolver;
pub mod util;
pub mod validation;

pub use assemble::RuntimeAssembler;
pub use config::{ConfigError, PipboxConfig};
pub use error::{AssembleError, InstallError, ResolveError};
pub use installer::{InstallerKind, PackageInstaller};
pub use output::ImageBuild;
pub use pipeline::{BuildContext, PipelineOrchestrator};
pub use resolver::{DependencyResolver, DevFlag, Manifest, ProjectMetadata};
pub use util::{init_from_env, init_logging, LoggingConfig};
pub use validation::Validator;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const NAME: &str = env!("CARGO_PKG_NAME");
