//! Installer stage
//!
//! Materializes an isolated Python environment from a resolved manifest by
//! driving an external package installer. Every step runs once; the first
//! failure aborts the stage.

mod mock;
mod plan;
mod runner;

pub use mock::MockCommandRunner;
pub use plan::{CommandSpec, InstallPlan};
pub use runner::{CommandOutput, CommandRunner, ProcessRunner};

use crate::config::ConfigError;
use crate::error::InstallError;
use crate::fs::FileSystem;
use crate::resolver::Manifest;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InstallerKind {
    #[default]
    Pip,
    Uv,
}

impl FromStr for InstallerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pip" => Ok(InstallerKind::Pip),
            "uv" => Ok(InstallerKind::Uv),
            _ => Err(ConfigError::InvalidInstaller(s.to_string())),
        }
    }
}

impl fmt::Display for InstallerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallerKind::Pip => write!(f, "pip"),
            InstallerKind::Uv => write!(f, "uv"),
        }
    }
}

/// Result of a successful installer run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledEnvironment {
    pub env_dir: PathBuf,
    pub installer: InstallerKind,
    pub requirements: usize,
}

pub struct PackageInstaller {
    fs: Arc<dyn FileSystem>,
    runner: Arc<dyn CommandRunner>,
    kind: InstallerKind,
    python: String,
    timeout: Duration,
}

impl PackageInstaller {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        runner: Arc<dyn CommandRunner>,
        kind: InstallerKind,
        python: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            fs,
            runner,
            kind,
            python: python.into(),
            timeout,
        }
    }

    /// Install every requirement listed in `manifest_path` into `env_dir`
    pub async fn install(
        &self,
        manifest_path: &Path,
        env_dir: &Path,
    ) -> Result<InstalledEnvironment, InstallError> {
        if !self.fs.is_file(manifest_path) {
            return Err(InstallError::ManifestNotFound(manifest_path.to_path_buf()));
        }
        let manifest = self
            .fs
            .read_to_string(manifest_path)
            .map(|content| Manifest::parse(&content))
            .map_err(|e| InstallError::Unreadable {
                path: manifest_path.to_path_buf(),
                message: format!("{:#}", e),
            })?;

        let plan = InstallPlan::for_manifest(
            self.kind,
            &self.python,
            manifest_path,
            env_dir,
            !manifest.is_empty(),
        );

        info!(
            installer = %self.kind,
            env_dir = %env_dir.display(),
            requirements = manifest.len(),
            "Installing dependencies"
        );

        let start = Instant::now();
        for step in plan.steps() {
            debug!(command = %step, "Running installer step");
            let output = self.runner.run(step, self.timeout).await?;
            if !output.success() {
                return Err(InstallError::Failed {
                    program: step.program.clone(),
                    code: output.status,
                    stderr: output.stderr.trim().to_string(),
                });
            }
        }

        info!(
            duration_ms = start.elapsed().as_millis(),
            "Environment ready at {}",
            env_dir.display()
        );

        Ok(InstalledEnvironment {
            env_dir: env_dir.to_path_buf(),
            installer: self.kind,
            requirements: manifest.len(),
        })
    }
}
