//! State shared by the build pipeline phases

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::PipboxConfig;
use crate::fs::FileSystem;
use crate::installer::{CommandRunner, InstalledEnvironment};
use crate::output::schema::ImageBuild;
use crate::resolver::{Manifest, ProjectMetadata};

/// Name of the manifest file written into the work directory
pub const MANIFEST_FILE: &str = "requirements.txt";

/// Directory under the project used when no work directory is given
pub const DEFAULT_WORK_DIR: &str = ".pipbox";

pub struct BuildContext {
    pub project_dir: PathBuf,

    /// Scratch directory for the manifest; never part of the image
    pub work_dir: PathBuf,

    pub config: PipboxConfig,
    pub fs: Arc<dyn FileSystem>,
    pub runner: Arc<dyn CommandRunner>,

    /// Plan the image without materializing the environment locally
    pub skip_install: bool,

    pub metadata: Option<ProjectMetadata>,
    pub manifest: Option<Manifest>,
    pub manifest_path: Option<PathBuf>,
    pub environment: Option<InstalledEnvironment>,
    pub build: Option<ImageBuild>,
    pub validated_rules: Option<usize>,
}

impl BuildContext {
    pub fn new(
        project_dir: impl Into<PathBuf>,
        config: PipboxConfig,
        fs: Arc<dyn FileSystem>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        let project_dir = project_dir.into();
        let work_dir = project_dir.join(DEFAULT_WORK_DIR);
        Self {
            project_dir,
            work_dir,
            config,
            fs,
            runner,
            skip_install: false,
            metadata: None,
            manifest: None,
            manifest_path: None,
            environment: None,
            build: None,
            validated_rules: None,
        }
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    pub fn with_skip_install(mut self, skip_install: bool) -> Self {
        self.skip_install = skip_install;
        self
    }

    pub fn manifest_target(&self) -> PathBuf {
        self.work_dir.join(MANIFEST_FILE)
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }
}
