//! Runtime assembly stage
//!
//! Composes the three image stages. The runtime stage receives the populated
//! environment from the installer stage plus the auxiliary scripts from the
//! build context, and nothing from the resolver stage.

use crate::config::PipboxConfig;
use crate::error::AssembleError;
use crate::fs::FileSystem;
use crate::installer::{InstallPlan, InstallerKind};
use crate::output::schema::{
    BuildMetadata, CopySpec, ImageBuild, InstallerStage, ResolverStage, RuntimeStage,
    ServiceAccount,
};
use crate::resolver::{Manifest, ProjectMetadata, METADATA_FILE};
use std::collections::BTreeMap;
use std::path::{Component, Path};
use std::sync::Arc;
use tracing::{debug, info};

pub const RESOLVER_STAGE: &str = "resolver";
pub const INSTALLER_STAGE: &str = "installer";
pub const APP_DIR: &str = "/app";
pub const SCRIPTS_PATH: &str = "/app/scripts";
pub const MANIFEST_PATH: &str = "/tmp/requirements.txt";
pub const NOLOGIN_SHELL: &str = "/usr/sbin/nologin";
pub const DEV_BUILD_ARG: &str = "DEV";

const RESOLVER_WORKDIR: &str = "/src";
const DEFAULT_PYTHON_VERSION: &str = "3.12";
const IMAGE_PYTHON: &str = "python3";
const SYSTEM_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

pub struct RuntimeAssembler {
    fs: Arc<dyn FileSystem>,
    config: PipboxConfig,
}

impl RuntimeAssembler {
    pub fn new(fs: Arc<dyn FileSystem>, config: PipboxConfig) -> Self {
        Self { fs, config }
    }

    pub fn assemble(
        &self,
        project_dir: &Path,
        metadata: &ProjectMetadata,
        manifest: &Manifest,
    ) -> Result<ImageBuild, AssembleError> {
        let scripts = self.collect_scripts(project_dir)?;

        let python_version = metadata
            .python_version()
            .unwrap_or_else(|| DEFAULT_PYTHON_VERSION.to_string());
        let python_image = self
            .config
            .python_image
            .clone()
            .unwrap_or_else(|| format!("python:{}-slim", python_version));
        let dev = self.config.dev_flag().enabled();

        let build = ImageBuild {
            version: "1.0".to_string(),
            metadata: BuildMetadata {
                project_name: metadata.name.clone(),
                python_version,
                dev,
                dependencies: manifest.len(),
                manifest_digest: Some(manifest.digest()),
            },
            resolver: self.resolver_stage(dev),
            installer: self.installer_stage(&python_image),
            runtime: self.runtime_stage(&python_image, metadata, &scripts)?,
        };

        info!(
            project = metadata.name.as_deref().unwrap_or("(unnamed)"),
            base = %build.runtime.base,
            scripts = scripts.len(),
            "Assembled image build"
        );
        Ok(build)
    }

    /// File names in the scripts directory; the entrypoint must be one of them
    fn collect_scripts(&self, project_dir: &Path) -> Result<Vec<String>, AssembleError> {
        let scripts_dir = project_dir.join(&self.config.scripts_dir);
        if !self.fs.is_dir(&scripts_dir) {
            return Err(AssembleError::MissingScriptsDir(scripts_dir));
        }

        let scripts: Vec<String> = self
            .fs
            .read_dir(&scripts_dir)
            .map_err(|_| AssembleError::MissingScriptsDir(scripts_dir.clone()))?
            .into_iter()
            .filter(|entry| entry.is_file())
            .map(|entry| entry.file_name().to_string())
            .collect();

        if !scripts.iter().any(|s| *s == self.config.entrypoint) {
            return Err(AssembleError::MissingEntrypoint {
                name: self.config.entrypoint.clone(),
                dir: scripts_dir,
            });
        }

        debug!(?scripts, "Collected auxiliary scripts");
        Ok(scripts)
    }

    fn resolver_stage(&self, dev: bool) -> ResolverStage {
        ResolverStage {
            name: RESOLVER_STAGE.to_string(),
            base: self.config.resolver_image.clone(),
            workdir: RESOLVER_WORKDIR.to_string(),
            inputs: vec![METADATA_FILE.to_string()],
            dev_arg: DEV_BUILD_ARG.to_string(),
            dev_default: dev,
            manifest_path: MANIFEST_PATH.to_string(),
            command: format!(
                "pipbox resolve {} --dev \"${}\" --output {}",
                METADATA_FILE, DEV_BUILD_ARG, MANIFEST_PATH
            ),
        }
    }

    /// The manifest is produced at image build time, where `DEV` may differ
    /// from the assemble-time default, so the install step is always emitted
    /// and skipped in shell when the manifest is empty.
    fn installer_stage(&self, python_image: &str) -> InstallerStage {
        let env_dir = self.config.env_dir.display().to_string();
        let plan = InstallPlan::for_manifest(
            self.config.installer,
            IMAGE_PYTHON,
            Path::new(MANIFEST_PATH),
            &self.config.env_dir,
            true,
        );

        let mut commands = Vec::new();
        if self.config.installer == InstallerKind::Uv {
            commands.push(format!("{} -m pip install --no-cache-dir uv", IMAGE_PYTHON));
        }
        let mut steps = plan.shell_commands().into_iter();
        commands.extend(steps.next());
        commands.extend(
            steps.map(|step| format!("if [ -s {} ]; then {}; fi", MANIFEST_PATH, step)),
        );

        InstallerStage {
            name: INSTALLER_STAGE.to_string(),
            base: python_image.to_string(),
            installer: self.config.installer,
            env_dir,
            copy: vec![CopySpec::from_stage(
                RESOLVER_STAGE,
                MANIFEST_PATH,
                MANIFEST_PATH,
            )],
            commands,
        }
    }

    fn runtime_stage(
        &self,
        python_image: &str,
        metadata: &ProjectMetadata,
        scripts: &[String],
    ) -> Result<RuntimeStage, AssembleError> {
        let env_dir = self.config.env_dir.display().to_string();

        let mut labels = BTreeMap::new();
        if let Some(name) = &metadata.name {
            labels.insert("org.opencontainers.image.title".to_string(), name.clone());
        }

        let mut env = BTreeMap::new();
        env.insert("PATH".to_string(), format!("{}/bin:{}", env_dir, SYSTEM_PATH));
        env.insert("VIRTUAL_ENV".to_string(), env_dir.clone());
        env.insert("PYTHONUNBUFFERED".to_string(), "1".to_string());
        env.insert("PYTHONDONTWRITEBYTECODE".to_string(), "1".to_string());
        env.insert("TZ".to_string(), self.config.timezone.clone());

        let scripts_source = format!("{}/", context_path(&self.config.scripts_dir)?);

        Ok(RuntimeStage {
            base: python_image.to_string(),
            labels,
            env,
            copy: vec![
                CopySpec::from_stage(INSTALLER_STAGE, env_dir.clone(), env_dir),
                CopySpec::from_context(scripts_source, format!("{}/", SCRIPTS_PATH)),
            ],
            executable: scripts
                .iter()
                .map(|name| format!("{}/{}", SCRIPTS_PATH, name))
                .collect(),
            user: ServiceAccount {
                name: self.config.user.clone(),
                uid: self.config.uid,
                shell: NOLOGIN_SHELL.to_string(),
            },
            workdir: APP_DIR.to_string(),
            ports: vec![self.config.port],
            command: vec![format!("{}/{}", SCRIPTS_PATH, self.config.entrypoint)],
        })
    }
}

/// Build-context relative path with forward slashes
fn context_path(path: &Path) -> Result<String, AssembleError> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().to_string()),
            Component::CurDir => {}
            _ => return Err(AssembleError::ScriptsOutsideContext(path.to_path_buf())),
        }
    }

    if parts.is_empty() {
        Ok(".".to_string())
    } else {
        Ok(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    fn project_fs() -> Arc<MockFileSystem> {
        let fs = MockFileSystem::new();
        fs.add_file("pyproject.toml", "[project]\nname = \"notes\"\n");
        fs.add_file("scripts/start.sh", "#!/bin/sh\nexec python -m app\n");
        fs.add_file("scripts/healthcheck.sh", "#!/bin/sh\n");
        Arc::new(fs)
    }

    fn metadata() -> ProjectMetadata {
        ProjectMetadata {
            name: Some("notes".to_string()),
            requires_python: Some(">=3.11".to_string()),
            dependencies: vec!["pydantic".to_string()],
            ..Default::default()
        }
    }

    fn manifest() -> Manifest {
        Manifest::new(vec!["pydantic".to_string()])
    }

    #[test]
    fn test_assemble_runtime_stage() {
        let assembler = RuntimeAssembler::new(project_fs(), PipboxConfig::default());
        let build = assembler
            .assemble(Path::new("/mock"), &metadata(), &manifest())
            .unwrap();

        let runtime = &build.runtime;
        assert_eq!(runtime.base, "python:3.11-slim");
        assert_eq!(runtime.user.name, "app");
        assert_eq!(runtime.user.uid, 10001);
        assert_eq!(runtime.user.shell, NOLOGIN_SHELL);
        assert_eq!(runtime.ports, vec![8000]);
        assert_eq!(runtime.command, vec!["/app/scripts/start.sh"]);
        assert_eq!(
            runtime.executable,
            vec!["/app/scripts/healthcheck.sh", "/app/scripts/start.sh"]
        );
        assert_eq!(
            runtime.copy,
            vec![
                CopySpec::from_stage("installer", "/opt/venv", "/opt/venv"),
                CopySpec::from_context("scripts/", "/app/scripts/"),
            ]
        );
        assert!(runtime.env["PATH"].starts_with("/opt/venv/bin:"));
        assert_eq!(runtime.env["TZ"], "UTC");
    }

    #[test]
    fn test_assemble_metadata() {
        let assembler = RuntimeAssembler::new(project_fs(), PipboxConfig::default());
        let build = assembler
            .assemble(Path::new("/mock"), &metadata(), &manifest())
            .unwrap();

        assert_eq!(build.metadata.project_name.as_deref(), Some("notes"));
        assert_eq!(build.metadata.python_version, "3.11");
        assert_eq!(build.metadata.dependencies, 1);
        assert_eq!(
            build.metadata.manifest_digest.as_deref(),
            Some(manifest().digest().as_str())
        );
        assert!(!build.metadata.dev);
    }

    #[test]
    fn test_resolver_and_installer_stages() {
        let config = PipboxConfig {
            dev: "TRUE".to_string(),
            ..Default::default()
        };
        let assembler = RuntimeAssembler::new(project_fs(), config);
        let build = assembler
            .assemble(Path::new("/mock"), &metadata(), &manifest())
            .unwrap();

        assert_eq!(build.resolver.base, "pipbox:latest");
        assert!(build.resolver.dev_default);
        assert_eq!(build.resolver.inputs, vec!["pyproject.toml"]);
        assert!(build.resolver.command.contains("--dev \"$DEV\""));

        assert_eq!(build.installer.base, "python:3.11-slim");
        assert_eq!(build.installer.commands.len(), 2);
        assert_eq!(build.installer.commands[0], "python3 -m venv /opt/venv");
    }

    #[test]
    fn test_uv_installer_bootstraps_uv() {
        let config = PipboxConfig {
            installer: InstallerKind::Uv,
            ..Default::default()
        };
        let assembler = RuntimeAssembler::new(project_fs(), config);
        let build = assembler
            .assemble(Path::new("/mock"), &metadata(), &manifest())
            .unwrap();

        assert_eq!(
            build.installer.commands[0],
            "python3 -m pip install --no-cache-dir uv"
        );
        assert!(build.installer.commands[1].starts_with("uv venv"));
    }

    #[test]
    fn test_python_image_override_and_default() {
        let config = PipboxConfig {
            python_image: Some("python:3.13-bookworm".to_string()),
            ..Default::default()
        };
        let assembler = RuntimeAssembler::new(project_fs(), config);
        let build = assembler
            .assemble(Path::new("/mock"), &metadata(), &manifest())
            .unwrap();
        assert_eq!(build.runtime.base, "python:3.13-bookworm");

        let assembler = RuntimeAssembler::new(project_fs(), PipboxConfig::default());
        let build = assembler
            .assemble(Path::new("/mock"), &ProjectMetadata::default(), &Manifest::default())
            .unwrap();
        assert_eq!(build.runtime.base, "python:3.12-slim");
        assert_eq!(build.installer.commands.len(), 2);
    }

    #[test]
    fn test_dev_only_project_still_installs_at_build_time() {
        let fs = MockFileSystem::new();
        fs.add_file(
            "pyproject.toml",
            "[project]\nname = \"tool\"\ndependencies = []\n\n[project.optional-dependencies]\ndev = [\"pytest\"]\n",
        );
        fs.add_file("scripts/start.sh", "#!/bin/sh\n");
        let metadata = ProjectMetadata {
            name: Some("tool".to_string()),
            optional_dependencies: [("dev".to_string(), vec!["pytest".to_string()])]
                .into_iter()
                .collect(),
            ..Default::default()
        };

        let assembler = RuntimeAssembler::new(Arc::new(fs), PipboxConfig::default());
        let build = assembler
            .assemble(Path::new("/mock"), &metadata, &Manifest::default())
            .unwrap();

        assert!(!build.resolver.dev_default);
        assert_eq!(
            build.installer.commands,
            vec![
                "python3 -m venv /opt/venv".to_string(),
                "if [ -s /tmp/requirements.txt ]; then /opt/venv/bin/pip install --no-cache-dir --disable-pip-version-check -r /tmp/requirements.txt; fi".to_string(),
            ]
        );
        assert!(!build.runtime.labels.contains_key("io.pipbox.manifest-digest"));

        let dockerfile = crate::output::dockerfile::render(&build);
        assert!(dockerfile.contains("ARG DEV=false"));
        assert!(dockerfile.contains("pip install"));
    }

    #[test]
    fn test_scripts_dir_outside_context_is_rejected() {
        for dir in ["../shared/scripts", "/srv/scripts", "scripts/../../x"] {
            let config = PipboxConfig {
                scripts_dir: dir.into(),
                ..Default::default()
            };
            let fs = project_fs();
            fs.add_file(Path::new("/mock").join(dir).join("start.sh"), "#!/bin/sh\n");
            let assembler = RuntimeAssembler::new(fs, config);

            let err = assembler
                .assemble(Path::new("/mock"), &metadata(), &manifest())
                .unwrap_err();
            assert!(
                matches!(err, AssembleError::ScriptsOutsideContext(_)),
                "{} was accepted",
                dir
            );
        }
    }

    #[test]
    fn test_missing_scripts_dir() {
        let fs = MockFileSystem::new();
        fs.add_file("pyproject.toml", "[project]\n");
        let assembler = RuntimeAssembler::new(Arc::new(fs), PipboxConfig::default());

        let err = assembler
            .assemble(Path::new("/mock"), &metadata(), &manifest())
            .unwrap_err();
        assert!(matches!(err, AssembleError::MissingScriptsDir(_)));
    }

    #[test]
    fn test_missing_entrypoint() {
        let config = PipboxConfig {
            entrypoint: "run.sh".to_string(),
            ..Default::default()
        };
        let assembler = RuntimeAssembler::new(project_fs(), config);

        let err = assembler
            .assemble(Path::new("/mock"), &metadata(), &manifest())
            .unwrap_err();
        assert!(matches!(err, AssembleError::MissingEntrypoint { ref name, .. } if name == "run.sh"));
    }

    #[test]
    fn test_context_path() {
        assert_eq!(context_path(Path::new("scripts")).unwrap(), "scripts");
        assert_eq!(
            context_path(Path::new("./deploy/scripts/")).unwrap(),
            "deploy/scripts"
        );
        assert_eq!(context_path(Path::new(".")).unwrap(), ".");
        assert!(context_path(Path::new("../scripts")).is_err());
        assert!(context_path(Path::new("/abs/scripts")).is_err());
    }
}
