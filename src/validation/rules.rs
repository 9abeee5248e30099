use crate::assemble::{RESOLVER_STAGE, SCRIPTS_PATH};
use crate::config::is_account_name;
use crate::output::schema::ImageBuild;
use crate::resolver::METADATA_FILE;
use anyhow::Result;

const NON_LOGIN_SHELLS: &[&str] = &["/usr/sbin/nologin", "/sbin/nologin", "/bin/false"];

pub trait ValidationRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn validate(&self, build: &ImageBuild) -> Result<()>;
}

pub struct RequiredFieldsRule;

impl ValidationRule for RequiredFieldsRule {
    fn name(&self) -> &'static str {
        "RequiredFields"
    }

    fn validate(&self, build: &ImageBuild) -> Result<()> {
        if build.version.is_empty() {
            anyhow::bail!("Version cannot be empty");
        }
        if build.resolver.base.is_empty() {
            anyhow::bail!("Resolver base image cannot be empty");
        }
        if build.installer.base.is_empty() {
            anyhow::bail!("Installer base image cannot be empty");
        }
        if build.runtime.base.is_empty() {
            anyhow::bail!("Runtime base image cannot be empty");
        }
        if build.installer.env_dir.is_empty() {
            anyhow::bail!("Installer environment directory cannot be empty");
        }
        Ok(())
    }
}

/// The runtime image must not carry the resolver tooling, the metadata
/// document, or the manifest
pub struct RuntimeExcludesResolverRule;

impl ValidationRule for RuntimeExcludesResolverRule {
    fn name(&self) -> &'static str {
        "RuntimeExcludesResolver"
    }

    fn validate(&self, build: &ImageBuild) -> Result<()> {
        if build.runtime.base == build.resolver.base {
            anyhow::bail!(
                "Runtime base image '{}' is the resolver image",
                build.runtime.base
            );
        }

        let resolver_name = if build.resolver.name.is_empty() {
            RESOLVER_STAGE
        } else {
            build.resolver.name.as_str()
        };

        for (i, copy) in build.runtime.copy.iter().enumerate() {
            if copy.stage.as_deref() == Some(resolver_name) {
                anyhow::bail!("Runtime copy[{}] pulls from the resolver stage", i);
            }

            let source = copy.from.trim_end_matches('/');
            let file_name = source.rsplit('/').next().unwrap_or(source);
            if file_name == METADATA_FILE {
                anyhow::bail!("Runtime copy[{}] includes {}", i, METADATA_FILE);
            }
            if !build.resolver.manifest_path.is_empty() && source == build.resolver.manifest_path {
                anyhow::bail!("Runtime copy[{}] includes the dependency manifest", i);
            }
            if copy.stage.is_none() && (source == "." || source.is_empty()) {
                anyhow::bail!("Runtime copy[{}] copies the whole build context", i);
            }
        }
        Ok(())
    }
}

pub struct NonRootUserRule;

impl ValidationRule for NonRootUserRule {
    fn name(&self) -> &'static str {
        "NonRootUser"
    }

    fn validate(&self, build: &ImageBuild) -> Result<()> {
        let user = &build.runtime.user;
        if user.name.is_empty() {
            anyhow::bail!("Runtime user cannot be empty");
        }
        if user.name == "root" || user.uid == 0 {
            anyhow::bail!("Runtime cannot run as root");
        }
        if !is_account_name(&user.name) {
            anyhow::bail!("Runtime user '{}' is not a valid account name", user.name);
        }
        if !NON_LOGIN_SHELLS.contains(&user.shell.as_str()) {
            anyhow::bail!(
                "Runtime user '{}' must have a non-login shell, got '{}'",
                user.name,
                user.shell
            );
        }
        Ok(())
    }
}

pub struct ValidCopySpecsRule;

impl ValidationRule for ValidCopySpecsRule {
    fn name(&self) -> &'static str {
        "ValidCopySpecs"
    }

    fn validate(&self, build: &ImageBuild) -> Result<()> {
        let stages = [&build.installer.copy, &build.runtime.copy];
        for copies in stages {
            for (i, copy_spec) in copies.iter().enumerate() {
                if copy_spec.from.is_empty() {
                    anyhow::bail!("Copy[{}] 'from' path cannot be empty", i);
                }
                if copy_spec.to.is_empty() {
                    anyhow::bail!("Copy[{}] 'to' path cannot be empty", i);
                }
            }
        }

        let copies_env = build.runtime.copy.iter().any(|c| {
            c.stage.as_deref() == Some(build.installer.name.as_str())
                && c.from == build.installer.env_dir
        });
        if !copies_env {
            anyhow::bail!(
                "Runtime must copy the environment {} from the installer stage",
                build.installer.env_dir
            );
        }
        Ok(())
    }
}

pub struct NonEmptyCommandRule;

impl ValidationRule for NonEmptyCommandRule {
    fn name(&self) -> &'static str {
        "NonEmptyCommand"
    }

    fn validate(&self, build: &ImageBuild) -> Result<()> {
        let Some(program) = build.runtime.command.first() else {
            anyhow::bail!("Runtime command cannot be empty");
        };
        if !program.starts_with(&format!("{}/", SCRIPTS_PATH)) {
            anyhow::bail!(
                "Runtime command '{}' must invoke a script under {}",
                program,
                SCRIPTS_PATH
            );
        }
        if build.installer.commands.is_empty() {
            anyhow::bail!("Installer commands cannot be empty");
        }
        Ok(())
    }
}

pub struct ValidPortsRule;

impl ValidationRule for ValidPortsRule {
    fn name(&self) -> &'static str {
        "ValidPorts"
    }

    fn validate(&self, build: &ImageBuild) -> Result<()> {
        match build.runtime.ports.as_slice() {
            [0] => anyhow::bail!("Port cannot be 0"),
            [_] => Ok(()),
            ports => anyhow::bail!("Expected exactly one port, got {}", ports.len()),
        }
    }
}
