use crate::output::schema::ImageBuild;
use crate::validation::rules::{
    NonEmptyCommandRule, NonRootUserRule, RequiredFieldsRule, RuntimeExcludesResolverRule,
    ValidCopySpecsRule, ValidPortsRule, ValidationRule,
};
use anyhow::Result;

pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<Box<dyn ValidationRule>>) -> Self {
        Self { rules }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn validate(&self, build: &ImageBuild) -> Result<()> {
        for rule in &self.rules {
            if let Err(e) = rule.validate(build) {
                anyhow::bail!("[{}] {}", rule.name(), e);
            }
        }
        Ok(())
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            rules: vec![
                Box::new(RequiredFieldsRule),
                Box::new(RuntimeExcludesResolverRule),
                Box::new(NonRootUserRule),
                Box::new(ValidCopySpecsRule),
                Box::new(NonEmptyCommandRule),
                Box::new(ValidPortsRule),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::RuntimeAssembler;
    use crate::config::PipboxConfig;
    use crate::fs::MockFileSystem;
    use crate::output::schema::CopySpec;
    use crate::resolver::{Manifest, ProjectMetadata};
    use std::path::Path;
    use std::sync::Arc;

    fn create_valid_build() -> ImageBuild {
        let fs = MockFileSystem::new();
        fs.add_file("scripts/start.sh", "#!/bin/sh\n");
        RuntimeAssembler::new(Arc::new(fs), PipboxConfig::default())
            .assemble(
                Path::new("/mock"),
                &ProjectMetadata::default(),
                &Manifest::new(vec!["a".to_string()]),
            )
            .unwrap()
    }

    fn assert_rejected(build: &ImageBuild, rule: &str) {
        let err = Validator::new().validate(build).unwrap_err();
        assert!(
            err.to_string().starts_with(&format!("[{}]", rule)),
            "unexpected error: {}",
            err
        );
    }

    #[test]
    fn test_assembled_build_is_valid() {
        assert!(Validator::new().validate(&create_valid_build()).is_ok());
    }

    #[test]
    fn test_empty_base_rejected() {
        let mut build = create_valid_build();
        build.runtime.base = String::new();
        assert_rejected(&build, "RequiredFields");
    }

    #[test]
    fn test_copy_from_resolver_stage_rejected() {
        let mut build = create_valid_build();
        build.runtime.copy.push(CopySpec::from_stage(
            "resolver",
            "/usr/local/bin/pipbox",
            "/usr/local/bin/pipbox",
        ));
        assert_rejected(&build, "RuntimeExcludesResolver");
    }

    #[test]
    fn test_metadata_file_in_runtime_rejected() {
        let mut build = create_valid_build();
        build
            .runtime
            .copy
            .push(CopySpec::from_context("pyproject.toml", "/app/"));
        assert_rejected(&build, "RuntimeExcludesResolver");
    }

    #[test]
    fn test_manifest_in_runtime_rejected() {
        let mut build = create_valid_build();
        build.runtime.copy.push(CopySpec::from_stage(
            "installer",
            "/tmp/requirements.txt",
            "/tmp/requirements.txt",
        ));
        assert_rejected(&build, "RuntimeExcludesResolver");
    }

    #[test]
    fn test_whole_context_copy_rejected() {
        let mut build = create_valid_build();
        build.runtime.copy.push(CopySpec::from_context(".", "/app"));
        assert_rejected(&build, "RuntimeExcludesResolver");
    }

    #[test]
    fn test_runtime_on_resolver_image_rejected() {
        let mut build = create_valid_build();
        build.runtime.base = build.resolver.base.clone();
        assert_rejected(&build, "RuntimeExcludesResolver");
    }

    #[test]
    fn test_root_user_rejected() {
        let mut build = create_valid_build();
        build.runtime.user.name = "root".to_string();
        assert_rejected(&build, "NonRootUser");

        let mut build = create_valid_build();
        build.runtime.user.uid = 0;
        assert_rejected(&build, "NonRootUser");
    }

    #[test]
    fn test_malformed_account_name_rejected() {
        let mut build = create_valid_build();
        build.runtime.user.name = "app x".to_string();
        assert_rejected(&build, "NonRootUser");
    }

    #[test]
    fn test_login_shell_rejected() {
        let mut build = create_valid_build();
        build.runtime.user.shell = "/bin/bash".to_string();
        assert_rejected(&build, "NonRootUser");
    }

    #[test]
    fn test_missing_env_copy_rejected() {
        let mut build = create_valid_build();
        build.runtime.copy.retain(|c| c.stage.is_none());
        assert_rejected(&build, "ValidCopySpecs");
    }

    #[test]
    fn test_command_outside_scripts_rejected() {
        let mut build = create_valid_build();
        build.runtime.command = vec!["python".to_string(), "-m".to_string(), "app".to_string()];
        assert_rejected(&build, "NonEmptyCommand");
    }

    #[test]
    fn test_ports() {
        let mut build = create_valid_build();
        build.runtime.ports = vec![0];
        assert_rejected(&build, "ValidPorts");

        build.runtime.ports = vec![8000, 8001];
        assert_rejected(&build, "ValidPorts");
    }

    #[test]
    fn test_with_custom_rules() {
        let validator = Validator::with_rules(vec![Box::new(ValidPortsRule)]);
        assert_eq!(validator.rule_count(), 1);
        let mut build = create_valid_build();
        build.runtime.user.name = "root".to_string();
        assert!(validator.validate(&build).is_ok());
    }
}
