//! Dependency resolver stage
//!
//! Reads `pyproject.toml`, takes `project.dependencies` in declared order and,
//! when the dev flag is enabled, appends `project.optional-dependencies.dev`.
//! The result is a [`Manifest`] that the installer stage consumes.

mod manifest;
mod project;

pub use manifest::Manifest;
pub use project::ProjectMetadata;

use crate::error::ResolveError;
use crate::fs::FileSystem;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Name of the project metadata document
pub const METADATA_FILE: &str = "pyproject.toml";

/// Optional-dependency group controlled by the dev flag
pub const DEV_GROUP: &str = "dev";

/// Build-time toggle for the `dev` dependency group.
///
/// The raw value is string-typed (a build argument); only a case-insensitive
/// `"true"` enables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DevFlag(bool);

impl DevFlag {
    pub fn parse(value: &str) -> Self {
        Self(value.eq_ignore_ascii_case("true"))
    }

    pub fn enabled(self) -> bool {
        self.0
    }
}

impl From<bool> for DevFlag {
    fn from(value: bool) -> Self {
        Self(value)
    }
}

impl fmt::Display for DevFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub struct DependencyResolver {
    fs: Arc<dyn FileSystem>,
}

impl DependencyResolver {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Load and validate the metadata document at `path`
    pub fn load(&self, path: &Path) -> Result<ProjectMetadata, ResolveError> {
        if !self.fs.is_file(path) {
            return Err(ResolveError::MetadataNotFound(path.to_path_buf()));
        }

        let content = self
            .fs
            .read_to_string(path)
            .map_err(|e| ResolveError::Unreadable {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let metadata = ProjectMetadata::parse(&content, path)?;
        debug!(
            path = %path.display(),
            dependencies = metadata.dependencies.len(),
            groups = metadata.optional_dependencies.len(),
            "Parsed project metadata"
        );
        Ok(metadata)
    }

    /// Resolve the manifest for the metadata document at `path`
    pub fn resolve(&self, path: &Path, dev: DevFlag) -> Result<Manifest, ResolveError> {
        let metadata = self.load(path)?;
        let manifest = Self::manifest_for(&metadata, dev);
        info!(
            path = %path.display(),
            dev = %dev,
            requirements = manifest.len(),
            "Resolved dependency manifest"
        );
        Ok(manifest)
    }

    /// Build the manifest from already-parsed metadata
    pub fn manifest_for(metadata: &ProjectMetadata, dev: DevFlag) -> Manifest {
        let mut requirements = metadata.dependencies.clone();

        if dev.enabled() {
            match metadata.optional_dependencies.get(DEV_GROUP) {
                Some(group) => requirements.extend(group.iter().cloned()),
                None => debug!("Dev flag set but no '{}' group declared", DEV_GROUP),
            }
        }

        Manifest::new(requirements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use std::path::PathBuf;
    use yare::parameterized;

    const WITH_DEV: &str = r#"
[project]
name = "svc"
dependencies = ["a", "b"]

[project.optional-dependencies]
dev = ["c"]
"#;

    const WITHOUT_DEV: &str = r#"
[project]
name = "svc"
dependencies = ["a", "b"]
"#;

    fn resolver_with(content: &str) -> (DependencyResolver, PathBuf) {
        let fs = MockFileSystem::new();
        fs.add_file(METADATA_FILE, content);
        let path = fs.root().join(METADATA_FILE);
        (DependencyResolver::new(Arc::new(fs)), path)
    }

    #[parameterized(
        lower = { "true" },
        title = { "True" },
        upper = { "TRUE" },
        mixed = { "tRuE" },
    )]
    fn test_dev_flag_truthy(value: &str) {
        assert!(DevFlag::parse(value).enabled());
    }

    #[parameterized(
        false_word = { "false" },
        empty = { "" },
        no = { "no" },
        one = { "1" },
        yes = { "yes" },
        padded = { " true" },
    )]
    fn test_dev_flag_falsy(value: &str) {
        assert!(!DevFlag::parse(value).enabled());
    }

    #[test]
    fn test_dev_flag_default_is_disabled() {
        assert!(!DevFlag::default().enabled());
        assert_eq!(DevFlag::default().to_string(), "false");
    }

    #[test]
    fn test_resolve_without_dev_group_flag_off() {
        let (resolver, path) = resolver_with(WITHOUT_DEV);
        let manifest = resolver.resolve(&path, DevFlag::parse("false")).unwrap();
        assert_eq!(manifest.requirements(), ["a", "b"]);
    }

    #[test]
    fn test_resolve_without_dev_group_flag_on() {
        let (resolver, path) = resolver_with(WITHOUT_DEV);
        let manifest = resolver.resolve(&path, DevFlag::parse("true")).unwrap();
        assert_eq!(manifest.requirements(), ["a", "b"]);
    }

    #[parameterized(
        lower = { "true" },
        title = { "True" },
        upper = { "TRUE" },
    )]
    fn test_resolve_appends_dev_group(flag: &str) {
        let (resolver, path) = resolver_with(WITH_DEV);
        let manifest = resolver.resolve(&path, DevFlag::parse(flag)).unwrap();
        assert_eq!(manifest.requirements(), ["a", "b", "c"]);
    }

    #[parameterized(
        false_word = { "false" },
        empty = { "" },
        no = { "no" },
    )]
    fn test_resolve_excludes_dev_group(flag: &str) {
        let (resolver, path) = resolver_with(WITH_DEV);
        let manifest = resolver.resolve(&path, DevFlag::parse(flag)).unwrap();
        assert_eq!(manifest.requirements(), ["a", "b"]);
    }

    #[test]
    fn test_resolve_fails_without_project_table() {
        let (resolver, path) = resolver_with("[tool.black]\nline-length = 100\n");
        let err = resolver.resolve(&path, DevFlag::default()).unwrap_err();
        assert!(matches!(err, ResolveError::MissingProjectTable(_)));
    }

    #[test]
    fn test_resolve_fails_on_missing_file() {
        let fs = MockFileSystem::new();
        let resolver = DependencyResolver::new(Arc::new(fs));
        let err = resolver
            .resolve(Path::new("/mock/pyproject.toml"), DevFlag::default())
            .unwrap_err();
        assert!(matches!(err, ResolveError::MetadataNotFound(_)));
    }

    #[test]
    fn test_resolve_fails_on_malformed_toml() {
        let (resolver, path) = resolver_with("[project\ndependencies = [");
        let err = resolver.resolve(&path, DevFlag::default()).unwrap_err();
        assert!(matches!(err, ResolveError::Malformed { .. }));
    }

    #[test]
    fn test_resolve_keeps_declared_order_and_duplicates() {
        let (resolver, path) = resolver_with(
            r#"
[project]
dependencies = ["uvicorn>=0.30", "fastapi", "pydantic-settings"]

[project.optional-dependencies]
dev = ["pytest", "fastapi"]
lint = ["ruff"]
"#,
        );
        let manifest = resolver.resolve(&path, DevFlag::from(true)).unwrap();
        assert_eq!(
            manifest.requirements(),
            ["uvicorn>=0.30", "fastapi", "pydantic-settings", "pytest", "fastapi"]
        );
    }
}
