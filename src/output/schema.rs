use crate::installer::InstallerKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_null_default_version<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_else(default_version))
}

fn default_version() -> String {
    "1.0".to_string()
}

/// A three-stage image: resolver, installer, runtime
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageBuild {
    #[serde(
        default = "default_version",
        deserialize_with = "deserialize_null_default_version"
    )]
    pub version: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub metadata: BuildMetadata,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub resolver: ResolverStage,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub installer: InstallerStage,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub runtime: RuntimeStage,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BuildMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub python_version: String,
    #[serde(default)]
    pub dev: bool,
    #[serde(default)]
    pub dependencies: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_digest: Option<String>,
}

/// Reads the metadata document and writes the manifest
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ResolverStage {
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub base: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub workdir: String,
    /// Build-context files copied into the stage
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub inputs: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub dev_arg: String,
    #[serde(default)]
    pub dev_default: bool,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub manifest_path: String,
    /// Shell form, so the dev build argument expands
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub command: String,
}

/// Populates the isolated environment from the manifest
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct InstallerStage {
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub base: String,
    #[serde(default)]
    pub installer: InstallerKind,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub env_dir: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub copy: Vec<CopySpec>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub commands: Vec<String>,
}

/// Final image: environment and scripts only
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RuntimeStage {
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub base: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub env: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub copy: Vec<CopySpec>,
    /// Paths marked executable after copying
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub executable: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub user: ServiceAccount,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub workdir: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub ports: Vec<u16>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CopySpec {
    /// Source stage; `None` copies from the build context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub from: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub to: String,
}

impl CopySpec {
    pub fn from_context(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            stage: None,
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn from_stage(
        stage: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            stage: Some(stage.into()),
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Dedicated non-login account the runtime process runs as
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ServiceAccount {
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub name: String,
    #[serde(default)]
    pub uid: u32,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub shell: String,
}

impl fmt::Display for ImageBuild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_yaml() {
            Ok(yaml) => write!(f, "{}", yaml),
            Err(e) => write!(f, "Error formatting ImageBuild: {}", e),
        }
    }
}

impl ImageBuild {
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize ImageBuild to YAML")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize ImageBuild to JSON")
    }
}
