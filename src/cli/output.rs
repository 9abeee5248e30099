//! Output formatting for image plans and configuration

use anyhow::{bail, Context, Result};
use std::fmt::Write;

use crate::config::PipboxConfig;
use crate::output::dockerfile;
use crate::output::schema::ImageBuild;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    /// Short summary for terminals
    Human,
    /// Multi-stage Dockerfile
    Dockerfile,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self, build: &ImageBuild) -> Result<String> {
        match self.format {
            OutputFormat::Json => build.to_json(),
            OutputFormat::Yaml => build.to_yaml(),
            OutputFormat::Human => Ok(self.format_human(build)),
            OutputFormat::Dockerfile => Ok(dockerfile::render(build)),
        }
    }

    pub fn format_config(&self, config: &PipboxConfig) -> Result<String> {
        let config_map = config.to_display_map();
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&config_map)
                .context("Failed to serialize config to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(&config_map).context("Failed to serialize config to YAML")
            }
            OutputFormat::Human => Ok(config.to_string()),
            OutputFormat::Dockerfile => bail!("Configuration cannot be rendered as a Dockerfile"),
        }
    }

    fn format_human(&self, build: &ImageBuild) -> String {
        let mut out = String::new();
        let meta = &build.metadata;
        let runtime = &build.runtime;

        let _ = writeln!(
            out,
            "Project:      {}",
            meta.project_name.as_deref().unwrap_or("(unnamed)")
        );
        let _ = writeln!(out, "Python:       {} ({})", meta.python_version, runtime.base);
        let _ = writeln!(
            out,
            "Dependencies: {} (dev: {})",
            meta.dependencies, meta.dev
        );
        if let Some(digest) = &meta.manifest_digest {
            let _ = writeln!(out, "Manifest:     {}", digest);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Stages:");
        let _ = writeln!(
            out,
            "  {:<10} {} -> {}",
            build.resolver.name, build.resolver.base, build.resolver.manifest_path
        );
        let _ = writeln!(
            out,
            "  {:<10} {} ({} into {})",
            build.installer.name, build.installer.base, build.installer.installer, build.installer.env_dir
        );
        let _ = writeln!(out, "  {:<10} {}", "runtime", runtime.base);
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "User:         {} (uid {})",
            runtime.user.name, runtime.user.uid
        );
        let ports: Vec<String> = runtime.ports.iter().map(|p| p.to_string()).collect();
        let _ = writeln!(out, "Ports:        {}", ports.join(", "));
        let _ = write!(out, "Command:      {}", runtime.command.join(" "));
        out
    }
}
