use crate::fs::FileSystem;
use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Ordered list of requirement strings handed from the resolver to the installer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Manifest {
    requirements: Vec<String>,
}

impl Manifest {
    pub fn new(requirements: Vec<String>) -> Self {
        Self { requirements }
    }

    pub fn requirements(&self) -> &[String] {
        &self.requirements
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// One requirement per line
    pub fn render(&self) -> String {
        let mut out = String::new();
        for requirement in &self.requirements {
            out.push_str(requirement);
            out.push('\n');
        }
        out
    }

    /// Read a rendered manifest back; blank lines and `#` comments are skipped
    pub fn parse(content: &str) -> Self {
        let requirements = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(String::from)
            .collect();
        Self { requirements }
    }

    /// Content digest of the rendered manifest, `sha256:<hex>`
    pub fn digest(&self) -> String {
        let hash = Sha256::digest(self.render().as_bytes());
        format!("sha256:{}", hex::encode(hash))
    }

    pub fn write_to(&self, fs: &dyn FileSystem, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs.create_dir_all(parent)?;
        }
        fs.write(path, &self.render())
            .with_context(|| format!("Failed to write manifest {}", path.display()))
    }
}
