use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failures of the dependency resolver stage
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Project metadata not found: {}", .0.display())]
    MetadataNotFound(PathBuf),

    #[error("Failed to read project metadata {}: {message}", .path.display())]
    Unreadable { path: PathBuf, message: String },

    #[error("Malformed project metadata {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Project metadata {} has no [project] table", .0.display())]
    MissingProjectTable(PathBuf),

    #[error("Invalid field '{field}': expected {expected}")]
    InvalidField {
        field: String,
        expected: &'static str,
    },

    #[error("Invalid requirement at {field}[{index}]: '{value}'")]
    InvalidRequirement {
        field: String,
        index: usize,
        value: String,
    },
}

/// Failures of the installer stage
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Manifest not found: {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("Failed to read manifest {}: {message}", .path.display())]
    Unreadable { path: PathBuf, message: String },

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {}: {stderr}", exit_label(.code))]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("'{program}' timed out after {limit:?}")]
    Timeout { program: String, limit: Duration },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Failures of the runtime assembly stage
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("Scripts directory not found: {}", .0.display())]
    MissingScriptsDir(PathBuf),

    #[error("Entrypoint script '{name}' not found in {}", .dir.display())]
    MissingEntrypoint { name: String, dir: PathBuf },

    #[error("Scripts directory {} is outside the build context", .0.display())]
    ScriptsOutsideContext(PathBuf),
}
