use crate::installer::InstallerKind;
use crate::resolver::DevFlag;
use std::collections::BTreeMap;
use std::env;
use regex::Regex;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_DEV: &str = "false";
const DEFAULT_RESOLVER_IMAGE: &str = "pipbox:latest";
const DEFAULT_PYTHON: &str = "python3";
const DEFAULT_ENV_DIR: &str = "/opt/venv";
const DEFAULT_SCRIPTS_DIR: &str = "scripts";
const DEFAULT_ENTRYPOINT: &str = "start.sh";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_USER: &str = "app";
const DEFAULT_UID: u32 = 10001;
const DEFAULT_TIMEZONE: &str = "UTC";
const DEFAULT_INSTALL_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid installer: {0}. Valid options: pip, uv")]
    InvalidInstaller(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

#[derive(Debug, Clone)]
pub struct PipboxConfig {
    pub log_level: String,
    /// Raw dev flag value, interpreted by [`DevFlag::parse`]
    pub dev: String,
    /// Explicit runtime/installer base image; derived from `requires-python` when unset
    pub python_image: Option<String>,
    pub resolver_image: String,
    pub installer: InstallerKind,
    pub python: String,
    pub env_dir: PathBuf,
    pub scripts_dir: PathBuf,
    pub entrypoint: String,
    pub port: u16,
    pub user: String,
    pub uid: u32,
    pub timezone: String,
    pub install_timeout_secs: u64,
}

impl Default for PipboxConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            dev: DEFAULT_DEV.to_string(),
            python_image: None,
            resolver_image: DEFAULT_RESOLVER_IMAGE.to_string(),
            installer: InstallerKind::Pip,
            python: DEFAULT_PYTHON.to_string(),
            env_dir: PathBuf::from(DEFAULT_ENV_DIR),
            scripts_dir: PathBuf::from(DEFAULT_SCRIPTS_DIR),
            entrypoint: DEFAULT_ENTRYPOINT.to_string(),
            port: DEFAULT_PORT,
            user: DEFAULT_USER.to_string(),
            uid: DEFAULT_UID,
            timezone: DEFAULT_TIMEZONE.to_string(),
            install_timeout_secs: DEFAULT_INSTALL_TIMEOUT_SECS,
        }
    }
}

impl PipboxConfig {
    /// Defaults overlaid with `PIPBOX_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let installer = match env::var("PIPBOX_INSTALLER") {
            Ok(value) => value.parse::<InstallerKind>()?,
            Err(_) => defaults.installer,
        };

        Ok(Self {
            log_level: env::var("PIPBOX_LOG_LEVEL")
                .unwrap_or(defaults.log_level)
                .to_lowercase(),
            dev: env::var("PIPBOX_DEV").unwrap_or(defaults.dev),
            python_image: env::var("PIPBOX_PYTHON_IMAGE")
                .ok()
                .filter(|v| !v.is_empty()),
            resolver_image: env::var("PIPBOX_RESOLVER_IMAGE").unwrap_or(defaults.resolver_image),
            installer,
            python: env::var("PIPBOX_PYTHON").unwrap_or(defaults.python),
            env_dir: env::var("PIPBOX_ENV_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.env_dir),
            scripts_dir: env::var("PIPBOX_SCRIPTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.scripts_dir),
            entrypoint: env::var("PIPBOX_ENTRYPOINT").unwrap_or(defaults.entrypoint),
            port: parse_var("PIPBOX_PORT", defaults.port)?,
            user: env::var("PIPBOX_USER").unwrap_or(defaults.user),
            uid: parse_var("PIPBOX_UID", defaults.uid)?,
            timezone: env::var("PIPBOX_TZ").unwrap_or(defaults.timezone),
            install_timeout_secs: parse_var("PIPBOX_INSTALL_TIMEOUT", defaults.install_timeout_secs)?,
        })
    }

    pub fn dev_flag(&self) -> DevFlag {
        DevFlag::parse(&self.dev)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        if self.port == 0 {
            return Err(ConfigError::ValidationFailed(
                "Port must be between 1 and 65535".to_string(),
            ));
        }

        if self.user.is_empty() || self.user == "root" {
            return Err(ConfigError::ValidationFailed(
                "Service account must be a non-root user".to_string(),
            ));
        }
        if !is_account_name(&self.user) {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid service account name '{}': expected lowercase letters, digits, '_' or '-', not starting with a digit or '-'",
                self.user
            )));
        }
        if self.uid == 0 {
            return Err(ConfigError::ValidationFailed(
                "Service account uid cannot be 0".to_string(),
            ));
        }

        if self.entrypoint.is_empty() || self.entrypoint.contains('/') {
            return Err(ConfigError::ValidationFailed(format!(
                "Entrypoint must be a script name inside the scripts directory, got '{}'",
                self.entrypoint
            )));
        }

        if !self.env_dir.is_absolute() {
            return Err(ConfigError::ValidationFailed(format!(
                "Environment directory must be absolute, got {}",
                self.env_dir.display()
            )));
        }
        if has_whitespace(&self.env_dir) {
            return Err(ConfigError::ValidationFailed(format!(
                "Environment directory cannot contain whitespace, got '{}'",
                self.env_dir.display()
            )));
        }

        let escapes_project = self
            .scripts_dir
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes_project {
            return Err(ConfigError::ValidationFailed(format!(
                "Scripts directory must be relative to the project without '..', got {}",
                self.scripts_dir.display()
            )));
        }
        if has_whitespace(&self.scripts_dir) {
            return Err(ConfigError::ValidationFailed(format!(
                "Scripts directory cannot contain whitespace, got '{}'",
                self.scripts_dir.display()
            )));
        }

        if self.resolver_image.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Resolver image cannot be empty".to_string(),
            ));
        }

        if self.install_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Install timeout must be at least 1 second".to_string(),
            ));
        }
        if self.install_timeout_secs > 7200 {
            return Err(ConfigError::ValidationFailed(
                "Install timeout cannot exceed 2 hours".to_string(),
            ));
        }

        Ok(())
    }

    pub fn to_display_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();

        map.insert("log_level".to_string(), self.log_level.clone());
        map.insert("dev".to_string(), self.dev_flag().to_string());
        map.insert(
            "python_image".to_string(),
            self.python_image
                .clone()
                .unwrap_or_else(|| "(derived from requires-python)".to_string()),
        );
        map.insert("resolver_image".to_string(), self.resolver_image.clone());
        map.insert("installer".to_string(), self.installer.to_string());
        map.insert("python".to_string(), self.python.clone());
        map.insert("env_dir".to_string(), self.env_dir.display().to_string());
        map.insert(
            "scripts_dir".to_string(),
            self.scripts_dir.display().to_string(),
        );
        map.insert("entrypoint".to_string(), self.entrypoint.clone());
        map.insert("port".to_string(), self.port.to_string());
        map.insert("user".to_string(), self.user.clone());
        map.insert("uid".to_string(), self.uid.to_string());
        map.insert("timezone".to_string(), self.timezone.clone());
        map.insert(
            "install_timeout_secs".to_string(),
            self.install_timeout_secs.to_string(),
        );

        map
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match env::var(name) {
        Ok(value) => value.parse::<T>().map_err(|e| ConfigError::ParseError {
            field: name.to_string(),
            error: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

impl fmt::Display for PipboxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipbox Configuration:")?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(f, "  Dev Dependencies: {}", self.dev_flag())?;
        match &self.python_image {
            Some(image) => writeln!(f, "  Python Image: {}", image)?,
            None => writeln!(f, "  Python Image: (derived from requires-python)")?,
        }
        writeln!(f, "  Resolver Image: {}", self.resolver_image)?;
        writeln!(f, "  Installer: {}", self.installer)?;
        writeln!(f, "  Python: {}", self.python)?;
        writeln!(f, "  Environment Dir: {}", self.env_dir.display())?;
        writeln!(f, "  Scripts Dir: {}", self.scripts_dir.display())?;
        writeln!(f, "  Entrypoint: {}", self.entrypoint)?;
        writeln!(f, "  Port: {}", self.port)?;
        writeln!(f, "  User: {} (uid {})", self.user, self.uid)?;
        writeln!(f, "  Timezone: {}", self.timezone)?;
        writeln!(f, "  Install Timeout: {}s", self.install_timeout_secs)?;
        Ok(())
    }
}

/// POSIX-portable account name accepted by `useradd`
pub fn is_account_name(name: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern =
        PATTERN.get_or_init(|| Regex::new(r"^[a-z_][a-z0-9_-]{0,31}$").expect("valid regex"));
    pattern.is_match(name)
}

fn has_whitespace(path: &Path) -> bool {
    path.to_string_lossy().chars().any(char::is_whitespace)
}
