use super::InstallerKind;
use std::fmt;
use std::path::Path;

/// A single external command: program plus arguments, no shell involved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@+,%".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Ordered installer steps for one manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    kind: InstallerKind,
    steps: Vec<CommandSpec>,
}

impl InstallPlan {
    /// `install_packages` is false for an empty manifest: the environment is
    /// still created but the installer is not invoked
    pub fn for_manifest(
        kind: InstallerKind,
        python: &str,
        manifest_path: &Path,
        env_dir: &Path,
        install_packages: bool,
    ) -> Self {
        let env = env_dir.display().to_string();
        let manifest = manifest_path.display().to_string();

        let mut steps = Vec::new();
        match kind {
            InstallerKind::Pip => {
                steps.push(CommandSpec::new(python, ["-m", "venv", env.as_str()]));
                if install_packages {
                    steps.push(CommandSpec::new(
                        format!("{}/bin/pip", env),
                        [
                            "install",
                            "--no-cache-dir",
                            "--disable-pip-version-check",
                            "-r",
                            manifest.as_str(),
                        ],
                    ));
                }
            }
            InstallerKind::Uv => {
                steps.push(CommandSpec::new(
                    "uv",
                    ["venv", "--python", python, env.as_str()],
                ));
                if install_packages {
                    let env_python = format!("{}/bin/python", env);
                    steps.push(CommandSpec::new(
                        "uv",
                        [
                            "pip",
                            "install",
                            "--python",
                            env_python.as_str(),
                            "--no-cache",
                            "-r",
                            manifest.as_str(),
                        ],
                    ));
                }
            }
        }

        Self { kind, steps }
    }

    pub fn kind(&self) -> InstallerKind {
        self.kind
    }

    pub fn steps(&self) -> &[CommandSpec] {
        &self.steps
    }

    /// The plan as shell lines, for a `RUN` instruction
    pub fn shell_commands(&self) -> Vec<String> {
        self.steps.iter().map(ToString::to_string).collect()
    }
}
