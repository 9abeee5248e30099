use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::installer::InstallerKind;

/// Three-stage container builds for pyproject-based Python services
#[derive(Parser, Debug)]
#[command(
    name = "pipbox",
    about = "Three-stage container builds for pyproject-based Python services",
    version,
    long_about = "pipbox resolves the dependencies declared in pyproject.toml into a \
                  requirements manifest, installs them into an isolated environment and \
                  assembles a minimal runtime image that carries only that environment \
                  and the service's entrypoint scripts."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Resolve pyproject.toml into a requirements manifest",
        long_about = "Reads project.dependencies in declared order and, when the dev flag \
                      is \"true\" (any case), appends project.optional-dependencies.dev.\n\n\
                      Examples:\n  \
                      pipbox resolve\n  \
                      pipbox resolve pyproject.toml --dev true\n  \
                      pipbox resolve --output /tmp/requirements.txt"
    )]
    Resolve(ResolveArgs),

    #[command(
        about = "Install a requirements manifest into an isolated environment",
        long_about = "Creates a virtual environment and installs every requirement in the \
                      manifest. Any installer failure aborts with a non-zero exit status.\n\n\
                      Examples:\n  \
                      pipbox install requirements.txt\n  \
                      pipbox install requirements.txt --installer uv --env-dir /opt/venv"
    )]
    Install(InstallArgs),

    #[command(
        about = "Assemble the three-stage image plan for a project",
        long_about = "Validates the project layout and renders the resolver, installer and \
                      runtime stages.\n\n\
                      The resolver stage runs in PIPBOX_RESOLVER_IMAGE (default \
                      pipbox:latest). Build it first from the pipbox source tree with \
                      `docker build -t pipbox:latest .`\n\n\
                      Examples:\n  \
                      pipbox assemble\n  \
                      pipbox assemble /path/to/service --format dockerfile -o Dockerfile"
    )]
    Assemble(AssembleArgs),

    #[command(
        about = "Run the full pipeline: resolve, install, assemble and validate",
        long_about = "Writes the manifest into the work directory, materializes the \
                      environment (unless --skip-install) and emits the validated image plan.\n\n\
                      The resolver stage runs in PIPBOX_RESOLVER_IMAGE (default \
                      pipbox:latest). Build it first from the pipbox source tree with \
                      `docker build -t pipbox:latest .`\n\n\
                      Examples:\n  \
                      pipbox build\n  \
                      pipbox build /path/to/service --skip-install --format yaml"
    )]
    Build(BuildArgs),

    #[command(about = "Show the effective configuration")]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ResolveArgs {
    #[arg(
        value_name = "PYPROJECT",
        default_value = "pyproject.toml",
        help = "Path to the project metadata document"
    )]
    pub pyproject: PathBuf,

    #[arg(
        long,
        value_name = "VALUE",
        help = "Dev flag; only \"true\" (any case) includes the dev group [default: $PIPBOX_DEV]"
    )]
    pub dev: Option<String>,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write the manifest to a file instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct InstallArgs {
    #[arg(value_name = "MANIFEST", help = "Requirements manifest to install")]
    pub manifest: PathBuf,

    #[arg(long, value_name = "DIR", help = "Environment directory [default: $PIPBOX_ENV_DIR]")]
    pub env_dir: Option<PathBuf>,

    #[arg(long, value_enum, help = "Package installer [default: $PIPBOX_INSTALLER]")]
    pub installer: Option<InstallerArg>,

    #[arg(long, value_name = "BIN", help = "Python interpreter [default: $PIPBOX_PYTHON]")]
    pub python: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct AssembleArgs {
    #[arg(
        value_name = "PROJECT_DIR",
        help = "Project directory (defaults to current directory)"
    )]
    pub project_dir: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "dockerfile",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,

    #[arg(long, value_name = "VALUE", help = "Default for the DEV build argument")]
    pub dev: Option<String>,

    #[arg(long, value_name = "PORT", help = "Port exposed by the runtime image")]
    pub port: Option<u16>,

    #[arg(long, value_name = "NAME", help = "Entrypoint script inside the scripts directory")]
    pub entrypoint: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    #[arg(
        value_name = "PROJECT_DIR",
        help = "Project directory (defaults to current directory)"
    )]
    pub project_dir: Option<PathBuf>,

    #[arg(long, value_name = "DIR", help = "Environment directory [default: $PIPBOX_ENV_DIR]")]
    pub env_dir: Option<PathBuf>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Directory for the resolved manifest [default: PROJECT_DIR/.pipbox]"
    )]
    pub work_dir: Option<PathBuf>,

    #[arg(long, help = "Plan the image without installing dependencies locally")]
    pub skip_install: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,

    #[arg(long, value_name = "VALUE", help = "Dev flag [default: $PIPBOX_DEV]")]
    pub dev: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
    Dockerfile,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
            OutputFormatArg::Dockerfile => super::output::OutputFormat::Dockerfile,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallerArg {
    Pip,
    Uv,
}

impl From<InstallerArg> for InstallerKind {
    fn from(arg: InstallerArg) -> Self {
        match arg {
            InstallerArg::Pip => InstallerKind::Pip,
            InstallerArg::Uv => InstallerKind::Uv,
        }
    }
}
