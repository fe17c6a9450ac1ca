//! These structs provide the CLI interface for the fincoach CLI.

use crate::model::Period;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// fincoach: A command-line client for your personal finance coach.
///
/// Upload a transaction export (CSV, XLSX or JSON), look at the analytics the coach computes from
/// it, and ask the coach for budgeting advice. The coach itself is a server that you point this
/// program at with `fincoach init --base-url`.
///
/// Use `fincoach shell` for an interactive session that keeps the upload, the dashboard and the
/// conversation in one place.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and the configuration file.
    ///
    /// This is the first command you should run. By default the data directory is
    /// $HOME/fincoach; pass --fincoach-home or set FINCOACH_HOME to put it somewhere else.
    Init(InitArgs),
    /// Check that the finance coach server is reachable.
    Health,
    /// Upload a transaction file (.csv, .xlsx or .json).
    Upload(UploadArgs),
    /// Show the analytics dashboard for a period.
    Dashboard(DashboardArgs),
    /// Ask the finance coach a single question.
    Chat(ChatArgs),
    /// Start an interactive session.
    Shell,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG. See the tracing-subscriber crate for instructions.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where fincoach configuration is held. Defaults to ~/fincoach
    #[arg(long, env = "FINCOACH_HOME", default_value_t = default_fincoach_home())]
    fincoach_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, fincoach_home: PathBuf) -> Self {
        Self {
            log_level,
            fincoach_home: fincoach_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn fincoach_home(&self) -> &DisplayPath {
        &self.fincoach_home
    }
}

/// (Not shown): Args for the `fincoach init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The root URL of the finance coach server.
    #[arg(long, default_value = crate::config::DEFAULT_BASE_URL)]
    base_url: String,
}

impl InitArgs {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// (Not shown): Args for the `fincoach upload` command.
#[derive(Debug, Parser, Clone)]
pub struct UploadArgs {
    /// The transaction export to upload.
    file: PathBuf,
}

impl UploadArgs {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

/// (Not shown): Args for the `fincoach dashboard` command.
#[derive(Debug, Parser, Clone)]
pub struct DashboardArgs {
    /// The time window: 7d, 30d, 90d or 1y.
    #[arg(long, default_value_t = Period::default())]
    period: Period,
}

impl DashboardArgs {
    pub fn new(period: Period) -> Self {
        Self { period }
    }

    pub fn period(&self) -> Period {
        self.period
    }
}

/// (Not shown): Args for the `fincoach chat` command.
#[derive(Debug, Parser, Clone)]
pub struct ChatArgs {
    /// The question for the coach.
    #[arg(required = true, num_args = 1..)]
    message: Vec<String>,
}

impl ChatArgs {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: vec![message.into()],
        }
    }

    /// The words of the message joined by spaces, so that quoting is optional.
    pub fn message(&self) -> String {
        self.message.join(" ")
    }
}

fn default_fincoach_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("fincoach"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --fincoach-home or FINCOACH_HOME instead of relying on the \
                default fincoach home directory. If you continue using the program right now, you \
                may have problems!",
            );
            PathBuf::from("fincoach")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
