//! Configuration file handling for fincoach.
//!
//! The configuration file is stored at `$FINCOACH_HOME/config.json` and holds the address of the
//! finance coach server that this client talks to.

use crate::error::{ErrorType, IntoResult, Res};
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const APP_NAME: &str = "fincoach";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";

/// The server address used when `init` is not given one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$FINCOACH_HOME` and from there it loads `$FINCOACH_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    base_url: Url,
}

impl Config {
    /// Creates the data directory and an initial `config.json` pointing at `base_url`.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of data directory, e.g. `$HOME/fincoach`
    /// - `base_url` - The root URL of the finance coach server, e.g. `http://localhost:8000`
    ///
    /// # Errors
    /// - Returns an error if the URL is invalid or any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>, base_url: &str) -> Result<Self> {
        Self::create_inner(dir.into(), base_url)
            .await
            .pub_result(ErrorType::Config)
    }

    async fn create_inner(maybe_relative: PathBuf, base_url: &str) -> Res<Self> {
        let base_url = parse_base_url(base_url)?;
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the fincoach home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;
        let config_path = root.join(CONFIG_JSON);

        let config_file = ConfigFile {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            base_url: base_url.to_string(),
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            config_path,
            config_file,
            base_url,
        })
    }

    /// This will
    /// - validate that `fincoach_home` and the config file exist
    /// - load and validate the config file
    /// - return the loaded configuration object
    pub async fn load(fincoach_home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_inner(fincoach_home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_inner(maybe_relative: PathBuf) -> Res<Self> {
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("fincoach home is missing, run 'fincoach init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let base_url = parse_base_url(&config_file.base_url)
            .with_context(|| format!("Bad base_url in {}", config_path.display()))?;

        Ok(Self {
            root,
            config_path,
            config_file,
            base_url,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// The server root. Always ends with a `/` so that endpoint paths can be joined onto it.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn config_version(&self) -> u8 {
        self.config_file.config_version
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "fincoach",
///   "config_version": 1,
///   "base_url": "http://localhost:8000/"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "fincoach"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Root URL of the finance coach server
    base_url: String,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if `app_name` is wrong
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}

/// Parses the server root URL and makes sure the path ends with `/`, otherwise `Url::join` would
/// replace the last path segment instead of appending to it.
fn parse_base_url(s: &str) -> Res<Url> {
    let mut url = Url::parse(s.trim()).with_context(|| format!("Invalid URL '{s}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("Unsupported URL scheme '{}', expected http or https", url.scheme());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
