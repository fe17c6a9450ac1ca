use crate::commands::Out;
use crate::{Config, Result};
use std::path::Path;

/// Creates the data directory and an initial `config.json` pointing at `base_url`.
///
/// # Arguments
/// - `fincoach_home` - The directory that will be the root of data directory, e.g.
///   `$HOME/fincoach`
/// - `base_url` - The root URL of the finance coach server, e.g. `http://localhost:8000`
///
/// # Errors
/// - Returns a `Config` error if `base_url` is not an http(s) URL or the file cannot be written.
pub async fn init(fincoach_home: &Path, base_url: &str) -> Result<Out<()>> {
    let config = Config::create(fincoach_home, base_url).await?;
    Ok(format!(
        "Created {} for the finance coach at {}",
        config.config_path().display(),
        config.base_url()
    )
    .into())
}
