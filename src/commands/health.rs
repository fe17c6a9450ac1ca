use crate::api::{self, Health, Mode};
use crate::commands::Out;
use crate::{Config, Result};
use tracing::debug;

/// Asks the finance coach server whether it is up.
pub async fn health(config: Config, mode: Mode) -> Result<Out<Health>> {
    let backend = api::backend(&config, mode)?;
    debug!("Checking the health of {}", config.base_url());
    let health = backend.health().await?;
    let message = match &health.timestamp {
        Some(timestamp) => format!("{} is {} as of {timestamp}", config.base_url(), health.status),
        None => format!("{} is {}", config.base_url(), health.status),
    };
    Ok(Out::new(message, health))
}
