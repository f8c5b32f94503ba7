pub mod groups;
pub mod sync;
pub mod users;

use anyhow::{Context, Result};
use clap::Args;
use omni_client::{ClientConfig, OmniClient};
use serde::Serialize;
use tracing::debug;

/// Arguments shared by the search commands.
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Substring to match.
    #[arg(long)]
    pub query: String,

    /// Emit JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Load `.env` (its values win over the process environment) and read the
/// client configuration.
pub fn load_config() -> Result<ClientConfig> {
    match dotenvy::dotenv_override() {
        Ok(path) => debug!("loaded environment from {}", path.display()),
        Err(err) if err.not_found() => debug!("no .env file found"),
        Err(err) => return Err(err).context("failed to load .env file"),
    }
    ClientConfig::from_env().context("missing Omni API configuration")
}

pub fn connect() -> Result<OmniClient> {
    Ok(OmniClient::new(load_config()?))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize JSON output")?
    );
    Ok(())
}
