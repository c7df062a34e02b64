// Environment configuration
//
// Everything comes from environment variables (optionally via a .env file
// loaded in main); there are no CLI flags. Missing or invalid required values
// are Setup errors, which are fatal.

use std::path::PathBuf;
use std::time::Duration;

use spacewatch_core::{Error, Result};

const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_AVATAR_DIR: &str = "res";

/// Process configuration
#[derive(Debug, Clone)]
pub struct Settings {
    /// Discord bot token
    pub discord_token: String,

    /// URL of the status endpoint
    pub space_endpoint: String,

    /// Channel whose name mirrors the space state
    pub channel_id: String,

    /// Time between polls
    pub poll_interval: Duration,

    /// Directory holding the bot avatar assets
    pub avatar_dir: PathBuf,
}

impl Settings {
    /// Load settings from the environment.
    ///
    /// Required: `DISCORD_TOKEN`, `SPACE_ENDPOINT`, `DISCORD_CHANNEL_ID`.
    /// Optional: `POLL_INTERVAL_SECS` (default 60), `AVATAR_DIR` (default
    /// `res`).
    pub fn from_env() -> Result<Self> {
        let discord_token = require("DISCORD_TOKEN")?;
        let space_endpoint = require("SPACE_ENDPOINT")?;
        let channel_id = require("DISCORD_CHANNEL_ID")?;

        url::Url::parse(&space_endpoint)
            .map_err(|e| Error::setup(format!("SPACE_ENDPOINT is not a valid URL: {e}")))?;

        let poll_interval = match std::env::var("POLL_INTERVAL_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    Error::setup(format!("POLL_INTERVAL_SECS is not a number: {raw:?}"))
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        };

        let avatar_dir = std::env::var("AVATAR_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_AVATAR_DIR));

        Ok(Self {
            discord_token,
            space_endpoint,
            channel_id,
            poll_interval,
            avatar_dir,
        })
    }
}

fn require(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::setup(format!("required variable {name} is not set"))),
    }
}
