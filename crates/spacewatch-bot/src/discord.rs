// Discord REST adapter
//
// Implements the core's PresenceWriter over the Discord v10 REST API with a
// static bot token. No gateway session is opened; nickname and channel writes
// are plain PATCH calls. Identity setup (username + avatar) doubles as the
// readiness gate: the poll loop is only started once it has succeeded.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};
use tracing::info;

use spacewatch_core::{Error, Guild, PresenceWriter, Result};

const API_BASE: &str = "https://discord.com/api/v10";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const BOT_USERNAME: &str = "glider";
const OPEN_AVATAR: &str = "glider_open.png";
const CLOSED_AVATAR: &str = "glider_closed.png";

/// Authenticated Discord REST client
pub struct DiscordClient {
    client: reqwest::Client,
    base_url: String,
}

impl DiscordClient {
    /// Create a client for the given bot token
    pub fn new(token: &str) -> Result<Self> {
        Self::with_base_url(token, API_BASE)
    }

    /// Create a client against a custom API base URL
    pub fn with_base_url(token: &str, base_url: impl Into<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bot {token}"))
            .map_err(|_| Error::setup("DISCORD_TOKEN contains invalid header characters"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::setup(format!("failed to build Discord HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// One-time identity setup: verify the token, set the bot username, and
    /// upload the startup avatar. Any failure here is fatal.
    pub async fn setup_identity(&self, avatar_dir: &Path) -> Result<()> {
        let me = self
            .get("/users/@me")
            .await
            .map_err(|e| Error::setup(format!("identity check failed: {e}")))?;
        info!(
            user = me.get("username").and_then(serde_json::Value::as_str).unwrap_or("<unknown>"),
            "connected to Discord"
        );

        let avatar = load_startup_avatars(avatar_dir)?;
        self.patch(
            "/users/@me",
            &json!({ "username": BOT_USERNAME, "avatar": avatar }),
        )
        .await
        .map_err(|e| Error::setup(format!("failed to set username/avatar: {e}")))?;

        info!(username = BOT_USERNAME, "bot identity configured");
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .map_err(|e| Error::network(format!("GET {path} failed: {e}")))?
            .error_for_status()
            .map_err(|e| Error::network(format!("GET {path}: {e}")))?;

        response
            .json()
            .await
            .map_err(|e| Error::malformed(format!("GET {path} returned unusable JSON: {e}")))
    }

    async fn patch(&self, path: &str, body: &Value) -> Result<()> {
        self.client
            .patch(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::network(format!("PATCH {path} failed: {e}")))?
            .error_for_status()
            .map_err(|e| Error::network(format!("PATCH {path}: {e}")))?;
        Ok(())
    }
}

impl std::fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordClient")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl PresenceWriter for DiscordClient {
    async fn guilds(&self) -> Result<Vec<Guild>> {
        let body = self.get("/users/@me/guilds").await?;
        parse_guilds(&body)
    }

    async fn edit_nickname(&self, guild_id: &str, nickname: &str) -> Result<()> {
        self.patch(
            &format!("/guilds/{guild_id}/members/@me"),
            &json!({ "nick": nickname }),
        )
        .await
    }

    async fn edit_channel_name(&self, channel_id: &str, name: &str) -> Result<()> {
        self.patch(&format!("/channels/{channel_id}"), &json!({ "name": name }))
            .await
    }
}

/// Parse the `GET /users/@me/guilds` response into guild refs
fn parse_guilds(body: &Value) -> Result<Vec<Guild>> {
    let entries = body
        .as_array()
        .ok_or_else(|| Error::malformed("guild list is not an array"))?;

    Ok(entries
        .iter()
        .filter_map(|entry| {
            let id = entry.get("id").and_then(Value::as_str)?;
            let name = entry.get("name").and_then(Value::as_str).unwrap_or(id);
            Some(Guild {
                id: id.to_string(),
                name: name.to_string(),
            })
        })
        .collect())
}

/// Load the state avatar pair, returning the open-state data URI applied at
/// startup. Both files must be readable; a missing closed asset is fatal even
/// though only the open art is uploaded here.
fn load_startup_avatars(dir: &Path) -> Result<String> {
    load_avatar(&dir.join(CLOSED_AVATAR))?;
    load_avatar(&dir.join(OPEN_AVATAR))
}

/// Read a PNG and encode it as the data URI Discord expects for avatars
fn load_avatar(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .map_err(|e| Error::setup(format!("failed to read avatar {}: {e}", path.display())))?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(bytes)))
}
