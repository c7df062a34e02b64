//! Presence writes against the chat platform
//!
//! The platform itself is behind the [`PresenceWriter`] seam. `apply_presence`
//! issues every write independently: a failed nickname edit in one guild never
//! blocks the others, and neither direction blocks the channel rename.
//! Failures are logged as presence-write errors, not propagated, so a partial
//! render degrades silently from the end user's point of view.

use async_trait::async_trait;
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::render::{RenderTarget, SpaceState};

/// A guild (server) the bot is a member of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guild {
    pub id: String,
    pub name: String,
}

/// Write access to the chat platform's presence surface
///
/// Implementations are assumed already authenticated; session management is
/// the adapter's concern.
#[async_trait]
pub trait PresenceWriter: Send + Sync {
    /// Enumerate the guilds the bot currently belongs to
    async fn guilds(&self) -> Result<Vec<Guild>>;

    /// Set the bot's nickname in one guild
    async fn edit_nickname(&self, guild_id: &str, nickname: &str) -> Result<()>;

    /// Rename a channel
    async fn edit_channel_name(&self, channel_id: &str, name: &str) -> Result<()>;
}

/// Render `(state, count)` and push it to every guild plus the status channel.
///
/// Never fails: each sub-write is attempted regardless of the others'
/// outcomes, and every failure is logged individually.
pub async fn apply_presence<W>(writer: &W, channel_id: &str, state: SpaceState, count: Option<u32>)
where
    W: PresenceWriter + ?Sized,
{
    let target = RenderTarget::new(state, count);
    info!(
        %state,
        count = ?count,
        nickname = %target.display_name,
        channel = %target.channel_name,
        "updating presence"
    );

    match writer.guilds().await {
        Ok(guilds) => {
            for guild in guilds {
                if let Err(cause) = writer.edit_nickname(&guild.id, &target.display_name).await {
                    let err =
                        Error::presence_write(format!("guild {}", guild.name), cause.to_string());
                    error!(guild_id = %guild.id, error = %err, "nickname update failed");
                }
            }
        }
        Err(cause) => {
            error!(error = %cause, "failed to enumerate guilds, skipping nickname updates");
        }
    }

    if let Err(cause) = writer.edit_channel_name(channel_id, &target.channel_name).await {
        let err = Error::presence_write(format!("channel {channel_id}"), cause.to_string());
        error!(channel_id = %channel_id, error = %err, "channel rename failed");
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Scripted writer used by the presence and reconciler tests

    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;

    /// Records every write it receives; selected targets can be made to fail.
    #[derive(Default)]
    pub struct RecordingWriter {
        pub guild_list: Vec<Guild>,
        pub failing_guilds: HashSet<String>,
        pub fail_channel: bool,
        pub calls: Mutex<Vec<String>>,
    }

    impl RecordingWriter {
        pub fn with_guilds(names: &[&str]) -> Self {
            Self {
                guild_list: names
                    .iter()
                    .enumerate()
                    .map(|(i, name)| Guild {
                        id: format!("g{i}"),
                        name: (*name).to_string(),
                    })
                    .collect(),
                ..Default::default()
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PresenceWriter for RecordingWriter {
        async fn guilds(&self) -> Result<Vec<Guild>> {
            Ok(self.guild_list.clone())
        }

        async fn edit_nickname(&self, guild_id: &str, nickname: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("nick {guild_id} {nickname}"));
            if self.failing_guilds.contains(guild_id) {
                return Err(Error::network("403 missing permissions"));
            }
            Ok(())
        }

        async fn edit_channel_name(&self, channel_id: &str, name: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("channel {channel_id} {name}"));
            if self.fail_channel {
                return Err(Error::network("503 service unavailable"));
            }
            Ok(())
        }
    }
}
