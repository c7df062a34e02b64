//! State reconciliation
//!
//! Compares each observation against the last pair that was pushed to the
//! chat platform and only renders on change. The remembered pair starts unset
//! so the first successful poll after startup always renders. It advances
//! after the render attempt whether or not the individual writes succeeded:
//! a partially failed render is not retried until the feed value changes
//! again.

use tracing::debug;

use crate::presence::{apply_presence, PresenceWriter};
use crate::render::SpaceState;
use crate::status::SpaceStatus;

/// Single writer over the last-applied `(state, count)` pair
#[derive(Debug)]
pub struct Reconciler {
    channel_id: String,
    last_state: Option<SpaceState>,
    last_count: Option<u32>,
}

impl Reconciler {
    /// Create a reconciler targeting one status channel, with no remembered
    /// state
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            last_state: None,
            last_count: None,
        }
    }

    /// The pair most recently handed to the renderer
    pub fn last_applied(&self) -> (Option<SpaceState>, Option<u32>) {
        (self.last_state, self.last_count)
    }

    /// Compare an observation against the remembered pair and render on
    /// change. Returns whether a render was issued.
    pub async fn reconcile<W>(&mut self, writer: &W, observed: SpaceStatus) -> bool
    where
        W: PresenceWriter + ?Sized,
    {
        let state = SpaceState::from(&observed);

        if self.last_state == Some(state) && self.last_count == observed.people_count {
            debug!(%state, count = ?observed.people_count, "observation unchanged, skipping render");
            return false;
        }

        apply_presence(writer, &self.channel_id, state, observed.people_count).await;

        self.last_state = Some(state);
        self.last_count = observed.people_count;
        true
    }
}
