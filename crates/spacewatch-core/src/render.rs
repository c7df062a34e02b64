//! Presence rendering
//!
//! Pure formatting of the Discord-facing strings from an observed state.

use std::fmt;

use crate::status::SpaceStatus;

/// Marker appended to the nickname next to the people count
pub const PEOPLE_INDICATOR: &str = "🧙";

/// Base segment of the status channel name
pub const CHANNEL_BASE: &str = "space-is";

const LOCK_OPEN: &str = "🟢🔓";
const LOCK_CLOSED: &str = "🔴🔒";

/// Open/closed state of the space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceState {
    Open,
    Closed,
}

impl From<&SpaceStatus> for SpaceState {
    fn from(status: &SpaceStatus) -> Self {
        if status.is_open {
            SpaceState::Open
        } else {
            SpaceState::Closed
        }
    }
}

impl fmt::Display for SpaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpaceState::Open => write!(f, "open"),
            SpaceState::Closed => write!(f, "closed"),
        }
    }
}

/// Everything the chat platform needs to show for one `(state, count)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTarget {
    /// Lock glyph pair prefixing the channel name
    pub lock_icon: &'static str,

    /// Bot nickname
    pub display_name: String,

    /// Full channel name, lock icon and base segment included
    pub channel_name: String,
}

impl RenderTarget {
    /// Compute the presence strings for a state and optional people count.
    ///
    /// An unknown count while open renders as "?" in both the nickname and
    /// the channel suffix.
    pub fn new(state: SpaceState, count: Option<u32>) -> Self {
        let count_label = match count {
            Some(n) => n.to_string(),
            None => "?".to_string(),
        };

        let (lock_icon, display_name, suffix) = match state {
            SpaceState::Open => (
                LOCK_OPEN,
                format!("Open ({count_label} {PEOPLE_INDICATOR})"),
                format!("open-{count_label}"),
            ),
            SpaceState::Closed => (LOCK_CLOSED, "Closed".to_string(), "closed".to_string()),
        };

        Self {
            lock_icon,
            display_name,
            channel_name: format!("{lock_icon}-{CHANNEL_BASE}-{suffix}"),
        }
    }
}
