//! # Spacewatch Core
//!
//! Mirrors a SpaceAPI-style open/closed feed into a chat-platform presence.
//!
//! The pipeline turns a flaky, loosely-typed JSON endpoint into a debounced
//! stream of state-change events, applied idempotently to a remote system
//! whose writes are not free:
//!
//! ```text
//! Poller ──> RetryPolicy ──> StatusSource ──> Reconciler ──> apply_presence ──> PresenceWriter
//! ```
//!
//! - [`retry`]: bounded retries with exponential backoff, seeded jitter, and
//!   an overall deadline
//! - [`status`]: bounded-timeout fetch and tolerant parsing of the feed
//! - [`reconcile`]: dedup against the last-applied `(state, count)` pair
//! - [`render`] / [`presence`]: presence string formatting and independent,
//!   failure-isolated writes
//! - [`poll`]: the fixed-interval loop tying it together, strictly sequential
//!   so the reconciliation state has a single writer
//!
//! Nothing here is persisted; the remembered state resets to unset on process
//! restart and the first successful poll always renders.

pub mod error;
pub mod poll;
pub mod presence;
pub mod reconcile;
pub mod render;
pub mod retry;
pub mod status;

pub use error::{Error, Result};
pub use poll::{Poller, PollerConfig};
pub use presence::{apply_presence, Guild, PresenceWriter};
pub use reconcile::Reconciler;
pub use render::{RenderTarget, SpaceState, CHANNEL_BASE, PEOPLE_INDICATOR};
pub use retry::RetryPolicy;
pub use status::{parse_status, SpaceStatus, StatusClient, StatusSource};
