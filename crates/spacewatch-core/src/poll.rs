//! Fixed-interval poll loop
//!
//! Drives the whole pipeline: fetch through the retry executor, hand the
//! observation to the reconciler, skip the tick on failure. Each tick's work
//! is awaited before the next tick is taken from the interval, so polls are
//! strictly sequential and the reconciler only ever has one writer.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::presence::PresenceWriter;
use crate::reconcile::Reconciler;
use crate::render::SpaceState;
use crate::retry::RetryPolicy;
use crate::status::StatusSource;

/// Poll loop configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// Time between poll ticks
    pub interval: Duration,

    /// Retry behavior for each tick's fetch
    pub retry: RetryPolicy,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }
}

impl PollerConfig {
    /// Create a configuration with the default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the poll interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// The poll scheduler
///
/// Owns the status source, the presence writer, the reconciler, and the
/// jitter RNG. Ticks never overlap: a slow tick delays the next one instead
/// of running concurrently with it.
pub struct Poller<S, W> {
    source: S,
    writer: W,
    reconciler: Reconciler,
    config: PollerConfig,
    rng: StdRng,
    shutdown_rx: watch::Receiver<bool>,
}

impl<S, W> Poller<S, W>
where
    S: StatusSource,
    W: PresenceWriter,
{
    /// Create a poller with an entropy-seeded jitter RNG
    pub fn new(
        source: S,
        writer: W,
        reconciler: Reconciler,
        config: PollerConfig,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self::with_rng(
            source,
            writer,
            reconciler,
            config,
            StdRng::from_entropy(),
            shutdown_rx,
        )
    }

    /// Create a poller with an explicit RNG, for deterministic backoff timing
    pub fn with_rng(
        source: S,
        writer: W,
        reconciler: Reconciler,
        config: PollerConfig,
        rng: StdRng,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            source,
            writer,
            reconciler,
            config,
            rng,
            shutdown_rx,
        }
    }

    /// The pair most recently handed to the renderer
    pub fn last_applied(&self) -> (Option<SpaceState>, Option<u32>) {
        self.reconciler.last_applied()
    }

    /// Run until the shutdown signal fires.
    ///
    /// The first tick happens immediately, subsequent ticks on the configured
    /// interval.
    pub async fn run(&mut self) {
        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let mut shutdown_rx = self.shutdown_rx.clone();
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown_rx.changed() => {
                    debug!("shutdown signal received, stopping poll loop");
                    return;
                }
            }
            if *self.shutdown_rx.borrow() {
                return;
            }

            self.tick().await;
        }
    }

    /// Perform one poll: fetch with retries, reconcile on success, skip the
    /// tick on failure leaving the remembered state untouched. Returns
    /// whether a render was issued.
    pub async fn tick(&mut self) -> bool {
        info!("checking the status");

        let fetched = self
            .config
            .retry
            .run(&mut self.rng, || self.source.fetch())
            .await;

        match fetched {
            Ok(status) => {
                info!(
                    open = status.is_open,
                    people = ?status.people_count,
                    "current status"
                );
                self.reconciler.reconcile(&self.writer, status).await
            }
            Err(err) => {
                error!(error = %err, "status check failed, skipping this tick");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tokio::time::Instant;

    use crate::error::{Error, Result};
    use crate::presence::test_support::RecordingWriter;
    use crate::status::SpaceStatus;

    /// Replays a script of fetch outcomes, then keeps failing
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<SpaceStatus>>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<SpaceStatus>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
            }
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch(&self) -> Result<SpaceStatus> {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::network("script exhausted")))
        }
    }

    fn open(count: Option<u32>) -> SpaceStatus {
        SpaceStatus {
            is_open: true,
            people_count: count,
        }
    }

    fn test_config() -> PollerConfig {
        PollerConfig::new()
            .with_interval(Duration::from_secs(60))
            .with_retry(RetryPolicy::default().with_max_attempts(1))
    }

    fn poller(script: Vec<Result<SpaceStatus>>) -> (Poller<ScriptedSource, RecordingWriter>, watch::Sender<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let poller = Poller::with_rng(
            ScriptedSource::new(script),
            RecordingWriter::with_guilds(&["alpha"]),
            Reconciler::new("c1"),
            test_config(),
            StdRng::seed_from_u64(11),
            shutdown_rx,
        );
        (poller, shutdown_tx)
    }

    #[tokio::test]
    async fn test_successful_tick_reconciles() {
        let (mut poller, _shutdown) = poller(vec![Ok(open(Some(3)))]);

        assert!(poller.tick().await);
        assert_eq!(poller.last_applied(), (Some(SpaceState::Open), Some(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_tick_leaves_state_untouched() {
        let (mut poller, _shutdown) = poller(vec![
            Err(Error::network("down")),
            Ok(open(Some(3))),
        ]);

        assert!(!poller.tick().await);
        assert_eq!(poller.last_applied(), (None, None));

        // The next tick recovers without any carried-over state.
        assert!(poller.tick().await);
        assert_eq!(poller.last_applied(), (Some(SpaceState::Open), Some(3)));
    }

    #[tokio::test]
    async fn test_malformed_tick_is_skipped() {
        let (mut poller, _shutdown) = poller(vec![Err(Error::malformed("state.open missing"))]);

        assert!(!poller.tick().await);
        assert_eq!(poller.last_applied(), (None, None));
    }

    #[tokio::test]
    async fn test_identical_ticks_render_once() {
        let (mut poller, _shutdown) = poller(vec![
            Ok(open(Some(3))),
            Ok(open(Some(3))),
            Ok(open(Some(3))),
        ]);

        assert!(poller.tick().await);
        assert!(!poller.tick().await);
        assert!(!poller.tick().await);
        assert_eq!(poller.writer.calls().len(), 2);
    }

    /// Fetch that outlasts the poll interval, recording when each call is in
    /// flight and returning a fresh count every time so every tick renders
    struct SlowSource {
        delay: Duration,
        counter: AtomicU32,
        spans: Arc<Mutex<Vec<(Instant, Instant)>>>,
    }

    #[async_trait]
    impl StatusSource for SlowSource {
        async fn fetch(&self) -> Result<SpaceStatus> {
            let started = Instant::now();
            tokio::time::sleep(self.delay).await;
            self.spans.lock().unwrap().push((started, Instant::now()));
            let count = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(open(Some(count)))
        }
    }

    /// Writer whose call log outlives the poller it is moved into
    struct SharedWriter {
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl PresenceWriter for SharedWriter {
        async fn guilds(&self) -> Result<Vec<crate::presence::Guild>> {
            Ok(vec![crate::presence::Guild {
                id: "g0".to_string(),
                name: "alpha".to_string(),
            }])
        }

        async fn edit_nickname(&self, guild_id: &str, nickname: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("nick {guild_id} {nickname}"));
            Ok(())
        }

        async fn edit_channel_name(&self, channel_id: &str, name: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("channel {channel_id} {name}"));
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_ticks_are_serialized_not_overlapped() {
        let spans = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::new(Mutex::new(Vec::new()));

        // Each fetch takes three intervals; the loop must wait it out rather
        // than start the next poll alongside it.
        let source = SlowSource {
            delay: Duration::from_secs(3),
            counter: AtomicU32::new(0),
            spans: Arc::clone(&spans),
        };
        let writer = SharedWriter {
            calls: Arc::clone(&calls),
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let config = PollerConfig::new()
            .with_interval(Duration::from_secs(1))
            .with_retry(RetryPolicy::default().with_max_attempts(1));
        let mut poller = Poller::with_rng(
            source,
            writer,
            Reconciler::new("c1"),
            config,
            StdRng::seed_from_u64(5),
            shutdown_rx,
        );

        let handle = tokio::spawn(async move {
            poller.run().await;
        });

        tokio::time::sleep(Duration::from_secs(10)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        let spans = spans.lock().unwrap().clone();
        assert!(
            spans.len() >= 2,
            "expected several slow ticks, got {}",
            spans.len()
        );
        for pair in spans.windows(2) {
            assert!(
                pair[0].1 <= pair[1].0,
                "fetch for one tick started before the previous tick finished: {pair:?}"
            );
        }

        // Each tick's writes land as an adjacent nickname/rename pair, in
        // observation order, with nothing from a later tick interleaved.
        let calls = calls.lock().unwrap().clone();
        assert!(calls.len() >= 4);
        assert_eq!(calls.len() % 2, 0);
        for (i, chunk) in calls.chunks(2).enumerate() {
            let count = i + 1;
            assert_eq!(chunk[0], format!("nick g0 Open ({count} 🧙)"));
            assert_eq!(chunk[1], format!("channel c1 🟢🔓-space-is-open-{count}"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let (mut poller, shutdown) = poller(vec![Ok(open(Some(1)))]);

        let handle = tokio::spawn(async move {
            poller.run().await;
        });

        tokio::task::yield_now().await;
        shutdown.send(true).unwrap();
        handle.await.unwrap();
    }
}
