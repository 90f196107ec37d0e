use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::config::AppConfig;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Countdown length after each failure signal.
    pub countdown_seconds: u32,
    pub tick: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            countdown_seconds: 45,
            tick: Duration::from_secs(1),
        }
    }
}

impl From<&AppConfig> for MonitorConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            countdown_seconds: config.retry_countdown_seconds,
            ..Self::default()
        }
    }
}

/// What the presentation layer shows while the backend is unreachable.
///
/// `seconds_remaining > 0` implies `is_down`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AvailabilityState {
    pub is_down: bool,
    pub seconds_remaining: u32,
}

struct Ticker {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

struct Shared {
    state: watch::Sender<AvailabilityState>,
    ticker: Mutex<Ticker>,
}

impl Shared {
    fn ticker(&self) -> MutexGuard<'_, Ticker> {
        self.ticker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Tracks whether the backend is considered down and runs the retry countdown.
///
/// At most one ticker task exists at a time. Must be used from within a
/// tokio runtime, since [`start_timer`](Self::start_timer) spawns the ticker.
pub struct AvailabilityMonitor {
    config: MonitorConfig,
    shared: Arc<Shared>,
}

impl AvailabilityMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        let (state, _) = watch::channel(AvailabilityState::default());
        Self {
            config,
            shared: Arc::new(Shared {
                state,
                ticker: Mutex::new(Ticker {
                    generation: 0,
                    handle: None,
                }),
            }),
        }
    }

    /// Marks the backend down and (re)starts the countdown from the full
    /// length. Calling it while already down restarts the single ticker.
    pub fn start_timer(&self) {
        let countdown = self.config.countdown_seconds.max(1);
        let mut ticker = self.shared.ticker();

        ticker.generation += 1;
        if let Some(previous) = ticker.handle.take() {
            previous.abort();
        }

        let was_down = self.shared.state.borrow().is_down;
        self.shared.state.send_replace(AvailabilityState {
            is_down: true,
            seconds_remaining: countdown,
        });
        if was_down {
            debug!("Availability countdown restarted at {}s", countdown);
        } else {
            warn!("Backend marked down, retry available in {}s", countdown);
        }

        ticker.handle = Some(tokio::spawn(run_ticker(
            Arc::clone(&self.shared),
            ticker.generation,
            self.config.tick,
        )));
    }

    pub fn state(&self) -> AvailabilityState {
        *self.shared.state.borrow()
    }

    pub fn is_down(&self) -> bool {
        self.state().is_down
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.state().seconds_remaining
    }

    /// Whether a countdown ticker is currently running.
    pub fn is_ticking(&self) -> bool {
        self.shared
            .ticker()
            .handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn subscribe(&self) -> watch::Receiver<AvailabilityState> {
        self.shared.state.subscribe()
    }

    /// Resolves as soon as the backend is considered up.
    pub async fn wait_until_up(&self) {
        let mut rx = self.subscribe();
        // the sender lives as long as `self`, so this cannot fail
        let _ = rx.wait_for(|state| !state.is_down).await;
    }
}

impl Drop for AvailabilityMonitor {
    fn drop(&mut self) {
        if let Some(handle) = self.shared.ticker().handle.take() {
            handle.abort();
        }
    }
}

async fn run_ticker(shared: Arc<Shared>, generation: u64, period: Duration) {
    let mut interval = time::interval_at(Instant::now() + period, period);

    loop {
        interval.tick().await;

        let mut ticker = shared.ticker();
        if ticker.generation != generation {
            return;
        }

        let mut recovered = false;
        shared.state.send_modify(|state| {
            state.seconds_remaining = state.seconds_remaining.saturating_sub(1);
            if state.seconds_remaining == 0 {
                state.is_down = false;
                recovered = true;
            }
        });

        if recovered {
            ticker.handle = None;
            info!("Availability countdown finished, backend marked up");
            return;
        }
    }
}
