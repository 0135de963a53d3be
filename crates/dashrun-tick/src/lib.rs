//! Timing primitives for Dashrun rooms and matchmaking.
//!
//! - [`TickScheduler`] drives a room's simulation at a fixed rate and reports
//!   the *measured* wall-clock delta since the previous tick, so physics stays
//!   correct when a tick fires late.
//! - [`ScheduledTask`] is a one-shot delayed action that can be canceled,
//!   used for bot-fill timers.
//!
//! # Integration
//!
//! A room actor awaits the scheduler next to its command channel:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = commands.recv() => room.apply(cmd),
//!         info = scheduler.wait_for_tick() => {
//!             let events = room.tick(info.dt.as_secs_f64());
//!             scheduler.record_tick_end();
//!         }
//!     }
//! }
//! ```

mod timer;

pub use timer::ScheduledTask;

use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Scheduler settings. Out-of-range values are clamped on use.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Tick rate in Hz. 0 = disabled (tick never fires).
    pub tick_rate_hz: u32,
    /// Share of the tick budget after which a slow tick is logged.
    pub budget_warn_threshold: f64,
    /// Upper bound on a random delay before the first tick, so rooms
    /// matched together do not all tick on the same instant.
    pub initial_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 0,
            budget_warn_threshold: 0.80,
            initial_jitter_us: 2_000,
        }
    }
}

impl TickConfig {
    /// Rates above this are clamped.
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    /// Defaults with the given rate.
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`TickScheduler::new`].
    pub fn validated(mut self) -> Self {
        if self.tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            warn!(
                rate = self.tick_rate_hz,
                max = Self::MAX_TICK_RATE_HZ,
                "tick_rate_hz exceeds maximum, clamping"
            );
            self.tick_rate_hz = Self::MAX_TICK_RATE_HZ;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    /// Nominal duration of a single tick. `None` when disabled.
    pub fn tick_duration(&self) -> Option<Duration> {
        if self.tick_rate_hz == 0 {
            None
        } else {
            Some(Duration::from_secs_f64(1.0 / self.tick_rate_hz as f64))
        }
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// Returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// 1 for the first tick.
    pub tick: u64,
    /// Wall-clock time elapsed since the previous tick fired (or since the
    /// scheduler was created, for the first tick). Equals the nominal tick
    /// duration in normal operation and grows when a tick is delayed.
    pub dt: Duration,
    /// `true` if this tick fired more than 10% late.
    pub overrun: bool,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Counters kept by a [`TickScheduler`].
#[derive(Debug, Clone, Default)]
pub struct TickMetrics {
    /// Total ticks fired.
    pub total_ticks: u64,
    /// Ticks that fired late.
    pub total_overruns: u64,
    /// Longest game-logic execution reported via `record_tick_end`.
    pub max_tick_time: Duration,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-rate tick scheduler. One per room.
///
/// After an overrun the next deadline is measured from *now*, so a slow tick
/// never causes a burst of catch-up ticks; the lost time shows up in the next
/// [`TickInfo::dt`] instead.
pub struct TickScheduler {
    config: TickConfig,
    tick_duration: Option<Duration>,
    tick_count: u64,
    next_tick: Option<TokioInstant>,
    last_fire: TokioInstant,
    /// Start of the logic for the tick in flight.
    tick_start: Option<Instant>,
    metrics: TickMetrics,
}

impl TickScheduler {
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();
        let now = TokioInstant::now();

        let next_tick = tick_duration.map(|d| {
            let jitter = if config.initial_jitter_us > 0 {
                let us = rand::rng().random_range(0..config.initial_jitter_us);
                Duration::from_micros(us)
            } else {
                Duration::ZERO
            };
            now + d + jitter
        });

        debug!(
            rate_hz = config.tick_rate_hz,
            budget_ms = ?tick_duration.map(|d| d.as_secs_f64() * 1000.0),
            "tick scheduler created"
        );

        Self {
            config,
            tick_duration,
            tick_count: 0,
            next_tick,
            last_fire: now,
            tick_start: None,
            metrics: TickMetrics::default(),
        }
    }

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Wait until the next tick is due.
    ///
    /// With a tick rate of 0 this future pends forever, which lets it sit in
    /// a `tokio::select!` without ever winning.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (next, tick_dur) = match (self.next_tick, self.tick_duration) {
            (Some(next), Some(dur)) => (next, dur),
            _ => std::future::pending().await,
        };

        time::sleep_until(next).await;

        let now = TokioInstant::now();
        self.tick_count += 1;
        self.tick_start = Some(Instant::now());

        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > tick_dur / 10;
        if overrun {
            self.metrics.total_overruns += 1;
            warn!(
                tick = self.tick_count,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "tick fired late"
            );
        }

        let dt = now.saturating_duration_since(self.last_fire);
        self.last_fire = now;
        self.next_tick = Some(now + tick_dur);
        self.metrics.total_ticks += 1;

        trace!(tick = self.tick_count, dt_ms = dt.as_secs_f64() * 1000.0, "tick fired");

        TickInfo {
            tick: self.tick_count,
            dt,
            overrun,
        }
    }

    /// Marks the end of the logic for the tick in flight.
    ///
    /// Enables budget warnings; a no-op if no tick is in flight.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let elapsed = start.elapsed();
        if elapsed > self.metrics.max_tick_time {
            self.metrics.max_tick_time = elapsed;
        }

        if let Some(budget) = self.tick_duration {
            let utilization = elapsed.as_secs_f64() / budget.as_secs_f64();
            if utilization >= self.config.budget_warn_threshold {
                warn!(
                    tick = self.tick_count,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    budget_ms = budget.as_secs_f64() * 1000.0,
                    "tick approaching budget limit"
                );
            }
        }
    }

    /// Current tick count.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }

    /// The nominal tick duration, or `None` when disabled.
    pub fn tick_duration(&self) -> Option<Duration> {
        self.tick_duration
    }
}
