// =============================================================================
// Dashboard State — last good snapshot, cycle stats and error log
// =============================================================================
//
// The single piece of state that outlives a refresh cycle. The refresh task
// writes it; the handoff API reads it. A failed cycle never touches the
// snapshot, so the renderer keeps showing the previous charts (flagged
// `stale`) instead of an error.
//
// Thread safety:
//   - Atomic counters for lock-free version tracking and the in-flight guard.
//   - parking_lot::RwLock for the snapshot slot, stats and error log.
//   - Snapshots are shared as `Arc` so readers never copy the series.
// =============================================================================

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::charts::ChartBundle;
use crate::indicators::IndicatorSet;
use crate::market_data::MarketSeries;

// =============================================================================
// Records
// =============================================================================

/// A recorded error event for the dashboard error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// Human-readable error message.
    pub message: String,
    /// Machine-readable error code (e.g. `DATA_UNAVAILABLE`).
    pub code: Option<String>,
    /// Tick that produced the error.
    pub tick: u64,
    /// ISO 8601 timestamp.
    pub at: String,
}

/// Everything one successful refresh cycle produced.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub symbol: String,
    pub generated_at: DateTime<Utc>,
    pub tick: u64,
    pub series: MarketSeries,
    pub indicators: IndicatorSet,
    pub charts: ChartBundle,
}

/// Running counters over all refresh ticks.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleStats {
    pub ticks_seen: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub skipped: u64,
    /// Whether the most recent completed cycle failed.
    pub last_cycle_failed: bool,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub last_cycle_ms: Option<u64>,
}

// =============================================================================
// AppState
// =============================================================================

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

/// Shared dashboard state, wrapped in `Arc` and handed to every task.
pub struct AppState {
    /// Incremented on every meaningful mutation so pollers can detect change.
    pub state_version: AtomicU64,

    snapshot: RwLock<Option<Arc<DashboardSnapshot>>>,
    stats: RwLock<CycleStats>,
    recent_errors: RwLock<Vec<ErrorRecord>>,

    /// Set while a refresh cycle is running.
    cycle_in_flight: AtomicBool,

    /// Instant when the service was started. Used for uptime calculations.
    pub start_time: std::time::Instant,
}

/// Releases the in-flight flag when the cycle ends, including on panic.
pub struct CycleGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            state_version: AtomicU64::new(1),
            snapshot: RwLock::new(None),
            stats: RwLock::new(CycleStats::default()),
            recent_errors: RwLock::new(Vec::new()),
            cycle_in_flight: AtomicBool::new(false),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Cycle bookkeeping ───────────────────────────────────────────────

    /// Claim the right to run a cycle. `None` if one is already running.
    pub fn try_begin_cycle(&self) -> Option<CycleGuard<'_>> {
        self.cycle_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CycleGuard {
                flag: &self.cycle_in_flight,
            })
    }

    pub fn cycle_in_flight(&self) -> bool {
        self.cycle_in_flight.load(Ordering::Acquire)
    }

    pub fn record_tick(&self) {
        self.stats.write().ticks_seen += 1;
    }

    pub fn record_skip(&self) {
        self.stats.write().skipped += 1;
    }

    /// Replace the served snapshot with the output of a successful cycle.
    ///
    /// Lock order is always `stats` then `snapshot`, so a reader never sees
    /// the new snapshot paired with the previous cycle's failure flag.
    pub fn publish_snapshot(&self, snapshot: DashboardSnapshot, elapsed_ms: u64) {
        let at = snapshot.generated_at;
        {
            let mut stats = self.stats.write();
            stats.succeeded += 1;
            stats.last_cycle_failed = false;
            stats.last_success_at = Some(at);
            stats.last_cycle_ms = Some(elapsed_ms);
            *self.snapshot.write() = Some(Arc::new(snapshot));
        }

        self.increment_version();
    }

    /// Record a failed cycle. The previous snapshot stays in place.
    pub fn record_failure(&self, tick: u64, message: String, code: &str, elapsed_ms: u64) {
        {
            let mut stats = self.stats.write();
            stats.failed += 1;
            stats.last_cycle_failed = true;
            stats.last_failure_at = Some(Utc::now());
            stats.last_cycle_ms = Some(elapsed_ms);
        }
        self.push_error(tick, message, Some(code.to_string()));
    }

    pub fn latest_snapshot(&self) -> Option<Arc<DashboardSnapshot>> {
        self.snapshot.read().clone()
    }

    /// The served snapshot together with its staleness, read as one unit.
    pub fn served_snapshot(&self) -> Option<(Arc<DashboardSnapshot>, bool)> {
        let stats = self.stats.read();
        let snapshot = self.snapshot.read().clone()?;
        Some((snapshot, stats.last_cycle_failed))
    }

    /// True when a snapshot exists but the latest cycle failed.
    #[cfg(test)]
    pub fn is_stale(&self) -> bool {
        self.served_snapshot().is_some_and(|(_, stale)| stale)
    }

    pub fn stats(&self) -> CycleStats {
        self.stats.read().clone()
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record an error. The log is capped at [`MAX_RECENT_ERRORS`]; oldest
    /// entries are evicted when the limit is reached.
    pub fn push_error(&self, tick: u64, message: String, code: Option<String>) {
        let record = ErrorRecord {
            message,
            code,
            tick,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }
        drop(errors);

        self.increment_version();
    }

    pub fn recent_errors(&self) -> Vec<ErrorRecord> {
        self.recent_errors.read().clone()
    }
}
