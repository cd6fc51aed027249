// =============================================================================
// Refresh Cycle — fetch → indicators → charts, driven by a timer
// =============================================================================
//
// `RefreshPipeline::run_cycle` is the whole pipeline as a plain async
// function of its inputs; it knows nothing about timers or shared state.
// `on_tick` wraps it with the dashboard policy:
//
//   - a tick that arrives while a cycle is still running is skipped,
//   - success replaces the served snapshot,
//   - failure is logged and recorded; the previous snapshot stays.
//
// `run_refresh_loop` is the timer: a tokio interval that spawns `on_tick`
// for every tick so that a slow provider never delays the clock itself.
// =============================================================================

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::app_state::{AppState, DashboardSnapshot};
use crate::charts::ChartBundle;
use crate::error::PipelineError;
use crate::indicators::IndicatorEngine;
use crate::market_data::MarketDataSource;
use crate::portfolio::PortfolioSource;
use crate::types::OutputSize;

/// Result of one timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Refreshed,
    Failed,
    Skipped,
}

/// Immutable wiring of one refresh cycle.
pub struct RefreshPipeline {
    source: Arc<dyn MarketDataSource>,
    portfolio: Arc<dyn PortfolioSource>,
    engine: IndicatorEngine,
    symbol: String,
    output_size: OutputSize,
}

impl RefreshPipeline {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        portfolio: Arc<dyn PortfolioSource>,
        engine: IndicatorEngine,
        symbol: impl Into<String>,
        output_size: OutputSize,
    ) -> Self {
        Self {
            source,
            portfolio,
            engine,
            symbol: symbol.into(),
            output_size,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Run fetch → compute → build once and return the resulting snapshot.
    pub async fn run_cycle(&self, tick: u64) -> Result<DashboardSnapshot, PipelineError> {
        let series = self.source.fetch_daily(&self.symbol, self.output_size).await?;
        let indicators = self.engine.compute(&series)?;
        let portfolio = self.portfolio.portfolio_series()?;
        let charts = ChartBundle::build(&series, &indicators, &portfolio);

        Ok(DashboardSnapshot {
            symbol: series.symbol().to_string(),
            generated_at: Utc::now(),
            tick,
            series,
            indicators,
            charts,
        })
    }
}

/// Handle one timer tick against the shared dashboard state.
pub async fn on_tick(state: &AppState, pipeline: &RefreshPipeline, tick: u64) -> TickOutcome {
    state.record_tick();

    let Some(_guard) = state.try_begin_cycle() else {
        warn!(tick, symbol = pipeline.symbol(), "previous refresh still running, skipping tick");
        state.record_skip();
        return TickOutcome::Skipped;
    };

    let started = Instant::now();
    let result = pipeline.run_cycle(tick).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(snapshot) => {
            if snapshot.series.is_empty() {
                warn!(tick, symbol = %snapshot.symbol, "provider returned no records, charts will be empty");
            }
            let latest = snapshot.series.latest();
            info!(
                tick,
                symbol = %snapshot.symbol,
                points = snapshot.series.len(),
                last_date = ?latest.map(|r| r.date),
                last_close = ?latest.map(|r| r.close_price),
                indicators = ?snapshot.indicators.names(),
                elapsed_ms,
                "refresh cycle complete"
            );
            state.publish_snapshot(snapshot, elapsed_ms);
            TickOutcome::Refreshed
        }
        Err(e) => {
            error!(
                tick,
                symbol = pipeline.symbol(),
                code = e.code(),
                error = %e,
                "refresh cycle failed, keeping previous charts"
            );
            state.record_failure(tick, e.to_string(), e.code(), elapsed_ms);
            TickOutcome::Failed
        }
    }
}

/// Drive `on_tick` every `period`, forever. The first tick fires immediately.
pub async fn run_refresh_loop(state: Arc<AppState>, pipeline: Arc<RefreshPipeline>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut tick: u64 = 0;
    loop {
        interval.tick().await;

        let state = state.clone();
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            on_tick(&state, &pipeline, tick).await;
        });

        tick += 1;
    }
}
