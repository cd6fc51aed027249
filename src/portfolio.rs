// =============================================================================
// Portfolio Performance source
// =============================================================================
//
// The dashboard's third chart shows a portfolio value series. No real
// portfolio feed exists yet, so the default source is a Gaussian random walk:
//
//   value_t = base + Σ_{j<=t} step_j,   step_j ~ N(0, step_std)
//
// one point per calendar day starting at `start_date`. The trait lets a real
// feed replace it without touching the refresh cycle.
// =============================================================================

use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// One portfolio valuation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PortfolioPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Supplies the Portfolio Performance series for a refresh cycle.
pub trait PortfolioSource: Send + Sync {
    fn portfolio_series(&self) -> Result<Vec<PortfolioPoint>, PipelineError>;
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default()
}

fn default_periods() -> usize {
    100
}

fn default_base_value() -> f64 {
    10_000.0
}

fn default_step_std() -> f64 {
    10.0
}

/// Parameters of the synthetic random-walk portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticPortfolioParams {
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,

    /// Number of daily points.
    #[serde(default = "default_periods")]
    pub periods: usize,

    /// Value the walk starts from.
    #[serde(default = "default_base_value")]
    pub base_value: f64,

    /// Standard deviation of each daily step.
    #[serde(default = "default_step_std")]
    pub step_std: f64,

    /// Fixed RNG seed. `None` draws a fresh walk every cycle.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SyntheticPortfolioParams {
    fn default() -> Self {
        Self {
            start_date: default_start_date(),
            periods: default_periods(),
            base_value: default_base_value(),
            step_std: default_step_std(),
            seed: None,
        }
    }
}

/// Random-walk portfolio generator.
#[derive(Debug, Clone)]
pub struct SyntheticPortfolio {
    params: SyntheticPortfolioParams,
    normal: Normal<f64>,
}

impl SyntheticPortfolio {
    pub fn new(params: SyntheticPortfolioParams) -> Result<Self, PipelineError> {
        let normal = Normal::new(0.0, params.step_std).map_err(|e| {
            PipelineError::InvalidInput(format!("invalid portfolio step_std {}: {e}", params.step_std))
        })?;
        Ok(Self { params, normal })
    }
}

impl PortfolioSource for SyntheticPortfolio {
    fn portfolio_series(&self) -> Result<Vec<PortfolioPoint>, PipelineError> {
        let mut rng = match self.params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut points = Vec::with_capacity(self.params.periods);
        let mut value = self.params.base_value;

        for i in 0..self.params.periods {
            let date = self
                .params
                .start_date
                .checked_add_days(Days::new(i as u64))
                .ok_or_else(|| PipelineError::InvalidInput("portfolio date overflow".into()))?;
            value += self.normal.sample(&mut rng);
            points.push(PortfolioPoint { date, value });
        }

        Ok(points)
    }
}
