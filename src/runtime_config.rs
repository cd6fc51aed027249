// =============================================================================
// Runtime Configuration — dashboard settings with atomic save
// =============================================================================
//
// Every tunable of the refresh pipeline lives here. All fields carry
// `#[serde(default)]` so that adding new fields never breaks loading an older
// config file. The provider API key is deliberately NOT part of this file; it
// is read from the environment only.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.
// =============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::alphavantage::DEFAULT_BASE_URL;
use crate::portfolio::SyntheticPortfolioParams;
use crate::types::OutputSize;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_symbol() -> String {
    "AAPL".to_string()
}

fn default_ma_windows() -> Vec<usize> {
    vec![10, 30, 50]
}

fn default_refresh_interval_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_api_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:8050".to_string()
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level configuration for the dashboard backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Market data --------------------------------------------------------

    /// Ticker the dashboard tracks.
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// `compact` (last ~100 points) or `full` (entire history).
    #[serde(default)]
    pub output_size: OutputSize,

    /// Provider scheme + host.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Whole-request timeout for the provider call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    // --- Indicators ---------------------------------------------------------

    /// Moving-average windows, one `MA_<w>` overlay each.
    #[serde(default = "default_ma_windows")]
    pub ma_windows: Vec<usize>,

    // --- Refresh & serving --------------------------------------------------

    /// Seconds between refresh cycles.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Address of the chart handoff API.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    // --- Portfolio ----------------------------------------------------------

    /// Synthetic portfolio walk parameters.
    #[serde(default)]
    pub portfolio: SyntheticPortfolioParams,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            output_size: OutputSize::default(),
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            ma_windows: default_ma_windows(),
            refresh_interval_secs: default_refresh_interval_secs(),
            bind_addr: default_bind_addr(),
            portfolio: SyntheticPortfolioParams::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            symbol = %config.symbol,
            output_size = %config.output_size,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Load `path`, or write the defaults there when no file exists yet.
    ///
    /// A file that exists but fails to parse is left untouched and reported
    /// as an error.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }

        let config = Self::default();
        config.save(path)?;
        info!(path = %path.display(), "no runtime config found, wrote defaults");
        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Canonicalise free-form fields, whatever their source (file or env).
    pub fn normalize(&mut self) {
        self.symbol = self.symbol.trim().to_uppercase();
        self.bind_addr = self.bind_addr.trim().to_string();
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            bail!("symbol must not be empty");
        }
        if self.ma_windows.contains(&0) {
            bail!("ma_windows must not contain 0");
        }
        if self.refresh_interval_secs == 0 {
            bail!("refresh_interval_secs must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be at least 1");
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
