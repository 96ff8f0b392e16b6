use crate::error::ConfigError;
use chrono::NaiveDate;
use core_types::FilterState;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Shortest brush debounce accepted; anything faster defeats filter batching.
pub const MIN_BRUSH_DEBOUNCE: Duration = Duration::from_millis(300);

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analytics: AnalyticsSettings,
    pub filters: FilterSettings,
    pub sync: SyncSettings,
    pub logging: LoggingConfig,
}

/// Parameters of the derived-series calculations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    /// Trailing window, in trading days, of the rolling volatility.
    pub window: usize,
    /// Scale rolling volatility by `sqrt(252)`.
    pub annualize: bool,
    /// Fractional padding applied to secondary axis bounds.
    pub domain_padding: f64,
    /// Fractional padding applied to the primary axis bounds.
    pub primary_padding: f64,
    /// Trading days after an event over which its impact is measured.
    pub impact_window: usize,
}

/// Dataset bounds and the default analysis window.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// First date for which the price feed has data.
    pub data_min: NaiveDate,
    /// Last date for which the price feed has data.
    pub data_max: NaiveDate,
    pub default_lookback_days: u64,
}

/// Chart synchronization timing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Inactivity required before a brush drag is committed to the filters.
    #[serde(with = "humantime_serde")]
    pub brush_debounce: Duration,
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

// --- Default Implementations ---
// These allow a user to omit any section (or the whole file) and still get a
// working dashboard over the reference dataset.

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            window: 20,
            annualize: true,
            domain_padding: 0.05,
            primary_padding: 0.10,
            impact_window: 5,
        }
    }
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            data_min: NaiveDate::from_ymd_opt(1987, 5, 20).unwrap_or_default(),
            data_max: NaiveDate::from_ymd_opt(2022, 9, 30).unwrap_or_default(),
            default_lookback_days: 365,
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self { brush_debounce: MIN_BRUSH_DEBOUNCE }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "dashboard.log".to_string(),
        }
    }
}

impl FilterSettings {
    /// The filter state the dashboard opens with and returns to on reset.
    pub fn default_state(&self) -> FilterState {
        FilterState::default_for(self.data_max, self.default_lookback_days)
    }
}

impl Config {
    /// Rejects settings that would make the calculations or the UI misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.analytics;
        if a.window == 0 {
            return Err(ConfigError::ValidationError(
                "analytics.window must be at least 1".to_string(),
            ));
        }
        for (name, value) in [("domain_padding", a.domain_padding), ("primary_padding", a.primary_padding)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "analytics.{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.filters.data_min > self.filters.data_max {
            return Err(ConfigError::ValidationError(format!(
                "filters.data_min ({}) is after filters.data_max ({})",
                self.filters.data_min, self.filters.data_max
            )));
        }
        if self.filters.default_lookback_days == 0 {
            return Err(ConfigError::ValidationError(
                "filters.default_lookback_days must be at least 1".to_string(),
            ));
        }
        if self.sync.brush_debounce < MIN_BRUSH_DEBOUNCE {
            return Err(ConfigError::ValidationError(format!(
                "sync.brush_debounce must be at least {}ms",
                MIN_BRUSH_DEBOUNCE.as_millis()
            )));
        }
        Ok(())
    }
}

/// Command-line overrides for the analytics section.
#[cfg(feature = "clap")]
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CliOverrides {
    /// Rolling volatility window in trading days.
    #[arg(long)]
    pub window: Option<usize>,

    /// Report raw (daily) instead of annualized volatility.
    #[arg(long)]
    pub no_annualize: bool,
}

#[cfg(feature = "clap")]
impl Config {
    pub fn apply_overrides(&mut self, overrides: &CliOverrides) {
        if let Some(window) = overrides.window {
            self.analytics.window = window;
        }
        if overrides.no_annualize {
            self.analytics.annualize = false;
        }
    }
}
