use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_logging;
#[cfg(feature = "clap")]
pub use settings::CliOverrides;
pub use settings::{AnalyticsSettings, Config, FilterSettings, LoggingConfig, SyncSettings};

/// Loads the dashboard configuration.
///
/// Reads `path` when given (it must exist), otherwise an optional `dashboard.toml`
/// in the working directory, then layers `DASHBOARD__SECTION__KEY` environment
/// variables on top. Every field has a default, so an empty source is valid.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();
    builder = match path {
        Some(path) => builder.add_source(config::File::from(path).required(true)),
        None => builder.add_source(config::File::with_name("dashboard").required(false)),
    };

    let settings = builder
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = settings.try_deserialize::<Config>()?;
    config.validate()?;

    tracing::debug!(?config, "Configuration loaded.");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use std::time::Duration;

    fn write_toml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = write_toml("");
        let config = load_config(Some(file.path())).expect("defaults are valid");
        assert_eq!(config.analytics.window, 20);
        assert!(config.analytics.annualize);
        assert_eq!(config.sync.brush_debounce, Duration::from_millis(300));
        assert_eq!(
            config.filters.data_max,
            NaiveDate::from_ymd_opt(2022, 9, 30).unwrap()
        );
    }

    #[test]
    fn reads_sections_and_humantime_durations() {
        let file = write_toml(
            r#"
            [analytics]
            window = 30
            annualize = false

            [filters]
            data_min = "2000-01-03"
            data_max = "2010-12-31"

            [sync]
            brush_debounce = "450ms"
            "#,
        );
        let config = load_config(Some(file.path())).expect("valid config");
        assert_eq!(config.analytics.window, 30);
        assert!(!config.analytics.annualize);
        assert_eq!(config.analytics.primary_padding, 0.10);
        assert_eq!(config.sync.brush_debounce, Duration::from_millis(450));
        assert_eq!(
            config.filters.default_state().start_date,
            NaiveDate::from_ymd_opt(2009, 12, 31).unwrap()
        );
    }

    #[test]
    fn rejects_zero_window() {
        let file = write_toml("[analytics]\nwindow = 0\n");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn rejects_a_debounce_faster_than_the_floor() {
        let file = write_toml("[sync]\nbrush_debounce = \"50ms\"\n");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("brush_debounce"));
    }

    #[test]
    fn rejects_inverted_dataset_bounds() {
        let mut config = Config::default();
        config.filters.data_min = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/dashboard.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }
}
