//! Classification configuration loading.
//!
//! The embedded `default_config.toml` is used unless a config file is
//! given. Thresholds are validated on load so a bad file fails startup
//! rather than a request.

use std::path::Path;

use hotspot_map_analysis_models::{AnalysisConfig, MonthDefinition, MonthPlan};

use crate::AnalysisError;

/// The default configuration, embedded at compile time.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../default_config.toml");

/// Returns the embedded default configuration.
///
/// # Panics
///
/// Panics if the embedded TOML is invalid, which is a development error
/// caught by the tests below.
#[must_use]
pub fn default_config() -> AnalysisConfig {
    parse_config(DEFAULT_CONFIG_TOML)
        .unwrap_or_else(|e| panic!("Embedded default config is invalid: {e}"))
}

/// Parses and validates a configuration from TOML text.
///
/// # Errors
///
/// Returns [`AnalysisError::Toml`] for syntax errors and
/// [`AnalysisError::Threshold`] for inconsistent thresholds.
pub fn parse_config(content: &str) -> Result<AnalysisConfig, AnalysisError> {
    let config: AnalysisConfig = toml::de::from_str(content)?;
    config.labels.validate()?;
    Ok(config)
}

/// Loads the configuration from `path`, or the embedded default if `None`.
///
/// # Errors
///
/// Returns [`AnalysisError`] if the file cannot be read or is invalid.
pub fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, AnalysisError> {
    let Some(path) = path else {
        log::info!("Using embedded default classification config");
        return Ok(default_config());
    };
    let content = std::fs::read_to_string(path).map_err(|e| AnalysisError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let config = parse_config(&content)?;
    log::info!("Loaded classification config from {}", path.display());
    Ok(config)
}

/// Validates per-month policy overrides.
///
/// # Errors
///
/// Returns [`AnalysisError::Threshold`] for the first invalid override.
pub fn validate_months(months: &[MonthDefinition]) -> Result<(), AnalysisError> {
    for month in months {
        if let MonthPlan::Historical {
            policy: Some(policy),
            ..
        } = &month.plan
        {
            policy.validate()?;
        }
    }
    Ok(())
}
