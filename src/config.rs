//! Configuration management for the approach speed calculator
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::AppError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Weather proxy configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Profile store configuration
    #[serde(default)]
    pub store: StoreConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Default calculator inputs
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Weather fetch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// CORS proxy prefix; the url-encoded source URL is appended to it
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,
    /// Weather page URL, `{station}` is replaced with the station code
    #[serde(default = "default_source_url")]
    pub source_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
    /// Station used when none is given on the command line
    pub default_station: Option<String>,
}

/// Profile store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store directory location
    #[serde(default = "default_store_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Default calculator inputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Gust factor in knots used when none is given
    #[serde(default)]
    pub gust_factor: f64,
}

// Default value functions
fn default_proxy_url() -> String {
    "https://api.allorigins.win/get?url=".to_string()
}

fn default_source_url() -> String {
    "https://metar-taf.com/{station}".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_store_location() -> String {
    dirs::data_dir()
        .map(|dir| dir.join("approachspeed"))
        .unwrap_or_else(|| PathBuf::from("approachspeed-data"))
        .to_string_lossy()
        .into_owned()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            proxy_url: default_proxy_url(),
            source_url: default_source_url(),
            timeout_seconds: default_weather_timeout(),
            default_station: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: default_store_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self { gust_factor: 0.0 }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // APPROACHSPEED_WEATHER__PROXY_URL etc.
        builder = builder.add_source(
            Environment::with_prefix("APPROACHSPEED")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AppConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("approachspeed").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.weather.proxy_url.is_empty() {
            self.weather.proxy_url = default_proxy_url();
        }
        if self.weather.source_url.is_empty() {
            self.weather.source_url = default_source_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self
            .weather
            .default_station
            .as_deref()
            .is_some_and(|s| s.trim().is_empty())
        {
            self.weather.default_station = None;
        }
        if self.store.location.is_empty() {
            self.store.location = default_store_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds > 300 {
            return Err(
                AppError::config("Weather request timeout cannot exceed 300 seconds").into(),
            );
        }

        let gust = self.defaults.gust_factor;
        if !gust.is_finite() || !(0.0..=50.0).contains(&gust) {
            return Err(
                AppError::config("Default gust factor must be between 0 and 50 knots").into(),
            );
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(AppError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(AppError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("proxy", &self.weather.proxy_url),
            ("source", &self.weather.source_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AppError::config(format!(
                    "Weather {name} URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if !self.weather.source_url.contains("{station}") {
            return Err(AppError::config(
                "Weather source URL must contain a {station} placeholder",
            )
            .into());
        }

        Ok(())
    }

    /// Directory of the profile store
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(&self.store.location)
    }
}
