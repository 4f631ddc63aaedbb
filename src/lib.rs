//! `approachspeed` - Aircraft approach speed calculator
//!
//! This library interpolates stall speeds from POH performance tables,
//! derives approach and maneuvering speeds, and extracts METAR/TAF gust
//! information from scraped weather pages.

pub mod config;
pub mod error;
pub mod logging;
pub mod performance;
pub mod state;
pub mod store;
pub mod weather;

// Re-export core types for public API
pub use config::AppConfig;
pub use error::AppError;
pub use performance::{AircraftProfile, ConfigKey, PerformanceReport, compute_performance, interpolate};
pub use state::{Action, AppState};
pub use store::ProfileStore;
pub use weather::{
    TafEntry, TafEntryKind, WeatherClient, WeatherReport, extract_gust, parse_forecast,
    parse_report, select_active,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
