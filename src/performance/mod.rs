//! Performance module
//!
//! Aircraft profiles and the speeds derived from them:
//! - POH stall speed tables per flap configuration
//! - Linear interpolation by gross weight
//! - Approach speed (1.3 Vs plus half the gust factor) and maneuvering speed

pub mod interpolation;
pub mod profile;

pub use interpolation::{PerformanceReport, compute_performance, interpolate};
pub use profile::{
    AircraftProfile, ConfigKey, ConfigurationDescriptor, PerformanceSample, ProfileBuilder,
    WeightPreset,
};
