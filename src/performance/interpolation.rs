//! Stall speed interpolation and derived approach speeds

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::profile::{AircraftProfile, ConfigKey, PerformanceSample};

/// Approach speed margin over stall (1.3 Vso)
pub const APPROACH_STALL_FACTOR: f64 = 1.3;
/// Share of the gust factor added to the approach speed
pub const GUST_CORRECTION_FACTOR: f64 = 0.5;

/// Speeds for one weight / gust combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub weight: f64,
    pub gust_factor: f64,
    pub stall_speeds: BTreeMap<ConfigKey, f64>,
    pub approach_speeds: BTreeMap<ConfigKey, f64>,
    /// Rounded to whole knots
    pub maneuvering_speed: f64,
    /// Maneuvering speed minus clean stall speed
    pub maneuvering_buffer: f64,
}

impl PerformanceReport {
    #[must_use]
    pub fn stall_speed(&self, key: ConfigKey) -> Option<f64> {
        self.stall_speeds.get(&key).copied()
    }

    #[must_use]
    pub fn approach_speed(&self, key: ConfigKey) -> Option<f64> {
        self.approach_speeds.get(&key).copied()
    }
}

/// Linearly interpolate the stall speed for `key` at `target_weight`.
///
/// `samples` must be ascending by weight. Weights outside the table clamp to
/// the nearest end; missing speeds read as 0.
#[must_use]
pub fn interpolate(target_weight: f64, key: ConfigKey, samples: &[PerformanceSample]) -> f64 {
    let Some(first) = samples.first() else {
        return 0.0;
    };

    let Some((min_weight, max_weight)) = samples
        .iter()
        .map(|s| s.weight)
        .filter(|w| w.is_finite())
        .fold(None, |range: Option<(f64, f64)>, w| match range {
            Some((lo, hi)) => Some((lo.min(w), hi.max(w))),
            None => Some((w, w)),
        })
    else {
        return first.speed(key);
    };
    let weight = if target_weight.is_nan() {
        min_weight
    } else {
        target_weight.clamp(min_weight, max_weight)
    };

    let bracket = samples
        .windows(2)
        .find(|pair| pair[0].weight <= weight && weight <= pair[1].weight);

    match bracket {
        Some([lower, upper]) => {
            let lower_speed = lower.speed(key);
            if lower.weight == upper.weight {
                return lower_speed;
            }
            let fraction = (weight - lower.weight) / (upper.weight - lower.weight);
            lower_speed + fraction * (upper.speed(key) - lower_speed)
        }
        _ => samples
            .iter()
            .find(|s| s.weight == weight)
            .unwrap_or(first)
            .speed(key),
    }
}

/// Stall, approach and maneuvering speeds for `profile` at `weight`.
#[must_use]
pub fn compute_performance(weight: f64, gust_factor: f64, profile: &AircraftProfile) -> PerformanceReport {
    let gust_factor = if gust_factor.is_finite() { gust_factor } else { 0.0 };
    let mut stall_speeds = BTreeMap::new();
    let mut approach_speeds = BTreeMap::new();

    for descriptor in &profile.configurations {
        let stall = interpolate(weight, descriptor.key, &profile.samples);
        stall_speeds.insert(descriptor.key, stall);
        approach_speeds.insert(
            descriptor.key,
            stall * APPROACH_STALL_FACTOR + gust_factor * GUST_CORRECTION_FACTOR,
        );
    }

    let clean_stall = stall_speeds
        .get(&ConfigKey::Clean)
        .copied()
        .unwrap_or_else(|| interpolate(weight, ConfigKey::Clean, &profile.samples));
    let maneuvering_speed = (clean_stall * profile.dmms_factor).round();

    debug!(
        profile = %profile.id,
        weight,
        gust_factor,
        maneuvering_speed,
        "computed performance"
    );

    PerformanceReport {
        weight,
        gust_factor,
        stall_speeds,
        approach_speeds,
        maneuvering_speed,
        maneuvering_buffer: maneuvering_speed - clean_stall,
    }
}
