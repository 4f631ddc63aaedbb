//! Aircraft performance profiles
//!
//! A profile is a POH-derived stall speed table: weight-ascending samples,
//! each holding a stall speed per flap configuration.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AppError, Result};

/// Flap / gear configuration a stall speed is published for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigKey {
    /// Flaps up
    Clean,
    /// Takeoff flap setting
    Takeoff,
    /// Intermediate approach flap setting
    Approach,
    /// Full landing flaps
    Landing,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 4] = [
        ConfigKey::Clean,
        ConfigKey::Takeoff,
        ConfigKey::Approach,
        ConfigKey::Landing,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::Clean => "clean",
            ConfigKey::Takeoff => "takeoff",
            ConfigKey::Approach => "approach",
            ConfigKey::Landing => "landing",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.as_str() == wanted)
            .ok_or_else(|| AppError::validation(format!("unknown configuration '{s}'")))
    }
}

/// One row of the performance table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSample {
    /// Gross weight in pounds
    pub weight: f64,
    /// Stall speed in knots per configuration
    pub speeds: BTreeMap<ConfigKey, f64>,
}

impl PerformanceSample {
    #[must_use]
    pub fn new(weight: f64) -> Self {
        Self {
            weight,
            speeds: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_speed(mut self, key: ConfigKey, speed: f64) -> Self {
        self.speeds.insert(key, speed);
        self
    }

    /// Stall speed for `key`; absent entries read as 0.
    #[must_use]
    pub fn speed(&self, key: ConfigKey) -> f64 {
        self.speeds.get(&key).copied().unwrap_or(0.0)
    }
}

/// How a configuration is presented to the pilot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationDescriptor {
    pub key: ConfigKey,
    /// e.g. "Flaps 30°"
    pub label: String,
    /// e.g. "Vso"
    pub sub_label: String,
    /// Emphasized in output (typically the normal landing configuration)
    pub highlight: bool,
}

impl ConfigurationDescriptor {
    #[must_use]
    pub fn new(key: ConfigKey, label: &str, sub_label: &str) -> Self {
        Self {
            key,
            label: label.to_string(),
            sub_label: sub_label.to_string(),
            highlight: false,
        }
    }

    #[must_use]
    pub fn highlighted(mut self) -> Self {
        self.highlight = true;
        self
    }
}

/// Named weight shortcut such as "Solo" or "Max gross"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightPreset {
    pub label: String,
    pub weight: f64,
}

/// Complete performance profile for one aircraft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftProfile {
    pub id: String,
    pub name: String,
    pub configurations: Vec<ConfigurationDescriptor>,
    /// Ascending by weight
    pub samples: Vec<PerformanceSample>,
    /// Multiplier applied to the clean stall speed for the maneuvering speed
    pub dmms_factor: f64,
    pub weight_presets: Vec<WeightPreset>,
}

impl AircraftProfile {
    /// Built-in Cessna 172S table (KCAS, most forward CG).
    #[must_use]
    pub fn builtin_default() -> Self {
        let sample = |weight: f64, clean: f64, takeoff: f64, landing: f64| {
            PerformanceSample::new(weight)
                .with_speed(ConfigKey::Clean, clean)
                .with_speed(ConfigKey::Takeoff, takeoff)
                .with_speed(ConfigKey::Landing, landing)
        };

        Self {
            id: "c172s".to_string(),
            name: "Cessna 172S".to_string(),
            configurations: vec![
                ConfigurationDescriptor::new(ConfigKey::Clean, "Flaps UP", "Vs1"),
                ConfigurationDescriptor::new(ConfigKey::Takeoff, "Flaps 10°", "Vs"),
                ConfigurationDescriptor::new(ConfigKey::Landing, "Flaps 30°", "Vso").highlighted(),
            ],
            samples: vec![
                sample(1900.0, 41.0, 37.0, 35.0),
                sample(2200.0, 45.0, 40.0, 37.0),
                sample(2550.0, 48.0, 43.0, 40.0),
            ],
            dmms_factor: 1.404,
            weight_presets: vec![
                WeightPreset {
                    label: "Solo".to_string(),
                    weight: 1900.0,
                },
                WeightPreset {
                    label: "Dual".to_string(),
                    weight: 2200.0,
                },
                WeightPreset {
                    label: "Max gross".to_string(),
                    weight: 2550.0,
                },
            ],
        }
    }

    /// Lightest and heaviest tabulated weight.
    ///
    /// Returns `None` for a profile without samples.
    #[must_use]
    pub fn weight_range(&self) -> Option<(f64, f64)> {
        let first = self.samples.first()?;
        Some(self.samples.iter().fold((first.weight, first.weight), |(lo, hi), s| {
            (lo.min(s.weight), hi.max(s.weight))
        }))
    }

    #[must_use]
    pub fn configuration(&self, key: ConfigKey) -> Option<&ConfigurationDescriptor> {
        self.configurations.iter().find(|c| c.key == key)
    }

    #[must_use]
    pub fn preset(&self, label: &str) -> Option<&WeightPreset> {
        self.weight_presets
            .iter()
            .find(|p| p.label.eq_ignore_ascii_case(label.trim()))
    }

    /// Order samples by ascending weight, as the interpolator expects.
    pub fn sort_samples(&mut self) {
        self.samples.sort_by(|a, b| a.weight.total_cmp(&b.weight));
    }

    /// Check the table before it is handed to the interpolator.
    ///
    /// A speed missing from a sample would otherwise interpolate as 0 kt.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(AppError::validation("profile id cannot be empty"));
        }
        if self.samples.is_empty() {
            return Err(AppError::validation(format!(
                "profile '{}' has no performance samples",
                self.id
            )));
        }
        if self.configurations.is_empty() {
            return Err(AppError::validation(format!(
                "profile '{}' declares no configurations",
                self.id
            )));
        }

        let mut seen = BTreeSet::new();
        for descriptor in &self.configurations {
            if !seen.insert(descriptor.key) {
                return Err(AppError::validation(format!(
                    "configuration '{}' is declared twice",
                    descriptor.key
                )));
            }
        }

        for sample in &self.samples {
            if !sample.weight.is_finite() || sample.weight <= 0.0 {
                return Err(AppError::validation(format!(
                    "sample weight {} must be a positive number",
                    sample.weight
                )));
            }
            for descriptor in &self.configurations {
                match sample.speeds.get(&descriptor.key) {
                    Some(speed) if speed.is_finite() && *speed > 0.0 => {}
                    Some(speed) => {
                        return Err(AppError::validation(format!(
                            "speed {speed} for '{}' at {} lb must be positive",
                            descriptor.key, sample.weight
                        )));
                    }
                    None => {
                        return Err(AppError::validation(format!(
                            "sample at {} lb has no speed for '{}'",
                            sample.weight, descriptor.key
                        )));
                    }
                }
            }
        }

        if self.samples.windows(2).any(|pair| pair[0].weight > pair[1].weight) {
            return Err(AppError::validation(
                "performance samples must be ordered by ascending weight",
            ));
        }

        if !self.dmms_factor.is_finite() || self.dmms_factor <= 0.0 {
            return Err(AppError::validation("maneuvering factor must be positive"));
        }

        if let Some(preset) = self
            .weight_presets
            .iter()
            .find(|p| !p.weight.is_finite() || p.weight <= 0.0)
        {
            return Err(AppError::validation(format!(
                "preset '{}' must have a positive weight",
                preset.label
            )));
        }

        Ok(())
    }
}

/// Assembles a profile from user-entered data, the way the setup wizard does.
#[derive(Debug, Default)]
pub struct ProfileBuilder {
    id: Option<String>,
    name: String,
    configurations: Vec<ConfigurationDescriptor>,
    samples: Vec<PerformanceSample>,
    dmms_factor: Option<f64>,
    weight_presets: Vec<WeightPreset>,
}

impl ProfileBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn configuration(mut self, descriptor: ConfigurationDescriptor) -> Self {
        self.configurations.push(descriptor);
        self
    }

    #[must_use]
    pub fn sample(mut self, sample: PerformanceSample) -> Self {
        self.samples.push(sample);
        self
    }

    #[must_use]
    pub fn dmms_factor(mut self, factor: f64) -> Self {
        self.dmms_factor = Some(factor);
        self
    }

    #[must_use]
    pub fn preset(mut self, label: impl Into<String>, weight: f64) -> Self {
        self.weight_presets.push(WeightPreset {
            label: label.into(),
            weight,
        });
        self
    }

    /// Sort samples by weight, derive the id and validate.
    pub fn build(self) -> Result<AircraftProfile> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("profile name cannot be empty"));
        }

        let id = self.id.unwrap_or_else(|| slugify(&name));
        let mut profile = AircraftProfile {
            id,
            name,
            configurations: self.configurations,
            samples: self.samples,
            dmms_factor: self.dmms_factor.unwrap_or(AircraftProfile::builtin_default().dmms_factor),
            weight_presets: self.weight_presets,
        };
        profile.sort_samples();
        profile.validate()?;
        Ok(profile)
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn two_config_builder() -> ProfileBuilder {
        ProfileBuilder::new("Piper PA-28-161 Warrior")
            .configuration(ConfigurationDescriptor::new(ConfigKey::Clean, "Flaps 0°", "Vs1"))
            .configuration(
                ConfigurationDescriptor::new(ConfigKey::Landing, "Flaps 40°", "Vso").highlighted(),
            )
    }

    #[test]
    fn test_builtin_default_is_valid() {
        let profile = AircraftProfile::builtin_default();
        assert!(profile.validate().is_ok());
        assert_eq!(profile.weight_range(), Some((1900.0, 2550.0)));
        assert!(profile.configuration(ConfigKey::Landing).unwrap().highlight);
        assert_eq!(profile.preset("max GROSS").unwrap().weight, 2550.0);
    }

    #[test]
    fn test_builder_sorts_samples_and_slugifies() {
        let profile = two_config_builder()
            .sample(
                PerformanceSample::new(2440.0)
                    .with_speed(ConfigKey::Clean, 50.0)
                    .with_speed(ConfigKey::Landing, 44.0),
            )
            .sample(
                PerformanceSample::new(1900.0)
                    .with_speed(ConfigKey::Clean, 44.0)
                    .with_speed(ConfigKey::Landing, 39.0),
            )
            .build()
            .unwrap();

        assert_eq!(profile.id, "piper-pa-28-161-warrior");
        assert_eq!(profile.samples[0].weight, 1900.0);
        assert_eq!(profile.samples[1].weight, 2440.0);
        assert_eq!(profile.dmms_factor, 1.404);
    }

    #[test]
    fn test_builder_rejects_missing_speed() {
        let result = two_config_builder()
            .sample(PerformanceSample::new(2000.0).with_speed(ConfigKey::Clean, 45.0))
            .build();
        let message = result.unwrap_err().to_string();
        assert!(message.contains("no speed for 'landing'"), "{message}");
    }

    #[test]
    fn test_builder_rejects_empty_table_and_name() {
        assert!(two_config_builder().build().is_err());
        assert!(ProfileBuilder::new("   ").build().is_err());
    }

    #[test]
    fn test_validate_rejects_unsorted_samples() {
        let mut profile = AircraftProfile::builtin_default();
        profile.samples.swap(0, 2);
        let message = profile.validate().unwrap_err().to_string();
        assert!(message.contains("ascending"));
    }

    #[test]
    fn test_validate_rejects_duplicate_configuration() {
        let mut profile = AircraftProfile::builtin_default();
        profile
            .configurations
            .push(ConfigurationDescriptor::new(ConfigKey::Clean, "again", ""));
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_missing_speed_reads_as_zero() {
        let sample = PerformanceSample::new(2000.0).with_speed(ConfigKey::Clean, 45.0);
        assert_eq!(sample.speed(ConfigKey::Clean), 45.0);
        assert_eq!(sample.speed(ConfigKey::Approach), 0.0);
    }

    #[rstest]
    #[case("clean", ConfigKey::Clean)]
    #[case("Landing", ConfigKey::Landing)]
    #[case(" TAKEOFF ", ConfigKey::Takeoff)]
    #[case("approach", ConfigKey::Approach)]
    fn test_config_key_from_str(#[case] input: &str, #[case] expected: ConfigKey) {
        assert_eq!(input.parse::<ConfigKey>().unwrap(), expected);
    }

    #[test]
    fn test_config_key_serializes_snake_case() {
        let json = serde_json::to_string(&ConfigKey::Landing).unwrap();
        assert_eq!(json, "\"landing\"");
        assert!("flaps".parse::<ConfigKey>().is_err());
    }

    #[test]
    fn test_profile_json_round_trip_keeps_typed_keys() {
        let profile = AircraftProfile::builtin_default();
        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("\"clean\":48.0"));
        let back: AircraftProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
    }
}
