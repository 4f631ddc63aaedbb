//! Calculator state and its transitions
//!
//! Every transition consumes the state and returns the next one; nothing here
//! touches the store or the network.

use serde::Serialize;

use crate::performance::{AircraftProfile, PerformanceReport, compute_performance};

/// Inputs the pilot can change
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SelectProfile(String),
    SetWeight(f64),
    SetGustFactor(f64),
    /// Weight preset label of the active profile, case-insensitive
    ApplyPreset(String),
    AddProfile(AircraftProfile),
    RemoveProfile(String),
}

/// Calculator inputs over a profile collection that is never empty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppState {
    profiles: Vec<AircraftProfile>,
    active_profile_id: String,
    /// Gross weight in pounds
    pub weight: f64,
    /// Gust factor in knots
    pub gust_factor: f64,
}

fn max_weight(profile: &AircraftProfile) -> f64 {
    profile.weight_range().map_or(0.0, |(_, max)| max)
}

impl AppState {
    /// Initial state; the active id falls back to the first profile.
    ///
    /// An empty collection is replaced by the built-in default profile.
    #[must_use]
    pub fn new(profiles: Vec<AircraftProfile>, active_profile_id: Option<&str>) -> Self {
        let profiles = if profiles.is_empty() {
            vec![AircraftProfile::builtin_default()]
        } else {
            profiles
        };
        let active = active_profile_id
            .and_then(|id| profiles.iter().find(|p| p.id == id))
            .unwrap_or(&profiles[0]);
        let active_profile_id = active.id.clone();
        let weight = max_weight(active);

        Self {
            profiles,
            active_profile_id,
            weight,
            gust_factor: 0.0,
        }
    }

    #[must_use]
    pub fn profiles(&self) -> &[AircraftProfile] {
        &self.profiles
    }

    #[must_use]
    pub fn active_profile_id(&self) -> &str {
        &self.active_profile_id
    }

    #[must_use]
    pub fn active_profile(&self) -> &AircraftProfile {
        self.profiles
            .iter()
            .find(|p| p.id == self.active_profile_id)
            .unwrap_or(&self.profiles[0])
    }

    /// Speeds for the current inputs
    #[must_use]
    pub fn performance(&self) -> PerformanceReport {
        compute_performance(self.weight, self.gust_factor, self.active_profile())
    }

    #[must_use]
    pub fn reduce(mut self, action: Action) -> Self {
        match action {
            Action::SelectProfile(id) => {
                if id != self.active_profile_id {
                    if let Some(profile) = self.profiles.iter().find(|p| p.id == id) {
                        self.weight = max_weight(profile);
                        self.active_profile_id = id;
                    }
                }
            }
            Action::SetWeight(weight) => {
                if weight.is_finite() {
                    self.weight = weight;
                }
            }
            Action::SetGustFactor(gust_factor) => {
                self.gust_factor = if gust_factor.is_finite() && gust_factor > 0.0 {
                    gust_factor
                } else {
                    0.0
                };
            }
            Action::ApplyPreset(label) => {
                if let Some(weight) = self.active_profile().preset(&label).map(|p| p.weight) {
                    self.weight = weight;
                }
            }
            Action::AddProfile(profile) => {
                if let Some(index) = self.profiles.iter().position(|p| p.id == profile.id) {
                    self.profiles[index] = profile;
                } else {
                    self.profiles.push(profile);
                }
            }
            Action::RemoveProfile(id) => {
                if self.profiles.len() > 1 && self.profiles.iter().any(|p| p.id == id) {
                    self.profiles.retain(|p| p.id != id);
                    if self.active_profile_id == id {
                        self.active_profile_id = self.profiles[0].id.clone();
                        self.weight = max_weight(&self.profiles[0]);
                    }
                }
            }
        }
        self
    }
}
