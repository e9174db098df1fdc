use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Accumulated statistics for one region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub accumulated: f64,
    pub calls: f64,
}

/// Read side of the profiling subsystem. Absence of a profile is normal
/// before a region has run.
pub trait ProfileSource: Send + Sync {
    fn get_profile(&self, region: &str) -> Option<Profile>;
}

/// In-process profile accumulator keyed by region name.
#[derive(Debug, Default)]
pub struct ProfileStore {
    profiles: DashMap<String, Profile>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one observation of `value` to `region`.
    pub fn sample_value(&self, region: &str, value: f64) {
        // Fast path avoids allocating the key for regions already present.
        if let Some(mut profile) = self.profiles.get_mut(region) {
            profile.accumulated += value;
            profile.calls += 1.0;
            return;
        }
        let mut profile = self.profiles.entry(region.to_string()).or_default();
        profile.accumulated += value;
        profile.calls += 1.0;
    }

    /// Records one timed call, in seconds.
    pub fn record(&self, region: &str, elapsed: Duration) {
        self.sample_value(region, elapsed.as_secs_f64());
    }

    pub fn reset(&self, region: &str) {
        self.profiles.remove(region);
    }
}

impl ProfileSource for ProfileStore {
    fn get_profile(&self, region: &str) -> Option<Profile> {
        self.profiles.get(region).map(|p| *p)
    }
}
