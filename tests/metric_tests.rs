use coalesce_tuner::metric::MetricSource;
use coalesce_tuner::{Profile, ProfileSource, ProfileStore};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

/// Source that reports the same profile for every region.
struct FixedProfile(Profile);

impl ProfileSource for FixedProfile {
    fn get_profile(&self, _region: &str) -> Option<Profile> {
        Some(self.0)
    }
}

fn source(profile: Profile) -> MetricSource {
    MetricSource::new(Arc::new(FixedProfile(profile)), false)
}

#[test]
fn test_missing_profile_measures_zero() {
    let metrics = MetricSource::new(Arc::new(ProfileStore::new()), false);
    assert_eq!(metrics.evaluate("never ran"), 0.0);
}

#[test]
fn test_zero_calls_measures_zero() {
    let metrics = source(Profile {
        accumulated: 5.0,
        calls: 0.0,
    });
    assert_eq!(metrics.evaluate("R"), 0.0);
}

#[test]
fn test_metric_is_mean_time_per_call() {
    let store = Arc::new(ProfileStore::new());
    store.sample_value("R", 1.0);
    store.sample_value("R", 2.0);
    store.sample_value("R", 3.0);
    store.sample_value("other", 100.0);

    let metrics = MetricSource::new(store.clone(), true);
    assert_eq!(metrics.evaluate("R"), 2.0);
    assert_eq!(metrics.evaluate("other"), 100.0);

    let bound = metrics.for_region("R");
    assert_eq!(bound(), 2.0);

    store.sample_value("R", 6.0);
    assert_eq!(bound(), 3.0);
}

#[test]
fn test_recorded_durations_and_reset() {
    let store = Arc::new(ProfileStore::new());
    store.record("R", Duration::from_millis(500));
    store.record("R", Duration::from_millis(1500));

    let metrics = MetricSource::new(store.clone(), false);
    assert!((metrics.evaluate("R") - 1.0).abs() < 1e-12);

    store.reset("R");
    assert!(store.get_profile("R").is_none());
    assert_eq!(metrics.evaluate("R"), 0.0);
}

proptest! {
    #[test]
    fn prop_metric_matches_profile_ratio(accumulated in 0.0f64..1e6, calls in 1.0f64..1e6) {
        let metrics = source(Profile { accumulated, calls });
        let first = metrics.evaluate("R");
        prop_assert_eq!(first, accumulated / calls);
        // No hidden state between evaluations.
        prop_assert_eq!(metrics.evaluate("R"), first);
    }
}
