use crate::profile::ProfileSource;
use std::sync::Arc;
use tracing::info;

/// The objective a search strategy minimizes. Must not fail.
pub type MetricFn = Arc<dyn Fn() -> f64 + Send + Sync>;

/// Reduces a region's profile to mean time per call.
#[derive(Clone)]
pub struct MetricSource {
    profiles: Arc<dyn ProfileSource>,
    verbose: bool,
}

impl MetricSource {
    pub fn new(profiles: Arc<dyn ProfileSource>, verbose: bool) -> Self {
        Self { profiles, verbose }
    }

    /// Returns 0.0 while the region has no profile or no calls yet.
    pub fn evaluate(&self, region: &str) -> f64 {
        let Some(profile) = self.profiles.get_profile(region) else {
            return 0.0;
        };
        if profile.calls == 0.0 {
            return 0.0;
        }

        let result = profile.accumulated / profile.calls;
        if self.verbose {
            info!("time per call: {}", result);
        }
        result
    }

    /// Binds this source to `region`, yielding the closure a request carries.
    pub fn for_region(&self, region: &str) -> MetricFn {
        let source = self.clone();
        let region = region.to_string();
        Arc::new(move || source.evaluate(&region))
    }
}
