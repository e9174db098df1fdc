use crate::config::Strategy;
use crate::metric::MetricFn;
use crate::param::{ParamValue, TunableParam};
use crate::search::{SearchEngine, TuningSession};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an event delivered by the trigger subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub u32);

impl EventId {
    pub const CUSTOM_EVENT_1: EventId = EventId(1);
    pub const CUSTOM_EVENT_2: EventId = EventId(2);
}

/// Payload delivered alongside an event. An absent slot means the caller
/// does not want a recommendation.
#[derive(Debug, Default)]
pub struct EventContext<'a> {
    pub slot: Option<&'a mut i64>,
}

impl<'a> EventContext<'a> {
    pub fn with_slot(slot: &'a mut i64) -> Self {
        Self { slot: Some(slot) }
    }

    pub fn empty() -> Self {
        Self { slot: None }
    }
}

/// Everything a search engine needs to start a session for one region.
pub struct TuningSpec {
    pub name: String,
    pub trigger: EventId,
    pub metric: MetricFn,
    pub strategy: Strategy,
    pub window: usize,
    pub seed: Option<u64>,
    pub params: Vec<TunableParam>,
}

impl TuningSpec {
    pub fn param(&self, name: &str) -> Option<&TunableParam> {
        self.params.iter().find(|p| p.name() == name)
    }
}

impl fmt::Debug for TuningSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TuningSpec")
            .field("name", &self.name)
            .field("trigger", &self.trigger)
            .field("strategy", &self.strategy)
            .field("window", &self.window)
            .field("seed", &self.seed)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A region's tuning configuration bound to its live session.
pub struct TuningRequest {
    spec: TuningSpec,
    session: Box<dyn TuningSession>,
    sequence: usize,
}

impl TuningRequest {
    /// Starts the session for `spec`. `sequence` records creation order.
    pub fn start(spec: TuningSpec, engine: &dyn SearchEngine, sequence: usize) -> Self {
        let session = engine.setup_session(&spec);
        Self {
            spec,
            session,
            sequence,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn trigger(&self) -> EventId {
        self.spec.trigger
    }

    pub fn strategy(&self) -> Strategy {
        self.spec.strategy
    }

    pub fn sequence(&self) -> usize {
        self.sequence
    }

    pub fn spec(&self) -> &TuningSpec {
        &self.spec
    }

    pub fn session(&self) -> &dyn TuningSession {
        self.session.as_ref()
    }

    pub fn current_value(&self, param: &str) -> Option<ParamValue> {
        self.session.current_value(param)
    }

    pub fn has_converged(&self) -> bool {
        self.session.has_converged()
    }

    /// Integer value of `param` in the live session.
    ///
    /// # Panics
    /// When the request was built without `param` or the session reports a
    /// non-integer value for it; both are construction bugs.
    pub fn long_value(&self, param: &str) -> i64 {
        match self.current_value(param) {
            Some(value) => value.as_i64().unwrap_or_else(|| {
                panic!(
                    "Parameter '{}' of region '{}' holds non-integer value '{}'",
                    param, self.spec.name, value
                )
            }),
            None => panic!(
                "Region '{}' has no tunable parameter named '{}'",
                self.spec.name, param
            ),
        }
    }
}

impl fmt::Debug for TuningRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TuningRequest")
            .field("spec", &self.spec)
            .field("sequence", &self.sequence)
            .field("converged", &self.has_converged())
            .finish()
    }
}
