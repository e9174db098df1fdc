pub mod strategy;

use self::strategy::{CandidateSearch, Scores, Step};
use crate::metric::MetricFn;
use crate::param::{ParamValue, TunableParam};
use crate::request::TuningSpec;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Live search state for one region.
///
/// `current_value` and `has_converged` are cheap reads of published state;
/// only `advance` moves the search forward.
pub trait TuningSession: Send + Sync {
    fn current_value(&self, param: &str) -> Option<ParamValue>;
    fn has_converged(&self) -> bool;
    /// Called once per trigger firing.
    fn advance(&self);
    /// Number of metric samples taken so far.
    fn evaluations(&self) -> usize;
}

/// Starts sessions for tuning requests.
pub trait SearchEngine: Send + Sync {
    fn setup_session(&self, spec: &TuningSpec) -> Box<dyn TuningSession>;
}

/// Built-in engine: searches the first parameter's candidate grid with the
/// strategy named by the request.
#[derive(Debug, Default, Clone, Copy)]
pub struct GridSearchEngine;

impl SearchEngine for GridSearchEngine {
    fn setup_session(&self, spec: &TuningSpec) -> Box<dyn TuningSession> {
        Box::new(GridSession::new(spec))
    }
}

struct SearchState {
    search: Box<dyn CandidateSearch>,
    scores: Scores,
    pending: VecDeque<usize>,
    held: usize,
}

pub struct GridSession {
    params: Vec<TunableParam>,
    metric: MetricFn,
    window: usize,
    current: AtomicUsize,
    converged: AtomicBool,
    evaluations: AtomicUsize,
    state: Mutex<SearchState>,
}

impl GridSession {
    pub fn new(spec: &TuningSpec) -> Self {
        let rng = match spec.seed {
            Some(s) => fastrand::Rng::with_seed(s),
            None => fastrand::Rng::new(),
        };

        let (len, start) = spec
            .params
            .first()
            .map(|p| (p.grid_len(), p.initial_index()))
            .unwrap_or((0, 0));

        Self {
            params: spec.params.clone(),
            metric: spec.metric.clone(),
            window: spec.window.max(1),
            current: AtomicUsize::new(start),
            converged: AtomicBool::new(len == 0),
            evaluations: AtomicUsize::new(0),
            state: Mutex::new(SearchState {
                search: strategy::build(spec.strategy, len, start, rng),
                scores: Scores::new(),
                pending: VecDeque::new(),
                held: 0,
            }),
        }
    }

    fn publish(&self, index: usize) {
        self.current.store(index, Ordering::Release);
    }
}

impl TuningSession for GridSession {
    fn current_value(&self, param: &str) -> Option<ParamValue> {
        let (position, found) = self
            .params
            .iter()
            .enumerate()
            .find(|(_, p)| p.name() == param)?;

        if position == 0 {
            Some(found.value_at(self.current.load(Ordering::Acquire)))
        } else {
            // Only the first parameter is searched; the rest stay at their initial value.
            Some(found.value_at(found.initial_index()))
        }
    }

    fn has_converged(&self) -> bool {
        self.converged.load(Ordering::Acquire)
    }

    fn advance(&self) {
        if self.has_converged() {
            return;
        }

        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Another caller may have finished the search while we waited.
        if self.has_converged() {
            return;
        }

        state.held += 1;
        if state.held < self.window {
            return;
        }
        state.held = 0;

        let measured = self.current.load(Ordering::Acquire);
        let value = (self.metric)();
        state.scores.insert(measured, value);
        self.evaluations.fetch_add(1, Ordering::Relaxed);

        loop {
            while let Some(next) = state.pending.pop_front() {
                if !state.scores.contains_key(&next) {
                    self.publish(next);
                    return;
                }
            }

            let SearchState { search, scores, .. } = &mut *state;
            match search.next(scores) {
                Step::Evaluate(batch) => state.pending.extend(batch),
                Step::Converged(best) => {
                    self.publish(best);
                    self.converged.store(true, Ordering::Release);
                    return;
                }
            }
        }
    }

    fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }
}
