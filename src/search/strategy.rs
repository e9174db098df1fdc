use crate::config::Strategy;
use fastrand::Rng;
use std::collections::HashMap;

/// Metric samples keyed by grid index.
pub type Scores = HashMap<usize, f64>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Grid indices that must be scored before `next` is called again.
    Evaluate(Vec<usize>),
    Converged(usize),
}

/// Proposes grid indices to measure and eventually settles on one.
/// Lower scores are better.
pub trait CandidateSearch: Send {
    fn next(&mut self, scores: &Scores) -> Step;
}

pub fn build(tag: Strategy, len: usize, start: usize, rng: Rng) -> Box<dyn CandidateSearch> {
    match tag {
        Strategy::Exhaustive => Box::new(ExhaustiveSearch::new(len)),
        Strategy::Random => Box::new(RandomSearch::new(len, rng)),
        Strategy::NelderMead => Box::new(NelderMeadSearch::new(len, start)),
        Strategy::ParallelRankOrder => Box::new(RankOrderSearch::new(len, start)),
    }
}

#[inline]
fn score(scores: &Scores, index: usize) -> f64 {
    scores.get(&index).copied().unwrap_or(f64::INFINITY)
}

/// Lowest-scoring index; ties go to the earliest candidate offered.
fn best_of<I: IntoIterator<Item = usize>>(scores: &Scores, indices: I) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for i in indices {
        let s = score(scores, i);
        match best {
            Some((_, b)) if s >= b => {}
            _ => best = Some((i, s)),
        }
    }
    best.map(|(i, _)| i)
}

// --- EXHAUSTIVE ---

pub struct ExhaustiveSearch {
    len: usize,
    swept: bool,
}

impl ExhaustiveSearch {
    pub fn new(len: usize) -> Self {
        Self { len, swept: false }
    }
}

impl CandidateSearch for ExhaustiveSearch {
    fn next(&mut self, scores: &Scores) -> Step {
        if !self.swept {
            self.swept = true;
            return Step::Evaluate((0..self.len).collect());
        }
        Step::Converged(best_of(scores, 0..self.len).unwrap_or(0))
    }
}

// --- RANDOM ---

pub struct RandomSearch {
    len: usize,
    rng: Rng,
    sampled: Option<Vec<usize>>,
}

impl RandomSearch {
    pub fn new(len: usize, rng: Rng) -> Self {
        Self {
            len,
            rng,
            sampled: None,
        }
    }

    /// Half of the grid, rounded up.
    pub fn budget(&self) -> usize {
        self.len.div_ceil(2).max(1)
    }
}

impl CandidateSearch for RandomSearch {
    fn next(&mut self, scores: &Scores) -> Step {
        match &self.sampled {
            None => {
                let mut picks: Vec<usize> = (0..self.len).collect();
                self.rng.shuffle(&mut picks);
                picks.truncate(self.budget());
                self.sampled = Some(picks.clone());
                Step::Evaluate(picks)
            }
            Some(picks) => Step::Converged(best_of(scores, picks.iter().copied()).unwrap_or(0)),
        }
    }
}

// --- NELDER-MEAD (1-D simplex over grid indices) ---

#[derive(Debug, Clone, Copy)]
enum SimplexPhase {
    Init,
    Order,
    Reflect(usize),
    Expand(usize, usize),
    Contract(usize),
}

pub struct NelderMeadSearch {
    len: usize,
    best: usize,
    worst: usize,
    phase: SimplexPhase,
    iterations: usize,
    max_iterations: usize,
}

impl NelderMeadSearch {
    pub fn new(len: usize, start: usize) -> Self {
        let start = start.min(len.saturating_sub(1));
        // Adjacent vertices count as converged, so open the simplex wider.
        let stride = (len / 4).max(1);
        let neighbor = if start + stride < len {
            start + stride
        } else {
            start.saturating_sub(stride)
        };
        Self {
            len,
            best: start,
            worst: neighbor,
            phase: SimplexPhase::Init,
            iterations: 0,
            max_iterations: len.saturating_mul(4).saturating_add(8),
        }
    }

    fn clamp(&self, index: i64) -> usize {
        index.clamp(0, self.len as i64 - 1) as usize
    }

    /// Point at `best + factor * (best - worst)`, clamped to the grid.
    fn along(&self, factor: i64) -> usize {
        let b = self.best as i64;
        let w = self.worst as i64;
        self.clamp(b + factor * (b - w))
    }

    fn order_and_reflect(&mut self, scores: &Scores) -> Step {
        if score(scores, self.worst) < score(scores, self.best) {
            std::mem::swap(&mut self.best, &mut self.worst);
        }
        self.iterations += 1;

        if self.best.abs_diff(self.worst) <= 1 || self.iterations > self.max_iterations {
            return Step::Converged(self.best);
        }

        let r = self.along(1);
        if r == self.best || r == self.worst {
            return self.contract();
        }
        self.phase = SimplexPhase::Reflect(r);
        Step::Evaluate(vec![r])
    }

    fn contract(&mut self) -> Step {
        let b = self.best as i64;
        let w = self.worst as i64;
        // Truncation keeps k strictly between best and worst (they differ by >= 2).
        let k = (b + (w - b) / 2) as usize;
        self.phase = SimplexPhase::Contract(k);
        Step::Evaluate(vec![k])
    }
}

impl CandidateSearch for NelderMeadSearch {
    fn next(&mut self, scores: &Scores) -> Step {
        if self.len <= 1 {
            return Step::Converged(0);
        }

        match self.phase {
            SimplexPhase::Init => {
                self.phase = SimplexPhase::Order;
                Step::Evaluate(vec![self.best, self.worst])
            }
            SimplexPhase::Order => self.order_and_reflect(scores),
            SimplexPhase::Reflect(r) => {
                let fr = score(scores, r);
                if fr < score(scores, self.best) {
                    let e = self.along(2);
                    if e != r {
                        self.phase = SimplexPhase::Expand(r, e);
                        return Step::Evaluate(vec![e]);
                    }
                    self.worst = r;
                    self.order_and_reflect(scores)
                } else if fr < score(scores, self.worst) {
                    self.worst = r;
                    self.order_and_reflect(scores)
                } else {
                    self.contract()
                }
            }
            SimplexPhase::Expand(r, e) => {
                self.worst = if score(scores, e) < score(scores, r) { e } else { r };
                self.order_and_reflect(scores)
            }
            // In one dimension shrink and contraction land on the same point.
            SimplexPhase::Contract(k) => {
                self.worst = k;
                self.order_and_reflect(scores)
            }
        }
    }
}

// --- PARALLEL RANK ORDER ---

const RANK_ORDER_POINTS: usize = 4;

#[derive(Debug, Clone)]
enum RankPhase {
    Init,
    Rank,
    Reflect(Vec<usize>),
    Expand(Vec<usize>, Vec<usize>),
}

pub struct RankOrderSearch {
    len: usize,
    best: usize,
    others: Vec<usize>,
    phase: RankPhase,
    iterations: usize,
    max_iterations: usize,
}

impl RankOrderSearch {
    pub fn new(len: usize, start: usize) -> Self {
        let start = start.min(len.saturating_sub(1));
        let k = RANK_ORDER_POINTS.min(len);
        let mut others: Vec<usize> = if k > 1 {
            (0..k).map(|i| i * (len - 1) / (k - 1)).collect()
        } else {
            Vec::new()
        };
        others.retain(|&i| i != start);
        others.dedup();

        Self {
            len,
            best: start,
            others,
            phase: RankPhase::Init,
            iterations: 0,
            max_iterations: len.saturating_mul(4).saturating_add(8),
        }
    }

    fn clamp(&self, index: i64) -> usize {
        index.clamp(0, self.len as i64 - 1) as usize
    }

    fn project(&self, factor: i64) -> Vec<usize> {
        let b = self.best as i64;
        self.others
            .iter()
            .map(|&v| self.clamp(b + factor * (b - v as i64)))
            .collect()
    }

    fn set_vertices(&mut self, candidates: Vec<usize>) {
        let best = self.best;
        let mut others = candidates;
        others.sort_unstable();
        others.dedup();
        others.retain(|&i| i != best);
        self.others = others;
    }

    fn rank(&mut self, scores: &Scores) -> Step {
        let all = std::iter::once(self.best).chain(self.others.iter().copied());
        let best = best_of(scores, all).unwrap_or(self.best);
        if best != self.best {
            let mut vertices = std::mem::take(&mut self.others);
            vertices.push(self.best);
            self.best = best;
            self.set_vertices(vertices);
        }
        self.iterations += 1;

        let collapsed = self.others.iter().all(|&v| v.abs_diff(self.best) <= 1);
        if collapsed || self.iterations > self.max_iterations {
            return Step::Converged(self.best);
        }

        let reflected = self.project(1);
        self.phase = RankPhase::Reflect(reflected.clone());
        Step::Evaluate(reflected)
    }

    fn shrink(&mut self) -> Step {
        let b = self.best as i64;
        let shrunk: Vec<usize> = self
            .others
            .iter()
            .map(|&v| (b + (v as i64 - b) / 2) as usize)
            .collect();
        self.set_vertices(shrunk);
        self.phase = RankPhase::Rank;
        Step::Evaluate(self.others.clone())
    }
}

impl CandidateSearch for RankOrderSearch {
    fn next(&mut self, scores: &Scores) -> Step {
        if self.len <= 1 {
            return Step::Converged(0);
        }

        match std::mem::replace(&mut self.phase, RankPhase::Rank) {
            RankPhase::Init => {
                let mut batch = vec![self.best];
                batch.extend(self.others.iter().copied());
                Step::Evaluate(batch)
            }
            RankPhase::Rank => self.rank(scores),
            RankPhase::Reflect(reflected) => {
                let fb = score(scores, self.best);
                let improved = reflected.iter().any(|&r| score(scores, r) < fb);
                if improved {
                    let expanded = self.project(2);
                    self.phase = RankPhase::Expand(reflected, expanded.clone());
                    Step::Evaluate(expanded)
                } else {
                    self.shrink()
                }
            }
            RankPhase::Expand(reflected, expanded) => {
                let min_of = |v: &[usize]| {
                    v.iter()
                        .map(|&i| score(scores, i))
                        .fold(f64::INFINITY, f64::min)
                };
                let chosen = if min_of(&expanded) < min_of(&reflected) {
                    expanded
                } else {
                    reflected
                };
                self.set_vertices(chosen);
                self.rank(scores)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drives a search to convergence against `f`, returning the chosen index
    /// and how many distinct indices were scored.
    fn drive(search: &mut dyn CandidateSearch, f: impl Fn(usize) -> f64) -> (usize, usize) {
        let mut scores = Scores::new();
        for _ in 0..10_000 {
            match search.next(&scores) {
                Step::Evaluate(batch) => {
                    for i in batch {
                        scores.entry(i).or_insert_with(|| f(i));
                    }
                }
                Step::Converged(i) => return (i, scores.len()),
            }
        }
        panic!("search did not converge");
    }

    fn bowl(center: usize) -> impl Fn(usize) -> f64 {
        move |i| (i as f64 - center as f64).powi(2)
    }

    #[test]
    fn exhaustive_scores_every_candidate_and_picks_minimum() {
        let mut s = ExhaustiveSearch::new(11);
        let (best, scored) = drive(&mut s, bowl(7));
        assert_eq!(best, 7);
        assert_eq!(scored, 11);
    }

    #[test]
    fn random_scores_half_the_grid() {
        let mut s = RandomSearch::new(11, Rng::with_seed(42));
        let (best, scored) = drive(&mut s, bowl(3));
        assert_eq!(scored, 6);
        assert!(best < 11);
    }

    #[test]
    fn random_is_reproducible_with_a_seed() {
        let mut a = RandomSearch::new(20, Rng::with_seed(7));
        let mut b = RandomSearch::new(20, Rng::with_seed(7));
        assert_eq!(a.next(&Scores::new()), b.next(&Scores::new()));
    }

    #[test]
    fn nelder_mead_finds_bowl_minimum() {
        for center in [0, 3, 8, 10] {
            let mut s = NelderMeadSearch::new(11, 8);
            let (best, _) = drive(&mut s, bowl(center));
            assert_eq!(best, center, "center {}", center);
        }
    }

    #[test]
    fn nelder_mead_on_large_grid_scores_fewer_than_exhaustive() {
        let mut s = NelderMeadSearch::new(512, 63);
        let (best, scored) = drive(&mut s, bowl(400));
        assert_eq!(best, 400);
        assert!(scored < 512);
    }

    #[test]
    fn rank_order_finds_bowl_minimum() {
        for center in [0, 5, 10] {
            let mut s = RankOrderSearch::new(11, 8);
            let (best, _) = drive(&mut s, bowl(center));
            assert_eq!(best, center, "center {}", center);
        }
    }

    #[test]
    fn single_candidate_converges_immediately() {
        for tag in [
            Strategy::Exhaustive,
            Strategy::Random,
            Strategy::NelderMead,
            Strategy::ParallelRankOrder,
        ] {
            let mut s = build(tag, 1, 0, Rng::with_seed(1));
            let (best, _) = drive(s.as_mut(), |_| 1.0);
            assert_eq!(best, 0);
        }
    }

    #[test]
    fn flat_metric_still_converges() {
        let mut nm = NelderMeadSearch::new(11, 8);
        assert!(drive(&mut nm, |_| 0.0).0 < 11);
        let mut pro = RankOrderSearch::new(11, 8);
        assert!(drive(&mut pro, |_| 0.0).0 < 11);
    }
}
