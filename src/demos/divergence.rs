//! Drift/recovery comparison.
//!
//! Two agents travel alongside a scrolling stream of expert states. The naive
//! agent accumulates drift and never recovers. The corrected agent drifts
//! early, then pulls back toward the mean of its nearest expert neighbors with
//! a strength that ramps up over time and saturates.
//!
//! The stream scrolls by projection: stored records stay put and are shifted
//! by a wrapped scroll offset whenever they are queried or drawn.

use std::collections::VecDeque;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::aggregate::{aggregate, AggregatePolicy, AggregateResult};
use crate::config::{DarpConfig, DivergenceConfig};
use crate::likelihood::{delta_likelihood, state_likelihood};
use crate::prng::Prng;
use crate::query::{nearest_with, Neighbor};
use crate::scheduler::Animate;
use crate::store::{DemoRecord, PointStore};
use crate::synth::{synthesize, NeighborResult, PredictionModel};
use crate::vec2::Vec2;

use super::{Demo, DemoKind, Frame};

#[derive(Debug, Clone)]
struct Agent {
    position: Vec2,
    trail: VecDeque<Vec2>,
    /// Naive agent only: drift accumulated so far.
    drift: f32,
}

impl Agent {
    fn at(position: Vec2) -> Self {
        Self {
            position,
            trail: VecDeque::new(),
            drift: 0.0,
        }
    }

    fn record_trail(&mut self, cap: usize) {
        self.trail.push_back(self.position);
        while self.trail.len() > cap {
            self.trail.pop_front();
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct AgentView {
    pub position: Vec2,
    /// Oldest first.
    pub trail: Vec<Vec2>,
    /// In [0,1]; 1.0 on the expert baseline.
    pub state_likelihood: f32,
    /// Corrected agent only.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub delta_likelihood: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct DivergenceFrame {
    pub time: f32,
    pub baseline: f32,
    /// Stream records at their current (scrolled) positions.
    pub stream: Vec<Vec2>,
    pub naive: AgentView,
    pub corrected: AgentView,
    /// The corrected agent's nearest stream records, ascending by distance.
    pub neighbors: Vec<NeighborResult>,
    /// Mean of the neighbors' predicted states.
    pub aggregate: AggregateResult,
}

#[derive(Debug, Clone)]
pub struct Divergence {
    cfg: DivergenceConfig,
    rng: Prng,
    store: PointStore,
    time: f32,
    /// Stream offset in `[0, width + 2 * wrap_margin)`.
    scroll: f32,
    /// Fixed at construction and on reset; a resize leaves it alone.
    baseline: f32,
    naive: Agent,
    corrected: Agent,
}

impl Divergence {
    pub fn new(cfg: DivergenceConfig, mut rng: Prng) -> Self {
        let store = PointStore::generate(&cfg.layout(), &mut rng);
        let baseline = cfg.baseline();
        let start = Vec2::new(cfg.agent_start_x, baseline);
        Self {
            cfg,
            rng,
            store,
            time: 0.0,
            scroll: 0.0,
            baseline,
            naive: Agent::at(start),
            corrected: Agent::at(start),
        }
    }

    pub fn from_config(cfg: &DarpConfig) -> Self {
        Self::new(cfg.divergence.clone(), DemoKind::Divergence.rng(cfg.seed))
    }

    pub fn config(&self) -> &DivergenceConfig {
        &self.cfg
    }

    pub fn store(&self) -> &PointStore {
        &self.store
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn baseline(&self) -> f32 {
        self.baseline
    }

    /// New drawing-surface size. The stream wraps at the new width right away;
    /// the baseline and the record layout follow on the next reset.
    pub fn resize(&mut self, width: f32, height: f32) {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            tracing::debug!(width, height, "ignoring degenerate divergence resize");
            return;
        }
        self.cfg.width = width;
        self.cfg.height = height;
        self.scroll = self.scroll.rem_euclid(self.period());
        tracing::debug!(width, height, "divergence resized");
    }

    fn period(&self) -> f32 {
        self.cfg.width + 2.0 * self.cfg.wrap_margin
    }

    /// Where a stored stream record is drawn at the current scroll offset.
    fn project(&self, record: &DemoRecord) -> Vec2 {
        let margin = self.cfg.wrap_margin;
        let scrolled = record.position.x + self.scroll + margin;
        Vec2::new(scrolled.rem_euclid(self.period()) - margin, record.position.y)
    }

    /// Nearest stream records to `position`, measured at their scrolled positions.
    pub fn neighbors_of(&self, position: Vec2) -> Vec<Neighbor> {
        nearest_with(self.store.records(), position, self.cfg.neighbor_count, |r| self.project(r))
    }

    /// Predicted states of the nearest stream records and their mean.
    pub fn estimate(&self, position: Vec2) -> (Vec<NeighborResult>, AggregateResult) {
        let hits = self.neighbors_of(position);
        let targets = synthesize(PredictionModel::TargetState, position, &hits);
        let mean = aggregate(AggregatePolicy::Mean, &targets);
        (targets, mean)
    }

    /// Pull toward the neighbors' mean height, scaled by the ramped strength.
    fn correction(&self, position: Vec2) -> f32 {
        let (_, mean) = self.estimate(position);
        match mean.mean() {
            Some(mean) => {
                let strength = (self.time / self.cfg.correction_ramp).min(self.cfg.correction_max);
                (mean.y - position.y) * strength
            }
            None => 0.0,
        }
    }

    pub fn naive_likelihood(&self) -> f32 {
        state_likelihood(self.naive.position, self.baseline, &self.cfg.likelihood)
    }

    pub fn corrected_likelihood(&self) -> f32 {
        state_likelihood(self.corrected.position, self.baseline, &self.cfg.likelihood)
    }

    pub fn corrected_delta_likelihood(&self) -> f32 {
        let position = self.corrected.position;
        delta_likelihood(position, &self.neighbors_of(position), &self.cfg.likelihood)
    }

    pub fn divergence_frame(&self) -> DivergenceFrame {
        let position = self.corrected.position;
        let hits = self.neighbors_of(position);
        let delta = delta_likelihood(position, &hits, &self.cfg.likelihood);
        let neighbors = synthesize(PredictionModel::TargetState, position, &hits);
        let aggregate = aggregate(AggregatePolicy::Mean, &neighbors);
        DivergenceFrame {
            time: self.time,
            baseline: self.baseline,
            stream: self.store.records().iter().map(|r| self.project(r)).collect(),
            naive: AgentView {
                position: self.naive.position,
                trail: self.naive.trail.iter().copied().collect(),
                state_likelihood: self.naive_likelihood(),
                delta_likelihood: None,
            },
            corrected: AgentView {
                position: self.corrected.position,
                trail: self.corrected.trail.iter().copied().collect(),
                state_likelihood: self.corrected_likelihood(),
                delta_likelihood: Some(delta),
            },
            neighbors,
            aggregate,
        }
    }
}

impl Animate for Divergence {
    fn time_step(&self) -> f32 {
        self.cfg.time_step
    }

    fn advance(&mut self, dt: f32) {
        let c = &self.cfg;
        self.time += dt;
        self.scroll = (self.scroll + c.stream_speed).rem_euclid(c.width + 2.0 * c.wrap_margin);
        let t = self.time;
        let wobble = (t * c.wobble_freq).sin() * c.wobble_amp;

        self.naive.position.x += c.agent_speed;
        self.naive.drift += c.naive_drift_rate;
        self.naive.position.y += wobble + self.naive.drift * c.naive_drift_gain;
        self.naive.record_trail(c.trail_len);

        self.corrected.position.x += c.agent_speed;
        let drift = (c.drift_initial - t * c.drift_decay).max(0.0) * t * c.drift_gain;
        let correction = self.correction(self.corrected.position);
        self.corrected.position.y += wobble + drift + correction;
        self.corrected.record_trail(c.trail_len);
    }

    fn reset(&mut self) {
        self.time = 0.0;
        self.scroll = 0.0;
        self.baseline = self.cfg.baseline();
        let start = Vec2::new(self.cfg.agent_start_x, self.baseline);
        self.naive = Agent::at(start);
        self.corrected = Agent::at(start);
        self.store.regenerate(&self.cfg.layout(), &mut self.rng);
        tracing::debug!(generation = self.store.generation(), "divergence reset");
    }
}

impl Demo for Divergence {
    fn kind(&self) -> DemoKind {
        DemoKind::Divergence
    }

    fn frame(&self) -> Frame {
        Frame::Divergence(self.divergence_frame())
    }

    fn reset(&mut self) {
        Animate::reset(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo(seed: u64) -> Divergence {
        Divergence::new(DivergenceConfig::default(), Prng::new(seed))
    }

    fn run(d: &mut Divergence, frames: usize) {
        for _ in 0..frames {
            let dt = d.time_step();
            d.advance(dt);
        }
    }

    #[test]
    fn starts_on_baseline_with_full_likelihood() {
        let d = demo(1);
        let f = d.divergence_frame();
        assert_eq!(f.naive.state_likelihood, 1.0);
        assert_eq!(f.corrected.state_likelihood, 1.0);
        assert!(f.naive.trail.is_empty());
        assert_eq!(f.neighbors.len(), 10);
        let delta = f.corrected.delta_likelihood.unwrap();
        assert!((0.85..=0.95).contains(&delta));
    }

    #[test]
    fn corrected_agent_recovers_while_naive_diverges() {
        for seed in [1, 2, 3] {
            let mut d = demo(seed);
            run(&mut d, 600);
            let f = d.divergence_frame();
            assert!(f.naive.state_likelihood < 0.01, "naive {}", f.naive.state_likelihood);
            assert!(f.corrected.state_likelihood > 0.5, "corrected {}", f.corrected.state_likelihood);
            assert!((f.time - 600.0 * 0.016).abs() < 1e-3);
        }
    }

    #[test]
    fn naive_drift_is_independent_of_records() {
        let mut a = demo(10);
        let mut b = demo(20);
        run(&mut a, 120);
        run(&mut b, 120);
        assert_eq!(a.divergence_frame().naive.position, b.divergence_frame().naive.position);
    }

    #[test]
    fn likelihood_drops_as_naive_agent_leaves_baseline() {
        let mut d = demo(5);
        let mut prev = d.naive_likelihood();
        for _ in 0..40 {
            run(&mut d, 10);
            let l = d.naive_likelihood();
            assert!((0.0..=1.0).contains(&l));
            assert!(l <= prev);
            prev = l;
        }
    }

    #[test]
    fn trails_are_capped() {
        let mut d = demo(2);
        run(&mut d, 400);
        let f = d.divergence_frame();
        assert_eq!(f.naive.trail.len(), 150);
        assert_eq!(f.corrected.trail.len(), 150);
        assert_eq!(*f.naive.trail.last().unwrap(), f.naive.position);
    }

    #[test]
    fn stream_scrolls_and_wraps_without_mutating_records() {
        let mut d = demo(3);
        let stored = d.store().records().to_vec();
        run(&mut d, 100);
        assert_eq!(d.store().records(), &stored[..]);

        let f = d.divergence_frame();
        let expected = stored[0].position.x + 150.0;
        assert!((f.stream[0].x - expected).abs() < 1e-3);
        for p in &f.stream {
            assert!(p.x >= -20.0 && p.x < 820.0);
        }
        // The last record started at x = 790 and has wrapped to the left edge.
        assert!(f.stream[79].x < 200.0);
    }

    #[test]
    fn reset_restores_initial_state_with_new_records() {
        let mut d = demo(4);
        let before = d.store().records().to_vec();
        run(&mut d, 200);
        Animate::reset(&mut d);

        let f = d.divergence_frame();
        assert_eq!(f.time, 0.0);
        assert!(f.naive.trail.is_empty() && f.corrected.trail.is_empty());
        assert_eq!(f.naive.state_likelihood, 1.0);
        assert_eq!(f.corrected.state_likelihood, 1.0);
        assert_ne!(d.store().records(), &before[..]);
        assert_eq!(d.store().generation(), 1);
    }

    #[test]
    fn frame_carries_predictions_and_their_mean() {
        let mut d = demo(6);
        run(&mut d, 50);
        let f = d.divergence_frame();
        assert_eq!(f.neighbors.len(), 10);
        for pair in f.neighbors.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
        let sum = f.neighbors.iter().fold(Vec2::ZERO, |acc, n| acc + n.prediction);
        let expected = sum / f.neighbors.len() as f32;
        let mean = f.aggregate.mean().unwrap();
        assert!((mean.x - expected.x).abs() < 1e-3 && (mean.y - expected.y).abs() < 1e-3);
        for n in &f.neighbors {
            assert_eq!(n.prediction, n.record.position);
        }
    }

    #[test]
    fn empty_stream_has_no_aggregate() {
        let cfg = DivergenceConfig {
            demo_count: 0,
            ..DivergenceConfig::default()
        };
        let mut d = Divergence::new(cfg, Prng::new(8));
        run(&mut d, 10);
        let f = d.divergence_frame();
        assert!(f.stream.is_empty());
        assert!(f.neighbors.is_empty());
        assert!(!f.aggregate.is_available());
        assert_eq!(f.aggregate.mean(), None);
    }

    #[test]
    fn stream_keeps_scrolling_after_a_long_run() {
        let mut d = demo(9);
        // Roughly 2^24 frames in, with the offset just short of a wrap.
        d.time = 16_777_216.0 * 0.016;
        d.scroll = 839.9;
        let before = d.divergence_frame().stream;
        d.advance(0.016);
        let after = d.divergence_frame().stream;
        assert!(d.scroll >= 0.0 && d.scroll < 840.0);
        for (a, b) in before.iter().zip(&after) {
            let moved = (b.x - a.x).rem_euclid(840.0);
            assert!((moved - 1.5).abs() < 1e-2, "moved {moved}");
        }
    }

    #[test]
    fn resize_rewraps_now_and_relayouts_on_reset() {
        let mut d = demo(11);
        run(&mut d, 30);
        d.resize(400.0, 300.0);
        assert_eq!(d.baseline(), 200.0);
        for p in &d.divergence_frame().stream {
            assert!(p.x >= -20.0 && p.x < 420.0);
        }

        d.resize(f32::NAN, 10.0);
        assert_eq!(d.config().width, 400.0);

        Animate::reset(&mut d);
        let f = d.divergence_frame();
        assert_eq!(f.baseline, 150.0);
        assert_eq!(f.naive.position.y, 150.0);
        assert_eq!(f.corrected.state_likelihood, 1.0);
        assert!(f.stream.iter().all(|p| p.x < 400.0));
    }
}
