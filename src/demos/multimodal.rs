//! Averaging vs. mode-preserving aggregation, played as a scripted loop.
//!
//! A fixed query sits between two clusters of expert states. Each cycle it
//! selects its neighbors, shows their plain mean (which lands between the
//! clusters, where no expert ever went), then fades over to one estimate per
//! cluster, then holds.

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::aggregate::{aggregate, AggregatePolicy, AggregateResult};
use crate::config::{DarpConfig, MultimodalConfig};
use crate::phase::{Overlay, Phase, PhasePosition};
use crate::prng::Prng;
use crate::query::{nearest_with, resolve};
use crate::scheduler::Animate;
use crate::store::{ClusterLabel, DemoRecord, PointStore};
use crate::synth::{synthesize, NeighborResult, PredictionModel};
use crate::vec2::Vec2;

use super::{Demo, DemoKind, Frame};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct DisplayPoint {
    pub position: Vec2,
    pub cluster: ClusterLabel,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct MultimodalFrame {
    pub time: f32,
    pub phase: Phase,
    pub progress: f32,
    pub query: Vec2,
    pub centers: Vec<Vec2>,
    pub points: Vec<DisplayPoint>,
    pub neighbors: Vec<NeighborResult>,
    pub mean: AggregateResult,
    pub modes: AggregateResult,
    pub overlay: Overlay,
}

#[derive(Debug, Clone)]
pub struct Multimodal {
    cfg: MultimodalConfig,
    rng: Prng,
    store: PointStore,
    time: f32,
    started: bool,
    /// Indices chosen during the most recent SelectNeighbors phase.
    selected: Vec<usize>,
}

impl Multimodal {
    pub fn new(cfg: MultimodalConfig, mut rng: Prng) -> Self {
        let store = PointStore::generate(&cfg.layout(), &mut rng);
        Self {
            cfg,
            rng,
            store,
            time: 0.0,
            started: false,
            selected: Vec::new(),
        }
    }

    pub fn from_config(cfg: &DarpConfig) -> Self {
        Self::new(cfg.multimodal.clone(), DemoKind::Multimodal.rng(cfg.seed))
    }

    pub fn config(&self) -> &MultimodalConfig {
        &self.cfg
    }

    pub fn store(&self) -> &PointStore {
        &self.store
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn position(&self) -> PhasePosition {
        if !self.started {
            return PhasePosition {
                phase: Phase::Idle,
                progress: 0.0,
                cycle_time: 0.0,
            };
        }
        self.cfg.schedule.locate(self.time)
    }

    pub fn phase(&self) -> Phase {
        self.position().phase
    }

    /// Gentle floating offset applied to every stored point.
    fn project(&self, record: &DemoRecord) -> Vec2 {
        let t = self.time;
        let base = record.position;
        let amp = self.cfg.float_amp;
        let k = self.cfg.float_phase;
        Vec2::new(
            base.x + (t + base.x * k).sin() * amp,
            base.y + (t + base.y * k).cos() * amp,
        )
    }

    fn select(&mut self) {
        let hits = nearest_with(self.store.records(), self.cfg.query, self.cfg.neighbor_count, |r| {
            self.project(r)
        });
        self.selected = hits.iter().map(|h| h.index).collect();
    }

    /// The current selection at current positions, each predicting its own state.
    pub fn neighbors(&self) -> Vec<NeighborResult> {
        let hits = resolve(self.store.records(), &self.selected, self.cfg.query, |r| self.project(r));
        synthesize(PredictionModel::TargetState, self.cfg.query, &hits)
    }

    pub fn multimodal_frame(&self) -> MultimodalFrame {
        let pos = self.position();
        let neighbors = self.neighbors();
        MultimodalFrame {
            time: self.time,
            phase: pos.phase,
            progress: pos.progress,
            query: self.cfg.query,
            centers: self.cfg.centers.clone(),
            points: self
                .store
                .records()
                .iter()
                .map(|r| DisplayPoint {
                    position: self.project(r),
                    cluster: r.cluster,
                })
                .collect(),
            mean: aggregate(AggregatePolicy::Mean, &neighbors),
            modes: aggregate(AggregatePolicy::ModePreserving, &neighbors),
            overlay: Overlay::at(pos),
            neighbors,
        }
    }
}

impl Animate for Multimodal {
    fn time_step(&self) -> f32 {
        self.cfg.time_step
    }

    fn advance(&mut self, dt: f32) {
        self.time += dt;
        self.started = true;
        // A schedule whose select phase is shorter than a frame would otherwise
        // never pick anything.
        if self.phase() == Phase::SelectNeighbors || self.selected.is_empty() {
            self.select();
        }
    }

    fn reset(&mut self) {
        self.time = 0.0;
        self.started = false;
        self.selected.clear();
        self.store.regenerate(&self.cfg.layout(), &mut self.rng);
        tracing::debug!(generation = self.store.generation(), "multimodal reset");
    }
}

impl Demo for Multimodal {
    fn kind(&self) -> DemoKind {
        DemoKind::Multimodal
    }

    fn frame(&self) -> Frame {
        Frame::Multimodal(self.multimodal_frame())
    }

    fn reset(&mut self) {
        Animate::reset(self);
    }
}
