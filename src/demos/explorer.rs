//! Nearest-neighbor explorer over a vortex flow field.
//!
//! Pointer moves preview a query, a click locks one in place, a second click
//! releases it. The locked query wins over the hover preview.

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::aggregate::{aggregate, AggregatePolicy, AggregateResult};
use crate::config::{DarpConfig, ExplorerConfig};
use crate::prng::Prng;
use crate::query::nearest;
use crate::store::{DemoRecord, PointStore};
use crate::synth::{synthesize, NeighborResult, PredictionModel};
use crate::vec2::Vec2;

use super::{Demo, DemoKind, Frame};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct QueryView {
    pub position: Vec2,
    /// False for a hover preview.
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ExplorerFrame {
    pub width: f32,
    pub height: f32,
    pub records: Vec<DemoRecord>,
    pub query: Option<QueryView>,
    /// Ascending by distance; empty without a query.
    pub neighbors: Vec<NeighborResult>,
    pub aggregate: AggregateResult,
}

#[derive(Debug, Clone)]
pub struct Explorer {
    cfg: ExplorerConfig,
    rng: Prng,
    store: PointStore,
    hover: Option<Vec2>,
    locked: Option<Vec2>,
}

impl Explorer {
    pub fn new(cfg: ExplorerConfig, mut rng: Prng) -> Self {
        let store = PointStore::generate(&cfg.layout(), &mut rng);
        Self {
            cfg,
            rng,
            store,
            hover: None,
            locked: None,
        }
    }

    pub fn from_config(cfg: &DarpConfig) -> Self {
        Self::new(cfg.explorer.clone(), DemoKind::Explorer.rng(cfg.seed))
    }

    /// Explorer over a fixed record set; `rng` only feeds later regenerations.
    pub fn with_store(cfg: ExplorerConfig, store: PointStore, rng: Prng) -> Self {
        Self {
            cfg,
            rng,
            store,
            hover: None,
            locked: None,
        }
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.cfg
    }

    pub fn store(&self) -> &PointStore {
        &self.store
    }

    pub fn pointer_move(&mut self, position: Vec2) {
        self.hover = Some(position);
    }

    pub fn pointer_leave(&mut self) {
        self.hover = None;
    }

    /// Toggle the locked query. Returns whether a query is locked afterwards.
    pub fn click(&mut self, position: Vec2) -> bool {
        if self.locked.take().is_some() {
            tracing::debug!("explorer query unlocked");
            return false;
        }
        self.locked = Some(position);
        tracing::debug!(x = position.x, y = position.y, "explorer query locked");
        true
    }

    pub fn is_locked(&self) -> bool {
        self.locked.is_some()
    }

    /// New drawing-surface size; the field is regenerated to fill it.
    pub fn resize(&mut self, width: f32, height: f32) {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            tracing::debug!(width, height, "ignoring degenerate explorer resize");
            return;
        }
        self.cfg.width = width;
        self.cfg.height = height;
        self.store.regenerate(&self.cfg.layout(), &mut self.rng);
        tracing::debug!(width, height, generation = self.store.generation(), "explorer resized");
    }

    pub fn active_query(&self) -> Option<QueryView> {
        match (self.locked, self.hover) {
            (Some(position), _) => Some(QueryView {
                position,
                locked: true,
            }),
            (None, Some(position)) => Some(QueryView {
                position,
                locked: false,
            }),
            (None, None) => None,
        }
    }

    fn model(&self) -> PredictionModel {
        PredictionModel::DeltaCorrected {
            coupling: self.cfg.coupling,
        }
    }

    /// Neighbors, their predictions and the mean estimate for an arbitrary probe.
    pub fn evaluate(&self, query: Vec2) -> (Vec<NeighborResult>, AggregateResult) {
        let hits = nearest(self.store.records(), query, self.cfg.neighbor_count);
        let neighbors = synthesize(self.model(), query, &hits);
        let estimate = aggregate(AggregatePolicy::Mean, &neighbors);
        (neighbors, estimate)
    }

    pub fn explorer_frame(&self) -> ExplorerFrame {
        let query = self.active_query();
        let (neighbors, aggregate) = match query {
            Some(q) => self.evaluate(q.position),
            None => (Vec::new(), aggregate(AggregatePolicy::Mean, &[])),
        };
        ExplorerFrame {
            width: self.cfg.width,
            height: self.cfg.height,
            records: self.store.records().to_vec(),
            query,
            neighbors,
            aggregate,
        }
    }
}

impl Demo for Explorer {
    fn kind(&self) -> DemoKind {
        DemoKind::Explorer
    }

    fn frame(&self) -> Frame {
        Frame::Explorer(self.explorer_frame())
    }

    fn reset(&mut self) {
        self.hover = None;
        self.locked = None;
        self.store.regenerate(&self.cfg.layout(), &mut self.rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Explorer {
        small_seeded(1)
    }

    fn small_seeded(seed: u64) -> Explorer {
        let records = vec![
            DemoRecord::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)),
            DemoRecord::new(Vec2::new(10.0, 0.0), Vec2::new(0.0, 1.0)),
            DemoRecord::new(Vec2::new(0.0, 10.0), Vec2::new(-1.0, 0.0)),
        ];
        let cfg = ExplorerConfig {
            neighbor_count: 2,
            ..ExplorerConfig::default()
        };
        Explorer::with_store(cfg, PointStore::from_records(records), Prng::new(seed))
    }

    #[test]
    fn no_query_means_no_prediction() {
        let e = small();
        let f = e.explorer_frame();
        assert!(f.query.is_none());
        assert!(f.neighbors.is_empty());
        assert!(!f.aggregate.is_available());
    }

    #[test]
    fn hover_previews_and_leave_clears() {
        let mut e = small();
        e.pointer_move(Vec2::new(1.0, 1.0));
        let f = e.explorer_frame();
        assert_eq!(
            f.query,
            Some(QueryView {
                position: Vec2::new(1.0, 1.0),
                locked: false
            })
        );
        let order: Vec<usize> = f.neighbors.iter().map(|n| n.index).collect();
        assert_eq!(order, vec![0, 1]);

        e.pointer_leave();
        assert!(e.explorer_frame().query.is_none());
    }

    #[test]
    fn mean_is_average_of_delta_corrected_predictions() {
        let e = small();
        let q = Vec2::new(1.0, 1.0);
        let (neighbors, estimate) = e.evaluate(q);
        // (1,0) + (-1,-1)*0.015 and (0,1) + (9,-1)*0.015
        let p0 = Vec2::new(1.0 - 0.015, -0.015);
        let p1 = Vec2::new(9.0 * 0.015, 1.0 - 0.015);
        assert!((neighbors[0].prediction - p0).length() < 1e-6);
        assert!((neighbors[1].prediction - p1).length() < 1e-6);
        let m = estimate.mean().unwrap();
        assert!((m - (p0 + p1) * 0.5).length() < 1e-6);
    }

    #[test]
    fn locked_query_wins_over_hover_and_click_toggles() {
        let mut e = small();
        assert!(e.click(Vec2::new(9.0, 0.0)));
        e.pointer_move(Vec2::new(0.0, 9.0));

        let f = e.explorer_frame();
        let q = f.query.unwrap();
        assert!(q.locked);
        assert_eq!(q.position, Vec2::new(9.0, 0.0));
        assert_eq!(f.neighbors[0].index, 1);

        // Second click unlocks; the hover preview takes over.
        assert!(!e.click(Vec2::new(50.0, 50.0)));
        let q = e.explorer_frame().query.unwrap();
        assert!(!q.locked);
        assert_eq!(q.position, Vec2::new(0.0, 9.0));
    }

    #[test]
    fn resize_regenerates_inside_new_bounds() {
        let mut e = Explorer::new(ExplorerConfig::default(), Prng::new(4));
        let before = e.store().records().to_vec();
        e.resize(320.0, 240.0);
        assert_eq!(e.store().len(), 150);
        assert_ne!(before, e.store().records());
        for r in e.store().records() {
            assert!(r.position.x <= 320.0 && r.position.y <= 240.0);
        }
        // Degenerate sizes are ignored.
        e.resize(0.0, 100.0);
        assert_eq!(e.config().width, 320.0);
    }

    #[test]
    fn fixed_store_regenerates_from_the_given_stream() {
        let mut a = small_seeded(3);
        let mut b = small_seeded(4);
        let mut c = small_seeded(3);
        for e in [&mut a, &mut b, &mut c] {
            e.resize(200.0, 100.0);
        }
        assert_ne!(a.store().records(), b.store().records());
        assert_eq!(a.store().records(), c.store().records());
    }

    #[test]
    fn reset_clears_queries() {
        let mut e = Explorer::from_config(&DarpConfig::default());
        e.click(Vec2::new(5.0, 5.0));
        e.pointer_move(Vec2::new(6.0, 6.0));
        e.reset();
        assert!(e.active_query().is_none());
        assert_eq!(e.store().generation(), 1);
    }
}
