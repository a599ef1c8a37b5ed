//! Prediction Synthesizer: a per-neighbor synthetic output vector.
//!
//! Nothing here is learned. The delta-corrected model nudges the neighbor's
//! label toward the query by a fixed coupling, which is enough to make the
//! aggregation step visible on screen.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::query::Neighbor;
use crate::store::DemoRecord;
use crate::vec2::Vec2;

/// Coupling between the neighbor offset and the predicted action.
pub const DEFAULT_COUPLING: f32 = 0.015;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "model", rename_all = "snake_case"))]
pub enum PredictionModel {
    /// `action + (record.position - query) * coupling`, unnormalized.
    DeltaCorrected { coupling: f32 },
    /// The neighbor's own (projected) state.
    TargetState,
}

impl Default for PredictionModel {
    fn default() -> Self {
        PredictionModel::DeltaCorrected {
            coupling: DEFAULT_COUPLING,
        }
    }
}

impl PredictionModel {
    pub fn predict(&self, record: &DemoRecord, query: Vec2) -> Vec2 {
        match *self {
            PredictionModel::DeltaCorrected { coupling } => {
                record.action + (record.position - query) * coupling
            }
            PredictionModel::TargetState => record.position,
        }
    }
}

/// A neighbor together with its offset from the query and its prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct NeighborResult {
    pub index: usize,
    pub record: DemoRecord,
    pub distance: f32,
    /// `record.position - query`.
    pub offset: Vec2,
    pub prediction: Vec2,
}

pub fn synthesize(model: PredictionModel, query: Vec2, neighbors: &[Neighbor]) -> Vec<NeighborResult> {
    neighbors
        .iter()
        .map(|n| NeighborResult {
            index: n.index,
            record: n.record,
            distance: n.distance,
            offset: n.record.position - query,
            prediction: model.predict(&n.record, query),
        })
        .collect()
}
