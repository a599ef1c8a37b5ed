//! Display metrics for the drift/recovery demo.
//!
//! Both are recomputed from the current position every frame; nothing accumulates.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::query::Neighbor;
use crate::vec2::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LikelihoodParams {
    /// Decay length for the state likelihood (px).
    pub state_scale: f32,
    /// Typical expert-to-expert neighbor distance (px).
    pub typical_delta: f32,
    /// Width of the Gaussian around `typical_delta` (px).
    pub delta_spread: f32,
    pub band_low: f32,
    pub band_high: f32,
    /// Reported when there are no neighbors.
    pub empty_delta: f32,
}

impl Default for LikelihoodParams {
    fn default() -> Self {
        Self {
            state_scale: 50.0,
            typical_delta: 30.0,
            delta_spread: 25.0,
            band_low: 0.85,
            band_high: 0.95,
            empty_delta: 0.9,
        }
    }
}

/// `exp(-|y - baseline| / scale)`, in [0,1], 1.0 on the baseline.
pub fn state_likelihood(position: Vec2, baseline_y: f32, params: &LikelihoodParams) -> f32 {
    let scale = params.state_scale.max(f32::EPSILON);
    let d = (position.y - baseline_y).abs();
    (-d / scale).exp().clamp(0.0, 1.0)
}

/// Cosmetic score for how expert-like the difference vectors to `neighbors` look.
///
/// The output is pinned to `[band_low, band_high]`.
pub fn delta_likelihood(position: Vec2, neighbors: &[Neighbor], params: &LikelihoodParams) -> f32 {
    if neighbors.is_empty() {
        return params.empty_delta;
    }
    let mean_mag =
        neighbors.iter().map(|n| n.record.position.distance(position)).sum::<f32>() / neighbors.len() as f32;

    let spread = params.delta_spread.max(f32::EPSILON);
    let d = mean_mag - params.typical_delta;
    let raw = (-(d * d) / (2.0 * spread * spread)).exp();
    (params.band_low + raw * (params.band_high - params.band_low)).clamp(params.band_low, params.band_high)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DemoRecord;

    fn neighbor_at(x: f32, y: f32) -> Neighbor {
        let record = DemoRecord::new(Vec2::new(x, y), Vec2::ZERO);
        Neighbor {
            index: 0,
            record,
            distance: 0.0,
        }
    }

    #[test]
    fn state_likelihood_is_one_on_baseline_and_monotone() {
        let p = LikelihoodParams::default();
        assert_eq!(state_likelihood(Vec2::new(0.0, 200.0), 200.0, &p), 1.0);

        let mut prev = 1.0f32;
        for i in 0..200 {
            let d = i as f32 * 2.5;
            let l = state_likelihood(Vec2::new(0.0, 200.0 + d), 200.0, &p);
            assert!((0.0..=1.0).contains(&l));
            assert!(l <= prev);
            // Symmetric about the baseline.
            assert_eq!(l, state_likelihood(Vec2::new(0.0, 200.0 - d), 200.0, &p));
            prev = l;
        }
    }

    #[test]
    fn delta_likelihood_stays_in_band() {
        let p = LikelihoodParams::default();
        assert_eq!(delta_likelihood(Vec2::ZERO, &[], &p), 0.9);

        for d in [0.0f32, 5.0, 30.0, 80.0, 500.0] {
            let l = delta_likelihood(Vec2::ZERO, &[neighbor_at(d, 0.0)], &p);
            assert!((0.85..=0.95).contains(&l), "d={d} l={l}");
        }
        // Peak at the typical distance.
        let peak = delta_likelihood(Vec2::ZERO, &[neighbor_at(30.0, 0.0)], &p);
        assert!((peak - 0.95).abs() < 1e-6);
    }
}
