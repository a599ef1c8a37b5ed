//! Point Store: the synthetic expert demonstrations a demo queries against.
//!
//! Records are immutable between regenerations. Anything that appears to move
//! on screen (the scrolling stream, the floating clusters) is a projection of
//! the stored position, computed at query time.

use std::f32::consts::{FRAC_PI_2, TAU};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::prng::Prng;
use crate::vec2::Vec2;

/// Behavior-mode label assigned when a record is created (never inferred).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterLabel(pub u8);

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DemoRecord {
    pub position: Vec2,
    pub action: Vec2,
    pub cluster: ClusterLabel,
}

impl DemoRecord {
    pub fn new(position: Vec2, action: Vec2) -> Self {
        Self {
            position,
            action,
            cluster: ClusterLabel::default(),
        }
    }

    pub fn with_cluster(mut self, cluster: ClusterLabel) -> Self {
        self.cluster = cluster;
        self
    }
}

/// How a demo lays out its synthetic records.
#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    /// Uniform points over `width × height` whose actions circle the center.
    Vortex {
        count: usize,
        width: f32,
        height: f32,
        /// Total span of the uniform angle noise (radians).
        angle_noise: f32,
    },
    /// Evenly spaced points along x, scattered around a horizontal baseline.
    Stream {
        count: usize,
        width: f32,
        baseline: f32,
        spread: f32,
    },
    /// One ring-ish blob of `per_cluster` points per center; label = center index.
    Bimodal {
        centers: Vec<Vec2>,
        radius: f32,
        per_cluster: usize,
    },
}

impl Layout {
    pub fn generate(&self, rng: &mut Prng) -> Vec<DemoRecord> {
        match self {
            Layout::Vortex {
                count,
                width,
                height,
                angle_noise,
            } => {
                let center = Vec2::new(width * 0.5, height * 0.5);
                (0..*count)
                    .map(|_| {
                        let position = Vec2::new(
                            rng.gen_range_f32(0.0, *width),
                            rng.gen_range_f32(0.0, *height),
                        );
                        let angle = (position - center).angle() + FRAC_PI_2 + rng.jitter(*angle_noise);
                        DemoRecord::new(position, Vec2::from_angle(angle))
                    })
                    .collect()
            }
            Layout::Stream {
                count,
                width,
                baseline,
                spread,
            } => {
                let n = (*count).max(1) as f32;
                (0..*count)
                    .map(|i| {
                        let position = Vec2::new((i as f32 / n) * width, baseline + rng.jitter(*spread));
                        DemoRecord::new(position, Vec2::new(1.0, 0.0))
                    })
                    .collect()
            }
            Layout::Bimodal {
                centers,
                radius,
                per_cluster,
            } => {
                let n = (*per_cluster).max(1) as f32;
                let mid = mid_point(centers);
                // Sample per index across clusters, emit cluster-major.
                let mut by_cluster: Vec<Vec<DemoRecord>> = vec![Vec::with_capacity(*per_cluster); centers.len()];
                for i in 0..*per_cluster {
                    let angle = (i as f32 / n) * TAU;
                    for (c, center) in centers.iter().enumerate() {
                        let r = rng.gen_range_f32(0.0, *radius);
                        let position = *center + Vec2::from_angle(angle) * r;
                        // Action points from the cluster center outward along the mode.
                        let action = (*center - mid).normalized_or_zero();
                        by_cluster[c].push(
                            DemoRecord::new(position, action).with_cluster(ClusterLabel(c as u8)),
                        );
                    }
                }
                by_cluster.into_iter().flatten().collect()
            }
        }
    }
}

fn mid_point(points: &[Vec2]) -> Vec2 {
    if points.is_empty() {
        return Vec2::ZERO;
    }
    let mut sum = Vec2::ZERO;
    for p in points {
        sum += *p;
    }
    sum / points.len() as f32
}

#[derive(Debug, Clone, Default)]
pub struct PointStore {
    records: Vec<DemoRecord>,
    generation: u64,
}

impl PointStore {
    pub fn from_records(records: Vec<DemoRecord>) -> Self {
        Self {
            records,
            generation: 0,
        }
    }

    pub fn generate(layout: &Layout, rng: &mut Prng) -> Self {
        Self::from_records(layout.generate(rng))
    }

    /// Replace every record; the only mutation the store allows.
    pub fn regenerate(&mut self, layout: &Layout, rng: &mut Prng) {
        self.records = layout.generate(rng);
        self.generation += 1;
    }

    pub fn records(&self) -> &[DemoRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Incremented by every `regenerate`.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
