//! Aggregator: reduce a neighbor set's predictions to a mean or to one mean per mode.

use hashbrown::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::store::ClusterLabel;
use crate::synth::NeighborResult;
use crate::vec2::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AggregatePolicy {
    /// Elementwise average over every prediction. Blends distinct modes.
    #[default]
    Mean,
    /// Elementwise average within each populated cluster label.
    ModePreserving,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ModeEstimate {
    pub cluster: ClusterLabel,
    pub value: Vec2,
    /// Number of predictions averaged into `value`.
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "policy", rename_all = "snake_case"))]
pub enum AggregateResult {
    /// `value` is zero when `support` is zero.
    Mean { value: Vec2, support: usize },
    /// Ascending by cluster label; empty when there was nothing to aggregate.
    Modes { modes: Vec<ModeEstimate> },
}

impl AggregateResult {
    /// False for an empty neighbor set; renderers draw nothing in that case.
    pub fn is_available(&self) -> bool {
        match self {
            AggregateResult::Mean { support, .. } => *support > 0,
            AggregateResult::Modes { modes } => !modes.is_empty(),
        }
    }

    /// Every output vector, in order (one for mean, one per mode).
    pub fn values(&self) -> Vec<Vec2> {
        match self {
            AggregateResult::Mean { value, support } if *support > 0 => vec![*value],
            AggregateResult::Mean { .. } => Vec::new(),
            AggregateResult::Modes { modes } => modes.iter().map(|m| m.value).collect(),
        }
    }

    pub fn mean(&self) -> Option<Vec2> {
        match self {
            AggregateResult::Mean { value, support } if *support > 0 => Some(*value),
            _ => None,
        }
    }

    pub fn modes(&self) -> &[ModeEstimate] {
        match self {
            AggregateResult::Modes { modes } => modes,
            AggregateResult::Mean { .. } => &[],
        }
    }
}

/// Elementwise mean and count; zero vector for an empty input.
pub fn mean_of<I>(values: I) -> (Vec2, usize)
where
    I: IntoIterator<Item = Vec2>,
{
    let mut sum = Vec2::ZERO;
    let mut n = 0usize;
    for v in values {
        sum += v;
        n += 1;
    }
    if n == 0 {
        (Vec2::ZERO, 0)
    } else {
        (sum / n as f32, n)
    }
}

pub fn aggregate(policy: AggregatePolicy, neighbors: &[NeighborResult]) -> AggregateResult {
    match policy {
        AggregatePolicy::Mean => {
            let (value, support) = mean_of(neighbors.iter().map(|n| n.prediction));
            AggregateResult::Mean { value, support }
        }
        AggregatePolicy::ModePreserving => AggregateResult::Modes {
            modes: modes_of(neighbors.iter().map(|n| (n.record.cluster, n.prediction))),
        },
    }
}

/// Group by label and average within each group.
pub fn modes_of<I>(labelled: I) -> Vec<ModeEstimate>
where
    I: IntoIterator<Item = (ClusterLabel, Vec2)>,
{
    let mut groups: HashMap<ClusterLabel, (Vec2, usize)> = HashMap::new();
    for (label, v) in labelled {
        let entry = groups.entry(label).or_insert((Vec2::ZERO, 0));
        entry.0 += v;
        entry.1 += 1;
    }

    let mut modes: Vec<ModeEstimate> = groups
        .into_iter()
        .map(|(cluster, (sum, support))| ModeEstimate {
            cluster,
            value: sum / support as f32,
            support,
        })
        .collect();
    modes.sort_unstable_by_key(|m| m.cluster);
    modes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DemoRecord;

    fn result(prediction: Vec2, cluster: u8) -> NeighborResult {
        NeighborResult {
            index: 0,
            record: DemoRecord::new(Vec2::ZERO, Vec2::ZERO).with_cluster(ClusterLabel(cluster)),
            distance: 0.0,
            offset: Vec2::ZERO,
            prediction,
        }
    }

    #[test]
    fn mean_of_singleton_is_exact() {
        let p = Vec2::new(0.123, -4.5);
        let out = aggregate(AggregatePolicy::Mean, &[result(p, 0)]);
        assert_eq!(out, AggregateResult::Mean { value: p, support: 1 });
    }

    #[test]
    fn mean_is_elementwise_average() {
        let set = [
            result(Vec2::new(1.0, 2.0), 0),
            result(Vec2::new(3.0, -2.0), 1),
            result(Vec2::new(2.0, 3.0), 1),
        ];
        let out = aggregate(AggregatePolicy::Mean, &set);
        let v = out.mean().unwrap();
        assert!((v.x - 2.0).abs() < 1e-6);
        assert!((v.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn empty_set_is_unavailable_under_both_policies() {
        let mean = aggregate(AggregatePolicy::Mean, &[]);
        assert_eq!(
            mean,
            AggregateResult::Mean {
                value: Vec2::ZERO,
                support: 0
            }
        );
        assert!(!mean.is_available());
        assert!(mean.values().is_empty());

        let modes = aggregate(AggregatePolicy::ModePreserving, &[]);
        assert!(!modes.is_available());
        assert!(modes.modes().is_empty());
    }

    #[test]
    fn modes_split_by_label_and_sort() {
        let set = [
            result(Vec2::new(10.0, 0.0), 1),
            result(Vec2::new(0.0, 2.0), 0),
            result(Vec2::new(20.0, 0.0), 1),
            result(Vec2::new(0.0, 4.0), 0),
        ];
        let out = aggregate(AggregatePolicy::ModePreserving, &set);
        let modes = out.modes();
        assert_eq!(modes.len(), 2);
        assert_eq!(modes[0].cluster, ClusterLabel(0));
        assert_eq!(modes[0].value, Vec2::new(0.0, 3.0));
        assert_eq!(modes[0].support, 2);
        assert_eq!(modes[1].cluster, ClusterLabel(1));
        assert_eq!(modes[1].value, Vec2::new(15.0, 0.0));
    }

    #[test]
    fn mode_count_equals_populated_labels() {
        // One label populated: exactly one mode, equal to the plain mean.
        let set = [result(Vec2::new(1.0, 1.0), 1), result(Vec2::new(3.0, 3.0), 1)];
        let out = aggregate(AggregatePolicy::ModePreserving, &set);
        assert_eq!(out.modes().len(), 1);
        assert_eq!(Some(out.modes()[0].value), aggregate(AggregatePolicy::Mean, &set).mean());

        let mut labels: Vec<u8> = (0..40u8).map(|i| i % 5).collect();
        labels.retain(|l| *l != 3);
        let set: Vec<NeighborResult> = labels.iter().map(|&l| result(Vec2::new(l as f32, 0.0), l)).collect();
        assert_eq!(aggregate(AggregatePolicy::ModePreserving, &set).modes().len(), 4);
    }
}
