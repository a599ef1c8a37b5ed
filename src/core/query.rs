//! Spatial Query: brute-force k-nearest-neighbor search over a record slice.
//!
//! n is at most a few hundred, so a full stable sort per query is fine. Ties keep
//! insertion order.

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::store::DemoRecord;
use crate::vec2::Vec2;

/// One hit of a query. `record.position` is the position the distance was
/// measured from (the projected position when a projection was used).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Neighbor {
    /// Index into the store's record slice.
    pub index: usize,
    pub record: DemoRecord,
    pub distance: f32,
}

/// The `k` records closest to `query`, ascending by distance.
///
/// Returns `min(k, records.len())` hits; never fails.
pub fn nearest(records: &[DemoRecord], query: Vec2, k: usize) -> Vec<Neighbor> {
    nearest_with(records, query, k, |r| r.position)
}

/// Like [`nearest`], but measures from `project(record)` instead of the stored
/// position. Used by demos whose points are displayed at time-dependent offsets.
pub fn nearest_with<F>(records: &[DemoRecord], query: Vec2, k: usize, project: F) -> Vec<Neighbor>
where
    F: Fn(&DemoRecord) -> Vec2,
{
    if k == 0 || records.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<Neighbor> = records
        .iter()
        .enumerate()
        .map(|(index, r)| {
            let position = project(r);
            Neighbor {
                index,
                record: DemoRecord { position, ..*r },
                distance: position.distance(query),
            }
        })
        .collect();

    // `sort_by` is stable: equal distances stay in insertion order.
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits.truncate(k);
    hits
}

/// Re-resolve a fixed selection of indices against current projected positions.
///
/// Indices that no longer exist (store regenerated smaller) are dropped.
pub fn resolve<F>(records: &[DemoRecord], indices: &[usize], query: Vec2, project: F) -> Vec<Neighbor>
where
    F: Fn(&DemoRecord) -> Vec2,
{
    indices
        .iter()
        .filter_map(|&index| {
            let r = records.get(index)?;
            let position = project(r);
            Some(Neighbor {
                index,
                record: DemoRecord { position, ..*r },
                distance: position.distance(query),
            })
        })
        .collect()
}
