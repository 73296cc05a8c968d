//! Spatial indexing of trajectory bounding boxes.
//!
//! Uses an R-tree so zone and line analyses only look at trajectories
//! whose bounds touch the geometry under test.

use rstar::{RTree, RTreeObject, AABB};

use crate::{Bounds, Trajectory, TrajectoryCollection};

/// Trajectory bounds wrapper for R-tree spatial indexing.
#[derive(Debug, Clone)]
pub struct TrajectoryBounds {
    pub trajectory_id: String,
    pub bounds: Bounds,
}

impl RTreeObject for TrajectoryBounds {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bounds.min_x, self.bounds.min_y],
            [self.bounds.max_x, self.bounds.max_y],
        )
    }
}

/// R-tree of trajectory bounds, built once per collection.
#[derive(Debug)]
pub struct SpatialIndex {
    tree: RTree<TrajectoryBounds>,
}

impl SpatialIndex {
    pub fn build(collection: &TrajectoryCollection) -> Self {
        let bounds: Vec<TrajectoryBounds> = collection
            .iter()
            .map(|t: &Trajectory| TrajectoryBounds {
                trajectory_id: t.id().to_string(),
                bounds: t.bounds(),
            })
            .collect();
        Self {
            tree: RTree::bulk_load(bounds),
        }
    }

    /// Identifiers of trajectories whose bounds intersect `bounds`
    /// (touching counts), sorted.
    pub fn query(&self, bounds: &Bounds) -> Vec<String> {
        let search = AABB::from_corners([bounds.min_x, bounds.min_y], [bounds.max_x, bounds.max_y]);
        let mut ids: Vec<String> = self
            .tree
            .locate_in_envelope_intersecting(&search)
            .map(|b| b.trajectory_id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
