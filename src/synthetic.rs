//! Synthetic camera scenes for tests and benchmarking.
//!
//! Every object enters near the left edge of the frame and leaves near the
//! right edge, so each one crosses the vertical centre line. A configurable
//! share of the objects halts once on the way, which gives known ground
//! truth for stop detection.
//!
//! # Example
//!
//! ```rust
//! use trajscope::synthetic::SceneConfig;
//!
//! let scene = SceneConfig { object_count: 20, seed: 7, ..SceneConfig::default() }.generate();
//! assert_eq!(scene.object_count(), 20);
//! assert_eq!(scene.records.len(), scene.metadata.total_points);
//! ```

use std::f64::consts::PI;

use chrono::{DateTime, NaiveDateTime, TimeDelta};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::PointRecord;

// ============================================================================
// Types
// ============================================================================

/// Scene configuration.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// Frame width in coordinate units.
    pub width: f64,
    /// Frame height in coordinate units.
    pub height: f64,
    /// Number of tracked objects.
    pub object_count: usize,
    /// Points sampled while an object is moving.
    pub moving_points: usize,
    /// Seconds between consecutive samples of one object.
    pub sample_interval_secs: f64,
    /// Share of objects that halt once (0.0-1.0).
    pub stop_fraction: f64,
    /// How long a halting object stands still.
    pub stop_duration_secs: f64,
    /// Standard deviation of the position noise.
    pub noise_sigma: f64,
    /// Categories assigned round-robin. Empty means category 0.
    pub categories: Vec<i64>,
    /// Earliest possible first sample.
    pub start: NaiveDateTime,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 1000.0,
            object_count: 100,
            moving_points: 50,
            sample_interval_secs: 1.0,
            stop_fraction: 0.3,
            stop_duration_secs: 20.0,
            noise_sigma: 0.2,
            categories: vec![1, 2, 3],
            // 2024-05-01 08:00:00
            start: DateTime::from_timestamp(1_714_550_400, 0)
                .map(|t| t.naive_utc())
                .unwrap_or_default(),
            seed: 42,
        }
    }
}

/// Statistics about a generated scene.
#[derive(Debug, Clone)]
pub struct SceneMetadata {
    pub total_points: usize,
    pub stopping_objects: usize,
}

/// A generated scene with its ground truth.
#[derive(Debug, Clone)]
pub struct SyntheticScene {
    /// Every sample of every object, shuffled.
    pub records: Vec<PointRecord>,
    /// Identifiers of the objects that halt, sorted.
    pub stopping_ids: Vec<String>,
    /// Where each halting object stood, in `stopping_ids` order.
    pub stop_locations: Vec<(f64, f64)>,
    pub metadata: SceneMetadata,
}

impl SyntheticScene {
    pub fn object_count(&self) -> usize {
        let mut ids: Vec<&str> = self.records.iter().map(|r| r.identifier.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }
}

// ============================================================================
// Generation
// ============================================================================

/// Gaussian noise via the Box-Muller transform.
fn jitter(sigma: f64, rng: &mut StdRng) -> (f64, f64) {
    if sigma <= 0.0 {
        return (0.0, 0.0);
    }
    let u1: f64 = rng.gen_range(0.0001..1.0);
    let u2: f64 = rng.r#gen();
    let r = (-2.0 * u1.ln()).sqrt() * sigma;
    (r * (2.0 * PI * u2).cos(), r * (2.0 * PI * u2).sin())
}

/// `steps` evenly spaced positions from `from` towards `to`, excluding `to`.
fn walk(from: (f64, f64), to: (f64, f64), steps: usize) -> impl Iterator<Item = (f64, f64)> {
    (0..steps).map(move |i| {
        let f = i as f64 / steps as f64;
        (from.0 + (to.0 - from.0) * f, from.1 + (to.1 - from.1) * f)
    })
}

impl SceneConfig {
    /// Generate the scene. The same config always yields the same scene.
    pub fn generate(&self) -> SyntheticScene {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut records = Vec::new();
        let mut stops: Vec<(String, (f64, f64))> = Vec::new();
        let stop_points = (self.stop_duration_secs / self.sample_interval_secs).floor() as usize + 1;

        for index in 0..self.object_count {
            let id = format!("obj_{:04}", index);
            let category = if self.categories.is_empty() {
                0
            } else {
                self.categories[index % self.categories.len()]
            };

            let entry = (
                rng.gen_range(0.0..0.1) * self.width,
                rng.gen_range(0.1..0.9) * self.height,
            );
            let exit = (
                rng.gen_range(0.9..1.0) * self.width,
                rng.gen_range(0.1..0.9) * self.height,
            );
            let halts = rng.r#gen::<f64>() < self.stop_fraction;

            let mut path: Vec<(f64, f64)> = Vec::new();
            if halts {
                let halt = (
                    rng.gen_range(0.3..0.7) * self.width,
                    rng.gen_range(0.1..0.9) * self.height,
                );
                let before = self.moving_points / 2;
                path.extend(walk(entry, halt, before.max(1)));
                path.extend(std::iter::repeat(halt).take(stop_points));
                path.extend(walk(halt, exit, (self.moving_points - before).max(1)).skip(1));
                path.push(exit);
                stops.push((id.clone(), halt));
            } else {
                path.extend(walk(entry, exit, self.moving_points.max(1)));
                path.push(exit);
            }

            let offset_secs: f64 = rng.gen_range(0.0..60.0);
            for (i, (x, y)) in path.into_iter().enumerate() {
                let (dx, dy) = jitter(self.noise_sigma, &mut rng);
                let secs = offset_secs + i as f64 * self.sample_interval_secs;
                let timestamp = self.start + TimeDelta::milliseconds((secs * 1000.0).round() as i64);
                records.push(PointRecord::new(id.clone(), category, timestamp, x + dx, y + dy));
            }
        }

        records.shuffle(&mut rng);
        stops.sort_by(|a, b| a.0.cmp(&b.0));

        SyntheticScene {
            metadata: SceneMetadata {
                total_points: records.len(),
                stopping_objects: stops.len(),
            },
            records,
            stopping_ids: stops.iter().map(|(id, _)| id.clone()).collect(),
            stop_locations: stops.into_iter().map(|(_, at)| at).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_deterministic() {
        let config = SceneConfig {
            object_count: 10,
            ..SceneConfig::default()
        };
        assert_eq!(config.generate().records, config.generate().records);
    }

    #[test]
    fn test_walk_excludes_target() {
        let steps: Vec<_> = walk((0.0, 0.0), (10.0, 0.0), 5).collect();
        assert_eq!(steps.len(), 5);
        assert_eq!(steps[0], (0.0, 0.0));
        assert_eq!(steps[4], (8.0, 0.0));
    }
}
