//! Presence overviews: every trajectory in the window, or one category.

use std::collections::BTreeMap;

use log::debug;

use super::{mean, AnalysisOptions, AnalysisResult, HighlightTag, SummaryValue};
use crate::document::time_format;
use crate::{Trajectory, TrajectoryCollection};

fn highlight_all(result: &mut AnalysisResult, options: &AnalysisOptions, trajectories: &[&Trajectory]) {
    for trajectory in trajectories {
        result.push_path(options, trajectory, HighlightTag::Trajectory, trajectory.points());
    }
}

/// Every selected trajectory, with counts per category.
///
/// Summary keys: `trajectory_count`, `point_count`, `per_category`,
/// `earliest_start`, `latest_end`.
pub fn pass_through(collection: &TrajectoryCollection, options: &AnalysisOptions) -> AnalysisResult {
    let trajectories = options.select(collection);
    let mut result = AnalysisResult::new("pass_through");
    highlight_all(&mut result, options, &trajectories);

    let mut per_category: BTreeMap<String, SummaryValue> = BTreeMap::new();
    for trajectory in &trajectories {
        let entry = per_category
            .entry(trajectory.category().to_string())
            .or_insert(SummaryValue::Count(0));
        if let SummaryValue::Count(n) = entry {
            *n += 1;
        }
    }

    let earliest = trajectories.iter().map(|t| t.start_time()).min();
    let latest = trajectories.iter().map(|t| t.end_time()).max();
    let instant = |t: Option<chrono::NaiveDateTime>| {
        t.map_or(SummaryValue::Null, |t| SummaryValue::Text(time_format::to_string(&t)))
    };

    result.set("trajectory_count", trajectories.len());
    result.set(
        "point_count",
        trajectories.iter().map(|t| t.len()).sum::<usize>(),
    );
    result.set("per_category", SummaryValue::Map(per_category));
    result.set("earliest_start", instant(earliest));
    result.set("latest_end", instant(latest));
    result
}

/// Trajectories of a single category.
///
/// The category argument overrides any category already set in `options`.
///
/// Summary keys: `category`, `trajectory_count`, `excluded_count`,
/// `point_count`, `mean_duration_secs`, `mean_path_length`.
pub fn one_category(
    collection: &TrajectoryCollection,
    category: i64,
    options: &AnalysisOptions,
) -> AnalysisResult {
    let options = AnalysisOptions {
        category: Some(category),
        ..options.clone()
    };
    let trajectories = options.select(collection);
    let mut result = AnalysisResult::new("one_category");
    highlight_all(&mut result, &options, &trajectories);

    let durations: Vec<f64> = trajectories.iter().map(|t| t.duration_secs()).collect();
    let lengths: Vec<f64> = trajectories.iter().map(|t| t.path_length()).collect();

    debug!(
        "one_category: {} of {} trajectories have category {}",
        trajectories.len(),
        collection.len(),
        category
    );

    result.set("category", SummaryValue::Text(category.to_string()));
    result.set("trajectory_count", trajectories.len());
    result.set("excluded_count", collection.len() - trajectories.len());
    result.set(
        "point_count",
        trajectories.iter().map(|t| t.len()).sum::<usize>(),
    );
    result.set("mean_duration_secs", mean(&durations));
    result.set("mean_path_length", mean(&lengths));
    result
}
