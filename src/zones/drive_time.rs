//! Drive-time banding.
//!
//! Targets are classified by the minimum traffic-free duration to their
//! nearest based-on points: within the requested time budget, outside it,
//! or unallocated when no route data came back.

use super::{LayerSource, ZoneLayer, bare_feature, feature_point, palette_color, FALLBACK_COLOR};
use crate::error::Result;
use crate::nearest::{nearest_points, routes_for_nearest};
use crate::routing::{RouteResult, RoutingOracle};
use geo::Point;
use geojson::Feature;

/// Average urban driving speed, 40 km/h, used to convert the time budget
/// into a straight-line pre-filter distance before any routing call.
pub const AVERAGE_SPEED_MPS: f64 = 11.11;

/// Based-on candidates considered per target before the distance filter.
const NEAREST_PER_TARGET: usize = 2;

pub(super) fn classify<R: RoutingOracle>(
    oracle: &R,
    change: &LayerSource,
    based_on: &LayerSource,
    budget_minutes: f64,
    palette: &[String],
) -> Result<Vec<ZoneLayer>> {
    let targets: Vec<Point> = change
        .collection
        .features
        .iter()
        .map(feature_point)
        .collect::<Result<_>>()?;
    let candidates: Vec<Point> = based_on
        .collection
        .features
        .iter()
        .map(feature_point)
        .collect::<Result<_>>()?;

    let mut nearest = nearest_points(&candidates, &targets, NEAREST_PER_TARGET)?;

    // The time budget converted to a reachable straight-line distance; the
    // filter is inclusive, so a candidate exactly at the boundary survives.
    // This only prunes routing calls, the classification signal is the
    // routed duration.
    let estimated_distance_m = AVERAGE_SPEED_MPS * budget_minutes * 60.0;
    for entry in &mut nearest {
        entry
            .neighbors
            .retain(|n| n.distance_km * 1000.0 <= estimated_distance_m);
    }
    log::debug!(
        "drive-time pre-filter: budget {} min, reachable {:.0} m",
        budget_minutes,
        estimated_distance_m
    );

    let routed = routes_for_nearest(oracle, &nearest);

    let mut within: Vec<Feature> = Vec::new();
    let mut outside: Vec<Feature> = Vec::new();
    let mut unallocated: Vec<Feature> = Vec::new();

    // `routed` is index-aligned with the change features the targets came
    // from.
    for (feature, target_routes) in change.collection.features.iter().zip(&routed) {
        let min_static = target_routes
            .routes
            .iter()
            .filter_map(RouteResult::static_seconds)
            .min();

        let bare = bare_feature(feature);
        match min_static {
            Some(seconds) if seconds as f64 / 60.0 <= budget_minutes => within.push(bare),
            Some(_) => outside.push(bare),
            None => unallocated.push(bare),
        }
    }

    let base_name = format!("{} based on {}", change.name, based_on.name);
    let id_suffix = format!("Layer {} based on {}", change.id, based_on.id);

    let configs = [
        (
            within,
            "within_drivetime",
            "Within Drive Time",
            palette_color(palette, 0),
            format!("Drive Time ≤ {} min", budget_minutes),
            format!("Points within {} minutes drive time", budget_minutes),
        ),
        (
            outside,
            "outside_drivetime",
            "Outside Drive Time",
            palette
                .last()
                .cloned()
                .unwrap_or_else(|| FALLBACK_COLOR.to_string()),
            format!("Drive Time > {} min", budget_minutes),
            format!("Points outside {} minutes drive time", budget_minutes),
        ),
        (
            unallocated,
            "unallocated_drivetime",
            "Unallocated Drive Time",
            FALLBACK_COLOR.to_string(),
            "No route available".to_string(),
            "Points with no available route information".to_string(),
        ),
    ];

    let layers = configs
        .into_iter()
        .filter(|(features, ..)| !features.is_empty())
        .map(|(features, category, suffix, color, legend, description)| {
            ZoneLayer::assemble(
                change,
                format!("{}_{}_{}", change.id, category, based_on.id),
                format!("{} ({})", base_name, suffix),
                color,
                legend,
                format!("{}. {}", description, id_suffix),
                features,
            )
        })
        .collect();

    Ok(layers)
}
