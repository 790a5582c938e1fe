//! Influence-gradient banding.
//!
//! Each target point is scored with the average of a named numeric property
//! over the based-on points within a fixed radius; scored points are split
//! into six percentile bands, and unscored points fall into the catch-all
//! layer.

use super::{
    LayerSource, ZoneLayer, bare_feature, feature_point, palette_color, set_property,
};
use crate::error::Result;
use crate::spatial::haversine_m;
use crate::stats::{cut_points, mean};
use geojson::Feature;
use serde_json::json;

/// Percentile probes deriving the five cut points between the six bands.
pub const GRADIENT_PERCENTILES: [f64; 5] = [16.67, 33.33, 50.0, 66.67, 83.33];

const UNALLOCATED_NAME: &str = "Unallocated Points";
const UNALLOCATED_LEGEND: &str = "No nearby points";

pub(super) fn classify(
    change: &LayerSource,
    based_on: &LayerSource,
    property: &str,
    radius_m: f64,
    palette: &[String],
) -> Result<Vec<ZoneLayer>> {
    let description = format!("Gradient layer based on nearby {} influence", property);

    // Influence score per target: mean of the property over in-radius
    // based-on points, or none when no neighbor qualifies.
    let mut scores: Vec<Option<f64>> = Vec::with_capacity(change.collection.features.len());
    for feature in &change.collection.features {
        let target = feature_point(feature)?;

        let mut nearby = Vec::new();
        for other in &based_on.collection.features {
            let Some(value) = other
                .properties
                .as_ref()
                .and_then(|props| props.get(property))
                .and_then(serde_json::Value::as_f64)
            else {
                continue;
            };
            if haversine_m(target, feature_point(other)?)? <= radius_m {
                nearby.push(value);
            }
        }
        scores.push(mean(&nearby));
    }

    let scored: Vec<f64> = scores.iter().flatten().copied().collect();
    if scored.is_empty() {
        log::warn!(
            "no target within {} m of a {:?}-scored point, everything is unallocated",
            radius_m,
            property
        );
        let features: Vec<Feature> = change
            .collection
            .features
            .iter()
            .map(|feature| {
                let mut bare = bare_feature(feature);
                set_property(&mut bare, "influence_score", serde_json::Value::Null);
                bare
            })
            .collect();
        return Ok(vec![ZoneLayer::assemble(
            change,
            format!("{}_gradient_unallocated", change.id),
            UNALLOCATED_NAME.to_string(),
            super::FALLBACK_COLOR.to_string(),
            UNALLOCATED_LEGEND.to_string(),
            description,
            features,
        )]);
    }

    let thresholds = cut_points(&scored, &GRADIENT_PERCENTILES)?;
    log::debug!(
        "influence thresholds over {} scored of {} targets: {:?}",
        scored.len(),
        scores.len(),
        thresholds
    );

    // Six score bands plus the unallocated catch-all.
    let band_count = thresholds.len() + 2;
    let mut bands: Vec<Vec<Feature>> = vec![Vec::new(); band_count];

    for (feature, score) in change.collection.features.iter().zip(&scores) {
        let mut bare = bare_feature(feature);
        let band = match score {
            Some(value) => {
                set_property(&mut bare, "influence_score", json!(value));
                thresholds
                    .iter()
                    .position(|cutoff| value <= cutoff)
                    .unwrap_or(thresholds.len())
            }
            None => {
                set_property(&mut bare, "influence_score", serde_json::Value::Null);
                band_count - 1
            }
        };
        bands[band].push(bare);
    }

    let layers = bands
        .into_iter()
        .enumerate()
        .filter(|(_, features)| !features.is_empty())
        .map(|(band, features)| {
            let color = palette_color(palette, band);
            let (layer_name, legend) = if band == band_count - 1 {
                (UNALLOCATED_NAME.to_string(), UNALLOCATED_LEGEND.to_string())
            } else if band == 0 {
                (
                    format!("Gradient Layer {}", band + 1),
                    format!("Influence Score < {:.2}", thresholds[0]),
                )
            } else if band == thresholds.len() {
                (
                    format!("Gradient Layer {}", band + 1),
                    format!("Influence Score > {:.2}", thresholds[thresholds.len() - 1]),
                )
            } else {
                (
                    format!("Gradient Layer {}", band + 1),
                    format!(
                        "Influence Score {:.2} - {:.2}",
                        thresholds[band - 1],
                        thresholds[band]
                    ),
                )
            };

            ZoneLayer::assemble(
                change,
                format!("{}_gradient_{}", change.id, band + 1),
                layer_name,
                color,
                legend,
                description.clone(),
                features,
            )
        })
        .collect();

    Ok(layers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{RouteInfo, RoutingOracle};
    use crate::zones::test_support::{layer, point_feature, scored_point};
    use crate::zones::{classify, CoverageProperty, FALLBACK_COLOR, ZoneSpec};
    use geo::Point;

    /// The gradient path never consults the oracle.
    struct PanicOracle;

    impl RoutingOracle for PanicOracle {
        fn route(&self, _origin: Point, _destination: Point) -> Result<RouteInfo> {
            panic!("routing oracle must not be called in influence mode");
        }
    }

    fn spec(radius_m: f64) -> ZoneSpec {
        ZoneSpec {
            coverage: CoverageProperty::Influence("rating".to_string()),
            value: radius_m,
            palette: vec![
                "#111111".to_string(),
                "#222222".to_string(),
                "#333333".to_string(),
                "#444444".to_string(),
                "#555555".to_string(),
                "#666666".to_string(),
            ],
        }
    }

    /// Targets at distinct longitudes, each with one co-located scored
    /// based-on point, so scores are exactly the ratings.
    fn distinct_score_layers() -> (LayerSource, LayerSource) {
        let mut change = Vec::new();
        let mut based_on = Vec::new();
        for (i, rating) in [1.0, 2.0, 3.0, 4.0, 5.0, 6.0].iter().enumerate() {
            let lng = i as f64 * 1.0;
            change.push(point_feature(lng, 0.0, &[]));
            based_on.push(scored_point(lng, 0.0, *rating));
        }
        (
            layer("chg", "Shops", change),
            layer("base", "Competitors", based_on),
        )
    }

    #[test]
    fn bands_partition_scored_points_exactly_once() {
        let (change, based_on) = distinct_score_layers();
        let layers = classify(&PanicOracle, &change, &based_on, &spec(500.0)).unwrap();

        // Six distinct scores across five cut points: every band non-empty,
        // no unallocated layer.
        assert_eq!(layers.len(), 6);
        let total: usize = layers.iter().map(|l| l.records_count).sum();
        assert_eq!(total, 6);

        assert_eq!(layers[0].layer_name, "Gradient Layer 1");
        assert!(layers[0].legend.starts_with("Influence Score < "));
        assert_eq!(layers[5].layer_name, "Gradient Layer 6");
        assert!(layers[5].legend.starts_with("Influence Score > "));
        assert_eq!(layers[2].color, "#333333");
        assert_eq!(layers[0].sub_layer_id, "chg_gradient_1");
    }

    #[test]
    fn scores_are_tagged_onto_features() {
        let (change, based_on) = distinct_score_layers();
        let layers = classify(&PanicOracle, &change, &based_on, &spec(500.0)).unwrap();

        let lowest = &layers[0].features[0];
        let score = lowest
            .properties
            .as_ref()
            .and_then(|p| p.get("influence_score"))
            .and_then(serde_json::Value::as_f64);
        assert_eq!(score, Some(1.0));
        assert!(layers[0].properties.contains(&"influence_score".to_string()));
    }

    #[test]
    fn out_of_radius_targets_are_unallocated() {
        let change = layer(
            "chg",
            "Shops",
            vec![point_feature(0.0, 0.0, &[]), point_feature(10.0, 0.0, &[])],
        );
        let based_on = layer("base", "Competitors", vec![scored_point(0.0, 0.001, 7.5)]);

        let layers = classify(&PanicOracle, &change, &based_on, &spec(1000.0)).unwrap();
        assert_eq!(layers.len(), 2);

        let unallocated = layers.last().unwrap();
        assert_eq!(unallocated.layer_name, "Unallocated Points");
        assert_eq!(unallocated.legend, "No nearby points");
        assert_eq!(unallocated.records_count, 1);
        let null_score = unallocated.features[0]
            .properties
            .as_ref()
            .and_then(|p| p.get("influence_score"));
        assert_eq!(null_score, Some(&serde_json::Value::Null));
    }

    #[test]
    fn no_scored_point_yields_single_unallocated_layer() {
        let change = layer("chg", "Shops", vec![point_feature(0.0, 0.0, &[])]);
        // Based-on point lacks the property entirely.
        let based_on = layer("base", "Competitors", vec![point_feature(0.0, 0.001, &[])]);

        let layers = classify(&PanicOracle, &change, &based_on, &spec(1000.0)).unwrap();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].layer_name, "Unallocated Points");
        assert_eq!(layers[0].color, FALLBACK_COLOR);
        assert_eq!(layers[0].records_count, 1);
    }

    #[test]
    fn score_is_mean_of_in_radius_neighbors() {
        let change = layer("chg", "Shops", vec![point_feature(0.0, 0.0, &[])]);
        let based_on = layer(
            "base",
            "Competitors",
            vec![
                scored_point(0.0, 0.001, 2.0),
                scored_point(0.0, -0.001, 4.0),
                // Beyond the 1 km radius, must not contribute.
                scored_point(0.0, 0.5, 100.0),
            ],
        );

        let layers = classify(&PanicOracle, &change, &based_on, &spec(1000.0)).unwrap();
        let feature = &layers[0].features[0];
        let score = feature
            .properties
            .as_ref()
            .and_then(|p| p.get("influence_score"))
            .and_then(serde_json::Value::as_f64);
        assert_eq!(score, Some(3.0));
    }
}
