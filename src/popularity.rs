//! Popularity ranking pass over fetched datasets.
//!
//! Collects the features of every dataset a plan produced, ranks them
//! globally by popularity score, labels quartile categories, and hands the
//! ranked list back out in fixed-size chunks, one per dataset. Storage I/O
//! stays with the caller; everything here is a pure transformation.

use crate::error::Result;
use crate::stats::cut_points;
use geojson::{Feature, FeatureCollection, JsonObject};
use serde_json::{Value, json};

/// Features handed back per dataset on redistribution.
pub const POPULARITY_CHUNK_SIZE: usize = 20;

const SCORE_KEY: &str = "popularity_score";
const CATEGORY_KEY: &str = "popularity_score_category";

/// Map tile multiplier per coverage-circle radius, one entry per zoom
/// level of the radius-halving hierarchy starting at 30 km.
const RADIUS_ZOOM_MULTIPLIER: [(f64, f64); 7] = [
    (30000.0, 1000.0),
    (15000.0, 500.0),
    (7500.0, 250.0),
    (3750.0, 125.0),
    (1875.0, 62.5),
    (937.5, 31.25),
    (468.75, 15.625),
];

/// Multiplier for the search radius of a plan entry; `None` for radii
/// outside the halving hierarchy.
pub fn zoom_multiplier(radius_m: f64) -> Option<f64> {
    RADIUS_ZOOM_MULTIPLIER
        .iter()
        .find(|(radius, _)| *radius == radius_m)
        .map(|(_, multiplier)| *multiplier)
}

/// Weight of a result by its position in the provider's ranking: the first
/// five count fully, later bands progressively less.
pub fn category_multiplier(index: usize) -> f64 {
    match index {
        0..5 => 1.0,
        5..10 => 0.8,
        10..15 => 0.6,
        _ => 0.4,
    }
}

/// Dataset filename prefixes for every descriptor in a plan, skipping the
/// sentinel and anything else that carries no position marker.
pub fn plan_dataset_prefixes(entries: &[String]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|entry| {
            entry
                .split_once("_circle=")
                .map(|(prefix, _)| prefix.to_string())
        })
        .collect()
}

fn popularity_score(feature: &Feature) -> f64 {
    feature
        .properties
        .as_ref()
        .and_then(|props| props.get(SCORE_KEY))
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

/// Sort features by popularity score, highest first. Stable, so equal
/// scores keep their fetch order.
pub fn rank_by_popularity(features: &mut [Feature]) {
    features.sort_by(|a, b| {
        popularity_score(b)
            .partial_cmp(&popularity_score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Label every feature with a quartile category of its popularity score:
/// `Very High`, `High`, `Low`, or `Very Low`.
pub fn categorize_by_quartiles(features: &mut [Feature]) -> Result<()> {
    if features.is_empty() {
        return Ok(());
    }

    let scores: Vec<f64> = features.iter().map(popularity_score).collect();
    let quartiles = cut_points(&scores, &[25.0, 50.0, 75.0])?;

    for feature in features.iter_mut() {
        let score = popularity_score(feature);
        let category = if score >= quartiles[2] {
            "Very High"
        } else if score >= quartiles[1] {
            "High"
        } else if score >= quartiles[0] {
            "Low"
        } else {
            "Very Low"
        };
        feature
            .properties
            .get_or_insert_with(JsonObject::new)
            .insert(CATEGORY_KEY.to_string(), json!(category));
    }

    Ok(())
}

/// Record the score property keys on a collection's top-level property
/// list, creating the list when absent.
pub fn ensure_score_properties(collection: &mut FeatureCollection) {
    let members = collection.foreign_members.get_or_insert_with(JsonObject::new);
    let list = members
        .entry("properties".to_string())
        .or_insert_with(|| json!([]));

    if let Value::Array(keys) = list {
        for key in [SCORE_KEY, CATEGORY_KEY] {
            if !keys.iter().any(|k| k == key) {
                keys.push(json!(key));
            }
        }
    }
}

/// Rank all features of a plan's datasets globally and redistribute them in
/// chunks of [`POPULARITY_CHUNK_SIZE`], one chunk per dataset in order.
///
/// Datasets past the end of the ranked list come back empty; every
/// collection gets the score keys recorded on its property list.
pub fn redistribute_by_popularity(
    mut collections: Vec<FeatureCollection>,
) -> Result<Vec<FeatureCollection>> {
    let mut all: Vec<Feature> = collections
        .iter_mut()
        .flat_map(|collection| std::mem::take(&mut collection.features))
        .collect();

    rank_by_popularity(&mut all);
    categorize_by_quartiles(&mut all)?;
    log::info!(
        "redistributing {} ranked features across {} datasets",
        all.len(),
        collections.len()
    );

    let mut ranked = all.into_iter();
    for collection in collections.iter_mut() {
        collection.features = ranked.by_ref().take(POPULARITY_CHUNK_SIZE).collect();
        ensure_score_properties(collection);
    }

    Ok(collections)
}
