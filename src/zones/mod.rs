//! Zone classification engine.
//!
//! Given two already-fetched point layers, partitions one of them into
//! colored sub-layers: either by estimated drive-time bands against a
//! routing oracle, or by a statistically-derived influence score computed
//! from nearby-point averaging and percentile thresholds. Every input
//! feature lands in exactly one output layer, including a catch-all for
//! points the strategy could not allocate.

mod drive_time;
mod gradient;

use crate::error::{PlaceCoverError, Result};
use crate::routing::RoutingOracle;
use geo::Point;
use geojson::{Feature, FeatureCollection, JsonObject, Value};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use drive_time::AVERAGE_SPEED_MPS;
pub use gradient::GRADIENT_PERCENTILES;

/// Color used when the caller's palette runs short or a layer has no
/// palette slot.
pub const FALLBACK_COLOR: &str = "#FFFFFF";

/// Which signal partitions the classified layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageProperty {
    /// Band targets by estimated drive time to their nearest based-on
    /// points; `value` is a time budget in minutes.
    DriveTime,
    /// Band targets by the average of the named numeric property over
    /// based-on points nearby; `value` is a radius in meters.
    Influence(String),
}

/// Classification parameters common to both strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub coverage: CoverageProperty,
    /// Minutes for drive-time mode, meters for influence mode.
    pub value: f64,
    /// Positional layer colors; white fills in past the end.
    pub palette: Vec<String>,
}

/// One input layer: its fetched features plus the metadata classification
/// copies onto the output.
#[derive(Debug, Clone)]
pub struct LayerSource {
    pub id: String,
    pub name: String,
    pub city_name: String,
    pub collection: FeatureCollection,
}

/// One output sub-layer of a classification run.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneLayer {
    /// Fresh identifier minted per run.
    pub layer_id: String,
    pub sub_layer_id: String,
    /// Identifier of the classified input layer.
    pub dataset_id: String,
    pub layer_name: String,
    pub color: String,
    pub legend: String,
    pub description: String,
    pub city_name: String,
    pub records_count: usize,
    pub is_zone_layer: bool,
    /// Property keys of the first feature, for presentation.
    pub properties: Vec<String>,
    pub features: Vec<Feature>,
}

impl ZoneLayer {
    fn assemble(
        change: &LayerSource,
        sub_layer_id: String,
        layer_name: String,
        color: String,
        legend: String,
        description: String,
        features: Vec<Feature>,
    ) -> Self {
        Self {
            layer_id: Uuid::new_v4().to_string(),
            properties: property_keys(&features),
            records_count: features.len(),
            city_name: change.city_name.clone(),
            dataset_id: change.id.clone(),
            is_zone_layer: true,
            sub_layer_id,
            layer_name,
            color,
            legend,
            description,
            features,
        }
    }
}

/// Partition `change` into zone layers using `based_on` as the reference
/// set.
///
/// The routing oracle is consulted only in drive-time mode. Output layers
/// are disjoint and cover every input feature; empty bands are not emitted.
pub fn classify<R: RoutingOracle>(
    oracle: &R,
    change: &LayerSource,
    based_on: &LayerSource,
    spec: &ZoneSpec,
) -> Result<Vec<ZoneLayer>> {
    match &spec.coverage {
        CoverageProperty::DriveTime => {
            drive_time::classify(oracle, change, based_on, spec.value, &spec.palette)
        }
        CoverageProperty::Influence(property) => {
            gradient::classify(change, based_on, property, spec.value, &spec.palette)
        }
    }
}

/// Extract the lon/lat of a point feature.
pub(crate) fn feature_point(feature: &Feature) -> Result<Point> {
    match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Point(coords)) if coords.len() >= 2 => Ok(Point::new(coords[0], coords[1])),
        _ => Err(PlaceCoverError::DataInconsistency(
            "Feature has no point geometry".to_string(),
        )),
    }
}

/// Copy of a feature reduced to geometry and properties, dropping ids,
/// bounding boxes, and foreign members.
pub(crate) fn bare_feature(feature: &Feature) -> Feature {
    Feature {
        bbox: None,
        geometry: feature.geometry.clone(),
        id: None,
        properties: feature.properties.clone(),
        foreign_members: None,
    }
}

pub(crate) fn set_property(
    feature: &mut Feature,
    key: &str,
    value: serde_json::Value,
) {
    feature
        .properties
        .get_or_insert_with(JsonObject::new)
        .insert(key.to_string(), value);
}

/// Property keys of the first feature, empty when there are none.
pub(crate) fn property_keys(features: &[Feature]) -> Vec<String> {
    features
        .first()
        .and_then(|f| f.properties.as_ref())
        .map(|props| props.keys().cloned().collect())
        .unwrap_or_default()
}

pub(crate) fn palette_color(palette: &[String], index: usize) -> String {
    palette
        .get(index)
        .cloned()
        .unwrap_or_else(|| FALLBACK_COLOR.to_string())
}
