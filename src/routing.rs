//! Routing-oracle collaborator contract.

use crate::error::Result;
use geo::Point;
use serde::{Deserialize, Serialize};

/// Route estimate between one origin/destination pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteInfo {
    #[serde(default)]
    pub route: Vec<RouteLeg>,
}

/// One returned route alternative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteLeg {
    /// Traffic-free duration as the provider encodes it, e.g. `"347s"`.
    pub static_duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
}

impl RouteLeg {
    /// Parsed traffic-free duration in seconds.
    ///
    /// A malformed duration string yields `None`; the pair is then treated
    /// as having no route data rather than failing the batch.
    pub fn static_seconds(&self) -> Option<u64> {
        self.static_duration
            .strip_suffix('s')
            .and_then(|s| s.trim().parse().ok())
    }
}

/// Outcome of one route lookup. Per-pair failures are recorded, never
/// propagated: classification must still complete for the other targets.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RouteResult {
    Route(RouteInfo),
    Error { error: String },
}

impl RouteResult {
    /// Traffic-free duration of the primary route alternative, if any route
    /// data is present.
    pub fn static_seconds(&self) -> Option<u64> {
        match self {
            RouteResult::Route(info) => info.route.first().and_then(RouteLeg::static_seconds),
            RouteResult::Error { .. } => None,
        }
    }
}

/// External routing oracle.
pub trait RoutingOracle {
    /// Estimate a route between two points, lon/lat each.
    fn route(&self, origin: Point, destination: Point) -> Result<RouteInfo>;
}
