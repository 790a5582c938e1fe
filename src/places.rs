//! Places-search collaborator contract.
//!
//! The provider client lives outside this crate; the core hands it one
//! search descriptor at a time and only ever inspects the length of the
//! returned feature list.

use crate::error::Result;
use crate::types::{SearchKind, TypeFilter};
use geo::Point;
use geojson::FeatureCollection;

/// One circle search against the places provider.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Search center as lon/lat.
    pub center: Point,
    pub radius_m: f64,
    pub kind: SearchKind,
    pub filter: TypeFilter,
    /// Free-text term for keyword searches.
    pub text: Option<String>,
}

/// External places/text-search client.
pub trait PlacesClient {
    /// Run one search. A transport or provider failure surfaces as
    /// `UpstreamUnavailable` and aborts the current fetch step.
    fn search(&self, query: &SearchQuery) -> Result<FeatureCollection>;
}
