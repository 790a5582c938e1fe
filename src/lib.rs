//! Exhaustive point-of-interest discovery over large geographic areas.
//!
//! A search radius too big for one places query is decomposed into a
//! recursive hexagonal packing of smaller circles, flattened into a
//! persisted search plan that is walked page by page through an opaque
//! continuation token, with sparse sub-trees rectified away. Fetched point
//! layers can later be partitioned into colored zones by drive-time bands
//! or a statistical influence gradient.
//!
//! ```rust
//! use placecover::{cover, flatten, PageToken};
//! use geo::Point;
//!
//! let tree = cover(Point::new(46.6753, 24.7136), 30.0)?;
//! let entries = flatten(&tree, "parking", None);
//! assert_eq!(entries.len(), tree.count());
//!
//! let token = PageToken::parse("page_token=plan_parking_Saudi Arabia_Riyadh@#$1")?;
//! assert_eq!(token.index, 1);
//! # Ok::<(), placecover::PlaceCoverError>(())
//! ```

pub mod categories;
pub mod coverage;
pub mod discovery;
pub mod error;
pub mod nearest;
pub mod pagination;
pub mod places;
pub mod plan;
pub mod popularity;
pub mod routing;
pub mod spatial;
pub mod stats;
pub mod store;
pub mod types;
pub mod zones;

pub use error::{PlaceCoverError, Result};

pub use coverage::{Circle, cover};

pub use plan::{CirclePosition, PLAN_SENTINEL, PlanEntry, flatten};

pub use pagination::{
    PageToken, PlanCursor, encode_token, rectify_plan, resume_plan, start_plan,
};

pub use store::{DatasetCache, MemoryDatasetCache, MemoryPlanStore, PlanStore};

pub use places::{PlacesClient, SearchQuery};

pub use routing::{RouteInfo, RouteLeg, RouteResult, RoutingOracle};

pub use nearest::{
    DEFAULT_NEAREST_COUNT, NearestNeighbors, NearestRoutes, Neighbor, nearest_points,
    routes_for_nearest,
};

pub use zones::{CoverageProperty, LayerSource, ZoneLayer, ZoneSpec, classify};

pub use discovery::{DiscoveryEngine, FetchOutcome, NearbyRequest};

pub use types::{FetchAction, SearchKind, TypeFilter};

pub use geo::Point;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{PlaceCoverError, Result};

    pub use geo::Point;

    pub use crate::coverage::{Circle, cover};

    pub use crate::plan::{PlanEntry, flatten};

    pub use crate::pagination::{PageToken, rectify_plan, resume_plan, start_plan};

    pub use crate::{DatasetCache, MemoryDatasetCache, MemoryPlanStore, PlanStore};

    pub use crate::{PlacesClient, RoutingOracle};

    pub use crate::zones::{CoverageProperty, LayerSource, ZoneSpec, classify};

    pub use crate::{DiscoveryEngine, FetchAction, NearbyRequest, SearchKind, TypeFilter};
}
