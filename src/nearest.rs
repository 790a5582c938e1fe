//! Nearest-point finding and the per-pair route fan-out.

use crate::error::Result;
use crate::routing::{RouteResult, RoutingOracle};
use crate::spatial::haversine_km;
use geo::Point;
use serde::Serialize;
use smallvec::SmallVec;

/// Nearest candidates returned per target unless the caller asks otherwise.
pub const DEFAULT_NEAREST_COUNT: usize = 3;

/// One ranked candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub point: Point,
    pub distance_km: f64,
}

/// The ranked nearest candidates for one target point.
#[derive(Debug, Clone)]
pub struct NearestNeighbors {
    pub target: Point,
    pub neighbors: SmallVec<[Neighbor; DEFAULT_NEAREST_COUNT]>,
}

/// Route lookups for one target, one per surviving candidate, in rank
/// order. Failed lookups are recorded in place.
#[derive(Debug, Clone, Serialize)]
pub struct NearestRoutes {
    pub target: Point,
    pub routes: Vec<RouteResult>,
}

/// Rank every candidate by Haversine distance per target and keep the `k`
/// nearest.
///
/// The sort is stable: candidates at equal distance keep their original
/// order, so results are deterministic. Brute force, `O(T·C·log C)`; the
/// candidate set is bounded by one dataset's feature count and nothing is
/// cached between calls.
pub fn nearest_points(
    candidates: &[Point],
    targets: &[Point],
    k: usize,
) -> Result<Vec<NearestNeighbors>> {
    let mut results = Vec::with_capacity(targets.len());

    for &target in targets {
        let mut ranked: Vec<Neighbor> = Vec::with_capacity(candidates.len());
        for &candidate in candidates {
            ranked.push(Neighbor {
                point: candidate,
                distance_km: haversine_km(target, candidate)?,
            });
        }

        ranked.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(k);

        results.push(NearestNeighbors {
            target,
            neighbors: ranked.into_iter().collect(),
        });
    }

    Ok(results)
}

/// Call the routing oracle for every target/neighbor pair, sequentially.
///
/// A failed call is recorded as an error placeholder for that single pair;
/// the batch always completes.
pub fn routes_for_nearest<R: RoutingOracle>(
    oracle: &R,
    nearest: &[NearestNeighbors],
) -> Vec<NearestRoutes> {
    nearest
        .iter()
        .map(|entry| {
            let routes = entry
                .neighbors
                .iter()
                .map(|neighbor| match oracle.route(entry.target, neighbor.point) {
                    Ok(info) => RouteResult::Route(info),
                    Err(err) => {
                        log::warn!(
                            "route lookup failed for ({:.5}, {:.5}) -> ({:.5}, {:.5}): {}",
                            entry.target.x(),
                            entry.target.y(),
                            neighbor.point.x(),
                            neighbor.point.y(),
                            err
                        );
                        RouteResult::Error {
                            error: err.to_string(),
                        }
                    }
                })
                .collect();

            NearestRoutes {
                target: entry.target,
                routes,
            }
        })
        .collect()
}
