//! Recursive circle coverage planning.
//!
//! A search disc too large for a single places query is partitioned into one
//! concentric circle and six ring circles of half the radius, packed
//! hexagonally, recursing until the would-be child radius drops below the
//! role-specific minimum. The resulting tree is consumed once by the plan
//! flattener; it is never persisted.

use crate::error::{PlaceCoverError, Result};
use crate::spatial::{destination_point, validate_geographic_point};
use geo::Point;
use serde::Serialize;
use std::fmt;

/// Bearings of the six ring children, degrees clockwise from north.
const RING_BEARINGS_DEG: [f64; 6] = [0.0, 60.0, 120.0, 180.0, 240.0, 300.0];

/// Stop thresholds for the would-be child radius. Concentric children keep
/// recursing to a tighter minimum than ring children, so the center position
/// covers one level deeper at the same radius.
const CENTER_CHILD_MIN_RADIUS_KM: f64 = 0.5;
const RING_CHILD_MIN_RADIUS_KM: f64 = 1.0;

/// One node in the hexagonal packing of a search area.
///
/// Invariant: `children` is empty (leaf) or holds exactly seven circles in
/// fixed order — the concentric child first, then the six ring children at
/// 60 degree increments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Circle {
    /// Center as lon/lat.
    pub center: Point,
    /// Radius in kilometers.
    pub radius_km: f64,
    /// True iff this circle is the concentric child of its parent.
    pub is_center: bool,
    pub children: Vec<Circle>,
}

impl Circle {
    /// Total number of circles in this tree, including self.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Circle::count).sum::<usize>()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn fmt_hierarchy(&self, f: &mut fmt::Formatter<'_>, number: &str) -> fmt::Result {
        let marker = if self.is_center { "*" } else { "" };
        writeln!(
            f,
            "Circle {}{}: Center: (lng: {:.4}, lat: {:.4}), Radius: {:.2} km",
            number,
            marker,
            self.center.x(),
            self.center.y(),
            self.radius_km
        )?;
        for (i, child) in self.children.iter().enumerate() {
            let child_number = if number.is_empty() {
                format!("{}", i + 1)
            } else {
                format!("{}.{}", number, i + 1)
            };
            child.fmt_hierarchy(f, &child_number)?;
        }
        Ok(())
    }
}

/// Renders the hierarchy one circle per line with dotted numbering; center
/// circles are marked with `*`.
impl fmt::Display for Circle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_hierarchy(f, "")
    }
}

/// Cover a disc with a recursive hexagonal packing of smaller discs.
///
/// Each non-leaf circle gets seven children of half its radius: one sharing
/// its center and six at distance `radius * sqrt(3)/2` on the ring bearings.
///
/// # Examples
///
/// ```
/// use placecover::coverage::cover;
/// use geo::Point;
///
/// // A 1 km disc is already below the ring stop threshold: leaf.
/// let leaf = cover(Point::new(0.0, 0.0), 1.0).unwrap();
/// assert!(leaf.is_leaf());
///
/// // An 8 km disc recurses.
/// let tree = cover(Point::new(0.0, 0.0), 8.0).unwrap();
/// assert_eq!(tree.children.len(), 7);
/// assert!(tree.children[0].is_center);
/// ```
pub fn cover(center: Point, radius_km: f64) -> Result<Circle> {
    validate_geographic_point(&center)?;

    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(PlaceCoverError::InvalidInput(format!(
            "Coverage radius must be positive, got: {} km",
            radius_km
        )));
    }

    let tree = cover_circle(center, radius_km, false);
    log::debug!(
        "covered {:.2} km disc at ({:.4}, {:.4}) with {} circles",
        radius_km,
        center.x(),
        center.y(),
        tree.count()
    );
    Ok(tree)
}

fn cover_circle(center: Point, radius_km: f64, is_center: bool) -> Circle {
    let child_radius = 0.5 * radius_km;
    let min_child = if is_center {
        CENTER_CHILD_MIN_RADIUS_KM
    } else {
        RING_CHILD_MIN_RADIUS_KM
    };

    if child_radius < min_child {
        return Circle {
            center,
            radius_km,
            is_center,
            children: Vec::new(),
        };
    }

    let ring_distance = radius_km * 3f64.sqrt() / 2.0;

    let mut children = Vec::with_capacity(7);
    children.push(cover_circle(center, child_radius, true));
    for bearing in RING_BEARINGS_DEG {
        let ring_center = destination_point(center, bearing, ring_distance);
        children.push(cover_circle(ring_center, child_radius, false));
    }

    Circle {
        center,
        radius_km,
        is_center,
        children,
    }
}
