//! Search-plan flattening and the descriptor wire format.
//!
//! A coverage tree is flattened breadth-first into an ordered list of
//! descriptor strings that external callers persist and resume against. The
//! descriptor and sentinel formats are a wire contract; raw strings are
//! parsed into [`PlanEntry`] at this boundary and never threaded through the
//! algorithmic core.

use crate::coverage::Circle;
use crate::error::{PlaceCoverError, Result};
use geo::Point;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

/// Final element of every persisted plan. No ordinary descriptor may equal
/// it.
pub const PLAN_SENTINEL: &str = "end of search plan";

/// Suffix marking an entry excluded from further traversal.
pub const SKIP_SUFFIX: &str = "_skip";

const POSITION_FIELD: &str = "_circle=";
const ORDINAL_FIELD: &str = "_circleNumber=";

/// Dotted hierarchical position of a circle within the coverage tree, e.g.
/// `1.3.2`. The root is `1`; child numbering starts at 1 in enqueue order
/// with the concentric child first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CirclePosition(String);

impl CirclePosition {
    pub fn root() -> Self {
        Self("1".to_string())
    }

    /// Position of the 1-based `index`th child.
    pub fn child(&self, index: usize) -> Self {
        Self(format!("{}.{}", self.0, index))
    }

    /// Parses a dotted position. Every segment must be a non-empty run of
    /// digits.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty()
            || !raw
                .split('.')
                .all(|seg| !seg.is_empty() && seg.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(PlaceCoverError::InvalidInput(format!(
                "Malformed circle position: {:?}",
                raw
            )));
        }
        Ok(Self(raw.to_string()))
    }

    /// True iff `self` lies strictly below `other` in the tree.
    ///
    /// Dotted-prefix match: `1.3` is an ancestor of `1.3.2` but not of
    /// `1.30`, and never of itself.
    pub fn is_descendant_of(&self, other: &CirclePosition) -> bool {
        self.0
            .strip_prefix(&other.0)
            .is_some_and(|rest| rest.starts_with('.'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CirclePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One search descriptor, the typed form of a plan entry string.
///
/// Wire format, fields joined by `_`:
///
/// ```text
/// {lng}_{lat}_{radius_m}_{filter}_circle={position}[*]_circleNumber={ordinal}[_skip]
/// ```
///
/// `filter` is the search-type tag, optionally followed by a free-text term.
/// Both may themselves contain `_`, so parsing keeps them as one field; only
/// the leading coordinates and the trailing markers are structural.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanEntry {
    /// Search center as lon/lat.
    pub center: Point,
    /// Search radius in meters.
    pub radius_m: f64,
    /// Type tag plus optional text-search term.
    pub filter: String,
    pub position: CirclePosition,
    /// True iff the `*` center marker is present.
    pub is_center: bool,
    /// Breadth-first visit counter, starting at 1.
    pub ordinal: u32,
    pub skip: bool,
}

impl PlanEntry {
    /// Encode to the descriptor wire format.
    pub fn encode(&self) -> String {
        let marker = if self.is_center { "*" } else { "" };
        let mut out = format!(
            "{}_{}_{}_{}{}{}{}{}{}",
            self.center.x(),
            self.center.y(),
            self.radius_m,
            self.filter,
            POSITION_FIELD,
            self.position,
            marker,
            ORDINAL_FIELD,
            self.ordinal,
        );
        if self.skip {
            out.push_str(SKIP_SUFFIX);
        }
        out
    }

    /// Parse a descriptor string.
    ///
    /// The sentinel is not a descriptor and fails here; callers check for it
    /// first.
    pub fn parse(raw: &str) -> Result<Self> {
        let malformed =
            |what: &str| PlaceCoverError::InvalidInput(format!("{} in plan entry: {:?}", what, raw));

        let (body, skip) = match raw.strip_suffix(SKIP_SUFFIX) {
            Some(body) => (body, true),
            None => (raw, false),
        };

        let (head, tail) = body
            .split_once(POSITION_FIELD)
            .ok_or_else(|| malformed("Missing circle position"))?;
        let (position_part, ordinal_part) = tail
            .split_once(ORDINAL_FIELD)
            .ok_or_else(|| malformed("Missing circle ordinal"))?;

        let (position_raw, is_center) = match position_part.strip_suffix('*') {
            Some(p) => (p, true),
            None => (position_part, false),
        };
        let position = CirclePosition::parse(position_raw)?;

        let ordinal: u32 = ordinal_part
            .parse()
            .map_err(|_| malformed("Non-numeric circle ordinal"))?;

        let mut fields = head.splitn(4, '_');
        let lng: f64 = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| malformed("Bad longitude"))?;
        let lat: f64 = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| malformed("Bad latitude"))?;
        let radius_m: f64 = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| malformed("Bad radius"))?;
        let filter = fields.next().unwrap_or_default().to_string();

        Ok(Self {
            center: Point::new(lng, lat),
            radius_m,
            filter,
            position,
            is_center,
            ordinal,
            skip,
        })
    }

    /// The descriptor prefix before the position marker. Doubles as the
    /// dataset filename key for the search this entry describes.
    pub fn dataset_key(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.center.x(),
            self.center.y(),
            self.radius_m,
            self.filter
        )
    }
}

/// True iff `entry` is the plan sentinel.
pub fn is_sentinel(entry: &str) -> bool {
    entry == PLAN_SENTINEL
}

/// True iff `entry` carries the skip mark.
pub fn is_skipped(entry: &str) -> bool {
    entry.ends_with(SKIP_SUFFIX)
}

/// Append the skip mark to a raw entry. Idempotent.
pub fn mark_skip(entry: &str) -> String {
    if is_skipped(entry) {
        entry.to_string()
    } else {
        format!("{}{}", entry, SKIP_SUFFIX)
    }
}

/// Dataset filename key for an ad-hoc (non-plan) search.
pub fn dataset_key(center: Point, radius_m: f64, filter: &str) -> String {
    format!("{}_{}_{}_{}", center.x(), center.y(), radius_m, filter)
}

/// Combined filter field: the type tag, with the text-search term appended
/// when present.
pub fn filter_field(type_tag: &str, text_search: Option<&str>) -> String {
    match text_search {
        Some(text) if !text.is_empty() => format!("{}_{}", type_tag, text),
        _ => type_tag.to_string(),
    }
}

/// Derive the persisted plan name: `plan_{tag}_{country}_{city}`, with a
/// `_text_search=` suffix when the request carries a free-text term.
pub fn plan_name(type_tag: &str, country: &str, city: &str, text_search: Option<&str>) -> String {
    let mut name = format!("plan_{}_{}_{}", type_tag, country, city);
    if text_search.is_some_and(|t| !t.is_empty()) {
        name.push_str("_text_search=");
    }
    name
}

/// Flatten a coverage tree into descriptor strings.
///
/// Traversal is breadth-first by insertion order: the root enters the queue
/// at position `1`, and each dequeued circle enqueues its children in the
/// fixed order [center, ring 0°, …, ring 300°], numbered `{pos}.1` through
/// `{pos}.7`. Ordinals count dequeues starting at 1. This exact order is
/// load-bearing: pagination and rectification depend on the ordinal and
/// prefix relationships it produces.
pub fn flatten(tree: &Circle, type_tag: &str, text_search: Option<&str>) -> Vec<String> {
    let filter = filter_field(type_tag, text_search);

    let mut result = Vec::new();
    let mut queue: VecDeque<(&Circle, CirclePosition)> = VecDeque::new();
    queue.push_back((tree, CirclePosition::root()));
    let mut ordinal = 0u32;

    while let Some((circle, position)) = queue.pop_front() {
        ordinal += 1;
        let entry = PlanEntry {
            center: circle.center,
            radius_m: circle.radius_km * 1000.0,
            filter: filter.clone(),
            position: position.clone(),
            is_center: circle.is_center,
            ordinal,
            skip: false,
        };
        result.push(entry.encode());

        for (i, child) in circle.children.iter().enumerate() {
            queue.push_back((child, position.child(i + 1)));
        }
    }

    log::debug!("flattened coverage tree into {} plan entries", result.len());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::cover;

    #[test]
    fn descriptor_round_trip() {
        let entry = PlanEntry {
            center: Point::new(46.6753, 24.7136),
            radius_m: 30000.0,
            filter: "restaurant".to_string(),
            position: CirclePosition::parse("1.3.2").unwrap(),
            is_center: false,
            ordinal: 17,
            skip: false,
        };

        let encoded = entry.encode();
        assert_eq!(
            encoded,
            "46.6753_24.7136_30000_restaurant_circle=1.3.2_circleNumber=17"
        );
        assert_eq!(PlanEntry::parse(&encoded).unwrap(), entry);
    }

    #[test]
    fn center_marker_and_skip_round_trip() {
        let raw = "0_0_1000_cafe_circle=1.1*_circleNumber=2_skip";
        let entry = PlanEntry::parse(raw).unwrap();

        assert!(entry.is_center);
        assert!(entry.skip);
        assert_eq!(entry.position.as_str(), "1.1");
        assert_eq!(entry.encode(), raw);
    }

    #[test]
    fn filter_may_contain_underscores() {
        let raw = "1.5_2.5_2000_gas_station_coffee shop_circle=1_circleNumber=1";
        let entry = PlanEntry::parse(raw).unwrap();
        assert_eq!(entry.filter, "gas_station_coffee shop");
        assert_eq!(entry.dataset_key(), "1.5_2.5_2000_gas_station_coffee shop");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(PlanEntry::parse(PLAN_SENTINEL).is_err());
        assert!(PlanEntry::parse("1_2_3_tag").is_err());
        assert!(PlanEntry::parse("1_2_3_tag_circle=1_circleNumber=x").is_err());
        assert!(PlanEntry::parse("x_2_3_tag_circle=1_circleNumber=1").is_err());
        assert!(PlanEntry::parse("1_2_3_tag_circle=1a_circleNumber=1").is_err());
    }

    #[test]
    fn descendant_is_strict_dotted_prefix() {
        let root = CirclePosition::parse("1").unwrap();
        let one_three = CirclePosition::parse("1.3").unwrap();
        let one_three_two = CirclePosition::parse("1.3.2").unwrap();
        let one_thirty = CirclePosition::parse("1.30").unwrap();

        assert!(one_three_two.is_descendant_of(&one_three));
        assert!(one_three.is_descendant_of(&root));
        assert!(!one_thirty.is_descendant_of(&one_three));
        assert!(!one_three.is_descendant_of(&one_three));
        assert!(!root.is_descendant_of(&one_three));
    }

    #[test]
    fn skip_mark_is_idempotent() {
        let raw = "0_0_1000_cafe_circle=1_circleNumber=1";
        let marked = mark_skip(raw);
        assert!(marked.ends_with(SKIP_SUFFIX));
        assert_eq!(mark_skip(&marked), marked);
    }

    #[test]
    fn flatten_counts_and_ordinals() {
        // Radius 4 km: root + 7 children (radius 2) + 49 grandchildren
        // (radius 1), with only the center grandchild recursing further.
        let tree = cover(Point::new(0.0, 0.0), 4.0).unwrap();
        let plan = flatten(&tree, "parking", None);

        assert_eq!(plan.len(), tree.count());

        for (i, raw) in plan.iter().enumerate() {
            let entry = PlanEntry::parse(raw).unwrap();
            assert_eq!(entry.ordinal as usize, i + 1);
        }
    }

    #[test]
    fn flatten_is_breadth_first_with_center_first_numbering() {
        let tree = cover(Point::new(0.0, 0.0), 4.0).unwrap();
        let plan = flatten(&tree, "parking", None);

        let positions: Vec<String> = plan
            .iter()
            .map(|raw| PlanEntry::parse(raw).unwrap().position.as_str().to_string())
            .collect();

        assert_eq!(positions[0], "1");
        assert_eq!(&positions[1..8], &["1.1", "1.2", "1.3", "1.4", "1.5", "1.6", "1.7"]);
        // Level order: all depth-2 positions precede depth-3 positions.
        assert_eq!(positions[8], "1.1.1");

        let first = PlanEntry::parse(&plan[1]).unwrap();
        assert!(first.is_center);
    }

    #[test]
    fn flatten_full_tree_size_is_powers_of_seven() {
        // Radius 8 km with these thresholds recurses uniformly for two
        // levels: 1 + 7 + 49 nodes at radii 8, 4, 2, then the asymmetric
        // fringe below.
        let tree = cover(Point::new(0.0, 0.0), 8.0).unwrap();
        let plan = flatten(&tree, "t", None);
        assert_eq!(plan.len(), tree.count());
        assert!(plan.len() > 1 + 7 + 49);
    }

    #[test]
    fn text_search_joins_filter_and_plan_name() {
        assert_eq!(filter_field("cafe", Some("best espresso")), "cafe_best espresso");
        assert_eq!(filter_field("cafe", None), "cafe");
        assert_eq!(
            plan_name("parking", "Saudi Arabia", "Jeddah", None),
            "plan_parking_Saudi Arabia_Jeddah"
        );
        assert_eq!(
            plan_name("cafe", "Saudi Arabia", "Jeddah", Some("espresso")),
            "plan_cafe_Saudi Arabia_Jeddah_text_search="
        );
    }
}
