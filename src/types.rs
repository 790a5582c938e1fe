//! Shared request and response types.

use serde::{Deserialize, Serialize};

/// Included/excluded place-type lists that scope a category search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeFilter {
    #[serde(default)]
    pub included: Vec<String>,
    #[serde(default)]
    pub excluded: Vec<String>,
}

impl TypeFilter {
    pub fn new(included: Vec<String>, excluded: Vec<String>) -> Self {
        Self { included, excluded }
    }

    /// The search-type tag embedded in plan descriptors and plan names:
    /// included types joined by `_`, then `_excluding_{types}` when
    /// exclusions are present.
    ///
    /// # Examples
    ///
    /// ```
    /// use placecover::types::TypeFilter;
    ///
    /// let filter = TypeFilter::new(vec!["parking".into()], vec![]);
    /// assert_eq!(filter.tag(), "parking");
    ///
    /// let filter = TypeFilter::new(
    ///     vec!["restaurant".into(), "cafe".into()],
    ///     vec!["bar".into()],
    /// );
    /// assert_eq!(filter.tag(), "restaurant_cafe_excluding_bar");
    /// ```
    pub fn tag(&self) -> String {
        let mut tag = self.included.join("_");
        if !self.excluded.is_empty() {
            tag.push_str("_excluding_");
            tag.push_str(&self.excluded.join("_"));
        }
        tag
    }
}

/// Whether a fetch walks the whole coverage plan or returns a single page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FetchAction {
    /// Exhaustive plan-driven fetch.
    #[serde(rename = "full data")]
    FullData,
    /// One direct search, no plan involvement.
    #[default]
    Sample,
}

/// Which places endpoint a search targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    /// Nearby search scoped by included/excluded types.
    #[default]
    Category,
    /// Free-text search.
    Keyword,
}
