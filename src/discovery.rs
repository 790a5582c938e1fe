//! Plan-driven fetch orchestration.
//!
//! Ties the planner, the pagination state machine, the dataset cache, and
//! the places client together: one call resolves the current plan entry,
//! runs (or replays) its search, and hands back the continuation token for
//! the next page, rectifying the plan when a sub-search comes back sparse.

use crate::coverage::cover;
use crate::error::{PlaceCoverError, Result};
use crate::pagination::{
    PageToken, PlanCursor, encode_token, rectify_plan, resume_plan, start_plan,
};
use crate::places::{PlacesClient, SearchQuery};
use crate::plan;
use crate::store::{DatasetCache, PlanStore};
use crate::types::{FetchAction, SearchKind, TypeFilter};
use geo::Point;
use geojson::FeatureCollection;
use uuid::Uuid;

/// A full-data fetch below this request radius does not decompose into a
/// coverage plan.
pub const MIN_PLAN_RADIUS_M: f64 = 750.0;

/// A completed sub-search returning fewer features than this marks its
/// whole sub-tree as not worth visiting.
pub const SPARSE_RESULT_THRESHOLD: usize = 20;

/// One nearby/text discovery request.
#[derive(Debug, Clone)]
pub struct NearbyRequest {
    pub lat: f64,
    pub lng: f64,
    /// Requested search radius in meters.
    pub radius_m: f64,
    pub filter: TypeFilter,
    pub text_search: Option<String>,
    pub country: String,
    pub city: String,
    /// Empty to start; otherwise an encoded continuation token.
    pub page_token: String,
    pub action: FetchAction,
    pub kind: SearchKind,
}

impl NearbyRequest {
    fn filter_field(&self) -> String {
        plan::filter_field(&self.filter.tag(), self.text_search.as_deref())
    }
}

/// What one fetch step produced.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub collection: FeatureCollection,
    /// Cache key the collection is stored under.
    pub dataset_id: String,
    /// Fresh layer identifier for this response.
    pub layer_id: String,
    pub records_count: usize,
    /// Token for the next page; empty when the plan is exhausted (or when
    /// the request was not plan-driven).
    pub next_page_token: String,
    /// Name of the persisted plan; empty for single-page fetches.
    pub plan_name: String,
}

/// Discovery front door, generic over the persisted-plan store, the dataset
/// cache, and the places client.
#[derive(Debug)]
pub struct DiscoveryEngine<S, C, P> {
    plan_store: S,
    dataset_cache: C,
    places: P,
}

impl<S, C, P> DiscoveryEngine<S, C, P>
where
    S: PlanStore,
    C: DatasetCache,
    P: PlacesClient,
{
    pub fn new(plan_store: S, dataset_cache: C, places: P) -> Self {
        Self {
            plan_store,
            dataset_cache,
            places,
        }
    }

    pub fn plan_store(&self) -> &S {
        &self.plan_store
    }

    pub fn dataset_cache(&self) -> &C {
        &self.dataset_cache
    }

    pub fn places(&self) -> &P {
        &self.places
    }

    /// Run one fetch step.
    ///
    /// Full-data requests walk the persisted coverage plan one entry per
    /// call; sample requests run a single direct search and pass the
    /// incoming token through untouched.
    pub fn fetch(&mut self, request: &NearbyRequest) -> Result<FetchOutcome> {
        match request.action {
            FetchAction::FullData => self.fetch_planned(request),
            FetchAction::Sample => self.fetch_single(request),
        }
    }

    fn fetch_planned(&mut self, request: &NearbyRequest) -> Result<FetchOutcome> {
        let cursor = self.resolve_cursor(request)?;
        self.run_step(cursor, request)
    }

    fn run_step(&mut self, cursor: PlanCursor, request: &NearbyRequest) -> Result<FetchOutcome> {
        let entry = cursor.entry()?;
        let dataset_id = entry.dataset_key();
        let query = SearchQuery {
            center: entry.center,
            radius_m: entry.radius_m,
            kind: request.kind,
            filter: request.filter.clone(),
            text: request.text_search.clone(),
        };
        let collection = self.load_or_search(&dataset_id, &query)?;

        // Sparse sub-search: write the skip marks back through the plan
        // store and re-point the token at the next eligible entry.
        let mut next_token = cursor.next_token;
        if collection.features.len() < SPARSE_RESULT_THRESHOLD {
            next_token = rectify_plan(&mut self.plan_store, &cursor.plan_name, cursor.index)?
                .map(|index| PageToken::new(cursor.plan_name.clone(), index));
        }

        Ok(FetchOutcome {
            records_count: collection.features.len(),
            dataset_id,
            layer_id: Uuid::new_v4().to_string(),
            next_page_token: encode_token(&next_token),
            plan_name: cursor.plan_name,
            collection,
        })
    }

    fn resolve_cursor(&mut self, request: &NearbyRequest) -> Result<PlanCursor> {
        if !request.page_token.is_empty() {
            let token = PageToken::parse(&request.page_token)?;
            return resume_plan(&self.plan_store, &token);
        }

        if request.radius_m <= MIN_PLAN_RADIUS_M {
            return Err(PlaceCoverError::InvalidInput(format!(
                "Full-data fetch requires a radius above {} m, got: {}",
                MIN_PLAN_RADIUS_M, request.radius_m
            )));
        }

        let tree = cover(Point::new(request.lng, request.lat), request.radius_m / 1000.0)?;
        let entries = plan::flatten(&tree, &request.filter.tag(), request.text_search.as_deref());
        let name = plan::plan_name(
            &request.filter.tag(),
            &request.country,
            &request.city,
            request.text_search.as_deref(),
        );
        start_plan(&mut self.plan_store, &name, entries)
    }

    /// Start a full-data fetch over an externally supplied per-record plan,
    /// for record-oriented domains with no search geometry.
    pub fn fetch_with_plan(
        &mut self,
        plan_name: &str,
        entries: Vec<String>,
        request: &NearbyRequest,
    ) -> Result<FetchOutcome> {
        let cursor = start_plan(&mut self.plan_store, plan_name, entries)?;
        self.run_step(cursor, request)
    }

    fn fetch_single(&mut self, request: &NearbyRequest) -> Result<FetchOutcome> {
        let center = Point::new(request.lng, request.lat);
        let dataset_id = plan::dataset_key(center, request.radius_m, &request.filter_field());
        let query = SearchQuery {
            center,
            radius_m: request.radius_m,
            kind: request.kind,
            filter: request.filter.clone(),
            text: request.text_search.clone(),
        };
        let collection = self.load_or_search(&dataset_id, &query)?;

        Ok(FetchOutcome {
            records_count: collection.features.len(),
            dataset_id,
            layer_id: Uuid::new_v4().to_string(),
            next_page_token: request.page_token.clone(),
            plan_name: String::new(),
            collection,
        })
    }

    fn load_or_search(&mut self, key: &str, query: &SearchQuery) -> Result<FeatureCollection> {
        if let Some(cached) = self.dataset_cache.get(key)? {
            log::debug!("dataset cache hit for {:?}", key);
            return Ok(cached);
        }

        let collection = self.places.search(query)?;
        self.dataset_cache.put(key, &collection)?;
        Ok(collection)
    }
}
