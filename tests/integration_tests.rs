use geojson::{Feature, FeatureCollection, Geometry, Value};
use placecover::plan::{PLAN_SENTINEL, PlanEntry, is_skipped};
use placecover::{
    DiscoveryEngine, FetchAction, MemoryDatasetCache, MemoryPlanStore, PageToken, PlaceCoverError,
    PlacesClient, PlanStore, Result, SearchKind, SearchQuery, TypeFilter,
};
use std::cell::RefCell;

/// Stub places client returning a configurable number of features and
/// recording every query it serves.
struct StubPlaces {
    features_per_search: usize,
    searches: RefCell<Vec<SearchQuery>>,
}

impl StubPlaces {
    fn new(features_per_search: usize) -> Self {
        Self {
            features_per_search,
            searches: RefCell::new(Vec::new()),
        }
    }

    fn search_count(&self) -> usize {
        self.searches.borrow().len()
    }
}

impl PlacesClient for StubPlaces {
    fn search(&self, query: &SearchQuery) -> Result<FeatureCollection> {
        self.searches.borrow_mut().push(query.clone());

        let features = (0..self.features_per_search)
            .map(|i| Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![
                    query.center.x() + i as f64 * 1e-4,
                    query.center.y(),
                ]))),
                id: None,
                properties: None,
                foreign_members: None,
            })
            .collect();

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }
}

fn request(page_token: &str, action: FetchAction) -> placecover::NearbyRequest {
    placecover::NearbyRequest {
        lat: 24.7136,
        lng: 46.6753,
        radius_m: 8000.0,
        filter: TypeFilter::new(vec!["parking".to_string()], vec![]),
        text_search: None,
        country: "Saudi Arabia".to_string(),
        city: "Riyadh".to_string(),
        page_token: page_token.to_string(),
        action,
        kind: SearchKind::Category,
    }
}

/// Test 1: a full-data start builds, persists, and searches the plan root
#[test]
fn test_full_data_start() {
    let mut engine = DiscoveryEngine::new(
        MemoryPlanStore::new(),
        MemoryDatasetCache::new(),
        StubPlaces::new(20),
    );

    let outcome = engine
        .fetch(&request("", FetchAction::FullData))
        .expect("fetch failed");

    assert_eq!(outcome.plan_name, "plan_parking_Saudi Arabia_Riyadh");
    assert_eq!(outcome.records_count, 20);
    assert_eq!(
        outcome.next_page_token,
        "page_token=plan_parking_Saudi Arabia_Riyadh@#$1"
    );
    assert!(!outcome.layer_id.is_empty());

    // The first search ran against the plan root: full radius, request
    // center.
    let persisted = engine
        .plan_store()
        .get_plan(&outcome.plan_name)
        .expect("plan missing");
    let root = PlanEntry::parse(&persisted[0]).expect("parse failed");
    assert_eq!(root.radius_m, 8000.0);
    assert_eq!(outcome.dataset_id, root.dataset_key());
    assert_eq!(persisted.last().map(String::as_str), Some(PLAN_SENTINEL));
}

/// Test 2: resuming with the minted token advances one entry
#[test]
fn test_resume_advances() {
    let mut engine = DiscoveryEngine::new(
        MemoryPlanStore::new(),
        MemoryDatasetCache::new(),
        StubPlaces::new(20),
    );

    let first = engine
        .fetch(&request("", FetchAction::FullData))
        .expect("fetch failed");
    let second = engine
        .fetch(&request(&first.next_page_token, FetchAction::FullData))
        .expect("fetch failed");

    let token = PageToken::parse(&second.next_page_token).expect("parse failed");
    assert_eq!(token.index, 2);
    assert_eq!(token.plan_name, first.plan_name);
}

/// Test 3: a sparse sub-search rectifies the plan and re-points the token
#[test]
fn test_sparse_search_rectifies() {
    let mut engine = DiscoveryEngine::new(
        MemoryPlanStore::new(),
        MemoryDatasetCache::new(),
        StubPlaces::new(3),
    );

    let start = engine
        .fetch(&request("", FetchAction::FullData))
        .expect("fetch failed");

    // Three features at the root is sparse: the whole tree below position 1
    // is skip-marked and the plan exhausts.
    assert_eq!(start.next_page_token, "");

    let persisted = engine
        .plan_store()
        .get_plan(&start.plan_name)
        .expect("plan missing");
    assert!(persisted[1..persisted.len() - 1].iter().all(|e| is_skipped(e)));
    assert!(!is_skipped(&persisted[0]));
}

/// Test 4: rectifying below the root keeps the siblings reachable
#[test]
fn test_sparse_below_root_keeps_siblings() {
    let mut engine = DiscoveryEngine::new(
        MemoryPlanStore::new(),
        MemoryDatasetCache::new(),
        StubPlaces::new(20),
    );

    let start = engine
        .fetch(&request("", FetchAction::FullData))
        .expect("fetch failed");

    // Sparse result on entry 1 (position 1.1).
    let sparse_places = StubPlaces::new(2);
    let mut sparse_engine = DiscoveryEngine::new(
        clone_store(engine.plan_store(), &start.plan_name),
        MemoryDatasetCache::new(),
        sparse_places,
    );
    let second = sparse_engine
        .fetch(&request(&start.next_page_token, FetchAction::FullData))
        .expect("fetch failed");

    let token = PageToken::parse(&second.next_page_token).expect("parse failed");
    assert_eq!(token.index, 2, "next eligible entry is the sibling at 1.2");

    let persisted = sparse_engine
        .plan_store()
        .get_plan(&start.plan_name)
        .expect("plan missing");
    for raw in persisted.iter().filter(|raw| *raw != PLAN_SENTINEL) {
        let entry = PlanEntry::parse(raw).expect("parse failed");
        assert_eq!(is_skipped(raw), entry.position.as_str().starts_with("1.1."));
    }
}

fn clone_store(store: &MemoryPlanStore, plan_name: &str) -> MemoryPlanStore {
    let mut cloned = MemoryPlanStore::new();
    cloned
        .save_plan(plan_name, &store.get_plan(plan_name).expect("plan missing"))
        .expect("save failed");
    cloned
}

/// Test 5: repeated fetches of the same entry hit the dataset cache
#[test]
fn test_dataset_cache_hit() {
    let mut engine = DiscoveryEngine::new(
        MemoryPlanStore::new(),
        MemoryDatasetCache::new(),
        StubPlaces::new(20),
    );

    engine
        .fetch(&request("", FetchAction::FullData))
        .expect("fetch failed");
    assert_eq!(engine.dataset_cache().len(), 1);

    // Same step again: the collection is replayed from cache.
    let mut replay = request("", FetchAction::FullData);
    replay.page_token = String::new();
    engine.fetch(&replay).expect("fetch failed");
    assert_eq!(engine.places().search_count(), 1);
}

/// Test 6: sample fetches stay off the plan machinery
#[test]
fn test_sample_fetch_is_single_page() {
    let mut engine = DiscoveryEngine::new(
        MemoryPlanStore::new(),
        MemoryDatasetCache::new(),
        StubPlaces::new(3),
    );

    let outcome = engine
        .fetch(&request("", FetchAction::Sample))
        .expect("fetch failed");

    assert_eq!(outcome.plan_name, "");
    assert_eq!(outcome.next_page_token, "");
    assert_eq!(outcome.records_count, 3);
    assert!(engine.plan_store().is_empty());
}

/// Test 7: an externally supplied plan drives the same fetch machinery
#[test]
fn test_fetch_with_supplied_plan() {
    let mut engine = DiscoveryEngine::new(
        MemoryPlanStore::new(),
        MemoryDatasetCache::new(),
        StubPlaces::new(20),
    );

    let entries: Vec<String> = ["1", "1.1"]
        .iter()
        .enumerate()
        .map(|(i, p)| format!("46.7_24.7_5000_mall_circle={}_circleNumber={}", p, i + 1))
        .collect();

    let outcome = engine
        .fetch_with_plan("plan_mall_records", entries, &request("", FetchAction::FullData))
        .expect("fetch failed");

    assert_eq!(outcome.plan_name, "plan_mall_records");
    assert_eq!(outcome.dataset_id, "46.7_24.7_5000_mall");
    assert_eq!(outcome.next_page_token, "page_token=plan_mall_records@#$1");
    assert_eq!(
        engine.plan_store().get_plan("plan_mall_records").unwrap().len(),
        3
    );
}

/// Test 8: degenerate and malformed inputs are rejected
#[test]
fn test_error_paths() {
    let mut engine = DiscoveryEngine::new(
        MemoryPlanStore::new(),
        MemoryDatasetCache::new(),
        StubPlaces::new(20),
    );

    // Radius too small to decompose.
    let mut small = request("", FetchAction::FullData);
    small.radius_m = 500.0;
    assert!(matches!(
        engine.fetch(&small),
        Err(PlaceCoverError::InvalidInput(_))
    ));

    // Malformed token.
    assert!(matches!(
        engine.fetch(&request("page_token=broken", FetchAction::FullData)),
        Err(PlaceCoverError::InvalidToken(_))
    ));

    // Dangling token.
    assert!(matches!(
        engine.fetch(&request("page_token=plan_ghost@#$1", FetchAction::FullData)),
        Err(PlaceCoverError::PlanNotFound(_))
    ));
}
