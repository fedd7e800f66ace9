mod common;

use bson::{Bson, Document as BsonDocument, doc};
use common::{club_doc, insert, names, seed_clubs};
use scoutlite::config::ScoutConfig;
use scoutlite::query::{Filter, FindOptions, GeoPoint, PageRef, PopulateSpec, QueryResolver, RawQuery, ReferenceLookup};
use scoutlite::resources::schemas::{CLUB, PLAYER};
use scoutlite::store::{Collection, Database};
use scoutlite::types::DocumentId;
use scoutlite::ScoutError;
use std::sync::atomic::{AtomicUsize, Ordering};

fn qs(s: &str) -> RawQuery {
    RawQuery::from_query_string(s).unwrap()
}

#[tokio::test]
async fn last_partial_page() {
    let db = Database::new();
    seed_clubs(&db, 53).await;
    let col = db.collection("clubs").unwrap();
    let env = QueryResolver::new(&CLUB, &db).resolve(&*col, &qs("page=3&limit=25&sort=name"), None).await.unwrap();
    assert_eq!(env.count, 3);
    assert_eq!(env.total, 53);
    assert_eq!(names(&env.data), ["club-050", "club-051", "club-052"]);
    assert_eq!(env.pagination.previous, Some(PageRef { page: 2, limit: 25 }));
    assert_eq!(env.pagination.next, None);
}

#[tokio::test]
async fn first_page_links_forward_only() {
    let db = Database::new();
    seed_clubs(&db, 53).await;
    let col = db.collection("clubs").unwrap();
    let env = QueryResolver::new(&CLUB, &db).resolve(&*col, &qs("sort=-name"), None).await.unwrap();
    assert_eq!(env.count, 25);
    assert_eq!(env.data[0].get_str("name").unwrap(), "club-052");
    assert_eq!(env.pagination.next, Some(PageRef { page: 2, limit: 25 }));
    assert_eq!(env.pagination.previous, None);
}

#[tokio::test]
async fn no_match_yields_empty_envelope() {
    let db = Database::new();
    seed_clubs(&db, 5).await;
    let col = db.collection("clubs").unwrap();
    let env = QueryResolver::new(&CLUB, &db).resolve(&*col, &qs("name=FC+Rex"), None).await.unwrap();
    assert_eq!((env.count, env.total), (0, 0));
    assert!(env.data.is_empty());
    assert_eq!(
        env.to_json(),
        serde_json::json!({"success": true, "count": 0, "total": 0, "pagination": {}, "data": []})
    );
}

#[tokio::test]
async fn page_beyond_the_end_is_empty_but_links_back() {
    let db = Database::new();
    seed_clubs(&db, 4).await;
    let col = db.collection("clubs").unwrap();
    let env = QueryResolver::new(&CLUB, &db).resolve(&*col, &qs("page=9&limit=2"), None).await.unwrap();
    assert_eq!((env.count, env.total), (0, 4));
    assert_eq!(env.pagination.previous, Some(PageRef { page: 8, limit: 2 }));
    assert_eq!(env.pagination.next, None);
}

#[tokio::test]
async fn select_projects_and_keeps_id() {
    let db = Database::new();
    insert(&db, "clubs", club_doc("Lech", "Ekstraklasa", 52.4, 16.9)).await;
    let col = db.collection("clubs").unwrap();
    let env = QueryResolver::new(&CLUB, &db).resolve(&*col, &qs("select=name,location.city"), None).await.unwrap();
    let d = &env.data[0];
    assert!(d.contains_key("_id"));
    assert_eq!(d.get_str("name").unwrap(), "Lech");
    assert_eq!(d.get_document("location").unwrap().get_str("city").unwrap(), "Lech");
    assert!(!d.contains_key("league"));
    assert!(!d.get_document("location").unwrap().contains_key("coordinates"));
}

#[tokio::test]
async fn filter_and_sort_together() {
    let db = Database::new();
    for (name, league) in [("Warta", "I"), ("Lech", "E"), ("Legia", "E"), ("Odra", "II")] {
        insert(&db, "clubs", club_doc(name, league, 52.0, 17.0)).await;
    }
    let col = db.collection("clubs").unwrap();
    let env = QueryResolver::new(&CLUB, &db)
        .resolve(&*col, &qs("league[in]=E,I&sort=-name"), None)
        .await
        .unwrap();
    assert_eq!(names(&env.data), ["Warta", "Legia", "Lech"]);
    assert_eq!(env.total, 3);
}

#[tokio::test]
async fn configured_default_limit_applies() {
    let db = Database::new();
    seed_clubs(&db, 12).await;
    let col = db.collection("clubs").unwrap();
    let mut cfg = ScoutConfig::default();
    cfg.pagination.default_limit = 5;
    cfg.pagination.max_limit = 8;
    let resolver = QueryResolver::new(&CLUB, &db).with_config(&cfg);
    assert_eq!(resolver.resolve(&*col, &RawQuery::new(), None).await.unwrap().count, 5);
    assert_eq!(resolver.resolve(&*col, &qs("limit=50"), None).await.unwrap().count, 8);
}

#[tokio::test]
async fn radius_combines_with_filters() {
    let db = Database::new();
    insert(&db, "clubs", club_doc("Near", "E", 52.09, 17.0)).await;
    insert(&db, "clubs", club_doc("NearLowerLeague", "II", 52.05, 17.0)).await;
    insert(&db, "clubs", club_doc("Far", "E", 53.8, 17.0)).await;
    db.create_collection("clubs").insert(doc! {"name": "Nowhere", "league": "E"}).await.unwrap();
    let col = db.collection("clubs").unwrap();
    let center = GeoPoint::new(52.0, 17.0).unwrap();
    let resolver = QueryResolver::new(&CLUB, &db);

    let env = resolver.resolve_within_radius(&*col, center, 50.0, Some(&qs("league=E"))).await.unwrap();
    assert_eq!(names(&env.data), ["Near"]);

    let env = resolver.resolve_within_radius(&*col, center, 250.0, Some(&qs("sort=name"))).await.unwrap();
    assert_eq!(names(&env.data), ["Far", "Near", "NearLowerLeague"]);

    let err = resolver.resolve_within_radius(&*col, center, 0.0, None).await.unwrap_err();
    assert!(matches!(err, ScoutError::Validation(_)));
}

#[tokio::test]
async fn radius_needs_a_location_field() {
    let db = Database::new();
    let col = db.create_collection("players");
    let center = GeoPoint::new(52.0, 17.0).unwrap();
    let err = QueryResolver::new(&PLAYER, &db).resolve_within_radius(&*col, center, 10.0, None).await.unwrap_err();
    assert!(matches!(err, ScoutError::Validation(_)));
}

#[tokio::test]
async fn populate_expands_references_on_copies_only() {
    let db = Database::new();
    let lech = insert(&db, "clubs", club_doc("Lech", "E", 52.4, 16.9)).await;
    let dangling = DocumentId::new().to_string();
    insert(&db, "players", doc! {"firstName": "Jan", "club": lech.clone()}).await;
    insert(&db, "players", doc! {"firstName": "Adam", "club": dangling}).await;
    insert(&db, "players", doc! {"firstName": "Free"}).await;
    let col = db.collection("players").unwrap();

    let spec = PopulateSpec::new().field("club", &["name"]);
    let env = QueryResolver::new(&PLAYER, &db)
        .resolve(&*col, &qs("sort=firstName"), Some(&spec))
        .await
        .unwrap();
    let by_name = |n: &str| env.data.iter().find(|d| d.get_str("firstName").unwrap() == n).unwrap().clone();

    let club = by_name("Jan").get_document("club").unwrap().clone();
    assert_eq!(club.get_str("_id").unwrap(), lech);
    assert_eq!(club.get_str("name").unwrap(), "Lech");
    assert!(!club.contains_key("league"));
    assert_eq!(by_name("Adam").get("club"), Some(&Bson::Null));
    assert!(!by_name("Free").contains_key("club"));

    // Stored documents still hold the raw id.
    let stored = col.find(&Filter::True, &FindOptions::default()).await.unwrap();
    let jan = stored.iter().find(|d| d.get_str("firstName").unwrap() == "Jan").unwrap();
    assert_eq!(jan.get_str("club").unwrap(), lech);
}

/// Counts lookups that reach the database.
struct CountingLookup<'a> {
    db: &'a Database,
    calls: AtomicUsize,
}

impl ReferenceLookup for CountingLookup<'_> {
    async fn lookup(&self, collection: &str, id: &str, select: &[String]) -> Result<Option<BsonDocument>, ScoutError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.db.lookup(collection, id, select).await
    }
}

#[tokio::test]
async fn shared_references_are_fetched_once() {
    let db = Database::new();
    let lech = insert(&db, "clubs", club_doc("Lech", "E", 52.4, 16.9)).await;
    insert(&db, "players", doc! {"firstName": "Jan", "club": lech.clone()}).await;
    insert(&db, "players", doc! {"firstName": "Adam", "club": lech.clone()}).await;
    let col = db.collection("players").unwrap();

    let counting = CountingLookup { db: &db, calls: AtomicUsize::new(0) };
    let spec = PopulateSpec::new().field("club", &["name"]);
    let env = QueryResolver::new(&PLAYER, &counting).resolve(&*col, &RawQuery::new(), Some(&spec)).await.unwrap();
    assert_eq!(env.count, 2);
    assert!(env.data.iter().all(|d| d.get_document("club").unwrap().get_str("name").unwrap() == "Lech"));
    assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
}

struct FailingLookup;

impl ReferenceLookup for FailingLookup {
    async fn lookup(&self, collection: &str, _: &str, _: &[String]) -> Result<Option<BsonDocument>, ScoutError> {
        Err(ScoutError::NotFound(format!("no such collection: {collection}")))
    }
}

#[tokio::test]
async fn lookup_failures_propagate_unchanged() {
    let db = Database::new();
    insert(&db, "players", doc! {"firstName": "Jan", "club": DocumentId::new().to_string()}).await;
    let col = db.collection("players").unwrap();

    let spec = PopulateSpec::new().field("club", &["name"]);
    let err = QueryResolver::new(&PLAYER, &FailingLookup).resolve(&*col, &RawQuery::new(), Some(&spec)).await.unwrap_err();
    assert!(matches!(err, ScoutError::NotFound(ref m) if m == "no such collection: clubs"));
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn populate_of_a_plain_field_is_rejected() {
    let db = Database::new();
    let col = db.create_collection("players");
    let spec = PopulateSpec::new().field("firstName", &[]);
    let err = QueryResolver::new(&PLAYER, &db).resolve(&*col, &RawQuery::new(), Some(&spec)).await.unwrap_err();
    assert!(matches!(err, ScoutError::Validation(_)));
}

/// A collection whose every read fails.
struct BrokenStore;

impl Collection for BrokenStore {
    fn name(&self) -> &str {
        "broken"
    }

    async fn find(&self, _: &Filter, _: &FindOptions) -> Result<Vec<BsonDocument>, ScoutError> {
        Err(ScoutError::Store("disk on fire".into()))
    }

    async fn count(&self, _: &Filter) -> Result<usize, ScoutError> {
        Err(ScoutError::Store("disk on fire".into()))
    }

    async fn find_by_id(&self, _: &DocumentId, _: Option<&[String]>) -> Result<Option<BsonDocument>, ScoutError> {
        Err(ScoutError::Store("disk on fire".into()))
    }

    async fn insert(&self, _: BsonDocument) -> Result<BsonDocument, ScoutError> {
        Err(ScoutError::Store("read only".into()))
    }

    async fn update_fields(&self, _: &DocumentId, _: Vec<(String, Bson)>) -> Result<Option<BsonDocument>, ScoutError> {
        Err(ScoutError::Store("read only".into()))
    }

    async fn update_many(&self, _: &Filter, _: Vec<(String, Bson)>) -> Result<usize, ScoutError> {
        Err(ScoutError::Store("read only".into()))
    }

    async fn delete(&self, _: &DocumentId) -> Result<bool, ScoutError> {
        Err(ScoutError::Store("read only".into()))
    }
}

#[tokio::test]
async fn store_failures_propagate_unchanged() {
    let db = Database::new();
    let resolver = QueryResolver::new(&CLUB, &db);
    let err = resolver.resolve(&BrokenStore, &RawQuery::new(), None).await.unwrap_err();
    assert!(matches!(err, ScoutError::Store(ref m) if m == "disk on fire"));
    assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn validation_precedes_store_access() {
    let db = Database::new();
    let err = QueryResolver::new(&CLUB, &db).resolve(&BrokenStore, &qs("page=0"), None).await.unwrap_err();
    assert!(matches!(err, ScoutError::Validation(_)));
}
