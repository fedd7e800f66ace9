#![allow(dead_code)]

use bson::{Document as BsonDocument, doc};
use scoutlite::query::GeoPoint;
use scoutlite::store::{Collection, Database};

pub fn club_doc(name: &str, league: &str, lat: f64, lng: f64) -> BsonDocument {
    let mut location = GeoPoint::new(lat, lng).unwrap().to_geojson();
    location.insert("city", name);
    doc! { "name": name, "league": league, "location": location }
}

/// Inserts `n` clubs named `club-000`, `club-001`, ... all at the same point.
pub async fn seed_clubs(db: &Database, n: usize) -> Vec<String> {
    let col = db.create_collection("clubs");
    let mut ids = Vec::with_capacity(n);
    for i in 0..n {
        let stored = col.insert(club_doc(&format!("club-{i:03}"), "A", 52.0, 17.0)).await.unwrap();
        ids.push(stored.get_str("_id").unwrap().to_string());
    }
    ids
}

pub async fn insert(db: &Database, collection: &str, data: BsonDocument) -> String {
    let stored = db.create_collection(collection).insert(data).await.unwrap();
    stored.get_str("_id").unwrap().to_string()
}

pub fn names(docs: &[BsonDocument]) -> Vec<String> {
    docs.iter().map(|d| d.get_str("name").unwrap_or_default().to_string()).collect()
}
