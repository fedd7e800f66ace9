use crate::errors::ScoutError;
use crate::identity::AuthContext;
use crate::query::{CmpOp, Filter, FindOptions, GeoPoint, Order, RawQuery, ResultEnvelope, SortKey};
use crate::store::{Collection, Database, UniqueWrite};
use crate::types::DocumentId;
use bson::{Bson, Document as BsonDocument};
use serde::Deserialize;

use super::schemas::{CLUB, CLUBS, PLAYERS};
use super::{ItemResponse, ResourceContext, from_body, required_text, slugify};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClubLocation {
    pub coordinates: GeoPoint,
    pub formatted_address: Option<String>,
    pub city: Option<String>,
    pub voivodeship: Option<String>,
}

impl ClubLocation {
    /// GeoJSON point plus address parts; `voivodeshipSlug` is derived.
    #[must_use]
    pub fn to_bson(&self) -> BsonDocument {
        let mut d = self.coordinates.to_geojson();
        if let Some(a) = &self.formatted_address {
            d.insert("formattedAddress", a.clone());
        }
        if let Some(c) = &self.city {
            d.insert("city", c.clone());
        }
        if let Some(v) = &self.voivodeship {
            d.insert("voivodeship", v.clone());
            d.insert("voivodeshipSlug", slugify(v));
        }
        d
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewClub {
    pub name: String,
    pub league: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Option<ClubLocation>,
}

/// The fields a club update may touch. Anything else in the body is rejected.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClubUpdate {
    pub name: Option<String>,
    pub league: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Option<ClubLocation>,
}

impl NewClub {
    /// # Errors
    /// Returns a validation error for unknown fields or wrong types.
    pub fn from_json(body: &serde_json::Value) -> Result<Self, ScoutError> {
        from_body(body)
    }

    fn into_bson(self) -> Result<BsonDocument, ScoutError> {
        let mut d = BsonDocument::new();
        d.insert("name", required_text("name", &self.name)?);
        for (k, v) in [("league", self.league), ("website", self.website), ("phone", self.phone), ("email", self.email)] {
            if let Some(v) = v {
                d.insert(k, v);
            }
        }
        if let Some(loc) = self.location {
            d.insert("location", loc.to_bson());
        }
        Ok(d)
    }
}

impl ClubUpdate {
    /// # Errors
    /// Returns a validation error for unknown fields or wrong types.
    pub fn from_json(body: &serde_json::Value) -> Result<Self, ScoutError> {
        from_body(body)
    }

    fn into_set(self) -> Result<Vec<(String, Bson)>, ScoutError> {
        let mut set = Vec::new();
        if let Some(name) = self.name {
            set.push(("name".to_string(), Bson::String(required_text("name", &name)?)));
        }
        for (k, v) in [("league", self.league), ("website", self.website), ("phone", self.phone), ("email", self.email)] {
            if let Some(v) = v {
                set.push((k.to_string(), Bson::String(v)));
            }
        }
        if let Some(loc) = self.location {
            set.push(("location".to_string(), Bson::Document(loc.to_bson())));
        }
        Ok(set)
    }
}

fn not_found(id: &str) -> ScoutError {
    ScoutError::NotFound(format!("Club not found with id of {id}"))
}

/// Malformed ids cannot name an existing club, so they read as not found.
fn parse_id(id: &str) -> Result<DocumentId, ScoutError> {
    id.parse().map_err(|_| not_found(id))
}

fn duplicate() -> ScoutError {
    ScoutError::Duplicate("Club already exists".into())
}

/// # Errors
/// `Duplicate` when a club with that name exists; `Validation` for an empty name.
pub async fn create_club(ctx: &ResourceContext<'_>, input: NewClub) -> Result<ItemResponse, ScoutError> {
    let col = ctx.db.create_collection(CLUBS);
    let stored = match col.insert_unique(input.into_bson()?, "name") {
        UniqueWrite::Written(doc) => doc,
        UniqueWrite::Conflict | UniqueWrite::Missing => return Err(duplicate()),
    };
    log::info!("created club {}", stored.get_str("name").unwrap_or_default());
    Ok(ItemResponse::data(stored).with_message("Successfully created new club!"))
}

/// Filtered, sorted, paginated club listing.
///
/// # Errors
/// Validation and store errors from the pipeline.
pub async fn get_clubs(ctx: &ResourceContext<'_>, raw: &RawQuery) -> Result<ResultEnvelope, ScoutError> {
    let col = ctx.db.create_collection(CLUBS);
    ctx.resolver(&CLUB).resolve(&*col, raw, None).await
}

/// Every club name, sorted by name.
///
/// # Errors
/// Store errors.
pub async fn get_clubs_list(ctx: &ResourceContext<'_>) -> Result<ResultEnvelope, ScoutError> {
    let col = ctx.db.create_collection(CLUBS);
    let opts = FindOptions {
        projection: Some(vec!["name".to_string()]),
        sort: vec![SortKey { field: "name".into(), order: Order::Asc }],
        ..FindOptions::default()
    };
    Ok(ResultEnvelope::unpaged(col.find(&Filter::True, &opts).await?))
}

/// # Errors
/// `NotFound` for unknown or malformed ids.
pub async fn get_club(ctx: &ResourceContext<'_>, id: &str) -> Result<ItemResponse, ScoutError> {
    let col = ctx.db.create_collection(CLUBS);
    let doc = col.find_by_id(&parse_id(id)?, None).await?.ok_or_else(|| not_found(id))?;
    Ok(ItemResponse::data(doc))
}

/// Clubs whose `location.voivodeshipSlug` equals `voivodeship`.
///
/// # Errors
/// Store errors.
pub async fn get_clubs_in_voivodeship(
    ctx: &ResourceContext<'_>,
    voivodeship: &str,
) -> Result<ResultEnvelope, ScoutError> {
    let col = ctx.db.create_collection(CLUBS);
    let filter = Filter::Cmp {
        path: "location.voivodeshipSlug".into(),
        op: CmpOp::Eq,
        value: Bson::String(voivodeship.to_string()),
    };
    Ok(ResultEnvelope::unpaged(col.find(&filter, &FindOptions::default()).await?))
}

/// Clubs within the caller's active radius of their stored location.
///
/// # Errors
/// Validation and store errors from the pipeline.
pub async fn get_clubs_in_radius(
    ctx: &ResourceContext<'_>,
    auth: &AuthContext,
    raw: Option<&RawQuery>,
) -> Result<ResultEnvelope, ScoutError> {
    let col = ctx.db.create_collection(CLUBS);
    ctx.resolver(&CLUB).resolve_within_radius(&*col, auth.coords, auth.active_radius_km, raw).await
}

/// # Errors
/// `NotFound` for unknown ids, `Duplicate` when renaming onto another club's name.
pub async fn update_club(ctx: &ResourceContext<'_>, id: &str, update: ClubUpdate) -> Result<ItemResponse, ScoutError> {
    let col = ctx.db.create_collection(CLUBS);
    let doc_id = parse_id(id)?;
    let set = update.into_set()?;
    match col.update_unique(&doc_id, &set, "name") {
        UniqueWrite::Written(updated) => Ok(ItemResponse::data(updated)),
        UniqueWrite::Conflict => Err(duplicate()),
        UniqueWrite::Missing => Err(not_found(id)),
    }
}

/// Clears the `club` reference of every player of the club. Returns how many were detached.
///
/// # Errors
/// Store errors.
pub async fn detach_players(db: &Database, club_id: &DocumentId) -> Result<usize, ScoutError> {
    let players = db.create_collection(PLAYERS);
    let filter = Filter::Cmp { path: "club".into(), op: CmpOp::Eq, value: Bson::String(club_id.to_string()) };
    players.update_many(&filter, vec![("club".to_string(), Bson::Null)]).await
}

/// Deletes the club after detaching its players.
///
/// # Errors
/// `NotFound` for unknown ids.
pub async fn delete_club(ctx: &ResourceContext<'_>, id: &str) -> Result<ItemResponse, ScoutError> {
    let col = ctx.db.create_collection(CLUBS);
    let doc_id = parse_id(id)?;
    if col.find_by_id(&doc_id, None).await?.is_none() {
        return Err(not_found(id));
    }
    let detached = detach_players(ctx.db, &doc_id).await?;
    col.delete(&doc_id).await?;
    log::info!("deleted club {id}, detached {detached} players");
    Ok(ItemResponse::message(format!("Club with the id of {id} successfully removed!")))
}
