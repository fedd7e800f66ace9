use crate::errors::ScoutError;
use crate::identity::AuthContext;
use crate::query::{PopulateSpec, RawQuery, ResultEnvelope, populate};
use crate::store::Collection;
use crate::types::DocumentId;
use bson::{Bson, Document as BsonDocument};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use super::schemas::{CLUBS, ORDER, ORDERS, PLAYER, PLAYERS, REPORT, REPORTS};
use super::{ItemResponse, ResourceContext, from_body, required_text};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewPlayer {
    pub first_name: String,
    pub last_name: String,
    pub position: Option<String>,
    pub footed: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    /// Centimeters.
    pub height: Option<u32>,
    /// Kilograms.
    pub weight: Option<u32>,
    pub club: Option<DocumentId>,
}

/// The fields a player update may touch. Anything else in the body is rejected.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlayerUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub position: Option<String>,
    pub footed: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub height: Option<u32>,
    pub weight: Option<u32>,
    pub club: Option<DocumentId>,
}

impl NewPlayer {
    /// # Errors
    /// Returns a validation error for unknown fields, wrong types or a malformed club id.
    pub fn from_json(body: &serde_json::Value) -> Result<Self, ScoutError> {
        from_body(body)
    }
}

impl PlayerUpdate {
    /// # Errors
    /// Returns a validation error for unknown fields, wrong types or a malformed club id.
    pub fn from_json(body: &serde_json::Value) -> Result<Self, ScoutError> {
        from_body(body)
    }

    fn into_set(self) -> Result<Vec<(String, Bson)>, ScoutError> {
        let mut set = Vec::new();
        for (k, v) in [("firstName", self.first_name), ("lastName", self.last_name)] {
            if let Some(v) = v {
                set.push((k.to_string(), Bson::String(required_text(k, &v)?)));
            }
        }
        for (k, v) in [("position", self.position), ("footed", self.footed)] {
            if let Some(v) = v {
                set.push((k.to_string(), Bson::String(v)));
            }
        }
        if let Some(d) = self.date_of_birth {
            set.push(("dateOfBirth".to_string(), Bson::DateTime(day_start(d))));
        }
        for (k, v) in [("height", self.height), ("weight", self.weight)] {
            if let Some(v) = v {
                set.push((k.to_string(), Bson::Int64(i64::from(v))));
            }
        }
        if let Some(club) = self.club {
            set.push(("club".to_string(), Bson::String(club.to_string())));
        }
        Ok(set)
    }
}

fn day_start(d: NaiveDate) -> bson::DateTime {
    bson::DateTime::from_millis(d.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
}

fn not_found(id: &str) -> ScoutError {
    ScoutError::NotFound(format!("Player not found with id of {id}"))
}

fn parse_id(id: &str) -> Result<DocumentId, ScoutError> {
    id.parse().map_err(|_| not_found(id))
}

/// A player may only point at a club that exists.
async fn require_club(ctx: &ResourceContext<'_>, club: &DocumentId) -> Result<(), ScoutError> {
    let clubs = ctx.db.create_collection(CLUBS);
    if clubs.find_by_id(club, None).await?.is_none() {
        return Err(ScoutError::Validation(format!("no club with id {club}")));
    }
    Ok(())
}

/// Stores a new player owned by the caller.
///
/// # Errors
/// `Validation` for empty names or a club that does not exist.
pub async fn create_player(
    ctx: &ResourceContext<'_>,
    auth: &AuthContext,
    input: NewPlayer,
) -> Result<ItemResponse, ScoutError> {
    let mut data = BsonDocument::new();
    data.insert("firstName", required_text("firstName", &input.first_name)?);
    data.insert("lastName", required_text("lastName", &input.last_name)?);
    let rest = PlayerUpdate {
        position: input.position,
        footed: input.footed,
        date_of_birth: input.date_of_birth,
        height: input.height,
        weight: input.weight,
        club: input.club,
        ..PlayerUpdate::default()
    };
    if let Some(club) = &rest.club {
        require_club(ctx, club).await?;
    }
    for (k, v) in rest.into_set()? {
        data.insert(k, v);
    }
    data.insert("user", auth.user_id.to_string());
    let stored = ctx.db.create_collection(PLAYERS).insert(data).await?;
    log::info!("created player {}", stored.get_str("_id").unwrap_or_default());
    Ok(ItemResponse::data(stored).with_message("Successfully created new player!"))
}

/// # Errors
/// `NotFound` for unknown ids; `Validation` for empty names or a club that does not exist.
pub async fn update_player(ctx: &ResourceContext<'_>, id: &str, update: PlayerUpdate) -> Result<ItemResponse, ScoutError> {
    let doc_id = parse_id(id)?;
    if let Some(club) = &update.club {
        require_club(ctx, club).await?;
    }
    let set = update.into_set()?;
    let col = ctx.db.create_collection(PLAYERS);
    let updated = col.update_fields(&doc_id, set).await?.ok_or_else(|| not_found(id))?;
    Ok(ItemResponse::data(updated))
}

/// # Errors
/// `NotFound` for unknown ids.
pub async fn delete_player(ctx: &ResourceContext<'_>, id: &str) -> Result<ItemResponse, ScoutError> {
    let doc_id = parse_id(id)?;
    let col = ctx.db.create_collection(PLAYERS);
    if !col.delete(&doc_id).await? {
        return Err(not_found(id));
    }
    log::info!("deleted player {id}");
    Ok(ItemResponse::message(format!("Player with the id of {id} successfully removed!")))
}

async fn require_player(ctx: &ResourceContext<'_>, id: &str) -> Result<DocumentId, ScoutError> {
    let doc_id = parse_id(id)?;
    let players = ctx.db.create_collection(PLAYERS);
    if players.find_by_id(&doc_id, None).await?.is_none() {
        return Err(not_found(id));
    }
    Ok(doc_id)
}

/// Player listing with each `club` replaced by `{_id, name}`.
///
/// # Errors
/// Validation, store and lookup errors from the pipeline.
pub async fn get_players(ctx: &ResourceContext<'_>, raw: &RawQuery) -> Result<ResultEnvelope, ScoutError> {
    let col = ctx.db.create_collection(PLAYERS);
    let spec = PopulateSpec::new().field("club", &["name"]);
    ctx.resolver(&PLAYER).resolve(&*col, raw, Some(&spec)).await
}

/// # Errors
/// `NotFound` for unknown or malformed ids.
pub async fn get_player(ctx: &ResourceContext<'_>, id: &str) -> Result<ItemResponse, ScoutError> {
    let col = ctx.db.create_collection(PLAYERS);
    let doc_id = parse_id(id)?;
    let doc = col.find_by_id(&doc_id, None).await?.ok_or_else(|| not_found(id))?;
    let spec = PopulateSpec::new().field("club", &[]);
    let mut docs = populate(vec![doc], &spec, &PLAYER, ctx.db).await?;
    docs.pop().map(ItemResponse::data).ok_or_else(|| not_found(id))
}

/// Orders for one player, through the advanced-results path.
///
/// # Errors
/// `NotFound` when the player does not exist; pipeline errors otherwise.
pub async fn get_player_orders(
    ctx: &ResourceContext<'_>,
    player_id: &str,
    raw: &RawQuery,
) -> Result<ResultEnvelope, ScoutError> {
    let doc_id = require_player(ctx, player_id).await?;
    let col = ctx.db.create_collection(ORDERS);
    let scoped = raw.clone().with("player", doc_id.to_string());
    ctx.resolver(&ORDER).resolve(&*col, &scoped, None).await
}

/// Reports for one player, through the advanced-results path.
///
/// # Errors
/// `NotFound` when the player does not exist; pipeline errors otherwise.
pub async fn get_player_reports(
    ctx: &ResourceContext<'_>,
    player_id: &str,
    raw: &RawQuery,
) -> Result<ResultEnvelope, ScoutError> {
    let doc_id = require_player(ctx, player_id).await?;
    let col = ctx.db.create_collection(REPORTS);
    let scoped = raw.clone().with("player", doc_id.to_string());
    ctx.resolver(&REPORT).resolve(&*col, &scoped, None).await
}
