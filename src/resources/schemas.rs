//! Field metadata for every resource. Only declared paths can be filtered, sorted or selected.

use crate::document::CREATED_AT_FIELD;
use crate::query::{EntitySchema, FieldDef, FieldType};

pub const CLUBS: &str = "clubs";
pub const PLAYERS: &str = "players";
pub const MATCHES: &str = "matches";
pub const ORDERS: &str = "orders";
pub const REPORTS: &str = "reports";
pub const USERS: &str = "users";

pub static CLUB: EntitySchema = EntitySchema {
    name: "club",
    collection: CLUBS,
    fields: &[
        FieldDef::indexed("name", FieldType::String),
        FieldDef::indexed("league", FieldType::String),
        FieldDef::plain("website", FieldType::String),
        FieldDef::plain("phone", FieldType::String),
        FieldDef::plain("email", FieldType::String),
        FieldDef::plain("location", FieldType::GeoPoint),
        FieldDef::plain("location.formattedAddress", FieldType::String),
        FieldDef::indexed("location.city", FieldType::String),
        FieldDef::indexed("location.voivodeship", FieldType::String),
        FieldDef::filterable("location.voivodeshipSlug", FieldType::String),
        FieldDef::indexed(CREATED_AT_FIELD, FieldType::Date),
    ],
    default_sort: "-createdAt",
};

pub static PLAYER: EntitySchema = EntitySchema {
    name: "player",
    collection: PLAYERS,
    fields: &[
        FieldDef::indexed("firstName", FieldType::String),
        FieldDef::indexed("lastName", FieldType::String),
        FieldDef::indexed("position", FieldType::String),
        FieldDef::filterable("footed", FieldType::String),
        FieldDef::indexed("dateOfBirth", FieldType::Date),
        FieldDef::indexed("height", FieldType::Number),
        FieldDef::indexed("weight", FieldType::Number),
        FieldDef::filterable("club", FieldType::Reference(CLUBS)),
        FieldDef::filterable("user", FieldType::Reference(USERS)),
        FieldDef::indexed(CREATED_AT_FIELD, FieldType::Date),
    ],
    default_sort: "-createdAt",
};

pub static MATCH: EntitySchema = EntitySchema {
    name: "match",
    collection: MATCHES,
    fields: &[
        FieldDef::filterable("homeTeam", FieldType::Reference(CLUBS)),
        FieldDef::filterable("awayTeam", FieldType::Reference(CLUBS)),
        FieldDef::indexed("competition", FieldType::String),
        FieldDef::indexed("date", FieldType::Date),
        FieldDef::filterable("result", FieldType::String),
        FieldDef::filterable("user", FieldType::Reference(USERS)),
        FieldDef::indexed(CREATED_AT_FIELD, FieldType::Date),
    ],
    default_sort: "-date",
};

pub static ORDER: EntitySchema = EntitySchema {
    name: "order",
    collection: ORDERS,
    fields: &[
        FieldDef::filterable("player", FieldType::Reference(PLAYERS)),
        FieldDef::filterable("scout", FieldType::Reference(USERS)),
        FieldDef::indexed("status", FieldType::String),
        FieldDef::indexed("acceptDate", FieldType::Date),
        FieldDef::indexed("closeDate", FieldType::Date),
        FieldDef::indexed(CREATED_AT_FIELD, FieldType::Date),
    ],
    default_sort: "-createdAt",
};

pub static REPORT: EntitySchema = EntitySchema {
    name: "report",
    collection: REPORTS,
    fields: &[
        FieldDef::filterable("player", FieldType::Reference(PLAYERS)),
        FieldDef::filterable("order", FieldType::Reference(ORDERS)),
        FieldDef::filterable("scout", FieldType::Reference(USERS)),
        FieldDef::filterable("match", FieldType::Reference(MATCHES)),
        FieldDef::indexed("finalRating", FieldType::Number),
        FieldDef::indexed("minutesPlayed", FieldType::Number),
        FieldDef::indexed("goals", FieldType::Number),
        FieldDef::indexed("assists", FieldType::Number),
        FieldDef::filterable("individualSkills", FieldType::String),
        FieldDef::plain("summary", FieldType::String),
        FieldDef::indexed(CREATED_AT_FIELD, FieldType::Date),
    ],
    default_sort: "-createdAt",
};

#[must_use]
pub fn by_collection(name: &str) -> Option<&'static EntitySchema> {
    [&CLUB, &PLAYER, &MATCH, &ORDER, &REPORT].into_iter().find(|s| s.collection == name)
}
