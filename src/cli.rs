//! Command-line surface over an in-memory dataset.

use crate::config::ScoutConfig;
use crate::errors::ScoutError;
use crate::query::{GeoPoint, PopulateSpec, QueryResolver, RawQuery};
use crate::resources::schemas::{self, CLUB, CLUBS};
use crate::store::Database;
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "scoutlite", version, about = "Query scouting data with the advanced-results pipeline", long_about = None)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a config file (TOML). If omitted, SCOUTLITE_CONFIG or ./scoutlite.toml is used.")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, help = "JSON file mapping collection names to arrays of documents")]
    pub data: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    #[command(about = "Run a query string against a collection; prints the result envelope")]
    Query {
        #[arg(help = "Collection name (clubs, players, matches, orders, reports)")]
        collection: String,
        #[arg(long, help = "Query string, e.g. 'league=Ekstraklasa&sort=name&page=2'")]
        query: Option<String>,
        #[arg(long, help = "Reference fields to expand, e.g. 'club:name,website;user'")]
        populate: Option<String>,
    },
    #[command(about = "Clubs within a radius (km) of a point")]
    Radius {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        #[arg(long = "radius-km")]
        radius_km: f64,
        #[arg(long, help = "Additional query string ANDed with the radius")]
        query: Option<String>,
    },
    #[command(about = "List loaded collections with their document counts")]
    Collections,
}

/// Reads a JSON dataset into `db`, returning how many documents were loaded.
///
/// # Errors
/// I/O and JSON errors, or a malformed dataset.
pub fn load_dataset(db: &Database, path: &Path) -> Result<usize, ScoutError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ScoutError::Io(format!("cannot read {}: {e}", path.display())))?;
    let value: Value = serde_json::from_str(&text)?;
    db.load_json(&value)
}

fn raw_query(qs: Option<&str>) -> Result<RawQuery, ScoutError> {
    qs.map_or_else(|| Ok(RawQuery::new()), RawQuery::from_query_string)
}

/// Runs one subcommand against an already loaded database.
///
/// # Errors
/// Whatever the pipeline returns, plus `Validation` for an unknown collection.
pub async fn execute(command: &Command, db: &Database, cfg: &ScoutConfig) -> Result<Value, ScoutError> {
    match command {
        Command::Query { collection, query, populate } => {
            let schema = schemas::by_collection(collection)
                .ok_or_else(|| ScoutError::Validation(format!("unknown collection '{collection}'")))?;
            let raw = raw_query(query.as_deref())?;
            let spec = populate.as_deref().map(PopulateSpec::parse).transpose()?;
            let col = db.create_collection(collection);
            let envelope = QueryResolver::new(schema, db)
                .with_config(cfg)
                .resolve(&*col, &raw, spec.as_ref())
                .await?;
            Ok(envelope.to_json())
        }
        Command::Radius { lat, lng, radius_km, query } => {
            let center = GeoPoint::new(*lat, *lng)?;
            let raw = raw_query(query.as_deref())?;
            let col = db.create_collection(CLUBS);
            let envelope = QueryResolver::new(&CLUB, db)
                .with_config(cfg)
                .resolve_within_radius(&*col, center, *radius_km, Some(&raw))
                .await?;
            Ok(envelope.to_json())
        }
        Command::Collections => {
            let rows: Vec<Value> = db
                .list_collection_names()
                .into_iter()
                .map(|name| {
                    let count = db.collection(&name).map_or(0, |c| c.len());
                    json!({ "name": name, "count": count })
                })
                .collect();
            Ok(Value::Array(rows))
        }
    }
}

/// Loads `--data` (when given) into a fresh database and executes the subcommand.
///
/// # Errors
/// See `load_dataset` and `execute`.
pub async fn run(cli: &Cli, cfg: &ScoutConfig) -> Result<Value, ScoutError> {
    let db = Database::new();
    if let Some(path) = &cli.data {
        let n = load_dataset(&db, path)?;
        log::info!("loaded {n} documents from {}", path.display());
    }
    execute(&cli.command, &db, cfg).await
}

/// Process exit status for a failed run: 2 for caller mistakes, 1 for everything else.
#[must_use]
pub const fn exit_status(err: &ScoutError) -> u8 {
    if err.is_client_error() { 2 } else { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_radius_with_negative_longitude() {
        let cli = Cli::try_parse_from([
            "scoutlite", "radius", "--lat", "40.4", "--lng", "-3.7", "--radius-km", "15",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Command::Radius { lat: 40.4, lng: -3.7, radius_km: 15.0, query: None }
        );
    }

    #[test]
    fn exit_status_separates_client_errors() {
        assert_eq!(exit_status(&ScoutError::validation("x")), 2);
        assert_eq!(exit_status(&ScoutError::Store("x".into())), 1);
    }
}
