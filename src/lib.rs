//! scoutlite: the advanced-results query pipeline of a football scouting backend.
//!
//! Request parameters become a structured filter, sort, projection and page;
//! reference fields are expanded for the response; results come back in a
//! uniform envelope with pagination descriptors.

pub mod cli;
pub mod config;
pub mod document;
pub mod errors;
pub mod identity;
pub mod logger;
pub mod query;
pub mod resources;
pub mod store;
pub mod types;
pub mod utils;

pub use config::ScoutConfig;
pub use errors::ScoutError;
pub use query::{QueryResolver, RawQuery, ResultEnvelope};
pub use store::{Collection, Database, MemoryCollection};
