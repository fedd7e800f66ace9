//! Small shared helpers.
pub mod json;
