use crate::errors::ScoutError;
use crate::query::GeoPoint;
use crate::types::DocumentId;
use serde::{Deserialize, Serialize};

/// The authenticated caller, as resolved by the auth layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContext {
    pub user_id: DocumentId,
    pub coords: GeoPoint,
    pub active_radius_km: f64,
}

impl AuthContext {
    /// # Errors
    /// Returns a validation error when the active radius is not a positive finite number.
    pub fn new(user_id: DocumentId, coords: GeoPoint, active_radius_km: f64) -> Result<Self, ScoutError> {
        if !active_radius_km.is_finite() || active_radius_km <= 0.0 {
            return Err(ScoutError::Validation(format!("active radius {active_radius_km} km must be positive")));
        }
        Ok(Self { user_id, coords, active_radius_km })
    }
}
