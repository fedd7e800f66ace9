//! Spherical radius filtering.
//!
//! Locations are stored as GeoJSON points (`{ type: "Point", coordinates: [lng, lat] }`).
//! A radius in kilometers becomes an angular radius by dividing by the Earth radius,
//! and a point is inside the cap when its central angle to the center does not exceed it.

use crate::errors::ScoutError;
use bson::{Bson, Document as BsonDocument, doc};
use serde::{Deserialize, Serialize};

use super::types::Filter;

/// Earth radius used for the kilometers to radians conversion.
pub const EARTH_RADIUS_KM: f64 = 6378.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint", into = "RawGeoPoint")]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawGeoPoint {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = ScoutError;
    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl From<GeoPoint> for RawGeoPoint {
    fn from(p: GeoPoint) -> Self {
        Self { latitude: p.lat, longitude: p.lng }
    }
}

impl GeoPoint {
    /// # Errors
    /// Returns a validation error when a coordinate is not finite or out of bounds.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ScoutError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ScoutError::Validation(format!("latitude {latitude} outside [-90, 90]")));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ScoutError::Validation(format!("longitude {longitude} outside [-180, 180]")));
        }
        Ok(Self { lat: latitude, lng: longitude })
    }

    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.lat
    }

    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.lng
    }

    /// Reads a GeoJSON point. Anything malformed or out of bounds yields `None`.
    #[must_use]
    pub fn from_geojson(val: &Bson) -> Option<Self> {
        let Bson::Document(d) = val else { return None };
        if d.get_str("type").ok()? != "Point" {
            return None;
        }
        let coords = d.get_array("coordinates").ok()?;
        if coords.len() != 2 {
            return None;
        }
        let lng = as_f64(&coords[0])?;
        let lat = as_f64(&coords[1])?;
        Self::new(lat, lng).ok()
    }

    #[must_use]
    pub fn to_geojson(&self) -> BsonDocument {
        let (lng, lat) = (self.lng, self.lat);
        doc! { "type": "Point", "coordinates": [lng, lat] }
    }

    /// Great-circle angle to `other` in radians (haversine).
    #[must_use]
    pub fn central_angle(&self, other: &Self) -> f64 {
        let (phi1, phi2) = (self.lat.to_radians(), other.lat.to_radians());
        let d_phi = phi2 - phi1;
        let d_lambda = (other.lng - self.lng).to_radians();
        let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
        let a = a.clamp(0.0, 1.0);
        2.0 * a.sqrt().atan2((1.0 - a).sqrt())
    }

    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        self.central_angle(other) * EARTH_RADIUS_KM
    }
}

fn as_f64(v: &Bson) -> Option<f64> {
    match v {
        Bson::Double(f) => Some(*f),
        Bson::Int32(i) => Some(f64::from(*i)),
        #[allow(clippy::cast_precision_loss)]
        Bson::Int64(i) => Some(*i as f64),
        _ => None,
    }
}

/// A center plus a radius in kilometers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusQuery {
    pub center: GeoPoint,
    pub radius_km: f64,
}

impl RadiusQuery {
    /// # Errors
    /// Returns a validation error when the radius is not a positive finite number.
    pub fn new(center: GeoPoint, radius_km: f64) -> Result<Self, ScoutError> {
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(ScoutError::Validation(format!("radius {radius_km} km must be positive")));
        }
        Ok(Self { center, radius_km })
    }

    #[must_use]
    pub fn angular_radius(&self) -> f64 {
        self.radius_km / EARTH_RADIUS_KM
    }

    /// Predicate selecting documents whose GeoJSON point at `path` lies inside the cap.
    #[must_use]
    pub fn to_filter(&self, path: &str) -> Filter {
        Filter::GeoWithin { path: path.to_string(), center: self.center, radius_rad: self.angular_radius() }
    }

    #[must_use]
    pub fn contains(&self, point: &GeoPoint) -> bool {
        within(&self.center, self.angular_radius(), point)
    }
}

pub(crate) fn within(center: &GeoPoint, radius_rad: f64, point: &GeoPoint) -> bool {
    center.central_angle(point) <= radius_rad
}
