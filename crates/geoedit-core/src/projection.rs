//! Coordinate adapter between the display and storage projections.
//!
//! The map surface renders and does pointer math in its display projection
//! (spherical Web Mercator by default); geometries are persisted and exchanged
//! with the geometry service in WGS84 longitude/latitude. Every boundary
//! crossing goes through [`to_storage`] / [`to_display`].
//!
//! Formulas (R = 6 378 137 m):
//! ```text
//! x = R * lon_rad
//! y = R * ln(tan(pi/4 + lat_rad/2))
//! lon = x / R
//! lat = 2 * atan(exp(y / R)) - pi/2
//! ```
//!
//! Web Mercator only covers latitudes up to [`MAX_MERCATOR_LATITUDE`]. Points
//! beyond it (or northings outside the square) fail with
//! [`ConversionError::OutOfRange`] instead of being clamped, so a converted
//! geometry always converts back to the original.

use geo::Coord;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_4;
use std::fmt;

use crate::error::ConversionError;
use crate::geometry::{check_finite, Geometry};

/// Earth radius used by spherical Web Mercator, in metres.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude limit of the Web Mercator square, in degrees.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

/// Half the side of the Web Mercator square (R * pi), in metres.
pub const MAX_MERCATOR_EXTENT: f64 = EARTH_RADIUS_M * std::f64::consts::PI;

// Rounding slack at the square's edge.
const LATITUDE_EPSILON: f64 = 1e-9;
const EXTENT_EPSILON_M: f64 = 1e-6;

/// Display projections supported by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    /// EPSG:3857
    #[default]
    WebMercator,
    /// EPSG:4326, identity with the storage projection
    Wgs84,
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WebMercator => write!(f, "EPSG:3857"),
            Self::Wgs84 => write!(f, "EPSG:4326"),
        }
    }
}

impl Projection {
    /// Converts one display coordinate to longitude/latitude.
    pub fn coord_to_storage(&self, c: Coord<f64>) -> Result<Coord<f64>, ConversionError> {
        check_finite(c)?;
        let out = match self {
            Projection::Wgs84 => c,
            Projection::WebMercator => {
                if c.y.abs() > MAX_MERCATOR_EXTENT + EXTENT_EPSILON_M {
                    return Err(self.out_of_range(c));
                }
                let lon = (c.x / EARTH_RADIUS_M).to_degrees();
                let lat = (2.0 * (c.y / EARTH_RADIUS_M).exp().atan() - 2.0 * FRAC_PI_4)
                    .to_degrees();
                Coord { x: lon, y: lat }
            }
        };
        check_finite(out)?;
        Ok(out)
    }

    /// Converts one longitude/latitude coordinate to the display projection.
    pub fn coord_to_display(&self, c: Coord<f64>) -> Result<Coord<f64>, ConversionError> {
        check_finite(c)?;
        let out = match self {
            Projection::Wgs84 => c,
            Projection::WebMercator => {
                if c.y.abs() > MAX_MERCATOR_LATITUDE + LATITUDE_EPSILON {
                    return Err(self.out_of_range(c));
                }
                let x = EARTH_RADIUS_M * c.x.to_radians();
                let y = EARTH_RADIUS_M * (FRAC_PI_4 + c.y.to_radians() / 2.0).tan().ln();
                Coord { x, y }
            }
        };
        check_finite(out)?;
        Ok(out)
    }

    fn out_of_range(&self, c: Coord<f64>) -> ConversionError {
        ConversionError::OutOfRange {
            projection: self.to_string(),
            x: c.x,
            y: c.y,
        }
    }

    /// Converts a display-projection geometry to the storage projection.
    pub fn to_storage(&self, geometry: &Geometry) -> Result<Geometry, ConversionError> {
        let converted = geometry.try_map_coords(|c| self.coord_to_storage(c))?;
        converted.validate()?;
        Ok(converted)
    }

    /// Converts a storage-projection geometry to the display projection.
    pub fn to_display(&self, geometry: &Geometry) -> Result<Geometry, ConversionError> {
        let converted = geometry.try_map_coords(|c| self.coord_to_display(c))?;
        converted.validate()?;
        Ok(converted)
    }
}

/// Converts `geometry`, expressed in `display`, to WGS84 longitude/latitude.
pub fn to_storage(geometry: &Geometry, display: Projection) -> Result<Geometry, ConversionError> {
    display.to_storage(geometry)
}

/// Converts a WGS84 `geometry` to the `display` projection.
pub fn to_display(geometry: &Geometry, display: Projection) -> Result<Geometry, ConversionError> {
    display.to_display(geometry)
}
