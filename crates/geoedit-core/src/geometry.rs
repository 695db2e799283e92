//! Editable geometry model.
//!
//! [`Geometry`] is the tagged union the editing engine works with. It wraps the
//! `geo` primitives so the heavy lifting (intersection, containment, geodesic
//! measures) comes from the `geo` crate, and it (de)serialises as a GeoJSON
//! geometry object (`{"type": ..., "coordinates": ...}`), which is the shape the
//! remote geometry service speaks.
//!
//! Multi-part geometries are display-only and rejected on deserialisation.

use geo::{BoundingRect, Coord, InteriorPoint, Intersects, LineString, Point, Polygon, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConversionError;

/// Axis-aligned extent used for drag-box selection.
pub type Extent = Rect<f64>;

/// Builds an extent from two opposite drag corners in any order.
pub fn extent_from_corners(a: Coord<f64>, b: Coord<f64>) -> Extent {
    Rect::new(a, b)
}

/// Geometry variant tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Point => write!(f, "Point"),
            Self::LineString => write!(f, "LineString"),
            Self::Polygon => write!(f, "Polygon"),
        }
    }
}

/// An editable geometry.
///
/// Invariants (checked by [`Geometry::validate`] and on deserialisation):
/// - every coordinate is finite
/// - a line string has at least 2 coordinates
/// - a polygon's outer ring is closed and has at least 4 coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GeoJsonGeometry", into = "GeoJsonGeometry")]
pub enum Geometry {
    Point(Point<f64>),
    LineString(LineString<f64>),
    Polygon(Polygon<f64>),
}

impl Geometry {
    /// Creates a point geometry.
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point(Point::new(x, y))
    }

    /// Creates a line string from `(x, y)` pairs.
    pub fn line_string(coords: &[(f64, f64)]) -> Self {
        Geometry::LineString(LineString::from(coords.to_vec()))
    }

    /// Creates a polygon from an outer ring of `(x, y)` pairs.
    ///
    /// The ring is closed automatically if the last coordinate differs from the first.
    pub fn polygon(ring: &[(f64, f64)]) -> Self {
        Geometry::Polygon(Polygon::new(LineString::from(ring.to_vec()), vec![]))
    }

    /// Returns the variant tag.
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::Polygon(_) => GeometryKind::Polygon,
        }
    }

    pub fn as_polygon(&self) -> Option<&Polygon<f64>> {
        match self {
            Geometry::Polygon(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_line_string(&self) -> Option<&LineString<f64>> {
        match self {
            Geometry::LineString(l) => Some(l),
            _ => None,
        }
    }

    /// Total number of coordinates across all rings.
    pub fn coord_count(&self) -> usize {
        match self {
            Geometry::Point(_) => 1,
            Geometry::LineString(l) => l.0.len(),
            Geometry::Polygon(p) => {
                p.exterior().0.len() + p.interiors().iter().map(|r| r.0.len()).sum::<usize>()
            }
        }
    }

    /// Checks the structural invariants of the variant.
    pub fn validate(&self) -> Result<(), ConversionError> {
        self.try_map_coords(|c| check_finite(c).map(|_| c))?;
        match self {
            Geometry::Point(_) => Ok(()),
            Geometry::LineString(l) => {
                if l.0.len() < 2 {
                    return Err(degenerate(
                        GeometryKind::LineString,
                        format!("needs at least 2 coordinates, has {}", l.0.len()),
                    ));
                }
                Ok(())
            }
            Geometry::Polygon(p) => {
                for ring in std::iter::once(p.exterior()).chain(p.interiors().iter()) {
                    if ring.0.len() < 4 {
                        return Err(degenerate(
                            GeometryKind::Polygon,
                            format!("ring needs at least 4 coordinates, has {}", ring.0.len()),
                        ));
                    }
                    if !ring.is_closed() {
                        return Err(degenerate(GeometryKind::Polygon, "ring is not closed"));
                    }
                }
                Ok(())
            }
        }
    }

    /// Applies a fallible coordinate transform to every coordinate.
    pub fn try_map_coords<F>(&self, mut f: F) -> Result<Geometry, ConversionError>
    where
        F: FnMut(Coord<f64>) -> Result<Coord<f64>, ConversionError>,
    {
        let mut map_ring = |ring: &LineString<f64>| -> Result<LineString<f64>, ConversionError> {
            ring.0
                .iter()
                .map(|c| f(*c))
                .collect::<Result<Vec<_>, _>>()
                .map(LineString::new)
        };

        Ok(match self {
            Geometry::Point(p) => Geometry::Point(Point(f(p.0)?)),
            Geometry::LineString(l) => Geometry::LineString(map_ring(l)?),
            Geometry::Polygon(p) => {
                let exterior = map_ring(p.exterior())?;
                let interiors = p
                    .interiors()
                    .iter()
                    .map(&mut map_ring)
                    .collect::<Result<Vec<_>, _>>()?;
                Geometry::Polygon(Polygon::new(exterior, interiors))
            }
        })
    }

    /// Converts to the `geo` umbrella type for algorithm calls.
    pub fn to_geo(&self) -> geo::Geometry<f64> {
        match self {
            Geometry::Point(p) => geo::Geometry::Point(*p),
            Geometry::LineString(l) => geo::Geometry::LineString(l.clone()),
            Geometry::Polygon(p) => geo::Geometry::Polygon(p.clone()),
        }
    }

    /// Bounding box, or `None` for an empty geometry.
    pub fn bounding_rect(&self) -> Option<Extent> {
        match self {
            Geometry::Point(p) => Some(p.bounding_rect()),
            Geometry::LineString(l) => l.bounding_rect(),
            Geometry::Polygon(p) => p.bounding_rect(),
        }
    }

    /// Whether the geometry touches or overlaps `extent`.
    pub fn intersects_extent(&self, extent: &Extent) -> bool {
        match self {
            Geometry::Point(p) => p.intersects(extent),
            Geometry::LineString(l) => l.intersects(extent),
            Geometry::Polygon(p) => p.intersects(extent),
        }
    }

    /// Last vertex of the geometry (the closing vertex excluded for polygons).
    pub fn last_vertex(&self) -> Option<Coord<f64>> {
        match self {
            Geometry::Point(p) => Some(p.0),
            Geometry::LineString(l) => l.0.last().copied(),
            Geometry::Polygon(p) => {
                let ring = &p.exterior().0;
                match ring.len() {
                    0 => None,
                    1 => Some(ring[0]),
                    n => Some(ring[n - 2]),
                }
            }
        }
    }

    /// Where a floating measurement label belongs: the last vertex for lines,
    /// an interior point for polygons.
    pub fn label_anchor(&self) -> Option<Coord<f64>> {
        match self {
            Geometry::Polygon(p) => p.interior_point().map(|pt| pt.0).or_else(|| self.last_vertex()),
            _ => self.last_vertex(),
        }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({} coords)", self.kind(), self.coord_count())
    }
}

/// Validates that a coordinate is finite.
pub fn check_finite(c: Coord<f64>) -> Result<(), ConversionError> {
    if c.x.is_finite() && c.y.is_finite() {
        Ok(())
    } else {
        Err(ConversionError::NonFinite { x: c.x, y: c.y })
    }
}

fn degenerate(kind: GeometryKind, reason: impl Into<String>) -> ConversionError {
    ConversionError::Degenerate {
        kind: kind.to_string(),
        reason: reason.into(),
    }
}

type Position = Vec<f64>;

/// GeoJSON wire representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
enum GeoJsonGeometry {
    Point(Position),
    LineString(Vec<Position>),
    Polygon(Vec<Vec<Position>>),
    MultiPoint(serde_json::Value),
    MultiLineString(serde_json::Value),
    MultiPolygon(serde_json::Value),
}

fn position_to_coord(pos: &Position) -> Result<Coord<f64>, ConversionError> {
    match pos.as_slice() {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(ConversionError::Degenerate {
            kind: "Position".to_string(),
            reason: format!("expected at least 2 values, got {}", pos.len()),
        }),
    }
}

fn ring_from_positions(positions: &[Position]) -> Result<LineString<f64>, ConversionError> {
    positions
        .iter()
        .map(position_to_coord)
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}

fn ring_to_positions(ring: &LineString<f64>) -> Vec<Position> {
    ring.0.iter().map(|c| vec![c.x, c.y]).collect()
}

impl TryFrom<GeoJsonGeometry> for Geometry {
    type Error = ConversionError;

    fn try_from(value: GeoJsonGeometry) -> Result<Self, Self::Error> {
        let geometry = match value {
            GeoJsonGeometry::Point(pos) => Geometry::Point(Point(position_to_coord(&pos)?)),
            GeoJsonGeometry::LineString(positions) => {
                Geometry::LineString(ring_from_positions(&positions)?)
            }
            GeoJsonGeometry::Polygon(rings) => {
                let mut rings = rings
                    .iter()
                    .map(|r| ring_from_positions(r))
                    .collect::<Result<Vec<_>, _>>()?;
                if rings.is_empty() {
                    return Err(degenerate(GeometryKind::Polygon, "no outer ring"));
                }
                let exterior = rings.remove(0);
                Geometry::Polygon(Polygon::new(exterior, rings))
            }
            GeoJsonGeometry::MultiPoint(_) => {
                return Err(ConversionError::Unsupported("MultiPoint".to_string()))
            }
            GeoJsonGeometry::MultiLineString(_) => {
                return Err(ConversionError::Unsupported("MultiLineString".to_string()))
            }
            GeoJsonGeometry::MultiPolygon(_) => {
                return Err(ConversionError::Unsupported("MultiPolygon".to_string()))
            }
        };
        geometry.validate()?;
        Ok(geometry)
    }
}

impl From<Geometry> for GeoJsonGeometry {
    fn from(value: Geometry) -> Self {
        match value {
            Geometry::Point(p) => GeoJsonGeometry::Point(vec![p.x(), p.y()]),
            Geometry::LineString(l) => GeoJsonGeometry::LineString(ring_to_positions(&l)),
            Geometry::Polygon(p) => {
                let mut rings = vec![ring_to_positions(p.exterior())];
                rings.extend(p.interiors().iter().map(ring_to_positions));
                GeoJsonGeometry::Polygon(rings)
            }
        }
    }
}
