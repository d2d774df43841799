//! Element geometry rows
//!
//! Geometry is stored as a center point plus JSON-encoded polylines or
//! polygons. Since v21 every row also carries its bounding box, which is
//! derived from the geometry when the row is encoded.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::database::core::{Row, Value};
use crate::database::mapping::RowMapper;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLon {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Node,
    Way,
    Relation,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Node => "NODE",
            ElementType::Way => "WAY",
            ElementType::Relation => "RELATION",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "NODE" => Ok(ElementType::Node),
            "WAY" => Ok(ElementType::Way),
            "RELATION" => Ok(ElementType::Relation),
            other => Err(Error::inconsistent(format!(
                "unknown element type '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub min_longitude: f64,
    pub max_latitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    pub fn of_point(p: LatLon) -> Self {
        Self {
            min_latitude: p.latitude,
            min_longitude: p.longitude,
            max_latitude: p.latitude,
            max_longitude: p.longitude,
        }
    }

    /// Smallest box enclosing all `points`; `None` when there are none.
    pub fn enclosing<'a>(points: impl IntoIterator<Item = &'a LatLon>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Self::of_point(*p),
                Some(b) => Self {
                    min_latitude: b.min_latitude.min(p.latitude),
                    min_longitude: b.min_longitude.min(p.longitude),
                    max_latitude: b.max_latitude.max(p.latitude),
                    max_longitude: b.max_longitude.max(p.longitude),
                },
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementGeometry {
    Point {
        center: LatLon,
    },
    Polylines {
        center: LatLon,
        polylines: Vec<Vec<LatLon>>,
    },
    Polygons {
        center: LatLon,
        polygons: Vec<Vec<LatLon>>,
    },
}

impl ElementGeometry {
    pub fn center(&self) -> LatLon {
        match self {
            ElementGeometry::Point { center }
            | ElementGeometry::Polylines { center, .. }
            | ElementGeometry::Polygons { center, .. } => *center,
        }
    }

    pub fn bounds(&self) -> BoundingBox {
        let rings = match self {
            ElementGeometry::Point { center } => return BoundingBox::of_point(*center),
            ElementGeometry::Polylines { polylines, .. } => polylines,
            ElementGeometry::Polygons { polygons, .. } => polygons,
        };
        BoundingBox::enclosing(rings.iter().flatten())
            .unwrap_or_else(|| BoundingBox::of_point(self.center()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementGeometryEntry {
    pub element_type: ElementType,
    pub element_id: i64,
    pub geometry: ElementGeometry,
}

/// Maps `elements_geometry` rows. Decoding only needs the columns that exist
/// before v21, so the same mapper reads the legacy shape and writes the new one.
#[derive(Debug, Default, Clone, Copy)]
pub struct ElementGeometryMapping;

impl ElementGeometryMapping {
    pub const READ_COLUMNS: &'static [&'static str] = &[
        "element_type",
        "element_id",
        "geometry_polylines",
        "geometry_polygons",
        "latitude",
        "longitude",
    ];
}

fn decode_rings(blob: &[u8]) -> Result<Vec<Vec<LatLon>>> {
    Ok(serde_json::from_slice(blob)?)
}

impl RowMapper<ElementGeometryEntry> for ElementGeometryMapping {
    fn to_domain(&self, row: &Row) -> Result<ElementGeometryEntry> {
        let center = LatLon::new(row.get_f64("latitude")?, row.get_f64("longitude")?);
        let polylines = row.get_opt_blob("geometry_polylines")?;
        let polygons = row.get_opt_blob("geometry_polygons")?;

        let geometry = match (polylines, polygons) {
            (Some(blob), _) => ElementGeometry::Polylines {
                center,
                polylines: decode_rings(blob)?,
            },
            (None, Some(blob)) => ElementGeometry::Polygons {
                center,
                polygons: decode_rings(blob)?,
            },
            (None, None) => ElementGeometry::Point { center },
        };

        Ok(ElementGeometryEntry {
            element_type: row.get_text("element_type")?.parse()?,
            element_id: row.get_i64("element_id")?,
            geometry,
        })
    }

    fn to_row(&self, entry: &ElementGeometryEntry) -> Result<Row> {
        let (polylines, polygons) = match &entry.geometry {
            ElementGeometry::Point { .. } => (Value::Null, Value::Null),
            ElementGeometry::Polylines { polylines, .. } => {
                (Value::Blob(serde_json::to_vec(polylines)?), Value::Null)
            }
            ElementGeometry::Polygons { polygons, .. } => {
                (Value::Null, Value::Blob(serde_json::to_vec(polygons)?))
            }
        };
        let center = entry.geometry.center();
        let bounds = entry.geometry.bounds();

        Ok(Row::new()
            .with("element_type", entry.element_type.as_str().to_string())
            .with("element_id", entry.element_id)
            .with("geometry_polylines", polylines)
            .with("geometry_polygons", polygons)
            .with("latitude", center.latitude)
            .with("longitude", center.longitude)
            .with("min_latitude", bounds.min_latitude)
            .with("min_longitude", bounds.min_longitude)
            .with("max_latitude", bounds.max_latitude)
            .with("max_longitude", bounds.max_longitude))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn way() -> ElementGeometryEntry {
        ElementGeometryEntry {
            element_type: ElementType::Way,
            element_id: 42,
            geometry: ElementGeometry::Polylines {
                center: LatLon::new(1.0, 2.0),
                polylines: vec![vec![
                    LatLon::new(0.5, 3.0),
                    LatLon::new(1.5, 1.0),
                    LatLon::new(1.0, 2.0),
                ]],
            },
        }
    }

    #[test]
    fn test_bounds_of_polyline() {
        let bounds = way().geometry.bounds();

        assert_eq!(bounds.min_latitude, 0.5);
        assert_eq!(bounds.max_latitude, 1.5);
        assert_eq!(bounds.min_longitude, 1.0);
        assert_eq!(bounds.max_longitude, 3.0);
    }

    #[test]
    fn test_bounds_of_point_is_degenerate() {
        let geometry = ElementGeometry::Point {
            center: LatLon::new(5.0, 6.0),
        };
        assert_eq!(
            geometry.bounds(),
            BoundingBox::of_point(LatLon::new(5.0, 6.0))
        );
    }

    #[test]
    fn test_to_row_writes_bounds() {
        let row = ElementGeometryMapping.to_row(&way()).unwrap();

        assert_eq!(row.get_text("element_type").unwrap(), "WAY");
        assert_eq!(row.get_f64("min_latitude").unwrap(), 0.5);
        assert_eq!(row.get_f64("max_longitude").unwrap(), 3.0);
        assert_eq!(row.get("geometry_polygons"), Some(&Value::Null));
    }

    #[test]
    fn test_decodes_legacy_row() {
        let legacy = Row::new()
            .with("element_type", "NODE".to_string())
            .with("element_id", 7i64)
            .with("geometry_polylines", Value::Null)
            .with("geometry_polygons", Value::Null)
            .with("latitude", 10.0)
            .with("longitude", 20.0);

        let entry = ElementGeometryMapping.to_domain(&legacy).unwrap();
        assert_eq!(entry.element_type, ElementType::Node);
        assert_eq!(
            entry.geometry,
            ElementGeometry::Point {
                center: LatLon::new(10.0, 20.0)
            }
        );
    }

    #[test]
    fn test_unknown_element_type_is_inconsistent() {
        assert!(matches!(
            "AREA".parse::<ElementType>(),
            Err(Error::InconsistentSchema(_))
        ));
    }
}
