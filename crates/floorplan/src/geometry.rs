// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D geometric primitives
//!
//! [`Point2D`] and [`Polygon2D`] validate on construction and stay valid:
//! every transformation returns a new, re-validated value. Deserialization
//! goes through the same constructors.

use crate::error::GeometryError;
use serde::{Deserialize, Serialize};

/// Areas below this are treated as degenerate when computing centroids
pub const DEGENERATE_AREA: f64 = 1e-10;

/// A point on the floor plane, in meters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint")]
pub struct Point2D {
    x: f64,
    y: f64,
}

#[derive(Deserialize)]
struct RawPoint {
    x: f64,
    y: f64,
}

impl TryFrom<RawPoint> for Point2D {
    type Error = GeometryError;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        Point2D::new(raw.x, raw.y)
    }
}

impl Point2D {
    /// Create a point; NaN and infinite coordinates are rejected
    pub fn new(x: f64, y: f64) -> Result<Self, GeometryError> {
        if x.is_finite() && y.is_finite() {
            Ok(Self { x, y })
        } else {
            Err(GeometryError::NonFinite { x, y })
        }
    }

    /// For values derived from already-valid points
    pub(crate) fn from_finite(x: f64, y: f64) -> Self {
        debug_assert!(x.is_finite() && y.is_finite());
        Self { x, y }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Result<Self, GeometryError> {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Scale about the origin
    pub fn scale(&self, factor: f64) -> Result<Self, GeometryError> {
        Self::new(self.x * factor, self.y * factor)
    }
}

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: min_x.max(max_x),
            max_y: min_y.max(max_y),
        }
    }

    /// Bounds of a point set, `None` when empty
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point2D>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut b = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for p in iter {
            b.min_x = b.min_x.min(p.x);
            b.min_y = b.min_y.min(p.y);
            b.max_x = b.max_x.max(p.x);
            b.max_y = b.max_y.max(p.y);
        }
        Some(b)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point2D {
        Point2D::from_finite(
            self.min_x / 2.0 + self.max_x / 2.0,
            self.min_y / 2.0 + self.max_y / 2.0,
        )
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Touching edges count as intersecting
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// A closed room outline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPolygon")]
pub struct Polygon2D {
    points: Vec<Point2D>,
    space_guid: String,
    space_name: String,
}

#[derive(Deserialize)]
struct RawPolygon {
    points: Vec<Point2D>,
    space_guid: String,
    #[serde(default)]
    space_name: String,
}

impl TryFrom<RawPolygon> for Polygon2D {
    type Error = GeometryError;

    fn try_from(raw: RawPolygon) -> Result<Self, Self::Error> {
        Polygon2D::new(raw.points, raw.space_guid, raw.space_name)
    }
}

impl Polygon2D {
    /// Build a polygon, closing it if the first and last points differ
    ///
    /// Needs at least three distinct points and a non-empty GUID. An empty
    /// name becomes `"Room <first 8 chars of guid>"`.
    pub fn new(
        mut points: Vec<Point2D>,
        space_guid: impl Into<String>,
        space_name: impl Into<String>,
    ) -> Result<Self, GeometryError> {
        let space_guid = space_guid.into();
        if space_guid.trim().is_empty() {
            return Err(GeometryError::EmptyGuid);
        }

        let distinct = count_distinct(&points);
        if distinct < 3 {
            return Err(GeometryError::TooFewPoints { distinct });
        }

        if let (Some(first), Some(last)) = (points.first().copied(), points.last()) {
            if first != *last {
                points.push(first);
            }
        }

        let mut space_name = space_name.into();
        if space_name.trim().is_empty() {
            let prefix: String = space_guid.chars().take(8).collect();
            space_name = format!("Room {prefix}");
        }

        Ok(Self {
            points,
            space_guid,
            space_name,
        })
    }

    /// Build from raw coordinate pairs
    pub fn from_coords(
        coords: &[(f64, f64)],
        space_guid: impl Into<String>,
        space_name: impl Into<String>,
    ) -> Result<Self, GeometryError> {
        let points = coords
            .iter()
            .map(|&(x, y)| Point2D::new(x, y))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(points, space_guid, space_name)
    }

    /// Stored points; always closed, so `points()[0] == points()[len - 1]`
    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    /// Points without the closing duplicate
    pub fn vertices(&self) -> &[Point2D] {
        &self.points[..self.points.len() - 1]
    }

    pub fn space_guid(&self) -> &str {
        &self.space_guid
    }

    pub fn space_name(&self) -> &str {
        &self.space_name
    }

    pub fn bounds(&self) -> Bounds {
        let first = self.points[0];
        Bounds::from_points(&self.points).unwrap_or(Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        })
    }

    fn signed_area(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].x * w[1].y - w[1].x * w[0].y)
            .sum::<f64>()
            / 2.0
    }

    /// Shoelace area, always non-negative
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn perimeter(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance_to(&w[1]))
            .sum()
    }

    /// Area-weighted centroid; the vertex mean for degenerate polygons
    pub fn centroid(&self) -> Point2D {
        let a = self.signed_area();
        if a.abs() < DEGENERATE_AREA {
            let verts = self.vertices();
            let n = verts.len() as f64;
            let (sx, sy) = verts.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
            return Point2D::from_finite(sx / n, sy / n);
        }

        let (mut cx, mut cy) = (0.0, 0.0);
        for w in self.points.windows(2) {
            let cross = w[0].x * w[1].y - w[1].x * w[0].y;
            cx += (w[0].x + w[1].x) * cross;
            cy += (w[0].y + w[1].y) * cross;
        }
        let k = 1.0 / (6.0 * a);
        Point2D::from_finite(cx * k, cy * k)
    }

    /// Ray-casting point containment
    pub fn contains_point(&self, p: &Point2D) -> bool {
        self.contains_xy(p.x, p.y)
    }

    pub fn contains_xy(&self, x: f64, y: f64) -> bool {
        let mut inside = false;
        for w in self.points.windows(2) {
            let (a, b) = (w[0], w[1]);
            if (a.y > y) != (b.y > y) {
                let x_cross = a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y);
                if x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Result<Self, GeometryError> {
        let points = self
            .points
            .iter()
            .map(|p| p.translate(dx, dy))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(points, self.space_guid.clone(), self.space_name.clone())
    }

    /// Scale about the origin
    pub fn scaled(&self, factor: f64) -> Result<Self, GeometryError> {
        let points = self
            .points
            .iter()
            .map(|p| p.scale(factor))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(points, self.space_guid.clone(), self.space_name.clone())
    }
}

fn count_distinct(points: &[Point2D]) -> usize {
    let mut distinct: Vec<&Point2D> = Vec::with_capacity(points.len());
    for p in points {
        if !distinct.iter().any(|q| *q == p) {
            distinct.push(p);
        }
    }
    distinct.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn unit_square() -> Polygon2D {
        Polygon2D::from_coords(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)], "sq", "Square")
            .unwrap()
    }

    #[test]
    fn test_point_rejects_non_finite() {
        assert!(Point2D::new(f64::NAN, 0.0).is_err());
        assert!(Point2D::new(0.0, f64::INFINITY).is_err());
        assert!(Point2D::new(1.0, 2.0).is_ok());
    }

    #[test]
    fn test_distance() {
        let a = Point2D::new(0.0, 0.0).unwrap();
        let b = Point2D::new(3.0, 4.0).unwrap();
        assert_eq!(a.distance_to(&b), 5.0);
    }

    #[test]
    fn test_polygon_closes_itself() {
        let sq = unit_square();
        assert_eq!(sq.points().len(), 5);
        assert_eq!(sq.points()[0], sq.points()[4]);

        let already_closed = Polygon2D::from_coords(
            &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)],
            "tri",
            "",
        )
        .unwrap();
        assert_eq!(already_closed.points().len(), 4);
    }

    #[test]
    fn test_polygon_rejects_degenerate_input() {
        let two = Polygon2D::from_coords(&[(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)], "g", "");
        assert_eq!(two, Err(GeometryError::TooFewPoints { distinct: 2 }));
        let no_guid = Polygon2D::from_coords(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)], "  ", "");
        assert_eq!(no_guid, Err(GeometryError::EmptyGuid));
    }

    #[test]
    fn test_default_name_uses_guid_prefix() {
        let p = Polygon2D::from_coords(
            &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)],
            "3vB2YO$MX4xv5uCqZZG05x",
            "",
        )
        .unwrap();
        assert_eq!(p.space_name(), "Room 3vB2YO$M");
    }

    #[test]
    fn test_unit_square_area() {
        assert_abs_diff_eq!(unit_square().area(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_clockwise_area_is_positive() {
        let cw =
            Polygon2D::from_coords(&[(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0)], "cw", "")
                .unwrap();
        assert_abs_diff_eq!(cw.area(), 4.0, epsilon = 1e-10);
    }

    #[test]
    fn test_centroid_of_centered_square() {
        let p = Polygon2D::from_coords(
            &[(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)],
            "c",
            "",
        )
        .unwrap();
        let c = p.centroid();
        assert_abs_diff_eq!(c.x(), 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(c.y(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_degenerate_centroid_falls_back_to_mean() {
        let line =
            Polygon2D::from_coords(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)], "line", "").unwrap();
        let c = line.centroid();
        assert_abs_diff_eq!(c.x(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c.y(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_contains_point() {
        let sq = unit_square();
        let inside = Point2D::new(0.5, 0.5).unwrap();
        assert!(sq.contains_point(&inside));
        for (x, y) in [(1.1, 0.5), (-0.1, 0.5), (0.5, 1.1), (0.5, -0.1)] {
            assert!(!sq.contains_xy(x, y), "({x}, {y}) should be outside");
        }
    }

    #[test]
    fn test_translate_and_scale_return_new_polygons() {
        let sq = unit_square();
        let moved = sq.translated(10.0, 5.0).unwrap();
        assert_eq!(moved.bounds(), Bounds::new(10.0, 5.0, 11.0, 6.0));
        assert_eq!(sq.bounds(), Bounds::new(0.0, 0.0, 1.0, 1.0));

        let big = sq.scaled(3.0).unwrap();
        assert_abs_diff_eq!(big.area(), 9.0, epsilon = 1e-10);
        assert!(sq.scaled(f64::INFINITY).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Polygon2D = serde_json::from_str(
            r#"{"points":[{"x":0,"y":0},{"x":2,"y":0},{"x":2,"y":2}],"space_guid":"a"}"#,
        )
        .unwrap();
        assert_eq!(ok.points().len(), 4);

        let bad = serde_json::from_str::<Polygon2D>(
            r#"{"points":[{"x":0,"y":0},{"x":2,"y":0}],"space_guid":"a"}"#,
        );
        assert!(bad.is_err());
    }
}
