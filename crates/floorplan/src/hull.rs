// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outer-boundary construction
//!
//! Graham scan used wherever a scattered point set has to be reduced to a
//! single enclosing room outline.

use crate::geometry::Point2D;
use rustc_hash::FxHashSet;

/// Drop points that fall into the same `tolerance` grid cell, keeping the
/// first occurrence
pub fn dedup_points(points: &[Point2D], tolerance: f64) -> Vec<Point2D> {
    if tolerance <= 0.0 {
        let mut out: Vec<Point2D> = Vec::with_capacity(points.len());
        for p in points {
            if !out.contains(p) {
                out.push(*p);
            }
        }
        return out;
    }

    let mut seen: FxHashSet<(i64, i64)> = FxHashSet::default();
    points
        .iter()
        .filter(|p| {
            seen.insert((
                (p.x() / tolerance).round() as i64,
                (p.y() / tolerance).round() as i64,
            ))
        })
        .copied()
        .collect()
}

fn cross(o: &Point2D, a: &Point2D, b: &Point2D) -> f64 {
    (a.x() - o.x()) * (b.y() - o.y()) - (a.y() - o.y()) * (b.x() - o.x())
}

/// Counter-clockwise convex hull, returned as an open ring
///
/// Fewer than three input points are returned unchanged. Collinear points on
/// the hull edges are removed.
pub fn convex_hull(points: &[Point2D]) -> Vec<Point2D> {
    if points.len() < 3 {
        return points.to_vec();
    }

    // Lowest Y, then leftmost X
    let mut start = points[0];
    for p in points {
        if p.y() < start.y() || (p.y() == start.y() && p.x() < start.x()) {
            start = *p;
        }
    }

    let mut sorted: Vec<Point2D> = points.iter().filter(|p| **p != start).copied().collect();
    sorted.sort_by(|a, b| {
        let angle_a = (a.y() - start.y()).atan2(a.x() - start.x());
        let angle_b = (b.y() - start.y()).atan2(b.x() - start.x());
        angle_a
            .total_cmp(&angle_b)
            .then_with(|| start.distance_to(a).total_cmp(&start.distance_to(b)))
    });
    sorted.dedup();

    let mut hull = vec![start];
    for p in sorted {
        while hull.len() > 1 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], &p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }

    // Closing edge back to start may leave a collinear tail
    while hull.len() > 2 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], &start) <= 0.0 {
        hull.pop();
    }

    hull
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point2D> {
        coords
            .iter()
            .map(|&(x, y)| Point2D::new(x, y).unwrap())
            .collect()
    }

    #[test]
    fn test_interior_point_removed() {
        let hull = convex_hull(&pts(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (0.5, 0.5),
            (1.0, 1.0),
            (0.0, 1.0),
        ]));
        assert_eq!(hull.len(), 4);
        assert!(!hull.contains(&Point2D::new(0.5, 0.5).unwrap()));
    }

    #[test]
    fn test_collinear_edge_points_removed() {
        let hull = convex_hull(&pts(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (2.0, 0.0),
            (2.0, 2.0),
            (0.0, 2.0),
            (0.0, 1.0),
        ]));
        assert_eq!(hull.len(), 4);
    }

    #[test]
    fn test_hull_starts_lowest_leftmost_and_turns_left() {
        let hull = convex_hull(&pts(&[(2.0, 2.0), (0.0, 2.0), (2.0, 0.0), (0.0, 0.0)]));
        assert_eq!(hull[0], Point2D::new(0.0, 0.0).unwrap());
        for i in 0..hull.len() {
            let a = &hull[i];
            let b = &hull[(i + 1) % hull.len()];
            let c = &hull[(i + 2) % hull.len()];
            assert!(cross(a, b, c) > 0.0);
        }
    }

    #[test]
    fn test_small_inputs_pass_through() {
        assert_eq!(convex_hull(&pts(&[(0.0, 0.0), (1.0, 1.0)])).len(), 2);
        assert!(convex_hull(&[]).is_empty());
    }

    #[test]
    fn test_dedup_within_tolerance() {
        let points = pts(&[(0.0, 0.0), (0.0002, 0.0001), (1.0, 0.0), (1.0, 0.0)]);
        assert_eq!(dedup_points(&points, 0.001).len(), 2);
        assert_eq!(dedup_points(&points, 0.0).len(), 3);
    }
}
