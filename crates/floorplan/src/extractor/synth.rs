// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Last-resort outlines synthesized from area quantities
//!
//! The generated rectangle only stands in for the real room so it can be
//! seen and selected. Variation comes from a generator seeded with the
//! space GUID, so the same model always produces the same layout.

use super::boundaries::{BoundaryError, BoundaryStrategy, SpaceContext};
use crate::geometry::{Point2D, Polygon2D};
use floorplan_model::placement::origin;
use floorplan_model::{Quantity, QuantityType};
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

const AREA_NAMES: [&str; 5] = [
    "NetFloorArea",
    "GrossFloorArea",
    "NetArea",
    "GrossArea",
    "Area",
];
const PERIMETER_NAMES: [&str; 3] = ["GrossPerimeter", "NetPerimeter", "Perimeter"];

/// Aspect ratio (long side / short side) by room-name keyword
const ASPECT_HINTS: &[(&[&str], f64)] = &[
    (&["korridor", "gang", "corridor", "hall"], 2.3),
    (&["kontor", "office"], 1.5),
    (&["møte", "mote", "meeting", "konferanse"], 1.4),
    (&["stue", "living"], 1.35),
    (&["bad", "wc", "toalett", "dusj", "bath", "toilet"], 1.2),
];
const DEFAULT_ASPECT: f64 = 1.3;
const ASPECT_JITTER: f64 = 0.1;
const MIN_ASPECT: f64 = 1.2;
const MAX_ASPECT: f64 = 2.3;

/// Cell size of the grid used for spaces without any placement (m)
const GRID_SPACING: f64 = 20.0;
const GRID_COLUMNS: u64 = 10;

/// SplitMix64: small, fast and fully determined by its seed
#[derive(Clone, Debug)]
pub struct SplitMix64(u64);

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Seed from a stable hash of `key`
    pub fn from_key(key: &str) -> Self {
        let mut hasher = FxHasher::default();
        key.hash(&mut hasher);
        Self(hasher.finish())
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Width and height with `w * h = area` and `2 (w + h) = perimeter`
///
/// `None` when no real rectangle satisfies both.
pub fn solve_rectangle(area: f64, perimeter: f64) -> Option<(f64, f64)> {
    let half = perimeter / 2.0;
    let discriminant = half * half - 4.0 * area;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    let (w, h) = ((half + root) / 2.0, (half - root) / 2.0);
    (h > 0.0).then_some((w, h))
}

/// Aspect ratio for a room name, jittered and clamped to 1.2..=2.3
pub fn aspect_ratio(name: &str, rng: &mut SplitMix64) -> f64 {
    let lower = name.to_lowercase();
    let base = ASPECT_HINTS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map_or(DEFAULT_ASPECT, |(_, aspect)| *aspect);
    let jitter = (rng.next_f64() * 2.0 - 1.0) * ASPECT_JITTER;
    (base + jitter).clamp(MIN_ASPECT, MAX_ASPECT)
}

fn find_quantity(
    quantities: &[Quantity],
    names: &[&str],
    quantity_type: QuantityType,
) -> Option<f64> {
    names.iter().find_map(|name| {
        quantities
            .iter()
            .find(|q| q.quantity_type == quantity_type && q.name == *name)
            .map(|q| q.value)
            .filter(|v| v.is_finite() && *v > 0.0)
    })
}

/// Rectangle sized from the space's area quantities
pub struct QuantitySynthesis;

impl QuantitySynthesis {
    fn floor_area(&self, ctx: &SpaceContext<'_>, quantities: &[Quantity]) -> Option<f64> {
        find_quantity(quantities, &AREA_NAMES, QuantityType::Area).or_else(|| {
            AREA_NAMES.iter().find_map(|name| {
                ctx.model
                    .properties()
                    .get_property(ctx.space.id, name)
                    .and_then(|p| p.numeric)
                    .filter(|v| v.is_finite() && *v > 0.0)
            })
        })
    }

    fn anchor(&self, ctx: &SpaceContext<'_>, rng: &mut SplitMix64) -> Result<Point2D, BoundaryError> {
        if let Some(placement) = ctx.world_placement() {
            return ctx.to_plan(&origin(&placement));
        }
        let cell = rng.next_u64() % (GRID_COLUMNS * GRID_COLUMNS);
        let (col, row) = ((cell % GRID_COLUMNS) as f64, (cell / GRID_COLUMNS) as f64);
        Ok(Point2D::new(col * GRID_SPACING, row * GRID_SPACING)?)
    }
}

impl BoundaryStrategy for QuantitySynthesis {
    fn name(&self) -> &'static str {
        "quantity_synthesis"
    }

    fn extract(&self, ctx: &SpaceContext<'_>) -> Result<Vec<Polygon2D>, BoundaryError> {
        let quantities = ctx.model.properties().quantities(ctx.space.id);
        let area = self
            .floor_area(ctx, &quantities)
            .ok_or(BoundaryError::NotApplicable("no floor area quantity"))?;
        let perimeter = find_quantity(&quantities, &PERIMETER_NAMES, QuantityType::Length)
            .map(|p| p * ctx.scale());

        let mut rng = SplitMix64::from_key(ctx.guid);
        let (width, height) = match perimeter {
            Some(p) => solve_rectangle(area, p).unwrap_or_else(|| {
                log::debug!("Space {}: area {area} and perimeter {p} disagree", ctx.guid);
                (area.sqrt(), area.sqrt())
            }),
            None => {
                let aspect = aspect_ratio(ctx.name, &mut rng);
                let width = (area * aspect).sqrt();
                (width, area / width)
            }
        };

        let corner = self.anchor(ctx, &mut rng)?;
        let (x, y) = (corner.x(), corner.y());
        let polygon = Polygon2D::from_coords(
            &[(x, y), (x + width, y), (x + width, y + height), (x, y + height)],
            ctx.guid,
            ctx.name,
        )?;
        log::debug!(
            "Space {}: synthesized {width:.2} x {height:.2} m from {area:.2} m²",
            ctx.guid
        );
        Ok(vec![polygon])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_solve_rectangle() {
        let (w, h) = solve_rectangle(12.0, 14.0).unwrap();
        assert_abs_diff_eq!(w, 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(h, 3.0, epsilon = 1e-9);
        // Perimeter too small for the area
        assert!(solve_rectangle(100.0, 10.0).is_none());
    }

    #[test]
    fn test_generator_is_deterministic_per_key() {
        let a: Vec<u64> = {
            let mut r = SplitMix64::from_key("2O2Fr$t4X7Zf8NOew3FLOH");
            (0..4).map(|_| r.next_u64()).collect()
        };
        let b: Vec<u64> = {
            let mut r = SplitMix64::from_key("2O2Fr$t4X7Zf8NOew3FLOH");
            (0..4).map(|_| r.next_u64()).collect()
        };
        assert_eq!(a, b);
        let mut other = SplitMix64::from_key("another");
        assert_ne!(a[0], other.next_u64());
    }

    #[test]
    fn test_unit_interval() {
        let mut r = SplitMix64::new(7);
        for _ in 0..1000 {
            let v = r.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_aspect_ratio_range_and_hints() {
        let mut r = SplitMix64::new(1);
        for name in ["Korridor", "Kontor 2", "Bad", "Lager", ""] {
            let a = aspect_ratio(name, &mut r);
            assert!((MIN_ASPECT..=MAX_ASPECT).contains(&a), "{name}: {a}");
        }
        let mut r = SplitMix64::new(1);
        assert!(aspect_ratio("Korridor", &mut r) > 2.1);
    }
}
