// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Candidate polygon acceptance rules

use crate::config::ExtractionConfig;
use crate::geometry::Polygon2D;

/// Why a candidate was rejected, `None` if it is acceptable
pub fn rejection_reason(polygon: &Polygon2D, config: &ExtractionConfig) -> Option<String> {
    if polygon.points().len() < 4 {
        return Some(format!("only {} points", polygon.points().len()));
    }
    if polygon
        .points()
        .iter()
        .any(|p| !p.x().is_finite() || !p.y().is_finite())
    {
        return Some("non-finite coordinate".into());
    }

    let area = polygon.area();
    if !(config.min_room_area..=config.max_room_area).contains(&area) {
        return Some(format!("area {area:.2} m² out of range"));
    }

    let bounds = polygon.bounds();
    let extent = config.min_room_extent..=config.max_room_extent;
    if !extent.contains(&bounds.width()) || !extent.contains(&bounds.height()) {
        return Some(format!(
            "extent {:.2} x {:.2} m out of range",
            bounds.width(),
            bounds.height()
        ));
    }
    None
}

/// ≥4 points, area and bounding box within the configured room limits,
/// finite coordinates
pub fn validate_polygon(polygon: &Polygon2D, config: &ExtractionConfig) -> bool {
    rejection_reason(polygon, config).is_none()
}
