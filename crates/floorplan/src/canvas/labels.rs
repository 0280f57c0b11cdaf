// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room label content and placement

use super::transform::ViewTransform;
use crate::config::CanvasConfig;
use crate::geometry::{Bounds, Polygon2D};
use nalgebra::Point2;

/// Word -> drawing abbreviation, matched case-insensitively on whole words
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("kontor", "Kont."),
    ("møterom", "Møte"),
    ("korridor", "Korr."),
    ("toalett", "WC"),
    ("garderobe", "Gard."),
    ("teknisk", "Tekn."),
    ("kjøkken", "Kjøk."),
    ("soverom", "Sov."),
    ("oppholdsrom", "Opph."),
    ("trapperom", "Trapp"),
    ("vaskerom", "Vask"),
    ("lager", "Lag."),
    ("arbeidsrom", "Arb."),
    ("konferanserom", "Konf."),
];

/// Approximate glyph width relative to the font size
const CHAR_WIDTH: f64 = 0.6;
const LINE_HEIGHT: f64 = 1.2;

/// Leading room-number token, e.g. `"101"` from `"101 Kontor"`
pub fn room_number(name: &str) -> Option<&str> {
    let token = name.split_whitespace().next()?;
    token
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit())
        .then_some(token)
}

/// Room name without the number token, common words abbreviated
pub fn clean_room_name(name: &str) -> String {
    let mut words = name.split_whitespace().peekable();
    if words.peek().is_some_and(|w| room_number(w).is_some()) {
        words.next();
    }
    words
        .map(|word| {
            let lower = word.to_lowercase();
            ABBREVIATIONS
                .iter()
                .find(|(full, _)| *full == lower)
                .map_or_else(|| word.to_string(), |(_, short)| short.to_string())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_area(area: f64) -> String {
    format!("{area:.1} m²")
}

/// Up to three lines: number, name, area
pub fn label_lines(polygon: &Polygon2D, zoom: f64, config: &CanvasConfig) -> Vec<String> {
    let name = polygon.space_name();
    let mut lines = Vec::with_capacity(3);
    if let Some(number) = room_number(name) {
        lines.push(number.to_string());
    }
    let cleaned = clean_room_name(name);
    if !cleaned.is_empty() {
        lines.push(cleaned);
    }
    let area = polygon.area();
    if zoom >= config.area_label_zoom || area >= config.area_label_min_area {
        lines.push(format_area(area));
    }
    lines
}

/// Centroid clamped into the bounds shrunk by `margin`
pub fn label_anchor(polygon: &Polygon2D, margin: f64) -> (f64, f64) {
    let c = polygon.centroid();
    let b = polygon.bounds();
    let clamp = |v: f64, lo: f64, hi: f64| {
        if lo + margin <= hi - margin {
            v.clamp(lo + margin, hi - margin)
        } else {
            (lo + hi) / 2.0
        }
    };
    (clamp(c.x(), b.min_x, b.max_x), clamp(c.y(), b.min_y, b.max_y))
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacedLabel {
    pub guid: String,
    pub lines: Vec<String>,
    /// Screen center of the label block
    pub anchor: Point2<f64>,
    /// Screen rectangle the label occupies
    pub rect: Bounds,
    pub font_size: f64,
}

pub fn font_size(zoom: f64) -> f64 {
    (11.0 * zoom.sqrt()).clamp(8.0, 16.0)
}

/// Labels to draw, largest rooms first
///
/// Rooms too small on screen get none. A room under the small-room area
/// loses its label when the rectangle overlaps one already placed.
pub fn layout_labels(rooms: &[&Polygon2D], view: &ViewTransform, config: &CanvasConfig) -> Vec<PlacedLabel> {
    if view.zoom < config.label_min_zoom {
        return Vec::new();
    }

    let mut ordered: Vec<(&Polygon2D, f64)> = rooms.iter().map(|p| (*p, p.area())).collect();
    ordered.sort_by(|a, b| b.1.total_cmp(&a.1));

    let size = font_size(view.zoom);
    let mut placed: Vec<PlacedLabel> = Vec::new();
    for (polygon, area) in ordered {
        let on_screen = view.bounds_to_screen(&polygon.bounds());
        if on_screen.width().min(on_screen.height()) < config.label_min_screen_size {
            continue;
        }

        let lines = label_lines(polygon, view.zoom, config);
        if lines.is_empty() {
            continue;
        }

        let (x, y) = label_anchor(polygon, config.label_margin);
        let anchor = view.floor_to_screen(x, y);
        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as f64;
        let half_w = longest * size * CHAR_WIDTH / 2.0;
        let half_h = lines.len() as f64 * size * LINE_HEIGHT / 2.0;
        let rect = Bounds::new(
            anchor.x - half_w,
            anchor.y - half_h,
            anchor.x + half_w,
            anchor.y + half_h,
        );

        let overlaps = placed.iter().any(|l| l.rect.intersects(&rect));
        if overlaps && area < config.small_room_area {
            continue;
        }

        placed.push(PlacedLabel {
            guid: polygon.space_guid().to_string(),
            lines,
            anchor,
            rect,
            font_size: size,
        });
    }
    placed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(guid: &str, name: &str, x: f64, y: f64, w: f64, h: f64) -> Polygon2D {
        Polygon2D::from_coords(&[(x, y), (x + w, y), (x + w, y + h), (x, y + h)], guid, name)
            .unwrap()
    }

    #[test]
    fn test_room_number_and_clean_name() {
        assert_eq!(room_number("101 Kontor"), Some("101"));
        assert_eq!(room_number("Kontor"), None);
        assert_eq!(clean_room_name("101 Kontor"), "Kont.");
        assert_eq!(clean_room_name("2.05 Møterom stor"), "Møte stor");
        assert_eq!(clean_room_name("Bod"), "Bod");
    }

    #[test]
    fn test_area_line_depends_on_zoom_and_size() {
        let config = CanvasConfig::default();
        let small = rect("s", "12 Bod", 0.0, 0.0, 2.0, 2.0);
        assert_eq!(label_lines(&small, 1.0, &config), ["12", "Bod"]);
        assert_eq!(label_lines(&small, 2.0, &config).len(), 3);

        let large = rect("l", "Stue", 0.0, 0.0, 6.0, 5.0);
        assert_eq!(label_lines(&large, 1.0, &config), ["Stue", "30.0 m²"]);
    }

    #[test]
    fn test_anchor_clamped_inside() {
        // L-shape whose centroid lies near the inner corner
        let l = Polygon2D::from_coords(
            &[(0.0, 0.0), (10.0, 0.0), (10.0, 1.0), (1.0, 1.0), (1.0, 10.0), (0.0, 10.0)],
            "l",
            "",
        )
        .unwrap();
        let (x, y) = label_anchor(&l, 0.2);
        let b = l.bounds();
        assert!(x >= b.min_x + 0.2 && x <= b.max_x - 0.2);
        assert!(y >= b.min_y + 0.2 && y <= b.max_y - 0.2);
    }

    #[test]
    fn test_no_labels_below_min_zoom() {
        let config = CanvasConfig::default();
        let room = rect("r", "101 Kontor", 0.0, 0.0, 5.0, 4.0);
        let mut view = ViewTransform::new(config.pixels_per_meter);
        view.zoom = 0.2;
        assert!(layout_labels(&[&room], &view, &config).is_empty());
        view.zoom = 1.0;
        assert_eq!(layout_labels(&[&room], &view, &config).len(), 1);
    }

    #[test]
    fn test_min_screen_size_is_configurable() {
        let mut config = CanvasConfig::default();
        let room = rect("r", "101 Kontor", 0.0, 0.0, 5.0, 4.0);
        let view = ViewTransform::new(config.pixels_per_meter);
        // 100 x 80 px on screen
        assert_eq!(layout_labels(&[&room], &view, &config).len(), 1);
        config.label_min_screen_size = 90.0;
        assert!(layout_labels(&[&room], &view, &config).is_empty());
    }

    #[test]
    fn test_small_overlapping_label_skipped() {
        let config = CanvasConfig::default();
        let mut view = ViewTransform::new(config.pixels_per_meter);
        view.zoom = 1.0;
        // Large room 10 x 8 m and a 3 x 3 m room whose label lands on top
        let big = rect("big", "1 Stue", 0.0, 0.0, 10.0, 8.0);
        let small = rect("small", "2 Bod", 3.5, 2.5, 3.0, 3.0);
        let labels = layout_labels(&[&small, &big], &view, &config);
        let guids: Vec<&str> = labels.iter().map(|l| l.guid.as_str()).collect();
        assert_eq!(guids, ["big"]);
    }
}
