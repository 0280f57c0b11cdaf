// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interactive floor-plan canvas
//!
//! Toolkit-independent: the host forwards pointer and wheel input, drains
//! [`CanvasEvent`]s after each call, and renders with [`FloorPlanCanvas::paint`]
//! into its own [`Painter`]. View state is only changed through the methods
//! here; painting never mutates it.

pub mod colors;
pub mod labels;
pub mod paint;
pub mod svg;
pub mod transform;

pub use paint::{Color, DisplayList, DrawCommand, Painter, Stroke, TextStyle};
pub use svg::SvgPainter;
pub use transform::ViewTransform;

use crate::config::CanvasConfig;
use crate::floor::{FloorGeometry, FloorGeometryMap};
use crate::geometry::{Bounds, Polygon2D};
use nalgebra::Point2;
use rustc_hash::FxHashMap;
use std::sync::Arc;

const BACKGROUND: Color = Color::rgb(250, 250, 248);
const DEFAULT_FILL: Color = Color::rgb(236, 240, 245);
const DEFAULT_BORDER: Color = Color::rgb(90, 96, 110);
const SELECTED_FILL: Color = Color::rgb(98, 160, 234);
const SELECTED_BORDER: Color = Color::rgb(20, 90, 200);
const OUTLINE: Color = Color::rgb(150, 150, 150);
const LABEL: Color = Color::rgb(30, 30, 30);

/// Notifications for the host, drained with [`FloorPlanCanvas::take_events`]
#[derive(Clone, Debug, PartialEq)]
pub enum CanvasEvent {
    RoomClicked { guid: String, modifier: bool },
    SelectionChanged(Vec<String>),
    FloorBoundsChanged(Bounds),
}

#[derive(Clone, Copy, Debug)]
struct Pointer {
    pressed_at: Option<Point2<f64>>,
    last: Point2<f64>,
    modifier: bool,
    dragging: bool,
}

impl Default for Pointer {
    fn default() -> Self {
        Self {
            pressed_at: None,
            last: Point2::origin(),
            modifier: false,
            dragging: false,
        }
    }
}

pub struct FloorPlanCanvas {
    config: CanvasConfig,
    floors: Arc<FloorGeometryMap>,
    current_floor: Option<String>,
    /// Room GUID -> index into the current floor's polygons
    room_lookup: FxHashMap<String, usize>,
    room_colors: FxHashMap<String, Color>,
    selected: Vec<String>,
    hovered: Option<String>,
    view: ViewTransform,
    width: f64,
    height: f64,
    color_coding: bool,
    professional: bool,
    pointer: Pointer,
    events: Vec<CanvasEvent>,
}

impl Default for FloorPlanCanvas {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl FloorPlanCanvas {
    pub fn new(config: CanvasConfig) -> Self {
        let view = ViewTransform::new(config.pixels_per_meter);
        Self {
            color_coding: config.color_coding,
            professional: config.professional_style && !config.color_coding,
            config,
            floors: Arc::new(FloorGeometryMap::new()),
            current_floor: None,
            room_lookup: FxHashMap::default(),
            room_colors: FxHashMap::default(),
            selected: Vec::new(),
            hovered: None,
            view,
            width: 800.0,
            height: 600.0,
            pointer: Pointer::default(),
            events: Vec::new(),
        }
    }

    // --- floors -------------------------------------------------------------

    /// Share a new floor map; no floor is current afterwards
    pub fn set_floor_geometries(&mut self, floors: Arc<FloorGeometryMap>) {
        self.floors = floors;
        self.current_floor = None;
        self.room_lookup.clear();
        self.room_colors.clear();
        self.hovered = None;
        self.set_selection_internal(Vec::new());
    }

    /// Switch floors; unknown ids are ignored and return false
    pub fn set_current_floor(&mut self, floor_id: &str) -> bool {
        let Some(floor) = self.floors.get(floor_id) else {
            log::debug!("Unknown floor {floor_id}");
            return false;
        };

        self.room_lookup = floor
            .room_polygons
            .iter()
            .enumerate()
            .map(|(i, p)| (p.space_guid().to_string(), i))
            .collect();
        self.current_floor = Some(floor_id.to_string());
        self.hovered = None;

        let kept: Vec<String> = self
            .selected
            .iter()
            .filter(|g| self.room_lookup.contains_key(*g))
            .cloned()
            .collect();
        self.set_selection_internal(kept);

        self.regenerate_colors();
        self.zoom_to_fit();
        true
    }

    pub fn floors(&self) -> &Arc<FloorGeometryMap> {
        &self.floors
    }

    pub fn current_floor_id(&self) -> Option<&str> {
        self.current_floor.as_deref()
    }

    pub fn current_floor(&self) -> Option<&FloorGeometry> {
        self.current_floor
            .as_deref()
            .and_then(|id| self.floors.get(id))
    }

    fn rooms(&self) -> &[Polygon2D] {
        self.current_floor()
            .map(|f| f.room_polygons.as_slice())
            .unwrap_or(&[])
    }

    fn room(&self, guid: &str) -> Option<&Polygon2D> {
        let index = *self.room_lookup.get(guid)?;
        self.rooms().get(index)
    }

    // --- selection ----------------------------------------------------------

    fn set_selection_internal(&mut self, selection: Vec<String>) {
        if selection != self.selected {
            self.selected = selection;
            self.events
                .push(CanvasEvent::SelectionChanged(self.selected.clone()));
        }
    }

    /// Select exactly these rooms; GUIDs not on the current floor are ignored
    pub fn highlight_rooms<S: AsRef<str>>(&mut self, guids: &[S]) {
        let mut selection: Vec<String> = Vec::with_capacity(guids.len());
        for guid in guids {
            let guid: &str = guid.as_ref();
            if self.room_lookup.contains_key(guid) && !selection.iter().any(|s| s == guid) {
                selection.push(guid.to_string());
            }
        }
        self.set_selection_internal(selection);
    }

    pub fn clear_selection(&mut self) {
        self.set_selection_internal(Vec::new());
    }

    pub fn selected_rooms(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, guid: &str) -> bool {
        self.selected.iter().any(|s| s == guid)
    }

    pub fn hovered_room(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    // --- view ---------------------------------------------------------------

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn zoom(&self) -> f64 {
        self.view.zoom
    }

    pub fn viewport(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Viewport size in pixels; non-positive sizes are ignored
    pub fn resize(&mut self, width: f64, height: f64) {
        if width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite() {
            self.width = width;
            self.height = height;
        }
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.config.min_zoom, self.config.max_zoom)
    }

    /// Fit the current floor into the viewport
    pub fn zoom_to_fit(&mut self) {
        let Some(bounds) = self.current_floor().and_then(|f| {
            f.bounds.or_else(|| {
                f.room_polygons
                    .iter()
                    .map(Polygon2D::bounds)
                    .reduce(|a, b| a.union(&b))
            })
        }) else {
            return;
        };
        self.fit_bounds(&bounds);
        self.events.push(CanvasEvent::FloorBoundsChanged(bounds));
    }

    /// Fit the named rooms; false if none of them is on the current floor
    pub fn zoom_to_rooms<S: AsRef<str>>(&mut self, guids: &[S]) -> bool {
        let bounds = guids
            .iter()
            .filter_map(|g| self.room(g.as_ref()))
            .map(Polygon2D::bounds)
            .reduce(|a, b| a.union(&b));
        match bounds {
            Some(bounds) => {
                self.fit_bounds(&bounds);
                true
            }
            None => false,
        }
    }

    pub fn zoom_to_selection(&mut self) -> bool {
        let selected = self.selected.clone();
        self.zoom_to_rooms(selected.as_slice())
    }

    /// Largest zoom showing `bounds` (padded, minimum extent) inside the
    /// viewport margins, centered; depends only on bounds and viewport
    fn fit_bounds(&mut self, bounds: &Bounds) {
        let padding = 1.0 + self.config.fit_padding;
        let w = (bounds.width() * padding).max(self.config.min_fit_extent);
        let h = (bounds.height() * padding).max(self.config.min_fit_extent);
        let avail_w = (self.width - 2.0 * self.config.fit_margin).max(1.0);
        let avail_h = (self.height - 2.0 * self.config.fit_margin).max(1.0);

        let ppm = self.view.pixels_per_meter;
        let zoom = self.clamp_zoom((avail_w / (w * ppm)).min(avail_h / (h * ppm)));
        let center = bounds.center();
        self.view
            .center_on(center.x(), center.y(), zoom, self.width, self.height);
    }

    /// Multiply zoom by `factor` keeping the floor point under `cursor` fixed
    pub fn zoom_at(&mut self, cursor: Point2<f64>, factor: f64) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let zoom = self.clamp_zoom(self.view.zoom * factor);
        if zoom != self.view.zoom {
            self.view.zoom_about(&cursor, zoom);
        }
    }

    /// Mouse wheel; positive steps zoom in
    pub fn wheel(&mut self, cursor: Point2<f64>, steps: f64) {
        self.zoom_at(cursor, self.config.wheel_factor.powf(steps));
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        self.view.pan.x += dx;
        self.view.pan.y += dy;
    }

    // --- styles -------------------------------------------------------------

    pub fn enable_ns3940_color_coding(&mut self, enabled: bool) {
        self.color_coding = enabled;
        if enabled {
            self.professional = false;
        }
        self.regenerate_colors();
    }

    /// Architectural style: unfilled rooms with black borders
    pub fn set_professional_style(&mut self, enabled: bool) {
        self.professional = enabled;
        if enabled {
            self.color_coding = false;
        }
        self.regenerate_colors();
    }

    pub fn is_color_coding(&self) -> bool {
        self.color_coding
    }

    pub fn is_professional_style(&self) -> bool {
        self.professional
    }

    fn regenerate_colors(&mut self) {
        self.room_colors.clear();
        if !self.color_coding {
            return;
        }
        let colors: FxHashMap<String, Color> = self
            .rooms()
            .iter()
            .map(|p| (p.space_guid().to_string(), colors::room_color(p.space_name())))
            .collect();
        self.room_colors = colors;
    }

    // --- hit testing and pointer --------------------------------------------

    /// Room under a screen position; first match in floor order wins
    pub fn room_at(&self, screen: Point2<f64>) -> Option<&str> {
        let p = self.view.screen_to_floor(&screen);
        let visible = self.view.visible_floor_bounds(self.width, self.height);
        self.rooms()
            .iter()
            .filter(|room| {
                let bounds = room.bounds();
                bounds.intersects(&visible) && bounds.contains(p.x, p.y)
            })
            .find(|room| room.contains_xy(p.x, p.y))
            .map(Polygon2D::space_guid)
    }

    pub fn mouse_press(&mut self, position: Point2<f64>, modifier: bool) {
        self.pointer = Pointer {
            pressed_at: Some(position),
            last: position,
            modifier,
            dragging: false,
        };
    }

    pub fn mouse_move(&mut self, position: Point2<f64>) {
        let Some(start) = self.pointer.pressed_at else {
            let hovered = self.room_at(position).map(str::to_string);
            self.hovered = hovered;
            return;
        };

        if !self.pointer.dragging
            && nalgebra::distance(&start, &position) > self.config.drag_threshold
        {
            self.pointer.dragging = true;
            self.hovered = None;
        }
        if self.pointer.dragging {
            let delta = position - self.pointer.last;
            self.pan_by(delta.x, delta.y);
        }
        self.pointer.last = position;
    }

    pub fn mouse_release(&mut self, position: Point2<f64>) {
        let pointer = std::mem::take(&mut self.pointer);
        if pointer.pressed_at.is_some() && !pointer.dragging {
            self.click(position, pointer.modifier);
        }
    }

    pub fn mouse_leave(&mut self) {
        self.hovered = None;
        self.pointer = Pointer::default();
    }

    /// Plain click replaces the selection (or clears it on empty space);
    /// modifier-click toggles the hit room
    fn click(&mut self, position: Point2<f64>, modifier: bool) {
        let hit = self.room_at(position).map(str::to_string);
        match (hit, modifier) {
            (Some(guid), false) => {
                self.events.push(CanvasEvent::RoomClicked {
                    guid: guid.clone(),
                    modifier,
                });
                self.set_selection_internal(vec![guid]);
            }
            (Some(guid), true) => {
                self.events.push(CanvasEvent::RoomClicked {
                    guid: guid.clone(),
                    modifier,
                });
                let mut selection = self.selected.clone();
                match selection.iter().position(|s| *s == guid) {
                    Some(pos) => {
                        selection.remove(pos);
                    }
                    None => selection.push(guid),
                }
                self.set_selection_internal(selection);
            }
            (None, false) => self.clear_selection(),
            (None, true) => {}
        }
    }

    pub fn take_events(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.events)
    }

    // --- painting -----------------------------------------------------------

    fn room_style(&self, room: &Polygon2D) -> (Option<Color>, Stroke) {
        let guid = room.space_guid();
        let selected = self.is_selected(guid);
        let hovered = self.hovered.as_deref() == Some(guid);

        if selected {
            let fill = if self.professional {
                SELECTED_FILL.lighter(0.6)
            } else {
                SELECTED_FILL
            };
            return (Some(fill), Stroke::solid(SELECTED_BORDER, 2.5));
        }

        let base = if self.professional {
            None
        } else if self.color_coding {
            Some(self.room_colors.get(guid).copied().unwrap_or(colors::NEUTRAL))
        } else {
            Some(DEFAULT_FILL)
        };
        let fill = if hovered {
            Some(SELECTED_FILL.lighter(0.7))
        } else {
            base
        };
        let stroke = if self.professional {
            Stroke::solid(Color::BLACK, 1.5)
        } else {
            Stroke::solid(DEFAULT_BORDER, 1.0)
        };
        (fill, stroke)
    }

    /// Render the current floor; the canvas state is only read
    pub fn paint(&self, painter: &mut dyn Painter) {
        painter.begin(self.width, self.height, BACKGROUND);

        let Some(floor) = self.current_floor() else {
            painter.draw_text(
                Point2::new(self.width / 2.0, self.height / 2.0),
                "No floor selected",
                &TextStyle {
                    color: OUTLINE,
                    size: 14.0,
                    bold: false,
                },
            );
            painter.end();
            return;
        };

        let to_screen = |p: &Polygon2D| -> Vec<Point2<f64>> {
            p.points()
                .iter()
                .map(|pt| self.view.floor_to_screen(pt.x(), pt.y()))
                .collect()
        };

        if let Some(outline) = &floor.building_outline {
            painter.stroke_polygon(
                &to_screen(outline),
                Stroke {
                    color: OUTLINE,
                    width: 1.0,
                    dashed: true,
                },
            );
        }

        let visible_bounds = self.view.visible_floor_bounds(self.width, self.height);
        let visible: Vec<&Polygon2D> = floor
            .room_polygons
            .iter()
            .filter(|room| room.bounds().intersects(&visible_bounds))
            .collect();

        for &room in &visible {
            let points = to_screen(room);
            let (fill, stroke) = self.room_style(room);
            if let Some(fill) = fill {
                painter.fill_polygon(&points, fill);
            }
            painter.stroke_polygon(&points, stroke);
        }

        for label in labels::layout_labels(&visible, &self.view, &self.config) {
            let line_height = label.font_size * 1.2;
            let top = label.anchor.y - line_height * (label.lines.len() as f64 - 1.0) / 2.0;
            for (i, line) in label.lines.iter().enumerate() {
                let style = TextStyle {
                    color: LABEL,
                    size: label.font_size,
                    bold: i == 0 && labels::room_number(line).is_some(),
                };
                painter.draw_text(
                    Point2::new(label.anchor.x, top + line_height * i as f64),
                    line,
                    &style,
                );
            }
        }

        painter.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::floor::FloorLevel;
    use approx::assert_relative_eq;

    fn rect(guid: &str, name: &str, x: f64, y: f64, w: f64, h: f64) -> Polygon2D {
        Polygon2D::from_coords(&[(x, y), (x + w, y), (x + w, y + h), (x, y + h)], guid, name)
            .unwrap()
    }

    fn floors() -> Arc<FloorGeometryMap> {
        let mut map = FloorGeometryMap::new();
        map.insert(
            "ground".into(),
            FloorGeometry::new(
                FloorLevel::new("ground", "Plan 1", 0.0, Vec::new()).unwrap(),
                vec![
                    rect("k1", "101 Kontor", 0.0, 0.0, 5.0, 4.0),
                    rect("k2", "102 Møterom", 5.0, 0.0, 5.0, 4.0),
                ],
                None,
            ),
        );
        map.insert(
            "first".into(),
            FloorGeometry::new(
                FloorLevel::new("first", "Plan 2", 3.5, Vec::new()).unwrap(),
                vec![rect("s1", "201 Stue", 0.0, 0.0, 6.0, 5.0)],
                None,
            ),
        );
        Arc::new(map)
    }

    fn canvas() -> FloorPlanCanvas {
        let mut canvas = FloorPlanCanvas::default();
        canvas.set_floor_geometries(floors());
        assert!(canvas.set_current_floor("ground"));
        canvas.take_events();
        canvas
    }

    fn screen_of(canvas: &FloorPlanCanvas, x: f64, y: f64) -> Point2<f64> {
        canvas.view().floor_to_screen(x, y)
    }

    #[test]
    fn test_zoom_to_fit_is_idempotent() {
        let mut c = canvas();
        c.zoom_to_fit();
        let first = *c.view();
        c.zoom_to_fit();
        assert_eq!(*c.view(), first);
    }

    #[test]
    fn test_zoom_to_fit_centers_floor() {
        let c = canvas();
        let center = screen_of(&c, 5.0, 2.0);
        assert_relative_eq!(center.x, 400.0, epsilon = 1e-9);
        assert_relative_eq!(center.y, 300.0, epsilon = 1e-9);
        // 10 m * 1.15 padding across 760 px available
        assert_relative_eq!(c.zoom(), 760.0 / (11.5 * 20.0), epsilon = 1e-9);
    }

    #[test]
    fn test_unknown_floor_rejected() {
        let mut c = canvas();
        assert!(!c.set_current_floor("basement"));
        assert_eq!(c.current_floor_id(), Some("ground"));
    }

    #[test]
    fn test_selection_cleared_on_floor_switch() {
        let mut c = canvas();
        c.highlight_rooms(&["k1", "k2"]);
        assert_eq!(c.selected_rooms(), ["k1", "k2"]);
        assert!(c.set_current_floor("first"));
        assert!(c.selected_rooms().is_empty());
        let events = c.take_events();
        assert!(events.contains(&CanvasEvent::SelectionChanged(Vec::new())));
    }

    #[test]
    fn test_click_and_modifier_click() {
        let mut c = canvas();
        let k1 = screen_of(&c, 2.0, 2.0);
        let k2 = screen_of(&c, 7.0, 2.0);

        c.mouse_press(k1, false);
        c.mouse_release(k1);
        assert_eq!(c.selected_rooms(), ["k1"]);
        assert_eq!(
            c.take_events(),
            [
                CanvasEvent::RoomClicked {
                    guid: "k1".into(),
                    modifier: false
                },
                CanvasEvent::SelectionChanged(vec!["k1".into()]),
            ]
        );

        c.mouse_press(k2, true);
        c.mouse_release(k2);
        assert_eq!(c.selected_rooms(), ["k1", "k2"]);

        c.mouse_press(k1, true);
        c.mouse_release(k1);
        assert_eq!(c.selected_rooms(), ["k2"]);

        let outside = screen_of(&c, 20.0, 20.0);
        c.mouse_press(outside, true);
        c.mouse_release(outside);
        assert_eq!(c.selected_rooms(), ["k2"]);

        c.mouse_press(outside, false);
        c.mouse_release(outside);
        assert!(c.selected_rooms().is_empty());
    }

    #[test]
    fn test_drag_pans_without_selecting() {
        let mut c = canvas();
        let start = screen_of(&c, 2.0, 2.0);
        let pan_before = c.view().pan;
        c.mouse_move(start);
        assert_eq!(c.hovered_room(), Some("k1"));

        c.mouse_press(start, false);
        let end = start + nalgebra::Vector2::new(50.0, 10.0);
        c.mouse_move(end);
        assert_eq!(c.hovered_room(), None);
        c.mouse_release(end);

        assert!(c.selected_rooms().is_empty());
        assert_relative_eq!(c.view().pan.x, pan_before.x + 50.0);
        assert_relative_eq!(c.view().pan.y, pan_before.y + 10.0);
    }

    #[test]
    fn test_non_finite_pan_ignored() {
        let mut c = canvas();
        let before = c.view().pan;
        c.pan_by(f64::NAN, 5.0);
        c.pan_by(3.0, f64::INFINITY);
        assert_eq!(c.view().pan, before);
        c.pan_by(3.0, -2.0);
        assert_relative_eq!(c.view().pan.x, before.x + 3.0);
        assert_relative_eq!(c.view().pan.y, before.y - 2.0);
    }

    #[test]
    fn test_wheel_zoom_respects_limits() {
        let mut c = canvas();
        let cursor = Point2::new(100.0, 100.0);
        c.wheel(cursor, 100.0);
        assert_relative_eq!(c.zoom(), 10.0);
        c.wheel(cursor, -200.0);
        assert_relative_eq!(c.zoom(), 0.1);
    }

    #[test]
    fn test_zoom_to_rooms() {
        let mut c = canvas();
        assert!(!c.zoom_to_rooms(&["nope"]));
        assert!(!c.zoom_to_selection());
        c.highlight_rooms(&["k2"]);
        assert!(c.zoom_to_selection());
        let center = screen_of(&c, 7.5, 2.0);
        assert_relative_eq!(center.x, 400.0, epsilon = 1e-9);
        assert_relative_eq!(center.y, 300.0, epsilon = 1e-9);
    }

    #[test]
    fn test_styles_are_exclusive() {
        let mut c = canvas();
        assert!(c.is_color_coding());
        c.set_professional_style(true);
        assert!(c.is_professional_style());
        assert!(!c.is_color_coding());
        c.enable_ns3940_color_coding(true);
        assert!(!c.is_professional_style());
    }

    #[test]
    fn test_paint_draws_rooms_and_labels() {
        let c = canvas();
        let mut list = DisplayList::new();
        c.paint(&mut list);
        assert_eq!(list.fills().count(), 2);
        let texts: Vec<&str> = list.texts().collect();
        assert!(texts.contains(&"101"));
        assert!(texts.contains(&"Kont."));
    }

    #[test]
    fn test_professional_paint_has_no_fill() {
        let mut c = canvas();
        c.set_professional_style(true);
        let mut list = DisplayList::new();
        c.paint(&mut list);
        assert_eq!(list.fills().count(), 0);
        assert!(list
            .strokes()
            .any(|(_, stroke)| stroke.color == Color::BLACK));
    }
}
