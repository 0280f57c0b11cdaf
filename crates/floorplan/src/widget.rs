// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor selector and canvas glue
//!
//! [`FloorPlanWidget`] keeps a [`FloorPlanState`] in step with the canvas:
//! hosts forward input to [`FloorPlanWidget::canvas_mut`] and call
//! [`FloorPlanWidget::process_events`] afterwards.

use crate::canvas::{CanvasEvent, FloorPlanCanvas};
use crate::config::CanvasConfig;
use crate::floor::{FloorGeometryMap, FloorPlanState};
use std::sync::Arc;

/// One row of the floor selector
#[derive(Clone, Debug, PartialEq)]
pub struct FloorEntry {
    pub id: String,
    pub name: String,
    pub elevation: f64,
    pub room_count: usize,
}

impl FloorEntry {
    /// `"Plan 1 (+3.50 m, 12 rooms)"`
    pub fn display_label(&self) -> String {
        format!(
            "{} ({:+.2} m, {} rooms)",
            self.name, self.elevation, self.room_count
        )
    }
}

pub struct FloorPlanWidget {
    canvas: FloorPlanCanvas,
    state: FloorPlanState,
}

impl Default for FloorPlanWidget {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl FloorPlanWidget {
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            canvas: FloorPlanCanvas::new(config),
            state: FloorPlanState::new(),
        }
    }

    /// Show a new floor map, starting on the lowest floor
    pub fn load(&mut self, floors: FloorGeometryMap) {
        let floors = Arc::new(floors);
        self.state.set_floor_geometries(Arc::clone(&floors));
        self.canvas.set_floor_geometries(floors);

        let lowest = self
            .state
            .floors_by_elevation()
            .first()
            .map(|f| f.id().to_string());
        match lowest {
            Some(id) => {
                self.select_floor(&id);
            }
            None => log::info!("Loaded an empty floor map"),
        }
        self.process_events();
    }

    pub fn canvas(&self) -> &FloorPlanCanvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut FloorPlanCanvas {
        &mut self.canvas
    }

    pub fn state(&self) -> &FloorPlanState {
        &self.state
    }

    /// Selector rows, lowest floor first
    pub fn floor_entries(&self) -> Vec<FloorEntry> {
        self.state
            .floors_by_elevation()
            .into_iter()
            .map(|f| FloorEntry {
                id: f.id().to_string(),
                name: f.level.name.clone(),
                elevation: f.level.elevation,
                room_count: f.get_room_count(),
            })
            .collect()
    }

    pub fn select_floor(&mut self, floor_id: &str) -> bool {
        if !self.canvas.set_current_floor(floor_id) {
            return false;
        }
        self.state.set_current_floor(floor_id);
        self.sync_view();
        true
    }

    fn step_floor(&mut self, offset: isize) -> bool {
        let entries = self.floor_entries();
        let Some(current) = self
            .state
            .current_floor_id()
            .and_then(|id| entries.iter().position(|e| e.id == id))
        else {
            return false;
        };
        let Some(target) = current
            .checked_add_signed(offset)
            .and_then(|i| entries.get(i))
        else {
            return false;
        };
        let id = target.id.clone();
        self.select_floor(&id)
    }

    /// Move one floor up; false on the top floor
    pub fn next_floor(&mut self) -> bool {
        self.step_floor(1)
    }

    pub fn previous_floor(&mut self) -> bool {
        self.step_floor(-1)
    }

    fn sync_view(&mut self) {
        self.state.set_zoom_level(self.canvas.zoom());
        let (w, h) = self.canvas.viewport();
        self.state
            .set_view_bounds(Some(self.canvas.view().visible_floor_bounds(w, h)));
    }

    /// Drain canvas events into the state and hand them to the host
    pub fn process_events(&mut self) -> Vec<CanvasEvent> {
        let events = self.canvas.take_events();
        for event in &events {
            match event {
                CanvasEvent::SelectionChanged(selection) => {
                    self.state.set_selection(selection.iter().cloned());
                }
                CanvasEvent::RoomClicked { guid, modifier } => {
                    log::debug!("Room {guid} clicked (modifier: {modifier})");
                }
                CanvasEvent::FloorBoundsChanged(_) => {}
            }
        }
        self.sync_view();
        events
    }

    /// Select rooms programmatically, e.g. from a search result list
    pub fn highlight_rooms<S: AsRef<str>>(&mut self, guids: &[S]) -> Vec<CanvasEvent> {
        self.canvas.highlight_rooms(guids);
        self.process_events()
    }

    pub fn toggle_color_coding(&mut self) -> bool {
        let enabled = !self.canvas.is_color_coding();
        self.canvas.enable_ns3940_color_coding(enabled);
        enabled
    }

    pub fn toggle_professional_style(&mut self) -> bool {
        let enabled = !self.canvas.is_professional_style();
        self.canvas.set_professional_style(enabled);
        enabled
    }

    /// One-line summary for a status bar
    pub fn status_text(&self) -> String {
        let Some(floor) = self.state.current_floor() else {
            return "No floor loaded".to_string();
        };
        let selected = self.state.selected_rooms();
        let mut text = format!(
            "{}: {} rooms, {:.1} m² | zoom {:.0}%",
            floor.level.name,
            floor.get_room_count(),
            floor.get_total_area(),
            self.canvas.zoom() * 100.0
        );
        match selected {
            [] => {}
            [guid] => {
                if let Some(room) = floor.get_room_by_guid(guid) {
                    text.push_str(&format!(
                        " | {} ({:.1} m²)",
                        room.space_name(),
                        room.area()
                    ));
                }
            }
            many => {
                let area: f64 = many
                    .iter()
                    .filter_map(|g| floor.get_room_by_guid(g))
                    .map(|r| r.area())
                    .sum();
                text.push_str(&format!(" | {} selected ({area:.1} m²)", many.len()));
            }
        }
        text
    }
}
