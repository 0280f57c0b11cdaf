// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor model: levels, per-floor geometry and the view/selection state

use crate::error::GeometryError;
use crate::geometry::{Bounds, Point2D, Polygon2D};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Floor id -> extracted geometry
pub type FloorGeometryMap = BTreeMap<String, FloorGeometry>;

/// One building storey (or inferred elevation cluster)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloorLevel {
    pub id: String,
    pub name: String,
    /// Meters
    pub elevation: f64,
    spaces: Vec<String>,
}

impl FloorLevel {
    /// Space GUIDs are de-duplicated, first occurrence wins
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        elevation: f64,
        spaces: Vec<String>,
    ) -> Result<Self, GeometryError> {
        if !elevation.is_finite() {
            return Err(GeometryError::NonFiniteElevation(elevation));
        }
        let mut level = Self {
            id: id.into(),
            name: name.into(),
            elevation,
            spaces: Vec::with_capacity(spaces.len()),
        };
        for guid in spaces {
            level.add_space(guid);
        }
        Ok(level)
    }

    pub fn spaces(&self) -> &[String] {
        &self.spaces
    }

    /// Returns false if the space was already present
    pub fn add_space(&mut self, guid: impl Into<String>) -> bool {
        let guid = guid.into();
        if self.contains_space(&guid) {
            return false;
        }
        self.spaces.push(guid);
        true
    }

    pub fn remove_space(&mut self, guid: &str) -> bool {
        match self.spaces.iter().position(|s| s == guid) {
            Some(pos) => {
                self.spaces.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains_space(&self, guid: &str) -> bool {
        self.spaces.iter().any(|s| s == guid)
    }

    pub fn space_count(&self) -> usize {
        self.spaces.len()
    }
}

/// Rooms extracted for one floor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloorGeometry {
    pub level: FloorLevel,
    pub room_polygons: Vec<Polygon2D>,
    pub bounds: Option<Bounds>,
    #[serde(default)]
    pub building_outline: Option<Polygon2D>,
}

impl FloorGeometry {
    /// Bounds are computed from the polygons when `None`; polygon GUIDs
    /// missing from the level are appended to it
    pub fn new(mut level: FloorLevel, room_polygons: Vec<Polygon2D>, bounds: Option<Bounds>) -> Self {
        for polygon in &room_polygons {
            level.add_space(polygon.space_guid());
        }
        let bounds = bounds.or_else(|| {
            room_polygons
                .iter()
                .map(Polygon2D::bounds)
                .reduce(|a, b| a.union(&b))
        });
        Self {
            level,
            room_polygons,
            bounds,
            building_outline: None,
        }
    }

    pub fn with_building_outline(mut self, outline: Option<Polygon2D>) -> Self {
        self.building_outline = outline;
        self
    }

    pub fn id(&self) -> &str {
        &self.level.id
    }

    /// First room containing `point`
    pub fn find_room_at_point(&self, point: &Point2D) -> Option<&Polygon2D> {
        self.room_polygons.iter().find(|p| p.contains_point(point))
    }

    pub fn get_room_by_guid(&self, guid: &str) -> Option<&Polygon2D> {
        self.room_polygons.iter().find(|p| p.space_guid() == guid)
    }

    /// Sum of room polygon areas in m²
    pub fn get_total_area(&self) -> f64 {
        self.room_polygons.iter().map(Polygon2D::area).sum()
    }

    pub fn get_room_count(&self) -> usize {
        self.room_polygons.len()
    }

    pub fn room_guids(&self) -> impl Iterator<Item = &str> {
        self.room_polygons.iter().map(Polygon2D::space_guid)
    }
}

/// Application-level selection and view state
#[derive(Clone, Debug)]
pub struct FloorPlanState {
    current_floor: Option<String>,
    selected: Vec<String>,
    zoom_level: f64,
    view_bounds: Option<Bounds>,
    floors: Arc<FloorGeometryMap>,
}

impl Default for FloorPlanState {
    fn default() -> Self {
        Self {
            current_floor: None,
            selected: Vec::new(),
            zoom_level: 1.0,
            view_bounds: None,
            floors: Arc::new(FloorGeometryMap::new()),
        }
    }
}

impl FloorPlanState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the floor map; the current floor and selection are reset
    pub fn set_floor_geometries(&mut self, floors: Arc<FloorGeometryMap>) {
        self.floors = floors;
        self.current_floor = None;
        self.selected.clear();
        self.view_bounds = None;
    }

    pub fn floors(&self) -> &Arc<FloorGeometryMap> {
        &self.floors
    }

    /// Unknown ids leave the state untouched and return false. Selected
    /// rooms not on the new floor are dropped.
    pub fn set_current_floor(&mut self, floor_id: &str) -> bool {
        let Some(floor) = self.floors.get(floor_id) else {
            return false;
        };
        self.selected
            .retain(|guid| floor.get_room_by_guid(guid).is_some() || floor.level.contains_space(guid));
        self.current_floor = Some(floor_id.to_string());
        self.view_bounds = floor.bounds;
        true
    }

    pub fn current_floor_id(&self) -> Option<&str> {
        self.current_floor.as_deref()
    }

    pub fn current_floor(&self) -> Option<&FloorGeometry> {
        self.current_floor
            .as_deref()
            .and_then(|id| self.floors.get(id))
    }

    pub fn selected_rooms(&self) -> &[String] {
        &self.selected
    }

    /// Add to the selection; false if already selected
    pub fn select_room(&mut self, guid: &str) -> bool {
        if self.is_selected(guid) {
            return false;
        }
        self.selected.push(guid.to_string());
        true
    }

    /// Returns whether the room is selected afterwards
    pub fn toggle_room(&mut self, guid: &str) -> bool {
        if let Some(pos) = self.selected.iter().position(|s| s == guid) {
            self.selected.remove(pos);
            false
        } else {
            self.selected.push(guid.to_string());
            true
        }
    }

    pub fn set_selection<I, S>(&mut self, guids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected.clear();
        for guid in guids {
            let guid = guid.into();
            if !self.is_selected(&guid) {
                self.selected.push(guid);
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, guid: &str) -> bool {
        self.selected.iter().any(|s| s == guid)
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom_level
    }

    /// Rejects non-positive and non-finite zoom
    pub fn set_zoom_level(&mut self, zoom: f64) -> bool {
        if zoom.is_finite() && zoom > 0.0 {
            self.zoom_level = zoom;
            true
        } else {
            false
        }
    }

    pub fn view_bounds(&self) -> Option<Bounds> {
        self.view_bounds
    }

    pub fn set_view_bounds(&mut self, bounds: Option<Bounds>) {
        self.view_bounds = bounds;
    }

    /// Floors sorted by ascending elevation, ties by id
    pub fn floors_by_elevation(&self) -> Vec<&FloorGeometry> {
        let mut floors: Vec<&FloorGeometry> = self.floors.values().collect();
        floors.sort_by(|a, b| {
            a.level
                .elevation
                .total_cmp(&b.level.elevation)
                .then_with(|| a.level.id.cmp(&b.level.id))
        });
        floors
    }
}
