// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tunables for extraction and rendering
//!
//! Every field has a default, so a config file only needs the values it
//! overrides:
//!
//! ```json
//! { "extraction": { "cluster_tolerance": 0.3 }, "canvas": { "max_zoom": 20.0 } }
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorPlanConfig {
    pub extraction: ExtractionConfig,
    pub canvas: CanvasConfig,
}

impl FloorPlanConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.extraction.validate()?;
        self.canvas.validate()
    }
}

/// Geometry extractor settings; lengths in meters unless noted
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Progressive mode when the model has more spaces than this
    pub progressive_space_threshold: usize,
    /// ... or more storeys than this
    pub progressive_storey_threshold: usize,
    /// Spaces per progress report within a floor
    pub space_chunk_size: usize,
    /// Upper bound of the adaptive floor batch
    pub max_floor_batch: usize,
    /// Vertices farther than this from the mean Z are not projected
    pub z_band: f64,
    pub dedup_tolerance: f64,
    /// Elevation band used to group spaces when no storeys exist
    pub cluster_tolerance: f64,
    /// Orphans farther than this from every floor go to "Unassigned Spaces"
    pub orphan_max_distance: f64,
    pub unassigned_elevation_offset: f64,
    pub min_room_area: f64,
    pub max_room_area: f64,
    pub min_room_extent: f64,
    pub max_room_extent: f64,
    /// Edge length of the generic placeholder square some exporters emit
    pub placeholder_size: f64,
    pub max_placement_depth: usize,
    /// Adjacent floors closer than this are reported as probable duplicates
    pub duplicate_floor_gap: f64,
    /// ... and farther apart than this as a probable data error
    pub large_floor_gap: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            progressive_space_threshold: 100,
            progressive_storey_threshold: 10,
            space_chunk_size: 20,
            max_floor_batch: 5,
            z_band: 0.5,
            dedup_tolerance: 0.001,
            cluster_tolerance: 0.5,
            orphan_max_distance: 2.0,
            unassigned_elevation_offset: 3.0,
            min_room_area: 0.5,
            max_room_area: 10_000.0,
            min_room_extent: 0.5,
            max_room_extent: 500.0,
            placeholder_size: 1.0,
            max_placement_depth: 32,
            duplicate_floor_gap: 0.1,
            large_floor_gap: 10.0,
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be positive, got {value}")))
    }
}

fn non_zero(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::invalid(field, "must be at least 1"))
    } else {
        Ok(())
    }
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_zero("space_chunk_size", self.space_chunk_size)?;
        non_zero("max_floor_batch", self.max_floor_batch)?;
        non_zero("max_placement_depth", self.max_placement_depth)?;
        positive("z_band", self.z_band)?;
        positive("cluster_tolerance", self.cluster_tolerance)?;
        positive("orphan_max_distance", self.orphan_max_distance)?;
        positive("min_room_area", self.min_room_area)?;
        positive("min_room_extent", self.min_room_extent)?;
        if !(self.dedup_tolerance.is_finite() && self.dedup_tolerance >= 0.0) {
            return Err(ConfigError::invalid("dedup_tolerance", "must be >= 0"));
        }
        if self.max_room_area <= self.min_room_area {
            return Err(ConfigError::invalid("max_room_area", "must exceed min_room_area"));
        }
        if self.max_room_extent <= self.min_room_extent {
            return Err(ConfigError::invalid(
                "max_room_extent",
                "must exceed min_room_extent",
            ));
        }
        Ok(())
    }
}

/// Canvas view and label settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Screen pixels per floor meter at zoom 1.0
    pub pixels_per_meter: f64,
    /// Fraction added around the fitted bounds
    pub fit_padding: f64,
    /// Fitted extent never shrinks below this many meters
    pub min_fit_extent: f64,
    /// Pixels kept free on each viewport side when fitting
    pub fit_margin: f64,
    /// No labels below this zoom
    pub label_min_zoom: f64,
    /// Rooms smaller than this many pixels on screen get no label
    pub label_min_screen_size: f64,
    /// Area line shown from this zoom ...
    pub area_label_zoom: f64,
    /// ... or for rooms at least this large (m²)
    pub area_label_min_area: f64,
    /// Labels of rooms below this area (m²) yield to earlier labels
    pub small_room_area: f64,
    /// Label anchor stays this far inside the room bounds (m)
    pub label_margin: f64,
    pub color_coding: bool,
    pub professional_style: bool,
    /// Zoom factor per wheel step
    pub wheel_factor: f64,
    /// Pointer travel (px) separating a drag from a click
    pub drag_threshold: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 10.0,
            pixels_per_meter: 20.0,
            fit_padding: 0.15,
            min_fit_extent: 2.0,
            fit_margin: 20.0,
            label_min_zoom: 0.3,
            label_min_screen_size: 40.0,
            area_label_zoom: 1.5,
            area_label_min_area: 20.0,
            small_room_area: 15.0,
            label_margin: 0.2,
            color_coding: true,
            professional_style: false,
            wheel_factor: 1.15,
            drag_threshold: 4.0,
        }
    }
}

impl CanvasConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("min_zoom", self.min_zoom)?;
        positive("pixels_per_meter", self.pixels_per_meter)?;
        positive("min_fit_extent", self.min_fit_extent)?;
        if !(self.max_zoom.is_finite() && self.max_zoom >= self.min_zoom) {
            return Err(ConfigError::invalid("max_zoom", "must be >= min_zoom"));
        }
        if !(self.wheel_factor.is_finite() && self.wheel_factor > 1.0) {
            return Err(ConfigError::invalid("wheel_factor", "must be greater than 1"));
        }
        if !(self.fit_padding.is_finite() && self.fit_padding >= 0.0) {
            return Err(ConfigError::invalid("fit_padding", "must be >= 0"));
        }
        if self.color_coding && self.professional_style {
            return Err(ConfigError::invalid(
                "professional_style",
                "cannot be combined with color_coding",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(FloorPlanConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            FloorPlanConfig::from_json_str(r#"{"extraction":{"cluster_tolerance":0.3}}"#).unwrap();
        assert_eq!(config.extraction.cluster_tolerance, 0.3);
        assert_eq!(config.extraction.space_chunk_size, 20);
        assert_eq!(config.canvas, CanvasConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = FloorPlanConfig::from_json_str(r#"{"canvas":{"min_zoom":5,"max_zoom":1}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_zoom", .. }));

        let err = FloorPlanConfig::from_json_str(r#"{"extraction":{"space_chunk_size":0}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "space_chunk_size", .. }));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            FloorPlanConfig::from_json_str("{"),
            Err(ConfigError::Json(_))
        ));
    }
}
