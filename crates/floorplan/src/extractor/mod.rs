// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor geometry extraction
//!
//! Turns a loaded [`IfcModel`] into one [`FloorGeometry`] per floor.
//! Extraction is best effort: a space or floor that cannot be processed is
//! logged and skipped, and only a model that yields no floors or no room
//! polygons at all is an error.
//!
//! ```ignore
//! let model = floorplan_step::StepModel::open("house.ifc")?;
//! let mut extractor = GeometryExtractor::new(&model, ExtractionConfig::default());
//! let floors = extractor.extract_floor_geometry(None)?;
//! for floor in floors.values() {
//!     println!("{}: {} rooms", floor.level.name, floor.get_room_count());
//! }
//! ```

pub mod boundaries;
pub mod levels;
pub mod synth;
pub mod validate;

pub use boundaries::{default_strategies, BoundaryError, BoundaryStrategy, SpaceContext};
pub use levels::{validate_space_for_floor_plan, UNASSIGNED_FLOOR_ID, UNASSIGNED_FLOOR_NAME};
pub use validate::validate_polygon;

use crate::config::ExtractionConfig;
use crate::error::ExtractionError;
use crate::floor::{FloorGeometry, FloorGeometryMap, FloorLevel};
use crate::geometry::Polygon2D;
use crate::hull::{convex_hull, dedup_points};
use floorplan_model::{DecodedEntity, EntityId, IfcModel, IfcType, ProgressCallback};
use levels::{space_display_name, space_guid, DetectedLevels, LevelDetector};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeMap;

type Progress<'p, 'cb> = Option<&'p mut ProgressCallback<'cb>>;

fn notify(progress: &mut Option<&mut ProgressCallback<'_>>, message: &str, percent: u8) {
    if let Some(callback) = progress {
        callback(message, percent.min(100));
    }
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done as f64 / total as f64) * 100.0).round().clamp(0.0, 100.0) as u8
}

/// How the last extraction ran
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum ExtractionMode {
    #[default]
    Standard,
    Progressive,
}

/// Outcome counters of the last extraction
#[derive(Clone, Debug, Default, Serialize)]
pub struct ExtractionReport {
    pub mode: ExtractionMode,
    pub floors: usize,
    pub spaces_processed: usize,
    /// Strategy name -> spaces it produced the outline for
    pub tier_successes: BTreeMap<String, usize>,
    pub spaces_without_geometry: Vec<String>,
}

/// Geometry extractor over one model
pub struct GeometryExtractor<'m> {
    model: &'m dyn IfcModel,
    config: ExtractionConfig,
    strategies: Vec<Box<dyn BoundaryStrategy>>,
    /// Space -> its space-boundary relationships
    boundaries: FxHashMap<EntityId, Vec<EntityId>>,
    report: ExtractionReport,
}

impl<'m> GeometryExtractor<'m> {
    pub fn new(model: &'m dyn IfcModel, config: ExtractionConfig) -> Self {
        if let Err(e) = config.validate() {
            log::warn!("Extraction config is out of range, clamping where needed: {e}");
        }
        let resolver = model.resolver();
        let mut boundaries: FxHashMap<EntityId, Vec<EntityId>> = FxHashMap::default();
        for ifc_type in [
            IfcType::IfcRelSpaceBoundary,
            IfcType::IfcRelSpaceBoundary1stLevel,
            IfcType::IfcRelSpaceBoundary2ndLevel,
        ] {
            for rel in resolver.entities_by_type(&ifc_type) {
                if let Some(space) = rel.attr_ref("RelatingSpace") {
                    boundaries.entry(space).or_default().push(rel.id);
                }
            }
        }

        Self {
            model,
            config,
            strategies: default_strategies(),
            boundaries,
            report: ExtractionReport::default(),
        }
    }

    /// Replace the boundary fallback chain
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn BoundaryStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Counters from the most recent [`extract_floor_geometry`](Self::extract_floor_geometry)
    pub fn report(&self) -> &ExtractionReport {
        &self.report
    }

    /// Floors sorted by elevation, with their member space GUIDs
    pub fn get_floor_levels(&self) -> Result<Vec<FloorLevel>, ExtractionError> {
        Ok(LevelDetector::new(self.model, &self.config).detect()?.levels)
    }

    /// Extract every floor; progressive mode kicks in for large models
    pub fn extract_floor_geometry(
        &mut self,
        mut progress: Progress<'_, '_>,
    ) -> Result<FloorGeometryMap, ExtractionError> {
        self.report = ExtractionReport::default();
        notify(&mut progress, "Detecting floor levels", 0);

        let detected = LevelDetector::new(self.model, &self.config).detect()?;
        let resolver = self.model.resolver();
        let space_count = resolver.count_by_type(&IfcType::IfcSpace);
        let storey_count = resolver.count_by_type(&IfcType::IfcBuildingStorey);

        let progressive = space_count > self.config.progressive_space_threshold
            || storey_count > self.config.progressive_storey_threshold;
        log::info!(
            "Extracting {} floors ({space_count} spaces, {storey_count} storeys) in {} mode",
            detected.levels.len(),
            if progressive { "progressive" } else { "standard" }
        );

        let floors = if progressive {
            self.report.mode = ExtractionMode::Progressive;
            self.extract_progressive(&detected, &mut progress)?
        } else {
            self.extract_standard(&detected, &mut progress)?
        };

        if floors.is_empty() {
            return Err(ExtractionError::no_geometry(format!(
                "none of {} floors yielded a room polygon",
                detected.levels.len()
            ))
            .with_spaces(self.report.spaces_without_geometry.clone()));
        }

        self.report.floors = floors.len();
        notify(&mut progress, "Floor extraction complete", 100);
        Ok(floors)
    }

    fn extract_standard(
        &mut self,
        detected: &DetectedLevels,
        progress: &mut Option<&mut ProgressCallback<'_>>,
    ) -> Result<FloorGeometryMap, ExtractionError> {
        let mut floors = FloorGeometryMap::new();
        let total = detected.levels.len();
        for (i, level) in detected.levels.iter().enumerate() {
            notify(
                progress,
                &format!("Processing {} ({}/{total})", level.name, i + 1),
                percent(i, total),
            );
            if let Some(floor) = self.extract_floor(level, &detected.spaces, None)? {
                floors.insert(level.id.clone(), floor);
            }
        }
        Ok(floors)
    }

    fn extract_progressive(
        &mut self,
        detected: &DetectedLevels,
        progress: &mut Option<&mut ProgressCallback<'_>>,
    ) -> Result<FloorGeometryMap, ExtractionError> {
        let total_spaces: usize = detected.levels.iter().map(FloorLevel::space_count).sum();
        let batch = floor_batch_size(
            total_spaces,
            detected.levels.len(),
            self.config.max_floor_batch,
        );
        log::debug!("Progressive extraction in batches of {batch} floors");

        let mut floors = FloorGeometryMap::new();
        let mut done = 0usize;
        for (batch_index, levels) in detected.levels.chunks(batch).enumerate() {
            for level in levels {
                let mut chunk_progress = |processed: usize, message: &str| {
                    notify(progress, message, percent(done + processed, total_spaces));
                };
                if let Some(floor) =
                    self.extract_floor(level, &detected.spaces, Some(&mut chunk_progress))?
                {
                    floors.insert(level.id.clone(), floor);
                }
                done += level.space_count();
            }

            self.model.release_caches();
            log::debug!(
                "Batch {} done, {done}/{total_spaces} spaces, caches released",
                batch_index + 1
            );
        }
        Ok(floors)
    }

    /// Boundaries of one floor; `None` if no room on it has an outline
    fn extract_floor(
        &mut self,
        level: &FloorLevel,
        spaces: &FxHashMap<String, EntityId>,
        mut chunk_progress: Option<&mut dyn FnMut(usize, &str)>,
    ) -> Result<Option<FloorGeometry>, ExtractionError> {
        let resolver = self.model.resolver();
        let mut polygons: Vec<Polygon2D> = Vec::new();
        polygons.try_reserve(level.space_count())?;

        let chunk_size = self.config.space_chunk_size.max(1);
        let total = level.space_count();
        for (chunk_index, chunk) in level.spaces().chunks(chunk_size).enumerate() {
            for guid in chunk {
                self.report.spaces_processed += 1;
                let Some(space) = spaces.get(guid).and_then(|id| resolver.get(*id)) else {
                    log::warn!("Space {guid} on {} could not be decoded", level.name);
                    self.report.spaces_without_geometry.push(guid.clone());
                    continue;
                };
                match self.space_outline(&space) {
                    Some((tier, polygon)) => {
                        *self.report.tier_successes.entry(tier.to_string()).or_default() += 1;
                        polygons.push(polygon);
                    }
                    None => {
                        log::warn!("Space {guid} on {}: no usable outline", level.name);
                        self.report.spaces_without_geometry.push(guid.clone());
                    }
                }
            }
            if let Some(on_chunk) = chunk_progress.as_mut() {
                let processed = ((chunk_index + 1) * chunk_size).min(total);
                on_chunk(
                    processed,
                    &format!("{}: {processed}/{total} spaces", level.name),
                );
            }
        }

        if polygons.is_empty() {
            log::warn!("Floor {} has no room geometry, skipped", level.name);
            return Ok(None);
        }
        polygons.shrink_to_fit();

        let outline = building_outline(&level.id, &polygons, self.config.dedup_tolerance);
        let floor = FloorGeometry::new(level.clone(), polygons, None).with_building_outline(outline);
        log::info!(
            "{}: {} rooms, {:.1} m² at {:.2} m",
            level.name,
            floor.get_room_count(),
            floor.get_total_area(),
            level.elevation
        );
        Ok(Some(floor))
    }

    /// Run the fallback chain; the largest valid candidate of the first
    /// successful strategy is the room outline
    fn space_outline(&self, space: &DecodedEntity) -> Option<(&'static str, Polygon2D)> {
        let guid = space_guid(space);
        let name = space_display_name(space);
        let ctx = SpaceContext {
            model: self.model,
            config: &self.config,
            space,
            guid: &guid,
            name: &name,
            boundaries: self
                .boundaries
                .get(&space.id)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        };

        for strategy in &self.strategies {
            let candidates = match strategy.extract(&ctx) {
                Ok(candidates) => candidates,
                Err(e) => {
                    log::debug!("Space {guid}: {} failed: {e}", strategy.name());
                    continue;
                }
            };

            let total = candidates.len();
            let best = candidates
                .into_iter()
                .filter(|p| match validate::rejection_reason(p, &self.config) {
                    Some(reason) => {
                        log::debug!("Space {guid}: {} candidate rejected, {reason}", strategy.name());
                        false
                    }
                    None => true,
                })
                .max_by(|a, b| a.area().total_cmp(&b.area()));

            match best {
                Some(polygon) => {
                    log::debug!(
                        "Space {guid}: outline from {} ({:.2} m², {total} candidates)",
                        strategy.name(),
                        polygon.area()
                    );
                    return Some((strategy.name(), polygon));
                }
                None => log::debug!("Space {guid}: {} gave no valid outline", strategy.name()),
            }
        }
        None
    }

    /// Outline polygons for one space; empty if every strategy fails
    pub fn extract_space_boundaries(&self, space: &DecodedEntity) -> Vec<Polygon2D> {
        self.space_outline(space)
            .map(|(_, polygon)| vec![polygon])
            .unwrap_or_default()
    }
}

/// Floors per batch, fewer when floors are crowded
fn floor_batch_size(total_spaces: usize, floors: usize, max_batch: usize) -> usize {
    let average = total_spaces / floors.max(1);
    let batch = match average {
        0..=5 => 5,
        6..=10 => 4,
        11..=25 => 3,
        26..=50 => 2,
        _ => 1,
    };
    batch.clamp(1, max_batch.max(1))
}

/// Convex hull of every room vertex on the floor
fn building_outline(floor_id: &str, rooms: &[Polygon2D], tolerance: f64) -> Option<Polygon2D> {
    let vertices: Vec<_> = rooms
        .iter()
        .flat_map(|p| p.vertices().iter().copied())
        .collect();
    let hull = convex_hull(&dedup_points(&vertices, tolerance));
    Polygon2D::new(hull, format!("{floor_id}-outline"), "Building outline").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_size_adapts() {
        assert_eq!(floor_batch_size(20, 10, 5), 5);
        assert_eq!(floor_batch_size(300, 10, 5), 2);
        assert_eq!(floor_batch_size(1000, 10, 5), 1);
        assert_eq!(floor_batch_size(20, 10, 3), 3);
        assert_eq!(floor_batch_size(0, 0, 5), 5);
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 0), 100);
        assert_eq!(percent(1, 4), 25);
        assert_eq!(percent(5, 4), 100);
    }

    #[test]
    fn test_building_outline_covers_rooms() {
        let a = Polygon2D::from_coords(&[(0.0, 0.0), (4.0, 0.0), (4.0, 3.0), (0.0, 3.0)], "a", "")
            .unwrap();
        let b = Polygon2D::from_coords(&[(4.0, 0.0), (8.0, 0.0), (8.0, 5.0), (4.0, 5.0)], "b", "")
            .unwrap();
        let outline = building_outline("f", &[a, b], 0.001).unwrap();
        assert_eq!(outline.bounds(), crate::geometry::Bounds::new(0.0, 0.0, 8.0, 5.0));
        assert_eq!(outline.space_guid(), "f-outline");
    }
}
