// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor-level detection
//!
//! Storeys are read with their names, elevations and member spaces. Models
//! without usable storeys fall back to clustering spaces by elevation, and
//! spaces no storey claims are attached to the nearest floor afterwards.

use crate::config::ExtractionConfig;
use crate::error::ExtractionError;
use crate::floor::FloorLevel;
use floorplan_model::placement::product_placement;
use floorplan_model::{DecodedEntity, EntityId, EntityResolver, IfcModel, IfcType};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// Id of the synthetic floor collecting far-away orphans
pub const UNASSIGNED_FLOOR_ID: &str = "unassigned";
pub const UNASSIGNED_FLOOR_NAME: &str = "Unassigned Spaces";

/// Pset entry names (lower-cased substrings) read as a storey elevation
const ELEVATION_PROPERTY_HINTS: [&str; 4] = ["elevation", "level", "height", "z"];

/// Stable identifier of a space: its GlobalId, or the entity id
pub(crate) fn space_guid(space: &DecodedEntity) -> String {
    space
        .attr_str("GlobalId")
        .map(str::to_string)
        .unwrap_or_else(|| format!("space-{}", space.id.0))
}

/// "101 Kontor" from Name and LongName, empty if neither is set
pub(crate) fn space_display_name(space: &DecodedEntity) -> String {
    match (space.attr_str("Name"), space.attr_str("LongName")) {
        (Some(name), Some(long)) if name != long => format!("{name} {long}"),
        (Some(name), _) => name.to_string(),
        (None, Some(long)) => long.to_string(),
        (None, None) => String::new(),
    }
}

/// A space is usable if it is identifiable and has either a representation
/// or attached properties
pub fn validate_space_for_floor_plan(model: &dyn IfcModel, space: &DecodedEntity) -> bool {
    let identified = space.has_attribute("GlobalId") || space.attr_str("Name").is_some();
    let described =
        space.has_attribute("Representation") || model.properties().has_properties(space.id);
    identified && described
}

/// Levels plus the GUID index of every space they reference
pub(crate) struct DetectedLevels {
    pub levels: Vec<FloorLevel>,
    pub spaces: FxHashMap<String, EntityId>,
}

/// Relationship indices keyed by the relating entity
#[derive(Default)]
struct Relations {
    aggregated: FxHashMap<EntityId, Vec<EntityId>>,
    contained: FxHashMap<EntityId, Vec<EntityId>>,
    /// Parent placement -> spaces placed relative to it
    placement_children: FxHashMap<EntityId, Vec<EntityId>>,
}

impl Relations {
    fn build(resolver: &dyn EntityResolver, spaces: &[Arc<DecodedEntity>]) -> Self {
        let mut rel = Relations::default();

        for agg in resolver.entities_by_type(&IfcType::IfcRelAggregates) {
            if let Some(parent) = agg.attr_ref("RelatingObject") {
                rel.aggregated
                    .entry(parent)
                    .or_default()
                    .extend(agg.attr_refs("RelatedObjects"));
            }
        }

        for contained in resolver.entities_by_type(&IfcType::IfcRelContainedInSpatialStructure) {
            if let Some(structure) = contained.attr_ref("RelatingStructure") {
                rel.contained
                    .entry(structure)
                    .or_default()
                    .extend(contained.attr_refs("RelatedElements"));
            }
        }

        for space in spaces {
            let parent = space
                .attr_ref("ObjectPlacement")
                .and_then(|p| resolver.get(p))
                .and_then(|p| p.attr_ref("PlacementRelTo"));
            if let Some(parent) = parent {
                rel.placement_children.entry(parent).or_default().push(space.id);
            }
        }

        rel
    }
}

pub(crate) struct LevelDetector<'a> {
    model: &'a dyn IfcModel,
    config: &'a ExtractionConfig,
    scale: f64,
}

impl<'a> LevelDetector<'a> {
    pub fn new(model: &'a dyn IfcModel, config: &'a ExtractionConfig) -> Self {
        Self {
            model,
            config,
            scale: model.unit_scale(),
        }
    }

    fn resolver(&self) -> &'a dyn EntityResolver {
        self.model.resolver()
    }

    pub fn detect(&self) -> Result<DetectedLevels, ExtractionError> {
        let resolver = self.resolver();
        let all_spaces = resolver.entities_by_type(&IfcType::IfcSpace);
        let relations = Relations::build(resolver, &all_spaces);

        let mut spaces: FxHashMap<EntityId, Arc<DecodedEntity>> = FxHashMap::default();
        let mut guids: FxHashMap<String, EntityId> = FxHashMap::default();
        for space in &all_spaces {
            if !validate_space_for_floor_plan(self.model, space) {
                log::debug!("Space {} skipped: no name/id or no geometry/properties", space.id);
                continue;
            }
            let guid = space_guid(space);
            if guids.contains_key(&guid) {
                log::warn!("Duplicate space GUID {guid}, keeping the first occurrence");
                continue;
            }
            guids.insert(guid, space.id);
            spaces.insert(space.id, Arc::clone(space));
        }

        let mut levels = Vec::new();
        for storey in resolver.entities_by_type(&IfcType::IfcBuildingStorey) {
            if let Some(level) = self.storey_level(&storey, &relations, &spaces) {
                levels.push(level);
            }
        }

        if levels.is_empty() {
            if spaces.is_empty() {
                return Err(ExtractionError::no_floors(
                    "no building storeys and no usable spaces in model",
                ));
            }
            log::warn!(
                "No usable building storeys, grouping {} spaces by elevation",
                spaces.len()
            );
            levels = self.cluster_by_elevation(&spaces);
        }

        sort_and_check(&mut levels, self.config);
        self.assign_orphans(&mut levels, &spaces);

        Ok(DetectedLevels {
            levels,
            spaces: guids,
        })
    }

    fn storey_level(
        &self,
        storey: &DecodedEntity,
        relations: &Relations,
        spaces: &FxHashMap<EntityId, Arc<DecodedEntity>>,
    ) -> Option<FloorLevel> {
        let resolver = self.resolver();
        let mut seen: FxHashSet<EntityId> = FxHashSet::default();
        let mut members: Vec<&Arc<DecodedEntity>> = Vec::new();
        let mut has_elements = false;

        let aggregated = relations.aggregated.get(&storey.id).into_iter().flatten();
        let contained = relations.contained.get(&storey.id).into_iter().flatten();
        let placed = storey
            .attr_ref("ObjectPlacement")
            .and_then(|p| relations.placement_children.get(&p))
            .into_iter()
            .flatten();

        for id in aggregated.chain(contained.clone()).chain(placed) {
            if let Some(space) = spaces.get(id) {
                if seen.insert(*id) {
                    members.push(space);
                }
            }
        }

        if members.is_empty() {
            has_elements = contained
                .filter_map(|id| resolver.get(*id))
                .any(|e| e.ifc_type.is_building_element());
        }

        if members.is_empty() && !has_elements {
            log::debug!("Storey {} has no spaces or building elements, skipped", storey.id);
            return None;
        }

        let id = storey
            .attr_str("GlobalId")
            .map(str::to_string)
            .unwrap_or_else(|| format!("storey-{}", storey.id.0));
        let name = storey_name(storey, &id);
        let elevation = self.storey_elevation(storey, &members);
        let space_guids = members.iter().map(|s| space_guid(s)).collect();

        match FloorLevel::new(id, name, elevation, space_guids) {
            Ok(level) => Some(level),
            Err(e) => {
                log::warn!("Storey {} skipped: {e}", storey.id);
                None
            }
        }
    }

    /// Placement Z, then the Elevation attribute, then pset entries, then
    /// the lowest contained space, then 0
    fn storey_elevation(&self, storey: &DecodedEntity, members: &[&Arc<DecodedEntity>]) -> f64 {
        if let Some(z) = self.placement_z(storey).filter(|z| z.abs() > f64::EPSILON) {
            return z;
        }
        if let Some(e) = storey.attr_float("Elevation").filter(|e| e.is_finite()) {
            return e * self.scale;
        }
        if let Some(e) = self.elevation_property(storey.id) {
            return e * self.scale;
        }
        members
            .iter()
            .filter_map(|s| self.space_elevation(s))
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    fn elevation_property(&self, id: EntityId) -> Option<f64> {
        self.model
            .properties()
            .property_sets(id)
            .into_iter()
            .flat_map(|set| set.properties)
            .find(|p| {
                let name = p.name.to_lowercase();
                p.numeric.is_some_and(f64::is_finite)
                    && ELEVATION_PROPERTY_HINTS.iter().any(|hint| name.contains(hint))
            })
            .and_then(|p| p.numeric)
    }

    fn placement_z(&self, product: &DecodedEntity) -> Option<f64> {
        match product_placement(self.resolver(), product, self.config.max_placement_depth) {
            Ok(Some(m)) => Some(m[(2, 3)] * self.scale).filter(|z| z.is_finite()),
            Ok(None) => None,
            Err(e) => {
                log::debug!("Placement of {} unusable: {e}", product.id);
                None
            }
        }
    }

    /// World Z of a space in meters
    fn space_elevation(&self, space: &DecodedEntity) -> Option<f64> {
        self.placement_z(space).or_else(|| {
            space
                .attr_float("ElevationWithFlooring")
                .map(|e| e * self.scale)
                .filter(|e| e.is_finite())
        })
    }

    fn cluster_by_elevation(
        &self,
        spaces: &FxHashMap<EntityId, Arc<DecodedEntity>>,
    ) -> Vec<FloorLevel> {
        let mut by_elevation: Vec<(f64, EntityId, String)> = spaces
            .values()
            .map(|s| (self.space_elevation(s).unwrap_or(0.0), s.id, space_guid(s)))
            .collect();
        by_elevation.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut clusters: Vec<(f64, Vec<String>)> = Vec::new();
        for (elevation, _, guid) in by_elevation {
            match clusters.last_mut() {
                Some((anchor, members)) if elevation - *anchor <= self.config.cluster_tolerance => {
                    members.push(guid)
                }
                _ => clusters.push((elevation, vec![guid])),
            }
        }

        clusters
            .into_iter()
            .enumerate()
            .filter_map(|(i, (elevation, members))| {
                FloorLevel::new(
                    format!("level-{i}"),
                    format!("Level {elevation:.1}m"),
                    elevation,
                    members,
                )
                .ok()
            })
            .collect()
    }

    fn assign_orphans(
        &self,
        levels: &mut Vec<FloorLevel>,
        spaces: &FxHashMap<EntityId, Arc<DecodedEntity>>,
    ) {
        let assigned: FxHashSet<&str> = levels
            .iter()
            .flat_map(|l| l.spaces().iter().map(String::as_str))
            .collect();

        let mut orphans: Vec<(EntityId, String, f64)> = spaces
            .values()
            .map(|s| (s.id, space_guid(s)))
            .filter(|(_, guid)| !assigned.contains(guid.as_str()))
            .map(|(id, guid)| {
                let elevation = spaces
                    .get(&id)
                    .and_then(|s| self.space_elevation(s))
                    .unwrap_or(0.0);
                (id, guid, elevation)
            })
            .collect();
        if orphans.is_empty() {
            return;
        }
        orphans.sort_by_key(|(id, _, _)| *id);

        let mut unassigned = Vec::new();
        for (_, guid, elevation) in orphans {
            let nearest = levels
                .iter_mut()
                .filter(|l| l.id != UNASSIGNED_FLOOR_ID)
                .map(|l| ((l.elevation - elevation).abs(), l))
                .min_by(|a, b| a.0.total_cmp(&b.0));
            match nearest {
                Some((distance, level)) if distance <= self.config.orphan_max_distance => {
                    log::debug!("Orphan space {guid} assigned to {}", level.name);
                    level.add_space(guid);
                }
                _ => unassigned.push(guid),
            }
        }

        if unassigned.is_empty() {
            return;
        }
        let top = levels
            .iter()
            .map(|l| l.elevation)
            .reduce(f64::max)
            .unwrap_or(0.0);
        log::warn!(
            "{} spaces could not be placed on any floor, collected in '{UNASSIGNED_FLOOR_NAME}'",
            unassigned.len()
        );
        if let Ok(level) = FloorLevel::new(
            UNASSIGNED_FLOOR_ID,
            UNASSIGNED_FLOOR_NAME,
            top + self.config.unassigned_elevation_offset,
            unassigned,
        ) {
            levels.push(level);
        }
    }
}

fn storey_name(storey: &DecodedEntity, id: &str) -> String {
    storey
        .attr_str("Name")
        .or_else(|| storey.attr_str("LongName"))
        .or_else(|| storey.attr_str("ObjectType"))
        .map(str::to_string)
        .unwrap_or_else(|| {
            let prefix: String = id.chars().take(8).collect();
            format!("Level {prefix}")
        })
}

/// Sort ascending and warn about suspicious gaps
fn sort_and_check(levels: &mut [FloorLevel], config: &ExtractionConfig) {
    levels.sort_by(|a, b| a.elevation.total_cmp(&b.elevation).then_with(|| a.id.cmp(&b.id)));
    for pair in levels.windows(2) {
        let gap = pair[1].elevation - pair[0].elevation;
        if gap < config.duplicate_floor_gap {
            log::warn!(
                "Floors '{}' and '{}' are only {gap:.3} m apart, possible duplicate",
                pair[0].name,
                pair[1].name
            );
        } else if gap > config.large_floor_gap {
            log::warn!(
                "Floors '{}' and '{}' are {gap:.1} m apart, check elevations",
                pair[0].name,
                pair[1].name
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(id: &str, elevation: f64) -> FloorLevel {
        FloorLevel::new(id, id, elevation, Vec::new()).unwrap()
    }

    #[test]
    fn test_sort_orders_by_elevation() {
        let mut levels = vec![level("top", 7.0), level("ground", 0.0), level("mid", 3.5)];
        sort_and_check(&mut levels, &ExtractionConfig::default());
        let elevations: Vec<f64> = levels.iter().map(|l| l.elevation).collect();
        assert_eq!(elevations, [0.0, 3.5, 7.0]);
    }

    #[test]
    fn test_storey_name_fallback() {
        let storey = DecodedEntity {
            id: EntityId(4),
            ifc_type: IfcType::IfcBuildingStorey,
            attributes: vec![floorplan_model::AttributeValue::String("2hQx8Fx0v1ZQ".into())],
        };
        assert_eq!(storey_name(&storey, "2hQx8Fx0v1ZQ"), "Level 2hQx8Fx0");
    }

    #[test]
    fn test_display_name_joins_number_and_long_name() {
        use floorplan_model::AttributeValue as A;
        let mut attrs = vec![A::Null; 11];
        attrs[0] = A::String("g".into());
        attrs[2] = A::String("101".into());
        attrs[7] = A::String("Kontor".into());
        let space = DecodedEntity {
            id: EntityId(1),
            ifc_type: IfcType::IfcSpace,
            attributes: attrs,
        };
        assert_eq!(space_display_name(&space), "101 Kontor");
        assert_eq!(space_guid(&space), "g");
    }
}
