// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-space boundary strategies
//!
//! Each strategy is one way of recovering a room outline. The extractor
//! runs them in order and takes the first one that produces a valid
//! polygon; a strategy's errors never leave the extractor.

use crate::config::ExtractionConfig;
use crate::error::GeometryError;
use crate::geometry::{Point2D, Polygon2D};
use crate::hull::{convex_hull, dedup_points};
use floorplan_model::geometry::{body_items, brep_loops, curve_points, extrusion_footprint};
use floorplan_model::placement::{axis2_placement, origin, product_placement};
use floorplan_model::{
    DecodedEntity, EntityId, EntityResolver, EntityResolverExt, IfcModel, IfcType, ParseError,
    ShapeSettings,
};
use nalgebra::{Matrix4, Point3};
use rustc_hash::FxHashSet;
use thiserror::Error;

/// Failure of a single strategy for a single space
#[derive(Error, Debug)]
pub enum BoundaryError {
    #[error("not applicable: {0}")]
    NotApplicable(&'static str),

    #[error(transparent)]
    Model(#[from] ParseError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("rejected: {0}")]
    Rejected(String),
}

/// Everything a strategy may read about the space being processed
pub struct SpaceContext<'a> {
    pub model: &'a dyn IfcModel,
    pub config: &'a ExtractionConfig,
    pub space: &'a DecodedEntity,
    pub guid: &'a str,
    pub name: &'a str,
    /// Space-boundary relationships whose RelatingSpace is this space
    pub boundaries: &'a [EntityId],
}

impl<'a> SpaceContext<'a> {
    pub fn resolver(&self) -> &'a dyn EntityResolver {
        self.model.resolver()
    }

    /// File length unit in meters
    pub fn scale(&self) -> f64 {
        self.model.unit_scale()
    }

    /// World transform of the space, `None` without a usable placement
    pub fn world_placement(&self) -> Option<Matrix4<f64>> {
        match product_placement(self.resolver(), self.space, self.config.max_placement_depth) {
            Ok(placement) => placement,
            Err(e) => {
                log::debug!("Space {}: placement unusable: {e}", self.guid);
                None
            }
        }
    }

    /// Drop Z and convert a file-unit point to plan meters
    pub fn to_plan(&self, p: &Point3<f64>) -> Result<Point2D, BoundaryError> {
        let scale = self.scale();
        Ok(Point2D::new(p.x * scale, p.y * scale)?)
    }

    /// Convex outline of a point cloud
    pub fn hull_polygon(&self, points: &[Point2D]) -> Result<Polygon2D, BoundaryError> {
        let unique = dedup_points(points, self.config.dedup_tolerance);
        let hull = convex_hull(&unique);
        if hull.len() < 3 {
            return Err(BoundaryError::Rejected(format!(
                "hull of {} points is degenerate",
                unique.len()
            )));
        }
        Ok(Polygon2D::new(hull, self.guid, self.name)?)
    }

    /// Outline that keeps the given vertex order (concave profiles survive)
    pub fn outline_polygon(&self, points: Vec<Point2D>) -> Result<Polygon2D, BoundaryError> {
        let tolerance = self.config.dedup_tolerance;
        let mut outline: Vec<Point2D> = Vec::with_capacity(points.len());
        for p in points {
            if outline.last().map_or(true, |q| q.distance_to(&p) > tolerance) {
                outline.push(p);
            }
        }
        Ok(Polygon2D::new(outline, self.guid, self.name)?)
    }
}

/// One tier of the boundary fallback chain
pub trait BoundaryStrategy: Send + Sync {
    /// Short identifier used in logs and reports
    fn name(&self) -> &'static str;

    /// Candidate outlines for the space; empty or failing results move on
    /// to the next strategy
    fn extract(&self, ctx: &SpaceContext<'_>) -> Result<Vec<Polygon2D>, BoundaryError>;
}

/// The standard chain, most measured first
pub fn default_strategies() -> Vec<Box<dyn BoundaryStrategy>> {
    vec![
        Box::new(ShapeProjection),
        Box::new(SpaceBoundaryRelations),
        Box::new(RepresentationProfiles),
        Box::new(BoundingElements),
        Box::new(crate::extractor::synth::QuantitySynthesis),
    ]
}

/// Project the provider's body shape onto the floor plane
pub struct ShapeProjection;

impl ShapeProjection {
    fn project(
        &self,
        ctx: &SpaceContext<'_>,
        settings: &ShapeSettings,
        vertices: &[Point3<f64>],
    ) -> Result<Polygon2D, BoundaryError> {
        if vertices.len() < 3 {
            return Err(BoundaryError::NotApplicable("shape has fewer than 3 vertices"));
        }
        let world = if settings.world_coords {
            None
        } else {
            ctx.world_placement()
        };
        let placed: Vec<Point3<f64>> = vertices
            .iter()
            .map(|v| world.map_or(*v, |m| m.transform_point(v)))
            .collect();

        let band = ctx.config.z_band / ctx.scale();
        let mean_z = placed.iter().map(|v| v.z).sum::<f64>() / placed.len() as f64;
        let near_floor: Vec<&Point3<f64>> = placed
            .iter()
            .filter(|v| (v.z - mean_z).abs() <= band)
            .collect();
        // Tall extrusions put every vertex outside the band; the plan
        // projection of all vertices is the same footprint
        let source: Vec<&Point3<f64>> = if near_floor.len() >= 3 {
            near_floor
        } else {
            placed.iter().collect()
        };

        let points = source
            .into_iter()
            .map(|v| ctx.to_plan(v))
            .collect::<Result<Vec<_>, _>>()?;
        reject_placeholder(ctx, ctx.hull_polygon(&points)?)
    }
}

fn is_placeholder(polygon: &Polygon2D, size: f64) -> bool {
    let b = polygon.bounds();
    (b.width() - size).abs() < 1e-3 && (b.height() - size).abs() < 1e-3
}

fn reject_placeholder(
    ctx: &SpaceContext<'_>,
    polygon: Polygon2D,
) -> Result<Polygon2D, BoundaryError> {
    if is_placeholder(&polygon, ctx.config.placeholder_size) {
        return Err(BoundaryError::Rejected(format!(
            "{0} x {0} m placeholder shape",
            ctx.config.placeholder_size
        )));
    }
    Ok(polygon)
}

impl BoundaryStrategy for ShapeProjection {
    fn name(&self) -> &'static str {
        "shape_projection"
    }

    fn extract(&self, ctx: &SpaceContext<'_>) -> Result<Vec<Polygon2D>, BoundaryError> {
        let shapes = ctx
            .model
            .shapes()
            .ok_or(BoundaryError::NotApplicable("model has no shape source"))?;

        let mut last_error = BoundaryError::NotApplicable("no shape settings tried");
        for settings in ShapeSettings::projection_sequence() {
            let attempt = shapes
                .create_shape(ctx.space.id, &settings)
                .map_err(BoundaryError::from)
                .and_then(|shape| self.project(ctx, &settings, &shape.vertices));
            match attempt {
                Ok(polygon) => return Ok(vec![polygon]),
                Err(e) => {
                    log::debug!("Space {}: shape with {settings:?} failed: {e}", ctx.guid);
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}

/// Outer boundaries of the physical IfcRelSpaceBoundary surfaces
pub struct SpaceBoundaryRelations;

impl BoundaryStrategy for SpaceBoundaryRelations {
    fn name(&self) -> &'static str {
        "space_boundaries"
    }

    fn extract(&self, ctx: &SpaceContext<'_>) -> Result<Vec<Polygon2D>, BoundaryError> {
        if ctx.boundaries.is_empty() {
            return Err(BoundaryError::NotApplicable("no space boundaries"));
        }
        let resolver = ctx.resolver();
        let world = ctx.world_placement().unwrap_or_else(Matrix4::identity);

        let mut points = Vec::new();
        let mut virtual_count = 0usize;
        for boundary in ctx.boundaries.iter().filter_map(|id| resolver.get(*id)) {
            let is_virtual = boundary
                .attr_enum("PhysicalOrVirtualBoundary")
                .is_some_and(|v| v.eq_ignore_ascii_case("VIRTUAL"));
            if is_virtual {
                virtual_count += 1;
                continue;
            }

            let Some(surface) = resolver
                .follow(&boundary, "ConnectionGeometry")
                .and_then(|conn| resolver.follow(&conn, "SurfaceOnRelatingElement"))
            else {
                continue;
            };
            if surface.ifc_type != IfcType::IfcCurveBoundedPlane {
                continue;
            }
            let Some(curve) = surface.attr_ref("OuterBoundary") else {
                continue;
            };

            let plane = resolver
                .follow(&surface, "BasisSurface")
                .and_then(|plane| plane.attr_ref("Position"))
                .and_then(|p| axis2_placement(resolver, p))
                .unwrap_or_else(Matrix4::identity);
            let to_world = world * plane;

            match curve_points(resolver, curve) {
                Ok(curve) => {
                    for p in &curve {
                        points.push(ctx.to_plan(&to_world.transform_point(p))?);
                    }
                }
                Err(e) => log::debug!("Space {}: boundary {} unreadable: {e}", ctx.guid, boundary.id),
            }
        }

        if points.len() < 3 {
            log::debug!(
                "Space {}: {} boundaries ({virtual_count} virtual) gave {} points",
                ctx.guid,
                ctx.boundaries.len(),
                points.len()
            );
            return Err(BoundaryError::NotApplicable("no physical boundary geometry"));
        }
        Ok(vec![ctx.hull_polygon(&points)?])
    }
}

/// Profiles stated directly by the space's own representation items
pub struct RepresentationProfiles;

impl RepresentationProfiles {
    fn item_outline(
        &self,
        ctx: &SpaceContext<'_>,
        item: &DecodedEntity,
        transform: &Matrix4<f64>,
    ) -> Result<Option<Polygon2D>, BoundaryError> {
        let resolver = ctx.resolver();
        let plan = |points: &[Point3<f64>]| {
            points
                .iter()
                .map(|p| ctx.to_plan(&transform.transform_point(p)))
                .collect::<Result<Vec<_>, _>>()
        };

        let polygon = match item.ifc_type {
            IfcType::IfcExtrudedAreaSolid => {
                let footprint = extrusion_footprint(resolver, item)?;
                ctx.outline_polygon(plan(&footprint[..])?)?
            }
            IfcType::IfcFacetedBrep => {
                let loops = brep_loops(resolver, item)?;
                ctx.hull_polygon(&plan(&loops.concat()[..])?)?
            }
            _ => return Ok(None),
        };
        reject_placeholder(ctx, polygon).map(Some)
    }
}

impl BoundaryStrategy for RepresentationProfiles {
    fn name(&self) -> &'static str {
        "representation_profiles"
    }

    fn extract(&self, ctx: &SpaceContext<'_>) -> Result<Vec<Polygon2D>, BoundaryError> {
        let items = body_items(ctx.resolver(), ctx.space);
        if items.is_empty() {
            return Err(BoundaryError::NotApplicable("no representation items"));
        }
        let world = ctx.world_placement().unwrap_or_else(Matrix4::identity);

        let mut candidates = Vec::new();
        for placed in &items {
            let transform = world * placed.transform;
            match self.item_outline(ctx, &placed.item, &transform) {
                Ok(Some(polygon)) => candidates.push(polygon),
                Ok(None) => {}
                Err(e) => log::debug!("Space {}: item {} skipped: {e}", ctx.guid, placed.item.id),
            }
        }
        Ok(candidates)
    }
}

/// Hull of the placement origins of the elements bounding the space
///
/// Only a coarse approximation: element origins sit at one end of a wall, so
/// the outline may miss parts of the room.
pub struct BoundingElements;

impl BoundaryStrategy for BoundingElements {
    fn name(&self) -> &'static str {
        "bounding_elements"
    }

    fn extract(&self, ctx: &SpaceContext<'_>) -> Result<Vec<Polygon2D>, BoundaryError> {
        let resolver = ctx.resolver();
        let mut seen: FxHashSet<EntityId> = FxHashSet::default();
        let mut points = Vec::new();

        for boundary in ctx.boundaries.iter().filter_map(|id| resolver.get(*id)) {
            let Some(element) = resolver.follow(&boundary, "RelatedBuildingElement") else {
                continue;
            };
            if !seen.insert(element.id) {
                continue;
            }
            match product_placement(resolver, &element, ctx.config.max_placement_depth) {
                Ok(Some(m)) => points.push(ctx.to_plan(&origin(&m))?),
                Ok(None) => {}
                Err(e) => log::debug!("Element {} placement unusable: {e}", element.id),
            }
        }

        if points.len() < 3 {
            return Err(BoundaryError::NotApplicable("fewer than 3 bounding elements"));
        }
        Ok(vec![ctx.hull_polygon(&points)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_detection() {
        let unit =
            Polygon2D::from_coords(&[(5.0, 5.0), (6.0, 5.0), (6.0, 6.0), (5.0, 6.0)], "p", "")
                .unwrap();
        assert!(is_placeholder(&unit, 1.0));
        let room =
            Polygon2D::from_coords(&[(0.0, 0.0), (4.0, 0.0), (4.0, 3.0), (0.0, 3.0)], "r", "")
                .unwrap();
        assert!(!is_placeholder(&room, 1.0));
    }

    #[test]
    fn test_default_chain_order() {
        let names: Vec<&str> = default_strategies().iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            [
                "shape_projection",
                "space_boundaries",
                "representation_profiles",
                "bounding_elements",
                "quantity_synthesis"
            ]
        );
    }
}
