// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Readers for representation items
//!
//! Shared by shape providers and by callers that read profiles straight off
//! a product's representation. All coordinates are in file length units.

use crate::placement::{axis2_placement, cartesian_point, coordinates, direction, frame};
use crate::{DecodedEntity, EntityId, EntityResolver, EntityResolverExt, IfcType, ParseError, Result};
use nalgebra::{Matrix4, Point3, Vector3};
use std::sync::Arc;

/// A representation item with the transform that places it in product space
#[derive(Clone, Debug)]
pub struct PlacedItem {
    pub item: Arc<DecodedEntity>,
    pub transform: Matrix4<f64>,
}

/// Body representation items of a product, with mapped items expanded
///
/// Representations identified as `Body` are preferred; if none exist every
/// shape representation is used.
pub fn body_items(resolver: &dyn EntityResolver, product: &DecodedEntity) -> Vec<PlacedItem> {
    let Some(shape) = resolver.follow(product, "Representation") else {
        return Vec::new();
    };
    let representations = resolver.follow_all(&shape, "Representations");

    let is_body = |rep: &DecodedEntity| {
        rep.attr_str("RepresentationIdentifier")
            .is_some_and(|id| id.eq_ignore_ascii_case("Body"))
    };
    let chosen: Vec<_> = if representations.iter().any(|r| is_body(r.as_ref())) {
        representations
            .into_iter()
            .filter(|r| is_body(r.as_ref()))
            .collect()
    } else {
        representations
    };

    let mut items = Vec::new();
    for rep in chosen {
        collect_items(resolver, &rep, Matrix4::identity(), 0, &mut items);
    }
    items
}

const MAX_MAPPING_DEPTH: usize = 8;

fn collect_items(
    resolver: &dyn EntityResolver,
    representation: &DecodedEntity,
    transform: Matrix4<f64>,
    depth: usize,
    out: &mut Vec<PlacedItem>,
) {
    for item in resolver.follow_all(representation, "Items") {
        if item.ifc_type != IfcType::IfcMappedItem {
            out.push(PlacedItem { item, transform });
            continue;
        }
        if depth >= MAX_MAPPING_DEPTH {
            log::warn!("Mapped item {} nested too deeply, skipped", item.id);
            continue;
        }
        let Some(source) = resolver.follow(&item, "MappingSource") else {
            continue;
        };
        let origin = source
            .attr_ref("MappingOrigin")
            .and_then(|id| axis2_placement(resolver, id))
            .unwrap_or_else(Matrix4::identity);
        let target = item
            .attr_ref("MappingTarget")
            .and_then(|id| transformation_operator(resolver, id))
            .unwrap_or_else(Matrix4::identity);
        if let Some(mapped) = resolver.follow(&source, "MappedRepresentation") {
            collect_items(resolver, &mapped, transform * target * origin, depth + 1, out);
        }
    }
}

/// Matrix of an IfcCartesianTransformationOperator3D
pub fn transformation_operator(
    resolver: &dyn EntityResolver,
    id: EntityId,
) -> Option<Matrix4<f64>> {
    let op = resolver.get(id)?;
    if op.ifc_type != IfcType::IfcCartesianTransformationOperator3D {
        return None;
    }
    let origin = op
        .attr_ref("LocalOrigin")
        .and_then(|p| cartesian_point(resolver, p))
        .unwrap_or_else(Point3::origin);
    let x = op
        .attr_ref("Axis1")
        .and_then(|d| direction(resolver, d))
        .unwrap_or_else(Vector3::x);
    let z = op
        .attr_ref("Axis3")
        .and_then(|d| direction(resolver, d))
        .unwrap_or_else(Vector3::z);
    let scale = op.attr_float("Scale").unwrap_or(1.0);

    let mut m = frame(origin, z, x);
    for col in 0..3 {
        for row in 0..3 {
            m[(row, col)] *= scale;
        }
    }
    Some(m)
}

/// Composite curves nested deeper than this are treated as cyclic
pub const MAX_CURVE_DEPTH: usize = 16;

/// Points of a bounded curve (polyline, indexed poly curve, composite curve)
///
/// A duplicated closing point is dropped.
pub fn curve_points(resolver: &dyn EntityResolver, id: EntityId) -> Result<Vec<Point3<f64>>> {
    nested_curve_points(resolver, id, id, 0)
}

fn nested_curve_points(
    resolver: &dyn EntityResolver,
    start: EntityId,
    id: EntityId,
    depth: usize,
) -> Result<Vec<Point3<f64>>> {
    if depth >= MAX_CURVE_DEPTH {
        return Err(ParseError::geometry(
            start,
            format!("composite curve nested deeper than {MAX_CURVE_DEPTH} levels"),
        ));
    }
    let curve = resolver.get_or_err(id)?;
    let mut points = match curve.ifc_type {
        IfcType::IfcPolyline => curve
            .attr_refs("Points")
            .into_iter()
            .filter_map(|p| cartesian_point(resolver, p))
            .collect::<Vec<_>>(),
        IfcType::IfcIndexedPolyCurve => {
            let list = resolver
                .follow(&curve, "Points")
                .ok_or_else(|| ParseError::missing(id, "Points"))?;
            list.attr_list("CoordList")
                .unwrap_or_default()
                .iter()
                .filter_map(|c| c.as_list().and_then(coordinates))
                .collect()
        }
        IfcType::IfcCompositeCurve => {
            let mut points = Vec::new();
            for segment in resolver.follow_all(&curve, "Segments") {
                let Some(parent) = segment.attr_ref("ParentCurve") else {
                    continue;
                };
                let mut segment_points = nested_curve_points(resolver, start, parent, depth + 1)?;
                if segment.attribute("SameSense").and_then(|v| v.as_bool()) == Some(false) {
                    segment_points.reverse();
                }
                points.extend(segment_points);
            }
            points
        }
        _ => {
            return Err(ParseError::geometry(
                id,
                format!("unsupported curve type {}", curve.ifc_type),
            ))
        }
    };

    if points.len() > 1 {
        let closed = match (points.first(), points.last()) {
            (Some(first), Some(last)) => (first - last).norm() < 1e-9,
            _ => false,
        };
        if closed {
            points.pop();
        }
    }
    Ok(points)
}

/// Outline of a profile definition in its own placement (z = 0)
pub fn profile_outline(resolver: &dyn EntityResolver, id: EntityId) -> Result<Vec<Point3<f64>>> {
    let profile = resolver.get_or_err(id)?;
    match profile.ifc_type {
        IfcType::IfcRectangleProfileDef => {
            let x_dim = profile
                .attr_float("XDim")
                .ok_or_else(|| ParseError::missing(id, "XDim"))?;
            let y_dim = profile
                .attr_float("YDim")
                .ok_or_else(|| ParseError::missing(id, "YDim"))?;
            let position = profile
                .attr_ref("Position")
                .and_then(|p| axis2_placement(resolver, p))
                .unwrap_or_else(Matrix4::identity);
            let (hx, hy) = (x_dim / 2.0, y_dim / 2.0);
            Ok([(-hx, -hy), (hx, -hy), (hx, hy), (-hx, hy)]
                .into_iter()
                .map(|(x, y)| position.transform_point(&Point3::new(x, y, 0.0)))
                .collect())
        }
        IfcType::IfcArbitraryClosedProfileDef => {
            let curve = profile
                .attr_ref("OuterCurve")
                .ok_or_else(|| ParseError::missing(id, "OuterCurve"))?;
            let points = curve_points(resolver, curve)?;
            if points.len() < 3 {
                return Err(ParseError::geometry(id, "profile has fewer than 3 points"));
            }
            Ok(points)
        }
        _ => Err(ParseError::geometry(
            id,
            format!("unsupported profile type {}", profile.ifc_type),
        )),
    }
}

/// Footprint of an extruded area solid in item coordinates
///
/// Returns the profile outline moved by the solid's `Position`; the
/// extrusion itself contributes nothing to the footprint.
pub fn extrusion_footprint(
    resolver: &dyn EntityResolver,
    solid: &DecodedEntity,
) -> Result<Vec<Point3<f64>>> {
    let profile = solid
        .attr_ref("SweptArea")
        .ok_or_else(|| ParseError::missing(solid.id, "SweptArea"))?;
    let position = solid
        .attr_ref("Position")
        .and_then(|p| axis2_placement(resolver, p))
        .unwrap_or_else(Matrix4::identity);
    Ok(profile_outline(resolver, profile)?
        .iter()
        .map(|p| position.transform_point(p))
        .collect())
}

/// Bottom and top loops of an extruded area solid in item coordinates
pub fn extrusion_vertices(
    resolver: &dyn EntityResolver,
    solid: &DecodedEntity,
) -> Result<Vec<Point3<f64>>> {
    let profile = solid
        .attr_ref("SweptArea")
        .ok_or_else(|| ParseError::missing(solid.id, "SweptArea"))?;
    let position = solid
        .attr_ref("Position")
        .and_then(|p| axis2_placement(resolver, p))
        .unwrap_or_else(Matrix4::identity);
    let dir = solid
        .attr_ref("ExtrudedDirection")
        .and_then(|d| direction(resolver, d))
        .map(|d| d.normalize())
        .unwrap_or_else(Vector3::z);
    let depth = solid.attr_float("Depth").unwrap_or(0.0);

    let outline = profile_outline(resolver, profile)?;
    let mut vertices = Vec::with_capacity(outline.len() * 2);
    for p in &outline {
        vertices.push(position.transform_point(p));
    }
    for p in &outline {
        vertices.push(position.transform_point(&(p + dir * depth)));
    }
    Ok(vertices)
}

/// Every loop of a faceted B-rep's outer shell
pub fn brep_loops(
    resolver: &dyn EntityResolver,
    brep: &DecodedEntity,
) -> Result<Vec<Vec<Point3<f64>>>> {
    let shell = resolver
        .follow(brep, "Outer")
        .ok_or_else(|| ParseError::missing(brep.id, "Outer"))?;
    let mut loops = Vec::new();
    for face in resolver.follow_all(&shell, "CfsFaces") {
        for bound in resolver.follow_all(&face, "Bounds") {
            let Some(poly_loop) = resolver.follow(&bound, "Bound") else {
                continue;
            };
            let points: Vec<_> = poly_loop
                .attr_refs("Polygon")
                .into_iter()
                .filter_map(|p| cartesian_point(resolver, p))
                .collect();
            if points.len() >= 3 {
                loops.push(points);
            }
        }
    }
    Ok(loops)
}

/// Vertices and zero-based triangle indices of an IfcTriangulatedFaceSet
pub fn triangulated_face_set(
    resolver: &dyn EntityResolver,
    face_set: &DecodedEntity,
) -> Result<(Vec<Point3<f64>>, Vec<u32>)> {
    let list = resolver
        .follow(face_set, "Coordinates")
        .ok_or_else(|| ParseError::missing(face_set.id, "Coordinates"))?;
    let vertices: Vec<_> = list
        .attr_list("CoordList")
        .unwrap_or_default()
        .iter()
        .filter_map(|c| c.as_list().and_then(coordinates))
        .collect();
    let indices = face_set
        .attr_list("CoordIndex")
        .unwrap_or_default()
        .iter()
        .filter_map(|tri| tri.as_list())
        .flat_map(|tri| tri.iter().filter_map(|i| i.as_integer()))
        .map(|i| (i.max(1) - 1) as u32)
        .collect();
    Ok((vertices, indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{point, r, MemResolver};
    use crate::AttributeValue as A;

    fn segment(same_sense: &str, parent: u32) -> Vec<A> {
        vec![A::Enum("CONTINUOUS".into()), A::Enum(same_sense.into()), r(parent)]
    }

    #[test]
    fn test_composite_curve_joins_segments() {
        let resolver = MemResolver::new(vec![
            (1, IfcType::IfcCartesianPoint, point(0.0, 0.0, 0.0)),
            (2, IfcType::IfcCartesianPoint, point(4.0, 0.0, 0.0)),
            (3, IfcType::IfcCartesianPoint, point(4.0, 3.0, 0.0)),
            (4, IfcType::IfcPolyline, vec![A::List(vec![r(1), r(2)])]),
            (5, IfcType::IfcPolyline, vec![A::List(vec![r(3), r(2)])]),
            (6, IfcType::IfcCompositeCurveSegment, segment("T", 4)),
            (7, IfcType::IfcCompositeCurveSegment, segment("F", 5)),
            (8, IfcType::IfcCompositeCurve, vec![A::List(vec![r(6), r(7)]), A::Null]),
        ]);
        let points = curve_points(&resolver, EntityId(8)).unwrap();
        let xy: Vec<(f64, f64)> = points.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(xy, [(0.0, 0.0), (4.0, 0.0), (4.0, 0.0), (4.0, 3.0)]);
    }

    #[test]
    fn test_cyclic_composite_curve_is_an_error() {
        // The curve's only segment points back at the curve itself
        let resolver = MemResolver::new(vec![
            (1, IfcType::IfcCompositeCurveSegment, segment("T", 2)),
            (2, IfcType::IfcCompositeCurve, vec![A::List(vec![r(1)]), A::Null]),
        ]);
        let err = curve_points(&resolver, EntityId(2)).unwrap_err();
        assert!(matches!(err, ParseError::Geometry { entity: EntityId(2), .. }));
    }
}
