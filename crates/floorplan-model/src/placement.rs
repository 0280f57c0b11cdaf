// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Placement resolution
//!
//! An `IfcLocalPlacement` positions a product relative to another placement
//! through `PlacementRelTo`. Chains are walked iteratively, child to root,
//! multiplying each relative placement onto the accumulated transform. The
//! walk is capped at a maximum depth so cyclic references in malformed files
//! fail instead of looping.

use crate::{DecodedEntity, EntityId, EntityResolver, IfcType, ParseError, Result};
use nalgebra::{Matrix4, Point3, Vector3};

/// Default cap on `PlacementRelTo` hops
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Read an IfcCartesianPoint; 2D points get z = 0
pub fn cartesian_point(resolver: &dyn EntityResolver, id: EntityId) -> Option<Point3<f64>> {
    let point = resolver.get(id)?;
    if point.ifc_type != IfcType::IfcCartesianPoint {
        return None;
    }
    coordinates(point.attr_list("Coordinates")?)
}

/// Parse a coordinate tuple attribute
pub fn coordinates(coords: &[crate::AttributeValue]) -> Option<Point3<f64>> {
    let x = coords.first()?.as_float()?;
    let y = coords.get(1)?.as_float()?;
    let z = coords.get(2).and_then(|v| v.as_float()).unwrap_or(0.0);
    Some(Point3::new(x, y, z))
}

/// Read an IfcDirection as a (not necessarily unit) vector
pub fn direction(resolver: &dyn EntityResolver, id: EntityId) -> Option<Vector3<f64>> {
    let dir = resolver.get(id)?;
    if dir.ifc_type != IfcType::IfcDirection {
        return None;
    }
    let ratios = dir.attr_list("DirectionRatios")?;
    let x = ratios.first()?.as_float()?;
    let y = ratios.get(1)?.as_float()?;
    let z = ratios.get(2).and_then(|v| v.as_float()).unwrap_or(0.0);
    let v = Vector3::new(x, y, z);
    (v.norm() > f64::EPSILON).then_some(v)
}

/// Matrix of an IfcAxis2Placement3D or IfcAxis2Placement2D
pub fn axis2_placement(resolver: &dyn EntityResolver, id: EntityId) -> Option<Matrix4<f64>> {
    let placement = resolver.get(id)?;

    let location = placement
        .attr_ref("Location")
        .and_then(|p| cartesian_point(resolver, p))
        .unwrap_or_else(Point3::origin);

    let (axis, ref_dir) = match placement.ifc_type {
        IfcType::IfcAxis2Placement3D => (
            placement
                .attr_ref("Axis")
                .and_then(|d| direction(resolver, d))
                .unwrap_or_else(Vector3::z),
            placement
                .attr_ref("RefDirection")
                .and_then(|d| direction(resolver, d))
                .unwrap_or_else(Vector3::x),
        ),
        IfcType::IfcAxis2Placement2D => (
            Vector3::z(),
            placement
                .attr_ref("RefDirection")
                .and_then(|d| direction(resolver, d))
                .map(|d| Vector3::new(d.x, d.y, 0.0))
                .unwrap_or_else(Vector3::x),
        ),
        _ => return None,
    };

    Some(frame(location, axis, ref_dir))
}

/// Right-handed frame from an origin, a Z axis and an approximate X axis
pub fn frame(location: Point3<f64>, axis: Vector3<f64>, ref_dir: Vector3<f64>) -> Matrix4<f64> {
    let z = axis.normalize();
    // Project RefDirection onto the plane normal to Z
    let mut x = ref_dir - z * ref_dir.dot(&z);
    if x.norm() < 1e-12 {
        x = if z.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
        x -= z * x.dot(&z);
    }
    let x = x.normalize();
    let y = z.cross(&x);

    Matrix4::new(
        x.x, y.x, z.x, location.x, //
        x.y, y.y, z.y, location.y, //
        x.z, y.z, z.z, location.z, //
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Flatten a local placement chain into one world transform
///
/// Stops at the first placement that is not an `IfcLocalPlacement`
/// (grid placements are treated as the identity).
pub fn local_placement_chain(
    resolver: &dyn EntityResolver,
    placement: EntityId,
    max_depth: usize,
) -> Result<Matrix4<f64>> {
    let mut transform = Matrix4::identity();
    let mut current = Some(placement);
    let mut depth = 0;

    while let Some(id) = current {
        if depth >= max_depth {
            return Err(ParseError::PlacementDepth {
                start: placement,
                max_depth,
            });
        }
        depth += 1;

        let entity = resolver.get(id).ok_or(ParseError::EntityNotFound(id))?;
        if entity.ifc_type != IfcType::IfcLocalPlacement {
            break;
        }

        let local = entity
            .attr_ref("RelativePlacement")
            .and_then(|rel| axis2_placement(resolver, rel))
            .unwrap_or_else(Matrix4::identity);
        transform = local * transform;
        current = entity.attr_ref("PlacementRelTo");
    }

    Ok(transform)
}

/// World transform of a product's `ObjectPlacement`, if it has one
pub fn product_placement(
    resolver: &dyn EntityResolver,
    product: &DecodedEntity,
    max_depth: usize,
) -> Result<Option<Matrix4<f64>>> {
    match product.attr_ref("ObjectPlacement") {
        Some(placement) => local_placement_chain(resolver, placement, max_depth).map(Some),
        None => Ok(None),
    }
}

/// Translation part of a transform
pub fn origin(transform: &Matrix4<f64>) -> Point3<f64> {
    transform.transform_point(&Point3::origin())
}
