// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ShapeSource implementation
//!
//! Produces raw body vertices for a product. Only the item types that carry
//! a usable footprint are evaluated; anything else is reported as an error
//! so callers can fall back to other strategies.

use crate::StepResolver;
use floorplan_model::geometry::{
    body_items, brep_loops, extrusion_vertices, triangulated_face_set,
};
use floorplan_model::placement::{product_placement, DEFAULT_MAX_DEPTH};
use floorplan_model::{
    EntityId, EntityResolverExt, IfcType, ParseError, Result, ShapeGeometry, ShapeSettings,
    ShapeSource,
};
use nalgebra::Point3;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Vertex welding grid (file units)
const WELD_TOLERANCE: f64 = 1e-6;

pub struct StepShapes {
    resolver: Arc<StepResolver>,
    max_placement_depth: usize,
}

impl StepShapes {
    pub fn new(resolver: Arc<StepResolver>) -> Self {
        Self {
            resolver,
            max_placement_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_placement_depth(mut self, depth: usize) -> Self {
        self.max_placement_depth = depth;
        self
    }
}

impl ShapeSource for StepShapes {
    fn create_shape(&self, product: EntityId, settings: &ShapeSettings) -> Result<ShapeGeometry> {
        let resolver = self.resolver.as_ref();
        let entity = resolver.get_or_err(product)?;

        let mut shape = ShapeGeometry::default();
        let mut skipped = 0usize;

        for placed in body_items(resolver, &entity) {
            let item = &placed.item;
            let base = shape.vertices.len() as u32;
            let (local, indices): (Vec<Point3<f64>>, Vec<u32>) = match item.ifc_type {
                IfcType::IfcExtrudedAreaSolid => (extrusion_vertices(resolver, item)?, Vec::new()),
                IfcType::IfcFacetedBrep if settings.use_brep => {
                    (brep_loops(resolver, item)?.concat(), Vec::new())
                }
                IfcType::IfcTriangulatedFaceSet => triangulated_face_set(resolver, item)?,
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            shape
                .vertices
                .extend(local.iter().map(|p| placed.transform.transform_point(p)));
            shape.indices.extend(indices.into_iter().map(|i| i + base));
        }

        if shape.is_empty() {
            return Err(ParseError::unsupported(
                product,
                format!("no evaluable body items ({skipped} skipped)"),
            ));
        }

        if settings.world_coords {
            if let Some(world) = product_placement(resolver, &entity, self.max_placement_depth)? {
                for v in &mut shape.vertices {
                    *v = world.transform_point(v);
                }
            }
        }

        if settings.weld_vertices {
            weld(&mut shape);
        }

        Ok(shape)
    }
}

/// Merge vertices that fall into the same tolerance cell
fn weld(shape: &mut ShapeGeometry) {
    let key = |p: &Point3<f64>| {
        (
            (p.x / WELD_TOLERANCE).round() as i64,
            (p.y / WELD_TOLERANCE).round() as i64,
            (p.z / WELD_TOLERANCE).round() as i64,
        )
    };

    let mut seen: FxHashMap<(i64, i64, i64), u32> = FxHashMap::default();
    let mut remap = Vec::with_capacity(shape.vertices.len());
    let mut welded = Vec::with_capacity(shape.vertices.len());

    for v in &shape.vertices {
        let next = welded.len() as u32;
        let idx = *seen.entry(key(v)).or_insert_with(|| {
            welded.push(*v);
            next
        });
        remap.push(idx);
    }

    for i in &mut shape.indices {
        if let Some(&mapped) = remap.get(*i as usize) {
            *i = mapped;
        }
    }
    shape.vertices = welded;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// 4000 x 3000 mm room, placed 1000 mm east under a storey at z = 3000 mm
    const TEST_IFC: &str = r#"DATA;
#1=IFCCARTESIANPOINT((0.,0.,3000.));
#2=IFCAXIS2PLACEMENT3D(#1,$,$);
#3=IFCLOCALPLACEMENT($,#2);
#4=IFCCARTESIANPOINT((1000.,0.,0.));
#5=IFCAXIS2PLACEMENT3D(#4,$,$);
#6=IFCLOCALPLACEMENT(#3,#5);
#10=IFCCARTESIANPOINT((2000.,1500.));
#11=IFCAXIS2PLACEMENT2D(#10,$);
#12=IFCRECTANGLEPROFILEDEF(.AREA.,$,#11,4000.,3000.);
#13=IFCCARTESIANPOINT((0.,0.,0.));
#14=IFCAXIS2PLACEMENT3D(#13,$,$);
#15=IFCDIRECTION((0.,0.,1.));
#16=IFCEXTRUDEDAREASOLID(#12,#14,#15,2800.);
#17=IFCSHAPEREPRESENTATION(#99,'Body','SweptSolid',(#16));
#18=IFCPRODUCTDEFINITIONSHAPE($,$,(#17));
#20=IFCSPACE('s1',$,'101',$,$,#6,#18,$,.ELEMENT.,.INTERNAL.,$);
#30=IFCSPACE('s2',$,'102',$,$,#6,$,$,.ELEMENT.,.INTERNAL.,$);
ENDSEC;
"#;

    fn shapes() -> StepShapes {
        StepShapes::new(Arc::new(StepResolver::new(TEST_IFC.to_string())))
    }

    #[test]
    fn test_extruded_space_in_world_coordinates() {
        let shape = shapes()
            .create_shape(EntityId(20), &ShapeSettings::default())
            .unwrap();
        assert_eq!(shape.vertex_count(), 8);
        let min_x = shape.vertices.iter().map(|v| v.x).fold(f64::MAX, f64::min);
        let max_y = shape.vertices.iter().map(|v| v.y).fold(f64::MIN, f64::max);
        let min_z = shape.vertices.iter().map(|v| v.z).fold(f64::MAX, f64::min);
        assert_relative_eq!(min_x, 1000.0);
        assert_relative_eq!(max_y, 3000.0);
        assert_relative_eq!(min_z, 3000.0);
    }

    #[test]
    fn test_local_coordinates_skip_placement() {
        let settings = ShapeSettings {
            world_coords: false,
            weld_vertices: false,
            use_brep: true,
        };
        let shape = shapes().create_shape(EntityId(20), &settings).unwrap();
        let min_x = shape.vertices.iter().map(|v| v.x).fold(f64::MAX, f64::min);
        assert_relative_eq!(min_x, 0.0);
    }

    #[test]
    fn test_space_without_representation_errors() {
        let err = shapes()
            .create_shape(EntityId(30), &ShapeSettings::default())
            .unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedShape { .. }));
    }

    #[test]
    fn test_weld_merges_duplicates() {
        let mut shape = ShapeGeometry {
            vertices: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 0.0),
            ],
            indices: vec![0, 1, 2],
        };
        weld(&mut shape);
        assert_eq!(shape.vertices.len(), 2);
        assert_eq!(shape.indices, vec![0, 1, 0]);
    }
}
