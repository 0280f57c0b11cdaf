// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shape creation facility offered by a model provider

use crate::{EntityId, Result};
use nalgebra::Point3;

/// Settings controlling how a shape is produced
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShapeSettings {
    /// Apply the product's placement chain so vertices are in world space
    pub world_coords: bool,
    /// Merge coincident vertices
    pub weld_vertices: bool,
    /// Evaluate boundary representations in addition to swept solids
    pub use_brep: bool,
}

impl Default for ShapeSettings {
    fn default() -> Self {
        Self {
            world_coords: true,
            weld_vertices: true,
            use_brep: false,
        }
    }
}

impl ShapeSettings {
    /// The sequence of settings tried when projecting a space shape
    pub fn projection_sequence() -> [ShapeSettings; 3] {
        [
            ShapeSettings {
                world_coords: true,
                weld_vertices: true,
                use_brep: false,
            },
            ShapeSettings {
                world_coords: true,
                weld_vertices: false,
                use_brep: true,
            },
            ShapeSettings {
                world_coords: false,
                weld_vertices: false,
                use_brep: true,
            },
        ]
    }
}

/// Raw shape output: vertices in file length units
#[derive(Clone, Debug, Default)]
pub struct ShapeGeometry {
    pub vertices: Vec<Point3<f64>>,
    /// Triangle indices into `vertices`, may be empty for point-only shapes
    pub indices: Vec<u32>,
}

impl ShapeGeometry {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

/// Geometry-shape creation for products
pub trait ShapeSource: Send + Sync {
    /// Create the body shape of a product
    fn create_shape(&self, product: EntityId, settings: &ShapeSettings) -> Result<ShapeGeometry>;
}
