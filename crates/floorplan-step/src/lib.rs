// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floorplan STEP - IFC model provider for STEP physical files
//!
//! Implements the [`floorplan_model`] traits over an ISO-10303-21 file:
//!
//! - entity boundaries are found with a `memchr` scanner, without decoding
//! - entities are decoded lazily with `nom` and cached behind an `RwLock`
//! - property sets and quantities are indexed from `IfcRelDefinesByProperties`
//! - body shapes are produced from swept solids, B-reps and face sets
//!
//! # Example
//!
//! ```ignore
//! use floorplan_step::StepModel;
//! use floorplan_model::{IfcModel, IfcType};
//!
//! let model = StepModel::open("building.ifc")?;
//! let storeys = model.resolver().count_by_type(&IfcType::IfcBuildingStorey);
//! println!("{storeys} storeys, length unit {} m", model.unit_scale());
//! ```

pub mod model;
pub mod properties;
pub mod resolver;
pub mod scanner;
pub mod shapes;
pub mod strings;
pub mod tokenizer;
pub mod units;

pub use model::StepModel;
pub use properties::StepProperties;
pub use resolver::StepResolver;
pub use shapes::StepShapes;

// Re-export model types for convenience
pub use floorplan_model::{
    AttributeValue, DecodedEntity, EntityId, EntityResolver, IfcModel, IfcType, ModelMetadata,
    ParseError, PropertyReader, Result, ShapeSettings, ShapeSource,
};
