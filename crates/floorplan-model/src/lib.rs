// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floorplan Model - IFC entity surface consumed by the floor-plan core
//!
//! This crate describes what the floor-plan extractor needs from an IFC model
//! provider, without committing to a particular parser backend.
//!
//! # Architecture
//!
//! - [`IfcModel`] - Read-only access to a loaded IFC model
//! - [`EntityResolver`] - Entity lookup and enumeration by type
//! - [`PropertyReader`] - Property sets and quantities attached to entities
//! - [`ShapeSource`] - Shape creation parameterized by [`ShapeSettings`]
//! - [`placement`] - Local placement chains flattened into world matrices
//!
//! Entities expose their attributes through a name-based query
//! ([`DecodedEntity::attribute`]), so callers ask `"LongName"` or
//! `"ObjectPlacement"` instead of hard-coding positional indices.
//!
//! # Example
//!
//! ```ignore
//! use floorplan_model::{IfcModel, IfcType};
//!
//! let model: &dyn IfcModel = load_model()?;
//! for storey in model.resolver().entities_by_type(&IfcType::IfcBuildingStorey) {
//!     println!("{:?} at {:?}", storey.attr_str("Name"), storey.attr_float("Elevation"));
//! }
//! ```

pub mod error;
pub mod geometry;
pub mod placement;
pub mod properties;
pub mod resolver;
pub mod schema;
pub mod shape;
pub mod traits;
pub mod types;

#[cfg(test)]
mod test_support;

pub use error::*;
pub use properties::*;
pub use resolver::*;
pub use shape::*;
pub use traits::*;
pub use types::*;
