// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property and quantity access for IFC entities

use crate::EntityId;
use serde::{Deserialize, Serialize};

/// A single property value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Property name
    pub name: String,
    /// Property value as formatted string
    pub value: String,
    /// Numeric reading of the value, when it is a measure or number
    pub numeric: Option<f64>,
}

/// A property set containing multiple properties
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertySet {
    /// Property set name (e.g., "Pset_SpaceCommon")
    pub name: String,
    /// Properties in this set
    pub properties: Vec<Property>,
}

impl PropertySet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn add(&mut self, property: Property) {
        self.properties.push(property);
    }

    /// Get a property by name
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Quantity types supported in IFC
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuantityType {
    /// IfcQuantityLength
    Length,
    /// IfcQuantityArea
    Area,
    /// IfcQuantityVolume
    Volume,
    /// IfcQuantityCount
    Count,
}

/// A quantity value as stored in the file
///
/// Area quantities are conventionally in square metres even when lengths are
/// in millimetres; length quantities follow the file's length unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    /// Quantity name (e.g., "NetFloorArea")
    pub name: String,
    /// Numeric value in file units
    pub value: f64,
    /// Type of quantity
    pub quantity_type: QuantityType,
}

impl Quantity {
    pub fn new(name: impl Into<String>, value: f64, quantity_type: QuantityType) -> Self {
        Self {
            name: name.into(),
            value,
            quantity_type,
        }
    }
}

/// Property and quantity reader trait
///
/// Property sets come from IfcPropertySet entities linked via
/// IfcRelDefinesByProperties; quantities come from IfcElementQuantity.
pub trait PropertyReader: Send + Sync {
    /// All property sets associated with an entity
    fn property_sets(&self, id: EntityId) -> Vec<PropertySet>;

    /// All quantities associated with an entity
    fn quantities(&self, id: EntityId) -> Vec<Quantity>;

    /// First property with the given name across all sets
    fn get_property(&self, id: EntityId, name: &str) -> Option<Property> {
        self.property_sets(id)
            .into_iter()
            .flat_map(|pset| pset.properties)
            .find(|p| p.name == name)
    }

    /// First quantity with the given name
    fn get_quantity(&self, id: EntityId, name: &str) -> Option<Quantity> {
        self.quantities(id).into_iter().find(|q| q.name == name)
    }

    /// Whether any property set or quantity is attached
    fn has_properties(&self, id: EntityId) -> bool {
        !self.property_sets(id).is_empty() || !self.quantities(id).is_empty()
    }
}
