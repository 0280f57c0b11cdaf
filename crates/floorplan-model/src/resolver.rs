// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity resolution trait for looking up and enumerating IFC entities

use crate::{AttributeValue, DecodedEntity, EntityId, IfcType};
use std::sync::Arc;

/// Entity lookup and reference resolution
///
/// Implementations should provide O(1) lookup by entity ID and keep a type
/// index so enumeration by type does not scan the whole model.
///
/// # Example
///
/// ```ignore
/// use floorplan_model::{EntityResolver, IfcType};
///
/// fn list_rooms(resolver: &dyn EntityResolver) {
///     for space in resolver.entities_by_type(&IfcType::IfcSpace) {
///         if let Some(placement) = space.attr_ref("ObjectPlacement") {
///             println!("{} placed by {}", space.id, placement);
///         }
///     }
/// }
/// ```
pub trait EntityResolver: Send + Sync {
    /// Get entity by ID
    fn get(&self, id: EntityId) -> Option<Arc<DecodedEntity>>;

    /// Resolve an entity reference held in an attribute value
    fn resolve_ref(&self, attr: &AttributeValue) -> Option<Arc<DecodedEntity>> {
        match attr {
            AttributeValue::EntityRef(id) => self.get(*id),
            _ => None,
        }
    }

    /// Resolve every reference in a list attribute, skipping dangling ones
    fn resolve_ref_list(&self, attr: &AttributeValue) -> Vec<Arc<DecodedEntity>> {
        match attr {
            AttributeValue::List(items) => items
                .iter()
                .filter_map(|item| self.resolve_ref(item))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Get all entities of a specific type, in file order
    fn entities_by_type(&self, ifc_type: &IfcType) -> Vec<Arc<DecodedEntity>>;

    /// Find entities by type name string (case-insensitive)
    fn find_by_type_name(&self, type_name: &str) -> Vec<Arc<DecodedEntity>> {
        self.entities_by_type(&IfcType::parse(type_name))
    }

    /// Count entities of a specific type without decoding them
    fn count_by_type(&self, ifc_type: &IfcType) -> usize;

    /// Get all entity IDs in the model
    fn all_ids(&self) -> Vec<EntityId>;

    /// Get total entity count
    fn entity_count(&self) -> usize {
        self.all_ids().len()
    }
}

/// Extension methods for EntityResolver
pub trait EntityResolverExt: EntityResolver {
    /// Resolve a named reference attribute of `entity`
    fn follow(&self, entity: &DecodedEntity, attribute: &str) -> Option<Arc<DecodedEntity>> {
        entity.attr_ref(attribute).and_then(|id| self.get(id))
    }

    /// Resolve a named list-of-references attribute of `entity`
    fn follow_all(&self, entity: &DecodedEntity, attribute: &str) -> Vec<Arc<DecodedEntity>> {
        entity
            .attribute(attribute)
            .map(|attr| self.resolve_ref_list(attr))
            .unwrap_or_default()
    }

    /// Get entity or return error
    fn get_or_err(&self, id: EntityId) -> crate::Result<Arc<DecodedEntity>> {
        self.get(id).ok_or(crate::ParseError::EntityNotFound(id))
    }

    /// Whether an entity exists
    fn exists(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }
}

// Blanket implementation for all EntityResolver types
impl<T: EntityResolver + ?Sized> EntityResolverExt for T {}
