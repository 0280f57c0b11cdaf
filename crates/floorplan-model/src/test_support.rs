// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory resolver for unit tests

use crate::{AttributeValue as A, DecodedEntity, EntityId, EntityResolver, IfcType};
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) struct MemResolver(pub(crate) HashMap<u32, Arc<DecodedEntity>>);

impl MemResolver {
    pub(crate) fn new(entities: Vec<(u32, IfcType, Vec<A>)>) -> Self {
        Self(
            entities
                .into_iter()
                .map(|(id, ifc_type, attributes)| {
                    (
                        id,
                        Arc::new(DecodedEntity {
                            id: EntityId(id),
                            ifc_type,
                            attributes,
                        }),
                    )
                })
                .collect(),
        )
    }
}

impl EntityResolver for MemResolver {
    fn get(&self, id: EntityId) -> Option<Arc<DecodedEntity>> {
        self.0.get(&id.0).cloned()
    }
    fn entities_by_type(&self, ifc_type: &IfcType) -> Vec<Arc<DecodedEntity>> {
        self.0
            .values()
            .filter(|e| &e.ifc_type == ifc_type)
            .cloned()
            .collect()
    }
    fn count_by_type(&self, ifc_type: &IfcType) -> usize {
        self.entities_by_type(ifc_type).len()
    }
    fn all_ids(&self) -> Vec<EntityId> {
        self.0.keys().map(|&id| EntityId(id)).collect()
    }
}

pub(crate) fn point(x: f64, y: f64, z: f64) -> Vec<A> {
    vec![A::List(vec![A::Float(x), A::Float(y), A::Float(z)])]
}

pub(crate) fn r(id: u32) -> A {
    A::EntityRef(EntityId(id))
}
