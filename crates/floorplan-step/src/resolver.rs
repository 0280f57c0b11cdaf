// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! EntityResolver implementation over a scanned STEP file

use crate::scanner::EntityScanner;
use crate::tokenizer::parse_entity;
use floorplan_model::{DecodedEntity, EntityId, EntityResolver, IfcType};
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe lazy entity resolver
///
/// Byte ranges and a type index are built up front; entities are decoded on
/// first access and cached until [`StepResolver::clear_cache`].
pub struct StepResolver {
    content: String,
    /// Entity ID -> (start, end) byte offsets
    index: FxHashMap<u32, (usize, usize)>,
    /// Type -> entity IDs in file order
    type_index: FxHashMap<IfcType, Vec<EntityId>>,
    cache: RwLock<FxHashMap<u32, Arc<DecodedEntity>>>,
}

impl StepResolver {
    pub fn new(content: String) -> Self {
        let mut index = FxHashMap::default();
        let mut type_index: FxHashMap<IfcType, Vec<EntityId>> = FxHashMap::default();

        for entity in EntityScanner::new(&content) {
            index.insert(entity.id, (entity.start, entity.end));
            type_index
                .entry(IfcType::parse(entity.type_name))
                .or_default()
                .push(EntityId(entity.id));
        }

        log::debug!(
            "Indexed {} entities across {} types",
            index.len(),
            type_index.len()
        );

        Self {
            content,
            index,
            type_index,
            cache: RwLock::new(FxHashMap::default()),
        }
    }

    /// Number of decoded entities currently cached
    pub fn cached_count(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Drop every decoded entity
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
            cache.shrink_to_fit();
        }
    }

    fn decode_and_cache(&self, id: u32) -> Option<Arc<DecodedEntity>> {
        if let Ok(cache) = self.cache.read() {
            if let Some(cached) = cache.get(&id) {
                return Some(Arc::clone(cached));
            }
        }

        let &(start, end) = self.index.get(&id)?;
        let entity = match parse_entity(&self.content[start..end]) {
            Ok(entity) => Arc::new(entity),
            Err(err) => {
                log::debug!("Skipping undecodable entity #{id}: {err}");
                return None;
            }
        };

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(id, Arc::clone(&entity));
        }
        Some(entity)
    }
}

impl EntityResolver for StepResolver {
    fn get(&self, id: EntityId) -> Option<Arc<DecodedEntity>> {
        self.decode_and_cache(id.0)
    }

    fn entities_by_type(&self, ifc_type: &IfcType) -> Vec<Arc<DecodedEntity>> {
        self.type_index
            .get(ifc_type)
            .map(|ids| ids.iter().filter_map(|id| self.get(*id)).collect())
            .unwrap_or_default()
    }

    fn count_by_type(&self, ifc_type: &IfcType) -> usize {
        self.type_index.get(ifc_type).map(Vec::len).unwrap_or(0)
    }

    fn all_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.index.keys().map(|&id| EntityId(id)).collect();
        ids.sort_unstable();
        ids
    }

    fn entity_count(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCPROJECT('guid',$,'Project',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
#3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#4=IFCSPACE('s1',$,'101',$,$,$,$,$,.ELEMENT.,.INTERNAL.,$);
#5=IFCSPACE('s2',$,'102',$,$,$,$,$,.ELEMENT.,.INTERNAL.,$);
#6=IFCSPACE(broken
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_entities_by_type_in_file_order() {
        let resolver = StepResolver::new(TEST_IFC.to_string());
        let spaces = resolver.entities_by_type(&IfcType::IfcSpace);
        let ids: Vec<_> = spaces.iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec![4, 5]);
    }

    #[test]
    fn test_find_by_type_name_is_case_insensitive() {
        let resolver = StepResolver::new(TEST_IFC.to_string());
        assert_eq!(resolver.find_by_type_name("IfcProject").len(), 1);
        assert_eq!(resolver.count_by_type(&IfcType::IfcSIUnit), 1);
    }

    #[test]
    fn test_cache_fill_and_clear() {
        let resolver = StepResolver::new(TEST_IFC.to_string());
        assert_eq!(resolver.cached_count(), 0);
        assert!(resolver.get(EntityId(1)).is_some());
        assert!(resolver.get(EntityId(4)).is_some());
        assert_eq!(resolver.cached_count(), 2);
        resolver.clear_cache();
        assert_eq!(resolver.cached_count(), 0);
        // Still resolvable after a clear
        assert!(resolver.get(EntityId(1)).is_some());
    }

    #[test]
    fn test_resolver_thread_safe() {
        use std::thread;

        let resolver = Arc::new(StepResolver::new(TEST_IFC.to_string()));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let resolver = Arc::clone(&resolver);
                thread::spawn(move || {
                    for id in 1..=5 {
                        assert!(resolver.get(EntityId(id)).is_some());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
