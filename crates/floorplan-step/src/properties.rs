// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! PropertyReader implementation

use crate::StepResolver;
use floorplan_model::{
    AttributeValue, DecodedEntity, EntityId, EntityResolver, EntityResolverExt, IfcType, Property,
    PropertyReader, PropertySet, Quantity, QuantityType,
};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Property reader backed by an IfcRelDefinesByProperties index
pub struct StepProperties {
    resolver: Arc<StepResolver>,
    /// Object -> IfcPropertySet IDs
    pset_index: FxHashMap<EntityId, Vec<EntityId>>,
    /// Object -> IfcElementQuantity IDs
    qset_index: FxHashMap<EntityId, Vec<EntityId>>,
}

impl StepProperties {
    pub fn new(resolver: Arc<StepResolver>) -> Self {
        let mut pset_index: FxHashMap<EntityId, Vec<EntityId>> = FxHashMap::default();
        let mut qset_index: FxHashMap<EntityId, Vec<EntityId>> = FxHashMap::default();

        for rel in resolver.entities_by_type(&IfcType::IfcRelDefinesByProperties) {
            let Some(definition) = resolver.follow(&rel, "RelatingPropertyDefinition") else {
                continue;
            };
            let index = match definition.ifc_type {
                IfcType::IfcPropertySet => &mut pset_index,
                IfcType::IfcElementQuantity => &mut qset_index,
                _ => continue,
            };
            for object in rel.attr_refs("RelatedObjects") {
                index.entry(object).or_default().push(definition.id);
            }
        }

        Self {
            resolver,
            pset_index,
            qset_index,
        }
    }

    fn read_property(&self, prop: &DecodedEntity) -> Option<Property> {
        if prop.ifc_type != IfcType::IfcPropertySingleValue {
            return None;
        }
        let name = prop.attr_str("Name")?.to_string();
        let value = prop.attribute("NominalValue")?;
        Some(Property {
            name,
            value: format_value(value),
            numeric: value.as_float(),
        })
    }

    fn read_quantity(&self, qty: &DecodedEntity) -> Option<Quantity> {
        let (value_attr, quantity_type) = match qty.ifc_type {
            IfcType::IfcQuantityLength => ("LengthValue", QuantityType::Length),
            IfcType::IfcQuantityArea => ("AreaValue", QuantityType::Area),
            IfcType::IfcQuantityVolume => ("VolumeValue", QuantityType::Volume),
            IfcType::IfcQuantityCount => ("CountValue", QuantityType::Count),
            _ => return None,
        };
        let name = qty.attr_str("Name")?;
        let value = qty.attr_float(value_attr)?;
        Some(Quantity::new(name, value, quantity_type))
    }
}

fn format_value(value: &AttributeValue) -> String {
    match value {
        AttributeValue::String(s) => s.clone(),
        AttributeValue::Integer(i) => i.to_string(),
        AttributeValue::Float(f) => f.to_string(),
        AttributeValue::Bool(b) => b.to_string(),
        AttributeValue::Enum(e) => e.clone(),
        AttributeValue::TypedValue(_, args) => args.first().map(format_value).unwrap_or_default(),
        AttributeValue::List(items) => items
            .iter()
            .map(format_value)
            .collect::<Vec<_>>()
            .join(", "),
        AttributeValue::EntityRef(id) => id.to_string(),
        AttributeValue::Null | AttributeValue::Derived => String::new(),
    }
}

impl PropertyReader for StepProperties {
    fn property_sets(&self, id: EntityId) -> Vec<PropertySet> {
        let Some(pset_ids) = self.pset_index.get(&id) else {
            return Vec::new();
        };
        pset_ids
            .iter()
            .filter_map(|pset_id| self.resolver.get(*pset_id))
            .map(|pset| {
                let mut set = PropertySet::new(pset.attr_str("Name").unwrap_or_default());
                for prop in self.resolver.follow_all(&pset, "HasProperties") {
                    if let Some(p) = self.read_property(&prop) {
                        set.add(p);
                    }
                }
                set
            })
            .collect()
    }

    fn quantities(&self, id: EntityId) -> Vec<Quantity> {
        let Some(qset_ids) = self.qset_index.get(&id) else {
            return Vec::new();
        };
        qset_ids
            .iter()
            .filter_map(|qset_id| self.resolver.get(*qset_id))
            .flat_map(|qset| self.resolver.follow_all(&qset, "Quantities"))
            .filter_map(|qty| self.read_quantity(&qty))
            .collect()
    }

    fn has_properties(&self, id: EntityId) -> bool {
        self.pset_index.contains_key(&id) || self.qset_index.contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_IFC: &str = r#"DATA;
#10=IFCSPACE('s1',$,'101',$,$,$,$,$,.ELEMENT.,.INTERNAL.,$);
#20=IFCPROPERTYSET('p',$,'Pset_SpaceCommon',$,(#21,#22));
#21=IFCPROPERTYSINGLEVALUE('Reference',$,IFCIDENTIFIER('K-101'),$);
#22=IFCPROPERTYSINGLEVALUE('FinishCeilingHeight',$,IFCLENGTHMEASURE(2700.),$);
#23=IFCRELDEFINESBYPROPERTIES('r1',$,$,$,(#10),#20);
#30=IFCELEMENTQUANTITY('q',$,'Qto_SpaceBaseQuantities',$,$,(#31,#32));
#31=IFCQUANTITYAREA('NetFloorArea',$,$,24.5,$);
#32=IFCQUANTITYLENGTH('GrossPerimeter',$,$,20000.,$);
#33=IFCRELDEFINESBYPROPERTIES('r2',$,$,$,(#10),#30);
ENDSEC;
"#;

    fn reader() -> StepProperties {
        StepProperties::new(Arc::new(StepResolver::new(TEST_IFC.to_string())))
    }

    #[test]
    fn test_property_sets() {
        let props = reader();
        let sets = props.property_sets(EntityId(10));
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].name, "Pset_SpaceCommon");
        assert_eq!(sets[0].get("Reference").unwrap().value, "K-101");
        assert_eq!(
            props
                .get_property(EntityId(10), "FinishCeilingHeight")
                .and_then(|p| p.numeric),
            Some(2700.0)
        );
    }

    #[test]
    fn test_quantities() {
        let props = reader();
        let area = props.get_quantity(EntityId(10), "NetFloorArea").unwrap();
        assert_eq!(area.quantity_type, QuantityType::Area);
        assert!((area.value - 24.5).abs() < 1e-12);
        assert_eq!(props.quantities(EntityId(10)).len(), 2);
    }

    #[test]
    fn test_unrelated_entity_has_nothing() {
        let props = reader();
        assert!(props.property_sets(EntityId(21)).is_empty());
        assert!(!props.has_properties(EntityId(21)));
        assert!(props.has_properties(EntityId(10)));
    }
}
