// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relationship indexes
//!
//! Objectified relationships are inverted once at load time so that lookups
//! from an element are plain map reads. All four relationship types share the
//! layout `(GlobalId, OwnerHistory, Name, Description, Related(4), Relating(5))`.

use crate::entity::AttributeValue;
use crate::store::EntityStore;
use ifcore_model::{EntityId, IfcType};
use rustc_hash::FxHashMap;

/// Inverted relationship maps
#[derive(Debug, Default)]
pub struct Relations {
    /// Element -> property/quantity set definitions
    definitions: FxHashMap<EntityId, Vec<EntityId>>,
    /// Element -> type object
    types: FxHashMap<EntityId, EntityId>,
    /// Element or type -> material definition
    materials: FxHashMap<EntityId, EntityId>,
    /// Element -> spatial container
    containers: FxHashMap<EntityId, EntityId>,
}

impl Relations {
    /// Scan the relationship entities of a store
    pub fn build(store: &EntityStore) -> Self {
        let mut relations = Self::default();

        for rel in store.entities_by_type(&IfcType::IfcRelDefinesByProperties) {
            // IFC4 allows a set of definitions on the relating side
            let relating: Vec<EntityId> = match rel.get(5) {
                Some(AttributeValue::EntityRef(id)) => vec![*id],
                Some(AttributeValue::List(_)) => rel.get_refs(5),
                _ => continue,
            };
            for object in rel.get_refs(4) {
                relations
                    .definitions
                    .entry(object)
                    .or_default()
                    .extend(relating.iter().copied());
            }
        }

        let one_to_many = [
            (IfcType::IfcRelDefinesByType, &mut relations.types),
            (IfcType::IfcRelAssociatesMaterial, &mut relations.materials),
            (
                IfcType::IfcRelContainedInSpatialStructure,
                &mut relations.containers,
            ),
        ];
        for (rel_type, map) in one_to_many {
            for rel in store.entities_by_type(&rel_type) {
                let Some(relating) = rel.get_ref(5) else {
                    continue;
                };
                for object in rel.get_refs(4) {
                    map.entry(object).or_insert(relating);
                }
            }
        }

        log::debug!(
            "relations: {} defined, {} typed, {} with material, {} contained",
            relations.definitions.len(),
            relations.types.len(),
            relations.materials.len(),
            relations.containers.len()
        );
        relations
    }

    /// Property and quantity set definitions attached to an object
    pub fn definitions_of(&self, id: EntityId) -> &[EntityId] {
        self.definitions
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Type object of an element
    pub fn type_of(&self, id: EntityId) -> Option<EntityId> {
        self.types.get(&id).copied()
    }

    /// Material definition associated with an element or type object
    pub fn material_of(&self, id: EntityId) -> Option<EntityId> {
        self.materials.get(&id).copied()
    }

    /// Spatial structure element that directly contains an element
    pub fn container_of(&self, id: EntityId) -> Option<EntityId> {
        self.containers.get(&id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#10=IFCWALL('w1',$,'Wall 1',$,$,$,$,$,$);
#11=IFCWALL('w2',$,'Wall 2',$,$,$,$,$,$);
#20=IFCPROPERTYSET('p1',$,'Pset_WallCommon',$,());
#21=IFCELEMENTQUANTITY('q1',$,'Qto_WallBaseQuantities',$,$,());
#30=IFCRELDEFINESBYPROPERTIES('r1',$,$,$,(#10,#11),#20);
#31=IFCRELDEFINESBYPROPERTIES('r2',$,$,$,(#10),#21);
#40=IFCWALLTYPE('t1',$,'Type',$,$,$,$,$,$,.STANDARD.);
#41=IFCRELDEFINESBYTYPE('r3',$,$,$,(#11),#40);
#50=IFCMATERIAL('Concrete',$,$);
#51=IFCRELASSOCIATESMATERIAL('r4',$,$,$,(#40),#50);
#60=IFCBUILDINGSTOREY('s1',$,'Level 0',$,$,$,$,$,.ELEMENT.,0.);
#61=IFCRELCONTAINEDINSPATIALSTRUCTURE('r5',$,$,$,(#10,#11),#60);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_relations_are_inverted() {
        let store = EntityStore::build(TEST_IFC.to_string()).unwrap();
        let relations = Relations::build(&store);

        assert_eq!(relations.definitions_of(EntityId(10)), &[EntityId(20), EntityId(21)]);
        assert_eq!(relations.definitions_of(EntityId(11)), &[EntityId(20)]);
        assert!(relations.definitions_of(EntityId(99)).is_empty());

        assert_eq!(relations.type_of(EntityId(11)), Some(EntityId(40)));
        assert_eq!(relations.type_of(EntityId(10)), None);
        assert_eq!(relations.material_of(EntityId(40)), Some(EntityId(50)));
        assert_eq!(relations.container_of(EntityId(10)), Some(EntityId(60)));
    }
}
