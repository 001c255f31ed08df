// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lazily decoded entity store

use crate::entity::{AttributeValue, DecodedEntity};
use crate::scanner::{data_section, EntityScanner};
use crate::tokenizer::parse_entity;
use ifcore_model::{EntityId, IfcType, ParseError, Result};
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe store of the entity instances of one file
///
/// The file text is indexed once; attributes are decoded on first access and
/// cached.
pub struct EntityStore {
    /// Raw file content (owned for thread safety)
    content: String,
    /// Entity ID -> (start, end) byte offsets
    index: FxHashMap<EntityId, (usize, usize)>,
    /// Type -> entity IDs in file order
    type_index: FxHashMap<IfcType, Vec<EntityId>>,
    /// Decoded entity cache
    cache: RwLock<FxHashMap<EntityId, Arc<DecodedEntity>>>,
}

impl EntityStore {
    /// Index the DATA section of `content`
    ///
    /// Fails if the signature or DATA section is missing, or the section
    /// holds no entity instances.
    pub fn build(content: String) -> Result<Self> {
        let start = data_section(&content)?;

        let mut index = FxHashMap::default();
        let mut type_index: FxHashMap<IfcType, Vec<EntityId>> = FxHashMap::default();
        for raw in EntityScanner::new(&content, start) {
            if index.contains_key(&raw.id) {
                log::warn!("duplicate entity id {}, keeping the first definition", raw.id);
                continue;
            }
            index.insert(raw.id, (raw.start, raw.end));
            type_index
                .entry(IfcType::parse(raw.type_name))
                .or_default()
                .push(raw.id);
        }

        if index.is_empty() {
            return Err(ParseError::Empty);
        }
        log::debug!(
            "indexed {} entities of {} types",
            index.len(),
            type_index.len()
        );

        Ok(Self {
            content,
            index,
            type_index,
            cache: RwLock::new(FxHashMap::default()),
        })
    }

    /// Number of entity instances
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the store holds no entities
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Get a decoded entity, `None` if it is absent or malformed
    pub fn get(&self, id: EntityId) -> Option<Arc<DecodedEntity>> {
        if let Ok(cache) = self.cache.read() {
            if let Some(cached) = cache.get(&id) {
                return Some(Arc::clone(cached));
            }
        }

        let (start, end) = self.index.get(&id)?;
        let entity = match parse_entity(&self.content[*start..*end]) {
            Ok(entity) => Arc::new(entity),
            Err(e) => {
                log::debug!("{e}");
                return None;
            }
        };

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(id, Arc::clone(&entity));
        }
        Some(entity)
    }

    /// Follow an entity reference attribute
    pub fn resolve_ref(&self, attr: &AttributeValue) -> Option<Arc<DecodedEntity>> {
        self.get(attr.as_entity_ref()?)
    }

    /// Follow every reference in a list attribute
    pub fn resolve_refs(&self, attr: &AttributeValue) -> Vec<Arc<DecodedEntity>> {
        attr.as_list()
            .map(|items| items.iter().filter_map(|item| self.resolve_ref(item)).collect())
            .unwrap_or_default()
    }

    /// Ids of all entities of a type, in file order
    pub fn ids_of(&self, ifc_type: &IfcType) -> &[EntityId] {
        self.type_index
            .get(ifc_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Decoded entities of a type, in file order
    pub fn entities_by_type(&self, ifc_type: &IfcType) -> Vec<Arc<DecodedEntity>> {
        self.ids_of(ifc_type)
            .iter()
            .filter_map(|id| self.get(*id))
            .collect()
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
#4=IFCWALL('guid2',$,'Wall 1',$,$,$,$,$);
#5=IFCWALL('guid3',$,'Broken',$,$,$,$,$;
#6=IFCWALL('guid4',$,'Wall 2',$,$,$,$,$);
ENDSEC;
END-ISO-10303-21;
"#;

    fn store() -> EntityStore {
        EntityStore::build(TEST_IFC.to_string()).unwrap()
    }

    #[test]
    fn test_get_and_resolve() {
        let store = store();
        let project = store.get(EntityId(1)).unwrap();
        let units = store.resolve_ref(project.get(8).unwrap()).unwrap();
        let list = store.resolve_refs(units.get(0).unwrap());
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].ifc_type, IfcType::IfcSIUnit);
    }

    #[test]
    fn test_entities_by_type_in_file_order_skips_malformed() {
        let store = store();
        assert_eq!(
            store.ids_of(&IfcType::IfcWall),
            &[EntityId(4), EntityId(5), EntityId(6)]
        );
        let walls = store.entities_by_type(&IfcType::IfcWall);
        let ids: Vec<EntityId> = walls.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![EntityId(4), EntityId(6)]);
    }

    #[test]
    fn test_empty_data_section() {
        let content = "ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\nENDSEC;\nEND-ISO-10303-21;\n";
        assert!(matches!(
            EntityStore::build(content.to_string()),
            Err(ParseError::Empty)
        ));
    }

    #[test]
    fn test_thread_safe_access() {
        let store = Arc::new(store());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || (1..=6).filter(|&id| store.get(EntityId(id)).is_some()).count())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 5);
        }
    }
}
