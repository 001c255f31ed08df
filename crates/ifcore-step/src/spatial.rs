// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SpatialQuery implementation

use crate::relations::Relations;
use crate::store::EntityStore;
use ifcore_model::{EntityId, IfcType, SpatialQuery, Storey};
use std::sync::Arc;

/// Storey lookup built at load time
pub struct StepSpatial {
    storeys: Vec<Storey>,
    relations: Arc<Relations>,
}

impl StepSpatial {
    /// Read every IfcBuildingStorey (Name at 2, Elevation at 9)
    pub fn build(store: &EntityStore, relations: Arc<Relations>) -> Self {
        let storeys = store
            .entities_by_type(&IfcType::IfcBuildingStorey)
            .iter()
            .map(|s| Storey {
                id: s.id,
                name: s.get_text(2).unwrap_or_else(|| format!("Storey {}", s.id)),
                elevation: s.get_float(9),
            })
            .collect();

        Self { storeys, relations }
    }
}

impl SpatialQuery for StepSpatial {
    fn storeys(&self) -> Vec<Storey> {
        self.storeys.clone()
    }

    fn container_of(&self, id: EntityId) -> Option<Storey> {
        let container = self.relations.container_of(id)?;
        self.storeys.iter().find(|s| s.id == container).cloned()
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
#1=IFCBUILDINGSTOREY('s0',$,'Ground',$,$,$,$,$,.ELEMENT.,0.);
#2=IFCBUILDINGSTOREY('s1',$,'Basement',$,$,$,$,$,.ELEMENT.,-3.);
#3=IFCBUILDINGSTOREY('s2',$,$,$,$,$,$,$,.ELEMENT.,$);
#10=IFCSLAB('sl',$,'Slab',$,$,$,$,$,.BASESLAB.);
#11=IFCRELCONTAINEDINSPATIALSTRUCTURE('r',$,$,$,(#10),#2);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_storeys_and_containment() {
        let store = EntityStore::build(TEST_IFC.to_string()).unwrap();
        let relations = Arc::new(Relations::build(&store));
        let spatial = StepSpatial::build(&store, relations);

        let storeys = spatial.storeys();
        assert_eq!(storeys.len(), 3);
        assert_eq!(storeys[2].name, "Storey #3");
        assert_eq!(storeys[2].elevation, None);

        assert_eq!(spatial.container_of(EntityId(10)).unwrap().name, "Basement");
        assert_eq!(spatial.lowest_storey().unwrap().id, EntityId(2));
    }
}
