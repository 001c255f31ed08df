// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! StepModel - IfcModel over a parsed STEP file

use crate::entity::DecodedEntity;
use crate::header::parse_header;
use crate::properties::StepProperties;
use crate::relations::Relations;
use crate::shapes::StepShapes;
use crate::spatial::StepSpatial;
use crate::store::EntityStore;
use crate::units::declared_length_unit;

use ifcore_model::{
    Element, IfcModel, IfcType, ModelMetadata, PropertyReader, Result, ShapeReader, SpatialQuery,
    UnitDeclaration,
};
use std::sync::Arc;

/// Parsed IFC model implementing the `IfcModel` trait
///
/// Relationship indexes, storeys, the header and the declared unit are
/// read eagerly; entity attributes are decoded on demand.
pub struct StepModel {
    store: Arc<EntityStore>,
    properties: StepProperties,
    shapes: StepShapes,
    spatial: StepSpatial,
    length_unit: Option<UnitDeclaration>,
    metadata: ModelMetadata,
}

impl StepModel {
    /// Parse STEP content
    pub fn parse(content: &str) -> Result<Self> {
        let store = Arc::new(EntityStore::build(content.to_string())?);
        let metadata = parse_header(content)?;
        let relations = Arc::new(Relations::build(&store));

        let length_unit = declared_length_unit(&store);
        if length_unit.is_none() {
            log::debug!("no length unit declared, assuming metres");
        }

        log::info!(
            "loaded {} model with {} entities",
            metadata.schema_version,
            store.len()
        );

        Ok(Self {
            properties: StepProperties::new(Arc::clone(&store), Arc::clone(&relations)),
            shapes: StepShapes::new(Arc::clone(&store)),
            spatial: StepSpatial::build(&store, relations),
            store,
            length_unit,
            metadata,
        })
    }
}

/// Build an element from an IfcProduct instance
///
/// GlobalId at 0, Name at 2, ObjectType at 4. The predefined type is the
/// first enumeration at or after index 8, where every element subtype that
/// has one keeps it.
fn element_from(entity: &DecodedEntity) -> Element {
    let predefined_type = entity
        .attributes
        .iter()
        .skip(8)
        .filter_map(|a| a.as_enum())
        .find(|e| !is_logical(e))
        .map(str::to_string);

    Element {
        id: entity.id,
        global_id: entity.get_text(0),
        ifc_type: entity.ifc_type.clone(),
        name: entity.get_text(2),
        object_type: entity.get_text(4),
        predefined_type,
    }
}

/// STEP logical literals, which are never a predefined type
fn is_logical(value: &str) -> bool {
    matches!(value, "T" | "F" | "U" | "TRUE" | "FALSE" | "UNKNOWN")
}

impl IfcModel for StepModel {
    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn length_unit(&self) -> Option<&UnitDeclaration> {
        self.length_unit.as_ref()
    }

    fn elements(&self, ifc_type: &IfcType) -> Vec<Element> {
        self.store
            .entities_by_type(ifc_type)
            .iter()
            .map(|e| element_from(e))
            .collect()
    }

    fn element_count(&self) -> usize {
        self.store.len()
    }

    fn properties(&self) -> &dyn PropertyReader {
        &self.properties
    }

    fn shapes(&self) -> &dyn ShapeReader {
        &self.shapes
    }

    fn spatial(&self) -> &dyn SpatialQuery {
        &self.spatial
    }
}
