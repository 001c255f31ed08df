// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory model
//!
//! A model assembled in code instead of parsed from a file. Rule authors use
//! it to build synthetic elements with exactly the data a test needs.
//!
//! ```
//! use ifcore_model::{Element, IfcModel, IfcType, InMemoryModel, QuantitySet};
//!
//! let model = InMemoryModel::new()
//!     .with_element(Element::new(1, IfcType::IfcWall).with_name("W1"))
//!     .with_quantity_set(1, QuantitySet::new("Qto_WallBaseQuantities").with_length("Width", 0.2));
//!
//! assert_eq!(model.elements(&IfcType::IfcWall).len(), 1);
//! ```

use crate::{
    Element, EntityId, Extrusion, IfcModel, IfcType, MaterialLayerSet, ModelMetadata,
    OverallDimensions, PropertyReader, PropertySet, QuantitySet, ShapeReader, SpatialQuery,
    Storey, UnitDeclaration,
};
use std::collections::HashMap;

/// Model backed by plain collections
#[derive(Clone, Debug, Default)]
pub struct InMemoryModel {
    metadata: ModelMetadata,
    length_unit: Option<UnitDeclaration>,
    elements: Vec<Element>,
    property_sets: HashMap<EntityId, Vec<PropertySet>>,
    type_property_sets: HashMap<EntityId, Vec<PropertySet>>,
    quantity_sets: HashMap<EntityId, Vec<QuantitySet>>,
    material_layers: HashMap<EntityId, MaterialLayerSet>,
    extrusions: HashMap<EntityId, Vec<Extrusion>>,
    overall_dimensions: HashMap<EntityId, OverallDimensions>,
    storeys: Vec<Storey>,
    containment: HashMap<EntityId, EntityId>,
}

impl InMemoryModel {
    /// Empty model with IFC4 metadata and no declared unit
    pub fn new() -> Self {
        Self {
            metadata: ModelMetadata {
                schema_version: "IFC4".to_string(),
                ..ModelMetadata::default()
            },
            ..Self::default()
        }
    }

    /// Set the schema version
    pub fn with_schema(mut self, schema_version: impl Into<String>) -> Self {
        self.metadata.schema_version = schema_version.into();
        self
    }

    /// Declare the project length unit
    pub fn with_length_unit(mut self, unit: UnitDeclaration) -> Self {
        self.length_unit = Some(unit);
        self
    }

    /// Add an element
    pub fn with_element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    /// Attach an instance property set
    pub fn with_property_set(mut self, id: impl Into<EntityId>, pset: PropertySet) -> Self {
        self.property_sets.entry(id.into()).or_default().push(pset);
        self
    }

    /// Attach a property set to the element's type object
    pub fn with_type_property_set(mut self, id: impl Into<EntityId>, pset: PropertySet) -> Self {
        self.type_property_sets.entry(id.into()).or_default().push(pset);
        self
    }

    /// Attach a quantity set
    pub fn with_quantity_set(mut self, id: impl Into<EntityId>, qset: QuantitySet) -> Self {
        self.quantity_sets.entry(id.into()).or_default().push(qset);
        self
    }

    /// Attach a layered material
    pub fn with_material_layers(mut self, id: impl Into<EntityId>, layers: MaterialLayerSet) -> Self {
        self.material_layers.insert(id.into(), layers);
        self
    }

    /// Attach an extrusion
    pub fn with_extrusion(mut self, id: impl Into<EntityId>, extrusion: Extrusion) -> Self {
        self.extrusions.entry(id.into()).or_default().push(extrusion);
        self
    }

    /// Set overall width/height attributes
    pub fn with_overall_dimensions(mut self, id: impl Into<EntityId>, dims: OverallDimensions) -> Self {
        self.overall_dimensions.insert(id.into(), dims);
        self
    }

    /// Add a storey
    pub fn with_storey(mut self, storey: Storey) -> Self {
        self.storeys.push(storey);
        self
    }

    /// Place an element in a storey
    pub fn with_containment(mut self, element: impl Into<EntityId>, storey: impl Into<EntityId>) -> Self {
        self.containment.insert(element.into(), storey.into());
        self
    }
}

impl IfcModel for InMemoryModel {
    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn length_unit(&self) -> Option<&UnitDeclaration> {
        self.length_unit.as_ref()
    }

    fn elements(&self, ifc_type: &IfcType) -> Vec<Element> {
        self.elements
            .iter()
            .filter(|e| &e.ifc_type == ifc_type)
            .cloned()
            .collect()
    }

    fn element_count(&self) -> usize {
        self.elements.len()
    }

    fn properties(&self) -> &dyn PropertyReader {
        self
    }

    fn shapes(&self) -> &dyn ShapeReader {
        self
    }

    fn spatial(&self) -> &dyn SpatialQuery {
        self
    }
}

impl PropertyReader for InMemoryModel {
    fn property_sets(&self, id: EntityId) -> Vec<PropertySet> {
        self.property_sets.get(&id).cloned().unwrap_or_default()
    }

    fn type_property_sets(&self, id: EntityId) -> Vec<PropertySet> {
        self.type_property_sets.get(&id).cloned().unwrap_or_default()
    }

    fn quantity_sets(&self, id: EntityId) -> Vec<QuantitySet> {
        self.quantity_sets.get(&id).cloned().unwrap_or_default()
    }

    fn material_layers(&self, id: EntityId) -> Option<MaterialLayerSet> {
        self.material_layers.get(&id).cloned()
    }
}

impl ShapeReader for InMemoryModel {
    fn extrusions(&self, id: EntityId) -> Vec<Extrusion> {
        self.extrusions.get(&id).cloned().unwrap_or_default()
    }

    fn overall_dimensions(&self, id: EntityId) -> OverallDimensions {
        self.overall_dimensions.get(&id).copied().unwrap_or_default()
    }
}

impl SpatialQuery for InMemoryModel {
    fn storeys(&self) -> Vec<Storey> {
        self.storeys.clone()
    }

    fn container_of(&self, id: EntityId) -> Option<Storey> {
        let storey_id = self.containment.get(&id)?;
        self.storeys.iter().find(|s| s.id == *storey_id).cloned()
    }
}
