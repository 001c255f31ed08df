// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! PropertyReader implementation

use crate::entity::{AttributeValue, DecodedEntity};
use crate::relations::Relations;
use crate::store::EntityStore;
use ifcore_model::{
    EntityId, IfcType, MaterialLayer, MaterialLayerSet, Property, PropertyReader, PropertySet,
    PropertyValue, Quantity, QuantitySet, QuantityType,
};
use std::sync::Arc;

/// Property, quantity and material reader over an entity store
pub struct StepProperties {
    store: Arc<EntityStore>,
    relations: Arc<Relations>,
}

impl StepProperties {
    pub fn new(store: Arc<EntityStore>, relations: Arc<Relations>) -> Self {
        Self { store, relations }
    }

    /// Read an IfcPropertySet (Name at 2, HasProperties at 4)
    fn read_property_set(&self, pset: &DecodedEntity) -> Option<PropertySet> {
        if pset.ifc_type != IfcType::IfcPropertySet {
            return None;
        }
        let properties = self
            .store
            .resolve_refs(pset.get(4)?)
            .iter()
            .filter_map(|prop| self.read_property(prop))
            .collect();

        Some(PropertySet {
            name: pset.get_text(2).unwrap_or_default(),
            properties,
        })
    }

    /// Read a single property (Name at 0)
    fn read_property(&self, prop: &DecodedEntity) -> Option<Property> {
        let name = prop.get_text(0)?;

        match prop.ifc_type {
            IfcType::IfcPropertySingleValue => {
                // NominalValue at index 2, Unit at index 3
                let value = prop.get(2).map(property_value).unwrap_or(PropertyValue::Empty);
                let unit = prop.get_ref(3).and_then(|id| self.unit_label(id));
                Some(Property { name, value, unit })
            }
            IfcType::IfcPropertyEnumeratedValue => {
                // EnumerationValues at index 2
                let values: Vec<String> = prop
                    .get(2)?
                    .as_list()?
                    .iter()
                    .map(|v| property_value(v).to_string())
                    .collect();
                Some(Property::new(name, values.join(", ")))
            }
            _ => None,
        }
    }

    /// Short label for a unit entity
    fn unit_label(&self, id: EntityId) -> Option<String> {
        let unit = self.store.get(id)?;
        match unit.ifc_type {
            IfcType::IfcSIUnit => {
                let prefix = match unit.get_enum(2) {
                    Some("MILLI") => "m",
                    Some("CENTI") => "c",
                    Some("KILO") => "k",
                    _ => "",
                };
                let name = match unit.get_enum(3)? {
                    "METRE" => "m",
                    "SQUARE_METRE" => "m²",
                    "CUBIC_METRE" => "m³",
                    "GRAM" => "g",
                    "SECOND" => "s",
                    "KELVIN" => "K",
                    "PASCAL" => "Pa",
                    "NEWTON" => "N",
                    other => other,
                };
                Some(format!("{prefix}{name}"))
            }
            IfcType::IfcConversionBasedUnit => unit.get_text(2),
            _ => None,
        }
    }

    /// Read an IfcElementQuantity (Name at 2, Quantities at 5)
    fn read_quantity_set(&self, qset: &DecodedEntity) -> Option<QuantitySet> {
        if qset.ifc_type != IfcType::IfcElementQuantity {
            return None;
        }
        let quantities = self
            .store
            .resolve_refs(qset.get(5)?)
            .iter()
            .filter_map(|q| read_quantity(q))
            .collect();

        Some(QuantitySet {
            name: qset.get_text(2).unwrap_or_default(),
            quantities,
        })
    }

    /// Layer set behind a material definition
    fn read_layer_set(&self, material_id: EntityId, from_type: bool) -> Option<MaterialLayerSet> {
        let material = self.store.get(material_id)?;
        let layer_set = match material.ifc_type {
            // IfcMaterialLayerSetUsage: ForLayerSet at 0
            IfcType::IfcMaterialLayerSetUsage => self.store.resolve_ref(material.get(0)?)?,
            IfcType::IfcMaterialLayerSet => material,
            _ => return None,
        };

        // IfcMaterialLayerSet: MaterialLayers at 0, LayerSetName at 1
        let layers = self
            .store
            .resolve_refs(layer_set.get(0)?)
            .iter()
            .filter(|layer| layer.ifc_type == IfcType::IfcMaterialLayer)
            .filter_map(|layer| {
                // IfcMaterialLayer: Material at 0, LayerThickness at 1
                let thickness = layer.get_float(1)?;
                let material = layer
                    .get_ref(0)
                    .and_then(|id| self.store.get(id))
                    .and_then(|m| m.get_text(0));
                Some(MaterialLayer { material, thickness })
            })
            .collect();

        Some(MaterialLayerSet {
            name: layer_set.get_text(1),
            layers,
            from_type,
        })
    }
}

/// Read a single IfcPhysicalSimpleQuantity (Name at 0, value at 3)
fn read_quantity(qty: &DecodedEntity) -> Option<Quantity> {
    let quantity_type = match qty.ifc_type {
        IfcType::IfcQuantityLength => QuantityType::Length,
        IfcType::IfcQuantityArea => QuantityType::Area,
        IfcType::IfcQuantityVolume => QuantityType::Volume,
        IfcType::IfcQuantityCount => QuantityType::Count,
        IfcType::IfcQuantityWeight => QuantityType::Weight,
        IfcType::IfcQuantityTime => QuantityType::Time,
        _ => return None,
    };
    Some(Quantity::new(qty.get_text(0)?, qty.get_float(3)?, quantity_type))
}

/// Convert a STEP attribute to a property value
///
/// Typed values are unwrapped; `.T.`/`.F.` become booleans and the
/// logical `.U.` (unknown) becomes `Empty`.
fn property_value(attr: &AttributeValue) -> PropertyValue {
    match attr {
        AttributeValue::Float(f) => PropertyValue::Real(*f),
        AttributeValue::Integer(i) => PropertyValue::Integer(*i),
        AttributeValue::String(s) => PropertyValue::Text(s.clone()),
        AttributeValue::Enum(e) => match attr.as_bool() {
            Some(b) => PropertyValue::Boolean(b),
            None if e == "U" || e == "UNKNOWN" => PropertyValue::Empty,
            None => PropertyValue::Text(e.clone()),
        },
        AttributeValue::TypedValue(_, args) => args
            .first()
            .map(property_value)
            .unwrap_or(PropertyValue::Empty),
        _ => PropertyValue::Empty,
    }
}

impl PropertyReader for StepProperties {
    fn property_sets(&self, id: EntityId) -> Vec<PropertySet> {
        self.relations
            .definitions_of(id)
            .iter()
            .filter_map(|def| self.store.get(*def))
            .filter_map(|def| self.read_property_set(&def))
            .collect()
    }

    fn type_property_sets(&self, id: EntityId) -> Vec<PropertySet> {
        let Some(type_id) = self.relations.type_of(id) else {
            return Vec::new();
        };

        // IfcTypeObject: HasPropertySets at index 5
        let mut definitions = self
            .store
            .get(type_id)
            .map(|t| t.get_refs(5))
            .unwrap_or_default();
        for def in self.relations.definitions_of(type_id) {
            if !definitions.contains(def) {
                definitions.push(*def);
            }
        }

        definitions
            .into_iter()
            .filter_map(|def| self.store.get(def))
            .filter_map(|def| self.read_property_set(&def))
            .collect()
    }

    fn quantity_sets(&self, id: EntityId) -> Vec<QuantitySet> {
        self.relations
            .definitions_of(id)
            .iter()
            .filter_map(|def| self.store.get(*def))
            .filter_map(|def| self.read_quantity_set(&def))
            .collect()
    }

    fn material_layers(&self, id: EntityId) -> Option<MaterialLayerSet> {
        if let Some(set) = self
            .relations
            .material_of(id)
            .and_then(|m| self.read_layer_set(m, false))
        {
            return Some(set);
        }
        let type_id = self.relations.type_of(id)?;
        self.read_layer_set(self.relations.material_of(type_id)?, true)
    }
}
