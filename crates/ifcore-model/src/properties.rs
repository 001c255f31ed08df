// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property, quantity and material layer access

use crate::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value of a single property
///
/// Authoring tools are inconsistent about value types (a width may arrive as
/// a real, an integer, or text like "0,2"), so the accessors are lenient and
/// return `None` for anything malformed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Real(f64),
    Integer(i64),
    Boolean(bool),
    Text(String),
    Empty,
}

impl PropertyValue {
    /// Numeric view of the value
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            PropertyValue::Real(v) => *v,
            PropertyValue::Integer(v) => *v as f64,
            PropertyValue::Text(s) => s.trim().replace(',', ".").parse::<f64>().ok()?,
            PropertyValue::Boolean(_) | PropertyValue::Empty => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Boolean view of the value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            PropertyValue::Integer(i) => Some(*i != 0),
            PropertyValue::Real(r) => Some(*r != 0.0),
            PropertyValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" | "yes" | "y" => Some(true),
                "false" | "f" | "0" | "no" | "n" => Some(false),
                _ => None,
            },
            PropertyValue::Empty => None,
        }
    }

    /// Check whether the value carries no data
    pub fn is_empty(&self) -> bool {
        match self {
            PropertyValue::Empty => true,
            PropertyValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Real(v) => write!(f, "{v}"),
            PropertyValue::Integer(v) => write!(f, "{v}"),
            PropertyValue::Boolean(v) => write!(f, "{v}"),
            PropertyValue::Text(s) => f.write_str(s),
            PropertyValue::Empty => Ok(()),
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Real(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Integer(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Boolean(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

/// A single named property
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Property name
    pub name: String,
    /// Property value
    pub value: PropertyValue,
    /// Unit label (if the file declared one)
    pub unit: Option<String>,
}

impl Property {
    /// Create a new property
    pub fn new(name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            unit: None,
        }
    }
}

/// A property set containing multiple properties
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertySet {
    /// Property set name (e.g., "Pset_WallCommon")
    pub name: String,
    /// Properties in this set
    pub properties: Vec<Property>,
}

impl PropertySet {
    /// Create a new property set
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Builder-style add
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.push(Property::new(name, value));
        self
    }

    /// Get a property by name
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Quantity types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuantityType {
    /// Linear measurement (IfcQuantityLength)
    Length,
    /// Area measurement (IfcQuantityArea)
    Area,
    /// Volume measurement (IfcQuantityVolume)
    Volume,
    /// Count (IfcQuantityCount)
    Count,
    /// Weight/mass measurement (IfcQuantityWeight)
    Weight,
    /// Time measurement (IfcQuantityTime)
    Time,
}

/// A quantity value in model units
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    /// Quantity name
    pub name: String,
    /// Numeric value, as stored in the file
    pub value: f64,
    /// Type of quantity
    pub quantity_type: QuantityType,
}

impl Quantity {
    /// Create a new quantity
    pub fn new(name: impl Into<String>, value: f64, quantity_type: QuantityType) -> Self {
        Self {
            name: name.into(),
            value,
            quantity_type,
        }
    }

    /// Create a length quantity
    pub fn length(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, value, QuantityType::Length)
    }
}

/// A named quantity set (IfcElementQuantity)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuantitySet {
    /// Quantity set name (e.g., "Qto_WallBaseQuantities")
    pub name: String,
    /// Quantities in this set
    pub quantities: Vec<Quantity>,
}

impl QuantitySet {
    /// Create a new quantity set
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantities: Vec::new(),
        }
    }

    /// Builder-style add of a length quantity
    pub fn with_length(mut self, name: impl Into<String>, value: f64) -> Self {
        self.quantities.push(Quantity::length(name, value));
        self
    }

    /// Get a quantity by name
    pub fn get(&self, name: &str) -> Option<&Quantity> {
        self.quantities.iter().find(|q| q.name == name)
    }
}

/// One layer of a layered assembly
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialLayer {
    /// Material name, if any
    pub material: Option<String>,
    /// Layer thickness in model units
    pub thickness: f64,
}

/// Layered material assembly attached to an element or its type
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialLayerSet {
    /// Layer set name
    pub name: Option<String>,
    /// Layers, outermost first
    pub layers: Vec<MaterialLayer>,
    /// Whether the set came from the element's type rather than the instance
    pub from_type: bool,
}

impl MaterialLayerSet {
    /// Sum of all layer thicknesses, or `None` if it isn't positive
    pub fn total_thickness(&self) -> Option<f64> {
        let total: f64 = self
            .layers
            .iter()
            .map(|l| l.thickness)
            .filter(|t| t.is_finite())
            .sum();
        (total > 0.0).then_some(total)
    }
}

/// Property and quantity reader trait
///
/// Property sets come from IfcPropertySet entities linked via
/// IfcRelDefinesByProperties; the element's type object contributes its own
/// `HasPropertySets`. Quantities come from IfcElementQuantity entities.
///
/// # Example
///
/// ```ignore
/// use ifcore_model::{PropertyReader, EntityId};
///
/// fn fire_rating(props: &dyn PropertyReader, wall_id: EntityId) -> Option<String> {
///     props
///         .find_property(wall_id, "Pset_WallCommon", "FireRating")
///         .map(|p| p.value.to_string())
/// }
/// ```
pub trait PropertyReader: Send + Sync {
    /// Property sets attached to the element itself
    fn property_sets(&self, id: EntityId) -> Vec<PropertySet>;

    /// Property sets attached to the element's type object
    fn type_property_sets(&self, id: EntityId) -> Vec<PropertySet>;

    /// Quantity sets attached to the element
    fn quantity_sets(&self, id: EntityId) -> Vec<QuantitySet>;

    /// Layered material of the element, falling back to its type's
    fn material_layers(&self, id: EntityId) -> Option<MaterialLayerSet>;

    /// Get a property from a named instance property set
    fn find_property(&self, id: EntityId, pset: &str, name: &str) -> Option<Property> {
        self.property_sets(id)
            .into_iter()
            .find(|set| set.name == pset)
            .and_then(|set| set.properties.into_iter().find(|p| p.name == name))
    }

    /// Get the first instance property with a matching name in any set
    fn get_property(&self, id: EntityId, name: &str) -> Option<Property> {
        self.property_sets(id)
            .into_iter()
            .flat_map(|pset| pset.properties)
            .find(|p| p.name == name)
    }
}
