// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for model data representation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type-safe entity identifier
///
/// Wraps the raw STEP instance number (e.g., #123 becomes EntityId(123))
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Default, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        EntityId(id)
    }
}

impl From<EntityId> for u32 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

macro_rules! ifc_types {
    ($( $(#[$doc:meta])* $variant:ident => $upper:literal ),* $(,)?) => {
        /// IFC entity type tag
        ///
        /// Covers the entity types the compliance engine and the STEP reader
        /// look at. Anything else is kept as `Unknown` with its upper-case name.
        #[derive(Clone, PartialEq, Eq, Hash, Debug)]
        pub enum IfcType {
            $( $(#[$doc])* $variant, )*
            /// Type not covered above (upper-case STEP name)
            Unknown(String),
        }

        impl IfcType {
            /// Parse a type name (case-insensitive)
            pub fn parse(s: &str) -> Self {
                let upper = s.trim().to_ascii_uppercase();
                match upper.as_str() {
                    $( $upper => IfcType::$variant, )*
                    _ => IfcType::Unknown(upper),
                }
            }

            /// Schema name in its usual mixed-case spelling (e.g. "IfcWall")
            pub fn name(&self) -> &str {
                match self {
                    $( IfcType::$variant => stringify!($variant), )*
                    IfcType::Unknown(name) => name,
                }
            }
        }
    };
}

ifc_types! {
    // Spatial structure
    IfcProject => "IFCPROJECT",
    IfcSite => "IFCSITE",
    IfcBuilding => "IFCBUILDING",
    IfcBuildingStorey => "IFCBUILDINGSTOREY",
    IfcSpace => "IFCSPACE",

    // Building elements
    IfcWall => "IFCWALL",
    IfcWallStandardCase => "IFCWALLSTANDARDCASE",
    IfcCurtainWall => "IFCCURTAINWALL",
    IfcSlab => "IFCSLAB",
    IfcRoof => "IFCROOF",
    IfcBeam => "IFCBEAM",
    IfcColumn => "IFCCOLUMN",
    IfcDoor => "IFCDOOR",
    IfcWindow => "IFCWINDOW",
    IfcStair => "IFCSTAIR",
    IfcStairFlight => "IFCSTAIRFLIGHT",
    IfcRamp => "IFCRAMP",
    IfcRailing => "IFCRAILING",
    IfcCovering => "IFCCOVERING",
    IfcPlate => "IFCPLATE",
    IfcMember => "IFCMEMBER",
    IfcFooting => "IFCFOOTING",
    IfcPile => "IFCPILE",
    IfcBuildingElementProxy => "IFCBUILDINGELEMENTPROXY",
    IfcOpeningElement => "IFCOPENINGELEMENT",

    // Representations
    IfcProductDefinitionShape => "IFCPRODUCTDEFINITIONSHAPE",
    IfcShapeRepresentation => "IFCSHAPEREPRESENTATION",
    IfcExtrudedAreaSolid => "IFCEXTRUDEDAREASOLID",
    IfcBooleanResult => "IFCBOOLEANRESULT",
    IfcBooleanClippingResult => "IFCBOOLEANCLIPPINGRESULT",
    IfcMappedItem => "IFCMAPPEDITEM",
    IfcRepresentationMap => "IFCREPRESENTATIONMAP",

    // Profiles
    IfcRectangleProfileDef => "IFCRECTANGLEPROFILEDEF",
    IfcRectangleHollowProfileDef => "IFCRECTANGLEHOLLOWPROFILEDEF",
    IfcCircleProfileDef => "IFCCIRCLEPROFILEDEF",
    IfcCircleHollowProfileDef => "IFCCIRCLEHOLLOWPROFILEDEF",
    IfcIShapeProfileDef => "IFCISHAPEPROFILEDEF",

    // Relationships
    IfcRelContainedInSpatialStructure => "IFCRELCONTAINEDINSPATIALSTRUCTURE",
    IfcRelAggregates => "IFCRELAGGREGATES",
    IfcRelDefinesByProperties => "IFCRELDEFINESBYPROPERTIES",
    IfcRelDefinesByType => "IFCRELDEFINESBYTYPE",
    IfcRelAssociatesMaterial => "IFCRELASSOCIATESMATERIAL",

    // Properties and quantities
    IfcPropertySet => "IFCPROPERTYSET",
    IfcPropertySingleValue => "IFCPROPERTYSINGLEVALUE",
    IfcPropertyEnumeratedValue => "IFCPROPERTYENUMERATEDVALUE",
    IfcElementQuantity => "IFCELEMENTQUANTITY",
    IfcQuantityLength => "IFCQUANTITYLENGTH",
    IfcQuantityArea => "IFCQUANTITYAREA",
    IfcQuantityVolume => "IFCQUANTITYVOLUME",
    IfcQuantityCount => "IFCQUANTITYCOUNT",
    IfcQuantityWeight => "IFCQUANTITYWEIGHT",
    IfcQuantityTime => "IFCQUANTITYTIME",

    // Materials
    IfcMaterial => "IFCMATERIAL",
    IfcMaterialLayer => "IFCMATERIALLAYER",
    IfcMaterialLayerSet => "IFCMATERIALLAYERSET",
    IfcMaterialLayerSetUsage => "IFCMATERIALLAYERSETUSAGE",

    // Units
    IfcUnitAssignment => "IFCUNITASSIGNMENT",
    IfcSIUnit => "IFCSIUNIT",
    IfcConversionBasedUnit => "IFCCONVERSIONBASEDUNIT",
    IfcMeasureWithUnit => "IFCMEASUREWITHUNIT",
}

impl IfcType {
    /// Physical building elements that compliance rules inspect
    pub fn is_building_element(&self) -> bool {
        matches!(
            self,
            IfcType::IfcWall
                | IfcType::IfcWallStandardCase
                | IfcType::IfcCurtainWall
                | IfcType::IfcSlab
                | IfcType::IfcRoof
                | IfcType::IfcBeam
                | IfcType::IfcColumn
                | IfcType::IfcDoor
                | IfcType::IfcWindow
                | IfcType::IfcStair
                | IfcType::IfcStairFlight
                | IfcType::IfcRamp
                | IfcType::IfcRailing
                | IfcType::IfcCovering
                | IfcType::IfcPlate
                | IfcType::IfcMember
                | IfcType::IfcFooting
                | IfcType::IfcPile
                | IfcType::IfcBuildingElementProxy
        )
    }

    /// Check if this is a spatial structure element
    pub fn is_spatial(&self) -> bool {
        matches!(
            self,
            IfcType::IfcProject
                | IfcType::IfcSite
                | IfcType::IfcBuilding
                | IfcType::IfcBuildingStorey
                | IfcType::IfcSpace
        )
    }
}

impl FromStr for IfcType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(IfcType::parse(s))
    }
}

impl Default for IfcType {
    fn default() -> Self {
        IfcType::Unknown(String::new())
    }
}

impl fmt::Display for IfcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A physical element as seen by compliance rules
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Element {
    /// Entity ID inside the model
    pub id: EntityId,
    /// Schema-assigned GlobalId (22 character base64 GUID)
    pub global_id: Option<String>,
    /// Entity type
    pub ifc_type: IfcType,
    /// Name attribute
    pub name: Option<String>,
    /// ObjectType attribute
    pub object_type: Option<String>,
    /// PredefinedType enumeration (e.g. "BASESLAB")
    pub predefined_type: Option<String>,
}

impl Element {
    /// Create an element with just an ID and type
    pub fn new(id: impl Into<EntityId>, ifc_type: IfcType) -> Self {
        Self {
            id: id.into(),
            ifc_type,
            ..Self::default()
        }
    }

    /// Set the GlobalId
    pub fn with_global_id(mut self, global_id: impl Into<String>) -> Self {
        self.global_id = Some(global_id.into());
        self
    }

    /// Set the Name attribute
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the PredefinedType
    pub fn with_predefined_type(mut self, predefined_type: impl Into<String>) -> Self {
        self.predefined_type = Some(predefined_type.into());
        self
    }

    /// Name for display, falling back to "IfcWall #12" when unnamed
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("{} {}", self.ifc_type, self.id),
        }
    }
}

/// Declared length unit of a model
///
/// This is what the file says, not a conversion factor; turning it into a
/// factor is up to the consumer.
#[derive(Clone, Debug, PartialEq)]
pub enum UnitDeclaration {
    /// IFCSIUNIT, e.g. `.MILLI.` + `.METRE.`
    Si {
        prefix: Option<String>,
        name: String,
    },
    /// IFCCONVERSIONBASEDUNIT, e.g. 'INCH' = 0.0254 x METRE
    ConversionBased {
        name: String,
        factor: f64,
        base: Option<Box<UnitDeclaration>>,
    },
}

impl UnitDeclaration {
    /// Plain SI metre, optionally prefixed
    pub fn metre(prefix: Option<&str>) -> Self {
        UnitDeclaration::Si {
            prefix: prefix.map(str::to_string),
            name: "METRE".to_string(),
        }
    }
}

/// Model metadata extracted from the file header
#[derive(Clone, Debug, Default)]
pub struct ModelMetadata {
    /// IFC schema version (e.g., "IFC2X3", "IFC4", "IFC4X3")
    pub schema_version: String,
    /// Originating system (CAD application)
    pub originating_system: Option<String>,
    /// Preprocessor version
    pub preprocessor_version: Option<String>,
    /// File name from header
    pub file_name: Option<String>,
    /// File description
    pub file_description: Option<String>,
    /// Author
    pub author: Option<String>,
    /// Organization
    pub organization: Option<String>,
    /// Timestamp
    pub timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_types() {
        assert_eq!(IfcType::parse("IFCWALL"), IfcType::IfcWall);
        assert_eq!(IfcType::parse("IfcWallStandardCase"), IfcType::IfcWallStandardCase);
        assert_eq!(IfcType::parse("ifcsiunit"), IfcType::IfcSIUnit);
    }

    #[test]
    fn test_unknown_type_keeps_name() {
        let t = IfcType::parse("IfcFlowTerminal");
        assert_eq!(t, IfcType::Unknown("IFCFLOWTERMINAL".to_string()));
        assert_eq!(t.name(), "IFCFLOWTERMINAL");
    }

    #[test]
    fn test_display_uses_schema_spelling() {
        assert_eq!(IfcType::IfcBuildingStorey.to_string(), "IfcBuildingStorey");
        assert_eq!(EntityId(42).to_string(), "#42");
    }

    #[test]
    fn test_building_element_classification() {
        assert!(IfcType::IfcFooting.is_building_element());
        assert!(!IfcType::IfcPropertySet.is_building_element());
        assert!(IfcType::IfcBuildingStorey.is_spatial());
    }

    #[test]
    fn test_display_name_fallback() {
        let named = Element::new(7, IfcType::IfcDoor).with_name("Main Entrance");
        assert_eq!(named.display_name(), "Main Entrance");

        let blank = Element::new(8, IfcType::IfcSlab).with_name("  ");
        assert_eq!(blank.display_name(), "IfcSlab #8");
    }
}
