// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Declared project length unit
//!
//! The reader only reports what the file declares. Turning a declaration
//! into a scale factor is the engine's job.

use crate::entity::DecodedEntity;
use crate::store::EntityStore;
use ifcore_model::{IfcType, UnitDeclaration};

/// Find the length unit in IFCPROJECT's unit assignment
///
/// IFCPROJECT has UnitsInContext at index 8, IFCUNITASSIGNMENT its Units
/// list at index 0. Returns `None` when any link is missing.
pub fn declared_length_unit(store: &EntityStore) -> Option<UnitDeclaration> {
    let project = store.entities_by_type(&IfcType::IfcProject).into_iter().next()?;
    let assignment = store.resolve_ref(project.get(8)?)?;

    store
        .resolve_refs(assignment.get(0)?)
        .iter()
        .find_map(|unit| length_unit(unit, store))
}

/// Declaration of a unit entity, if it is a length unit
fn length_unit(unit: &DecodedEntity, store: &EntityStore) -> Option<UnitDeclaration> {
    if unit.get_enum(1)? != "LENGTHUNIT" {
        return None;
    }
    match unit.ifc_type {
        IfcType::IfcSIUnit => si_unit(unit),
        IfcType::IfcConversionBasedUnit => conversion_unit(unit, store),
        _ => None,
    }
}

/// IFCSIUNIT(*, UnitType, Prefix, Name)
fn si_unit(unit: &DecodedEntity) -> Option<UnitDeclaration> {
    Some(UnitDeclaration::Si {
        prefix: unit.get_enum(2).map(str::to_string),
        name: unit.get_enum(3)?.to_string(),
    })
}

/// IFCCONVERSIONBASEDUNIT(Dimensions, UnitType, Name, ConversionFactor)
///
/// The factor is an IFCMEASUREWITHUNIT(ValueComponent, UnitComponent).
fn conversion_unit(unit: &DecodedEntity, store: &EntityStore) -> Option<UnitDeclaration> {
    let name = unit.get_text(2).unwrap_or_default();
    let measure = store.get(unit.get_ref(3)?)?;
    if measure.ifc_type != IfcType::IfcMeasureWithUnit {
        return None;
    }

    let factor = measure.get_float(0)?;
    let base = measure
        .get_ref(1)
        .and_then(|id| store.get(id))
        .and_then(|base| length_unit(&base, store))
        .map(Box::new);

    Some(UnitDeclaration::ConversionBased { name, factor, base })
}
