// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element inventory: one informational row per building element type

use crate::config::RuleConfig;
use crate::error::RuleError;
use crate::registry::Rule;
use crate::report::{ElementResult, ElementStatus};
use ifcore_model::{IfcModel, IfcType};

const INVENTORIED: &[IfcType] = &[
    IfcType::IfcWall,
    IfcType::IfcWallStandardCase,
    IfcType::IfcCurtainWall,
    IfcType::IfcSlab,
    IfcType::IfcRoof,
    IfcType::IfcBeam,
    IfcType::IfcColumn,
    IfcType::IfcDoor,
    IfcType::IfcWindow,
    IfcType::IfcStair,
    IfcType::IfcStairFlight,
    IfcType::IfcRamp,
    IfcType::IfcRailing,
    IfcType::IfcCovering,
    IfcType::IfcPlate,
    IfcType::IfcMember,
    IfcType::IfcFooting,
    IfcType::IfcPile,
    IfcType::IfcBuildingElementProxy,
    IfcType::IfcSpace,
    IfcType::IfcBuildingStorey,
];

pub fn rules() -> Vec<Rule> {
    vec![Rule::new("Element Inventory", check_element_inventory)]
}

pub fn check_element_inventory(
    model: &dyn IfcModel,
    config: &RuleConfig,
) -> Result<Vec<ElementResult>, RuleError> {
    let schema = &model.metadata().schema_version;

    let mut rows = Vec::new();
    for ifc_type in INVENTORIED {
        config.check_deadline()?;
        let count = model.elements(ifc_type).len();
        if count > 0 {
            rows.push(
                ElementResult::new(ifc_type.name(), ifc_type.name(), ElementStatus::Log)
                    .with_actual(count.to_string())
                    .with_long_name(format!("{ifc_type} count ({schema})"))
                    .with_comment(format!("{count} {ifc_type} in model")),
            );
        }
    }
    Ok(rows)
}
